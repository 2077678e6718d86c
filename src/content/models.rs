// Post and comment models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::lifecycle::{Author, AuthoredEntity, PublishedDateEntity};
use crate::validation::validate_slug;

/// Blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Post {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Hello world")]
    pub title: String,
    pub content: String,
    #[schema(example = "hello-world")]
    pub slug: String,
    /// Set once, when the post is created
    pub author: Option<Author>,
    /// Set once, when the post is created
    pub published: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// A post that has not been stored or stamped yet
    pub fn draft(title: String, content: String, slug: String) -> Self {
        Self {
            id: 0,
            title,
            content,
            slug,
            author: None,
            published: None,
            updated_at: None,
        }
    }

    pub fn is_authored_by(&self, user_id: i32) -> bool {
        self.author.as_ref().is_some_and(|author| author.id == user_id)
    }
}

impl AuthoredEntity for Post {
    fn set_author(&mut self, author: Author) {
        self.author = Some(author);
    }
}

impl PublishedDateEntity for Post {
    fn set_published(&mut self, published: DateTime<Utc>) {
        self.published = Some(published);
    }
}

/// Comment on a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub content: String,
    pub author: Option<Author>,
    pub published: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn draft(post_id: i32, content: String) -> Self {
        Self {
            id: 0,
            post_id,
            content,
            author: None,
            published: None,
        }
    }

    pub fn is_authored_by(&self, user_id: i32) -> bool {
        self.author.as_ref().is_some_and(|author| author.id == user_id)
    }
}

impl AuthoredEntity for Comment {
    fn set_author(&mut self, author: Author) {
        self.author = Some(author);
    }
}

impl PublishedDateEntity for Comment {
    fn set_published(&mut self, published: DateTime<Utc>) {
        self.published = Some(published);
    }
}

/// Post row joined with its author's username
#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub author_id: Option<i32>,
    pub author_username: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            slug: row.slug,
            author: author_from_columns(row.author_id, row.author_username),
            published: row.published,
            updated_at: row.updated_at,
        }
    }
}

/// Comment row joined with its author's username
#[derive(Debug, FromRow)]
pub struct CommentRow {
    pub id: i32,
    pub post_id: i32,
    pub content: String,
    pub author_id: Option<i32>,
    pub author_username: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            content: row.content,
            author: author_from_columns(row.author_id, row.author_username),
            published: row.published,
        }
    }
}

fn author_from_columns(id: Option<i32>, username: Option<String>) -> Option<Author> {
    match (id, username) {
        (Some(id), Some(username)) => Some(Author { id, username }),
        _ => None,
    }
}

/// Request to create a post; the slug is derived from the title when omitted
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePost {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    #[schema(example = "Hello world")]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
}

/// Partial update; author and publication date cannot be changed
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
}

impl UpdatePost {
    /// Apply the provided fields to a post
    pub fn apply_to(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(slug) = self.slug {
            post.slug = slug;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateComment {
    #[validate(length(min = 1, max = 2000, message = "Comment must be between 1 and 2000 characters"))]
    pub content: String,
}

/// Edit of a comment's text; author and publication date cannot be changed
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateComment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 2000, message = "Comment must be between 1 and 2000 characters"))]
    pub content: Option<String>,
}

impl UpdateComment {
    pub fn apply_to(self, comment: &mut Comment) {
        if let Some(content) = self.content {
            comment.content = content;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_keeps_unset_fields() {
        let mut post = Post::draft("Title".into(), "Body".into(), "title".into());
        UpdatePost {
            title: Some("New title".into()),
            ..Default::default()
        }
        .apply_to(&mut post);

        assert_eq!(post.title, "New title");
        assert_eq!(post.content, "Body");
        assert_eq!(post.slug, "title");
    }

    #[test]
    fn test_create_post_validation() {
        let valid = CreatePost {
            title: "Hello".into(),
            content: "World".into(),
            slug: None,
        };
        assert!(valid.validate().is_ok());

        let bad_slug = CreatePost {
            slug: Some("Not A Slug".into()),
            ..valid.clone()
        };
        assert!(bad_slug.validate().is_err());

        let empty_title = CreatePost {
            title: String::new(),
            ..valid
        };
        assert!(empty_title.validate().is_err());
    }

    #[test]
    fn test_row_without_author_username_has_no_author() {
        let post = Post::from(PostRow {
            id: 1,
            title: "t".into(),
            content: "c".into(),
            slug: "t".into(),
            author_id: Some(3),
            author_username: None,
            published: None,
            updated_at: None,
        });
        assert!(post.author.is_none());
    }

    #[test]
    fn test_is_authored_by() {
        let mut post = Post::draft("t".into(), "c".into(), "t".into());
        assert!(!post.is_authored_by(1));
        post.set_author(Author {
            id: 1,
            username: "writer".into(),
        });
        assert!(post.is_authored_by(1));
        assert!(!post.is_authored_by(2));
    }

    #[test]
    fn test_comment_edit_keeps_author() {
        let mut comment = Comment::draft(1, "First".into());
        comment.set_author(Author {
            id: 4,
            username: "reader".into(),
        });

        UpdateComment::default().apply_to(&mut comment);
        assert_eq!(comment.content, "First");

        UpdateComment {
            content: Some("Edited".into()),
        }
        .apply_to(&mut comment);
        assert_eq!(comment.content, "Edited");
        assert!(comment.is_authored_by(4));
        assert!(!comment.is_authored_by(5));
    }
}
