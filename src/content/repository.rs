// Post and comment stores: PostgreSQL and in-memory

use axum::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::content::models::{Comment, CommentRow, Post, PostRow};
use crate::error::ApiError;

/// Persistence operations for posts and comments
///
/// `update_post` only writes the editable fields (title, content, slug) and
/// refreshes `updated_at`; author and publication date are written on insert
/// and never again.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError>;

    async fn find_post(&self, id: i32) -> Result<Option<Post>, ApiError>;

    /// Store a new post, returning it with its assigned id
    async fn insert_post(&self, post: Post) -> Result<Post, ApiError>;

    async fn update_post(&self, post: Post) -> Result<Post, ApiError>;

    /// Returns false when no post had that id
    async fn delete_post(&self, id: i32) -> Result<bool, ApiError>;

    async fn list_comments(&self, post_id: i32) -> Result<Vec<Comment>, ApiError>;

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, ApiError>;

    async fn find_comment(&self, post_id: i32, id: i32) -> Result<Option<Comment>, ApiError>;

    /// Writes only the content
    async fn update_comment(&self, comment: Comment) -> Result<Comment, ApiError>;

    /// Returns false when the post had no comment with that id
    async fn delete_comment(&self, post_id: i32, id: i32) -> Result<bool, ApiError>;
}

const POST_SELECT: &str = "SELECT p.id, p.title, p.content, p.slug, p.author_id, \
     u.username AS author_username, p.published, p.updated_at \
     FROM posts p LEFT JOIN users u ON u.id = p.author_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.content, c.author_id, \
     u.username AS author_username, c.published \
     FROM comments c LEFT JOIN users u ON u.id = c.author_id";

/// PostgreSQL-backed content repository
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        let sql = format!("{} ORDER BY p.published DESC NULLS LAST, p.id DESC", POST_SELECT);
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn find_post(&self, id: i32) -> Result<Option<Post>, ApiError> {
        let sql = format!("{} WHERE p.id = $1", POST_SELECT);
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn insert_post(&self, mut post: Post) -> Result<Post, ApiError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO posts (title, content, slug, author_id, published) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.slug)
        .bind(post.author.as_ref().map(|author| author.id))
        .bind(post.published)
        .fetch_one(&self.pool)
        .await?;

        post.id = id;
        Ok(post)
    }

    async fn update_post(&self, mut post: Post) -> Result<Post, ApiError> {
        let updated_at = Utc::now();
        let result = sqlx::query(
            "UPDATE posts SET title = $1, content = $2, slug = $3, updated_at = $4 WHERE id = $5",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.slug)
        .bind(updated_at)
        .bind(post.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound {
                resource: "Post",
                id: post.id,
            });
        }

        post.updated_at = Some(updated_at);
        Ok(post)
    }

    async fn delete_post(&self, id: i32) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, post_id: i32) -> Result<Vec<Comment>, ApiError> {
        let sql = format!("{} WHERE c.post_id = $1 ORDER BY c.id", COMMENT_SELECT);
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn insert_comment(&self, mut comment: Comment) -> Result<Comment, ApiError> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO comments (post_id, content, author_id, published) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(comment.post_id)
        .bind(&comment.content)
        .bind(comment.author.as_ref().map(|author| author.id))
        .bind(comment.published)
        .fetch_one(&self.pool)
        .await?;

        comment.id = id;
        Ok(comment)
    }

    async fn find_comment(&self, post_id: i32, id: i32) -> Result<Option<Comment>, ApiError> {
        let sql = format!("{} WHERE c.post_id = $1 AND c.id = $2", COMMENT_SELECT);
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(post_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Comment::from))
    }

    async fn update_comment(&self, comment: Comment) -> Result<Comment, ApiError> {
        let result = sqlx::query("UPDATE comments SET content = $1 WHERE id = $2 AND post_id = $3")
            .bind(&comment.content)
            .bind(comment.id)
            .bind(comment.post_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound {
                resource: "Comment",
                id: comment.id,
            });
        }

        Ok(comment)
    }

    async fn delete_comment(&self, post_id: i32, id: i32) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND post_id = $2")
            .bind(id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Default)]
struct ContentData {
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

/// In-memory content repository, used without a database and in tests
#[derive(Default)]
pub struct InMemoryContentRepository {
    data: RwLock<ContentData>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slug_taken(posts: &[Post], slug: &str, except_id: i32) -> bool {
    posts.iter().any(|p| p.slug == slug && p.id != except_id)
}

fn slug_conflict() -> ApiError {
    ApiError::Conflict {
        message: "A post with this slug already exists".to_string(),
    }
}

#[async_trait]
impl ContentStore for InMemoryContentRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        let data = self.data.read().await;
        let mut posts = data.posts.clone();
        posts.sort_by(|a, b| b.published.cmp(&a.published).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn find_post(&self, id: i32) -> Result<Option<Post>, ApiError> {
        let data = self.data.read().await;
        Ok(data.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_post(&self, mut post: Post) -> Result<Post, ApiError> {
        let mut data = self.data.write().await;
        if slug_taken(&data.posts, &post.slug, 0) {
            return Err(slug_conflict());
        }

        post.id = data.posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        data.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, post: Post) -> Result<Post, ApiError> {
        let mut data = self.data.write().await;
        if slug_taken(&data.posts, &post.slug, post.id) {
            return Err(slug_conflict());
        }

        let stored = data
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(ApiError::NotFound {
                resource: "Post",
                id: post.id,
            })?;

        stored.title = post.title;
        stored.content = post.content;
        stored.slug = post.slug;
        stored.updated_at = Some(Utc::now());
        Ok(stored.clone())
    }

    async fn delete_post(&self, id: i32) -> Result<bool, ApiError> {
        let mut data = self.data.write().await;
        let before = data.posts.len();
        data.posts.retain(|p| p.id != id);
        if data.posts.len() == before {
            return Ok(false);
        }

        data.comments.retain(|c| c.post_id != id);
        Ok(true)
    }

    async fn list_comments(&self, post_id: i32) -> Result<Vec<Comment>, ApiError> {
        let data = self.data.read().await;
        Ok(data
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, mut comment: Comment) -> Result<Comment, ApiError> {
        let mut data = self.data.write().await;
        comment.id = data.comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        data.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, post_id: i32, id: i32) -> Result<Option<Comment>, ApiError> {
        let data = self.data.read().await;
        Ok(data
            .comments
            .iter()
            .find(|c| c.post_id == post_id && c.id == id)
            .cloned())
    }

    async fn update_comment(&self, comment: Comment) -> Result<Comment, ApiError> {
        let mut data = self.data.write().await;
        let stored = data
            .comments
            .iter_mut()
            .find(|c| c.post_id == comment.post_id && c.id == comment.id)
            .ok_or(ApiError::NotFound {
                resource: "Comment",
                id: comment.id,
            })?;

        stored.content = comment.content;
        Ok(stored.clone())
    }

    async fn delete_comment(&self, post_id: i32, id: i32) -> Result<bool, ApiError> {
        let mut data = self.data.write().await;
        let before = data.comments.len();
        data.comments.retain(|c| !(c.post_id == post_id && c.id == id));
        Ok(data.comments.len() < before)
    }
}
