// HTTP handlers for posts and comments

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    Json,
};
use tracing::{debug, info};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    auth::{AuthenticatedUser, Principal},
    content::models::{Comment, CreateComment, CreatePost, Post, UpdateComment, UpdatePost},
    error::ApiError,
    lifecycle::{ViewEvent, ViewResult},
    validation::slugify,
    AppState,
};

async fn load_post(state: &AppState, id: i32) -> Result<Post, ApiError> {
    state
        .content
        .find_post(id)
        .await?
        .ok_or(ApiError::NotFound { resource: "Post", id })
}

/// Authors may change their own posts; administrators may change any post
fn ensure_can_modify(post: &Post, principal: &Principal) -> Result<(), ApiError> {
    if post.is_authored_by(principal.user_id) || principal.role.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "User {} may not modify post {}",
            principal.user_id, post.id
        )))
    }
}

/// List all posts, newest first
#[utoipa::path(
    get,
    path = "/posts",
    responses(
        (status = 200, description = "List of posts", body = Vec<Post>),
        (status = 500, description = "Internal server error", body = String, example = json!({"error": "DATABASE_ERROR", "message": "A database error occurred"}))
    ),
    tag = "posts"
)]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    debug!("Fetching all posts");
    state.content.list_posts().await.map(Json)
}

/// Get a post by ID
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(
        ("id" = i32, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Post found", body = Post),
        (status = 404, description = "Post not found", body = String, example = json!({"error": "NOT_FOUND", "message": "Post with id 1 not found"}))
    ),
    tag = "posts"
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Post>, ApiError> {
    load_post(&state, id).await.map(Json)
}

/// Create a post authored by the current user
#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePost,
    responses(
        (status = 201, description = "Post created with author and publication date set", body = Post),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 409, description = "Slug already taken", body = String),
        (status = 422, description = "Invalid input data", body = String, example = json!({"error": "VALIDATION_ERROR", "message": "Title must be between 1 and 200 characters"}))
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn create_post(
    State(state): State<AppState>,
    method: Method,
    AuthenticatedUser(principal): AuthenticatedUser,
    Json(payload): Json<CreatePost>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    payload.validate()?;

    let slug = payload.slug.unwrap_or_else(|| slugify(&payload.title));
    if slug.is_empty() {
        let mut error = ValidationError::new("slug_required");
        error.message = Some("A slug cannot be derived from this title; provide one".into());
        let mut errors = ValidationErrors::new();
        errors.add("slug", error);
        return Err(errors.into());
    }

    let mut post = Post::draft(payload.title, payload.content, slug);
    state.hooks.dispatch(&mut ViewEvent::new(
        method,
        Some(&principal),
        ViewResult::Post(&mut post),
    ));

    let post = state.content.insert_post(post).await?;
    info!("Post created: id={}, author_id={}", post.id, principal.user_id);
    Ok((StatusCode::CREATED, Json(post)))
}

/// Update a post's title, content or slug
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(
        ("id" = i32, Path, description = "Post ID")
    ),
    request_body = UpdatePost,
    responses(
        (status = 200, description = "Post updated; author and publication date unchanged", body = Post),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 403, description = "Not the author and not an administrator", body = String),
        (status = 404, description = "Post not found", body = String),
        (status = 422, description = "Invalid input data", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn update_post(
    State(state): State<AppState>,
    method: Method,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePost>,
) -> Result<Json<Post>, ApiError> {
    payload.validate()?;

    let mut post = load_post(&state, id).await?;
    ensure_can_modify(&post, &principal)?;

    payload.apply_to(&mut post);
    state.hooks.dispatch(&mut ViewEvent::new(
        method,
        Some(&principal),
        ViewResult::Post(&mut post),
    ));

    let post = state.content.update_post(post).await?;
    info!("Post updated: id={}, by user_id={}", post.id, principal.user_id);
    Ok(Json(post))
}

/// Delete a post and its comments
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(
        ("id" = i32, Path, description = "Post ID")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 403, description = "Not the author and not an administrator", body = String),
        (status = 404, description = "Post not found", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let post = load_post(&state, id).await?;
    ensure_can_modify(&post, &principal)?;

    remove_post(&state, id).await?;
    info!("Post deleted: id={}, by user_id={}", id, principal.user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Delete any post (administrators only)
#[utoipa::path(
    delete,
    path = "/api/admin/posts/{id}",
    params(
        ("id" = i32, Path, description = "Post ID")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 403, description = "Administrator role required", body = String),
        (status = 404, description = "Post not found", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn moderate_delete_post(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    remove_post(&state, id).await?;
    info!("Post removed by moderator: id={}, admin_id={}", id, principal.user_id);
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_post(state: &AppState, id: i32) -> Result<(), ApiError> {
    if state.content.delete_post(id).await? {
        Ok(())
    } else {
        Err(ApiError::NotFound { resource: "Post", id })
    }
}

/// List the comments on a post
#[utoipa::path(
    get,
    path = "/posts/{id}/comments",
    params(
        ("id" = i32, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Comments in creation order", body = Vec<Comment>),
        (status = 404, description = "Post not found", body = String)
    ),
    tag = "posts"
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    load_post(&state, id).await?;
    state.content.list_comments(id).await.map(Json)
}

/// Comment on a post as the current user
#[utoipa::path(
    post,
    path = "/posts/{id}/comments",
    params(
        ("id" = i32, Path, description = "Post ID")
    ),
    request_body = CreateComment,
    responses(
        (status = 201, description = "Comment created with author and publication date set", body = Comment),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 404, description = "Post not found", body = String),
        (status = 422, description = "Invalid input data", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn create_comment(
    State(state): State<AppState>,
    method: Method,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateComment>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    payload.validate()?;
    load_post(&state, id).await?;

    let mut comment = Comment::draft(id, payload.content);
    state.hooks.dispatch(&mut ViewEvent::new(
        method,
        Some(&principal),
        ViewResult::Comment(&mut comment),
    ));

    let comment = state.content.insert_comment(comment).await?;
    info!("Comment created: id={}, post_id={}, author_id={}", comment.id, id, principal.user_id);
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn load_comment(state: &AppState, post_id: i32, id: i32) -> Result<Comment, ApiError> {
    state
        .content
        .find_comment(post_id, id)
        .await?
        .ok_or(ApiError::NotFound { resource: "Comment", id })
}

/// Edit a comment's text (its author only)
#[utoipa::path(
    put,
    path = "/posts/{id}/comments/{comment_id}",
    params(
        ("id" = i32, Path, description = "Post ID"),
        ("comment_id" = i32, Path, description = "Comment ID")
    ),
    request_body = UpdateComment,
    responses(
        (status = 200, description = "Comment updated; author and publication date unchanged", body = Comment),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 403, description = "Not the author of the comment", body = String),
        (status = 404, description = "Comment not found", body = String),
        (status = 422, description = "Invalid input data", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn update_comment(
    State(state): State<AppState>,
    method: Method,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path((post_id, id)): Path<(i32, i32)>,
    Json(payload): Json<UpdateComment>,
) -> Result<Json<Comment>, ApiError> {
    payload.validate()?;

    let mut comment = load_comment(&state, post_id, id).await?;
    if !comment.is_authored_by(principal.user_id) {
        return Err(ApiError::Forbidden(format!(
            "User {} may not edit comment {}",
            principal.user_id, id
        )));
    }

    payload.apply_to(&mut comment);
    state.hooks.dispatch(&mut ViewEvent::new(
        method,
        Some(&principal),
        ViewResult::Comment(&mut comment),
    ));

    let comment = state.content.update_comment(comment).await?;
    debug!("Comment updated: id={}, post_id={}", comment.id, post_id);
    Ok(Json(comment))
}

/// Delete a comment (its author or an administrator)
#[utoipa::path(
    delete,
    path = "/posts/{id}/comments/{comment_id}",
    params(
        ("id" = i32, Path, description = "Post ID"),
        ("comment_id" = i32, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Missing, invalid or expired token", body = String),
        (status = 403, description = "Not the author and not an administrator", body = String),
        (status = 404, description = "Comment not found", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path((post_id, id)): Path<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    let comment = load_comment(&state, post_id, id).await?;
    if !comment.is_authored_by(principal.user_id) && !principal.role.is_admin() {
        return Err(ApiError::Forbidden(format!(
            "User {} may not delete comment {}",
            principal.user_id, id
        )));
    }

    if !state.content.delete_comment(post_id, id).await? {
        return Err(ApiError::NotFound { resource: "Comment", id });
    }
    info!("Comment deleted: id={}, post_id={}, by user_id={}", id, post_id, principal.user_id);
    Ok(StatusCode::NO_CONTENT)
}
