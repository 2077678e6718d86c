// Content module
// Posts and comments; creation runs the lifecycle hooks that stamp author and date

pub mod handlers;
pub mod models;
pub mod repository;

pub use models::{Comment, CreateComment, CreatePost, Post, UpdateComment, UpdatePost};
pub use repository::{ContentStore, InMemoryContentRepository, PgContentRepository};
