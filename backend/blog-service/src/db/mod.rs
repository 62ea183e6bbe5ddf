/// Database access layer
///
/// [`Repository`] is the only way handlers touch storage. Two backends
/// implement it:
/// - [`PgRepository`]: PostgreSQL via sqlx, schema in `migrations/`
/// - [`MemoryRepository`]: in-process tables with the same constraints,
///   used by the test suite and `STORAGE_BACKEND=memory`
mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

use crate::models::{
    Comment, CommentView, Group, NewComment, NewGroup, NewPost, Post, PostChanges, PostFilter,
    PostView, User,
};
use thiserror::Error;

pub const NOT_SELF_FOLLOW: &str = "not_self_follow";
pub const USERS_USERNAME_KEY: &str = "users_username_key";
pub const GROUPS_SLUG_KEY: &str = "post_groups_slug_key";

/// Storage failures, with constraint violations kept apart from
/// everything else so callers can react to them
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("check constraint violated: {0}")]
    CheckViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        matches!(self, StoreError::UniqueViolation(name) if name == constraint)
    }

    pub fn is_check_violation(&self, constraint: &str) -> bool {
        matches!(self, StoreError::CheckViolation(name) if name == constraint)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some("23505") => return StoreError::UniqueViolation(constraint),
                Some("23514") => return StoreError::CheckViolation(constraint),
                Some("23503") => return StoreError::ForeignKeyViolation(constraint),
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage operations needed by the blog pages
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    // Users
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User>;
    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// Deletes the user together with their posts, comments and follows
    async fn delete_user(&self, id: i64) -> StoreResult<bool>;

    // Groups
    async fn create_group(&self, group: NewGroup) -> StoreResult<Group>;
    async fn find_group_by_id(&self, id: i64) -> StoreResult<Option<Group>>;
    async fn find_group_by_slug(&self, slug: &str) -> StoreResult<Option<Group>>;
    async fn list_groups(&self) -> StoreResult<Vec<Group>>;
    /// Deletes the group; its posts stay, with no group
    async fn delete_group(&self, id: i64) -> StoreResult<bool>;

    // Posts
    async fn create_post(&self, post: NewPost) -> StoreResult<Post>;
    async fn find_post(&self, id: i64) -> StoreResult<Option<PostView>>;
    async fn update_post(&self, id: i64, changes: PostChanges) -> StoreResult<Option<Post>>;
    /// Deletes the post and its comments
    async fn delete_post(&self, id: i64) -> StoreResult<bool>;
    async fn count_posts(&self, filter: PostFilter) -> StoreResult<i64>;
    /// Newest first
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<PostView>>;

    // Comments
    async fn create_comment(&self, comment: NewComment) -> StoreResult<Comment>;
    /// Oldest first
    async fn list_comments(&self, post_id: i64) -> StoreResult<Vec<CommentView>>;

    // Follows
    /// Get-or-create; returns true if a new row was inserted
    async fn follow(&self, user_id: i64, author_id: i64) -> StoreResult<bool>;
    /// Returns true if a row was removed
    async fn unfollow(&self, user_id: i64, author_id: i64) -> StoreResult<bool>;
    async fn is_following(&self, user_id: i64, author_id: i64) -> StoreResult<bool>;
    async fn count_followers(&self, author_id: i64) -> StoreResult<i64>;
    async fn count_following(&self, user_id: i64) -> StoreResult<i64>;

    /// Cheap connectivity probe used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}
