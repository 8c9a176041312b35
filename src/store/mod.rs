//! Storage layer for users, follow relations and posts
//!
//! Handlers depend only on the traits below:
//! - [`PgStore`] backs them with PostgreSQL in production
//! - [`MemoryStore`] backs them in tests

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::HashedCredential;
use crate::core_types::{PostId, UserId};

pub use memory::MemoryStore;
pub use models::{NewPost, NewUser, PasswordChange, Post, User, UserProfile};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Target row does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique field (email or nickname) already taken.
    #[error("{0} already in use")]
    Duplicate(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Users
// ============================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return the assigned id.
    async fn create(&self, profile: &UserProfile, password: &HashedCredential)
    -> StoreResult<UserId>;

    /// Users whose name or nickname contains `filter` (case-insensitive).
    async fn search(&self, filter: &str) -> StoreResult<Vec<User>>;

    async fn load(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Overwrite the profile fields. `NotFound` if the user is gone.
    async fn update(&self, user_id: UserId, profile: &UserProfile) -> StoreResult<()>;

    /// Delete the user together with their posts and follow edges.
    async fn delete(&self, user_id: UserId) -> StoreResult<()>;

    /// Record that `follower_id` follows `user_id`. Idempotent.
    async fn follow(&self, user_id: UserId, follower_id: UserId) -> StoreResult<()>;

    async fn unfollow(&self, user_id: UserId, follower_id: UserId) -> StoreResult<()>;

    /// Users following `user_id`.
    async fn followers(&self, user_id: UserId) -> StoreResult<Vec<User>>;

    /// Users that `user_id` follows.
    async fn following(&self, user_id: UserId) -> StoreResult<Vec<User>>;
}

// ============================================================================
// Credentials
// ============================================================================

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Id and stored hash of the account registered under `email`.
    async fn find_by_email(&self, email: &str)
    -> StoreResult<Option<(UserId, HashedCredential)>>;

    async fn load_password_hash(&self, user_id: UserId) -> StoreResult<Option<HashedCredential>>;

    async fn replace_password_hash(
        &self,
        user_id: UserId,
        password: &HashedCredential,
    ) -> StoreResult<()>;
}

// ============================================================================
// Posts
// ============================================================================

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, author_id: UserId, post: &NewPost) -> StoreResult<PostId>;

    /// Posts by `user_id` and by everyone `user_id` follows, newest first.
    async fn feed(&self, user_id: UserId) -> StoreResult<Vec<Post>>;

    async fn load(&self, post_id: PostId) -> StoreResult<Option<Post>>;

    /// Author of the post, used for ownership checks.
    async fn load_owner_id(&self, post_id: PostId) -> StoreResult<Option<UserId>>;

    /// Posts by one author, newest first.
    async fn by_author(&self, author_id: UserId) -> StoreResult<Vec<Post>>;

    async fn update(&self, post_id: PostId, post: &NewPost) -> StoreResult<()>;

    async fn delete(&self, post_id: PostId) -> StoreResult<()>;

    async fn like(&self, post_id: PostId) -> StoreResult<()>;

    /// Decrement the like counter, never below zero.
    async fn unlike(&self, post_id: PostId) -> StoreResult<()>;
}
