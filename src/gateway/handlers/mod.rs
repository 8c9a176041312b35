//! HTTP handlers
//!
//! Handlers on authenticated routes take [`Principal`](crate::auth::Principal)
//! as their first extractor; ownership checks happen here, after the target
//! resource has been resolved.

pub mod health;
pub mod login;
pub mod posts;
pub mod users;

// Glob re-exports carry the `#[utoipa::path]` companions along.
pub use health::*;
pub use login::*;
pub use posts::*;
pub use users::*;
