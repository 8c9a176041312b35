//! Resource-ownership authorization.
//!
//! Applied inside mutating handlers after authentication and after the target
//! is known: authenticate, resolve target, compare, then allow or reject.
//! A valid token alone never authorizes a write.

use std::fmt;

use super::{error::AuthError, middleware::Principal};
use crate::core_types::UserId;

/// Kind of resource an ownership check guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Post,
    Account,
}

/// Mutation being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Update,
    Delete,
    Follow,
    Unfollow,
    ChangePassword,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Post => "post",
            Self::Account => "account",
        })
    }
}

impl Resource {
    fn with_article(self) -> &'static str {
        match self {
            Self::Post => "a post",
            Self::Account => "an account",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Follow => "follow",
            Self::Unfollow => "unfollow",
            Self::ChangePassword => "change the password of",
        })
    }
}

/// Allow `action` on a resource only if the principal owns it.
///
/// For [`Resource::Account`] the owner is the account's own user id.
pub fn authorize(
    principal: &Principal,
    resource: Resource,
    owner_id: UserId,
    action: Action,
) -> Result<(), AuthError> {
    if principal.user_id == owner_id {
        return Ok(());
    }

    tracing::warn!(
        user_id = principal.user_id,
        owner_id,
        "Denied {} on {} owned by another user",
        action,
        resource
    );
    Err(AuthError::Forbidden(format!(
        "cannot {} {} that is not yours",
        action,
        resource.with_article()
    )))
}

/// Allow a social action only if it targets someone other than the principal.
pub fn authorize_other(
    principal: &Principal,
    target_id: UserId,
    action: Action,
) -> Result<(), AuthError> {
    if principal.user_id != target_id {
        return Ok(());
    }

    Err(AuthError::Forbidden(format!("cannot {} yourself", action)))
}
