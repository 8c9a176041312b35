//! Data models for users, posts and their request payloads
//!
//! JSON field names follow the public API (`authorId`, `created_at`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::core_types::{PostId, UserId};

/// User account as exposed by the API. The password hash never leaves the
/// credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(example = 42)]
    pub id: UserId,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada")]
    pub nickname: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Editable profile fields, shared by registration and profile update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate, ToSchema)]
pub struct UserProfile {
    #[validate(length(min = 1, max = 50, message = "name is required (max 50 chars)"))]
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "nickname is required (max 50 chars)"))]
    #[schema(example = "ada")]
    pub nickname: String,
    #[validate(email(message = "email is not a valid address"))]
    #[schema(example = "ada@example.com")]
    pub email: String,
}

impl UserProfile {
    /// Trim surrounding whitespace, then validate.
    pub fn prepare(self) -> Result<Self, ValidationErrors> {
        let profile = Self {
            name: self.name.trim().to_string(),
            nickname: self.nickname.trim().to_string(),
            email: self.email.trim().to_string(),
        };
        profile.validate()?;
        Ok(profile)
    }
}

/// Registration payload.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewUser {
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: UserProfile,
    #[validate(length(min = 1, message = "password is required"))]
    #[schema(example = "correct horse battery staple")]
    pub password: String,
}

impl NewUser {
    pub fn prepare(self) -> Result<Self, ValidationErrors> {
        let user = Self {
            profile: self.profile.prepare()?,
            password: self.password,
        };
        user.validate()?;
        Ok(user)
    }
}

/// Password change payload.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PasswordChange {
    pub current: String,
    #[validate(length(min = 1, message = "new password is required"))]
    pub new: String,
}

/// Post as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Post {
    #[schema(example = 7)]
    pub id: PostId,
    #[schema(example = "Hello")]
    pub title: String,
    #[schema(example = "First post!")]
    pub content: String,
    #[serde(rename = "authorId")]
    #[schema(example = 42)]
    pub author_id: UserId,
    #[serde(rename = "authorNickname")]
    #[schema(example = "ada")]
    pub author_nickname: String,
    pub likes: u64,
    pub created_at: DateTime<Utc>,
}

/// Post create/update payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate, ToSchema)]
pub struct NewPost {
    #[validate(length(min = 1, max = 50, message = "title is required (max 50 chars)"))]
    #[schema(example = "Hello")]
    pub title: String,
    #[validate(length(min = 1, max = 300, message = "content is required (max 300 chars)"))]
    #[schema(example = "First post!")]
    pub content: String,
}

impl NewPost {
    pub fn prepare(self) -> Result<Self, ValidationErrors> {
        let post = Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
        };
        post.validate()?;
        Ok(post)
    }
}
