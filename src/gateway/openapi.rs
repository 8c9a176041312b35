//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:5000/docs`
//! - OpenAPI JSON: `http://localhost:5000/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::ErrorResponse;
use crate::gateway::handlers::{HealthResponse, LoginRequest, LoginResponse};
use crate::store::{NewPost, NewUser, PasswordChange, Post, User, UserProfile};

/// Bearer JWT issued by `POST /login`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from POST /login, valid for 6 hours"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DevBook API",
        version = "1.0.0",
        description = "Social network API: accounts, follows, posts and likes behind bearer-token authentication.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::login,
        crate::gateway::handlers::create_user,
        crate::gateway::handlers::search_users,
        crate::gateway::handlers::get_user,
        crate::gateway::handlers::update_user,
        crate::gateway::handlers::delete_user,
        crate::gateway::handlers::follow,
        crate::gateway::handlers::unfollow,
        crate::gateway::handlers::followers,
        crate::gateway::handlers::following,
        crate::gateway::handlers::update_password,
        crate::gateway::handlers::create_post,
        crate::gateway::handlers::feed,
        crate::gateway::handlers::get_post,
        crate::gateway::handlers::update_post,
        crate::gateway::handlers::delete_post,
        crate::gateway::handlers::posts_by_author,
        crate::gateway::handlers::like_post,
        crate::gateway::handlers::unlike_post,
        crate::gateway::handlers::health_check,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            LoginRequest,
            LoginResponse,
            NewPost,
            NewUser,
            PasswordChange,
            Post,
            User,
            UserProfile,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Token issuance"),
        (name = "Users", description = "Accounts and follow relations"),
        (name = "Posts", description = "Posts, feed and likes"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
