//! User accounts and follow relations

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::auth::{Action, ErrorResponse, Principal, Resource, authorize, authorize_other};
use crate::core_types::UserId;
use crate::gateway::error::ApiError;
use crate::gateway::extract::{ApiJson, ApiPath, ApiQuery};
use crate::gateway::state::AppState;
use crate::store::{NewUser, PasswordChange, User, UserProfile};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Substring of name or nickname, case-insensitive. Empty matches all.
    #[serde(default)]
    pub user: String,
}

async fn existing_user(state: &AppState, user_id: UserId) -> Result<User, ApiError> {
    state
        .users
        .load(user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 409, description = "E-mail or nickname taken", body = ErrorResponse)
    ),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let req = req.prepare()?;
    let hashed = state.hash_password(req.password).await?;

    let user_id = state.users.create(&req.profile, &hashed).await?;
    let user = existing_user(&state, user_id).await?;
    tracing::info!(user_id, nickname = %user.nickname, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/users",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching users", body = Vec<User>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn search_users(
    _principal: Principal,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.users.search(params.user.trim()).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_user(
    _principal: Principal,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(existing_user(&state, user_id).await?))
}

/// Update one's own profile
#[utoipa::path(
    put,
    path = "/users/{user_id}",
    params(("user_id" = u64, Path, description = "User id")),
    request_body = UserProfile,
    responses(
        (status = 204, description = "Updated"),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not your account", body = ErrorResponse),
        (status = 409, description = "E-mail or nickname taken", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_user(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
    ApiJson(profile): ApiJson<UserProfile>,
) -> Result<StatusCode, ApiError> {
    authorize(&principal, Resource::Account, user_id, Action::Update)?;
    let profile = profile.prepare()?;

    state.users.update(user_id, &profile).await?;
    tracing::info!(user_id, "Profile updated");
    Ok(StatusCode::NO_CONTENT)
}

/// Delete one's own account with its posts and follow relations
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    params(("user_id" = u64, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not your account", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_user(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<StatusCode, ApiError> {
    authorize(&principal, Resource::Account, user_id, Action::Delete)?;

    state.users.delete(user_id).await?;
    tracing::info!(user_id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Follow another user
#[utoipa::path(
    post,
    path = "/users/{user_id}/follow",
    params(("user_id" = u64, Path, description = "User to follow")),
    responses(
        (status = 204, description = "Following"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Cannot follow yourself", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn follow(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<StatusCode, ApiError> {
    authorize_other(&principal, user_id, Action::Follow)?;
    existing_user(&state, user_id).await?;

    state.users.follow(user_id, principal.user_id).await?;
    tracing::info!(user_id, follower_id = principal.user_id, "Followed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/unfollow",
    params(("user_id" = u64, Path, description = "User to unfollow")),
    responses(
        (status = 204, description = "No longer following"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Cannot unfollow yourself", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn unfollow(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<StatusCode, ApiError> {
    authorize_other(&principal, user_id, Action::Unfollow)?;

    state.users.unfollow(user_id, principal.user_id).await?;
    tracing::info!(user_id, follower_id = principal.user_id, "Unfollowed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/followers",
    params(("user_id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "Followers", body = Vec<User>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn followers(
    _principal: Principal,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.followers(user_id).await?))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/following",
    params(("user_id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "Users followed", body = Vec<User>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn following(
    _principal: Principal,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.following(user_id).await?))
}

/// Change one's own password; the current password must match.
#[utoipa::path(
    post,
    path = "/users/{user_id}/update-password",
    params(("user_id" = u64, Path, description = "User id")),
    request_body = PasswordChange,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Not authenticated or current password wrong", body = ErrorResponse),
        (status = 403, description = "Not your account", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_password(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
    ApiJson(change): ApiJson<PasswordChange>,
) -> Result<StatusCode, ApiError> {
    authorize(&principal, Resource::Account, user_id, Action::ChangePassword)?;
    change.validate()?;

    let stored = state
        .credentials
        .load_password_hash(user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    state.verify_password(stored, change.current).await?;

    let hashed = state.hash_password(change.new).await?;
    state
        .credentials
        .replace_password_hash(user_id, &hashed)
        .await?;
    tracing::info!(user_id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}
