//! Posts, feed and likes

use axum::{Json, extract::State, http::StatusCode};

use crate::auth::{Action, ErrorResponse, Principal, Resource, authorize};
use crate::core_types::{PostId, UserId};
use crate::gateway::error::ApiError;
use crate::gateway::extract::{ApiJson, ApiPath};
use crate::gateway::state::AppState;
use crate::store::{NewPost, Post};

/// Resolve the author of `post_id` and require the principal to be it.
async fn authorize_post(
    state: &AppState,
    principal: &Principal,
    post_id: PostId,
    action: Action,
) -> Result<(), ApiError> {
    let owner_id = state
        .posts
        .load_owner_id(post_id)
        .await?
        .ok_or(ApiError::NotFound("post"))?;
    authorize(principal, Resource::Post, owner_id, action)?;
    Ok(())
}

#[utoipa::path(
    post,
    path = "/posts",
    request_body = NewPost,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn create_post(
    principal: Principal,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewPost>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let req = req.prepare()?;

    let post_id = state.posts.create(principal.user_id, &req).await?;
    let post = state
        .posts
        .load(post_id)
        .await?
        .ok_or(ApiError::NotFound("post"))?;
    tracing::info!(post_id, author_id = principal.user_id, "Post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// Posts by the caller and by everyone the caller follows, newest first.
#[utoipa::path(
    get,
    path = "/posts",
    responses(
        (status = 200, description = "Feed", body = Vec<Post>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn feed(
    principal: Principal,
    State(state): State<AppState>,
) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.posts.feed(principal.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}",
    params(("post_id" = u64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = Post),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "No such post", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn get_post(
    _principal: Principal,
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<PostId>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .posts
        .load(post_id)
        .await?
        .ok_or(ApiError::NotFound("post"))?;
    Ok(Json(post))
}

#[utoipa::path(
    put,
    path = "/posts/{post_id}",
    params(("post_id" = u64, Path, description = "Post id")),
    request_body = NewPost,
    responses(
        (status = 204, description = "Updated"),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not your post", body = ErrorResponse),
        (status = 404, description = "No such post", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn update_post(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<PostId>,
    ApiJson(req): ApiJson<NewPost>,
) -> Result<StatusCode, ApiError> {
    authorize_post(&state, &principal, post_id, Action::Update).await?;
    let req = req.prepare()?;

    state.posts.update(post_id, &req).await?;
    tracing::info!(post_id, "Post updated");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/posts/{post_id}",
    params(("post_id" = u64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not your post", body = ErrorResponse),
        (status = 404, description = "No such post", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn delete_post(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<PostId>,
) -> Result<StatusCode, ApiError> {
    authorize_post(&state, &principal, post_id, Action::Delete).await?;

    state.posts.delete(post_id).await?;
    tracing::info!(post_id, "Post deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/posts",
    params(("user_id" = u64, Path, description = "Author id")),
    responses(
        (status = 200, description = "Posts by the user, newest first", body = Vec<Post>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn posts_by_author(
    _principal: Principal,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<Vec<Post>>, ApiError> {
    if state.users.load(user_id).await?.is_none() {
        return Err(ApiError::NotFound("user"));
    }
    Ok(Json(state.posts.by_author(user_id).await?))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/like",
    params(("post_id" = u64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Liked"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "No such post", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn like_post(
    _principal: Principal,
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<PostId>,
) -> Result<StatusCode, ApiError> {
    state.posts.like(post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a like; the counter stops at zero.
#[utoipa::path(
    post,
    path = "/posts/{post_id}/unlike",
    params(("post_id" = u64, Path, description = "Post id")),
    responses(
        (status = 204, description = "Unliked"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "No such post", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Posts"
)]
pub async fn unlike_post(
    _principal: Principal,
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<PostId>,
) -> Result<StatusCode, ApiError> {
    state.posts.unlike(post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
