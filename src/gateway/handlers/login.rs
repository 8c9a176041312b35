use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{AuthError, ErrorResponse};
use crate::core_types::UserId;
use crate::gateway::error::ApiError;
use crate::gateway::extract::ApiJson;
use crate::gateway::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "correct horse battery staple")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = 42)]
    pub id: UserId,
    pub token: String,
}

/// Exchange e-mail and password for a bearer token.
///
/// Unknown e-mail and wrong password produce the same 401.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 401, description = "Credentials do not match", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Some((user_id, hashed)) = state.credentials.find_by_email(req.email.trim()).await? else {
        tracing::info!("Login rejected: unknown email");
        state.reject_unknown_account(req.password).await?;
        return Err(AuthError::Mismatch.into());
    };

    state
        .verify_password(hashed, req.password)
        .await
        .inspect_err(|_| tracing::info!(user_id, "Login rejected"))?;

    let token = state.tokens.issue(user_id)?;
    tracing::info!(user_id, "User logged in");

    Ok(Json(LoginResponse { id: user_id, token }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::auth::{CredentialHasher, TokenCodec};
    use crate::config::HashCostConfig;
    use crate::store::{MemoryStore, User};

    fn state() -> (AppState, Arc<MemoryStore>) {
        let hasher = CredentialHasher::new(HashCostConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenCodec::new(b"login-test-secret-0123456789abcdef!!", Duration::hours(1));
        (AppState::new(tokens, hasher, store.clone()), store)
    }

    fn request(email: &str, password: &str) -> ApiJson<LoginRequest> {
        ApiJson(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn test_unknown_email_still_verifies_a_hash() {
        let (state, _) = state();
        assert!(!state.decoy_ready());

        let result = login(State(state.clone()), request("nobody@example.com", "pw")).await;
        assert!(matches!(result, Err(ApiError::Auth(AuthError::Mismatch))));
        assert!(state.decoy_ready());

        // the decoy's own plaintext does not unlock an unknown account
        let result = login(
            State(state.clone()),
            request("nobody@example.com", "devbook-unknown-account"),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Auth(AuthError::Mismatch))));
    }

    #[tokio::test]
    async fn test_known_email_paths() {
        let (state, store) = state();
        store.seed_user(
            User {
                id: 5,
                name: "Ada".into(),
                nickname: "ada".into(),
                email: "ada@example.com".into(),
                created_at: Utc::now(),
            },
            state.hasher.hash("pw").unwrap(),
        );

        let result = login(State(state.clone()), request("ada@example.com", "nope")).await;
        assert!(matches!(result, Err(ApiError::Auth(AuthError::Mismatch))));
        assert!(!state.decoy_ready());

        let Json(ok) = login(State(state.clone()), request(" ada@example.com ", "pw"))
            .await
            .unwrap();
        assert_eq!(ok.id, 5);
        assert_eq!(state.tokens.extract_subject(&ok.token).unwrap(), 5);
    }
}
