use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::OnceCell;

use crate::auth::{AuthError, CredentialHasher, HashedCredential, TokenCodec};
use crate::store::{CredentialStore, PostStore, UserStore};

/// Shared gateway state. Cloned per request; every field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenCodec>,
    pub hasher: Arc<CredentialHasher>,
    pub users: Arc<dyn UserStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub posts: Arc<dyn PostStore>,
    /// Hash verified against on unknown-account logins, built on first use.
    decoy: Arc<OnceCell<HashedCredential>>,
}

impl AppState {
    /// Build state around one backend that implements every store trait.
    pub fn new<S>(tokens: TokenCodec, hasher: CredentialHasher, store: Arc<S>) -> Self
    where
        S: UserStore + CredentialStore + PostStore + 'static,
    {
        Self {
            tokens: Arc::new(tokens),
            hasher: Arc::new(hasher),
            users: store.clone(),
            credentials: store.clone(),
            posts: store,
            decoy: Arc::new(OnceCell::new()),
        }
    }

    /// Argon2 is CPU-bound, so hashing runs on the blocking pool.
    pub async fn hash_password(&self, secret: String) -> Result<HashedCredential, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?
    }

    pub async fn verify_password(
        &self,
        hashed: HashedCredential,
        candidate: String,
    ) -> Result<(), AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&hashed, &candidate))
            .await
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?
    }

    /// Spend one verification on a throwaway hash and reject.
    ///
    /// Costs the same Argon2 work as a wrong-password rejection.
    pub async fn reject_unknown_account(&self, candidate: String) -> Result<(), AuthError> {
        let decoy = self
            .decoy
            .get_or_try_init(|| self.hash_password("devbook-unknown-account".to_string()))
            .await?
            .clone();
        match self.verify_password(decoy, candidate).await {
            Ok(()) | Err(AuthError::Mismatch) => Err(AuthError::Mismatch),
            Err(e) => Err(e),
        }
    }

    #[cfg(test)]
    pub(crate) fn decoy_ready(&self) -> bool {
        self.decoy.initialized()
    }
}

impl FromRef<AppState> for Arc<TokenCodec> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
