//! Authentication and authorization.
//!
//! ## Components
//! - `password`: Argon2id credential hashing
//! - `token`: HMAC-signed stateless bearer tokens
//! - `middleware`: Axum bearer-token middleware and the `Principal` extractor
//! - `policy`: resource-ownership checks for mutating handlers
//! - `error`: auth error taxonomy and its HTTP mapping

pub mod error;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod token;

pub use error::{AuthError, ErrorResponse};
pub use middleware::{Principal, authenticate, bearer_token};
pub use password::{CredentialHasher, HashedCredential};
pub use policy::{Action, Resource, authorize, authorize_other};
pub use token::{Claims, TokenCodec};
