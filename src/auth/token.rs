//! Stateless bearer tokens (compact JWS, HMAC-signed).
//!
//! Claims on the wire:
//!
//! ```json
//! {"authorized": true, "exp": 1735689600, "userId": 42}
//! ```
//!
//! There is no server-side record of issued tokens: a token is usable from
//! issuance until `exp` and cannot be revoked earlier.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use crate::core_types::UserId;

/// Default lifetime of an issued token.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 6;

/// Upper bound on a configured token lifetime (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

/// Algorithm used when issuing.
const ISSUE_ALGORITHM: Algorithm = Algorithm::HS256;

/// Header algorithms accepted on verification. Anything else (`none`, RSA,
/// EC, EdDSA) is refused before the signature is even checked.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub authorized: bool,
    /// Expiry as Unix seconds. The token is dead at `now >= exp`.
    pub exp: u64,
    #[serde(rename = "userId", deserialize_with = "subject_id::deserialize")]
    pub user_id: UserId,
}

/// Decodes `userId` as an exact unsigned integer. Loosely-typed encoders may
/// emit it as a float (`42.0`); that is accepted only when it is integral,
/// non-negative and within the 53-bit range a double represents exactly.
mod subject_id {
    use serde::de::{self, Deserializer, Unexpected, Visitor};
    use std::fmt;

    use crate::core_types::UserId;

    /// 2^53, the largest integer every smaller integer of which is exact in f64.
    pub(super) const MAX_FLOAT_EXACT: f64 = 9_007_199_254_740_992.0;

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<UserId, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SubjectVisitor)
    }

    struct SubjectVisitor;

    impl<'de> Visitor<'de> for SubjectVisitor {
        type Value = UserId;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer user id")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<UserId, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<UserId, E> {
            UserId::try_from(v).map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<UserId, E> {
            if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= MAX_FLOAT_EXACT {
                Ok(v as UserId)
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }
    }
}

/// Issues and verifies tokens with one process-wide symmetric key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(ISSUE_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        // Expiry is checked in `verify_at` against an explicit clock, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject`, valid for the configured TTL from now.
    pub fn issue(&self, subject: UserId) -> Result<String, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: UserId, now: DateTime<Utc>) -> Result<String, AuthError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::ExpiryOutOfRange)?;
        let claims = Claims {
            authorized: true,
            exp: expires_at.timestamp().max(0) as u64,
            user_id: subject,
        };

        encode(&Header::new(ISSUE_ALGORITHM), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    /// Check structure, algorithm, signature and expiry against the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Same as [`verify`](Self::verify) with an explicit clock. Every failure
    /// is reported as [`AuthError::InvalidToken`]; the reason is only logged.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                AuthError::InvalidToken
            })?
            .claims;

        let now = u64::try_from(now.timestamp()).unwrap_or(0);
        if now >= claims.exp {
            tracing::debug!("Token rejected: expired at {}", claims.exp);
            return Err(AuthError::InvalidToken);
        }

        if !claims.authorized {
            tracing::debug!("Token rejected: authorized=false");
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }

    /// Verify, then return the subject id.
    pub fn extract_subject(&self, token: &str) -> Result<UserId, AuthError> {
        self.verify(token).map(|claims| claims.user_id)
    }
}
