//! Core types used throughout the system
//!
//! Identifiers are unsigned 64-bit integers on the Rust side and `BIGINT`
//! columns in PostgreSQL.

/// User ID - globally unique, immutable after assignment.
///
/// # Usage:
/// - Primary key for user accounts
/// - Subject (`userId`) claim of every issued token
/// - Owner reference on posts and follow edges
pub type UserId = u64;

/// Post ID - unique within the system
pub type PostId = u64;
