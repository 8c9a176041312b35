//! DevBook - social network API server
//!
//! Accounts, follow relations, posts and likes behind stateless bearer-token
//! authentication.
//!
//! # Modules
//!
//! - [`core_types`] - Id aliases shared by every layer
//! - [`config`] - YAML configuration with env overrides
//! - [`logging`] - tracing subscriber setup
//! - [`db`] - PostgreSQL pool and schema
//! - [`auth`] - Password hashing, tokens, authentication middleware, ownership policy
//! - [`store`] - Storage traits with PostgreSQL and in-memory backends
//! - [`gateway`] - HTTP routes, handlers and the request pipeline

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod logging;

pub mod auth;
pub mod db;
pub mod store;

pub mod gateway;

pub use core_types::{PostId, UserId};
