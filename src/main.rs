//! DevBook server entry point
//!
//! ```text
//! config/<env>.yaml ─▶ logging ─▶ PostgreSQL (schema) ─▶ AppState ─▶ HTTP gateway
//! ```
//!
//! Usage: `devbook [--env <name>] [--port <port>]`

use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;

use devbook::auth::{CredentialHasher, TokenCodec};
use devbook::config::AppConfig;
use devbook::db::Database;
use devbook::gateway::{self, AppState};
use devbook::store::PgStore;

/// Config environment from `--env` / `-e`, defaulting to `dev`.
fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config =
        AppConfig::load(&env).with_context(|| format!("failed to load config for '{}'", env))?;
    if let Some(port) = get_port_override() {
        app_config.server.port = port;
    }

    let _log_guard = devbook::logging::init_logging(&app_config);
    tracing::info!("Starting DevBook in {} mode ({})", env, env!("GIT_HASH"));

    let database_url = app_config
        .database_url()
        .context("postgres_url or DATABASE_URL must be set")?;
    let db = Database::connect(&database_url, app_config.postgres_max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    db.init_schema()
        .await
        .context("failed to initialize schema")?;

    // Validated at load time.
    let secret = app_config
        .auth
        .resolved_jwt_secret()
        .context("jwt secret missing")?;
    let ttl = Duration::try_hours(app_config.auth.token_ttl_hours)
        .context("auth.token_ttl_hours out of range")?;
    let tokens = TokenCodec::new(secret.as_bytes(), ttl);
    let hasher = CredentialHasher::new(app_config.auth.hash_cost)?;

    let store = Arc::new(PgStore::new(db.pool().clone()));
    let state = AppState::new(tokens, hasher, store);

    gateway::run_server(&app_config.server, state).await
}
