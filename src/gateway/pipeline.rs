//! Request pipeline composer
//!
//! Each [`Route`] is wrapped as `log_request -> [authenticate] -> handler`.
//! Logging is always outermost so rejected requests are logged too, and a
//! route marked [`Route::authenticated`] never runs its handler (or any of
//! its extractors) without a verified principal.

use std::time::Instant;

use axum::{
    Router,
    extract::Request,
    handler::Handler,
    http::{Method, header},
    middleware::{Next, from_fn, from_fn_with_state},
    response::Response,
    routing::{self, MethodRouter},
};

use super::state::AppState;
use crate::auth::authenticate;

/// One entry of the route table.
pub struct Route {
    pub method: Method,
    pub uri: &'static str,
    pub requires_auth: bool,
    handler: MethodRouter<AppState>,
}

impl Route {
    fn new(method: Method, uri: &'static str, handler: MethodRouter<AppState>) -> Self {
        Self {
            method,
            uri,
            requires_auth: false,
            handler,
        }
    }

    pub fn get<H, T>(uri: &'static str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::GET, uri, routing::get(handler))
    }

    pub fn post<H, T>(uri: &'static str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::POST, uri, routing::post(handler))
    }

    pub fn put<H, T>(uri: &'static str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::PUT, uri, routing::put(handler))
    }

    pub fn delete<H, T>(uri: &'static str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::DELETE, uri, routing::delete(handler))
    }

    /// Require a valid bearer token before the handler runs.
    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }
}

/// Wrap every route in its middleware chain and mount it.
///
/// Routes sharing a URI are merged into one method router; registering the
/// same method twice for a URI panics at startup.
pub fn compose(state: AppState, routes: Vec<Route>) -> Router {
    let mut router = Router::new();

    for route in routes {
        let mut handler = route.handler;
        if route.requires_auth {
            handler = handler.layer(from_fn_with_state(state.tokens.clone(), authenticate));
        }
        handler = handler.layer(from_fn(log_request));

        tracing::debug!(
            method = %route.method,
            uri = route.uri,
            auth = route.requires_auth,
            "Mounted route"
        );
        router = router.route(route.uri, handler);
    }

    router.with_state(state)
}

/// Record method, URI, host, status and latency of every request.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        %uri,
        host = %host,
        status = response.status().as_u16(),
        latency_us = started.elapsed().as_micros() as u64,
        "request"
    );
    response
}
