//! HTTP routes and router assembly.
//!
//! The route table is data: an ordered list of `{method, path, handler}`
//! entries, each with an optional Cache-Control value. `create_router` turns
//! the table into an Axum router and wraps it in the middleware stack.
//!
//! Middleware order, outermost first:
//! 1. request id span
//! 2. permissive CORS (also answers preflight requests)
//! 3. JSON body parsing
//!
//! Anything not in the table, including a known path with an unlisted
//! method, answers 404.

pub mod health;
pub mod home;

use std::collections::BTreeMap;

use axum::{
    http::{Method, Uri},
    middleware,
    response::Response,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::CACHE_CONTROL_HEALTH;
use crate::error::AppError;
use crate::middleware::{json_body_layer, request_id_layer};

/// Handler producing a fixed response.
pub type StaticHandler = fn() -> Response;

/// One entry of the route table.
#[derive(Debug, Clone, Copy)]
pub struct RouteEntry {
    pub method: MethodFilter,
    pub path: &'static str,
    pub handler: StaticHandler,
    /// Cache-Control applied when the handler did not set one
    pub cache_control: Option<&'static str>,
}

impl RouteEntry {
    fn method_router(&self) -> MethodRouter {
        let handler = self.handler;
        let method_router = on(self.method, move || async move { handler() });

        match self.cache_control {
            Some(value) => method_router.layer(SetResponseHeaderLayer::if_not_present(
                CACHE_CONTROL,
                HeaderValue::from_static(value),
            )),
            None => method_router,
        }
    }
}

/// The service's route table.
pub const ROUTES: &[RouteEntry] = &[
    RouteEntry {
        method: MethodFilter::GET,
        path: "/",
        handler: home::index,
        cache_control: None,
    },
    // Health check - no caching, always fresh for liveness probes
    RouteEntry {
        method: MethodFilter::GET,
        path: health::HEALTH_PATH,
        handler: health::health,
        cache_control: Some(CACHE_CONTROL_HEALTH),
    },
];

/// Fallback for unmatched paths and methods.
pub async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound {
        method,
        path: uri.path().to_string(),
    }
}

/// Creates the router for `ROUTES` with the full middleware stack.
pub fn create_router() -> Router {
    create_router_from(ROUTES)
}

/// Creates a router from an arbitrary route table.
///
/// Entries sharing a path are merged into one method router. Two entries
/// with the same method and path panic, as Axum does for overlapping routes.
pub fn create_router_from(routes: &[RouteEntry]) -> Router {
    let mut by_path: BTreeMap<&'static str, MethodRouter> = BTreeMap::new();
    for entry in routes {
        let method_router = match by_path.remove(entry.path) {
            Some(existing) => existing.merge(entry.method_router()),
            None => entry.method_router(),
        };
        by_path.insert(entry.path, method_router);
    }

    let router = by_path
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router.route(path, method_router.fallback(not_found))
        });

    with_middleware(router.fallback(not_found))
}

/// Wrap a router in the middleware stack.
pub fn with_middleware(router: Router) -> Router {
    router
        // JSON body parsing - runs before handlers and the 404 fallback
        .layer(middleware::from_fn(json_body_layer))
        // CORS - wraps body parsing so rejections carry the headers too
        .layer(CorsLayer::permissive())
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
