//! Backend - a minimal HTTP server
//!
//! Serves a root route and a health check behind permissive CORS and JSON
//! body parsing. The route table lives in [`routes::ROUTES`]; the listener is
//! owned by the [`ServerHandle`] returned from [`start_server`].

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

pub use config::AppConfig;
pub use error::AppError;
pub use http::{start_server, ServerError, ServerHandle};
pub use routes::create_router;
