//! HTTP listener lifecycle.
//!
//! `start_server` binds the listener and returns a `ServerHandle` that owns
//! the running server. The handle is the only way to reach the server once it
//! is listening: `stop` shuts it down gracefully, `wait` runs until a signal
//! arrives.

mod server;
mod shutdown;

pub use server::{start_server, ServerError, ServerHandle};
