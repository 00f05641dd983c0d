//! Terraconsole API server library.
//!
//! Exposes config, state, error handling, routes and the executor channel
//! so integration tests and the binary entrypoint can both build the app.

pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
