//! HTTP surface: handlers and router

pub mod handlers;
pub mod server;

pub use handlers::AppState;
pub use server::{cors_layer, create_router, run_server, API_BASE};
