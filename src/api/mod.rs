//! API module
//!
//! HTTP API endpoints and middleware.

pub mod auth;
pub mod budgets;
pub mod dto;
pub mod expenses;
pub mod extract;
pub mod loans;
pub mod middleware;
pub mod routes;

pub use routes::{build_router, cors_layer, create_router};
