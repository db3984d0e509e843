//! API Module
//!
//! Admin HTTP API exposing the operator console commands over JSON.
//!
//! # Endpoints
//! - `GET /cache`, `DELETE /cache`, `DELETE /cache/*key`
//! - `PUT /expiration`, `PUT /expiration/*key`
//! - `POST /run/*key`
//! - `GET /stats`, `GET /health`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
