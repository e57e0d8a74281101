//! API Module
//!
//! HTTP handlers and routing exposing one cache policy over REST.
//!
//! # Endpoints
//! - `PUT /cache/:id` - Store a JSON value
//! - `GET /cache/:id` - Retrieve a value by id
//! - `DELETE /cache/:id` - Remove an id
//! - `GET /stats` - Get engine statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
