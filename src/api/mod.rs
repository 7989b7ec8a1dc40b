//! API Module
//!
//! HTTP handlers and routing for the search gateway.
//!
//! # Endpoints
//! - `GET /api/products/search` - Cached product search
//! - `GET /api/products/autocomplete` - Cached name suggestions
//! - `GET /stats` - Cache statistics
//! - `DELETE /cache` - Drop every cached result
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
