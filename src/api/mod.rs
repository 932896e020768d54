//! API Module
//!
//! HTTP handlers and routing for the product catalog REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check, including cache liveness
//! - `GET /api/products` - Paginated, sorted, price-filtered listing
//! - `GET /api/products/:id` - Fetch one product
//! - `POST /api/products` - Create a product
//! - `PATCH /api/products/:id` - Partially update a product
//! - `DELETE /api/products/:id` - Delete a product

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
