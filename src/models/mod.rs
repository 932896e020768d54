//! Request and response bodies for the catalog HTTP API

pub mod requests;
pub mod responses;

pub use requests::{CreateProductRequest, UpdateProductRequest};
pub use responses::{ErrorResponse, HealthResponse};
