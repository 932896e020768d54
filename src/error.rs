//! Error types for the catalog service
//!
//! Callers only ever see one of the outcome kinds below. Cache failures are
//! absorbed inside the cache layer and never reach this type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;
use crate::store::StoreError;

// == Catalog Error Enum ==
/// Outcome kinds surfaced by the catalog service.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Requested product id does not exist
    #[error("Product not found: {0}")]
    NotFound(String),

    /// Product name uniqueness violated, at pre-check or in the store
    #[error("Product name already exists: {0}")]
    Conflict(String),

    /// Malformed create/update input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Any other store failure, propagated unchanged
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { constraint } => CatalogError::Conflict(format!(
                "name violates unique constraint `{}`",
                constraint
            )),
            StoreError::NotFound(id) => CatalogError::NotFound(id),
            other => CatalogError::Store(other),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            CatalogError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            CatalogError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            CatalogError::Store(err) => {
                error!(error = %err, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err = CatalogError::from(StoreError::Duplicate {
            constraint: "product_name_key".to_string(),
        });
        assert!(matches!(err, CatalogError::Conflict(_)));
        assert!(err.to_string().contains("product_name_key"));
    }

    #[test]
    fn test_persistence_error_passes_through() {
        let err = CatalogError::from(StoreError::Persistence("connection reset".to_string()));
        assert!(matches!(err, CatalogError::Store(StoreError::Persistence(_))));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (CatalogError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (CatalogError::Conflict("x".into()), StatusCode::CONFLICT),
            (CatalogError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                CatalogError::Store(StoreError::Persistence("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
