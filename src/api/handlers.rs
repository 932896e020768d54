//! API Handlers
//!
//! HTTP request handlers for the catalog endpoints. Handlers only translate
//! between HTTP and [`CatalogService`]; every rule lives in the service.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::cache::CatalogCache;
use crate::catalog::{
    CacheTtl, CatalogService, ListQuery, Product, ProductPage, ProductPatch, RawListQuery,
};
use crate::error::{CatalogError, Result};
use crate::models::{CreateProductRequest, HealthResponse, UpdateProductRequest};
use crate::store::ProductStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }

    /// Wires a store and a cache into a fresh service.
    pub fn from_parts(store: Arc<dyn ProductStore>, cache: CatalogCache, ttl: CacheTtl) -> Self {
        Self::new(CatalogService::new(store, cache, ttl))
    }
}

// Body parse failures are validation errors like any other.
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| CatalogError::Validation(rejection.body_text()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.catalog.cache();
    let status = match (cache.is_enabled(), cache.is_available()) {
        (false, _) => "disabled",
        (true, true) => "up",
        (true, false) => "down",
    };
    Json(HealthResponse::healthy(status))
}

/// Handler for GET /api/products
///
/// Query parameters are normalized, never rejected. Repeated parameters keep
/// their first value and an undecodable query string counts as empty.
pub async fn list_products(
    State(state): State<AppState>,
    params: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ProductPage>> {
    let raw = params
        .map(|Query(pairs)| RawListQuery::from_pairs(pairs))
        .unwrap_or_default();
    let query = ListQuery::from_raw(&raw);
    Ok(Json(state.catalog.list(&query).await?))
}

/// Handler for GET /api/products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog.get_by_id(&id).await?))
}

/// Handler for POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = json_body(payload)?
        .into_input()
        .map_err(CatalogError::Validation)?;

    let product = state.catalog.create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Handler for PATCH /api/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<Product>> {
    let patch: ProductPatch = json_body(payload)?.into();
    Ok(Json(state.catalog.update(&id, patch).await?))
}

/// Handler for DELETE /api/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.catalog.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
