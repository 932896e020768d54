//! Store Module
//!
//! The authoritative product repository. Name uniqueness is enforced by each
//! implementation at the storage layer and reported as
//! [`StoreError::Duplicate`].

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::{ListQuery, NewProduct, Product, SortDirection, SortField};

pub use memory::InMemoryProductStore;
pub use postgres::PgProductStore;

/// Name of the unique constraint on product names.
pub const NAME_CONSTRAINT: &str = "product_name_key";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl StoreError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Row selection and ordering for a page of products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductFilter {
    /// Inclusive lower bound in cents
    pub min_price_cents: Option<i64>,
    /// Inclusive upper bound in cents
    pub max_price_cents: Option<i64>,
    pub sort: SortField,
    pub direction: SortDirection,
    pub skip: u64,
    pub take: u64,
}

impl From<&ListQuery> for ProductFilter {
    fn from(query: &ListQuery) -> Self {
        let (min_price_cents, max_price_cents) = query.price_range_cents();
        Self {
            min_price_cents,
            max_price_cents,
            sort: query.sort(),
            direction: query.direction(),
            skip: query.skip(),
            take: query.size(),
        }
    }
}

impl ProductFilter {
    pub fn matches_price(&self, cents: i64) -> bool {
        self.min_price_cents.map_or(true, |min| cents >= min)
            && self.max_price_cents.map_or(true, |max| cents <= max)
    }
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError>;

    /// Exact, case-sensitive name lookup.
    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError>;

    /// One page of products plus the total number of rows matching the filter.
    /// Ties on the sort column are broken by id.
    async fn find_and_count(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, u64), StoreError>;

    /// Inserts a new product. Fails with `Duplicate` if the name is taken,
    /// regardless of any earlier lookup.
    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError>;

    /// Persists name, price and stock of an existing product and bumps
    /// `updated_at`. Fails with `Duplicate` if another product holds the name.
    async fn save(&self, product: &Product) -> Result<Product, StoreError>;

    /// Removes a product. Returns whether a row was deleted.
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;
}
