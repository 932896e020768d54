//! Catalog Module
//!
//! Product records, list query normalization and the cache-coherent
//! [`CatalogService`].

mod product;
mod query;
mod service;

pub use product::{
    normalize_name, parse_stock, NewProduct, Price, PriceError, Product, ProductPatch,
    MAX_NAME_CHARS, MAX_PRICE_CENTS, MIN_NAME_CHARS,
};
pub use query::{
    ListQuery, ProductPage, RawListQuery, SortDirection, SortField, DEFAULT_PAGE,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use service::{CacheTtl, CatalogService};
