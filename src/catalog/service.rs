//! Catalog Service
//!
//! Orchestrates the key builder, the cache and the store.
//!
//! Reads go cache-first and fall back to the store on any miss, populating
//! the cache afterwards. Writes go to the store and then invalidate the whole
//! list namespace plus the affected item key. Invalidation is fire-and-forget:
//! if it fails, readers may see data up to one TTL old.
//!
//! Name uniqueness is checked up front, but the store's own constraint is
//! what actually decides; a violation from either surfaces as
//! [`CatalogError::Conflict`].

use std::sync::Arc;

use tracing::{debug, info};

use super::product::{normalize_name, parse_stock, NewProduct, Price, Product, ProductPatch};
use super::query::{ListQuery, ProductPage};
use crate::cache::{item_key, list_key, CatalogCache, LIST_PREFIX};
use crate::error::{CatalogError, Result};
use crate::store::{ProductFilter, ProductStore};

/// Lifetimes of cached entries, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub item_secs: u64,
    pub list_secs: u64,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            item_secs: 60,
            list_secs: 30,
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn ProductStore>,
    cache: CatalogCache,
    ttl: CacheTtl,
}

impl CatalogService {
    pub fn new(store: Arc<dyn ProductStore>, cache: CatalogCache, ttl: CacheTtl) -> Self {
        Self { store, cache, ttl }
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    // == Get By Id ==
    /// Returns a cached item as-is, without re-checking the store.
    pub async fn get_by_id(&self, id: &str) -> Result<Product> {
        let key = item_key(id);
        if let Some(product) = self.cache.get::<Product>(&key).await {
            debug!(key = %key, "Item cache hit");
            return Ok(product);
        }

        let product = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        self.cache.set(&key, &product, self.ttl.item_secs).await;
        Ok(product)
    }

    // == List ==
    /// Returns one page of products. A page past the end is empty but still
    /// reports the real `total` and `totalPages`.
    pub async fn list(&self, query: &ListQuery) -> Result<ProductPage> {
        let key = list_key(query);
        if let Some(page) = self.cache.get::<ProductPage>(&key).await {
            debug!(key = %key, "List cache hit");
            return Ok(page);
        }

        let (items, total) = self
            .store
            .find_and_count(&ProductFilter::from(query))
            .await?;

        let page = ProductPage {
            page: query.page(),
            size: query.size(),
            total,
            total_pages: query.total_pages(total),
            items,
        };

        self.cache.set(&key, &page, self.ttl.list_secs).await;
        Ok(page)
    }

    // == Create ==
    pub async fn create(&self, input: NewProduct) -> Result<Product> {
        let name = normalize_name(&input.name).map_err(CatalogError::Validation)?;

        if self.store.find_by_name(&name).await?.is_some() {
            return Err(CatalogError::Conflict(name));
        }

        // The lookup above can race with another create; a duplicate from the
        // store converts to Conflict here as well.
        let saved = self.store.insert(NewProduct { name, ..input }).await?;

        self.invalidate(&saved.id).await;
        info!(id = %saved.id, name = %saved.name, "Product created");
        Ok(saved)
    }

    // == Update ==
    /// Applies only the fields present in `patch`.
    pub async fn update(&self, id: &str, patch: ProductPatch) -> Result<Product> {
        let mut product = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;

        if patch.is_empty() {
            debug!(id = %id, "Empty patch, only updatedAt changes");
        }

        let name = patch
            .name
            .as_deref()
            .map(normalize_name)
            .transpose()
            .map_err(CatalogError::Validation)?;
        let price = patch
            .price
            .map(Price::from_f64)
            .transpose()
            .map_err(|err| CatalogError::Validation(err.to_string()))?;
        let stock = patch
            .stock
            .map(parse_stock)
            .transpose()
            .map_err(CatalogError::Validation)?;

        if let Some(name) = name {
            // Keeping the current name must never conflict with itself
            if name != product.name && self.store.find_by_name(&name).await?.is_some() {
                return Err(CatalogError::Conflict(name));
            }
            product.name = name;
        }
        if let Some(price) = price {
            product.price = price;
        }
        if let Some(stock) = stock {
            product.stock = stock;
        }

        let saved = self.store.save(&product).await?;

        self.invalidate(id).await;
        info!(id = %id, "Product updated");
        Ok(saved)
    }

    // == Delete ==
    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(CatalogError::NotFound(id.to_string()));
        }

        let removed = self.store.remove(id).await?;

        self.invalidate(id).await;
        info!(id = %id, removed, "Product deleted");
        Ok(())
    }

    /// Drops every cached list page and the item entry for `id`.
    async fn invalidate(&self, id: &str) {
        let key = item_key(id);
        tokio::join!(
            self.cache.delete_by_prefix(LIST_PREFIX),
            self.cache.delete(&key),
        );
    }
}
