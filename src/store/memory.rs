//! In-process product store.
//!
//! The name check and the write happen under one write lock, which makes the
//! uniqueness constraint as strong as a database `UNIQUE` index.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProductFilter, ProductStore, StoreError, NAME_CONSTRAINT};
use crate::catalog::{NewProduct, Product, SortDirection, SortField};

#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    rows: RwLock<HashMap<String, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

fn duplicate() -> StoreError {
    StoreError::Duplicate {
        constraint: NAME_CONSTRAINT.to_string(),
    }
}

fn compare(a: &Product, b: &Product, sort: SortField) -> Ordering {
    match sort {
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Price => a.price.cmp(&b.price),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Stock => a.stock.cmp(&b.stock),
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn find_and_count(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, u64), StoreError> {
        let rows = self.rows.read().await;
        let mut matching: Vec<&Product> = rows
            .values()
            .filter(|p| filter.matches_price(p.price.cents()))
            .collect();

        matching.sort_by(|a, b| {
            let primary = match filter.direction {
                SortDirection::Asc => compare(a, b, filter.sort),
                SortDirection::Desc => compare(b, a, filter.sort),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len() as u64;
        let skip = usize::try_from(filter.skip).unwrap_or(usize::MAX);
        let take = usize::try_from(filter.take).unwrap_or(usize::MAX);
        let page = matching.into_iter().skip(skip).take(take).cloned().collect();

        Ok((page, total))
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut rows = self.rows.write().await;
        if rows.values().any(|p| p.name == product.name) {
            return Err(duplicate());
        }

        let now = Utc::now();
        let record = Product {
            id: Uuid::new_v4().to_string(),
            name: product.name,
            price: product.price,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        rows.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn save(&self, product: &Product) -> Result<Product, StoreError> {
        let mut rows = self.rows.write().await;
        if rows
            .values()
            .any(|p| p.name == product.name && p.id != product.id)
        {
            return Err(duplicate());
        }

        let current = rows
            .get_mut(&product.id)
            .ok_or_else(|| StoreError::NotFound(product.id.clone()))?;
        current.name = product.name.clone();
        current.price = product.price;
        current.stock = product.stock;
        current.updated_at = Utc::now().max(current.updated_at);
        Ok(current.clone())
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.rows.write().await.remove(id).is_some())
    }
}
