//! Postgres-backed product store.
//!
//! Prices live in a `NUMERIC(12,2)` column and cross the wire as integer
//! cents, so no floating point is involved in storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ProductFilter, ProductStore, StoreError, NAME_CONSTRAINT};
use crate::catalog::{NewProduct, Price, Product, SortDirection, SortField};

const SELECT_COLUMNS: &str =
    "id, name, (price * 100)::BIGINT AS price_cents, stock, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price_cents: i64,
    stock: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.to_string(),
            name: row.name,
            price: Price::from_cents(row.price_cents).map_err(StoreError::from_persistence)?,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `product` table with its unique name constraint if absent.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS product (
                id UUID PRIMARY KEY,
                name VARCHAR(100) NOT NULL,
                price NUMERIC(12, 2) NOT NULL CHECK (price >= 0),
                stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                CONSTRAINT {} UNIQUE (name)
            )
            "#,
            NAME_CONSTRAINT
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Maps sqlx failures, singling out unique violations (SQLSTATE 23505).
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate {
            constraint: db.constraint().unwrap_or("unknown").to_string(),
        },
        other => StoreError::from_persistence(other),
    }
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::UpdatedAt => "updated_at",
        SortField::CreatedAt => "created_at",
        SortField::Price => "price",
        SortField::Name => "name",
        SortField::Stock => "stock",
    }
}

fn sort_keyword(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}

/// Non-UUID ids cannot exist in the table.
fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

fn push_price_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    match (filter.min_price_cents, filter.max_price_cents) {
        (Some(min), Some(max)) => {
            qb.push(" WHERE price BETWEEN (");
            qb.push_bind(min);
            qb.push("::NUMERIC / 100) AND (");
            qb.push_bind(max);
            qb.push("::NUMERIC / 100)");
        }
        (Some(min), None) => {
            qb.push(" WHERE price >= (");
            qb.push_bind(min);
            qb.push("::NUMERIC / 100)");
        }
        (None, Some(max)) => {
            qb.push(" WHERE price <= (");
            qb.push_bind(max);
            qb.push("::NUMERIC / 100)");
        }
        (None, None) => {}
    }
}

fn page_query(filter: &ProductFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM product", SELECT_COLUMNS));
    push_price_filter(&mut qb, filter);
    qb.push(format!(
        " ORDER BY {} {}, id ASC LIMIT ",
        sort_column(filter.sort),
        sort_keyword(filter.direction)
    ));
    qb.push_bind(i64::try_from(filter.take).unwrap_or(i64::MAX));
    qb.push(" OFFSET ");
    qb.push_bind(i64::try_from(filter.skip).unwrap_or(i64::MAX));
    qb
}

fn count_query(filter: &ProductFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM product");
    push_price_filter(&mut qb, filter);
    qb
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!("SELECT {} FROM product WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(Product::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {} FROM product WHERE name = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(Product::try_from).transpose()
    }

    async fn find_and_count(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, u64), StoreError> {
        let rows: Vec<ProductRow> = page_query(filter)
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let total: i64 = count_query(filter)
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let items = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((items, u64::try_from(total).unwrap_or_default()))
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, StoreError> {
        let sql = format!(
            "INSERT INTO product (id, name, price, stock) \
             VALUES ($1, $2, $3::NUMERIC / 100, $4) RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&product.name)
            .bind(product.price.cents())
            .bind(product.stock)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Product::try_from(row)
    }

    async fn save(&self, product: &Product) -> Result<Product, StoreError> {
        let id = parse_id(&product.id).ok_or_else(|| StoreError::NotFound(product.id.clone()))?;
        let sql = format!(
            "UPDATE product SET name = $2, price = $3::NUMERIC / 100, stock = $4, \
             updated_at = GREATEST(now(), updated_at) \
             WHERE id = $1 RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(&product.name)
            .bind(product.price.cents())
            .bind(product.stock)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| StoreError::NotFound(product.id.clone()))?;
        Product::try_from(row)
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
