//! Request DTOs for the catalog API
//!
//! Bodies reject unknown fields. Numbers are taken as JSON numbers and
//! range-checked when converted into catalog inputs.

use serde::Deserialize;

use crate::catalog::{normalize_name, parse_stock, NewProduct, Price, ProductPatch};

/// Request body for `POST /api/products`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

impl CreateProductRequest {
    /// Checks every field and builds the catalog input.
    pub fn into_input(self) -> Result<NewProduct, String> {
        Ok(NewProduct {
            name: normalize_name(&self.name)?,
            price: Price::from_f64(self.price).map_err(|err| err.to_string())?,
            stock: parse_stock(self.stock)?,
        })
    }
}

/// Request body for `PATCH /api/products/:id`. Any subset of fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub stock: Option<i64>,
}

impl From<UpdateProductRequest> for ProductPatch {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            name: req.name,
            price: req.price,
            stock: req.stock,
        }
    }
}
