use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopError};

pub type ProductId = i32;

/// What deleting a product does to cart items that still reference it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Refuse the delete while the product sits in the cart
    #[default]
    Restrict,
    /// Drop the referencing cart items together with the product
    Cascade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub stock: i32,
}

/// Body of product create and full-replace update requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub stock: i32,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64, description: Option<String>, stock: i32) -> Self {
        Self {
            name: name.into(),
            price,
            description,
            stock,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ShopError::Validation("Product name must not be empty".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ShopError::Validation(format!(
                "Product price must be a non-negative number, got {}",
                self.price
            )));
        }
        if self.stock < 0 {
            return Err(ShopError::Validation(format!(
                "Product stock must not be negative, got {}",
                self.stock
            )));
        }
        Ok(())
    }

    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            description: self.description,
            stock: self.stock,
        }
    }
}
