use thiserror::Error;

use crate::model::ProductId;

pub type Result<T> = std::result::Result<T, ShopError>;

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },
    #[error("Stock for product {0} would exceed the largest storable count")]
    StockOverflow(ProductId),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i32),
    #[error("{0}")]
    Validation(String),
    #[error("Product {0} is still referenced by cart items")]
    ProductInCart(ProductId),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ShopError {
    pub fn product_not_found() -> Self {
        ShopError::NotFound("Product not found".to_string())
    }

    pub fn cart_item_not_found() -> Self {
        ShopError::NotFound("Cart item not found".to_string())
    }

    pub fn duplicate_name() -> Self {
        ShopError::Conflict("Product with this name already registered".to_string())
    }

    /// True for failures caused by the server rather than the request.
    pub fn is_server_error(&self) -> bool {
        matches!(self, ShopError::Database(_) | ShopError::Internal(_))
    }
}
