use serde::{Deserialize, Serialize};

use crate::model::{Product, ProductId};

pub type CartItemId = i32;

/// A cart row as stored, without its product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i32,
}

/// A cart item embedding the current fields of the product it reserves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemWithProduct {
    pub id: CartItemId,
    pub quantity: i32,
    pub product: Product,
}

impl CartItemWithProduct {
    pub fn new(item: CartItem, product: Product) -> Self {
        Self {
            id: item.id,
            quantity: item.quantity,
            product,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Outcome of deleting a cart item
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasedItem {
    pub item: CartItem,
    /// False when the referenced product no longer exists
    pub restocked: bool,
}

/// Outcome of a quantity update; zero quantity removes the item
#[derive(Debug, Clone, PartialEq)]
pub enum CartUpdate {
    Updated(CartItemWithProduct),
    Removed(ReleasedItem),
}
