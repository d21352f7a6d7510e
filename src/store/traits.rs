use crate::error::Result;
use crate::model::{
    CartItemId, CartItemWithProduct, DeletePolicy, NewProduct, Product, ProductId, ReleasedItem,
};

#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn list_products(&self) -> Result<Vec<Product>>;
    /// Find a product by exact name, optionally ignoring one id
    async fn find_product_by_name(
        &self,
        name: &str,
        excluding: Option<ProductId>,
    ) -> Result<Option<Product>>;
    /// Insert a new product; fails with `Conflict` when the name is taken
    async fn create_product(&self, product: NewProduct) -> Result<Product>;
    /// Replace every field of a product; `None` when the id does not exist
    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<Option<Product>>;
    /// Returns false when the id does not exist
    async fn delete_product(&self, id: ProductId, policy: DeletePolicy) -> Result<bool>;
}

/// Cart mutations. Every method that touches a cart item adjusts the
/// referenced product's stock in the same atomic step.
#[async_trait::async_trait]
pub trait CartStore: Send + Sync {
    /// All cart items joined with their products, ordered by item id
    async fn list_cart_items(&self) -> Result<Vec<CartItemWithProduct>>;
    /// Move `quantity` units from product stock into the product's cart item,
    /// creating the item if the product is not in the cart yet
    async fn reserve_stock(&self, product_id: ProductId, quantity: i32)
        -> Result<CartItemWithProduct>;
    /// Set a cart item's quantity to a positive value, taking the difference
    /// from (or returning it to) product stock
    async fn set_cart_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItemWithProduct>;
    /// Delete a cart item and return its quantity to stock; `None` when the
    /// item does not exist
    async fn release_cart_item(&self, item_id: CartItemId) -> Result<Option<ReleasedItem>>;
}

pub trait Store: ProductStore + CartStore + Send + Sync {}
