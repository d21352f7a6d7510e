use log::{debug, info};

use crate::error::{Result, ShopError};
use crate::model::{AddToCartRequest, CartItemId, CartItemWithProduct, CartUpdate, ReleasedItem};
use crate::store::traits::Store;

/// Cart operations. Each one keeps product stock and cart quantities in
/// step: units in the cart are units missing from stock.
pub struct CartOperations;

impl CartOperations {
    pub async fn list_items<S: Store>(store: &S) -> Result<Vec<CartItemWithProduct>> {
        store.list_cart_items().await
    }

    /// Reserve `quantity` more units of a product, merging into the
    /// product's existing cart item if there is one
    pub async fn add_to_cart<S: Store>(
        store: &S,
        request: AddToCartRequest,
    ) -> Result<CartItemWithProduct> {
        if request.quantity <= 0 {
            return Err(ShopError::InvalidQuantity(request.quantity));
        }

        let item = store
            .reserve_stock(request.product_id, request.quantity)
            .await?;
        info!(
            "Reserved {} of product {}; cart item {} now holds {}, stock left {}",
            request.quantity, item.product.id, item.id, item.quantity, item.product.stock
        );
        Ok(item)
    }

    /// Set a cart item's quantity. Zero removes the item.
    pub async fn update_quantity<S: Store>(
        store: &S,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartUpdate> {
        if quantity < 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        if quantity == 0 {
            debug!("Quantity 0 for cart item {}; removing it", item_id);
            return Self::remove_from_cart(store, item_id)
                .await
                .map(CartUpdate::Removed);
        }

        let item = store.set_cart_quantity(item_id, quantity).await?;
        info!(
            "Cart item {} set to {}, product {} stock now {}",
            item.id, item.quantity, item.product.id, item.product.stock
        );
        Ok(CartUpdate::Updated(item))
    }

    /// Remove a cart item and return its units to stock
    pub async fn remove_from_cart<S: Store>(store: &S, item_id: CartItemId) -> Result<ReleasedItem> {
        let released = store
            .release_cart_item(item_id)
            .await?
            .ok_or_else(ShopError::cart_item_not_found)?;

        if released.restocked {
            info!(
                "Removed cart item {}, returned {} to product {}",
                released.item.id, released.item.quantity, released.item.product_id
            );
        } else {
            info!(
                "Removed cart item {} for missing product {}",
                released.item.id, released.item.product_id
            );
        }
        Ok(released)
    }
}
