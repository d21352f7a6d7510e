use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::error::{Result, ShopError};
use crate::model::{
    CartItem, CartItemId, CartItemWithProduct, DeletePolicy, NewProduct, Product, ProductId,
    ReleasedItem,
};
use crate::store::traits::{CartStore, ProductStore, Store};

#[derive(Debug, Default)]
struct Inventory {
    products: BTreeMap<ProductId, Product>,
    cart_items: BTreeMap<CartItemId, CartItem>,
    last_product_id: ProductId,
    last_cart_item_id: CartItemId,
}

impl Inventory {
    fn next_product_id(&mut self) -> ProductId {
        self.last_product_id += 1;
        self.last_product_id
    }

    fn next_cart_item_id(&mut self) -> CartItemId {
        self.last_cart_item_id += 1;
        self.last_cart_item_id
    }

    fn item_for_product(&self, product_id: ProductId) -> Option<CartItemId> {
        self.cart_items
            .values()
            .find(|item| item.product_id == product_id)
            .map(|item| item.id)
    }

    /// Take `units` out of a product's stock, or explain why not.
    /// Negative `units` puts stock back; that only fails if the count
    /// no longer fits in an `i32`.
    fn take_stock(&mut self, product_id: ProductId, units: i32) -> Result<Product> {
        let product = self
            .products
            .get_mut(&product_id)
            .ok_or_else(ShopError::product_not_found)?;

        if product.stock < units {
            return Err(ShopError::InsufficientStock {
                product_id,
                requested: units,
                available: product.stock,
            });
        }

        product.stock = product
            .stock
            .checked_sub(units)
            .ok_or(ShopError::StockOverflow(product_id))?;
        Ok(product.clone())
    }
}

/// Store that keeps the catalog and cart in process memory.
///
/// Every operation runs under a single lock, so each cart mutation and its
/// stock adjustment are applied together or not at all.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inventory>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProductStore for MemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.inner.lock().products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.inner.lock().products.values().cloned().collect())
    }

    async fn find_product_by_name(
        &self,
        name: &str,
        excluding: Option<ProductId>,
    ) -> Result<Option<Product>> {
        let inventory = self.inner.lock();
        Ok(inventory
            .products
            .values()
            .find(|p| p.name == name && Some(p.id) != excluding)
            .cloned())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let mut inventory = self.inner.lock();
        if inventory.products.values().any(|p| p.name == product.name) {
            return Err(ShopError::duplicate_name());
        }

        let id = inventory.next_product_id();
        let product = product.into_product(id);
        inventory.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<Option<Product>> {
        let mut inventory = self.inner.lock();
        let Some(existing) = inventory.products.get_mut(&id) else {
            return Ok(None);
        };

        *existing = product.into_product(id);
        Ok(Some(existing.clone()))
    }

    async fn delete_product(&self, id: ProductId, policy: DeletePolicy) -> Result<bool> {
        let mut inventory = self.inner.lock();
        if !inventory.products.contains_key(&id) {
            return Ok(false);
        }

        let referenced = inventory.item_for_product(id).is_some();
        match policy {
            DeletePolicy::Restrict if referenced => return Err(ShopError::ProductInCart(id)),
            DeletePolicy::Restrict => {}
            DeletePolicy::Cascade => inventory.cart_items.retain(|_, item| item.product_id != id),
        }

        inventory.products.remove(&id);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl CartStore for MemoryStore {
    async fn list_cart_items(&self) -> Result<Vec<CartItemWithProduct>> {
        let inventory = self.inner.lock();
        Ok(inventory
            .cart_items
            .values()
            .filter_map(|item| {
                let product = inventory.products.get(&item.product_id)?;
                Some(CartItemWithProduct::new(item.clone(), product.clone()))
            })
            .collect())
    }

    async fn reserve_stock(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItemWithProduct> {
        if quantity <= 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }

        let mut inventory = self.inner.lock();

        let existing = inventory.item_for_product(product_id);
        let current = existing
            .and_then(|id| inventory.cart_items.get(&id))
            .map_or(0, |item| item.quantity);
        let total = current
            .checked_add(quantity)
            .ok_or(ShopError::InvalidQuantity(quantity))?;

        let product = inventory.take_stock(product_id, quantity)?;

        let id = match existing {
            Some(id) => id,
            None => inventory.next_cart_item_id(),
        };
        let item = CartItem {
            id,
            product_id,
            quantity: total,
        };
        inventory.cart_items.insert(id, item.clone());

        Ok(CartItemWithProduct::new(item, product))
    }

    async fn set_cart_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItemWithProduct> {
        if quantity <= 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }

        let mut inventory = self.inner.lock();
        let mut item = inventory
            .cart_items
            .get(&item_id)
            .cloned()
            .ok_or_else(ShopError::cart_item_not_found)?;

        let product = inventory
            .take_stock(item.product_id, quantity - item.quantity)
            .map_err(|e| match e {
                // Report the quantity asked for against what this item could reach.
                ShopError::InsufficientStock {
                    product_id,
                    available,
                    ..
                } => ShopError::InsufficientStock {
                    product_id,
                    requested: quantity,
                    available: available.saturating_add(item.quantity),
                },
                other => other,
            })?;

        item.quantity = quantity;
        inventory.cart_items.insert(item_id, item.clone());

        Ok(CartItemWithProduct::new(item, product))
    }

    async fn release_cart_item(&self, item_id: CartItemId) -> Result<Option<ReleasedItem>> {
        let mut inventory = self.inner.lock();
        let Some(item) = inventory.cart_items.get(&item_id).cloned() else {
            return Ok(None);
        };

        // Restock before removing so an overflow leaves the item in place.
        let restocked = match inventory.products.get_mut(&item.product_id) {
            Some(product) => {
                product.stock = product
                    .stock
                    .checked_add(item.quantity)
                    .ok_or(ShopError::StockOverflow(item.product_id))?;
                true
            }
            None => false,
        };
        inventory.cart_items.remove(&item_id);

        Ok(Some(ReleasedItem { item, restocked }))
    }
}

impl Store for MemoryStore {}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_widget(stock: i32) -> (MemoryStore, ProductId) {
        let store = MemoryStore::new();
        let widget = store
            .create_product(NewProduct::new("Widget", 9.99, None, stock))
            .await
            .unwrap();
        (store, widget.id)
    }

    async fn stock_of(store: &MemoryStore, id: ProductId) -> i32 {
        store.get_product(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store
            .create_product(NewProduct::new("A", 1.0, None, 1))
            .await
            .unwrap();
        let b = store
            .create_product(NewProduct::new("B", 2.0, None, 2))
            .await
            .unwrap();
        assert!(b.id > a.id);

        let names: Vec<_> = store
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let (store, _) = store_with_widget(10).await;
        let result = store
            .create_product(NewProduct::new("Widget", 1.0, None, 1))
            .await;
        assert!(matches!(result, Err(ShopError::Conflict(_))));
        assert_eq!(store.list_products().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_name_excluding_self() {
        let (store, id) = store_with_widget(10).await;
        assert!(store
            .find_product_by_name("Widget", Some(id))
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            store
                .find_product_by_name("Widget", None)
                .await
                .unwrap()
                .map(|p| p.id),
            Some(id)
        );
    }

    #[tokio::test]
    async fn test_reserve_merges_into_existing_item() {
        let (store, id) = store_with_widget(10).await;

        let first = store.reserve_stock(id, 3).await.unwrap();
        let second = store.reserve_stock(id, 4).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 7);
        assert_eq!(second.product.stock, 3);
        assert_eq!(store.list_cart_items().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reserve_failure_leaves_state_untouched() {
        let (store, id) = store_with_widget(10).await;

        let result = store.reserve_stock(id, 11).await;
        match result {
            Err(ShopError::InsufficientStock {
                product_id,
                requested,
                available,
            }) => {
                assert_eq!(product_id, id);
                assert_eq!(requested, 11);
                assert_eq!(available, 10);
            }
            other => panic!("expected insufficient stock, got {:?}", other),
        }
        assert_eq!(stock_of(&store, id).await, 10);
        assert!(store.list_cart_items().await.unwrap().is_empty());

        assert!(matches!(
            store.reserve_stock(999, 1).await,
            Err(ShopError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_quantity_moves_the_difference() {
        let (store, id) = store_with_widget(10).await;
        let item = store.reserve_stock(id, 5).await.unwrap();

        let lowered = store.set_cart_quantity(item.id, 2).await.unwrap();
        assert_eq!(lowered.quantity, 2);
        assert_eq!(lowered.product.stock, 8);

        let raised = store.set_cart_quantity(item.id, 10).await.unwrap();
        assert_eq!(raised.quantity, 10);
        assert_eq!(raised.product.stock, 0);

        let result = store.set_cart_quantity(item.id, 11).await;
        assert!(matches!(
            result,
            Err(ShopError::InsufficientStock {
                requested: 11,
                available: 10,
                ..
            })
        ));
        assert_eq!(stock_of(&store, id).await, 0);
    }

    #[tokio::test]
    async fn test_set_quantity_rejects_non_positive_and_unknown_items() {
        let (store, id) = store_with_widget(10).await;
        let item = store.reserve_stock(id, 1).await.unwrap();

        assert!(matches!(
            store.set_cart_quantity(item.id, 0).await,
            Err(ShopError::InvalidQuantity(0))
        ));
        assert!(matches!(
            store.set_cart_quantity(item.id + 100, 1).await,
            Err(ShopError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_release_restores_stock() {
        let (store, id) = store_with_widget(10).await;
        let item = store.reserve_stock(id, 5).await.unwrap();

        let released = store.release_cart_item(item.id).await.unwrap().unwrap();
        assert!(released.restocked);
        assert_eq!(released.item.quantity, 5);
        assert_eq!(stock_of(&store, id).await, 10);
        assert!(store.release_cart_item(item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_tolerates_missing_product() {
        let (store, id) = store_with_widget(10).await;
        let item = store.reserve_stock(id, 2).await.unwrap();

        // Simulate a product that vanished underneath its cart item.
        store.inner.lock().products.remove(&id);
        assert!(store.list_cart_items().await.unwrap().is_empty());

        let released = store.release_cart_item(item.id).await.unwrap().unwrap();
        assert!(!released.restocked);
        assert!(store.inner.lock().cart_items.is_empty());
    }

    #[tokio::test]
    async fn test_release_past_i32_max_keeps_item() {
        let (store, id) = store_with_widget(10).await;
        let item = store.reserve_stock(id, 5).await.unwrap();
        store
            .update_product(id, NewProduct::new("Widget", 9.99, None, i32::MAX))
            .await
            .unwrap();

        assert!(matches!(
            store.release_cart_item(item.id).await,
            Err(ShopError::StockOverflow(p)) if p == id
        ));
        assert_eq!(stock_of(&store, id).await, i32::MAX);
        assert_eq!(store.list_cart_items().await.unwrap()[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_lowering_quantity_past_i32_max_changes_nothing() {
        let (store, id) = store_with_widget(10).await;
        let item = store.reserve_stock(id, 5).await.unwrap();
        store
            .update_product(id, NewProduct::new("Widget", 9.99, None, i32::MAX))
            .await
            .unwrap();

        assert!(matches!(
            store.set_cart_quantity(item.id, 1).await,
            Err(ShopError::StockOverflow(_))
        ));
        assert_eq!(stock_of(&store, id).await, i32::MAX);
        assert_eq!(store.list_cart_items().await.unwrap()[0].quantity, 5);

        // Raising it still works: stock only goes down.
        let raised = store.set_cart_quantity(item.id, 6).await.unwrap();
        assert_eq!(raised.product.stock, i32::MAX - 1);
    }

    #[tokio::test]
    async fn test_delete_policies() {
        let (store, id) = store_with_widget(10).await;
        store.reserve_stock(id, 2).await.unwrap();

        assert!(matches!(
            store.delete_product(id, DeletePolicy::Restrict).await,
            Err(ShopError::ProductInCart(_))
        ));
        assert!(store.get_product(id).await.unwrap().is_some());

        assert!(store.delete_product(id, DeletePolicy::Cascade).await.unwrap());
        assert!(store.get_product(id).await.unwrap().is_none());
        assert!(store.list_cart_items().await.unwrap().is_empty());
        assert!(!store.delete_product(id, DeletePolicy::Cascade).await.unwrap());
    }
}
