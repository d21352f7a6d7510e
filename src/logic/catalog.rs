use log::{info, warn};

use crate::config::CatalogConfig;
use crate::error::{Result, ShopError};
use crate::model::{NewProduct, Product, ProductId};
use crate::store::traits::Store;

/// Product catalog operations
pub struct CatalogOperations;

impl CatalogOperations {
    pub async fn list<S: Store>(store: &S) -> Result<Vec<Product>> {
        store.list_products().await
    }

    pub async fn get<S: Store>(store: &S, id: ProductId) -> Result<Product> {
        store
            .get_product(id)
            .await?
            .ok_or_else(ShopError::product_not_found)
    }

    /// Create a product; names must be unique across the catalog
    pub async fn create<S: Store>(store: &S, new_product: NewProduct) -> Result<Product> {
        new_product.validate()?;

        let product = store.create_product(new_product).await?;
        info!(
            "Created product {} '{}' with stock {}",
            product.id, product.name, product.stock
        );
        Ok(product)
    }

    /// Replace every field of a product, stock included. Outstanding cart
    /// reservations are not consulted.
    pub async fn update<S: Store>(
        store: &S,
        policy: &CatalogConfig,
        id: ProductId,
        new_product: NewProduct,
    ) -> Result<Product> {
        new_product.validate()?;

        if store.get_product(id).await?.is_none() {
            return Err(ShopError::product_not_found());
        }

        if let Some(other) = store
            .find_product_by_name(&new_product.name, Some(id))
            .await?
        {
            if policy.unique_names_on_update {
                return Err(ShopError::duplicate_name());
            }
            warn!(
                "Product {} renamed to '{}', which product {} already uses",
                id, new_product.name, other.id
            );
        }

        let product = store
            .update_product(id, new_product)
            .await?
            .ok_or_else(ShopError::product_not_found)?;
        info!("Updated product {}", product.id);
        Ok(product)
    }

    pub async fn delete<S: Store>(store: &S, policy: &CatalogConfig, id: ProductId) -> Result<()> {
        if !store.delete_product(id, policy.delete_policy).await? {
            return Err(ShopError::product_not_found());
        }
        info!("Deleted product {} ({:?})", id, policy.delete_policy);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::CartOperations;
    use crate::model::{AddToCartRequest, DeletePolicy};
    use crate::store::{CartStore, MemoryStore};

    fn widget(stock: i32) -> NewProduct {
        NewProduct::new("Widget", 9.99, None, stock)
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let store = MemoryStore::new();
        let created = CatalogOperations::create(
            &store,
            NewProduct::new("Widget", 9.99, Some("Blue".to_string()), 10),
        )
        .await
        .unwrap();

        let fetched = CatalogOperations::get(&store, created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.description.as_deref(), Some("Blue"));
    }

    #[tokio::test]
    async fn test_create_twice_with_same_name_conflicts() {
        let store = MemoryStore::new();
        CatalogOperations::create(&store, widget(10)).await.unwrap();

        let second = CatalogOperations::create(&store, widget(5)).await;
        assert!(matches!(second, Err(ShopError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let store = MemoryStore::new();
        let result = CatalogOperations::create(&store, widget(-1)).await;
        assert!(matches!(result, Err(ShopError::Validation(_))));
        assert!(CatalogOperations::list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_product() {
        let store = MemoryStore::new();
        assert!(matches!(
            CatalogOperations::get(&store, 42).await,
            Err(ShopError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_is_idempotent() {
        let store = MemoryStore::new();
        CatalogOperations::create(&store, widget(10)).await.unwrap();
        CatalogOperations::create(&store, NewProduct::new("Gadget", 4.5, None, 3))
            .await
            .unwrap();

        let first = CatalogOperations::list(&store).await.unwrap();
        let second = CatalogOperations::list(&store).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_update_replaces_all_fields() {
        let store = MemoryStore::new();
        let created = CatalogOperations::create(
            &store,
            NewProduct::new("Widget", 9.99, Some("Blue".to_string()), 10),
        )
        .await
        .unwrap();

        let updated = CatalogOperations::update(
            &store,
            &CatalogConfig::default(),
            created.id,
            NewProduct::new("Widget Pro", 19.99, None, 4),
        )
        .await
        .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Widget Pro");
        assert_eq!(updated.price, 19.99);
        assert_eq!(updated.description, None);
        assert_eq!(updated.stock, 4);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let store = MemoryStore::new();
        let result =
            CatalogOperations::update(&store, &CatalogConfig::default(), 7, widget(1)).await;
        assert!(matches!(result, Err(ShopError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_overrides_reserved_stock() {
        let store = MemoryStore::new();
        let created = CatalogOperations::create(&store, widget(10)).await.unwrap();
        CartOperations::add_to_cart(
            &store,
            AddToCartRequest {
                product_id: created.id,
                quantity: 4,
            },
        )
        .await
        .unwrap();

        let updated = CatalogOperations::update(
            &store,
            &CatalogConfig::default(),
            created.id,
            widget(10),
        )
        .await
        .unwrap();
        assert_eq!(updated.stock, 10);
        assert_eq!(store.list_cart_items().await.unwrap()[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_rename_collision_allowed_by_default() {
        let store = MemoryStore::new();
        CatalogOperations::create(&store, widget(10)).await.unwrap();
        let gadget = CatalogOperations::create(&store, NewProduct::new("Gadget", 1.0, None, 1))
            .await
            .unwrap();

        let renamed = CatalogOperations::update(
            &store,
            &CatalogConfig::default(),
            gadget.id,
            NewProduct::new("Widget", 1.0, None, 1),
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Widget");

        let widgets = CatalogOperations::list(&store)
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.name == "Widget")
            .count();
        assert_eq!(widgets, 2);
    }

    #[tokio::test]
    async fn test_rename_collision_rejected_when_enforced() {
        let store = MemoryStore::new();
        CatalogOperations::create(&store, widget(10)).await.unwrap();
        let gadget = CatalogOperations::create(&store, NewProduct::new("Gadget", 1.0, None, 1))
            .await
            .unwrap();
        let policy = CatalogConfig {
            unique_names_on_update: true,
            ..CatalogConfig::default()
        };

        let result = CatalogOperations::update(
            &store,
            &policy,
            gadget.id,
            NewProduct::new("Widget", 1.0, None, 1),
        )
        .await;
        assert!(matches!(result, Err(ShopError::Conflict(_))));

        // Keeping your own name is never a collision.
        let unchanged = CatalogOperations::update(
            &store,
            &policy,
            gadget.id,
            NewProduct::new("Gadget", 2.0, None, 1),
        )
        .await
        .unwrap();
        assert_eq!(unchanged.price, 2.0);
    }

    #[tokio::test]
    async fn test_delete_respects_policy() {
        let store = MemoryStore::new();
        let created = CatalogOperations::create(&store, widget(10)).await.unwrap();
        CartOperations::add_to_cart(
            &store,
            AddToCartRequest {
                product_id: created.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

        let restrict = CatalogConfig::default();
        assert!(matches!(
            CatalogOperations::delete(&store, &restrict, created.id).await,
            Err(ShopError::ProductInCart(_))
        ));

        let cascade = CatalogConfig {
            delete_policy: DeletePolicy::Cascade,
            ..CatalogConfig::default()
        };
        CatalogOperations::delete(&store, &cascade, created.id)
            .await
            .unwrap();
        assert!(CartOperations::list_items(&store).await.unwrap().is_empty());
        assert!(matches!(
            CatalogOperations::delete(&store, &cascade, created.id).await,
            Err(ShopError::NotFound(_))
        ));
    }
}
