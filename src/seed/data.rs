use log::debug;

use crate::error::{Result, ShopError};
use crate::logic::CatalogOperations;
use crate::model::NewProduct;
use crate::store::traits::Store;

/// Demo catalog loaded when `LOAD_SEED_DATA=true`
pub fn demo_catalog() -> Vec<NewProduct> {
    vec![
        NewProduct::new(
            "Mechanical Keyboard",
            89.90,
            Some("Tenkeyless, brown switches".to_string()),
            25,
        ),
        NewProduct::new(
            "Wireless Mouse",
            29.50,
            Some("2.4 GHz with USB receiver".to_string()),
            40,
        ),
        NewProduct::new("USB-C Hub", 45.00, Some("7 ports, 100 W passthrough".to_string()), 15),
        NewProduct::new("27\" Monitor", 279.00, Some("1440p IPS panel".to_string()), 8),
        NewProduct::new("Laptop Stand", 34.99, None, 30),
        NewProduct::new("Webcam", 59.00, Some("1080p, built-in microphone".to_string()), 0),
    ]
}

/// Insert the demo catalog, skipping products whose name already exists.
/// Returns how many products were created.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<usize> {
    let mut created = 0;
    for product in demo_catalog() {
        let name = product.name.clone();
        match CatalogOperations::create(store, product).await {
            Ok(_) => created += 1,
            Err(ShopError::Conflict(_)) => debug!("Seed product '{}' already present", name),
            Err(e) => return Err(e),
        }
    }
    Ok(created)
}
