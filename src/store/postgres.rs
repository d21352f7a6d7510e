use anyhow::Context;
use log::{info, warn};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Postgres, Row, Transaction,
};

use crate::error::{Result, ShopError};
use crate::model::{
    CartItem, CartItemId, CartItemWithProduct, DeletePolicy, NewProduct, Product, ProductId,
    ReleasedItem,
};
use crate::store::traits::{CartStore, ProductStore, Store};

/// Tables are created on startup when missing; there is no migration history.
const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL CHECK (price >= 0),
        description TEXT,
        stock INTEGER NOT NULL CHECK (stock >= 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_products_name ON products (name)",
    r#"
    CREATE TABLE IF NOT EXISTS cart_items (
        id SERIAL PRIMARY KEY,
        product_id INTEGER NOT NULL REFERENCES products (id),
        quantity INTEGER NOT NULL CHECK (quantity > 0)
    )
    "#,
    // One cart row per product; reservations for the same product merge.
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_cart_items_product ON cart_items (product_id)",
];

const PRODUCT_COLUMNS: &str = "id, name, price, description, stock";

/// SQLSTATE for "numeric value out of range", raised when INTEGER arithmetic overflows.
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

fn is_out_of_range(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .as_deref()
        == Some(NUMERIC_VALUE_OUT_OF_RANGE)
}

/// Turn an integer overflow on `products.stock` into a client error.
fn stock_error(err: sqlx::Error, product_id: ProductId) -> ShopError {
    if is_out_of_range(&err) {
        ShopError::StockOverflow(product_id)
    } else {
        ShopError::Database(err)
    }
}

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the products and cart_items tables if they do not exist
    pub async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create database schema")?;
        }
        info!("Database schema ready");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn product_from_row(row: &PgRow) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        price: row.get("price"),
        description: row.get("description"),
        stock: row.get("stock"),
    }
}

fn cart_item_from_row(row: &PgRow) -> CartItem {
    CartItem {
        id: row.get("id"),
        product_id: row.get("product_id"),
        quantity: row.get("quantity"),
    }
}

/// Take `units` from a product's stock inside `tx`. The check and the write
/// are one statement, so concurrent reservations cannot both pass the check.
/// Negative `units` returns stock and fails only when the product is gone or
/// the count would overflow.
async fn take_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    units: i32,
) -> Result<Product> {
    let row = sqlx::query(&format!(
        "UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1 RETURNING {}",
        PRODUCT_COLUMNS
    ))
    .bind(units)
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| stock_error(e, product_id))?;

    if let Some(row) = row {
        return Ok(product_from_row(&row));
    }

    // Nothing was written; find out which precondition failed.
    let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;

    match available {
        None => Err(ShopError::product_not_found()),
        Some(available) => Err(ShopError::InsufficientStock {
            product_id,
            requested: units,
            available,
        }),
    }
}

#[async_trait::async_trait]
impl ProductStore for PostgresStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM products ORDER BY id",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn find_product_by_name(
        &self,
        name: &str,
        excluding: Option<ProductId>,
    ) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM products WHERE name = $1 AND ($2::INTEGER IS NULL OR id <> $2) ORDER BY id LIMIT 1",
            PRODUCT_COLUMNS
        ))
        .bind(name)
        .bind(excluding)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        // Two concurrent creates with the same name can both pass NOT EXISTS.
        // There is no unique index on name; updates may share one when
        // `unique_names_on_update` is off.
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (name, price, description, stock)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $1)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.stock)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(product_from_row)
            .ok_or_else(ShopError::duplicate_name)
    }

    async fn update_product(&self, id: ProductId, product: NewProduct) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products
            SET name = $1, price = $2, description = $3, stock = $4
            WHERE id = $5
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.stock)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    async fn delete_product(&self, id: ProductId, policy: DeletePolicy) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        match policy {
            DeletePolicy::Restrict => {
                let referencing: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE product_id = $1")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;
                if referencing > 0 {
                    return Err(ShopError::ProductInCart(id));
                }
            }
            DeletePolicy::Cascade => {
                sqlx::query("DELETE FROM cart_items WHERE product_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl CartStore for PostgresStore {
    async fn list_cart_items(&self) -> Result<Vec<CartItemWithProduct>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id AS item_id, c.quantity, p.id, p.name, p.price, p.description, p.stock
            FROM cart_items c
            JOIN products p ON p.id = c.product_id
            ORDER BY c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| CartItemWithProduct {
                id: row.get("item_id"),
                quantity: row.get("quantity"),
                product: product_from_row(row),
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

        let mut tx = self.pool.begin().await?;

        let product = take_stock(&mut tx, product_id, quantity).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO cart_items (product_id, quantity)
            VALUES ($1, $2)
            ON CONFLICT (product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            RETURNING id, product_id, quantity
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_out_of_range(&e) {
                ShopError::InvalidQuantity(quantity)
            } else {
                ShopError::Database(e)
            }
        })?;

        tx.commit().await?;
        Ok(CartItemWithProduct::new(cart_item_from_row(&row), product))
    }

    async fn set_cart_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItemWithProduct> {
        if quantity <= 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT id, product_id, quantity FROM cart_items WHERE id = $1 FOR UPDATE")
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(ShopError::cart_item_not_found)?;
        let mut item = cart_item_from_row(&row);

        let product = take_stock(&mut tx, item.product_id, quantity - item.quantity)
            .await
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

        sqlx::query("UPDATE cart_items SET quantity = $1 WHERE id = $2")
            .bind(quantity)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        item.quantity = quantity;
        Ok(CartItemWithProduct::new(item, product))
    }

    async fn release_cart_item(&self, item_id: CartItemId) -> Result<Option<ReleasedItem>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("DELETE FROM cart_items WHERE id = $1 RETURNING id, product_id, quantity")
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let item = cart_item_from_row(&row);

        let restored = sqlx::query("UPDATE products SET stock = stock + $1 WHERE id = $2")
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| stock_error(e, item.product_id))?;
        let restocked = restored.rows_affected() > 0;
        if !restocked {
            warn!(
                "Cart item {} referenced missing product {}; stock not restored",
                item.id, item.product_id
            );
        }

        tx.commit().await?;
        Ok(Some(ReleasedItem { item, restocked }))
    }
}

impl Store for PostgresStore {}
