//! # Product Repository
//!
//! Catalog operations plus the Stock Ledger primitive.
//!
//! ## The Stock Ledger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write in application code (race-prone)            │
//! │     let p = get(id); if p.stock >= q { set_stock(p.stock - q) }        │
//! │                                                                         │
//! │  ✅ CORRECT: one guarded statement at the storage boundary             │
//! │     UPDATE products SET stock = stock + δ                              │
//! │     WHERE id = ? AND stock + δ >= 0                                    │
//! │                                                                         │
//! │  Two checkouts racing on the same low-stock item cannot both win:      │
//! │  whichever statement runs second sees the decremented value and        │
//! │  affects zero rows → InsufficientStock, nothing changed.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart mutations only *validate* against stock (soft reservation);
//! the decrement happens at order creation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::validation::{validate_price_cents, validate_product_name};
use mesa_core::{CoreError, Product};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Catalog
/// let product = repo.get_by_id("uuid-here").await?;
///
/// // Stock Ledger: restock +12, sell -3
/// repo.adjust_stock("uuid-here", 12).await?;
/// repo.adjust_stock("uuid-here", -3).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Arguments
    /// * `product` - Product to insert (id should be generated beforehand)
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(DbError::Domain)` - Name or price failed validation
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        validate_product_name(&product.name).map_err(CoreError::from)?;
        validate_price_cents(product.price_cents).map_err(CoreError::from)?;

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, stock,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, stock,
                   is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price_cents, stock,
                   is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates an existing product's catalog fields.
    ///
    /// Stock is deliberately NOT written here; the only path that moves the
    /// ledger is [`adjust_stock`](Self::adjust_stock) (and the checkout
    /// transaction, which uses the same guarded statement).
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_product_name(&product.name).map_err(CoreError::from)?;
        validate_price_cents(product.price_cents).map_err(CoreError::from)?;

        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                is_active = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Applies a signed delta to a product's stock.
    ///
    /// This is the Stock Ledger primitive: a single conditional UPDATE that
    /// rejects any result below zero, so the invariant holds under
    /// concurrent callers without application-level locking.
    ///
    /// ## Arguments
    /// * `id` - Product ID
    /// * `delta` - Change in stock (negative for sales, positive for restocking)
    ///
    /// ## Returns
    /// * `Ok(())` - Ledger moved
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::Domain(InsufficientStock))` - Result would be negative;
    ///   stock unchanged
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Zero rows: either the product is missing or the guard refused.
            // Re-read only to build the right error; enforcement already
            // happened atomically above.
            let product = self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", id))?;

            return Err(CoreError::InsufficientStock {
                product_id: id.to_string(),
                available: product.stock,
                requested: -delta,
            }
            .into());
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sample_product(name: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            name: name.to_string(),
            description: None,
            price_cents,
            stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let product = sample_product("Milk 1L", 250, 10);

        db.products().insert(&product).await.unwrap();

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Milk 1L");
        assert_eq!(loaded.price_cents, 250);
        assert_eq!(loaded.stock, 10);
        assert!(loaded.is_active);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_input() {
        let db = test_db().await;

        let unnamed = sample_product("  ", 250, 10);
        assert!(matches!(
            db.products().insert(&unnamed).await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));

        let negative_price = sample_product("Milk 1L", -1, 10);
        assert!(matches!(
            db.products().insert(&negative_price).await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock_decrement_and_restock() {
        let db = test_db().await;
        let product = sample_product("Milk 1L", 250, 10);
        db.products().insert(&product).await.unwrap();

        db.products().adjust_stock(&product.id, -3).await.unwrap();
        db.products().adjust_stock(&product.id, 5).await.unwrap();

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.stock, 12);
    }

    #[tokio::test]
    async fn test_adjust_stock_never_goes_negative() {
        let db = test_db().await;
        let product = sample_product("Milk 1L", 250, 2);
        db.products().insert(&product).await.unwrap();

        let err = db.products().adjust_stock(&product.id, -3).await.unwrap_err();
        match err {
            DbError::Domain(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Failed adjustment leaves the ledger untouched
        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.stock, 2);
    }

    #[tokio::test]
    async fn test_adjust_stock_missing_product() {
        let db = test_db().await;
        assert!(matches!(
            db.products().adjust_stock("nope", -1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_touches_catalog_not_stock() {
        let db = test_db().await;
        let mut product = sample_product("Milk 1L", 250, 10);
        db.products().insert(&product).await.unwrap();

        product.name = "Whole Milk 1L".to_string();
        product.price_cents = 275;
        product.stock = 9999; // must be ignored
        db.products().update(&product).await.unwrap();

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Whole Milk 1L");
        assert_eq!(loaded.price_cents, 275);
        assert_eq!(loaded.stock, 10);
    }

    #[tokio::test]
    async fn test_list_active_and_count() {
        let db = test_db().await;
        let mut inactive = sample_product("Retired Dish", 500, 0);
        inactive.is_active = false;

        db.products()
            .insert(&sample_product("Pad Thai", 1175, 8))
            .await
            .unwrap();
        db.products().insert(&inactive).await.unwrap();

        let active = db.products().list_active(50).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Pad Thai");
        assert_eq!(db.products().count().await.unwrap(), 1);
    }
}
