//! # Cart Repository
//!
//! Line-item operations for a cart session, validated against the Stock
//! Ledger.
//!
//! ## Soft Reservations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Cart Mutations vs the Stock Ledger                         │
//! │                                                                         │
//! │  add_item(S, milk, 2)      stock(milk) = 10   ← validated, UNCHANGED   │
//! │  add_item(S, milk, 3)      row merges to 5    ← validated, UNCHANGED   │
//! │  add_item(S, milk, 10)     5 + 10 > 10        ← StockExceeded, row     │
//! │                                                  stays at 5            │
//! │  create_from_cart(S, ...)  stock(milk) = 5    ← decremented HERE       │
//! │                                                                         │
//! │  Abandoned carts therefore never starve stock. The cost is that two    │
//! │  concurrent checkouts can race on a low-stock item; the checkout       │
//! │  transaction re-validates with a guarded decrement, so one of them     │
//! │  fails cleanly instead of overselling.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Merge Semantics
//! The `(session_id, product_id)` pair is UNIQUE. Adding a product already
//! in the cart merges quantities inside a single upsert whose WHERE clause
//! re-checks stock, so the merge cannot race itself into an oversized row.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::validation::validate_quantity;
use mesa_core::{CartItem, CartLine, CoreError, Money, MAX_CART_ITEMS};

/// Repository for cart line-item operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Returns all line items for a session, joined with product display
    /// data.
    ///
    /// An empty cart is a valid, non-error result.
    pub async fn items(&self, session_id: &str) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT
                ci.id,
                ci.session_id,
                ci.product_id,
                p.name        AS product_name,
                p.price_cents AS unit_price_cents,
                p.stock,
                ci.quantity
            FROM cart_items ci
            INNER JOIN products p ON p.id = ci.product_id
            WHERE ci.session_id = ?1
            ORDER BY ci.created_at
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Gets a single cart item by its ID.
    pub async fn get_item(&self, item_id: &str) -> DbResult<Option<CartItem>> {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, session_id, product_id, quantity, created_at, updated_at
            FROM cart_items
            WHERE id = ?1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Adds a product to the cart, merging with an existing row.
    ///
    /// ## Behavior
    /// - Row for `(session, product)` exists: `new_qty = existing + quantity`
    /// - No row yet: `new_qty = quantity`
    /// - Either way, the mutation only applies when `new_qty <= stock`;
    ///   otherwise `StockExceeded` and NOTHING changes (no partial mutation)
    ///
    /// The merge-or-insert and the stock check happen in one upsert
    /// statement, never as an application-level read-then-write.
    ///
    /// ## Returns
    /// The upserted cart item.
    pub async fn add_item(
        &self,
        session_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<CartItem> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        debug!(session_id = %session_id, product_id = %product_id, quantity = %quantity, "Adding to cart");

        // Product lookup up front: error context, and inactive products
        // must not be addable at all.
        let product = sqlx::query_as::<_, mesa_core::Product>(
            r#"
            SELECT id, name, description, price_cents, stock,
                   is_active, created_at, updated_at
            FROM products
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", product_id))?;

        // Cap distinct lines per cart. Merging into an existing row does not
        // add a line, so other-product rows are what counts.
        let distinct_others: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cart_items WHERE session_id = ?1 AND product_id != ?2",
        )
        .bind(session_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        if distinct_others as usize >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            }
            .into());
        }

        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        // One statement, both paths guarded:
        //   insert: only when quantity <= stock (source SELECT filters)
        //   merge:  only when existing + quantity <= stock (DO UPDATE WHERE)
        let result = sqlx::query(
            r#"
            INSERT INTO cart_items (id, session_id, product_id, quantity, created_at, updated_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?5
            FROM products p
            WHERE p.id = ?3 AND p.stock >= ?4
            ON CONFLICT (session_id, product_id) DO UPDATE SET
                quantity = cart_items.quantity + excluded.quantity,
                updated_at = excluded.updated_at
            WHERE cart_items.quantity + excluded.quantity
                  <= (SELECT stock FROM products WHERE id = excluded.product_id)
            "#,
        )
        .bind(&id)
        .bind(session_id)
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // The guard refused. Re-read only to report how far over we were.
            let existing: i64 = sqlx::query_scalar(
                "SELECT COALESCE(SUM(quantity), 0) FROM cart_items WHERE session_id = ?1 AND product_id = ?2",
            )
            .bind(session_id)
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;

            return Err(CoreError::StockExceeded {
                product_id: product_id.to_string(),
                available: product.stock,
                requested: existing + quantity,
            }
            .into());
        }

        let item = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, session_id, product_id, quantity, created_at, updated_at
            FROM cart_items
            WHERE session_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(session_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    /// Sets the quantity of an existing cart item.
    ///
    /// ## Behavior
    /// - Quantity must be > 0. There is no "set to zero to remove":
    ///   zero/negative is a validation error, use `remove_item` instead.
    /// - Re-validated against current stock in the same guarded statement.
    pub async fn update_item(&self, item_id: &str, quantity: i64) -> DbResult<()> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        debug!(item_id = %item_id, quantity = %quantity, "Updating cart item");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE cart_items
            SET quantity = ?2, updated_at = ?3
            WHERE id = ?1
              AND ?2 <= (SELECT stock FROM products WHERE id = cart_items.product_id)
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let item = self
                .get_item(item_id)
                .await?
                .ok_or_else(|| DbError::not_found("CartItem", item_id))?;

            let stock: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                .bind(&item.product_id)
                .fetch_one(&self.pool)
                .await?;

            return Err(CoreError::StockExceeded {
                product_id: item.product_id,
                available: stock,
                requested: quantity,
            }
            .into());
        }

        Ok(())
    }

    /// Removes a cart item.
    ///
    /// ## Policy
    /// Removing an item that does not exist is `NotFound`, not a no-op,
    /// matching every other mutation in this crate. Callers racing the
    /// session sweep can treat `NotFound` as already-gone.
    ///
    /// Stock is untouched: cart rows never decremented the ledger.
    pub async fn remove_item(&self, item_id: &str) -> DbResult<()> {
        debug!(item_id = %item_id, "Removing cart item");

        let result = sqlx::query("DELETE FROM cart_items WHERE id = ?1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CartItem", item_id));
        }

        Ok(())
    }

    /// Deletes all line items for a session.
    ///
    /// Used after a successful checkout. Clearing an already-empty cart is
    /// fine.
    ///
    /// ## Returns
    /// The number of rows removed.
    pub async fn clear(&self, session_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE session_id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        debug!(session_id = %session_id, removed = %result.rows_affected(), "Cleared cart");

        Ok(result.rows_affected())
    }

    /// Computes the cart total as `Σ quantity × unit_price` over current
    /// rows.
    ///
    /// Always recomputed from the underlying items, never stored, so it
    /// cannot drift from them.
    pub async fn total(&self, session_id: &str) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(ci.quantity * p.price_cents), 0)
            FROM cart_items ci
            INNER JOIN products p ON p.id = ci.product_id
            WHERE ci.session_id = ?1
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(cents))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
