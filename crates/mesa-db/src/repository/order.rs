//! # Order Repository
//!
//! Checkout, the order-status state machine, and driver assignment.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE (one transaction, all-or-nothing)                           │
//! │     └── create_from_cart()                                             │
//! │         ├── read cart lines (must be non-empty)                        │
//! │         ├── insert order  { status: pending, total: Σ line totals }    │
//! │         ├── insert items  (name + unit price snapshotted)              │
//! │         ├── guarded stock decrement per item  ← authoritative check    │
//! │         └── clear the cart                                             │
//! │                                                                         │
//! │  2. DRIVE THE STATE MACHINE                                            │
//! │     └── update_status() → only along the adjacency table               │
//! │     └── assign_driver() → driver binding + transition to 'assigned',   │
//! │                           inseparable by design                        │
//! │                                                                         │
//! │  3. TERMINATE                                                          │
//! │     ├── ... → delivered → completed                                    │
//! │     └── cancel() → status 'cancelled' + stock restored                 │
//! │                                                                         │
//! │  Orders are never deleted, only transitioned to a terminal status.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Status changes are conditional UPDATEs (`WHERE status = ?current`), so
//! two admins racing the same order cannot both win; the loser gets a typed
//! `InvalidTransition` carrying the fresh status.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mesa_core::validation::{validate_delivery_address, validate_new_order};
use mesa_core::{
    CartLine, CoreError, DriverProfile, NewOrder, Order, OrderItem, OrderPatch, OrderStatus,
};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an order from a session's cart snapshot.
    ///
    /// ## All-Or-Nothing
    /// Everything below happens in ONE transaction:
    /// 1. Read the cart lines (empty cart → `EmptyCart`)
    /// 2. Insert the order with `total = Σ quantity × unit_price`
    /// 3. Insert an item per line, snapshotting name and unit price
    /// 4. Decrement the Stock Ledger per item with a guarded UPDATE - this
    ///    is the second, authoritative stock check; cart-time validation
    ///    was only advisory
    /// 5. Clear the cart
    ///
    /// If any step fails (validation, a line exceeding current stock),
    /// nothing is persisted and nothing is decremented.
    ///
    /// ## Returns
    /// The created order, status `pending`.
    pub async fn create_from_cart(
        &self,
        session_id: &str,
        input: &NewOrder,
        now: DateTime<Utc>,
    ) -> DbResult<Order> {
        validate_new_order(input).map_err(CoreError::from)?;

        debug!(session_id = %session_id, restaurant_id = %input.restaurant_id, "Creating order from cart");

        let mut tx = self.pool.begin().await?;

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
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let total_cents: i64 = lines.iter().map(CartLine::line_total_cents).sum();

        let order = Order {
            id: Uuid::new_v4().to_string(),
            status: OrderStatus::Pending,
            restaurant_id: input.restaurant_id.clone(),
            driver_id: None,
            delivery_address: input.delivery_address.clone(),
            notes: input.notes.clone(),
            total_cents,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, status, restaurant_id, driver_id, delivery_address,
                notes, total_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&order.id)
        .bind(order.status)
        .bind(&order.restaurant_id)
        .bind(&order.delivery_address)
        .bind(&order.notes)
        .bind(order.total_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, name_snapshot,
                    unit_price_cents, quantity, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order.id)
            .bind(&line.product_id)
            .bind(&line.product_name)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            // Guarded decrement: the authoritative stock check. Losing a
            // race against a concurrent checkout surfaces here, and the
            // early return rolls the whole transaction back.
            let decrement = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if decrement.rows_affected() == 0 {
                let available: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                    .bind(&line.product_id)
                    .fetch_one(&mut *tx)
                    .await?;

                return Err(CoreError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    available,
                    requested: line.quantity,
                }
                .into());
            }
        }

        sqlx::query("DELETE FROM cart_items WHERE session_id = ?1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            total_cents = %order.total_cents,
            items = lines.len(),
            "Order created"
        );

        Ok(order)
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, status, restaurant_id, driver_id, delivery_address,
                   notes, total_cents, created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all items for an order.
    pub async fn items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, name_snapshot,
                   unit_price_cents, quantity, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists orders, newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<OrderStatus>, limit: u32) -> DbResult<Vec<Order>> {
        let orders = match status {
            Some(status) => {
                sqlx::query_as::<_, Order>(
                    r#"
                    SELECT id, status, restaurant_id, driver_id, delivery_address,
                           notes, total_cents, created_at, updated_at
                    FROM orders
                    WHERE status = ?1
                    ORDER BY created_at DESC
                    LIMIT ?2
                    "#,
                )
                .bind(status)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Order>(
                    r#"
                    SELECT id, status, restaurant_id, driver_id, delivery_address,
                           notes, total_cents, created_at, updated_at
                    FROM orders
                    ORDER BY created_at DESC
                    LIMIT ?1
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(orders)
    }

    /// Lists the orders bound to a driver, newest first.
    pub async fn list_for_driver(&self, driver_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, status, restaurant_id, driver_id, delivery_address,
                   notes, total_cents, created_at, updated_at
            FROM orders
            WHERE driver_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Advances an order to a direct successor status.
    ///
    /// ## Legality
    /// The change is permitted only if `new_status` is a direct successor
    /// of the current status in the transition graph. Going backward
    /// (e.g., `completed → pending`) is always illegal.
    ///
    /// Requests for `cancelled` route through [`cancel`](Self::cancel) so
    /// the stock-restoration policy cannot be bypassed.
    pub async fn update_status(&self, order_id: &str, new_status: OrderStatus) -> DbResult<()> {
        if new_status == OrderStatus::Cancelled {
            return self.cancel(order_id).await;
        }

        let order = self
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        order
            .status
            .check_transition(new_status)
            .map_err(DbError::from)?;

        debug!(order_id = %order_id, from = %order.status, to = %new_status, "Updating order status");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?2, updated_at = ?3
            WHERE id = ?1 AND status = ?4
            "#,
        )
        .bind(order_id)
        .bind(new_status)
        .bind(now)
        .bind(order.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Lost a race: someone else moved the order first. Re-read so
            // the error names the status that actually blocked us.
            return Err(self.fresh_transition_error(order_id, new_status).await);
        }

        info!(order_id = %order_id, status = %new_status, "Order status updated");

        Ok(())
    }

    /// Cancels an order and restores its decremented stock.
    ///
    /// ## Precondition
    /// Current status must be in the cancellable set `{pending, confirmed,
    /// priced, assigned}`; `delivered` and `completed` orders cannot be
    /// cancelled.
    ///
    /// ## Stock Policy
    /// The ledger counts sellable units, and a cancelled order's units are
    /// sellable again: every item's quantity is added back in the same
    /// transaction as the status change.
    pub async fn cancel(&self, order_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, status, restaurant_id, driver_id, delivery_address,
                   notes, total_cents, created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Order", order_id))?;

        order
            .status
            .check_transition(OrderStatus::Cancelled)
            .map_err(DbError::from)?;

        debug!(order_id = %order_id, from = %order.status, "Cancelling order");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?2, updated_at = ?3
            WHERE id = ?1 AND status = ?4
            "#,
        )
        .bind(order_id)
        .bind(OrderStatus::Cancelled)
        .bind(now)
        .bind(order.status)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            drop(tx);
            return Err(self
                .fresh_transition_error(order_id, OrderStatus::Cancelled)
                .await);
        }

        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, name_snapshot,
                   unit_price_cents, quantity, created_at
            FROM order_items
            WHERE order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                UPDATE products
                SET stock = stock + ?2, updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(order_id = %order_id, restored_items = items.len(), "Order cancelled, stock restored");

        Ok(())
    }

    /// Updates an order's non-financial, non-status fields.
    ///
    /// Applies regardless of current status; a delivered order's address
    /// can still be corrected for the record. Must never touch
    /// `total_cents`, items, `status`, or `driver_id` - and by
    /// construction, it cannot.
    pub async fn update_details(&self, order_id: &str, patch: &OrderPatch) -> DbResult<()> {
        if let Some(address) = &patch.delivery_address {
            validate_delivery_address(address).map_err(CoreError::from)?;
        }

        if patch.is_empty() {
            // Nothing to write; still report a missing order.
            return self
                .get_by_id(order_id)
                .await?
                .map(|_| ())
                .ok_or_else(|| DbError::not_found("Order", order_id));
        }

        debug!(order_id = %order_id, "Updating order details");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET delivery_address = COALESCE(?2, delivery_address),
                notes = COALESCE(?3, notes),
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .bind(&patch.delivery_address)
        .bind(&patch.notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        Ok(())
    }

    /// Binds a driver to an order and advances it to `assigned`.
    ///
    /// ## Composed Operation
    /// Assignment is inseparable from the status transition: the driver-id
    /// write and the move to `assigned` are one conditional UPDATE. There
    /// is no way to set a driver on an order that is not transitioning.
    ///
    /// ## Failure Modes
    /// * `DriverNotFound` - no profile, or profile is not a driver
    /// * `DriverUnavailable` - driver exists but `is_available = false`
    /// * `InvalidTransition` - order cannot move to `assigned` from its
    ///   current status
    pub async fn assign_driver(&self, order_id: &str, driver_id: &str) -> DbResult<()> {
        let profile = sqlx::query_as::<_, DriverProfile>(
            r#"
            SELECT id, name, role, is_available, created_at, updated_at
            FROM profiles
            WHERE id = ?1
            "#,
        )
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await?
        .filter(DriverProfile::is_driver)
        .ok_or_else(|| CoreError::DriverNotFound(driver_id.to_string()))?;

        if !profile.is_available {
            return Err(CoreError::DriverUnavailable(driver_id.to_string()).into());
        }

        let order = self
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        order
            .status
            .check_transition(OrderStatus::Assigned)
            .map_err(DbError::from)?;

        debug!(order_id = %order_id, driver_id = %driver_id, "Assigning driver");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET driver_id = ?2, status = ?3, updated_at = ?4
            WHERE id = ?1 AND status = ?5
            "#,
        )
        .bind(order_id)
        .bind(driver_id)
        .bind(OrderStatus::Assigned)
        .bind(now)
        .bind(order.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self
                .fresh_transition_error(order_id, OrderStatus::Assigned)
                .await);
        }

        info!(order_id = %order_id, driver_id = %driver_id, "Driver assigned");

        Ok(())
    }

    /// Builds the error for a conditional status UPDATE that hit zero rows:
    /// either the order vanished, or a concurrent writer moved it first.
    async fn fresh_transition_error(&self, order_id: &str, to: OrderStatus) -> DbError {
        match self.get_by_id(order_id).await {
            Ok(Some(order)) => CoreError::InvalidTransition {
                from: order.status,
                to,
            }
            .into(),
            Ok(None) => DbError::not_found("Order", order_id),
            Err(err) => err,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use mesa_core::{Product, ROLE_DRIVER};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            price_cents,
            stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    async fn seed_driver(db: &Database, name: &str, is_available: bool) -> DriverProfile {
        let now = Utc::now();
        let profile = DriverProfile {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role: ROLE_DRIVER.to_string(),
            is_available,
            created_at: now,
            updated_at: now,
        };
        db.drivers().insert(&profile).await.unwrap();
        profile
    }

    fn checkout_input() -> NewOrder {
        NewOrder {
            restaurant_id: "rest-42".to_string(),
            delivery_address: "12 Elm St, Springfield".to_string(),
            notes: None,
        }
    }

    /// Seeds a session holding 5 × milk ($2.50) and 2 × bread ($4.50).
    async fn seed_cart(db: &Database) -> (String, Product, Product) {
        let milk = seed_product(db, "Milk 1L", 250, 10).await;
        let bread = seed_product(db, "Sourdough", 450, 5).await;
        let session = db.sessions().create(Utc::now()).await.unwrap();

        db.cart().add_item(&session.id, &milk.id, 5).await.unwrap();
        db.cart().add_item(&session.id, &bread.id, 2).await.unwrap();

        (session.id, milk, bread)
    }

    /// Shortcut: create an order and walk it forward to `target`.
    async fn order_at_status(db: &Database, target: OrderStatus) -> Order {
        let (session, _, _) = seed_cart(db).await;
        let order = db
            .orders()
            .create_from_cart(&session, &checkout_input(), Utc::now())
            .await
            .unwrap();

        let path = [
            OrderStatus::Confirmed,
            OrderStatus::Priced,
            OrderStatus::Assigned,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::Completed,
        ];
        for status in path {
            if order.status == target {
                break;
            }
            if status == OrderStatus::Assigned {
                let driver = seed_driver(db, "Sam", true).await;
                db.orders().assign_driver(&order.id, &driver.id).await.unwrap();
            } else {
                db.orders().update_status(&order.id, status).await.unwrap();
            }
            if status == target {
                break;
            }
        }

        db.orders().get_by_id(&order.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_create_from_cart_happy_path() {
        let db = test_db().await;
        let (session, milk, bread) = seed_cart(&db).await;

        let order = db
            .orders()
            .create_from_cart(&session, &checkout_input(), Utc::now())
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        // 5 × 250 + 2 × 450
        assert_eq!(order.total_cents, 2150);
        assert!(order.driver_id.is_none());

        // Items snapshot name and unit price
        let items = db.orders().items(&order.id).await.unwrap();
        assert_eq!(items.len(), 2);
        let milk_item = items.iter().find(|i| i.product_id == milk.id).unwrap();
        assert_eq!(milk_item.name_snapshot, "Milk 1L");
        assert_eq!(milk_item.unit_price_cents, 250);
        assert_eq!(milk_item.quantity, 5);

        // Total always equals the sum of persisted items
        let item_sum: i64 = items.iter().map(|i| i.line_total_cents()).sum();
        assert_eq!(order.total_cents, item_sum);

        // Stock decremented by exactly the purchased quantities
        assert_eq!(db.products().get_by_id(&milk.id).await.unwrap().unwrap().stock, 5);
        assert_eq!(db.products().get_by_id(&bread.id).await.unwrap().unwrap().stock, 3);

        // Cart cleared
        assert!(db.cart().items(&session).await.unwrap().is_empty());
    }

    /// Full shop-then-checkout pass: merge, refusal, checkout, clear.
    #[tokio::test]
    async fn test_checkout_end_to_end() {
        let db = test_db().await;
        let milk = seed_product(&db, "Milk 1L", 250, 10).await;
        let session = db.sessions().get_or_create(None, Utc::now()).await.unwrap();

        db.cart().add_item(&session.id, &milk.id, 2).await.unwrap();
        let merged = db.cart().add_item(&session.id, &milk.id, 3).await.unwrap();
        assert_eq!(merged.quantity, 5);

        // 5 + 10 > 10: refused, row stays at 5, stock untouched
        assert!(db.cart().add_item(&session.id, &milk.id, 10).await.is_err());
        assert_eq!(db.products().get_by_id(&milk.id).await.unwrap().unwrap().stock, 10);

        let order = db
            .orders()
            .create_from_cart(&session.id, &checkout_input(), Utc::now())
            .await
            .unwrap();

        let items = db.orders().items(&order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(db.products().get_by_id(&milk.id).await.unwrap().unwrap().stock, 5);
        assert!(db.cart().items(&session.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_is_all_or_nothing() {
        let db = test_db().await;
        let (session, milk, bread) = seed_cart(&db).await;

        // Stock shrinks after the items were carted: 2 × bread no longer fits
        db.products().adjust_stock(&bread.id, -4).await.unwrap();

        let err = db
            .orders()
            .create_from_cart(&session, &checkout_input(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));

        // Nothing persisted, nothing decremented
        assert!(db.orders().list(None, 10).await.unwrap().is_empty());
        assert_eq!(db.products().get_by_id(&milk.id).await.unwrap().unwrap().stock, 10);
        assert_eq!(db.products().get_by_id(&bread.id).await.unwrap().unwrap().stock, 1);

        // Cart survives for the caller to fix up
        assert_eq!(db.cart().items(&session).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input_and_empty_cart() {
        let db = test_db().await;
        let session = db.sessions().create(Utc::now()).await.unwrap();

        let no_address = NewOrder {
            restaurant_id: "rest-42".to_string(),
            delivery_address: "  ".to_string(),
            notes: None,
        };
        assert!(matches!(
            db.orders()
                .create_from_cart(&session.id, &no_address, Utc::now())
                .await,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));

        assert!(matches!(
            db.orders()
                .create_from_cart(&session.id, &checkout_input(), Utc::now())
                .await,
            Err(DbError::Domain(CoreError::EmptyCart))
        ));
    }

    #[tokio::test]
    async fn test_status_happy_path() {
        let db = test_db().await;
        let order = order_at_status(&db, OrderStatus::Completed).await;
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.driver_id.is_some());
    }

    #[tokio::test]
    async fn test_illegal_transitions_fail() {
        let db = test_db().await;
        let (session, _, _) = seed_cart(&db).await;
        let order = db
            .orders()
            .create_from_cart(&session, &checkout_input(), Utc::now())
            .await
            .unwrap();

        // Skipping ahead
        let err = db
            .orders()
            .update_status(&order.id, OrderStatus::OutForDelivery)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::OutForDelivery,
            })
        ));

        // Status unchanged by the failed attempt
        let fresh = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(fresh.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_backward_transition_always_fails() {
        let db = test_db().await;
        let order = order_at_status(&db, OrderStatus::Completed).await;

        assert!(matches!(
            db.orders()
                .update_status(&order.id, OrderStatus::Pending)
                .await,
            Err(DbError::Domain(CoreError::InvalidTransition { .. }))
        ));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock() {
        let db = test_db().await;
        let (session, milk, bread) = seed_cart(&db).await;
        let order = db
            .orders()
            .create_from_cart(&session, &checkout_input(), Utc::now())
            .await
            .unwrap();

        assert_eq!(db.products().get_by_id(&milk.id).await.unwrap().unwrap().stock, 5);

        db.orders().cancel(&order.id).await.unwrap();

        let fresh = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(fresh.status, OrderStatus::Cancelled);

        // Every purchased unit is sellable again
        assert_eq!(db.products().get_by_id(&milk.id).await.unwrap().unwrap().stock, 10);
        assert_eq!(db.products().get_by_id(&bread.id).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_cancel_routes_through_update_status() {
        let db = test_db().await;
        let (session, milk, _) = seed_cart(&db).await;
        let order = db
            .orders()
            .create_from_cart(&session, &checkout_input(), Utc::now())
            .await
            .unwrap();

        // The generic entry point must apply the same stock policy
        db.orders()
            .update_status(&order.id, OrderStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(db.products().get_by_id(&milk.id).await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_cancel_fails_for_terminal_and_delivered() {
        let db = test_db().await;

        let delivered = order_at_status(&db, OrderStatus::Delivered).await;
        assert!(matches!(
            db.orders().cancel(&delivered.id).await,
            Err(DbError::Domain(CoreError::InvalidTransition { .. }))
        ));

        let completed = order_at_status(&db, OrderStatus::Completed).await;
        assert!(matches!(
            db.orders().cancel(&completed.id).await,
            Err(DbError::Domain(CoreError::InvalidTransition { .. }))
        ));
    }

    #[tokio::test]
    async fn test_cancel_succeeds_across_cancellable_set() {
        let db = test_db().await;
        for target in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Priced,
            OrderStatus::Assigned,
        ] {
            let order = order_at_status(&db, target).await;
            db.orders().cancel(&order.id).await.unwrap();
            let fresh = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
            assert_eq!(fresh.status, OrderStatus::Cancelled, "from {target}");
        }
    }

    #[tokio::test]
    async fn test_update_details_touches_only_address_and_notes() {
        let db = test_db().await;
        let order = order_at_status(&db, OrderStatus::Delivered).await;

        let patch = OrderPatch {
            delivery_address: Some("99 Oak Ave".to_string()),
            notes: Some("leave at the door".to_string()),
        };
        db.orders().update_details(&order.id, &patch).await.unwrap();

        let fresh = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(fresh.delivery_address, "99 Oak Ave");
        assert_eq!(fresh.notes.as_deref(), Some("leave at the door"));

        // Financial and lifecycle fields untouched
        assert_eq!(fresh.total_cents, order.total_cents);
        assert_eq!(fresh.status, order.status);
        assert_eq!(fresh.driver_id, order.driver_id);
    }

    #[tokio::test]
    async fn test_update_details_missing_order() {
        let db = test_db().await;
        assert!(matches!(
            db.orders()
                .update_details("no-such-order", &OrderPatch::default())
                .await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_assign_driver_happy_path() {
        let db = test_db().await;
        let order = order_at_status(&db, OrderStatus::Priced).await;
        let driver = seed_driver(&db, "Robin", true).await;

        db.orders().assign_driver(&order.id, &driver.id).await.unwrap();

        let fresh = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(fresh.status, OrderStatus::Assigned);
        assert_eq!(fresh.driver_id.as_deref(), Some(driver.id.as_str()));
    }

    #[tokio::test]
    async fn test_assign_driver_failure_modes() {
        let db = test_db().await;
        let order = order_at_status(&db, OrderStatus::Priced).await;

        // Unavailable driver, even though role is correct
        let off_shift = seed_driver(&db, "Robin", false).await;
        assert!(matches!(
            db.orders().assign_driver(&order.id, &off_shift.id).await,
            Err(DbError::Domain(CoreError::DriverUnavailable(_)))
        ));

        // Profile exists but is not a driver
        let now = Utc::now();
        let admin = DriverProfile {
            id: Uuid::new_v4().to_string(),
            name: "Alex".to_string(),
            role: "admin".to_string(),
            is_available: true,
            created_at: now,
            updated_at: now,
        };
        db.drivers().insert(&admin).await.unwrap();
        assert!(matches!(
            db.orders().assign_driver(&order.id, &admin.id).await,
            Err(DbError::Domain(CoreError::DriverNotFound(_)))
        ));

        // No profile at all
        assert!(matches!(
            db.orders().assign_driver(&order.id, "ghost").await,
            Err(DbError::Domain(CoreError::DriverNotFound(_)))
        ));

        // None of the failures bound a driver or moved the status
        let fresh = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(fresh.status, OrderStatus::Priced);
        assert!(fresh.driver_id.is_none());
    }

    #[tokio::test]
    async fn test_assign_driver_requires_priced_order() {
        let db = test_db().await;
        let order = order_at_status(&db, OrderStatus::Pending).await;
        let driver = seed_driver(&db, "Robin", true).await;

        assert!(matches!(
            db.orders().assign_driver(&order.id, &driver.id).await,
            Err(DbError::Domain(CoreError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Assigned,
            }))
        ));
    }

    #[tokio::test]
    async fn test_list_and_list_for_driver() {
        let db = test_db().await;
        let assigned = order_at_status(&db, OrderStatus::Assigned).await;
        let pending = order_at_status(&db, OrderStatus::Pending).await;

        let all = db.orders().list(None, 10).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_pending = db
            .orders()
            .list(Some(OrderStatus::Pending), 10)
            .await
            .unwrap();
        assert_eq!(only_pending.len(), 1);
        assert_eq!(only_pending[0].id, pending.id);

        let driver_id = assigned.driver_id.clone().unwrap();
        let mine = db.orders().list_for_driver(&driver_id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, assigned.id);
    }
}
