//! # Statistics Repository
//!
//! Read-only rollups over committed orders for dashboards.
//!
//! ## Revenue Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │             What Counts Toward the Dashboard Numbers?                   │
//! │                                                                         │
//! │                     total_orders    total_revenue                       │
//! │  pending .. completed    ✓               ✓                              │
//! │  cancelled               ✓               ✗                              │
//! │                                                                         │
//! │  A cancelled order still happened (it counts), but nobody was          │
//! │  charged for it (it earns nothing).                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pure reads, no side effects; safe to call from any dashboard at any
//! frequency.

use sqlx::SqlitePool;

use crate::error::DbResult;
use mesa_core::{DateRange, OrderStatistics, OrderStatus, StatusCount};

/// Repository for order statistics.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    /// Creates a new StatsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Computes order statistics, optionally windowed to `[start, end)` on
    /// order creation time.
    ///
    /// ## Returns
    /// Per-status counts, the total order count, and revenue summed over
    /// every non-cancelled order.
    pub async fn order_statistics(&self, range: Option<DateRange>) -> DbResult<OrderStatistics> {
        let counts: Vec<(OrderStatus, i64)> = match range {
            Some(range) => {
                sqlx::query_as(
                    r#"
                    SELECT status, COUNT(*)
                    FROM orders
                    WHERE created_at >= ?1 AND created_at < ?2
                    GROUP BY status
                    "#,
                )
                .bind(range.start)
                .bind(range.end)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT status, COUNT(*)
                    FROM orders
                    GROUP BY status
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let revenue: i64 = match range {
            Some(range) => {
                sqlx::query_scalar(
                    r#"
                    SELECT COALESCE(SUM(total_cents), 0)
                    FROM orders
                    WHERE status != ?1 AND created_at >= ?2 AND created_at < ?3
                    "#,
                )
                .bind(OrderStatus::Cancelled)
                .bind(range.start)
                .bind(range.end)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    r#"
                    SELECT COALESCE(SUM(total_cents), 0)
                    FROM orders
                    WHERE status != ?1
                    "#,
                )
                .bind(OrderStatus::Cancelled)
                .fetch_one(&self.pool)
                .await?
            }
        };

        let total_orders = counts.iter().map(|(_, count)| count).sum();
        let by_status = counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect();

        Ok(OrderStatistics {
            total_orders,
            total_revenue_cents: revenue,
            by_status,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use mesa_core::{NewOrder, Product};
    use uuid::Uuid;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Creates one order worth `quantity × 250` cents at `created_at`.
    async fn seed_order(
        db: &Database,
        quantity: i64,
        created_at: chrono::DateTime<Utc>,
    ) -> mesa_core::Order {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: "Milk 1L".to_string(),
            description: None,
            price_cents: 250,
            stock: quantity,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();

        let session = db.sessions().create(now).await.unwrap();
        db.cart()
            .add_item(&session.id, &product.id, quantity)
            .await
            .unwrap();

        let input = NewOrder {
            restaurant_id: "rest-42".to_string(),
            delivery_address: "12 Elm St".to_string(),
            notes: None,
        };
        db.orders()
            .create_from_cart(&session.id, &input, created_at)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_statistics() {
        let db = test_db().await;
        let stats = db.stats().order_statistics(None).await.unwrap();

        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.total_revenue_cents, 0);
        assert!(stats.by_status.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_orders_counted_but_not_revenue() {
        let db = test_db().await;
        let now = Utc::now();

        seed_order(&db, 4, now).await; // 1000 cents, pending
        seed_order(&db, 2, now).await; // 500 cents, pending
        let doomed = seed_order(&db, 8, now).await; // 2000 cents, cancelled below
        db.orders().cancel(&doomed.id).await.unwrap();

        let stats = db.stats().order_statistics(None).await.unwrap();

        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.total_revenue_cents, 1500);
        assert_eq!(stats.count_for(OrderStatus::Pending), 2);
        assert_eq!(stats.count_for(OrderStatus::Cancelled), 1);
    }

    #[tokio::test]
    async fn test_range_filter_is_half_open() {
        let db = test_db().await;
        let now = Utc::now();

        seed_order(&db, 4, now - Duration::days(10)).await; // outside
        seed_order(&db, 2, now - Duration::hours(1)).await; // inside

        let range = DateRange {
            start: now - Duration::days(1),
            end: now,
        };
        let stats = db.stats().order_statistics(Some(range)).await.unwrap();

        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.total_revenue_cents, 500);

        // Unwindowed sees both
        let all = db.stats().order_statistics(None).await.unwrap();
        assert_eq!(all.total_orders, 2);
        assert_eq!(all.total_revenue_cents, 1500);
    }
}
