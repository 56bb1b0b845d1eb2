//! # Cart Session Repository
//!
//! Time-boxed anonymous cart contexts.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Session Lifecycle                             │
//! │                                                                         │
//! │  1. FIRST CART ACCESS                                                  │
//! │     └── get_or_create(None) → CartSession { expires_at: now + 5h }     │
//! │         (caller stores the id client-side and sends it back)           │
//! │                                                                         │
//! │  2. SUBSEQUENT ACCESS                                                  │
//! │     └── get_or_create(Some(id)) → same session while unexpired,        │
//! │         a fresh one otherwise. NEVER "no session".                     │
//! │                                                                         │
//! │  3. END OF LIFE (whichever comes first)                                │
//! │     ├── successful checkout → cart cleared, session left to expire     │
//! │     └── cleanup_expired() sweep → session + items deleted (cascade)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sweep's delete-if-expired semantics are commutative: it is safe to
//! run concurrently with live traffic and with itself.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use mesa_core::CartSession;

/// Repository for cart-session database operations.
#[derive(Debug, Clone)]
pub struct CartSessionRepository {
    pool: SqlitePool,
}

impl CartSessionRepository {
    /// Creates a new CartSessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartSessionRepository { pool }
    }

    /// Creates a new cart session expiring 5 hours from `now`.
    ///
    /// ## Returns
    /// The created session. The caller correlates subsequent calls via the
    /// returned id (e.g., stored in a cookie).
    pub async fn create(&self, now: DateTime<Utc>) -> DbResult<CartSession> {
        let session = CartSession {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            expires_at: CartSession::expiry_from(now),
        };

        debug!(id = %session.id, expires_at = %session.expires_at, "Creating cart session");

        sqlx::query(
            r#"
            INSERT INTO cart_sessions (id, created_at, expires_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&session.id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    /// Gets a session by ID, but only while it is still active at `now`.
    ///
    /// ## Returns
    /// * `Ok(Some(CartSession))` - Session exists and is unexpired
    /// * `Ok(None)` - Session missing or expired
    pub async fn get(&self, id: &str, now: DateTime<Utc>) -> DbResult<Option<CartSession>> {
        let session = sqlx::query_as::<_, CartSession>(
            r#"
            SELECT id, created_at, expires_at
            FROM cart_sessions
            WHERE id = ?1 AND expires_at > ?2
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Resolves the caller's session, creating a fresh one when needed.
    ///
    /// ## Contract
    /// This call never reports "no session": it only ever yields a valid,
    /// active session. An expired or unknown id is silently replaced.
    ///
    /// ## Example
    /// ```rust,ignore
    /// // First visit: no id yet
    /// let session = repo.get_or_create(None, Utc::now()).await?;
    ///
    /// // Later visits: send the stored id back
    /// let session = repo.get_or_create(Some(&session.id), Utc::now()).await?;
    /// ```
    pub async fn get_or_create(
        &self,
        id: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<CartSession> {
        if let Some(id) = id {
            if let Some(session) = self.get(id, now).await? {
                return Ok(session);
            }
            debug!(id = %id, "Session missing or expired, creating a new one");
        }

        self.create(now).await
    }

    /// Deletes all sessions whose expiry has passed.
    ///
    /// Cart items belonging to reaped sessions are removed by the
    /// `ON DELETE CASCADE` on `cart_items.session_id`.
    ///
    /// ## Safety
    /// Idempotent, and safe to run concurrently with live traffic: an
    /// expired session can no longer be resolved by `get_or_create`, so
    /// nothing races the delete.
    ///
    /// ## Returns
    /// The number of sessions reaped.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cart_sessions WHERE expires_at <= ?1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        let reaped = result.rows_affected();
        if reaped > 0 {
            info!(reaped = %reaped, "Swept expired cart sessions");
        }

        Ok(reaped)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_sets_five_hour_expiry() {
        let db = test_db().await;
        let now = Utc::now();

        let session = db.sessions().create(now).await.unwrap();
        assert_eq!(session.expires_at - session.created_at, Duration::hours(5));
        assert!(session.is_active(now));
    }

    #[tokio::test]
    async fn test_get_or_create_returns_existing_active_session() {
        let db = test_db().await;
        let now = Utc::now();

        let first = db.sessions().get_or_create(None, now).await.unwrap();
        let second = db
            .sessions()
            .get_or_create(Some(&first.id), now)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_get_or_create_never_returns_expired_session() {
        let db = test_db().await;
        let now = Utc::now();

        let session = db.sessions().create(now).await.unwrap();

        // Ask again well past the 5h expiry
        let later = now + Duration::hours(6);
        let replacement = db
            .sessions()
            .get_or_create(Some(&session.id), later)
            .await
            .unwrap();

        assert_ne!(replacement.id, session.id);
        assert!(replacement.is_active(later));
    }

    #[tokio::test]
    async fn test_get_or_create_with_unknown_id() {
        let db = test_db().await;
        let now = Utc::now();

        let session = db
            .sessions()
            .get_or_create(Some("no-such-session"), now)
            .await
            .unwrap();
        assert!(session.is_active(now));
    }

    #[tokio::test]
    async fn test_cleanup_reaps_only_expired_sessions() {
        let db = test_db().await;
        let now = Utc::now();

        let old = db.sessions().create(now - Duration::hours(8)).await.unwrap();
        let live = db.sessions().create(now).await.unwrap();

        let reaped = db.sessions().cleanup_expired(now).await.unwrap();
        assert_eq!(reaped, 1);

        assert!(db.sessions().get(&old.id, now).await.unwrap().is_none());
        assert!(db.sessions().get(&live.id, now).await.unwrap().is_some());

        // Idempotent: nothing left to reap
        assert_eq!(db.sessions().cleanup_expired(now).await.unwrap(), 0);
    }
}
