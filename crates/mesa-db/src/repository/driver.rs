//! # Driver Repository
//!
//! Profile lookups for driver assignment, plus availability upkeep.
//!
//! ## Assignment Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Who Can Be Assigned a Delivery?                         │
//! │                                                                         │
//! │  get_driver(id)                                                        │
//! │       │                                                                 │
//! │       ├── no profile row ──────────────► DriverNotFound                │
//! │       ├── role != 'driver' ────────────► DriverNotFound                │
//! │       └── role = 'driver'                                              │
//! │                │                                                        │
//! │                ├── is_available = false ► DriverUnavailable            │
//! │                └── is_available = true ─► assignable                   │
//! │                                                                         │
//! │  A non-driver profile is NOT "unavailable" - as far as dispatch is     │
//! │  concerned it does not exist.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mesa_core::{CoreError, DriverProfile};

/// Repository for driver-profile database operations.
#[derive(Debug, Clone)]
pub struct DriverRepository {
    pool: SqlitePool,
}

impl DriverRepository {
    /// Creates a new DriverRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DriverRepository { pool }
    }

    /// Inserts a profile row.
    pub async fn insert(&self, profile: &DriverProfile) -> DbResult<()> {
        debug!(id = %profile.id, role = %profile.role, "Inserting profile");

        sqlx::query(
            r#"
            INSERT INTO profiles (id, name, role, is_available, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(&profile.role)
        .bind(profile.is_available)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a profile by ID, whatever its role.
    pub async fn get(&self, id: &str) -> DbResult<Option<DriverProfile>> {
        let profile = sqlx::query_as::<_, DriverProfile>(
            r#"
            SELECT id, name, role, is_available, created_at, updated_at
            FROM profiles
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Gets a profile that must be a driver.
    ///
    /// ## Returns
    /// * `Ok(DriverProfile)` - Profile exists with `role = 'driver'`
    /// * `Err(Domain(DriverNotFound))` - Missing, or not a driver
    pub async fn get_driver(&self, id: &str) -> DbResult<DriverProfile> {
        let profile = self
            .get(id)
            .await?
            .filter(DriverProfile::is_driver)
            .ok_or_else(|| CoreError::DriverNotFound(id.to_string()))?;

        Ok(profile)
    }

    /// Flips a driver's availability flag.
    ///
    /// Availability has no effect on deliveries already assigned; it only
    /// gates new assignments.
    pub async fn set_availability(&self, id: &str, is_available: bool) -> DbResult<()> {
        debug!(id = %id, is_available = %is_available, "Setting driver availability");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET is_available = ?2, updated_at = ?3
            WHERE id = ?1 AND role = 'driver'
            "#,
        )
        .bind(id)
        .bind(is_available)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Driver", id));
        }

        Ok(())
    }

    /// Lists drivers currently accepting deliveries.
    pub async fn list_available(&self) -> DbResult<Vec<DriverProfile>> {
        let drivers = sqlx::query_as::<_, DriverProfile>(
            r#"
            SELECT id, name, role, is_available, created_at, updated_at
            FROM profiles
            WHERE role = 'driver' AND is_available = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(drivers)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
