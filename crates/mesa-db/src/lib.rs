//! # mesa-db: Database Layer for Mesa
//!
//! This crate provides storage for the Mesa order-fulfillment core.
//! It uses SQLite with sqlx for async operations, and it is where every
//! concurrency-sensitive invariant is enforced: guarded stock decrements,
//! unique cart rows, and atomic order creation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Mesa Data Flow                                 │
//! │                                                                         │
//! │  Caller (HTTP handler, admin tool, dashboard)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      mesa-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ SessionRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CartRepo      │    │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ ProductRepo   │    │              │  │   │
//! │  │   │ Management    │    │ OrderRepo     │    │              │  │   │
//! │  │   │               │    │ DriverRepo    │    │              │  │   │
//! │  │   │               │    │ StatsRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode, foreign keys ON)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (session, cart, order, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesa_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/mesa.db");
//! let db = Database::new(config).await?;
//!
//! // Shop, then check out
//! let session = db.sessions().get_or_create(None, Utc::now()).await?;
//! db.cart().add_item(&session.id, &product_id, 2).await?;
//! let order = db.orders().create_from_cart(&session.id, new_order, Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::driver::DriverRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::session::CartSessionRepository;
pub use repository::stats::StatsRepository;
