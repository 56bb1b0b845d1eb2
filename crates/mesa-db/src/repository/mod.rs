//! # Repository Implementations
//!
//! One repository per aggregate, each a thin handle over the shared
//! `SqlitePool`:
//!
//! - [`session`] - anonymous cart sessions (create / resolve / expiry sweep)
//! - [`cart`] - cart line items, validated against the Stock Ledger
//! - [`product`] - catalog plus the Stock Ledger primitive
//! - [`order`] - checkout, the status state machine, driver assignment
//! - [`driver`] - driver profile lookup and availability
//! - [`stats`] - read-only order rollups
//!
//! Repositories are cheap to construct (pool clones are reference-counted)
//! and are handed out by [`crate::Database`] accessor methods.

pub mod cart;
pub mod driver;
pub mod order;
pub mod product;
pub mod session;
pub mod stats;
