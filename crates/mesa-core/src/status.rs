//! # Order Status State Machine
//!
//! The order lifecycle as an explicit transition graph.
//!
//! ## The Status DAG
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Order Status Transitions                            │
//! │                                                                         │
//! │  pending ─► confirmed ─► priced ─► assigned ─► out_for_delivery        │
//! │     │           │           │          │               │                │
//! │     │           │           │          │               ▼                │
//! │     │           │           │          │           delivered            │
//! │     ▼           ▼           ▼          ▼               │                │
//! │  cancelled  cancelled   cancelled  cancelled           ▼                │
//! │                                                    completed            │
//! │                                                                         │
//! │  Terminal: completed, cancelled (no outgoing edges)                     │
//! │  Backward edges do not exist: completed → pending is always illegal     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Table, Two Consumers
//! The adjacency table below is the ONLY definition of legality. Both
//! `update_status` and `cancel` in the storage layer consult it, so the
//! rule cannot drift between the two paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order in its delivery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order has been created from a cart and awaits restaurant review.
    Pending,
    /// Restaurant has accepted the order.
    Confirmed,
    /// Delivery fee and final pricing settled.
    Priced,
    /// A driver has been bound to the order.
    Assigned,
    /// The driver has picked up and is en route.
    OutForDelivery,
    /// The customer has received the order.
    Delivered,
    /// Order fully settled; terminal.
    Completed,
    /// Order abandoned before handoff; terminal.
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order (for statistics rollups).
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Priced,
        OrderStatus::Assigned,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// The adjacency table: direct successors of each status.
    ///
    /// ## Single Source of Truth
    /// Every legality question (`can_transition_to`, `is_cancellable`,
    /// `is_terminal`) is answered from this table. There are no other
    /// status comparisons anywhere in the workspace.
    pub const fn successors(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Priced, OrderStatus::Cancelled],
            OrderStatus::Priced => &[OrderStatus::Assigned, OrderStatus::Cancelled],
            OrderStatus::Assigned => &[OrderStatus::OutForDelivery, OrderStatus::Cancelled],
            OrderStatus::OutForDelivery => &[OrderStatus::Delivered],
            OrderStatus::Delivered => &[OrderStatus::Completed],
            OrderStatus::Completed => &[],
            OrderStatus::Cancelled => &[],
        }
    }

    /// Checks whether `next` is a direct successor of this status.
    ///
    /// ## Example
    /// ```rust
    /// use mesa_core::status::OrderStatus;
    ///
    /// assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
    /// assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Assigned));
    /// assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Pending));
    /// ```
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.successors().contains(&next)
    }

    /// Validates a transition, producing the typed error on violation.
    ///
    /// ## Usage
    /// ```rust
    /// use mesa_core::status::OrderStatus;
    ///
    /// OrderStatus::Pending.check_transition(OrderStatus::Confirmed).unwrap();
    /// assert!(OrderStatus::Delivered.check_transition(OrderStatus::Cancelled).is_err());
    /// ```
    pub fn check_transition(self, next: OrderStatus) -> CoreResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Checks whether the order can still be cancelled from this status.
    ///
    /// Cancellation is only reachable from `{pending, confirmed, priced,
    /// assigned}`; once the order is out for delivery it must run to
    /// `delivered`/`completed`.
    pub fn is_cancellable(self) -> bool {
        self.can_transition_to(OrderStatus::Cancelled)
    }

    /// Checks whether this status has no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    /// Returns the canonical snake_case string for this status.
    ///
    /// This is the representation persisted in the `orders.status` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Priced => "priced",
            OrderStatus::Assigned => "assigned",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "priced" => Ok(OrderStatus::Priced),
            "assigned" => Ok(OrderStatus::Assigned),
            "out_for_delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
