//! # Sale Status State Machine
//!
//! Explicit finite-state machine for the sale lifecycle.
//!
//! ## Transition Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Sale Status Transitions                              │
//! │                                                                         │
//! │   Pending ────► Preparing ────► Shipped ────► Delivered                │
//! │      │              │              │              │                     │
//! │      │              │              │              └──► Refunded        │
//! │      ├──────────────┴──────────────┴──► Completed ──► Cancelled        │
//! │      │                                      │             (terminal)   │
//! │      └──► Cancelled                         └──► Refunded (terminal)   │
//! │                                                                         │
//! │   Non-terminal (Pending, Preparing, Shipped): may move to any other    │
//! │   listed state.                                                        │
//! │   Completed: only → Cancelled / Refunded (admin cancellation of a      │
//! │   completed sale stays possible, with stock restitution).              │
//! │   Delivered: only → Refunded.                                          │
//! │   Cancelled, Refunded: accept nothing.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Illegal jumps (e.g. Delivered → Pending) are rejected before any update
//! is written.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Initial state: the sale exists but has not been settled.
    Pending,
    /// Paid and finalized.
    Completed,
    /// Cancelled with stock restitution. Terminal.
    Cancelled,
    /// Money returned. Terminal.
    Refunded,
    /// Online order being prepared.
    Preparing,
    /// Online order handed to the carrier.
    Shipped,
    /// Online order received by the customer.
    Delivered,
}

impl SaleStatus {
    /// States that accept no further transitions at all.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, SaleStatus::Cancelled | SaleStatus::Refunded)
    }

    /// Whether the machine allows moving from `self` to `to`.
    ///
    /// A no-op transition (same state) is not a legal move; callers treat
    /// "status unchanged" separately from "status changed".
    pub fn can_transition_to(&self, to: SaleStatus) -> bool {
        if *self == to {
            return false;
        }
        match self {
            // Open states may move anywhere.
            SaleStatus::Pending | SaleStatus::Preparing | SaleStatus::Shipped => true,
            // Settled states only unwind.
            SaleStatus::Completed => {
                matches!(to, SaleStatus::Cancelled | SaleStatus::Refunded)
            }
            SaleStatus::Delivered => matches!(to, SaleStatus::Refunded),
            SaleStatus::Cancelled | SaleStatus::Refunded => false,
        }
    }

    /// Stable lowercase token, the same spelling the database stores.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::Refunded => "refunded",
            SaleStatus::Preparing => "preparing",
            SaleStatus::Shipped => "shipped",
            SaleStatus::Delivered => "delivered",
        }
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = ValidationError;

    /// Parses the lowercase wire token. Malformed input is a validation
    /// error, not a silent default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(SaleStatus::Pending),
            "completed" => Ok(SaleStatus::Completed),
            "cancelled" => Ok(SaleStatus::Cancelled),
            "refunded" => Ok(SaleStatus::Refunded),
            "preparing" => Ok(SaleStatus::Preparing),
            "shipped" => Ok(SaleStatus::Shipped),
            "delivered" => Ok(SaleStatus::Delivered),
            other => Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown status '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SaleStatus; 7] = [
        SaleStatus::Pending,
        SaleStatus::Completed,
        SaleStatus::Cancelled,
        SaleStatus::Refunded,
        SaleStatus::Preparing,
        SaleStatus::Shipped,
        SaleStatus::Delivered,
    ];

    #[test]
    fn test_open_states_move_anywhere_else() {
        for from in [SaleStatus::Pending, SaleStatus::Preparing, SaleStatus::Shipped] {
            for to in ALL {
                assert_eq!(from.can_transition_to(to), from != to);
            }
        }
    }

    #[test]
    fn test_completed_only_unwinds() {
        assert!(SaleStatus::Completed.can_transition_to(SaleStatus::Cancelled));
        assert!(SaleStatus::Completed.can_transition_to(SaleStatus::Refunded));
        assert!(!SaleStatus::Completed.can_transition_to(SaleStatus::Pending));
        assert!(!SaleStatus::Completed.can_transition_to(SaleStatus::Shipped));
    }

    #[test]
    fn test_delivered_never_reopens() {
        assert!(SaleStatus::Delivered.can_transition_to(SaleStatus::Refunded));
        assert!(!SaleStatus::Delivered.can_transition_to(SaleStatus::Pending));
        assert!(!SaleStatus::Delivered.can_transition_to(SaleStatus::Preparing));
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for from in [SaleStatus::Cancelled, SaleStatus::Refunded] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn test_parse_round_trip() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<SaleStatus>().unwrap(), status);
        }
        assert!("paid".parse::<SaleStatus>().is_err());
        assert_eq!(" SHIPPED ".parse::<SaleStatus>().unwrap(), SaleStatus::Shipped);
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(SaleStatus::default(), SaleStatus::Pending);
    }
}
