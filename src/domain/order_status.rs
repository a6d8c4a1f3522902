//! Order lifecycle state machine.
//!
//! Every status write in the system goes through [`OrderStatus::next`];
//! there is no other place where a transition is decided.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// The nine persisted order states. `completed`, `cancelled` and
/// `refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Paid,
    InProgress,
    Ready,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 9] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Paid,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Paid => "paid",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    /// Resolve the successor state for `(current, actor, action)`, or
    /// reject the triple. Terminal states reject everything.
    pub fn next(
        current: OrderStatus,
        actor: Actor,
        action: OrderAction,
    ) -> Result<OrderStatus, TransitionError> {
        use {Actor::*, OrderAction::*, OrderStatus::*};

        let next = match (actor, current, action) {
            (Client, Pending, Cancel) => Cancelled,
            (Client, Confirmed, Cancel) => Cancelled,
            (Client, Confirmed, Pay) => Paid,
            (Client, Delivered, Complete) => Completed,

            (Tailor, Pending, Confirm) => Confirmed,
            (Tailor, Pending, Decline) => Cancelled,
            (Tailor, Confirmed, Pay) => Paid,
            (Tailor, Paid, StartWork) => InProgress,
            (Tailor, InProgress, MarkReady) => Ready,
            (Tailor, Ready, MarkDelivered) => Delivered,
            (Tailor, Paid | InProgress | Ready, MarkRefunded) => Refunded,

            _ => {
                return Err(TransitionError {
                    status: current,
                    actor,
                    action,
                });
            }
        };
        Ok(next)
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
        OrderStatus::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

/// Which side of the order is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Client,
    Tailor,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Client => f.write_str("client"),
            Actor::Tailor => f.write_str("tailor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Cancel,
    Pay,
    Complete,
    Confirm,
    Decline,
    StartWork,
    MarkReady,
    MarkDelivered,
    MarkRefunded,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderAction::Cancel => "cancel",
            OrderAction::Pay => "pay",
            OrderAction::Complete => "complete",
            OrderAction::Confirm => "confirm",
            OrderAction::Decline => "decline",
            OrderAction::StartWork => "start_work",
            OrderAction::MarkReady => "mark_ready",
            OrderAction::MarkDelivered => "mark_delivered",
            OrderAction::MarkRefunded => "mark_refunded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{actor} cannot apply {action} to an order in status {status}")]
pub struct TransitionError {
    pub status: OrderStatus,
    pub actor: Actor,
    pub action: OrderAction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use {Actor::*, OrderAction::*, OrderStatus::*};

    #[test]
    fn happy_path_never_skips_a_state() {
        let steps = [
            (Pending, Tailor, Confirm, Confirmed),
            (Confirmed, Client, Pay, Paid),
            (Paid, Tailor, StartWork, InProgress),
            (InProgress, Tailor, MarkReady, Ready),
            (Ready, Tailor, MarkDelivered, Delivered),
            (Delivered, Client, Complete, Completed),
        ];
        for (from, actor, action, expected) in steps {
            assert_eq!(OrderStatus::next(from, actor, action), Ok(expected));
        }
    }

    #[test]
    fn terminal_states_reject_every_action() {
        let actions = [
            Cancel,
            Pay,
            Complete,
            Confirm,
            Decline,
            StartWork,
            MarkReady,
            MarkDelivered,
            MarkRefunded,
        ];
        for status in [Completed, Cancelled, Refunded] {
            for actor in [Client, Tailor] {
                for action in actions {
                    assert!(
                        OrderStatus::next(status, actor, action).is_err(),
                        "{actor} {action} accepted on terminal {status}"
                    );
                }
            }
        }
    }

    #[test]
    fn client_can_cancel_only_before_payment() {
        assert_eq!(OrderStatus::next(Pending, Client, Cancel), Ok(Cancelled));
        assert_eq!(OrderStatus::next(Confirmed, Client, Cancel), Ok(Cancelled));
        assert!(OrderStatus::next(Paid, Client, Cancel).is_err());
        assert!(OrderStatus::next(InProgress, Client, Cancel).is_err());
        assert!(OrderStatus::next(Ready, Client, Cancel).is_err());
        assert!(OrderStatus::next(Delivered, Client, Cancel).is_err());
    }

    #[test]
    fn client_cannot_drive_production_states() {
        assert!(OrderStatus::next(Pending, Client, Confirm).is_err());
        assert!(OrderStatus::next(Paid, Client, StartWork).is_err());
        assert!(OrderStatus::next(InProgress, Client, MarkReady).is_err());
        assert!(OrderStatus::next(Ready, Client, MarkDelivered).is_err());
    }

    #[test]
    fn tailor_can_decline_pending_and_refund_after_payment() {
        assert_eq!(OrderStatus::next(Pending, Tailor, Decline), Ok(Cancelled));
        assert_eq!(OrderStatus::next(Paid, Tailor, MarkRefunded), Ok(Refunded));
        assert_eq!(
            OrderStatus::next(InProgress, Tailor, MarkRefunded),
            Ok(Refunded)
        );
        assert_eq!(OrderStatus::next(Ready, Tailor, MarkRefunded), Ok(Refunded));
        assert!(OrderStatus::next(Pending, Tailor, MarkRefunded).is_err());
        assert!(OrderStatus::next(Delivered, Tailor, MarkRefunded).is_err());
    }

    #[test]
    fn status_strings_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert!("".parse::<OrderStatus>().is_err());
    }
}
