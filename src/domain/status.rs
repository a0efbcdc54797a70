use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle of an order. Stored as its SCREAMING_SNAKE_CASE name in the
/// `orders.status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// States reachable from `self` by the restaurant owner or an admin.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Preparing, Cancelled],
            Preparing => &[Ready, Cancelled],
            Ready => &[OutForDelivery, Delivered, Cancelled],
            OutForDelivery => &[Delivered, Cancelled],
            Delivered => &[],
            Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
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
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "PREPARING" => Ok(OrderStatus::Preparing),
            "READY" => Ok(OrderStatus::Ready),
            "OUT_FOR_DELIVERY" => Ok(OrderStatus::OutForDelivery),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Role of the actor requesting a status transition, as established by the
/// upstream authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Customer,
    Owner,
    Admin,
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    const ALL: [OrderStatus; 7] = [Pending, Confirmed, Preparing, Ready, OutForDelivery, Delivered, Cancelled];

    #[test]
    fn transition_table_matches_lifecycle() {
        assert_eq!(Pending.allowed_next(), &[Confirmed, Cancelled]);
        assert_eq!(Confirmed.allowed_next(), &[Preparing, Cancelled]);
        assert_eq!(Preparing.allowed_next(), &[Ready, Cancelled]);
        assert_eq!(Ready.allowed_next(), &[OutForDelivery, Delivered, Cancelled]);
        assert_eq!(OutForDelivery.allowed_next(), &[Delivered, Cancelled]);
    }

    #[test]
    fn terminal_states_have_no_successors() {
        for next in ALL {
            assert!(!Delivered.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn every_non_terminal_state_can_cancel() {
        for status in [Pending, Confirmed, Preparing, Ready, OutForDelivery] {
            assert!(status.can_transition_to(Cancelled), "{status} should allow cancellation");
        }
    }

    #[test]
    fn round_trips_through_db_representation() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }
}
