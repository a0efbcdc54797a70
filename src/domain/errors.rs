use bigdecimal::BigDecimal;
use thiserror::Error;
use uuid::Uuid;

use super::status::OrderStatus;
use super::stock::ProductStockStatus;

/// Business-rule failures of the order/stock pipeline. Each variant maps to a
/// stable error code (see [`DomainError::kind`]) that the HTTP layer exposes
/// unchanged, so clients can branch on it.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Restaurant not found")]
    RestaurantNotFound,

    #[error("Restaurant is currently closed")]
    RestaurantClosed,

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Product unavailable: {0}")]
    ProductUnavailable(String),

    #[error("Option not found: {0}")]
    OptionNotFound(Uuid),

    #[error("Option item not found: {0}")]
    OptionItemNotFound(Uuid),

    #[error("{0}")]
    InvalidSelection(String),

    #[error("Minimum order value is {minimum}")]
    MinimumOrderNotMet { minimum: BigDecimal },

    /// Carries the full per-product breakdown so the client can show exactly
    /// which items to remove and retry without a second round-trip.
    #[error("Insufficient stock for: {}", insufficient_product_names(products))]
    InsufficientStock { products: Vec<ProductStockStatus> },

    #[error("Ingredient not found")]
    IngredientNotFound,

    #[error("Adjustment would leave stock negative (current: {current}, adjustment: {delta})")]
    NegativeStock { current: BigDecimal, delta: BigDecimal },

    #[error("Cannot change status from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order is already in progress and can no longer be cancelled")]
    OrderInProgress,

    #[error("Not allowed to perform this action")]
    Forbidden,

    #[error("Order not found")]
    OrderNotFound,

    /// Order-number unique violation. The creation transaction is retried a
    /// few times before this surfaces to the caller as a 5xx.
    #[error("Could not allocate a unique order number")]
    OrderNumberConflict,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Stable machine-readable code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::RestaurantNotFound => "RESTAURANT_NOT_FOUND",
            DomainError::RestaurantClosed => "RESTAURANT_CLOSED",
            DomainError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            DomainError::ProductUnavailable(_) => "PRODUCT_UNAVAILABLE",
            DomainError::OptionNotFound(_) => "OPTION_NOT_FOUND",
            DomainError::OptionItemNotFound(_) => "OPTION_ITEM_NOT_FOUND",
            DomainError::InvalidSelection(_) => "INVALID_SELECTION",
            DomainError::MinimumOrderNotMet { .. } => "MINIMUM_ORDER_NOT_MET",
            DomainError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            DomainError::IngredientNotFound => "INPUT_NOT_FOUND",
            DomainError::NegativeStock { .. } => "NEGATIVE_STOCK",
            DomainError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            DomainError::OrderInProgress => "ORDER_IN_PROGRESS",
            DomainError::Forbidden => "FORBIDDEN",
            DomainError::OrderNotFound => "ORDER_NOT_FOUND",
            DomainError::OrderNumberConflict => "ORDER_NUMBER_CONFLICT",
            DomainError::InvalidInput(_) => "INVALID_INPUT",
            DomainError::Internal(_) => "INTERNAL",
        }
    }
}

fn insufficient_product_names(products: &[ProductStockStatus]) -> String {
    products
        .iter()
        .filter(|p| !p.available)
        .map(|p| p.product_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stock::MissingIngredient;
    use std::str::FromStr;

    fn status(name: &str, available: bool) -> ProductStockStatus {
        ProductStockStatus {
            product_id: Uuid::new_v4(),
            product_name: name.to_string(),
            quantity: 1,
            available,
            missing_ingredients: if available {
                vec![]
            } else {
                vec![MissingIngredient {
                    name: "Bun".to_string(),
                    required: BigDecimal::from(2),
                    available: BigDecimal::from(1),
                    unit: "un".to_string(),
                }]
            },
        }
    }

    #[test]
    fn insufficient_stock_message_names_only_short_products() {
        let err = DomainError::InsufficientStock {
            products: vec![status("Burger", false), status("Fries", true), status("Pizza", false)],
        };
        assert_eq!(err.to_string(), "Insufficient stock for: Burger, Pizza");
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(DomainError::RestaurantNotFound.kind(), "RESTAURANT_NOT_FOUND");
        assert_eq!(DomainError::IngredientNotFound.kind(), "INPUT_NOT_FOUND");
        assert_eq!(
            DomainError::NegativeStock {
                current: BigDecimal::from_str("1.5").unwrap(),
                delta: BigDecimal::from_str("-2").unwrap(),
            }
            .kind(),
            "NEGATIVE_STOCK"
        );
    }
}
