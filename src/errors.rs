use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

/// Business-rule failures map to 4xx with a stable `code`; unexpected
/// persistence errors are 5xx with the detail kept out of the response body.
fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::RestaurantNotFound
        | DomainError::ProductNotFound(_)
        | DomainError::OptionNotFound(_)
        | DomainError::OptionItemNotFound(_)
        | DomainError::IngredientNotFound
        | DomainError::OrderNotFound => StatusCode::NOT_FOUND,

        DomainError::Forbidden => StatusCode::FORBIDDEN,

        DomainError::RestaurantClosed
        | DomainError::ProductUnavailable(_)
        | DomainError::InvalidSelection(_)
        | DomainError::MinimumOrderNotMet { .. }
        | DomainError::InsufficientStock { .. }
        | DomainError::NegativeStock { .. }
        | DomainError::InvalidStatusTransition { .. }
        | DomainError::OrderInProgress
        | DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,

        DomainError::OrderNumberConflict | DomainError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(e) => domain_status(e),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("internal error: {self}");
            return HttpResponse::build(status).json(serde_json::json!({
                "code": "INTERNAL",
                "error": "Internal server error"
            }));
        }

        let AppError::Domain(e) = self else {
            unreachable!("non-domain errors are always 5xx");
        };
        let mut body = serde_json::json!({
            "code": e.kind(),
            "error": e.to_string(),
        });
        if let DomainError::InsufficientStock { products } = e {
            body["details"] = serde_json::json!({ "products": products });
        }
        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    #[test]
    fn not_found_kinds_map_to_404() {
        for err in [
            DomainError::RestaurantNotFound,
            DomainError::ProductNotFound(Uuid::new_v4()),
            DomainError::OrderNotFound,
            DomainError::IngredientNotFound,
        ] {
            assert_eq!(AppError::Domain(err).status_code(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn business_rule_failures_map_to_400() {
        for err in [
            DomainError::RestaurantClosed,
            DomainError::OrderInProgress,
            DomainError::MinimumOrderNotMet { minimum: BigDecimal::from(25) },
            DomainError::InsufficientStock { products: vec![] },
        ] {
            assert_eq!(AppError::Domain(err).status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn forbidden_maps_to_403() {
        assert_eq!(
            AppError::Domain(DomainError::Forbidden).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn internal_and_collision_map_to_500_without_detail() {
        let resp = AppError::Domain(DomainError::Internal("boom".to_string())).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            AppError::Domain(DomainError::OrderNumberConflict).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn insufficient_stock_body_carries_product_breakdown() {
        use crate::domain::stock::{MissingIngredient, ProductStockStatus};

        let err = AppError::Domain(DomainError::InsufficientStock {
            products: vec![ProductStockStatus {
                product_id: Uuid::new_v4(),
                product_name: "Burger".to_string(),
                quantity: 1,
                available: false,
                missing_ingredients: vec![MissingIngredient {
                    name: "Bun".to_string(),
                    required: BigDecimal::from(1),
                    available: BigDecimal::from(0),
                    unit: "un".to_string(),
                }],
            }],
        });
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
