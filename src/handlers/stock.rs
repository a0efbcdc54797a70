use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::stock_service::{self, StockCheckItem};
use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockCheckItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StockCheckRequest {
    pub items: Vec<StockCheckItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    /// Signed decimal as a string, e.g. "-2.500"
    pub delta: String,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub stock_quantity: String,
    pub min_stock: String,
    pub is_active: bool,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /stock/check
///
/// Public, read-only pre-checkout probe: reports per product whether the
/// current ledger covers the requested quantity, and which ingredients fall
/// short. Never takes locks and never mutates anything.
#[utoipa::path(
    post,
    path = "/stock/check",
    request_body = StockCheckRequest,
    responses(
        (status = 200, description = "Availability report", body = stock_service::StockAvailability),
    ),
    tag = "stock"
)]
pub async fn check_stock(
    pool: web::Data<DbPool>,
    body: web::Json<StockCheckRequest>,
) -> Result<HttpResponse, AppError> {
    let items: Vec<StockCheckItem> = body
        .into_inner()
        .items
        .into_iter()
        .map(|i| StockCheckItem {
            product_id: i.product_id,
            quantity: i.quantity,
        })
        .collect();

    let report = web::block(move || {
        let mut conn = pool.get()?;
        stock_service::check_availability(&mut conn, &items).map_err(AppError::Domain)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(report))
}

/// POST /ingredients/{id}/adjust
///
/// Manual stock correction (breakage, recounts, deliveries). Rejects any
/// adjustment that would take the quantity below zero.
#[utoipa::path(
    post,
    path = "/ingredients/{id}/adjust",
    params(("id" = Uuid, Path, description = "Ingredient UUID")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Adjusted ingredient", body = IngredientResponse),
        (status = 400, description = "Result would be negative"),
        (status = 404, description = "Ingredient not found"),
    ),
    tag = "stock"
)]
pub async fn adjust_stock(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<AdjustStockRequest>,
) -> Result<HttpResponse, AppError> {
    let ingredient_id = path.into_inner();
    let body = body.into_inner();
    let delta = BigDecimal::from_str(&body.delta).map_err(|e| {
        AppError::Domain(DomainError::InvalidInput(format!(
            "invalid delta '{}': {}",
            body.delta, e
        )))
    })?;

    let updated = web::block(move || {
        let mut conn = pool.get()?;
        stock_service::adjust_stock(&mut conn, ingredient_id, &delta, &body.reason)
            .map_err(AppError::Domain)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(IngredientResponse {
        id: updated.id,
        name: updated.name,
        unit: updated.unit,
        stock_quantity: updated.stock_quantity.to_string(),
        min_stock: updated.min_stock.to_string(),
        is_active: updated.is_active,
    }))
}
