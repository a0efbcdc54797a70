use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service;
use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    Actor, CreateOrderInput, DeliveryInfo, OptionSelection, OrderLineInput, OrderView,
};
use crate::domain::status::{ActorRole, OrderStatus};
use crate::errors::AppError;
use crate::infrastructure::order_repo::OrderFilters;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OptionSelectionRequest {
    pub option_id: Uuid,
    #[serde(default)]
    pub item_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionSelectionRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub restaurant_id: Uuid,
    pub customer_id: Uuid,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub delivery_city: String,
    #[serde(default)]
    pub delivery_state: String,
    #[serde(default)]
    pub delivery_zip_code: String,
    #[serde(default)]
    pub delivery_phone: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    /// Actor identity; verified by the upstream authentication layer.
    pub actor_id: Uuid,
    pub actor_role: ActorRole,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemOptionResponse {
    pub option_name: String,
    pub item_name: String,
    /// Decimal as a string to avoid floating-point issues, e.g. "3.50"
    pub item_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_price: String,
    pub quantity: i32,
    pub subtotal: String,
    pub notes: Option<String>,
    pub options: Vec<OrderItemOptionResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: OrderStatus,
    pub subtotal: String,
    pub delivery_fee: String,
    pub total: String,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub delivery_zip_code: String,
    pub delivery_phone: String,
    pub notes: Option<String>,
    pub confirmed_at: Option<String>,
    pub preparing_at: Option<String>,
    pub ready_at: Option<String>,
    pub out_for_delivery_at: Option<String>,
    pub delivered_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(view: OrderView) -> Self {
        let rfc = |t: Option<chrono::DateTime<chrono::Utc>>| t.map(|t| t.to_rfc3339());
        OrderResponse {
            id: view.id,
            order_number: view.order_number,
            customer_id: view.customer_id,
            restaurant_id: view.restaurant_id,
            status: view.status,
            subtotal: view.subtotal.to_string(),
            delivery_fee: view.delivery_fee.to_string(),
            total: view.total.to_string(),
            delivery_address: view.delivery_address,
            delivery_city: view.delivery_city,
            delivery_state: view.delivery_state,
            delivery_zip_code: view.delivery_zip_code,
            delivery_phone: view.delivery_phone,
            notes: view.notes,
            confirmed_at: rfc(view.confirmed_at),
            preparing_at: rfc(view.preparing_at),
            ready_at: rfc(view.ready_at),
            out_for_delivery_at: rfc(view.out_for_delivery_at),
            delivered_at: rfc(view.delivered_at),
            cancelled_at: rfc(view.cancelled_at),
            cancellation_reason: view.cancellation_reason,
            created_at: view.created_at.to_rfc3339(),
            items: view
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    id: i.id,
                    product_id: i.product_id,
                    product_name: i.product_name,
                    product_price: i.product_price.to_string(),
                    quantity: i.quantity,
                    subtotal: i.subtotal.to_string(),
                    notes: i.notes,
                    options: i
                        .options
                        .into_iter()
                        .map(|o| OrderItemOptionResponse {
                            option_name: o.option_name,
                            item_name: o.item_name,
                            item_price: o.item_price.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    pub customer_id: Option<Uuid>,
    pub restaurant_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

fn to_input(body: CreateOrderRequest) -> CreateOrderInput {
    CreateOrderInput {
        restaurant_id: body.restaurant_id,
        customer_id: body.customer_id,
        lines: body
            .items
            .into_iter()
            .map(|i| OrderLineInput {
                product_id: i.product_id,
                quantity: i.quantity,
                notes: i.notes,
                options: i
                    .options
                    .into_iter()
                    .map(|o| OptionSelection {
                        option_id: o.option_id,
                        item_ids: o.item_ids,
                    })
                    .collect(),
            })
            .collect(),
        delivery: DeliveryInfo {
            address: body.delivery_address,
            city: body.delivery_city,
            state: body.delivery_state,
            zip_code: body.delivery_zip_code,
            phone: body.delivery_phone,
        },
        notes: body.notes,
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Runs the whole order pipeline in one database transaction: catalog
/// validation, pricing, stock decrement, and persistence either all commit or
/// all roll back.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Business rule violated (closed restaurant, invalid selection, minimum order, insufficient stock, ...)"),
        (status = 404, description = "Restaurant or product not found"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    pool: web::Data<DbPool>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let input = to_input(body.into_inner());

    let view = web::block(move || {
        let mut conn = pool.get()?;
        order_service::create_order(&mut conn, &input).map_err(AppError::Domain)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderResponse::from(view)))
}

/// PATCH /orders/{id}/status
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Illegal transition or order already in progress"),
        (status = 403, description = "Actor may not perform this transition"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body.into_inner();

    let view = web::block(move || {
        let mut conn = pool.get()?;
        let actor = Actor {
            id: body.actor_id,
            role: body.actor_role,
        };
        order_service::transition_status(
            &mut conn,
            order_id,
            body.status,
            &actor,
            body.cancellation_reason.as_deref(),
        )
        .map_err(AppError::Domain)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(view)))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let view = web::block(move || {
        let mut conn = pool.get()?;
        order_service::get_order(&mut conn, order_id).map_err(AppError::Domain)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    match view {
        Some(view) => Ok(HttpResponse::Ok().json(OrderResponse::from(view))),
        None => Err(AppError::Domain(DomainError::OrderNotFound)),
    }
}

/// GET /orders
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("customer_id" = Option<Uuid>, Query, description = "Filter by customer"),
        ("restaurant_id" = Option<Uuid>, Query, description = "Filter by restaurant"),
        ("status" = Option<OrderStatus>, Query, description = "Filter by status"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    pool: web::Data<DbPool>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let filters = OrderFilters {
        customer_id: params.customer_id,
        restaurant_id: params.restaurant_id,
        status: params.status,
    };

    let result = web::block(move || {
        let mut conn = pool.get()?;
        order_service::list_orders(&mut conn, &filters, page, limit).map_err(AppError::Domain)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        orders: result.orders.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page: result.page,
        limit: result.limit,
    }))
}
