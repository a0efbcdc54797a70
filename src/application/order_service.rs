//! Order pipeline: pricing, assembly, and the status state machine.
//!
//! `create_order` runs steps 1-8 of the pipeline inside one transaction; any
//! failure, including a stock shortfall discovered last, rolls back every
//! write. `transition_status` runs a second transaction-scoped flow, with the
//! compensating stock revert committed atomically with the cancellation.

use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    generate_order_number, Actor, CreateOrderInput, OrderListPage, OrderView, PricedOrder,
};
use crate::domain::pricing::price_lines;
use crate::domain::status::{ActorRole, OrderStatus};
use crate::domain::stock::StockOrderLine;
use crate::infrastructure::models::{NewOrderRow, OrderStatusChangeset};
use crate::infrastructure::order_repo::OrderFilters;
use crate::infrastructure::{catalog_repo, order_repo};

use super::stock_service;

/// How many times a creation is re-attempted when the generated order number
/// collides with an existing one. Collisions need the same millisecond and
/// the same 4-character random suffix, so one retry is already generous.
const ORDER_NUMBER_ATTEMPTS: u32 = 3;

pub fn create_order(
    conn: &mut PgConnection,
    input: &CreateOrderInput,
) -> Result<OrderView, DomainError> {
    if input.lines.is_empty() {
        return Err(DomainError::InvalidInput("order has no items".to_string()));
    }

    let mut attempt = 0;
    let order_id = loop {
        attempt += 1;
        match conn.transaction(|conn| create_order_in_txn(conn, input)) {
            Err(DomainError::OrderNumberConflict) if attempt < ORDER_NUMBER_ATTEMPTS => {
                log::warn!("[order] order number collision, retrying (attempt {attempt})");
                continue;
            }
            other => break other?,
        }
    };

    // Read-after-write outside the transaction: the order just committed and
    // nothing else can have mutated it yet.
    let view = order_repo::load_order_view(conn, order_id)?
        .ok_or_else(|| DomainError::Internal("created order vanished on re-read".to_string()))?;
    log::info!(
        "[order] created: {} by customer {}",
        view.order_number,
        view.customer_id
    );
    Ok(view)
}

fn create_order_in_txn(
    conn: &mut PgConnection,
    input: &CreateOrderInput,
) -> Result<Uuid, DomainError> {
    let restaurant = catalog_repo::load_restaurant(conn, input.restaurant_id)?
        .filter(|r| r.is_active)
        .ok_or(DomainError::RestaurantNotFound)?;
    if !restaurant.is_open {
        return Err(DomainError::RestaurantClosed);
    }

    let product_ids: Vec<Uuid> = input.lines.iter().map(|l| l.product_id).collect();
    let products = catalog_repo::load_products_with_options(conn, &product_ids)?;
    let priced: PricedOrder = price_lines(&input.lines, &products, restaurant.id)?;

    if priced.subtotal < restaurant.min_order_value {
        return Err(DomainError::MinimumOrderNotMet {
            minimum: restaurant.min_order_value,
        });
    }

    let delivery_fee = restaurant.delivery_fee;
    let total = &priced.subtotal + &delivery_fee;

    let stock_lines: Vec<StockOrderLine> = priced
        .lines
        .iter()
        .map(|l| StockOrderLine {
            product_id: l.product_id,
            product_name: l.product_name.clone(),
            quantity: l.quantity,
        })
        .collect();
    stock_service::validate_and_decrement(conn, &stock_lines)?;

    let order_id = Uuid::new_v4();
    order_repo::insert_order(
        conn,
        &NewOrderRow {
            id: order_id,
            order_number: generate_order_number(),
            customer_id: input.customer_id,
            restaurant_id: input.restaurant_id,
            status: OrderStatus::Pending.as_str().to_string(),
            subtotal: priced.subtotal.clone(),
            delivery_fee,
            total,
            delivery_address: input.delivery.address.clone(),
            delivery_city: input.delivery.city.clone(),
            delivery_state: input.delivery.state.clone(),
            delivery_zip_code: input.delivery.zip_code.clone(),
            delivery_phone: input.delivery.phone.clone(),
            notes: input.notes.clone(),
        },
    )?;
    order_repo::insert_items(conn, order_id, &priced)?;

    Ok(order_id)
}

pub fn transition_status(
    conn: &mut PgConnection,
    order_id: Uuid,
    new_status: OrderStatus,
    actor: &Actor,
    cancellation_reason: Option<&str>,
) -> Result<OrderView, DomainError> {
    conn.transaction(|conn| {
        let order = order_repo::find_order(conn, order_id)?.ok_or(DomainError::OrderNotFound)?;
        let restaurant = catalog_repo::load_restaurant(conn, order.restaurant_id)?;

        let is_owner = actor.role == ActorRole::Owner
            && restaurant.as_ref().is_some_and(|r| r.owner_id == actor.id);
        let is_admin = actor.role == ActorRole::Admin;
        let is_customer = order.customer_id == actor.id;

        if !is_owner && !is_admin && !is_customer {
            return Err(DomainError::Forbidden);
        }

        let current: OrderStatus = order.status.parse().map_err(DomainError::Internal)?;

        // A customer may only cancel, and only while the order is still
        // pending; the kitchen side (owner/admin) drives everything else.
        if is_customer && !is_owner && !is_admin {
            if new_status != OrderStatus::Cancelled {
                return Err(DomainError::Forbidden);
            }
            if current != OrderStatus::Pending {
                return Err(DomainError::OrderInProgress);
            }
        }

        if !current.can_transition_to(new_status) {
            return Err(DomainError::InvalidStatusTransition {
                from: current,
                to: new_status,
            });
        }

        // Stock was committed once, at creation; cancelling restores it in
        // full no matter how far the order had progressed.
        if new_status == OrderStatus::Cancelled {
            let stock_lines = order_repo::load_stock_lines(conn, order_id)?;
            stock_service::revert_consumption(conn, &stock_lines)?;
        }

        let now = Utc::now();
        let mut changeset = OrderStatusChangeset {
            status: Some(new_status.as_str().to_string()),
            updated_at: Some(now),
            ..Default::default()
        };
        match new_status {
            OrderStatus::Confirmed => changeset.confirmed_at = Some(now),
            OrderStatus::Preparing => changeset.preparing_at = Some(now),
            OrderStatus::Ready => changeset.ready_at = Some(now),
            OrderStatus::OutForDelivery => changeset.out_for_delivery_at = Some(now),
            OrderStatus::Delivered => changeset.delivered_at = Some(now),
            OrderStatus::Cancelled => {
                changeset.cancelled_at = Some(now);
                changeset.cancellation_reason = cancellation_reason.map(str::to_string);
            }
            OrderStatus::Pending => {}
        }
        order_repo::update_status(conn, order_id, &changeset)?;

        log::info!(
            "[order] {} status changed to {}",
            order.order_number,
            new_status
        );

        order_repo::load_order_view(conn, order_id)?
            .ok_or_else(|| DomainError::Internal("order vanished during transition".to_string()))
    })
}

pub fn get_order(conn: &mut PgConnection, order_id: Uuid) -> Result<Option<OrderView>, DomainError> {
    order_repo::load_order_view(conn, order_id)
}

pub fn list_orders(
    conn: &mut PgConnection,
    filters: &OrderFilters,
    page: i64,
    limit: i64,
) -> Result<OrderListPage, DomainError> {
    order_repo::list_orders(conn, filters, page, limit)
}
