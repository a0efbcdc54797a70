use std::str::FromStr;

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    OrderItemOptionView, OrderItemView, OrderListPage, OrderView, PricedOrder,
};
use crate::domain::status::OrderStatus;
use crate::domain::stock::StockOrderLine;
use crate::schema::{order_item_options, order_items, orders};

use super::models::{
    NewOrderItemOptionRow, NewOrderItemRow, NewOrderRow, OrderItemOptionRow, OrderItemRow,
    OrderRow, OrderStatusChangeset,
};

pub fn insert_order(conn: &mut PgConnection, row: &NewOrderRow) -> Result<(), DomainError> {
    diesel::insert_into(orders::table)
        .values(row)
        .execute(conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                if info.constraint_name() == Some("orders_order_number_key") =>
            {
                DomainError::OrderNumberConflict
            }
            other => other.into(),
        })?;
    Ok(())
}

/// Insert the item and selected-option snapshots for a priced order.
pub fn insert_items(
    conn: &mut PgConnection,
    order_id: Uuid,
    priced: &PricedOrder,
) -> Result<(), DomainError> {
    for line in &priced.lines {
        let item_id = Uuid::new_v4();
        diesel::insert_into(order_items::table)
            .values(&NewOrderItemRow {
                id: item_id,
                order_id,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                product_price: line.unit_price.clone(),
                quantity: line.quantity,
                subtotal: line.subtotal.clone(),
                notes: line.notes.clone(),
            })
            .execute(conn)?;

        let option_rows: Vec<NewOrderItemOptionRow> = line
            .selected_options
            .iter()
            .map(|o| NewOrderItemOptionRow {
                id: Uuid::new_v4(),
                order_item_id: item_id,
                option_name: o.option_name.clone(),
                item_name: o.item_name.clone(),
                item_price: o.item_price.clone(),
            })
            .collect();
        if !option_rows.is_empty() {
            diesel::insert_into(order_item_options::table)
                .values(&option_rows)
                .execute(conn)?;
        }
    }
    Ok(())
}

pub fn find_order(conn: &mut PgConnection, id: Uuid) -> Result<Option<OrderRow>, DomainError> {
    let row = orders::table
        .filter(orders::id.eq(id))
        .select(OrderRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row)
}

/// The order's lines in the shape the consumption engine consumes, taken from
/// the persisted snapshots (so a cancellation reverts exactly what the
/// creation decremented, even if the catalog changed since).
pub fn load_stock_lines(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<Vec<StockOrderLine>, DomainError> {
    let rows: Vec<(Uuid, String, i32)> = order_items::table
        .filter(order_items::order_id.eq(order_id))
        .select((
            order_items::product_id,
            order_items::product_name,
            order_items::quantity,
        ))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(product_id, product_name, quantity)| StockOrderLine {
            product_id,
            product_name,
            quantity,
        })
        .collect())
}

pub fn update_status(
    conn: &mut PgConnection,
    order_id: Uuid,
    changeset: &OrderStatusChangeset,
) -> Result<(), DomainError> {
    diesel::update(orders::table.filter(orders::id.eq(order_id)))
        .set(changeset)
        .execute(conn)?;
    Ok(())
}

/// Read an order back with its items and option snapshots.
pub fn load_order_view(
    conn: &mut PgConnection,
    order_id: Uuid,
) -> Result<Option<OrderView>, DomainError> {
    let Some(order) = find_order(conn, order_id)? else {
        return Ok(None);
    };

    let items: Vec<OrderItemRow> = order_items::table
        .filter(order_items::order_id.eq(order_id))
        .order(order_items::created_at.asc())
        .select(OrderItemRow::as_select())
        .load(conn)?;

    let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
    let option_rows: Vec<OrderItemOptionRow> = order_item_options::table
        .filter(order_item_options::order_item_id.eq_any(&item_ids))
        .select(OrderItemOptionRow::as_select())
        .load(conn)?;

    Ok(Some(assemble_view(order, items, option_rows)?))
}

fn assemble_view(
    order: OrderRow,
    items: Vec<OrderItemRow>,
    option_rows: Vec<OrderItemOptionRow>,
) -> Result<OrderView, DomainError> {
    let status = OrderStatus::from_str(&order.status).map_err(DomainError::Internal)?;

    let item_views = items
        .into_iter()
        .map(|item| {
            let options = option_rows
                .iter()
                .filter(|o| o.order_item_id == item.id)
                .map(|o| OrderItemOptionView {
                    option_name: o.option_name.clone(),
                    item_name: o.item_name.clone(),
                    item_price: o.item_price.clone(),
                })
                .collect();
            OrderItemView {
                id: item.id,
                product_id: item.product_id,
                product_name: item.product_name,
                product_price: item.product_price,
                quantity: item.quantity,
                subtotal: item.subtotal,
                notes: item.notes,
                options,
            }
        })
        .collect();

    Ok(OrderView {
        id: order.id,
        order_number: order.order_number,
        customer_id: order.customer_id,
        restaurant_id: order.restaurant_id,
        status,
        subtotal: order.subtotal,
        delivery_fee: order.delivery_fee,
        total: order.total,
        delivery_address: order.delivery_address,
        delivery_city: order.delivery_city,
        delivery_state: order.delivery_state,
        delivery_zip_code: order.delivery_zip_code,
        delivery_phone: order.delivery_phone,
        notes: order.notes,
        confirmed_at: order.confirmed_at,
        preparing_at: order.preparing_at,
        ready_at: order.ready_at,
        out_for_delivery_at: order.out_for_delivery_at,
        delivered_at: order.delivered_at,
        cancelled_at: order.cancelled_at,
        cancellation_reason: order.cancellation_reason,
        created_at: order.created_at,
        items: item_views,
    })
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilters {
    pub customer_id: Option<Uuid>,
    pub restaurant_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

pub fn list_orders(
    conn: &mut PgConnection,
    filters: &OrderFilters,
    page: i64,
    limit: i64,
) -> Result<OrderListPage, DomainError> {
    let offset = (page - 1) * limit;

    let mut count_query = orders::table.into_boxed();
    let mut rows_query = orders::table.into_boxed();
    if let Some(customer_id) = filters.customer_id {
        count_query = count_query.filter(orders::customer_id.eq(customer_id));
        rows_query = rows_query.filter(orders::customer_id.eq(customer_id));
    }
    if let Some(restaurant_id) = filters.restaurant_id {
        count_query = count_query.filter(orders::restaurant_id.eq(restaurant_id));
        rows_query = rows_query.filter(orders::restaurant_id.eq(restaurant_id));
    }
    if let Some(status) = filters.status {
        count_query = count_query.filter(orders::status.eq(status.as_str()));
        rows_query = rows_query.filter(orders::status.eq(status.as_str()));
    }

    let total: i64 = count_query.count().get_result(conn)?;

    let order_rows: Vec<OrderRow> = rows_query
        .select(OrderRow::as_select())
        .order(orders::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load(conn)?;

    let order_ids: Vec<Uuid> = order_rows.iter().map(|o| o.id).collect();
    let item_rows: Vec<OrderItemRow> = order_items::table
        .filter(order_items::order_id.eq_any(&order_ids))
        .select(OrderItemRow::as_select())
        .load(conn)?;
    let item_ids: Vec<Uuid> = item_rows.iter().map(|i| i.id).collect();
    let option_rows: Vec<OrderItemOptionRow> = order_item_options::table
        .filter(order_item_options::order_item_id.eq_any(&item_ids))
        .select(OrderItemOptionRow::as_select())
        .load(conn)?;

    let mut views = Vec::with_capacity(order_rows.len());
    for order in order_rows {
        let items: Vec<OrderItemRow> = item_rows
            .iter()
            .filter(|i| i.order_id == order.id)
            .cloned()
            .collect();
        let options: Vec<OrderItemOptionRow> = option_rows
            .iter()
            .filter(|o| items.iter().any(|i| i.id == o.order_item_id))
            .cloned()
            .collect();
        views.push(assemble_view(order, items, options)?);
    }

    Ok(OrderListPage {
        orders: views,
        total,
        page,
        limit,
    })
}
