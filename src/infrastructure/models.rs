use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{
    ingredients, option_items, order_item_options, order_items, orders, product_ingredients,
    product_options, products, restaurants,
};

// ── Catalog (read-only to this core) ─────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = restaurants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RestaurantRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub min_order_value: BigDecimal,
    pub delivery_fee: BigDecimal,
    pub is_open: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = restaurants)]
pub struct NewRestaurantRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub min_order_value: BigDecimal,
    pub delivery_fee: BigDecimal,
    pub is_open: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = products)]
#[diesel(belongs_to(RestaurantRow, foreign_key = restaurant_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub is_available: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub is_available: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = product_options)]
#[diesel(belongs_to(ProductRow, foreign_key = product_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductOptionRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub is_required: bool,
    pub min_selections: i32,
    pub max_selections: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_options)]
pub struct NewProductOptionRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub is_required: bool,
    pub min_selections: i32,
    pub max_selections: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = option_items)]
#[diesel(belongs_to(ProductOptionRow, foreign_key = option_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OptionItemRow {
    pub id: Uuid,
    pub option_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = option_items)]
pub struct NewOptionItemRow {
    pub id: Uuid,
    pub option_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
}

// ── Inventory ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IngredientRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub unit: String,
    pub stock_quantity: BigDecimal,
    pub min_stock: BigDecimal,
    pub cost_per_unit: BigDecimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ingredients)]
pub struct NewIngredientRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub unit: String,
    pub stock_quantity: BigDecimal,
    pub min_stock: BigDecimal,
    pub cost_per_unit: BigDecimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = product_ingredients)]
#[diesel(belongs_to(ProductRow, foreign_key = product_id))]
#[diesel(belongs_to(IngredientRow, foreign_key = ingredient_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductIngredientRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity_per_unit: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_ingredients)]
pub struct NewProductIngredientRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity_per_unit: BigDecimal,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: String,
    pub subtotal: BigDecimal,
    pub delivery_fee: BigDecimal,
    pub total: BigDecimal,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub delivery_zip_code: String,
    pub delivery_phone: String,
    pub notes: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub out_for_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: String,
    pub subtotal: BigDecimal,
    pub delivery_fee: BigDecimal,
    pub total: BigDecimal,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub delivery_zip_code: String,
    pub delivery_phone: String,
    pub notes: Option<String>,
}

/// Changeset for a status transition. `None` fields are left untouched, so
/// each transition stamps exactly its own timestamp column.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = orders)]
pub struct OrderStatusChangeset {
    pub status: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub preparing_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub out_for_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_price: BigDecimal,
    pub quantity: i32,
    pub subtotal: BigDecimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_price: BigDecimal,
    pub quantity: i32,
    pub subtotal: BigDecimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_item_options)]
#[diesel(belongs_to(OrderItemRow, foreign_key = order_item_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemOptionRow {
    pub id: Uuid,
    pub order_item_id: Uuid,
    pub option_name: String,
    pub item_name: String,
    pub item_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_item_options)]
pub struct NewOrderItemOptionRow {
    pub id: Uuid,
    pub order_item_id: Uuid,
    pub option_name: String,
    pub item_name: String,
    pub item_price: BigDecimal,
}
