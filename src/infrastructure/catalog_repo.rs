use std::collections::HashMap;

use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::catalog::{OptionGroup, OptionItemDef, ProductWithOptions, Restaurant};
use crate::domain::errors::DomainError;
use crate::schema::{option_items, product_options, products, restaurants};

use super::models::{OptionItemRow, ProductOptionRow, ProductRow, RestaurantRow};

pub fn load_restaurant(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<Restaurant>, DomainError> {
    let row = restaurants::table
        .filter(restaurants::id.eq(id))
        .select(RestaurantRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(|r| Restaurant {
        id: r.id,
        owner_id: r.owner_id,
        name: r.name,
        min_order_value: r.min_order_value,
        delivery_fee: r.delivery_fee,
        is_open: r.is_open,
        is_active: r.is_active,
    }))
}

/// Load the products referenced by a cart together with their option groups
/// and items, assembled into plain domain values. Active/available flags come
/// along untouched; the pricing step decides what to do with them.
pub fn load_products_with_options(
    conn: &mut PgConnection,
    product_ids: &[Uuid],
) -> Result<HashMap<Uuid, ProductWithOptions>, DomainError> {
    let product_rows: Vec<ProductRow> = products::table
        .filter(products::id.eq_any(product_ids))
        .select(ProductRow::as_select())
        .load(conn)?;

    let option_rows: Vec<ProductOptionRow> = product_options::table
        .filter(product_options::product_id.eq_any(product_ids))
        .select(ProductOptionRow::as_select())
        .load(conn)?;

    let option_ids: Vec<Uuid> = option_rows.iter().map(|o| o.id).collect();
    let item_rows: Vec<OptionItemRow> = option_items::table
        .filter(option_items::option_id.eq_any(&option_ids))
        .select(OptionItemRow::as_select())
        .load(conn)?;

    let mut items_by_option: HashMap<Uuid, Vec<OptionItemDef>> = HashMap::new();
    for item in item_rows {
        items_by_option
            .entry(item.option_id)
            .or_default()
            .push(OptionItemDef {
                id: item.id,
                name: item.name,
                price: item.price,
            });
    }

    let mut options_by_product: HashMap<Uuid, Vec<OptionGroup>> = HashMap::new();
    for option in option_rows {
        let items = items_by_option.remove(&option.id).unwrap_or_default();
        options_by_product
            .entry(option.product_id)
            .or_default()
            .push(OptionGroup {
                id: option.id,
                name: option.name,
                is_required: option.is_required,
                min_selections: option.min_selections,
                max_selections: option.max_selections,
                items,
            });
    }

    Ok(product_rows
        .into_iter()
        .map(|p| {
            let options = options_by_product.remove(&p.id).unwrap_or_default();
            (
                p.id,
                ProductWithOptions {
                    id: p.id,
                    restaurant_id: p.restaurant_id,
                    name: p.name,
                    price: p.price,
                    is_available: p.is_available,
                    is_active: p.is_active,
                    options,
                },
            )
        })
        .collect())
}

/// Product names for ids that exist, used by the public availability check
/// (which must tolerate unknown ids rather than fail).
pub fn load_product_names(
    conn: &mut PgConnection,
    product_ids: &[Uuid],
) -> Result<HashMap<Uuid, String>, DomainError> {
    let rows: Vec<(Uuid, String)> = products::table
        .filter(products::id.eq_any(product_ids))
        .filter(products::is_active.eq(true))
        .select((products::id, products::name))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}
