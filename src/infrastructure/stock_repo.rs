use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::stock::{BomLine, StockLevel};
use crate::schema::{ingredients, product_ingredients};

use super::models::IngredientRow;

/// Bill-of-materials index: technical-sheet entries for the given products,
/// restricted to active ingredients. Links to inactive ingredients are
/// skipped, not errored.
pub fn load_bom(
    conn: &mut PgConnection,
    product_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<BomLine>>, DomainError> {
    let rows: Vec<(Uuid, Uuid, BigDecimal)> = product_ingredients::table
        .inner_join(ingredients::table)
        .filter(product_ingredients::product_id.eq_any(product_ids))
        .filter(ingredients::is_active.eq(true))
        .select((
            product_ingredients::product_id,
            product_ingredients::ingredient_id,
            product_ingredients::quantity_per_unit,
        ))
        .load(conn)?;

    let mut bom: HashMap<Uuid, Vec<BomLine>> = HashMap::new();
    for (product_id, ingredient_id, quantity_per_unit) in rows {
        bom.entry(product_id).or_default().push(BomLine {
            ingredient_id,
            quantity_per_unit,
        });
    }
    Ok(bom)
}

/// Read current stock levels and take row locks (`SELECT ... FOR UPDATE`) so
/// the check-then-decrement sequence is serialized against concurrent orders.
/// Rows are locked in ascending id order; every caller locking multiple
/// ingredients uses the same order, which rules out lock-order deadlocks.
pub fn lock_stock_levels(
    conn: &mut PgConnection,
    ingredient_ids: &[Uuid],
) -> Result<HashMap<Uuid, StockLevel>, DomainError> {
    let rows: Vec<IngredientRow> = ingredients::table
        .filter(ingredients::id.eq_any(ingredient_ids))
        .filter(ingredients::is_active.eq(true))
        .order(ingredients::id.asc())
        .for_update()
        .select(IngredientRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(|r| (r.id, to_level(r))).collect())
}

/// Lock-free read of current stock levels, for the public availability check.
pub fn read_stock_levels(
    conn: &mut PgConnection,
    ingredient_ids: &[Uuid],
) -> Result<HashMap<Uuid, StockLevel>, DomainError> {
    let rows: Vec<IngredientRow> = ingredients::table
        .filter(ingredients::id.eq_any(ingredient_ids))
        .filter(ingredients::is_active.eq(true))
        .select(IngredientRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(|r| (r.id, to_level(r))).collect())
}

fn to_level(r: IngredientRow) -> StockLevel {
    StockLevel {
        id: r.id,
        name: r.name,
        unit: r.unit,
        stock_quantity: r.stock_quantity,
    }
}

/// Guarded decrement. The caller holds the row lock and has validated
/// availability, so the `stock_quantity >= qty` guard only fires if something
/// else mutated the row outside the locking discipline. That case is an
/// internal error and rolls the transaction back.
pub fn decrement_stock(
    conn: &mut PgConnection,
    ingredient_id: Uuid,
    qty: &BigDecimal,
) -> Result<(), DomainError> {
    let affected = diesel::update(
        ingredients::table
            .filter(ingredients::id.eq(ingredient_id))
            .filter(ingredients::stock_quantity.ge(qty)),
    )
    .set((
        ingredients::stock_quantity.eq(ingredients::stock_quantity - qty.clone()),
        ingredients::updated_at.eq(Utc::now()),
    ))
    .execute(conn)?;

    if affected != 1 {
        return Err(DomainError::Internal(format!(
            "stock decrement affected {affected} rows for ingredient {ingredient_id}"
        )));
    }
    Ok(())
}

pub fn increment_stock(
    conn: &mut PgConnection,
    ingredient_id: Uuid,
    qty: &BigDecimal,
) -> Result<(), DomainError> {
    diesel::update(ingredients::table.filter(ingredients::id.eq(ingredient_id)))
        .set((
            ingredients::stock_quantity.eq(ingredients::stock_quantity + qty.clone()),
            ingredients::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;
    Ok(())
}

pub fn find_ingredient_for_update(
    conn: &mut PgConnection,
    ingredient_id: Uuid,
) -> Result<Option<IngredientRow>, DomainError> {
    let row = ingredients::table
        .filter(ingredients::id.eq(ingredient_id))
        .for_update()
        .select(IngredientRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row)
}

pub fn set_stock_quantity(
    conn: &mut PgConnection,
    ingredient_id: Uuid,
    qty: &BigDecimal,
) -> Result<IngredientRow, DomainError> {
    let row = diesel::update(ingredients::table.filter(ingredients::id.eq(ingredient_id)))
        .set((
            ingredients::stock_quantity.eq(qty.clone()),
            ingredients::updated_at.eq(Utc::now()),
        ))
        .returning(IngredientRow::as_returning())
        .get_result(conn)?;
    Ok(row)
}
