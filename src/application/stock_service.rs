//! Consumption engine: expands order lines through each product's technical
//! sheet, checks the ingredient ledger, and decrements or restores it.
//!
//! Every mutation of `ingredients.stock_quantity` in the system goes through
//! this module (or the manual adjustment below), always under the same
//! row-locking discipline.

use std::collections::{BTreeSet, HashMap};

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::stock::{
    aggregate_consumption, find_shortfalls, is_satisfiable, BomLine, ConsumptionMap,
    MissingIngredient, ProductStockStatus, StockOrderLine,
};
use crate::infrastructure::models::IngredientRow;
use crate::infrastructure::{catalog_repo, stock_repo};

/// Compute the aggregated consumption for `lines`, locking the ledger rows
/// involved. Runs inside the caller's transaction; the locks are held until
/// that transaction ends.
fn locked_consumption(
    conn: &mut PgConnection,
    lines: &[StockOrderLine],
) -> Result<(ConsumptionMap, HashMap<Uuid, Vec<BomLine>>), DomainError> {
    let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let bom = stock_repo::load_bom(conn, &product_ids)?;

    let ingredient_ids: Vec<Uuid> = bom
        .values()
        .flatten()
        .map(|b| b.ingredient_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let levels = stock_repo::lock_stock_levels(conn, &ingredient_ids)?;

    Ok((aggregate_consumption(lines, &bom, &levels), bom))
}

/// Validate that every ingredient the order needs is in stock, then decrement
/// the ledger. Must run inside the order-creation transaction: a failure at
/// any later step rolls the decrement back together with the order rows.
pub fn validate_and_decrement(
    conn: &mut PgConnection,
    lines: &[StockOrderLine],
) -> Result<(), DomainError> {
    let (consumption, bom) = locked_consumption(conn, lines)?;

    if !is_satisfiable(&consumption) {
        let products = find_shortfalls(lines, &bom, &consumption);
        return Err(DomainError::InsufficientStock { products });
    }

    for c in consumption.values() {
        stock_repo::decrement_stock(conn, c.ingredient_id, &c.required)?;
        log::info!(
            "[stock] decremented: {} - {} {}",
            c.name,
            c.required,
            c.unit
        );
    }
    Ok(())
}

/// Restore the quantities an order consumed at creation. Called from the
/// cancellation transition, in the same transaction as the status update.
pub fn revert_consumption(
    conn: &mut PgConnection,
    lines: &[StockOrderLine],
) -> Result<(), DomainError> {
    let (consumption, _) = locked_consumption(conn, lines)?;

    for c in consumption.values() {
        stock_repo::increment_stock(conn, c.ingredient_id, &c.required)?;
        log::info!("[stock] reverted: {} + {} {}", c.name, c.required, c.unit);
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct StockCheckItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StockAvailability {
    pub all_available: bool,
    pub products: Vec<ProductStockStatus>,
}

/// Read-only availability report for a prospective cart, used by the
/// pre-checkout UI. Never mutates the ledger and takes no locks; each product
/// is checked independently (no cross-product aggregation), and unknown or
/// inactive products are reported unavailable rather than failing the call.
pub fn check_availability(
    conn: &mut PgConnection,
    items: &[StockCheckItem],
) -> Result<StockAvailability, DomainError> {
    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let names = catalog_repo::load_product_names(conn, &product_ids)?;
    let bom = stock_repo::load_bom(conn, &product_ids)?;

    let ingredient_ids: Vec<Uuid> = bom
        .values()
        .flatten()
        .map(|b| b.ingredient_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let levels = stock_repo::read_stock_levels(conn, &ingredient_ids)?;

    let mut products = Vec::with_capacity(items.len());
    for item in items {
        let Some(name) = names.get(&item.product_id) else {
            products.push(ProductStockStatus {
                product_id: item.product_id,
                product_name: "unknown product".to_string(),
                quantity: item.quantity,
                available: false,
                missing_ingredients: vec![],
            });
            continue;
        };

        let mut missing = Vec::new();
        for entry in bom.get(&item.product_id).into_iter().flatten() {
            let Some(level) = levels.get(&entry.ingredient_id) else {
                continue;
            };
            let required = &entry.quantity_per_unit * BigDecimal::from(item.quantity);
            if level.stock_quantity < required {
                missing.push(MissingIngredient {
                    name: level.name.clone(),
                    required,
                    available: level.stock_quantity.clone(),
                    unit: level.unit.clone(),
                });
            }
        }

        products.push(ProductStockStatus {
            product_id: item.product_id,
            product_name: name.clone(),
            quantity: item.quantity,
            available: missing.is_empty(),
            missing_ingredients: missing,
        });
    }

    Ok(StockAvailability {
        all_available: products.iter().all(|p| p.available),
        products,
    })
}

/// Manual correction path for the ledger. Locks the row, rejects adjustments
/// that would take the quantity below zero, and logs the operator's reason.
pub fn adjust_stock(
    conn: &mut PgConnection,
    ingredient_id: Uuid,
    delta: &BigDecimal,
    reason: &str,
) -> Result<IngredientRow, DomainError> {
    conn.transaction(|conn| {
        let ingredient = stock_repo::find_ingredient_for_update(conn, ingredient_id)?
            .ok_or(DomainError::IngredientNotFound)?;

        let new_quantity = &ingredient.stock_quantity + delta;
        if new_quantity < BigDecimal::from(0) {
            return Err(DomainError::NegativeStock {
                current: ingredient.stock_quantity,
                delta: delta.clone(),
            });
        }

        let updated = stock_repo::set_stock_quantity(conn, ingredient_id, &new_quantity)?;
        log::info!(
            "[stock] adjusted: {} {}{} {} ({})",
            updated.name,
            if delta >= &BigDecimal::from(0) { "+" } else { "" },
            delta,
            updated.unit,
            reason
        );
        Ok(updated)
    })
}
