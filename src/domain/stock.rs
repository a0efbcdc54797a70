use std::collections::{BTreeMap, HashMap};

use bigdecimal::BigDecimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// One order line as the consumption engine sees it: which product, how many.
#[derive(Debug, Clone)]
pub struct StockOrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
}

/// One technical-sheet entry: producing one unit of the product consumes
/// `quantity_per_unit` of the ingredient.
#[derive(Debug, Clone)]
pub struct BomLine {
    pub ingredient_id: Uuid,
    pub quantity_per_unit: BigDecimal,
}

/// Current ledger state of one ingredient, read once per validation pass.
#[derive(Debug, Clone)]
pub struct StockLevel {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub stock_quantity: BigDecimal,
}

/// Aggregated requirement for one ingredient across all order lines.
#[derive(Debug, Clone)]
pub struct IngredientConsumption {
    pub ingredient_id: Uuid,
    pub name: String,
    pub unit: String,
    pub required: BigDecimal,
    pub available: BigDecimal,
}

/// Keyed by ingredient id; BTreeMap so iteration (and therefore decrement
/// order) is deterministic.
pub type ConsumptionMap = BTreeMap<Uuid, IngredientConsumption>;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MissingIngredient {
    pub name: String,
    #[schema(value_type = String)]
    pub required: BigDecimal,
    #[schema(value_type = String)]
    pub available: BigDecimal,
    pub unit: String,
}

/// Per-product availability verdict, rich enough to drive a remove-and-retry
/// UI on the client.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductStockStatus {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub available: bool,
    pub missing_ingredients: Vec<MissingIngredient>,
}

/// Expand each order line through its bill of materials and accumulate the
/// required quantity per ingredient. Two lines needing the same ingredient
/// sum their requirements. BOM entries whose ingredient has no stock level
/// (inactive or deleted) are skipped, mirroring how the technical sheet
/// treats links to inactive ingredients.
pub fn aggregate_consumption(
    lines: &[StockOrderLine],
    bom_by_product: &HashMap<Uuid, Vec<BomLine>>,
    levels: &HashMap<Uuid, StockLevel>,
) -> ConsumptionMap {
    let mut consumption = ConsumptionMap::new();

    for line in lines {
        let Some(bom) = bom_by_product.get(&line.product_id) else {
            continue;
        };
        for entry in bom {
            let Some(level) = levels.get(&entry.ingredient_id) else {
                continue;
            };
            let required = &entry.quantity_per_unit * BigDecimal::from(line.quantity);
            consumption
                .entry(entry.ingredient_id)
                .and_modify(|c| c.required += &required)
                .or_insert_with(|| IngredientConsumption {
                    ingredient_id: level.id,
                    name: level.name.clone(),
                    unit: level.unit.clone(),
                    required: required.clone(),
                    available: level.stock_quantity.clone(),
                });
        }
    }

    consumption
}

pub fn is_satisfiable(consumption: &ConsumptionMap) -> bool {
    consumption.values().all(|c| c.available >= c.required)
}

/// Per-product breakdown of an unsatisfiable consumption map. The shortfall
/// check is aggregated across lines, but each product reports its own
/// per-unit-scaled requirement so the client sees what that product alone
/// needs.
pub fn find_shortfalls(
    lines: &[StockOrderLine],
    bom_by_product: &HashMap<Uuid, Vec<BomLine>>,
    consumption: &ConsumptionMap,
) -> Vec<ProductStockStatus> {
    let mut statuses = Vec::with_capacity(lines.len());

    for line in lines {
        let mut missing = Vec::new();
        for entry in bom_by_product.get(&line.product_id).into_iter().flatten() {
            let Some(agg) = consumption.get(&entry.ingredient_id) else {
                continue;
            };
            if agg.available < agg.required {
                missing.push(MissingIngredient {
                    name: agg.name.clone(),
                    required: &entry.quantity_per_unit * BigDecimal::from(line.quantity),
                    available: agg.available.clone(),
                    unit: agg.unit.clone(),
                });
            }
        }
        statuses.push(ProductStockStatus {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            available: missing.is_empty(),
            missing_ingredients: missing,
        });
    }

    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn line(product_id: Uuid, name: &str, quantity: i32) -> StockOrderLine {
        StockOrderLine {
            product_id,
            product_name: name.to_string(),
            quantity,
        }
    }

    fn level(id: Uuid, name: &str, unit: &str, stock: &str) -> (Uuid, StockLevel) {
        (
            id,
            StockLevel {
                id,
                name: name.to_string(),
                unit: unit.to_string(),
                stock_quantity: dec(stock),
            },
        )
    }

    #[test]
    fn two_lines_sharing_an_ingredient_sum_their_requirements() {
        let burger = Uuid::new_v4();
        let fries = Uuid::new_v4();
        let oil = Uuid::new_v4();

        let bom = HashMap::from([
            (burger, vec![BomLine { ingredient_id: oil, quantity_per_unit: dec("0.050") }]),
            (fries, vec![BomLine { ingredient_id: oil, quantity_per_unit: dec("0.100") }]),
        ]);
        let levels = HashMap::from([level(oil, "Oil", "l", "10.000")]);

        let lines = vec![line(burger, "Burger", 2), line(fries, "Fries", 3)];
        let consumption = aggregate_consumption(&lines, &bom, &levels);

        assert_eq!(consumption.len(), 1);
        // 2 * 0.050 + 3 * 0.100
        assert_eq!(consumption[&oil].required, dec("0.400"));
        assert_eq!(consumption[&oil].available, dec("10.000"));
        assert!(is_satisfiable(&consumption));
    }

    #[test]
    fn inactive_ingredients_are_silently_skipped() {
        let burger = Uuid::new_v4();
        let truffle = Uuid::new_v4(); // not in levels: inactive

        let bom = HashMap::from([(
            burger,
            vec![BomLine { ingredient_id: truffle, quantity_per_unit: dec("0.010") }],
        )]);
        let levels = HashMap::new();

        let consumption = aggregate_consumption(&[line(burger, "Burger", 1)], &bom, &levels);
        assert!(consumption.is_empty());
        assert!(is_satisfiable(&consumption));
    }

    #[test]
    fn shortfall_attributes_per_unit_scaled_requirement_to_each_product() {
        let burger = Uuid::new_v4();
        let double = Uuid::new_v4();
        let bun = Uuid::new_v4();

        let bom = HashMap::from([
            (burger, vec![BomLine { ingredient_id: bun, quantity_per_unit: dec("1") }]),
            (double, vec![BomLine { ingredient_id: bun, quantity_per_unit: dec("2") }]),
        ]);
        let levels = HashMap::from([level(bun, "Bun", "un", "3")]);

        let lines = vec![line(burger, "Burger", 2), line(double, "Double Burger", 1)];
        let consumption = aggregate_consumption(&lines, &bom, &levels);
        assert_eq!(consumption[&bun].required, dec("4"));
        assert!(!is_satisfiable(&consumption));

        let shortfalls = find_shortfalls(&lines, &bom, &consumption);
        assert_eq!(shortfalls.len(), 2);

        assert!(!shortfalls[0].available);
        assert_eq!(shortfalls[0].missing_ingredients[0].required, dec("2"));
        assert_eq!(shortfalls[0].missing_ingredients[0].available, dec("3"));

        assert!(!shortfalls[1].available);
        assert_eq!(shortfalls[1].missing_ingredients[0].required, dec("2"));
        assert_eq!(shortfalls[1].missing_ingredients[0].unit, "un");
    }

    #[test]
    fn products_not_touching_short_ingredients_stay_available() {
        let burger = Uuid::new_v4();
        let salad = Uuid::new_v4();
        let bun = Uuid::new_v4();
        let lettuce = Uuid::new_v4();

        let bom = HashMap::from([
            (burger, vec![BomLine { ingredient_id: bun, quantity_per_unit: dec("1") }]),
            (salad, vec![BomLine { ingredient_id: lettuce, quantity_per_unit: dec("0.100") }]),
        ]);
        let levels = HashMap::from([
            level(bun, "Bun", "un", "0"),
            level(lettuce, "Lettuce", "kg", "5.000"),
        ]);

        let lines = vec![line(burger, "Burger", 1), line(salad, "Salad", 1)];
        let consumption = aggregate_consumption(&lines, &bom, &levels);
        let shortfalls = find_shortfalls(&lines, &bom, &consumption);

        assert!(!shortfalls[0].available);
        assert!(shortfalls[1].available);
        assert!(shortfalls[1].missing_ingredients.is_empty());
    }

    #[test]
    fn repeated_decimal_accumulation_stays_exact() {
        let product = Uuid::new_v4();
        let spice = Uuid::new_v4();

        let bom = HashMap::from([(
            product,
            vec![BomLine { ingredient_id: spice, quantity_per_unit: dec("0.001") }],
        )]);
        let levels = HashMap::from([level(spice, "Spice", "g", "1.000")]);

        // 1000 units of 0.001 must be exactly 1.000, with no drift.
        let lines = vec![line(product, "Spiced", 1000)];
        let consumption = aggregate_consumption(&lines, &bom, &levels);
        assert_eq!(consumption[&spice].required, dec("1.000"));
        assert!(is_satisfiable(&consumption));
    }
}
