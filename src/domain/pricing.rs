use std::collections::HashMap;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::catalog::ProductWithOptions;
use super::errors::DomainError;
use super::order::{OrderLineInput, PricedLine, PricedOrder, SelectedOptionSnapshot};

/// Price every cart line against the loaded catalog: validates product
/// ownership/availability and option selections, accumulates option price
/// deltas, and takes the denormalized snapshots that get persisted with the
/// order. Pure; all catalog reads happen before this is called.
pub fn price_lines(
    lines: &[OrderLineInput],
    products: &HashMap<Uuid, ProductWithOptions>,
    restaurant_id: Uuid,
) -> Result<PricedOrder, DomainError> {
    let mut priced_lines = Vec::with_capacity(lines.len());
    let mut subtotal = BigDecimal::from(0);

    for line in lines {
        if line.quantity < 1 {
            return Err(DomainError::InvalidInput(format!(
                "quantity must be at least 1, got {}",
                line.quantity
            )));
        }

        let product = products
            .get(&line.product_id)
            .filter(|p| p.is_active && p.restaurant_id == restaurant_id)
            .ok_or(DomainError::ProductNotFound(line.product_id))?;

        if !product.is_available {
            return Err(DomainError::ProductUnavailable(product.name.clone()));
        }

        let quantity = BigDecimal::from(line.quantity);
        let mut line_total = &product.price * &quantity;
        let mut selected_options = Vec::new();

        for selection in &line.options {
            let group = product
                .option_group(selection.option_id)
                .ok_or(DomainError::OptionNotFound(selection.option_id))?;

            let selected_count = selection.item_ids.len() as i32;
            if group.is_required && selected_count < group.min_selections {
                return Err(DomainError::InvalidSelection(format!(
                    "Option \"{}\" requires at least {} selection(s)",
                    group.name, group.min_selections
                )));
            }
            if selected_count > group.max_selections {
                return Err(DomainError::InvalidSelection(format!(
                    "Option \"{}\" allows at most {} selection(s)",
                    group.name, group.max_selections
                )));
            }

            for item_id in &selection.item_ids {
                let item = group
                    .item(*item_id)
                    .ok_or(DomainError::OptionItemNotFound(*item_id))?;
                line_total += &item.price * &quantity;
                selected_options.push(SelectedOptionSnapshot {
                    option_name: group.name.clone(),
                    item_name: item.name.clone(),
                    item_price: item.price.clone(),
                });
            }
        }

        // A required group the cart never mentions is still a violation.
        for group in &product.options {
            let covered = line.options.iter().any(|s| s.option_id == group.id);
            if group.is_required && !covered {
                return Err(DomainError::InvalidSelection(format!(
                    "Option \"{}\" requires at least {} selection(s)",
                    group.name,
                    group.min_selections.max(1)
                )));
            }
        }

        subtotal += &line_total;
        priced_lines.push(PricedLine {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: product.price.clone(),
            quantity: line.quantity,
            subtotal: line_total,
            notes: line.notes.clone(),
            selected_options,
        });
    }

    Ok(PricedOrder {
        lines: priced_lines,
        subtotal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{OptionGroup, OptionItemDef};
    use crate::domain::order::OptionSelection;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    struct Fixture {
        restaurant_id: Uuid,
        product: ProductWithOptions,
        group_id: Uuid,
        rare_id: Uuid,
        cheese_id: Uuid,
    }

    fn fixture() -> Fixture {
        let restaurant_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let rare_id = Uuid::new_v4();
        let cheese_id = Uuid::new_v4();
        let product = ProductWithOptions {
            id: Uuid::new_v4(),
            restaurant_id,
            name: "Burger".to_string(),
            price: dec("25.00"),
            is_available: true,
            is_active: true,
            options: vec![OptionGroup {
                id: group_id,
                name: "Meat point".to_string(),
                is_required: true,
                min_selections: 1,
                max_selections: 1,
                items: vec![
                    OptionItemDef { id: rare_id, name: "Rare".to_string(), price: dec("0.00") },
                    OptionItemDef { id: cheese_id, name: "Extra cheese".to_string(), price: dec("3.50") },
                ],
            }],
        };
        Fixture { restaurant_id, product, group_id, rare_id, cheese_id }
    }

    fn catalog(fx: &Fixture) -> HashMap<Uuid, ProductWithOptions> {
        HashMap::from([(fx.product.id, fx.product.clone())])
    }

    fn line(fx: &Fixture, quantity: i32, options: Vec<OptionSelection>) -> OrderLineInput {
        OrderLineInput {
            product_id: fx.product.id,
            quantity,
            notes: None,
            options,
        }
    }

    #[test]
    fn prices_line_with_option_delta_scaled_by_quantity() {
        let fx = fixture();
        let lines = vec![line(
            &fx,
            2,
            vec![OptionSelection { option_id: fx.group_id, item_ids: vec![fx.cheese_id] }],
        )];

        let priced = price_lines(&lines, &catalog(&fx), fx.restaurant_id).unwrap();
        // 2 * 25.00 + 2 * 3.50
        assert_eq!(priced.subtotal, dec("57.00"));
        assert_eq!(priced.lines[0].subtotal, dec("57.00"));
        assert_eq!(priced.lines[0].unit_price, dec("25.00"));

        let snap = &priced.lines[0].selected_options[0];
        assert_eq!(snap.option_name, "Meat point");
        assert_eq!(snap.item_name, "Extra cheese");
        // Snapshot keeps the per-unit delta, not the scaled amount.
        assert_eq!(snap.item_price, dec("3.50"));
    }

    #[test]
    fn required_group_with_no_selection_supplied_fails_naming_the_group() {
        let fx = fixture();
        let lines = vec![line(&fx, 2, vec![])];

        let err = price_lines(&lines, &catalog(&fx), fx.restaurant_id).unwrap_err();
        match err {
            DomainError::InvalidSelection(msg) => assert!(msg.contains("Meat point"), "{msg}"),
            other => panic!("expected INVALID_SELECTION, got {other:?}"),
        }
    }

    #[test]
    fn empty_item_list_for_required_group_fails() {
        let fx = fixture();
        let lines = vec![line(
            &fx,
            1,
            vec![OptionSelection { option_id: fx.group_id, item_ids: vec![] }],
        )];

        let err = price_lines(&lines, &catalog(&fx), fx.restaurant_id).unwrap_err();
        assert!(matches!(err, DomainError::InvalidSelection(_)));
    }

    #[test]
    fn too_many_selections_fail() {
        let fx = fixture();
        let lines = vec![line(
            &fx,
            1,
            vec![OptionSelection {
                option_id: fx.group_id,
                item_ids: vec![fx.rare_id, fx.cheese_id],
            }],
        )];

        let err = price_lines(&lines, &catalog(&fx), fx.restaurant_id).unwrap_err();
        match err {
            DomainError::InvalidSelection(msg) => assert!(msg.contains("at most 1")),
            other => panic!("expected INVALID_SELECTION, got {other:?}"),
        }
    }

    #[test]
    fn unknown_option_group_and_item_are_distinct_errors() {
        let fx = fixture();

        let bogus_group = vec![line(
            &fx,
            1,
            vec![OptionSelection { option_id: Uuid::new_v4(), item_ids: vec![] }],
        )];
        assert!(matches!(
            price_lines(&bogus_group, &catalog(&fx), fx.restaurant_id).unwrap_err(),
            DomainError::OptionNotFound(_)
        ));

        let bogus_item = vec![line(
            &fx,
            1,
            vec![OptionSelection { option_id: fx.group_id, item_ids: vec![Uuid::new_v4()] }],
        )];
        assert!(matches!(
            price_lines(&bogus_item, &catalog(&fx), fx.restaurant_id).unwrap_err(),
            DomainError::OptionItemNotFound(_)
        ));
    }

    #[test]
    fn product_from_another_restaurant_is_not_found() {
        let fx = fixture();
        let lines = vec![line(
            &fx,
            1,
            vec![OptionSelection { option_id: fx.group_id, item_ids: vec![fx.rare_id] }],
        )];

        let err = price_lines(&lines, &catalog(&fx), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DomainError::ProductNotFound(id) if id == fx.product.id));
    }

    #[test]
    fn inactive_product_is_not_found_but_unavailable_is_its_own_error() {
        let mut fx = fixture();
        fx.product.is_available = false;
        let lines = vec![line(
            &fx,
            1,
            vec![OptionSelection { option_id: fx.group_id, item_ids: vec![fx.rare_id] }],
        )];
        assert!(matches!(
            price_lines(&lines, &catalog(&fx), fx.restaurant_id).unwrap_err(),
            DomainError::ProductUnavailable(name) if name == "Burger"
        ));

        fx.product.is_available = true;
        fx.product.is_active = false;
        assert!(matches!(
            price_lines(&lines, &catalog(&fx), fx.restaurant_id).unwrap_err(),
            DomainError::ProductNotFound(_)
        ));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let fx = fixture();
        let lines = vec![line(&fx, 0, vec![])];
        assert!(matches!(
            price_lines(&lines, &catalog(&fx), fx.restaurant_id).unwrap_err(),
            DomainError::InvalidInput(_)
        ));
    }
}
