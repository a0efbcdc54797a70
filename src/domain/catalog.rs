use bigdecimal::BigDecimal;
use uuid::Uuid;

/// Restaurant as the pipeline sees it. Menu management owns the full record;
/// only the fields the order flow reads are carried here.
#[derive(Debug, Clone)]
pub struct Restaurant {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub min_order_value: BigDecimal,
    pub delivery_fee: BigDecimal,
    pub is_open: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct ProductWithOptions {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub is_available: bool,
    pub is_active: bool,
    pub options: Vec<OptionGroup>,
}

/// A named option group on a product, e.g. "Meat point" with min/max
/// selection bounds.
#[derive(Debug, Clone)]
pub struct OptionGroup {
    pub id: Uuid,
    pub name: String,
    pub is_required: bool,
    pub min_selections: i32,
    pub max_selections: i32,
    pub items: Vec<OptionItemDef>,
}

#[derive(Debug, Clone)]
pub struct OptionItemDef {
    pub id: Uuid,
    pub name: String,
    /// Price delta added per ordered unit when this item is selected.
    pub price: BigDecimal,
}

impl ProductWithOptions {
    pub fn option_group(&self, option_id: Uuid) -> Option<&OptionGroup> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

impl OptionGroup {
    pub fn item(&self, item_id: Uuid) -> Option<&OptionItemDef> {
        self.items.iter().find(|i| i.id == item_id)
    }
}
