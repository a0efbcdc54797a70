use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use super::status::{ActorRole, OrderStatus};

// ── Pipeline input ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OptionSelection {
    pub option_id: Uuid,
    pub item_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
    pub options: Vec<OptionSelection>,
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryInfo {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub restaurant_id: Uuid,
    pub customer_id: Uuid,
    pub lines: Vec<OrderLineInput>,
    pub delivery: DeliveryInfo,
    pub notes: Option<String>,
}

/// Who is asking for a status transition. Identity comes from the upstream
/// authentication layer, already verified.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
}

// ── Priced order (output of the pricing step, input to assembly) ─────────────

/// Snapshot of one selected option item, denormalized so the order survives
/// later catalog edits.
#[derive(Debug, Clone)]
pub struct SelectedOptionSnapshot {
    pub option_name: String,
    pub item_name: String,
    pub item_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: BigDecimal,
    pub quantity: i32,
    pub subtotal: BigDecimal,
    pub notes: Option<String>,
    pub selected_options: Vec<SelectedOptionSnapshot>,
}

#[derive(Debug, Clone)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub subtotal: BigDecimal,
}

// ── Persisted order views ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrderItemOptionView {
    pub option_name: String,
    pub item_name: String,
    pub item_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_price: BigDecimal,
    pub quantity: i32,
    pub subtotal: BigDecimal,
    pub notes: Option<String>,
    pub options: Vec<OrderItemOptionView>,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: OrderStatus,
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
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Clone)]
pub struct OrderListPage {
    pub orders: Vec<OrderView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Order number ─────────────────────────────────────────────────────────────

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 digits are ASCII")
}

/// Human-readable order number: `TK` + millisecond timestamp in base 36 + a
/// 4-character random suffix. Uniqueness is enforced by the database
/// constraint on `orders.order_number`; the creation pipeline retries on the
/// (rare) collision.
pub fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u128;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| BASE36[rng.gen_range(0..36)] as char)
        .collect();
    format!("TK{}{}", to_base36(millis), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_has_expected_shape() {
        let number = generate_order_number();
        assert!(number.starts_with("TK"));
        // 2 prefix + 8-9 timestamp digits (current epoch millis in base 36) + 4 suffix
        assert!(number.len() >= 14 && number.len() <= 16, "unexpected length: {number}");
        assert!(number.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(number, number.to_uppercase());
    }

    #[test]
    fn base36_encodes_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(36 * 36 + 1), "101");
    }

    #[test]
    fn consecutive_numbers_differ() {
        let a = generate_order_number();
        let b = generate_order_number();
        // Same millisecond is possible; the random suffix still separates them
        // with overwhelming probability.
        assert_ne!(a, b);
    }
}
