//! Stock-Reconciliation Logic
//!
//! Pure functions that turn two very different inputs into the same
//! normalized [`ShortfallRecord`] list:
//!
//! * the local cart, when lines carry an available-stock hint, and
//! * whatever error body the backend returned for a rejected order.
//!
//! Backend rejections arrive in several shapes depending on the backend
//! version, so parsing is an ordered list of shape matchers tried until
//! one claims the payload. `None` means "not a stock problem at all",
//! which callers must distinguish from "stock problem with no detail".

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::CartSnapshot;

/// Placeholder product id used when the backend signals a shortage but
/// gives no per-product detail.
pub const UNKNOWN_PRODUCT: &str = "unknown";

/// Substrings that mark an error message as stock-related. Matched
/// case-insensitively against the message text.
const STOCK_KEYWORDS: &[&str] = &["sem stock", "out of stock", "stock"];

/// One product whose requested quantity exceeds known availability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortfallRecord {
    pub product_id: String,
    pub name: Option<String>,
    pub available: u32,
    pub requested: u32,
}

impl ShortfallRecord {
    /// The "shortage occurred, no detail available" record.
    pub fn unknown() -> Self {
        Self { product_id: UNKNOWN_PRODUCT.into(), name: None, available: 0, requested: 0 }
    }

    pub fn is_unknown(&self) -> bool {
        self.product_id == UNKNOWN_PRODUCT
    }
}

/// Compare each cart line against its own stock hint. Lines without a
/// hint are skipped: absence of information never blocks checkout.
pub fn check_local_shortfalls(snapshot: &CartSnapshot) -> Vec<ShortfallRecord> {
    snapshot
        .lines
        .iter()
        .filter_map(|line| {
            let available = line.available_stock?;
            if line.quantity > available {
                Some(ShortfallRecord {
                    product_id: line.product_id.clone(),
                    name: Some(line.name.clone()),
                    available,
                    requested: line.quantity,
                })
            } else {
                None
            }
        })
        .collect()
}

type ShapeMatcher = fn(&Value) -> Option<Vec<ShortfallRecord>>;

/// Tried in priority order: structured shapes first, the keyword
/// fallback last.
const SHAPE_MATCHERS: &[ShapeMatcher] = &[match_items, match_detail_items, match_stock_message];

/// Interpret a backend error body. Returns the normalized shortfall
/// list when the body describes a stock conflict, `None` otherwise.
pub fn parse_backend_shortfalls(payload: &Value) -> Option<Vec<ShortfallRecord>> {
    SHAPE_MATCHERS.iter().find_map(|matcher| matcher(payload))
}

/// `{ "items": [...] }` at the top level.
fn match_items(payload: &Value) -> Option<Vec<ShortfallRecord>> {
    let items = payload.get("items")?.as_array()?;
    Some(items.iter().map(record_from_item).collect())
}

/// `{ "detail": { "items": [...] } }` — the same list nested one level
/// under the detail wrapper.
fn match_detail_items(payload: &Value) -> Option<Vec<ShortfallRecord>> {
    let items = payload.get("detail")?.get("items")?.as_array()?;
    Some(items.iter().map(record_from_item).collect())
}

/// No structured list, but the message text is stock-flavored. Yields a
/// single placeholder record rather than fabricating numbers.
fn match_stock_message(payload: &Value) -> Option<Vec<ShortfallRecord>> {
    let message = message_text(payload)?.to_lowercase();
    if STOCK_KEYWORDS.iter().any(|kw| message.contains(kw)) {
        Some(vec![ShortfallRecord::unknown()])
    } else {
        None
    }
}

fn message_text(payload: &Value) -> Option<&str> {
    for key in ["detail", "message"] {
        if let Some(text) = payload.get(key).and_then(Value::as_str) {
            return Some(text);
        }
    }
    payload.as_str()
}

fn record_from_item(item: &Value) -> ShortfallRecord {
    ShortfallRecord {
        product_id: coerce_id(first_of(item, &["product_id", "productId", "id"])),
        name: first_of(item, &["name", "product_name", "productName"])
            .and_then(Value::as_str)
            .map(str::to_string),
        available: coerce_count(first_of(item, &["available", "stock"])),
        requested: coerce_count(first_of(item, &["requested", "quantity"])),
    }
}

fn first_of<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| item.get(k)).filter(|v| !v.is_null())
}

fn coerce_id(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN_PRODUCT.to_string(),
    }
}

/// Anything non-finite, negative, or missing collapses to 0 rather than
/// propagating into totals or comparisons.
fn coerce_count(value: Option<&Value>) -> u32 {
    let Some(value) = value else { return 0 };
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if !n.is_finite() || n <= 0.0 {
        0
    } else if n >= u32::MAX as f64 {
        u32::MAX
    } else {
        n as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::CartLine;
    use crate::domain::value_objects::Money;
    use crate::store::CartSnapshot;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn snapshot(lines: Vec<CartLine>) -> CartSnapshot {
        let item_count = lines.iter().map(|l| l.quantity).sum();
        CartSnapshot { lines, item_count, subtotal: Money::default() }
    }

    fn hinted_line(id: &str, qty: u32, stock: Option<u32>) -> CartLine {
        CartLine {
            product_id: id.into(),
            name: format!("Product {id}"),
            unit_price: Money::mzn(Decimal::new(10, 0)),
            quantity: qty,
            available_stock: stock,
        }
    }

    #[test]
    fn test_no_hints_means_no_shortfalls() {
        let snap = snapshot(vec![hinted_line("A", 5, None), hinted_line("B", 2, None)]);
        assert!(check_local_shortfalls(&snap).is_empty());
    }

    #[test]
    fn test_local_shortfall_detected() {
        let snap = snapshot(vec![hinted_line("A", 5, Some(2)), hinted_line("B", 1, Some(10))]);
        let shortfalls = check_local_shortfalls(&snap);
        assert_eq!(shortfalls.len(), 1);
        assert_eq!(shortfalls[0].product_id, "A");
        assert_eq!(shortfalls[0].available, 2);
        assert_eq!(shortfalls[0].requested, 5);
    }

    #[test]
    fn test_exact_stock_is_not_a_shortfall() {
        let snap = snapshot(vec![hinted_line("A", 3, Some(3))]);
        assert!(check_local_shortfalls(&snap).is_empty());
    }

    #[test]
    fn test_parse_top_level_items() {
        let payload = json!({
            "items": [{"product_id": "A", "available": 1, "requested": 3}]
        });
        let records = parse_backend_shortfalls(&payload).unwrap();
        assert_eq!(records, vec![ShortfallRecord {
            product_id: "A".into(),
            name: None,
            available: 1,
            requested: 3,
        }]);
    }

    #[test]
    fn test_parse_detail_nested_items() {
        let payload = json!({
            "status": 409,
            "detail": {"items": [{"product_id": "A", "available": 1, "requested": 3}]}
        });
        let records = parse_backend_shortfalls(&payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product_id, "A");
        assert_eq!(records[0].available, 1);
        assert_eq!(records[0].requested, 3);
    }

    #[test]
    fn test_parse_field_aliases() {
        let payload = json!({
            "items": [{"id": 42, "productName": "Soap", "stock": "2", "quantity": 5}]
        });
        let records = parse_backend_shortfalls(&payload).unwrap();
        assert_eq!(records[0].product_id, "42");
        assert_eq!(records[0].name.as_deref(), Some("Soap"));
        assert_eq!(records[0].available, 2);
        assert_eq!(records[0].requested, 5);
    }

    #[test]
    fn test_parse_message_fallback() {
        let payload = json!({"message": "Sem stock"});
        let records = parse_backend_shortfalls(&payload).unwrap();
        assert_eq!(records, vec![ShortfallRecord::unknown()]);
        assert!(records[0].is_unknown());
    }

    #[test]
    fn test_parse_detail_text_fallback() {
        let payload = json!({"detail": "Stock insuficiente para Sabonete"});
        let records = parse_backend_shortfalls(&payload).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_unknown());
    }

    #[test]
    fn test_unrelated_error_is_none() {
        assert!(parse_backend_shortfalls(&json!({"detail": "Token expirado"})).is_none());
        assert!(parse_backend_shortfalls(&json!({"message": "Internal server error"})).is_none());
        assert!(parse_backend_shortfalls(&json!({})).is_none());
    }

    #[test]
    fn test_garbage_counts_coerce_to_zero() {
        let payload = json!({
            "items": [{"product_id": "A", "available": "lots", "requested": -4}]
        });
        let records = parse_backend_shortfalls(&payload).unwrap();
        assert_eq!(records[0].available, 0);
        assert_eq!(records[0].requested, 0);
    }

    #[test]
    fn test_structured_shape_wins_over_message() {
        let payload = json!({
            "message": "Sem stock",
            "items": [{"product_id": "A", "available": 1, "requested": 2}]
        });
        let records = parse_backend_shortfalls(&payload).unwrap();
        assert_eq!(records[0].product_id, "A");
    }
}
