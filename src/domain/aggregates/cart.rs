//! Cart Aggregate
//!
//! In-memory shopping cart: one line per product, quantity always >= 1.
//! Mutations that would leave a line at zero quantity remove the line
//! instead. Name and unit price are snapshots taken when the product is
//! first added and are not re-synced afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::domain::events::CartEvent;
use crate::domain::value_objects::{Money, DEFAULT_CURRENCY};

#[derive(Clone, Debug)]
pub struct Cart {
    lines: Vec<CartLine>,
    updated_at: DateTime<Utc>,
    events: Vec<CartEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    /// Available-stock hint captured from the catalog at add time.
    /// `None` means "no information", never "zero stock".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_stock: Option<u32>,
}

impl CartLine {
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

impl Cart {
    pub fn new() -> Self {
        Self { lines: vec![], updated_at: Utc::now(), events: vec![] }
    }

    /// Rebuild a cart from previously persisted lines, dropping anything
    /// that violates the aggregate invariants (zero quantities, duplicate
    /// product ids, negative prices).
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 { continue; }
            cart.add_line(line);
        }
        cart.events.clear();
        cart
    }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Recomputed on every call, never cached.
    pub fn subtotal(&self) -> Money {
        let currency = self
            .lines
            .first()
            .map(|l| l.unit_price.currency().to_string())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        self.lines
            .iter()
            .fold(Money::zero(&currency), |acc, l| acc.add(&l.line_total()).unwrap_or(acc))
    }

    /// Add `line.quantity` units of a product. Merges into the existing
    /// line when the product is already in the cart, keeping the original
    /// name/price snapshot. A zero quantity is treated as a no-op.
    pub fn add_line(&mut self, mut line: CartLine) {
        if line.quantity == 0 { return; }
        if line.unit_price.is_negative() {
            line.unit_price = Money::zero(line.unit_price.currency());
        }
        if let Some(existing) = self.lines.iter_mut().find(|l| l.product_id == line.product_id) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
            if line.available_stock.is_some() {
                existing.available_stock = line.available_stock;
            }
            let event = CartEvent::LineAdded { product_id: existing.product_id.clone(), quantity: existing.quantity };
            self.raise_event(event);
        } else {
            self.raise_event(CartEvent::LineAdded { product_id: line.product_id.clone(), quantity: line.quantity });
            self.lines.push(line);
        }
        self.touch();
    }

    /// Delete the line entirely regardless of quantity. No-op when absent.
    pub fn remove_line(&mut self, product_id: &str) {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() != before {
            self.raise_event(CartEvent::LineRemoved { product_id: product_id.to_string() });
            self.touch();
        }
    }

    /// Reduce quantity by one; at quantity 1 the line is removed instead
    /// of being stored at zero. No-op when absent.
    pub fn decrement_line(&mut self, product_id: &str) {
        let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) else { return };
        if line.quantity <= 1 {
            self.remove_line(product_id);
            return;
        }
        line.quantity -= 1;
        let event = CartEvent::QuantityChanged { product_id: product_id.to_string(), quantity: line.quantity };
        self.raise_event(event);
        self.touch();
    }

    /// Set the absolute quantity. Zero removes the line; a line at zero
    /// quantity must never exist.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) {
        if quantity == 0 {
            self.remove_line(product_id);
            return;
        }
        let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) else { return };
        line.quantity = quantity;
        let event = CartEvent::QuantityChanged { product_id: product_id.to_string(), quantity };
        self.raise_event(event);
        self.touch();
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.raise_event(CartEvent::Cleared);
        self.touch();
    }

    pub fn take_events(&mut self) -> Vec<CartEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: CartEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl Default for Cart {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn line(id: &str, name: &str, price: i64, qty: u32) -> CartLine {
        CartLine {
            product_id: id.into(),
            name: name.into(),
            unit_price: Money::mzn(Decimal::new(price, 0)),
            quantity: qty,
            available_stock: None,
        }
    }

    #[test]
    fn test_add_merges_by_product_id() {
        let mut cart = Cart::new();
        cart.add_line(line("A", "Soap", 10, 2));
        cart.add_line(line("A", "Soap", 10, 3));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_subtotal_and_item_count() {
        let mut cart = Cart::new();
        cart.add_line(line("A", "Soap", 10, 3));
        cart.add_line(line("B", "Oil", 25, 1));
        assert_eq!(cart.subtotal().amount(), Decimal::new(55, 0));
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_decrement_to_removal() {
        let mut cart = Cart::new();
        cart.add_line(line("A", "Soap", 10, 1));
        assert_eq!(cart.lines().len(), 1);
        cart.decrement_line("A");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decrement_keeps_positive_quantity() {
        let mut cart = Cart::new();
        cart.add_line(line("A", "Soap", 10, 3));
        cart.decrement_line("A");
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_line(line("A", "Soap", 10, 4));
        cart.set_quantity("A", 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_zero_delta_is_noop() {
        let mut cart = Cart::new();
        cart.add_line(line("A", "Soap", 10, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = Cart::new();
        cart.remove_line("ghost");
        cart.decrement_line("ghost");
        cart.set_quantity("ghost", 5);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut cart = Cart::new();
        cart.add_line(line("A", "Soap", 10, 2));
        cart.clear();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_negative_price_clamped() {
        let mut cart = Cart::new();
        cart.add_line(line("A", "Soap", -10, 1));
        assert_eq!(cart.subtotal().amount(), Decimal::ZERO);
    }

    #[test]
    fn test_from_lines_drops_invalid() {
        let cart = Cart::from_lines(vec![
            line("A", "Soap", 10, 2),
            line("A", "Soap", 10, 1),
            line("B", "Oil", 25, 0),
        ]);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_stock_hint_refreshed_on_merge() {
        let mut cart = Cart::new();
        let mut first = line("A", "Soap", 10, 1);
        first.available_stock = Some(5);
        cart.add_line(first);
        let mut second = line("A", "Soap", 10, 1);
        second.available_stock = Some(3);
        cart.add_line(second);
        assert_eq!(cart.lines()[0].available_stock, Some(3));
        let third = line("A", "Soap", 10, 1);
        cart.add_line(third);
        assert_eq!(cart.lines()[0].available_stock, Some(3));
    }
}
