//! Cart Store
//!
//! Sole owner of the cart. Every read and write goes through a single
//! injected [`CartStore`] instance: mutations apply to the in-memory
//! aggregate, persist a versioned snapshot to durable storage, then fan
//! the resulting [`CartEvent`]s out to subscribers.
//!
//! Persistence is best-effort. When storage is unavailable the store
//! logs and keeps going: the in-memory cart stays authoritative for the
//! session and is never lost to a failed write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Cart, CartLine};
use crate::domain::events::CartEvent;
use crate::domain::value_objects::Money;
use crate::storage::{KeyValueStorage, CART_KEY};

/// Bumped whenever the persisted cart layout changes. Records written
/// under a different version are discarded on load, not migrated.
pub const CART_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCart {
    version: u32,
    lines: Vec<CartLine>,
    updated_at: DateTime<Utc>,
}

/// Read-only view of the cart at a point in time. Derived fields are
/// computed when the snapshot is taken.
#[derive(Clone, Debug)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    pub subtotal: Money,
}

type Subscriber = Box<dyn Fn(&CartEvent) + Send + Sync>;

pub struct CartStore {
    cart: Cart,
    storage: Arc<dyn KeyValueStorage>,
    subscribers: Vec<Subscriber>,
}

impl CartStore {
    /// Seed the store from durable storage. A missing record, an
    /// unreadable record, or a record written under another schema
    /// version all start an empty cart.
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let cart = match storage.get(CART_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedCart>(&raw) {
                Ok(record) if record.version == CART_SCHEMA_VERSION => Cart::from_lines(record.lines),
                Ok(record) => {
                    tracing::warn!(version = record.version, "Discarding persisted cart with unknown schema version");
                    Cart::new()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable persisted cart");
                    Cart::new()
                }
            },
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Cart storage unavailable, starting empty");
                Cart::new()
            }
        };
        Self { cart, storage, subscribers: vec![] }
    }

    /// Register a callback invoked after every committed mutation.
    pub fn subscribe(&mut self, f: impl Fn(&CartEvent) + Send + Sync + 'static) {
        self.subscribers.push(Box::new(f));
    }

    pub fn add_line(&mut self, line: CartLine) {
        self.cart.add_line(line);
        self.after_mutation();
    }

    pub fn remove_line(&mut self, product_id: &str) {
        self.cart.remove_line(product_id);
        self.after_mutation();
    }

    pub fn decrement_line(&mut self, product_id: &str) {
        self.cart.decrement_line(product_id);
        self.after_mutation();
    }

    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) {
        self.cart.set_quantity(product_id, quantity);
        self.after_mutation();
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.after_mutation();
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.cart.lines().to_vec(),
            item_count: self.cart.item_count(),
            subtotal: self.cart.subtotal(),
        }
    }

    /// Persist, then notify. Runs only when the mutation actually
    /// changed the aggregate (no events means nothing happened).
    fn after_mutation(&mut self) {
        let events = self.cart.take_events();
        if events.is_empty() {
            return;
        }
        self.persist();
        for event in &events {
            for subscriber in &self.subscribers {
                subscriber(event);
            }
        }
    }

    fn persist(&self) {
        let record = PersistedCart {
            version: CART_SCHEMA_VERSION,
            lines: self.cart.lines().to_vec(),
            updated_at: self.cart.updated_at(),
        };
        let json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize cart, keeping in-memory state only");
                return;
            }
        };
        if let Err(e) = self.storage.put(CART_KEY, &json) {
            tracing::warn!(error = %e, "Failed to persist cart, keeping in-memory state only");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    fn line(id: &str, price: i64, qty: u32) -> CartLine {
        CartLine {
            product_id: id.into(),
            name: format!("Product {id}"),
            unit_price: Money::mzn(Decimal::new(price, 0)),
            quantity: qty,
            available_stock: None,
        }
    }

    #[test]
    fn test_mutations_persist_and_reload() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CartStore::load(storage.clone());
        store.add_line(line("A", 10, 3));
        store.add_line(line("B", 25, 1));
        store.decrement_line("A");

        let reloaded = CartStore::load(storage);
        let snapshot = reloaded.snapshot();
        assert_eq!(snapshot.lines.len(), 2);
        assert_eq!(snapshot.lines[0].quantity, 2);
        assert_eq!(snapshot.item_count, 3);
        assert_eq!(snapshot.subtotal.amount(), Decimal::new(45, 0));
    }

    #[test]
    fn test_unknown_schema_version_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .put(CART_KEY, r#"{"version":99,"lines":[],"updated_at":"2024-01-01T00:00:00Z"}"#)
            .unwrap();
        let store = CartStore::load(storage);
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_record_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.put(CART_KEY, "not json at all").unwrap();
        let store = CartStore::load(storage);
        assert!(store.is_empty());
    }

    struct BrokenStorage;
    impl KeyValueStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk full".into()))
        }
        fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk full".into()))
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk full".into()))
        }
    }

    #[test]
    fn test_storage_failure_degrades_to_session_only() {
        let mut store = CartStore::load(Arc::new(BrokenStorage));
        store.add_line(line("A", 10, 2));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.item_count, 2);
        assert_eq!(snapshot.subtotal.amount(), Decimal::new(20, 0));
    }

    #[test]
    fn test_subscribers_observe_mutations() {
        let seen: Arc<Mutex<Vec<CartEvent>>> = Arc::new(Mutex::new(vec![]));
        let sink = seen.clone();
        let mut store = CartStore::load(Arc::new(MemoryStorage::new()));
        store.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        store.add_line(line("A", 10, 1));
        store.remove_line("A");
        store.remove_line("A"); // no-op, must not notify

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                CartEvent::LineAdded { product_id: "A".into(), quantity: 1 },
                CartEvent::LineRemoved { product_id: "A".into() },
            ]
        );
    }

    #[test]
    fn test_snapshot_is_detached_view() {
        let mut store = CartStore::load(Arc::new(MemoryStorage::new()));
        store.add_line(line("A", 10, 1));
        let mut snapshot = store.snapshot();
        snapshot.lines[0].quantity = 99;
        assert_eq!(store.snapshot().lines[0].quantity, 1);
    }
}
