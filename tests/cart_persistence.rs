//! Cart and token persistence against the file-backed storage.

use std::sync::Arc;

use rust_decimal::Decimal;

use arca_client::storage::TOKEN_KEY;
use arca_client::{AuthSession, CartLine, CartStore, FileStorage, KeyValueStorage, Money};

fn line(id: &str, name: &str, price: i64, qty: u32, stock: Option<u32>) -> CartLine {
    CartLine {
        product_id: id.into(),
        name: name.into(),
        unit_price: Money::mzn(Decimal::new(price, 0)),
        quantity: qty,
        available_stock: stock,
    }
}

#[test]
fn cart_survives_restart_line_for_line() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::open(dir.path()).unwrap());

    let mut store = CartStore::load(storage.clone());
    store.add_line(line("A", "Sabonete", 10, 3, Some(8)));
    store.add_line(line("B", "Óleo de coco", 25, 1, None));
    store.set_quantity("A", 2);

    // Fresh session over the same directory.
    let reloaded = CartStore::load(Arc::new(FileStorage::open(dir.path()).unwrap()));
    let before = store.snapshot();
    let after = reloaded.snapshot();

    assert_eq!(before.lines, after.lines);
    assert_eq!(after.item_count, 3);
    assert_eq!(after.subtotal.amount(), Decimal::new(45, 0));
    assert_eq!(after.lines[0].available_stock, Some(8));
}

#[test]
fn cleared_cart_stays_cleared_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = CartStore::load(Arc::new(FileStorage::open(dir.path()).unwrap()));
    store.add_line(line("A", "Sabonete", 10, 2, None));
    store.clear();

    let reloaded = CartStore::load(Arc::new(FileStorage::open(dir.path()).unwrap()));
    assert!(reloaded.is_empty());
}

#[test]
fn token_round_trips_through_auth_session() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::open(dir.path()).unwrap());
    storage.put(TOKEN_KEY, "bearer-abc").unwrap();

    let session = AuthSession::load(Arc::new(FileStorage::open(dir.path()).unwrap()));
    assert_eq!(session.token(), Some("bearer-abc"));
}
