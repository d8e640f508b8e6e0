//! Integration tests for file-backed carts.

use std::sync::Arc;

use basket_cart::{
    Cart, CartConfig, DurableStorage, FileStorage, ImmediatePersister, NotificationBus,
    Persistence, RestoreOutcome,
};
use basket_core::Price;
use basket_integration_tests::line;

fn open(storage: &Arc<FileStorage>) -> Cart {
    let config = CartConfig::default();
    let persistence = Persistence::new(storage.clone(), &config).with_hint(storage.clone());
    let persister = Arc::new(ImmediatePersister::new(persistence.clone()));
    Cart::open(&config, &persistence, persister, NotificationBus::new())
}

#[test]
fn test_cart_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Arc::new(FileStorage::open(dir.path()).expect("open storage"));

    let cart = open(&storage);
    cart.add_item(line("TEE", 2, "19.99").with_name("Black Tee"));
    cart.add_item(line("MUG", 1, "12.00"));
    cart.remove_item("MUG");

    let reopened = open(&storage);
    assert_eq!(reopened.items(), cart.items());
    assert_eq!(reopened.subtotal(), Price::from_minor_units(3_998));
    assert_eq!(
        storage
            .get("cart_items_count")
            .expect("read hint")
            .as_deref(),
        Some("2")
    );
}

#[test]
fn test_stale_schema_file_is_removed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Arc::new(FileStorage::open(dir.path()).expect("open storage"));
    storage
        .set("cart", r#"{"version":0,"items":[]}"#)
        .expect("seed payload");

    let cart = open(&storage);

    assert!(cart.is_empty());
    assert!(matches!(
        cart.restore_outcome(),
        RestoreOutcome::Discarded { .. }
    ));
    assert!(!dir.path().join("cart").exists());
}
