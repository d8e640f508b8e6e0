//! Integration tests for debounced cart persistence.
//!
//! Time is paused, so sleeps advance the tokio clock deterministically.

use std::sync::Arc;
use std::time::Duration;

use basket_cart::{
    Cart, CartConfig, CartPayload, CookieJar, DebouncedPersister, DurableStorage, MemoryStorage,
    NotificationBus, Persistence,
};
use basket_integration_tests::line;

struct Fixture {
    cart: Cart,
    storage: Arc<MemoryStorage>,
    jar: Arc<CookieJar>,
    persister: Arc<DebouncedPersister>,
}

fn fixture() -> Fixture {
    let config = CartConfig::default();
    let storage = Arc::new(MemoryStorage::new());
    let jar = Arc::new(CookieJar::from_header("session=abc"));
    let persistence = Persistence::new(storage.clone(), &config).with_hint(jar.clone());
    let persister = Arc::new(DebouncedPersister::spawn(
        persistence.clone(),
        config.persist_debounce,
    ));
    let cart = Cart::open(&config, &persistence, persister.clone(), NotificationBus::new());
    Fixture {
        cart,
        storage,
        jar,
        persister,
    }
}

fn stored(storage: &MemoryStorage) -> Option<CartPayload> {
    storage
        .get("cart")
        .expect("memory storage never fails")
        .map(|raw| CartPayload::decode(&raw).expect("cart writes valid payloads"))
}

#[tokio::test(start_paused = true)]
async fn test_stepper_burst_writes_once_with_final_state() {
    let f = fixture();
    f.cart.add_item(line("TEE", 1, "20.00"));
    for quantity in 2..=6 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        f.cart.update_item("TEE", quantity).expect("TEE is in the cart");
    }

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(f.storage.write_count(), 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(f.storage.write_count(), 1);

    let payload = stored(&f.storage).expect("payload written");
    assert_eq!(payload.items.len(), 1);
    assert_eq!(payload.items.first().map(|i| i.quantity), Some(6));
    assert_eq!(f.jar.get("cart_items_count").as_deref(), Some("6"));
    assert_eq!(f.jar.header(), "session=abc; cart_items_count=6");
}

#[tokio::test(start_paused = true)]
async fn test_mixed_mutations_within_window_write_once() {
    let f = fixture();
    f.cart.add_item(line("A", 1, "1.00"));
    f.cart.add_item(line("B", 1, "1.00"));
    f.cart.remove_item("A");
    f.cart.clear();
    f.cart.add_item(line("C", 3, "1.00"));

    tokio::time::sleep(Duration::from_millis(301)).await;

    assert_eq!(f.storage.write_count(), 1);
    let payload = stored(&f.storage).expect("payload written");
    let skus: Vec<&str> = payload.items.iter().map(|i| i.sku.as_str()).collect();
    assert_eq!(skus, ["C"]);
}

#[tokio::test(start_paused = true)]
async fn test_in_memory_state_is_current_before_write() {
    let f = fixture();
    f.cart.add_item(line("A", 2, "10.00"));

    assert_eq!(f.cart.item_count(), 2);
    assert!(stored(&f.storage).is_none());

    f.persister.flush().await;
    assert_eq!(stored(&f.storage), Some(f.cart.to_payload()));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_lands_pending_write() {
    let f = fixture();
    f.cart.add_item(line("A", 1, "10.00"));
    f.persister.shutdown().await;

    assert_eq!(f.storage.write_count(), 1);
    assert_eq!(stored(&f.storage), Some(f.cart.to_payload()));
}
