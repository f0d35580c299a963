use restbind::RecordingTransport;
use serde_json::json;

use crate::store::{Order, StoreApiClient};

mod store;

fn main() -> restbind::Result<()> {
    let store = StoreApiClient::new(RecordingTransport::new(), "http://localhost:8080")?;

    store.proxy().transport().enqueue_reply(json!({
        "id": 7, "name": "Doggy", "status": "available"
    }));
    let pet = store.pet(7)?;
    println!("fetched {} ({})", pet.name, pet.status);

    let orders = store.orders()?;
    store.proxy().transport().enqueue_reply(json!({
        "id": 100, "pet_id": 7, "quantity": 1
    }));
    let placed = orders.place(Order {
        id: 0,
        pet_id: 7,
        quantity: 1,
    })?;
    println!("placed order {}", placed.id);

    for exchange in store.proxy().transport().exchanges() {
        println!("{} {}", exchange.method, exchange.uri);
    }
    Ok(())
}
