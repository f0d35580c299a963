#![allow(dead_code)]

use restbind::resource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: u64,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub pet_id: u64,
    pub quantity: u32,
}

/// The store root. Everything else hangs off this interface.
#[resource(path = "store", produces("application/json"))]
pub trait StoreApi {
    #[get("pets/{id}")]
    fn pet(&self, #[path_param] id: u64) -> Pet;

    #[get("pets")]
    fn search(&self, #[query_param] status: &str, #[query_param("tag")] tag: &str) -> Vec<Pet>;

    #[post("pets")]
    fn add_pet(&self, pet: Pet) -> Pet;

    #[delete("pets/{id}")]
    fn remove_pet(&self, #[path_param] id: u64);

    /// Order handling lives under the segment this locator contributes.
    #[path("orders")]
    fn orders(&self) -> OrdersApi;
}

#[resource(produces("application/json"))]
pub trait OrdersApi {
    #[get("{id}")]
    fn find(&self, #[path_param] id: u64) -> Order;

    #[post]
    fn place(&self, order: Order) -> Order;
}
