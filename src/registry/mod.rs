// src/registry/mod.rs
mod endpoint;
mod store;

pub use endpoint::{Endpoint, Registry};
pub use store::{JsonFileStore, RegistryStore, StoreError};
