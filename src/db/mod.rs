pub mod key_value_store;
pub mod preference_repository;

pub use key_value_store::{InMemoryKeyValueStore, KeyValueStore};
pub use preference_repository::PgKeyValueStore;
