pub mod conversation_store;
pub mod message_store;

pub use conversation_store::{ConversationStore, StoreEvent};
