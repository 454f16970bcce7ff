pub mod mock;
pub mod ollama;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;

use crate::errors::ResponderError;
use crate::models::Turn;

pub use mock::MockResponder;
pub use ollama::LiveResponder;

/// Produces the assistant reply for a conversation.
///
/// `history` holds the prior turns in order and excludes `new_input`. `context` is an
/// optional document the reply should draw on. Implementations own their own timeout
/// and retry policy; the store only waits for the result.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn generate(
        &self,
        history: &[Turn],
        new_input: &str,
        context: Option<&str>,
    ) -> Result<String, ResponderError>;
}
