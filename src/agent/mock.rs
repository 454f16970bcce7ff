use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::debug;

use super::Responder;
use crate::errors::ResponderError;
use crate::models::Turn;

pub const DEFAULT_LATENCY: Duration = Duration::from_secs(2);

const DEFAULT_REPLIES: &[&str] = &[
    "Entendo como você se sente. Quer me contar um pouco mais sobre isso?",
    "Obrigado por compartilhar isso comigo. Estou aqui para ouvir você.",
    "Isso parece importante. O que mais tem passado pela sua cabeça?",
    "Vamos explorar isso juntos, com calma e no seu ritmo.",
    "Respire fundo. Você não precisa resolver tudo de uma vez.",
];

pub fn default_replies() -> Vec<String> {
    DEFAULT_REPLIES.iter().map(|r| (*r).to_string()).collect()
}

/// Stand-in assistant: waits a fixed latency, then answers with a random canned reply.
/// The input is ignored.
#[derive(Debug, Clone)]
pub struct MockResponder {
    latency: Duration,
    replies: Vec<String>,
}

impl MockResponder {
    pub fn new(latency: Duration, replies: Vec<String>) -> Self {
        Self { latency, replies }
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self::new(latency, default_replies())
    }
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::with_latency(DEFAULT_LATENCY)
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn generate(
        &self,
        history: &[Turn],
        _new_input: &str,
        _context: Option<&str>,
    ) -> Result<String, ResponderError> {
        debug!("Mock responder replying after {:?} ({} prior turns)", self.latency, history.len());
        tokio::time::sleep(self.latency).await;

        let reply = self.replies.choose(&mut rand::thread_rng()).cloned();
        reply.ok_or(ResponderError::EmptyReply)
    }
}
