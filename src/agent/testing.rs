//! Responders for tests: scripted replies and replies released by hand.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::Responder;
use crate::errors::ResponderError;
use crate::models::Turn;

/// One recorded `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub history: Vec<Turn>,
    pub new_input: String,
    pub context: Option<String>,
}

/// Answers immediately with queued results, falling back to a fixed reply.
pub struct ScriptedResponder {
    queued: Mutex<VecDeque<Result<String, ResponderError>>>,
    fallback: String,
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedResponder {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: fallback.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn queue(&self, result: Result<String, ResponderError>) {
        self.queued.lock().unwrap().push_back(result);
    }

    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for ScriptedResponder {
    async fn generate(
        &self,
        history: &[Turn],
        new_input: &str,
        context: Option<&str>,
    ) -> Result<String, ResponderError> {
        self.calls.lock().unwrap().push(RecordedCall {
            history: history.to_vec(),
            new_input: new_input.to_string(),
            context: context.map(str::to_string),
        });
        let next = self.queued.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

type Reply = Result<String, ResponderError>;

/// Holds every call open until the test releases it by its input text, so tests
/// decide the completion order.
#[derive(Default)]
pub struct GatedResponder {
    waiting: Mutex<HashMap<String, oneshot::Sender<Reply>>>,
}

impl GatedResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.lock().unwrap().len()
    }

    /// Completes the call made for `new_input`, waiting for it to arrive first.
    pub async fn release(&self, new_input: &str, reply: Reply) {
        for _ in 0..1_000 {
            let sender = self.waiting.lock().unwrap().remove(new_input);
            if let Some(sender) = sender {
                let _ = sender.send(reply);
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("no responder call arrived for {new_input:?}");
    }
}

#[async_trait]
impl Responder for GatedResponder {
    async fn generate(
        &self,
        _history: &[Turn],
        new_input: &str,
        _context: Option<&str>,
    ) -> Result<String, ResponderError> {
        let (tx, rx) = oneshot::channel();
        self.waiting.lock().unwrap().insert(new_input.to_string(), tx);
        rx.await
            .unwrap_or_else(|_| Err(ResponderError::Inference { message: "gate dropped".into() }))
    }
}

/// Panics on every call.
pub struct PanickingResponder;

#[async_trait]
impl Responder for PanickingResponder {
    async fn generate(
        &self,
        _history: &[Turn],
        _new_input: &str,
        _context: Option<&str>,
    ) -> Result<String, ResponderError> {
        panic!("responder blew up");
    }
}
