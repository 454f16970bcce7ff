use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::message_store::MessageStore;
use crate::agent::Responder;
use crate::errors::{ResponderError, StoreError};
use crate::models::{
    ConversationId, ConversationSummary, ConversationTags, ConversationView, ListOrder, Message,
    MessageRole, Turn,
};
use crate::summary::SummaryEngine;

const MAX_MESSAGE_LENGTH: usize = 8000;
const EVENT_CAPACITY: usize = 256;

/// Change notifications for observers of the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    ConversationCreated { conversation_id: ConversationId },
    MessageAppended { conversation_id: ConversationId, message: Message },
    ActiveChanged { conversation_id: Option<ConversationId> },
    ConversationDeleted { conversation_id: ConversationId },
    DocumentChanged { conversation_id: ConversationId },
    ResponsePending { conversation_id: ConversationId },
    ResponseCompleted { conversation_id: ConversationId, message: Message, title: String },
}

struct ConversationEntry {
    id: ConversationId,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    tags: ConversationTags,
    document_context: Option<String>,
    messages: MessageStore,
}

#[derive(Default)]
struct StoreState {
    /// Insertion order.
    conversations: Vec<ConversationEntry>,
    active_id: Option<ConversationId>,
    pending: HashSet<ConversationId>,
}

impl StoreState {
    fn get(&self, id: &ConversationId) -> Option<&ConversationEntry> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    fn get_mut(&mut self, id: &ConversationId) -> Option<&mut ConversationEntry> {
        self.conversations.iter_mut().find(|c| &c.id == id)
    }

    fn summary_of(&self, entry: &ConversationEntry) -> ConversationSummary {
        ConversationSummary {
            id: entry.id.clone(),
            title: entry.title.clone(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            message_count: entry.messages.len(),
            pending: self.pending.contains(&entry.id),
        }
    }
}

/// Everything a response cycle needs, captured while the user message is appended.
struct ResponseRequest {
    conversation_id: ConversationId,
    history: Vec<Turn>,
    input: String,
    context: Option<String>,
}

/// Owns every conversation, the active selection and the in-flight responses.
///
/// Cloning is cheap and every clone shares the same state. Operations return
/// immediately; assistant replies are produced on a spawned Tokio task, so
/// [`start_conversation`](Self::start_conversation), [`send_message`](Self::send_message)
/// and [`submit`](Self::submit) must be called from within a runtime.
#[derive(Clone)]
pub struct ConversationStore {
    state: Arc<Mutex<StoreState>>,
    responder: Arc<dyn Responder>,
    summary: Arc<SummaryEngine>,
    events: broadcast::Sender<StoreEvent>,
}

impl ConversationStore {
    pub fn new(responder: Arc<dyn Responder>, summary: SummaryEngine) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            responder,
            summary: Arc::new(summary),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ── Operations ───────────────────────────────────────────────────────────

    /// Creates a conversation holding `first_text` as its only message, makes it
    /// active and asks the responder for a reply.
    pub fn start_conversation(
        &self,
        first_text: &str,
        tags: ConversationTags,
    ) -> Result<ConversationId, StoreError> {
        let text = validate(first_text)?;
        let id = ConversationId::new();

        {
            let mut state = self.state();
            let mut messages = MessageStore::new();
            let message = messages.append(MessageRole::User, text);
            state.conversations.push(ConversationEntry {
                id: id.clone(),
                title: self.summary.placeholder().to_string(),
                created_at: message.created_at,
                updated_at: message.created_at,
                tags,
                document_context: None,
                messages,
            });
            state.active_id = Some(id.clone());
            state.pending.insert(id.clone());

            self.emit(StoreEvent::ConversationCreated { conversation_id: id.clone() });
            self.emit(StoreEvent::MessageAppended { conversation_id: id.clone(), message });
            self.emit(StoreEvent::ActiveChanged { conversation_id: Some(id.clone()) });
            self.emit(StoreEvent::ResponsePending { conversation_id: id.clone() });
        }
        info!("Started conversation {id}");

        self.spawn_response_cycle(ResponseRequest {
            conversation_id: id.clone(),
            history: Vec::new(),
            input: text.to_string(),
            context: None,
        });
        Ok(id)
    }

    /// Appends a user message and asks the responder for a reply. Rejected without
    /// any change while the conversation is still waiting on a previous reply.
    pub fn send_message(&self, id: &ConversationId, text: &str) -> Result<Message, StoreError> {
        let text = validate(text)?;

        let (message, request) = {
            let mut state = self.state();
            if state.pending.contains(id) {
                debug!("Ignoring message for conversation {id}: response still pending");
                return Err(StoreError::Busy { id: id.to_string() });
            }
            let entry = state
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

            let history: Vec<Turn> = entry.messages.all().map(Turn::from).collect();
            let message = entry.messages.append(MessageRole::User, text);
            entry.updated_at = message.created_at;
            let request = ResponseRequest {
                conversation_id: id.clone(),
                history,
                input: text.to_string(),
                context: entry.document_context.clone(),
            };
            state.pending.insert(id.clone());

            self.emit(StoreEvent::MessageAppended {
                conversation_id: id.clone(),
                message: message.clone(),
            });
            self.emit(StoreEvent::ResponsePending { conversation_id: id.clone() });
            (message, request)
        };

        self.spawn_response_cycle(request);
        Ok(message)
    }

    /// Sends to the active conversation, or starts a new one when none is active.
    pub fn submit(&self, text: &str, tags: ConversationTags) -> Result<ConversationId, StoreError> {
        match self.active_id() {
            Some(id) => self.send_message(&id, text).map(|_| id),
            None => self.start_conversation(text, tags),
        }
    }

    /// Makes `id` the active conversation. Unknown ids leave the selection alone.
    pub fn select_conversation(&self, id: &ConversationId) -> bool {
        let mut state = self.state();
        if state.get(id).is_none() {
            debug!("Cannot select unknown conversation {id}");
            return false;
        }
        if state.active_id.as_ref() != Some(id) {
            state.active_id = Some(id.clone());
            self.emit(StoreEvent::ActiveChanged { conversation_id: Some(id.clone()) });
        }
        true
    }

    /// Empties the selection, e.g. before the user types the first message of a new chat.
    pub fn clear_active(&self) {
        let mut state = self.state();
        if state.active_id.take().is_some() {
            self.emit(StoreEvent::ActiveChanged { conversation_id: None });
        }
    }

    /// Removes a conversation. Deleting an id that no longer exists is a no-op
    /// returning `false`. A reply still in flight for it will be dropped on arrival.
    pub fn delete_conversation(&self, id: &ConversationId) -> bool {
        let mut state = self.state();
        let Some(pos) = state.conversations.iter().position(|c| &c.id == id) else {
            return false;
        };
        state.conversations.remove(pos);
        if state.pending.remove(id) {
            debug!("Conversation {id} deleted with a response in flight");
        }
        self.emit(StoreEvent::ConversationDeleted { conversation_id: id.clone() });
        if state.active_id.as_ref() == Some(id) {
            state.active_id = None;
            self.emit(StoreEvent::ActiveChanged { conversation_id: None });
        }
        info!("Deleted conversation {id}");
        true
    }

    /// Attaches a document the responder should draw on for later replies. `None` or
    /// blank text detaches it.
    pub fn set_document_context(
        &self,
        id: &ConversationId,
        document: Option<String>,
    ) -> Result<(), StoreError> {
        let document = document.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
        let mut state = self.state();
        let entry = state
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        entry.document_context = document;
        self.emit(StoreEvent::DocumentChanged { conversation_id: id.clone() });
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn list_conversations(&self, order: ListOrder) -> Vec<ConversationSummary> {
        let state = self.state();
        let mut list: Vec<ConversationSummary> =
            state.conversations.iter().map(|c| state.summary_of(c)).collect();
        if order == ListOrder::Recent {
            // Stable sort keeps insertion order between equal timestamps.
            list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        }
        list
    }

    pub fn active_id(&self) -> Option<ConversationId> {
        self.state().active_id.clone()
    }

    /// Ids with a reply in flight, in list order.
    pub fn pending_ids(&self) -> Vec<ConversationId> {
        let state = self.state();
        state
            .conversations
            .iter()
            .filter(|c| state.pending.contains(&c.id))
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn is_pending(&self, id: &ConversationId) -> bool {
        self.state().pending.contains(id)
    }

    pub fn conversation(&self, id: &ConversationId) -> Option<ConversationView> {
        let state = self.state();
        state.get(id).map(|c| ConversationView {
            id: c.id.clone(),
            title: c.title.clone(),
            created_at: c.created_at,
            updated_at: c.updated_at,
            tags: c.tags.clone(),
            document_context: c.document_context.clone(),
            pending: state.pending.contains(&c.id),
            messages: c.messages.as_slice().to_vec(),
        })
    }

    pub fn messages(&self, id: &ConversationId) -> Option<Vec<Message>> {
        self.state().get(id).map(|c| c.messages.as_slice().to_vec())
    }

    pub fn active_messages(&self) -> Vec<Message> {
        let state = self.state();
        state
            .active_id
            .as_ref()
            .and_then(|id| state.get(id))
            .map(|c| c.messages.as_slice().to_vec())
            .unwrap_or_default()
    }

    // ── Response cycle ───────────────────────────────────────────────────────

    fn spawn_response_cycle(&self, request: ResponseRequest) {
        let store = self.clone();
        tokio::spawn(async move { store.run_response_cycle(request).await });
    }

    async fn run_response_cycle(&self, request: ResponseRequest) {
        let ResponseRequest { conversation_id, history, input, context } = request;

        // Run the call on its own task so a panicking responder still ends the cycle.
        let responder = Arc::clone(&self.responder);
        let call = tokio::spawn(async move {
            responder.generate(&history, &input, context.as_deref()).await
        });

        let content = match call.await {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                warn!("Responder returned an empty reply for conversation {conversation_id}");
                ResponderError::EmptyReply.user_message()
            }
            Ok(Err(e)) => {
                warn!("Responder failed for conversation {conversation_id}: {e}");
                e.user_message()
            }
            Err(e) => {
                error!("Responder task failed for conversation {conversation_id}: {e}");
                ResponderError::Inference { message: "falha interna do assistente".to_string() }
                    .user_message()
            }
        };

        self.complete_response(&conversation_id, content);
    }

    fn complete_response(&self, id: &ConversationId, content: String) {
        let mut state = self.state();
        let Some(entry) = state.get_mut(id) else {
            debug!("Discarding response for deleted conversation {id}");
            return;
        };

        let message = entry.messages.append(MessageRole::Assistant, content);
        entry.updated_at = message.created_at;
        entry.title = self.summary.summarize(entry.messages.as_slice());
        let title = entry.title.clone();
        state.pending.remove(id);

        debug!("Conversation {id} answered, title '{title}'");
        self.emit(StoreEvent::ResponseCompleted { conversation_id: id.clone(), message, title });
    }

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn validate(text: &str) -> Result<&str, StoreError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidInput);
    }
    let length = trimmed.chars().count();
    if length > MAX_MESSAGE_LENGTH {
        return Err(StoreError::TooLong { max_length: MAX_MESSAGE_LENGTH, actual_length: length });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::agent::testing::{GatedResponder, PanickingResponder, ScriptedResponder};
    use crate::agent::MockResponder;
    use crate::summary::{DEFAULT_PLACEHOLDER, LABEL_CAREER, LABEL_STUDY};

    fn store_with(responder: Arc<dyn Responder>) -> ConversationStore {
        ConversationStore::new(responder, SummaryEngine::default())
    }

    /// Lets every ready task run; paused time only advances once the runtime is idle.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    async fn next_completion(
        rx: &mut broadcast::Receiver<StoreEvent>,
    ) -> (ConversationId, Message, String) {
        loop {
            if let StoreEvent::ResponseCompleted { conversation_id, message, title } =
                rx.recv().await.unwrap()
            {
                return (conversation_id, message, title);
            }
        }
    }

    fn contents(store: &ConversationStore, id: &ConversationId) -> Vec<(MessageRole, String)> {
        store
            .messages(id)
            .unwrap()
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn anxious_about_work_scenario() {
        let store = store_with(Arc::new(MockResponder::default()));
        let mut rx = store.subscribe();

        let id = store
            .start_conversation("Estou ansioso com o trabalho", ConversationTags::new("Advisor", "calm"))
            .unwrap();

        assert_eq!(store.messages(&id).unwrap().len(), 1);
        assert!(store.is_pending(&id));
        assert_eq!(store.active_id(), Some(id.clone()));
        assert_eq!(store.pending_ids(), vec![id.clone()]);

        let (done, _, title) = next_completion(&mut rx).await;
        assert_eq!(done, id);
        assert_eq!(title, LABEL_CAREER);

        let view = store.conversation(&id).unwrap();
        let roles: Vec<MessageRole> = view.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, [MessageRole::User, MessageRole::Assistant]);
        assert_eq!(view.title, LABEL_CAREER);
        assert_eq!(view.tags, ConversationTags::new("Advisor", "calm"));
        assert!(!view.pending);
        assert!(store.pending_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_text_is_rejected_without_changes() {
        let scripted = Arc::new(ScriptedResponder::new("ok"));
        let store = store_with(scripted.clone());
        let mut rx = store.subscribe();

        assert_eq!(store.start_conversation("  \n\t", ConversationTags::default()), Err(StoreError::InvalidInput));
        assert!(store.list_conversations(ListOrder::Created).is_empty());

        let id = store.start_conversation("Olá", ConversationTags::default()).unwrap();
        next_completion(&mut rx).await;
        let before = store.conversation(&id).unwrap();

        assert_eq!(store.send_message(&id, "   "), Err(StoreError::InvalidInput));
        settle().await;

        assert_eq!(store.conversation(&id).unwrap(), before);
        assert_eq!(scripted.recorded_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overlong_text_is_rejected() {
        let store = store_with(Arc::new(ScriptedResponder::new("ok")));
        let text = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        assert_eq!(
            store.start_conversation(&text, ConversationTags::default()),
            Err(StoreError::TooLong { max_length: MAX_MESSAGE_LENGTH, actual_length: MAX_MESSAGE_LENGTH + 1 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_ids_are_not_found_and_change_nothing() {
        let store = store_with(Arc::new(ScriptedResponder::new("ok")));
        let ghost = ConversationId::from("nao-existe");

        assert!(store.send_message(&ghost, "oi").unwrap_err().is_not_found());
        assert!(store.set_document_context(&ghost, Some("doc".into())).unwrap_err().is_not_found());
        assert!(!store.select_conversation(&ghost));
        assert!(!store.delete_conversation(&ghost));
        assert_eq!(store.active_id(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn send_while_pending_is_a_no_op() {
        let gate = Arc::new(GatedResponder::new());
        let store = store_with(gate.clone());

        let id = store.start_conversation("Primeira pergunta", ConversationTags::default()).unwrap();
        settle().await;
        assert_eq!(gate.waiting_count(), 1);

        assert_eq!(
            store.send_message(&id, "Segunda pergunta"),
            Err(StoreError::Busy { id: id.to_string() })
        );
        settle().await;
        assert_eq!(store.messages(&id).unwrap().len(), 1);
        assert_eq!(gate.waiting_count(), 1);

        gate.release("Primeira pergunta", Ok("Resposta".into())).await;
        settle().await;
        assert!(!store.is_pending(&id));

        store.send_message(&id, "Segunda pergunta").unwrap();
        assert!(store.is_pending(&id));
        assert_eq!(store.messages(&id).unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_active_clears_selection() {
        let store = store_with(Arc::new(ScriptedResponder::new("ok")));
        let a = store.start_conversation("Conversa A", ConversationTags::default()).unwrap();
        let b = store.start_conversation("Conversa B", ConversationTags::default()).unwrap();
        settle().await;

        assert_eq!(store.active_id(), Some(b.clone()));
        assert!(store.delete_conversation(&a));
        assert_eq!(store.active_id(), Some(b.clone()));

        assert!(store.delete_conversation(&b));
        assert_eq!(store.active_id(), None);
        assert!(!store.delete_conversation(&b));
        assert!(store.list_conversations(ListOrder::Created).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn completion_after_delete_is_discarded() {
        let gate = Arc::new(GatedResponder::new());
        let store = store_with(gate.clone());
        let mut rx = store.subscribe();

        let id = store.start_conversation("Vou apagar isto", ConversationTags::default()).unwrap();
        settle().await;
        assert!(store.delete_conversation(&id));

        gate.release("Vou apagar isto", Ok("tarde demais".into())).await;
        settle().await;

        assert!(store.conversation(&id).is_none());
        assert!(store.list_conversations(ListOrder::Created).is_empty());
        assert!(store.pending_ids().is_empty());
        assert_eq!(store.active_id(), None);
        while let Ok(event) = rx.try_recv() {
            assert!(!matches!(event, StoreEvent::ResponseCompleted { .. }));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_order_completions_keep_each_conversation_ordered() {
        let gate = Arc::new(GatedResponder::new());
        let store = store_with(gate.clone());

        let a = store.start_conversation("a1", ConversationTags::default()).unwrap();
        let b = store.start_conversation("b1", ConversationTags::default()).unwrap();
        settle().await;

        gate.release("b1", Ok("resposta b1".into())).await;
        settle().await;
        assert!(store.is_pending(&a));
        assert!(!store.is_pending(&b));

        store.send_message(&b, "b2").unwrap();
        gate.release("a1", Ok("resposta a1".into())).await;
        settle().await;
        store.send_message(&a, "a2").unwrap();
        settle().await;

        gate.release("a2", Ok("resposta a2".into())).await;
        gate.release("b2", Ok("resposta b2".into())).await;
        settle().await;

        use MessageRole::{Assistant, User};
        assert_eq!(
            contents(&store, &a),
            [
                (User, "a1".to_string()),
                (Assistant, "resposta a1".to_string()),
                (User, "a2".to_string()),
                (Assistant, "resposta a2".to_string()),
            ]
        );
        assert_eq!(
            contents(&store, &b),
            [
                (User, "b1".to_string()),
                (Assistant, "resposta b1".to_string()),
                (User, "b2".to_string()),
                (Assistant, "resposta b2".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn switching_active_does_not_touch_pending() {
        let gate = Arc::new(GatedResponder::new());
        let store = store_with(gate.clone());

        let a = store.start_conversation("pergunta a", ConversationTags::default()).unwrap();
        let b = store.start_conversation("pergunta b", ConversationTags::default()).unwrap();
        settle().await;

        gate.release("pergunta b", Ok("ok".into())).await;
        settle().await;

        assert!(store.select_conversation(&a));
        assert_eq!(store.active_id(), Some(a.clone()));
        assert!(store.is_pending(&a));
        assert!(store.select_conversation(&b));
        assert!(store.is_pending(&a));
        assert_eq!(store.pending_ids(), vec![a.clone()]);
        assert_eq!(store.active_messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn responder_failures_become_assistant_messages() {
        let scripted = Arc::new(ScriptedResponder::new("ok"));
        scripted.queue(Err(ResponderError::RateLimited));
        scripted.queue(Ok("   ".into()));
        let store = store_with(scripted.clone());
        let mut rx = store.subscribe();

        let id = store.start_conversation("Tudo bem?", ConversationTags::default()).unwrap();
        let (_, reply, _) = next_completion(&mut rx).await;
        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.content, ResponderError::RateLimited.user_message());
        assert!(!store.is_pending(&id));

        store.send_message(&id, "E agora?").unwrap();
        let (_, reply, _) = next_completion(&mut rx).await;
        assert_eq!(reply.content, ResponderError::EmptyReply.user_message());
        assert!(!store.is_pending(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_responder_still_ends_the_cycle() {
        let store = store_with(Arc::new(PanickingResponder));
        let mut rx = store.subscribe();

        let id = store.start_conversation("Olá de novo", ConversationTags::default()).unwrap();
        let (_, reply, _) = next_completion(&mut rx).await;

        assert!(!store.is_pending(&id));
        assert_eq!(reply.role, MessageRole::Assistant);
        assert!(!reply.content.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn responder_sees_prior_history_and_document() {
        let scripted = Arc::new(ScriptedResponder::new("resposta"));
        let store = store_with(scripted.clone());
        let mut rx = store.subscribe();

        let id = store.start_conversation("primeira", ConversationTags::default()).unwrap();
        next_completion(&mut rx).await;
        store.set_document_context(&id, Some("  Capítulo 1  ".into())).unwrap();
        store.send_message(&id, "segunda").unwrap();
        next_completion(&mut rx).await;

        let calls = scripted.recorded_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].history.is_empty());
        assert_eq!(calls[0].new_input, "primeira");
        assert_eq!(calls[0].context, None);
        assert_eq!(
            calls[1].history,
            vec![
                Turn { role: MessageRole::User, content: "primeira".into() },
                Turn { role: MessageRole::Assistant, content: "resposta".into() },
            ]
        );
        assert_eq!(calls[1].new_input, "segunda");
        assert_eq!(calls[1].context.as_deref(), Some("Capítulo 1"));

        store.set_document_context(&id, Some(" ".into())).unwrap();
        assert_eq!(store.conversation(&id).unwrap().document_context, None);
    }

    #[tokio::test(start_paused = true)]
    async fn title_is_derived_only_after_a_reply() {
        let gate = Arc::new(GatedResponder::new());
        let store = store_with(gate.clone());

        let id = store.start_conversation("Oi", ConversationTags::default()).unwrap();
        assert_eq!(store.conversation(&id).unwrap().title, DEFAULT_PLACEHOLDER);
        gate.release("Oi", Ok("Olá!".into())).await;
        settle().await;
        assert_eq!(store.conversation(&id).unwrap().title, crate::summary::DEFAULT_FALLBACK);

        store.send_message(&id, "Tenho prova amanhã").unwrap();
        settle().await;
        assert_eq!(store.conversation(&id).unwrap().title, crate::summary::DEFAULT_FALLBACK);

        gate.release("Tenho prova amanhã", Ok("Boa sorte!".into())).await;
        settle().await;
        assert_eq!(store.conversation(&id).unwrap().title, LABEL_STUDY);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_follows_the_active_conversation() {
        let store = store_with(Arc::new(ScriptedResponder::new("ok")));

        let first = store.submit("começando", ConversationTags::default()).unwrap();
        settle().await;
        assert_eq!(store.submit("continuando", ConversationTags::default()).unwrap(), first);
        settle().await;
        assert_eq!(store.messages(&first).unwrap().len(), 4);

        store.clear_active();
        assert_eq!(store.active_id(), None);
        let second = store.submit("outro assunto", ConversationTags::default()).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.active_id(), Some(second));
    }

    #[tokio::test(start_paused = true)]
    async fn lists_by_creation_or_recency() {
        let store = store_with(Arc::new(ScriptedResponder::new("ok")));
        let a = store.start_conversation("mais antiga", ConversationTags::default()).unwrap();
        settle().await;
        let b = store.start_conversation("mais nova", ConversationTags::default()).unwrap();
        settle().await;

        let created: Vec<ConversationId> =
            store.list_conversations(ListOrder::Created).into_iter().map(|c| c.id).collect();
        assert_eq!(created, [a.clone(), b.clone()]);

        std::thread::sleep(Duration::from_millis(5));
        store.send_message(&a, "atualizando").unwrap();
        let recent = store.list_conversations(ListOrder::Recent);
        assert_eq!(recent[0].id, a);
        assert!(recent[0].pending);
        assert_eq!(recent[0].message_count, 3);
        assert_eq!(recent[1].id, b);
    }

    #[tokio::test(start_paused = true)]
    async fn local_changes_are_announced_synchronously() {
        let gate = Arc::new(GatedResponder::new());
        let store = store_with(gate);
        let mut rx = store.subscribe();

        let id = store.start_conversation("Olá", ConversationTags::default()).unwrap();

        assert_eq!(rx.try_recv().unwrap(), StoreEvent::ConversationCreated { conversation_id: id.clone() });
        assert!(matches!(
            rx.try_recv().unwrap(),
            StoreEvent::MessageAppended { message, .. } if message.content == "Olá"
        ));
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::ActiveChanged { conversation_id: Some(id.clone()) });
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::ResponsePending { conversation_id: id.clone() });

        store.delete_conversation(&id);
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::ConversationDeleted { conversation_id: id.clone() });
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::ActiveChanged { conversation_id: None });
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = StoreEvent::ResponsePending { conversation_id: ConversationId::from("abc") };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "response_pending", "conversation_id": "abc" }));

        let json = serde_json::to_value(StoreEvent::ActiveChanged { conversation_id: None }).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "active_changed", "conversation_id": null }));
    }
}
