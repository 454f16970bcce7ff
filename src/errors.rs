use thiserror::Error;

/// Top-level application error for startup and infrastructure failures.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Invalid value '{value}' for {key}")]
    InvalidConfig { key: String, value: String },

    // ── Database errors ──────────────────────────────────────────────────────
    #[error("Database connection failed: {0}")]
    DatabaseConnectionFailed(#[source] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),

    #[error("Database query failed: {message}")]
    DatabaseQueryFailed {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    // ── AI Agent errors ──────────────────────────────────────────────────────
    #[error("Failed to build responder client: {message}")]
    ResponderSetup { message: String },
}

impl AppError {
    pub fn db_query(message: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::DatabaseQueryFailed { message: message.into(), source }
    }

    pub fn invalid_config(key: &str, value: impl Into<String>) -> Self {
        AppError::InvalidConfig { key: key.to_string(), value: value.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::EmptyField { .. })
    }
}

/// Rejections from [`ConversationStore`](crate::store::ConversationStore) operations.
/// None of them leave a partial mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Message text cannot be empty")]
    InvalidInput,

    #[error("Message exceeds max length of {max_length} (actual: {actual_length})")]
    TooLong { max_length: usize, actual_length: usize },

    #[error("Conversation '{id}' not found")]
    NotFound { id: String },

    #[error("Conversation '{id}' is still waiting for a response")]
    Busy { id: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::InvalidInput | StoreError::TooLong { .. })
    }
}

/// Failure of a responder call. Never surfaced to the UI as an error: the store turns
/// it into an assistant message via [`ResponderError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponderError {
    #[error("responder is not configured")]
    NotConfigured,

    #[error("authentication with the backend failed: {message}")]
    Auth { message: String },

    #[error("model '{model_name}' not found")]
    ModelNotFound { model_name: String },

    #[error("rate limited by the backend")]
    RateLimited,

    #[error("backend unavailable at {host}")]
    Unavailable { host: String },

    #[error("no reply within {secs}s")]
    Timeout { secs: u64 },

    #[error("backend returned an empty reply")]
    EmptyReply,

    #[error("inference error: {message}")]
    Inference { message: String },
}

impl ResponderError {
    /// Text shown in place of the assistant reply.
    pub fn user_message(&self) -> String {
        match self {
            ResponderError::NotConfigured => {
                "O assistente ainda não está configurado. Defina OLLAMA_API_BASE_URL para ativar as respostas.".to_string()
            }
            ResponderError::Auth { .. } => {
                "Não foi possível autenticar com o serviço de IA. Verifique as credenciais configuradas.".to_string()
            }
            ResponderError::ModelNotFound { model_name } => {
                format!("O modelo '{model_name}' não está disponível no momento. Verifique a configuração do assistente.")
            }
            ResponderError::RateLimited => {
                "Muitas solicitações em pouco tempo. Aguarde alguns instantes e tente novamente.".to_string()
            }
            ResponderError::Unavailable { .. } => {
                "O serviço de IA está indisponível no momento. Tente novamente mais tarde.".to_string()
            }
            ResponderError::Timeout { .. } => {
                "O assistente demorou demais para responder. Tente novamente.".to_string()
            }
            ResponderError::EmptyReply => {
                "O assistente não retornou nenhuma resposta. Tente reformular a mensagem.".to_string()
            }
            ResponderError::Inference { message } => {
                format!("Desculpe, ocorreu um erro ao gerar a resposta: {message}")
            }
        }
    }
}
