use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("Jira responded with {status}: {body}")]
    TicketingApi { status: u16, body: String },
    #[error("failed to call Jira: {0}")]
    TicketingTransport(String),
    #[error("transition '{transition}' not found for {issue}")]
    TransitionNotFound { issue: String, transition: String },
    #[error("language model error: {0}")]
    GenerationApi(String),
    #[error("knowledge base error: {0}")]
    KnowledgeBase(String),
    #[error("unexpected {service} response: {detail}")]
    Decode {
        service: &'static str,
        detail: String,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
