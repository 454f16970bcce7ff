//! Conversation and message state engine for a multi-session chat workspace.
//!
//! [`store::ConversationStore`] owns the conversations and runs the reply cycle against a
//! pluggable [`agent::Responder`]; [`summary::SummaryEngine`] titles each conversation.
//! The HTTP and WebSocket surface in [`routes`] is a thin layer over the store.

pub mod agent;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;
pub mod summary;
