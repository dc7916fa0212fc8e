//! Client-side coordination for the RAG assistant: a gateway to the
//! question-answering backend and the conversation and dashboard state fed by it.

pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod service;
pub mod state;

pub use api::{Gateway, HttpGateway};
pub use config::Config;
pub use errors::AppError;
pub use service::chat_service::ChatService;
pub use service::dashboard_service::DashboardService;
pub use state::{ConversationStore, DashboardStore, Phase};
