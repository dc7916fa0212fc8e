//! Remote question-answering service.

mod http;

pub use http::HttpGateway;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{ChatResponse, HealthResponse, HistoryResponse, Statistics};

/// Request/response exchange with the assistant backend.
///
/// Every call fails on a non-success status or an unparseable body; callers
/// hand the rendered error to the state containers.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn check_health(&self) -> Result<HealthResponse, AppError>;

    async fn ask(&self, question: &str) -> Result<ChatResponse, AppError>;

    async fn fetch_statistics(&self) -> Result<Statistics, AppError>;

    /// `date` is a calendar day in `YYYY-MM-DD` form.
    async fn fetch_history(&self, date: &str) -> Result<HistoryResponse, AppError>;
}
