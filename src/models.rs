use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    pub pending: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc::now(),
            sources: None,
            pending: false,
        }
    }

    /// An empty assistant entry shown while the answer is outstanding.
    pub fn placeholder() -> Self {
        Self {
            id: new_message_id(),
            role: MessageRole::Assistant,
            content: String::new(),
            created_at: Utc::now(),
            sources: None,
            pending: true,
        }
    }

    pub fn assistant(response: ChatResponse) -> Self {
        Self {
            id: new_message_id(),
            role: MessageRole::Assistant,
            content: response.answer,
            created_at: response.timestamp,
            sources: Some(response.sources),
            pending: false,
        }
    }
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ── Wire types ───────────────────────────────────────────────────────────────

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

/// Answer returned by `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

/// Statistics snapshot from `GET /stats`. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(rename = "total_articles")]
    pub article_count: u64,
    #[serde(rename = "total_projects")]
    pub project_count: u64,
    #[serde(rename = "total_conversations")]
    pub conversation_count: u64,
    #[serde(rename = "last_updated", deserialize_with = "timestamp::deserialize")]
    pub last_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Conversations recorded by the service for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub date: String,
    #[serde(default)]
    pub conversations: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "services", default)]
    pub service_statuses: BTreeMap<String, String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }

    /// Names of services not reporting `operational`.
    pub fn degraded_services(&self) -> Vec<&str> {
        self.service_statuses
            .iter()
            .filter(|(_, status)| status.as_str() != "operational")
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// ISO-8601 timestamps as the service emits them: with an offset, or naive
/// (Python `isoformat()`), the latter read as UTC.
pub mod timestamp {
    use super::*;
    use serde::Deserializer;

    const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid ISO-8601 timestamp: {raw}"))
        })
    }
}
