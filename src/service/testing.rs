//! Scripted [`Gateway`] double for service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use crate::api::Gateway;
use crate::errors::AppError;
use crate::models::{ChatResponse, HealthResponse, HistoryResponse, Statistics};

pub(crate) fn chat_response(answer: &str, sources: &[&str]) -> ChatResponse {
    ChatResponse {
        answer: answer.to_string(),
        sources: sources.iter().map(|s| s.to_string()).collect(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

pub(crate) fn statistics(articles: u64, projects: u64, conversations: u64) -> Statistics {
    Statistics {
        article_count: articles,
        project_count: projects,
        conversation_count: conversations,
        last_updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

#[derive(Default)]
pub(crate) struct ScriptedGateway {
    answers: Mutex<VecDeque<Result<ChatResponse, AppError>>>,
    stats: Mutex<VecDeque<Result<Statistics, AppError>>>,
    answers_by_question: Mutex<HashMap<String, Result<ChatResponse, AppError>>>,
    questions: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
    question_gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_answer(&self, answer: Result<ChatResponse, AppError>) {
        self.answers.lock().unwrap().push_back(answer);
    }

    pub(crate) fn answer_question(&self, question: &str, answer: Result<ChatResponse, AppError>) {
        self.answers_by_question
            .lock()
            .unwrap()
            .insert(question.to_string(), answer);
    }

    /// Makes `question` wait for one `notify_one` on the returned handle.
    pub(crate) fn hold_question(&self, question: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.question_gates
            .lock()
            .unwrap()
            .insert(question.to_string(), notify.clone());
        notify
    }

    pub(crate) fn push_stats(&self, stats: Result<Statistics, AppError>) {
        self.stats.lock().unwrap().push_back(stats);
    }

    pub(crate) fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    /// Makes every later call wait for one `notify_one` on the returned handle.
    pub(crate) fn hold_answers(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    async fn wait_for_release(&self, question: Option<&str>) {
        let gate = question
            .and_then(|q| self.question_gates.lock().unwrap().get(q).cloned())
            .or_else(|| self.gate.lock().unwrap().clone());
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn check_health(&self) -> Result<HealthResponse, AppError> {
        Ok(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            service_statuses: Default::default(),
        })
    }

    async fn ask(&self, question: &str) -> Result<ChatResponse, AppError> {
        self.questions.lock().unwrap().push(question.to_string());
        self.wait_for_release(Some(question)).await;
        let keyed = self.answers_by_question.lock().unwrap().remove(question);
        if let Some(answer) = keyed {
            return answer;
        }
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted answer left")
    }

    async fn fetch_statistics(&self) -> Result<Statistics, AppError> {
        self.wait_for_release(None).await;
        self.stats
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted statistics left")
    }

    async fn fetch_history(&self, date: &str) -> Result<HistoryResponse, AppError> {
        Ok(HistoryResponse { date: date.to_string(), conversations: Vec::new() })
    }
}
