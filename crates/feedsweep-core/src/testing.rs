//! In-memory fakes shared by unit tests

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::ai::{Completion, TopicProvider};
use crate::document::{Document, Location};
use crate::reader::ReaderApi;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List {
        location: Option<Location>,
        updated_after: Option<DateTime<Utc>>,
    },
    Delete(String),
    Update(String, Location),
}

/// Reader API backed by a fixed document list
#[derive(Default)]
pub struct FakeReader {
    documents: Vec<Document>,
    list_error: Option<String>,
    failing_ids: HashSet<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeReader {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    pub fn failing_list(message: &str) -> Self {
        Self {
            list_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Mutations for these ids fail as if retries were exhausted
    pub fn with_failing_ids(mut self, ids: &[&str]) -> Self {
        self.failing_ids = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutation_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::List { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn mutation_result(&self, id: &str) -> Result<()> {
        if self.failing_ids.contains(id) {
            Err(Error::Api {
                status: 503,
                message: "Service Unavailable".into(),
                retry_after: None,
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl ReaderApi for FakeReader {
    async fn list_documents(
        &self,
        location: Option<Location>,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Document>> {
        self.record(Call::List {
            location,
            updated_after,
        });
        match &self.list_error {
            Some(message) => Err(Error::Other(message.clone())),
            None => Ok(self.documents.clone()),
        }
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        self.record(Call::Delete(id.to_string()));
        self.mutation_result(id)
    }

    async fn update_location(&self, id: &str, location: Location) -> Result<()> {
        self.record(Call::Update(id.to_string(), location));
        self.mutation_result(id)
    }
}

/// Topic provider that replays queued replies
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<Completion>>>,
    fallback: Option<Completion>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<Completion>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Provider that answers every request with `{"matching_ids": ids}`
    pub fn matching(ids: &[&str]) -> Self {
        let body = serde_json::json!({ "matching_ids": ids }).to_string();
        Self {
            fallback: Some(Completion {
                content: Some(body),
                usage: None,
            }),
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_user_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl TopicProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete_json(&self, _system: &str, user: &str) -> Result<Completion> {
        self.prompts.lock().unwrap().push(user.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.clone().map(Ok))
            .unwrap_or_else(|| Err(Error::AiProvider("no scripted reply left".into())))
    }
}
