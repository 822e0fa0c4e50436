//! In-memory fakes for the upstream seams, shared by unit tests.

use crate::cache::MemoryCache;
use crate::llm::{LlmError, TextGenerator};
use crate::relay::Relay;
use crate::slack::{SlackApi, SlackError};
use crate::zoho::{CreatedTask, ReferenceItem, TicketBackend, TicketDraft, ZohoError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct FakeSlack {
    permalink: Option<String>,
    reject_views: Option<String>,
    fail_posts: bool,
    posted: Mutex<Vec<(String, String)>>,
    views: Mutex<Vec<(String, Value)>>,
}

impl FakeSlack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_views(code: &str) -> Self {
        Self {
            reject_views: Some(code.to_string()),
            ..Self::default()
        }
    }

    pub fn with_permalink(mut self, link: &str) -> Self {
        self.permalink = Some(link.to_string());
        self
    }

    pub fn failing_posts(mut self) -> Self {
        self.fail_posts = true;
        self
    }

    pub fn posted_messages(&self) -> Vec<(String, String)> {
        self.posted.lock().expect("lock").clone()
    }

    pub fn opened_views(&self) -> Vec<(String, Value)> {
        self.views.lock().expect("lock").clone()
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn permalink(&self, _channel_id: &str, _message_ts: &str) -> Result<Option<String>, SlackError> {
        Ok(self.permalink.clone())
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackError> {
        if self.fail_posts {
            return Err(SlackError::Api("channel_not_found".to_string()));
        }
        self.posted
            .lock()
            .expect("lock")
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn open_view(&self, trigger_id: &str, view: &Value) -> Result<(), SlackError> {
        if let Some(code) = &self.reject_views {
            return Err(SlackError::Api(code.clone()));
        }
        self.views
            .lock()
            .expect("lock")
            .push((trigger_id.to_string(), view.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTickets {
    projects: Vec<ReferenceItem>,
    fail_list: bool,
    create_error: Option<String>,
    list_calls: AtomicUsize,
    created: Mutex<Vec<TicketDraft>>,
}

impl FakeTickets {
    pub fn with_projects(projects: &[(&str, &str)]) -> Self {
        Self {
            projects: projects
                .iter()
                .map(|(id, name)| ReferenceItem {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing_list() -> Self {
        Self {
            fail_list: true,
            ..Self::default()
        }
    }

    pub fn failing_create(message: &str) -> Self {
        Self {
            create_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<TicketDraft> {
        self.created.lock().expect("lock").clone()
    }
}

#[async_trait]
impl TicketBackend for FakeTickets {
    async fn list_active_projects(&self) -> Result<Vec<ReferenceItem>, ZohoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(ZohoError::FetchFailed);
        }
        Ok(self.projects.clone())
    }

    async fn create_task(&self, draft: &TicketDraft) -> Result<CreatedTask, ZohoError> {
        if let Some(message) = &self.create_error {
            return Err(ZohoError::TaskCreate(message.clone()));
        }
        let mut created = self.created.lock().expect("lock");
        created.push(draft.clone());
        let id = format!("T{}", created.len());
        Ok(CreatedTask {
            url: format!("https://projects.example/{}", id),
            id,
        })
    }
}

pub struct FakeGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
    budgets: Mutex<Vec<u32>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
            budgets: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
            budgets: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock").clone()
    }

    /// `max_tokens` of each call, in order.
    pub fn token_budgets(&self) -> Vec<u32> {
        self.budgets.lock().expect("lock").clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        self.prompts.lock().expect("lock").push(prompt.to_string());
        self.budgets.lock().expect("lock").push(max_tokens);
        self.reply
            .clone()
            .ok_or_else(|| LlmError::Api("model unavailable".to_string()))
    }
}

/// A relay over the given fakes with a fresh in-memory cache.
pub fn relay_with(slack: Arc<FakeSlack>, tickets: Arc<FakeTickets>, generator: Arc<FakeGenerator>) -> Relay {
    Relay::new(
        slack,
        tickets,
        generator,
        Arc::new(MemoryCache::new()),
        Duration::from_secs(3600),
    )
}
