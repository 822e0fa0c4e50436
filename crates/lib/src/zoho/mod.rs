//! Zoho Projects: OAuth token refresh, project listing, task creation, and the cached
//! project catalog used to populate the ticket form.

mod client;
mod oauth;
mod projects;

pub use client::ZohoClient;
pub use oauth::ZohoOAuth;
pub use projects::{ProjectCatalog, PROJECTS_CACHE_KEY};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ZohoError {
    #[error("zoho request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Token endpoint answered with an `error` field (or no token).
    #[error("Zoho auth: {0}")]
    Auth(String),
    /// Project list response had no `projects` field.
    #[error("Failed to fetch projects")]
    FetchFailed,
    /// Task creation rejected; carries the remote message.
    #[error("{0}")]
    TaskCreate(String),
}

/// One ticket destination (a Zoho project).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::None, Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::None => "None",
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority: {0}")]
pub struct UnknownPriority(pub String);

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPriority(s.to_string()))
    }
}

/// Task to create, built from the submitted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub destination_id: String,
}

/// A task the backend created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTask {
    pub id: String,
    /// Deep link to the task in the web UI.
    pub url: String,
}

/// Project-tracking backend. Implementations authenticate per call.
#[async_trait]
pub trait TicketBackend: Send + Sync {
    async fn list_active_projects(&self) -> Result<Vec<ReferenceItem>, ZohoError>;
    async fn create_task(&self, draft: &TicketDraft) -> Result<CreatedTask, ZohoError>;
}
