//! Ticket form (Slack modal): build the view pre-filled from a summary and open it.
//!
//! The origin channel, message ts and permalink ride along as the view's
//! `private_metadata` and come back unchanged with the submission.

use super::api::{SlackApi, SlackError};
use crate::summarize::SummaryResult;
use crate::zoho::{Priority, ReferenceItem};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const CALLBACK_ID: &str = "create_ticket_modal";

pub const PROJECT_BLOCK: &str = "project_block";
pub const PROJECT_ACTION: &str = "project_input";
pub const TITLE_BLOCK: &str = "title_block";
pub const TITLE_ACTION: &str = "title_input";
pub const DESCRIPTION_BLOCK: &str = "description_block";
pub const DESCRIPTION_ACTION: &str = "description_input";
pub const PRIORITY_BLOCK: &str = "priority_block";
pub const PRIORITY_ACTION: &str = "priority_input";

/// Slack caps static_select at 100 options and option text at 75 characters.
pub const MAX_PROJECT_OPTIONS: usize = 100;
pub const MAX_OPTION_LABEL_CHARS: usize = 75;

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("encoding form metadata: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Modal failed: {0}")]
    Rejected(String),
    #[error(transparent)]
    Slack(SlackError),
}

impl From<SlackError> for FormError {
    fn from(e: SlackError) -> Self {
        match e {
            SlackError::Api(code) => FormError::Rejected(code),
            other => FormError::Slack(other),
        }
    }
}

/// Where a ticket came from; threaded through the modal so the submission can report back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormMetadata {
    pub channel_id: String,
    pub message_id: String,
    pub permalink: String,
}

impl FormMetadata {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode the echoed blob. Empty or malformed metadata yields the default (empty) value.
    pub fn decode(blob: &str) -> Self {
        if blob.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(blob).unwrap_or_else(|e| {
            log::warn!("form metadata did not decode, ignoring: {}", e);
            Self::default()
        })
    }
}

fn plain_text(text: &str) -> Value {
    json!({ "type": "plain_text", "text": text })
}

fn option(label: &str, value: &str) -> Value {
    json!({ "text": plain_text(label), "value": value })
}

/// Description pre-fill: summary followed by a separator and the source permalink.
pub fn description_with_backlink(description: &str, permalink: &str) -> String {
    format!("{}\n\n---\nSlack Thread: {}", description, permalink)
}

/// Build the modal view: project select, title, description, and priority.
pub fn build_ticket_view(
    summary: &SummaryResult,
    metadata: &FormMetadata,
    projects: &[ReferenceItem],
) -> Result<Value, FormError> {
    let project_options: Vec<Value> = projects
        .iter()
        .take(MAX_PROJECT_OPTIONS)
        .map(|p| {
            let label: String = p.name.chars().take(MAX_OPTION_LABEL_CHARS).collect();
            option(&label, &p.id)
        })
        .collect();
    let priority_options: Vec<Value> = Priority::ALL
        .iter()
        .map(|p| option(p.as_str(), p.as_str()))
        .collect();
    let default_priority = Priority::default().as_str();

    Ok(json!({
        "type": "modal",
        "callback_id": CALLBACK_ID,
        "title": plain_text("Create Zoho Ticket"),
        "submit": plain_text("Create Ticket"),
        "close": plain_text("Cancel"),
        "private_metadata": metadata.encode()?,
        "blocks": [
            {
                "type": "input",
                "block_id": PROJECT_BLOCK,
                "element": {
                    "type": "static_select",
                    "action_id": PROJECT_ACTION,
                    "placeholder": plain_text("Select a project"),
                    "options": project_options,
                },
                "label": plain_text("Project"),
            },
            {
                "type": "input",
                "block_id": TITLE_BLOCK,
                "element": {
                    "type": "plain_text_input",
                    "action_id": TITLE_ACTION,
                    "initial_value": summary.title,
                    "placeholder": plain_text("Ticket title"),
                },
                "label": plain_text("Title"),
            },
            {
                "type": "input",
                "block_id": DESCRIPTION_BLOCK,
                "element": {
                    "type": "plain_text_input",
                    "action_id": DESCRIPTION_ACTION,
                    "multiline": true,
                    "initial_value": description_with_backlink(&summary.description, &metadata.permalink),
                    "placeholder": plain_text("Ticket description"),
                },
                "label": plain_text("Description"),
            },
            {
                "type": "input",
                "block_id": PRIORITY_BLOCK,
                "element": {
                    "type": "static_select",
                    "action_id": PRIORITY_ACTION,
                    "initial_option": option(default_priority, default_priority),
                    "options": priority_options,
                },
                "label": plain_text("Priority"),
            }
        ]
    }))
}

/// Build the view and ask Slack to open it for `trigger_id`.
pub async fn open_ticket_form(
    slack: &dyn SlackApi,
    trigger_id: &str,
    summary: &SummaryResult,
    metadata: &FormMetadata,
    projects: &[ReferenceItem],
) -> Result<(), FormError> {
    let view = build_ticket_view(summary, metadata, projects)?;
    slack.open_view(trigger_id, &view).await?;
    log::info!(
        "ticket form opened for message {} in {} ({} project option(s))",
        metadata.message_id,
        metadata.channel_id,
        projects.len().min(MAX_PROJECT_OPTIONS)
    );
    Ok(())
}
