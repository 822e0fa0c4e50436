//! Ticket form submission: create the Zoho task and answer the modal.
//!
//! This is the synchronous reply to Slack's view_submission. Success clears the modal;
//! any failure keeps it open with the error shown under the title field, so the user can
//! retry without losing edits.

use crate::relay::Relay;
use crate::slack::{
    FormMetadata, ViewSubmission, DESCRIPTION_ACTION, DESCRIPTION_BLOCK, PRIORITY_ACTION,
    PRIORITY_BLOCK, PROJECT_ACTION, PROJECT_BLOCK, TITLE_ACTION, TITLE_BLOCK,
};
use crate::zoho::{CreatedTask, Priority, TicketDraft, UnknownPriority, ZohoError};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("missing form field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Priority(#[from] UnknownPriority),
    #[error(transparent)]
    Backend(#[from] ZohoError),
}

/// Body returned to Slack for a view_submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "response_action", rename_all = "snake_case")]
pub enum ViewResponse {
    /// Close the modal (and any stacked views).
    Clear,
    /// Keep the modal open and show messages under the given blocks.
    Errors { errors: BTreeMap<String, String> },
}

impl ViewResponse {
    fn title_error(error: &SubmissionError) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(TITLE_BLOCK.to_string(), format!("Failed: {}", error));
        ViewResponse::Errors { errors }
    }
}

/// Pull the four ticket fields out of the submitted values.
pub fn draft_from_submission(submission: &ViewSubmission) -> Result<TicketDraft, SubmissionError> {
    let field = |block: &str, action: &str, name: &'static str| {
        submission
            .field(block, action)
            .map(str::to_string)
            .ok_or(SubmissionError::MissingField(name))
    };
    let destination_id = field(PROJECT_BLOCK, PROJECT_ACTION, "project")?;
    let title = field(TITLE_BLOCK, TITLE_ACTION, "title")?;
    let description = field(DESCRIPTION_BLOCK, DESCRIPTION_ACTION, "description")?;
    let priority: Priority = field(PRIORITY_BLOCK, PRIORITY_ACTION, "priority")?.parse()?;
    Ok(TicketDraft {
        title,
        description,
        priority,
        destination_id,
    })
}

/// Channel text announcing a created ticket.
pub fn confirmation_text(title: &str, task: &CreatedTask) -> String {
    format!(
        "✅ Ticket created!\n*{}*\n<{}|View in Zoho Projects>",
        title, task.url
    )
}

async fn create_ticket(
    relay: &Relay,
    submission: &ViewSubmission,
) -> Result<(TicketDraft, CreatedTask), SubmissionError> {
    let draft = draft_from_submission(submission)?;
    let task = relay.tickets.create_task(&draft).await?;
    Ok((draft, task))
}

/// Handle one submission. The ticket is authoritative: once created, a failed confirmation
/// post is only logged and the modal is still cleared.
pub async fn handle_submission(relay: &Relay, submission: ViewSubmission) -> ViewResponse {
    let (draft, task) = match create_ticket(relay, &submission).await {
        Ok(created) => created,
        Err(e) => {
            log::warn!("ticket submission failed: {}", e);
            return ViewResponse::title_error(&e);
        }
    };

    let metadata = FormMetadata::decode(&submission.private_metadata);
    if metadata.channel_id.is_empty() {
        log::warn!("ticket {} created but form metadata has no channel; not confirming", task.id);
    } else if let Err(e) = relay
        .slack
        .post_message(&metadata.channel_id, &confirmation_text(&draft.title, &task))
        .await
    {
        log::warn!("ticket {} created but confirmation not posted: {}", task.id, e);
    }
    ViewResponse::Clear
}
