//! Ticket-creation flow: runs after a shortcut has been acknowledged.
//!
//! Permalink, summary and project list are fetched concurrently, then the form is opened.
//! Nobody waits on this flow, so every outcome is reported by posting to the channel.

use crate::relay::Relay;
use crate::slack::{
    fallback_permalink, open_ticket_form, FormError, FormMetadata, ShortcutInvocation, SlackApi,
};
use crate::zoho::ZohoError;

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("shortcut has no source message")]
    MissingSource,
    #[error(transparent)]
    Projects(#[from] ZohoError),
    #[error(transparent)]
    Form(#[from] FormError),
}

/// Channel text for a failed flow.
pub fn failure_text(error: &FlowError) -> String {
    format!("❌ Error: {}", error)
}

/// chat.getPermalink, or the locally built archive URL when Slack returns none or errors.
pub async fn resolve_permalink(
    slack: &dyn SlackApi,
    archive_base: &str,
    channel_id: &str,
    message_ts: &str,
) -> String {
    match slack.permalink(channel_id, message_ts).await {
        Ok(Some(link)) => link,
        Ok(None) => fallback_permalink(archive_base, channel_id, message_ts),
        Err(e) => {
            log::debug!("permalink lookup failed, building one: {}", e);
            fallback_permalink(archive_base, channel_id, message_ts)
        }
    }
}

async fn open_form_for(relay: &Relay, invocation: &ShortcutInvocation) -> Result<(), FlowError> {
    let (Some(channel_id), Some(message_ts)) = (
        invocation.channel_id.as_deref(),
        invocation.message_ts.as_deref(),
    ) else {
        return Err(FlowError::MissingSource);
    };

    let (permalink, summary, projects) = tokio::join!(
        resolve_permalink(relay.slack.as_ref(), &relay.archive_base, channel_id, message_ts),
        relay.summarizer.summarize(&invocation.text),
        relay.catalog.projects(),
    );
    let projects = projects?;

    let metadata = FormMetadata {
        channel_id: channel_id.to_string(),
        message_id: message_ts.to_string(),
        permalink,
    };
    open_ticket_form(
        relay.slack.as_ref(),
        &invocation.trigger_id,
        &summary,
        &metadata,
        &projects,
    )
    .await?;
    Ok(())
}

/// Run the whole flow for one shortcut. Failures are posted to the origin channel when it
/// is known and only logged otherwise.
pub async fn run_ticket_creation(relay: &Relay, invocation: ShortcutInvocation) {
    let flow_id = uuid::Uuid::new_v4();
    log::debug!(
        "ticket flow {}: started for channel {:?} message {:?}",
        flow_id,
        invocation.channel_id,
        invocation.message_ts
    );
    let err = match open_form_for(relay, &invocation).await {
        Ok(()) => {
            log::debug!("ticket flow {}: form opened", flow_id);
            return;
        }
        Err(e) => e,
    };
    log::warn!("ticket flow {}: {}", flow_id, err);
    let Some(channel_id) = invocation.channel_id.as_deref() else {
        log::warn!("ticket flow {}: no channel to report to, dropping error", flow_id);
        return;
    };
    if let Err(e) = relay.slack.post_message(channel_id, &failure_text(&err)).await {
        log::warn!("ticket flow {}: failure notification not posted: {}", flow_id, e);
    }
}
