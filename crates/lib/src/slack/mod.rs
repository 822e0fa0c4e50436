//! Slack side of the relay: inbound payload decoding, the Web API client, and the
//! ticket form.

mod api;
mod form;
mod payload;

pub use api::{fallback_permalink, SlackApi, SlackClient, SlackError};
pub use form::{
    build_ticket_view, description_with_backlink, open_ticket_form, FormError, FormMetadata,
    DESCRIPTION_ACTION, DESCRIPTION_BLOCK, PRIORITY_ACTION, PRIORITY_BLOCK, PROJECT_ACTION,
    PROJECT_BLOCK, TITLE_ACTION, TITLE_BLOCK,
};
pub use payload::{
    decode_event, parse_payload, FieldState, InboundEvent, SelectedOption, ShortcutInvocation,
    ViewSubmission,
};
