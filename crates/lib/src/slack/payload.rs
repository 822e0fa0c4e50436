//! Inbound Slack payload decoding.
//!
//! Slack sends either a raw JSON body (Events API, e.g. `url_verification`) or a
//! form-encoded body whose `payload` field holds the JSON (interactivity: shortcuts,
//! view submissions). Both are normalized into one [`InboundEvent`]. Decoding never
//! fails outward: anything unparseable becomes [`InboundEvent::Unrecognized`].

use serde::Deserialize;
use std::collections::HashMap;

/// One decoded inbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Endpoint ownership check; reply with the challenge verbatim.
    UrlVerification { challenge: String },
    /// Message shortcut (`shortcut` or `message_action`); starts ticket creation in the background.
    Shortcut(ShortcutInvocation),
    /// Modal submitted by the user.
    ViewSubmission(ViewSubmission),
    /// Missing or unknown `type`, or a body that did not decode.
    Unrecognized,
}

/// The message a shortcut was invoked on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutInvocation {
    pub channel_id: Option<String>,
    pub message_ts: Option<String>,
    pub text: String,
    pub trigger_id: String,
}

/// Field values and private metadata from a submitted modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSubmission {
    /// block_id -> action_id -> element state.
    pub values: HashMap<String, HashMap<String, FieldState>>,
    /// Opaque blob set when the modal was opened; echoed back unchanged.
    pub private_metadata: String,
}

/// State of one input element in `view.state.values`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldState {
    /// Text inputs.
    #[serde(default)]
    pub value: Option<String>,
    /// Selects.
    #[serde(default)]
    pub selected_option: Option<SelectedOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

impl FieldState {
    /// Text value for inputs, or the selected option value for selects.
    pub fn as_text(&self) -> Option<&str> {
        self.value
            .as_deref()
            .or_else(|| self.selected_option.as_ref().map(|o| o.value.as_str()))
    }
}

impl ViewSubmission {
    /// Value at `block_id` / `action_id`, if the client sent one.
    pub fn field(&self, block_id: &str, action_id: &str) -> Option<&str> {
        self.values
            .get(block_id)
            .and_then(|b| b.get(action_id))
            .and_then(FieldState::as_text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePayload {
    UrlVerification {
        #[serde(default)]
        challenge: String,
    },
    Shortcut(WireAction),
    MessageAction(WireAction),
    ViewSubmission {
        view: WireView,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct WireAction {
    #[serde(default)]
    trigger_id: String,
    #[serde(default)]
    message: Option<WireMessage>,
    #[serde(default)]
    message_ts: Option<String>,
    #[serde(default)]
    channel: Option<WireChannel>,
    #[serde(default)]
    channel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireMessage {
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireChannel {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireView {
    #[serde(default)]
    state: WireViewState,
    #[serde(default)]
    private_metadata: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireViewState {
    #[serde(default)]
    values: HashMap<String, HashMap<String, FieldState>>,
}

impl From<WireAction> for ShortcutInvocation {
    fn from(a: WireAction) -> Self {
        let (message_ts, text) = match a.message {
            Some(m) => (m.ts, m.text),
            None => (None, None),
        };
        Self {
            channel_id: a.channel.and_then(|c| c.id).or(a.channel_id),
            message_ts: message_ts.or(a.message_ts),
            text: text.unwrap_or_default(),
            trigger_id: a.trigger_id,
        }
    }
}

/// Turn a raw request body into a JSON value. JSON bodies (starting with `{`) are parsed
/// directly; otherwise the body is read as form data and its `payload` field parsed.
/// Anything missing or malformed yields an empty object.
pub fn parse_payload(body: &str) -> serde_json::Value {
    let empty = || serde_json::Value::Object(serde_json::Map::new());
    let parsed = if body.starts_with('{') {
        serde_json::from_str(body)
    } else {
        let payload = url::form_urlencoded::parse(body.as_bytes())
            .find(|(k, _)| k == "payload")
            .map(|(_, v)| v.into_owned());
        match payload {
            Some(p) => serde_json::from_str(&p),
            None => return empty(),
        }
    };
    match parsed {
        Ok(v) => v,
        Err(e) => {
            log::debug!("payload decode failed: {}", e);
            empty()
        }
    }
}

/// Decode a raw request body into an event.
pub fn decode_event(body: &str) -> InboundEvent {
    InboundEvent::from_value(parse_payload(body))
}

impl InboundEvent {
    /// Classify a decoded payload by its `type` field.
    pub fn from_value(value: serde_json::Value) -> Self {
        let wire: WirePayload = match serde_json::from_value(value) {
            Ok(w) => w,
            Err(e) => {
                log::debug!("unrecognized payload: {}", e);
                return InboundEvent::Unrecognized;
            }
        };
        match wire {
            WirePayload::UrlVerification { challenge } => {
                InboundEvent::UrlVerification { challenge }
            }
            WirePayload::Shortcut(a) | WirePayload::MessageAction(a) => {
                InboundEvent::Shortcut(a.into())
            }
            WirePayload::ViewSubmission { view } => InboundEvent::ViewSubmission(ViewSubmission {
                values: view.state.values,
                private_metadata: view.private_metadata.unwrap_or_default(),
            }),
            WirePayload::Other => InboundEvent::Unrecognized,
        }
    }
}
