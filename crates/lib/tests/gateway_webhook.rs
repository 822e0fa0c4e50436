//! Integration test: run the gateway on a free port with fake upstreams and drive it the way
//! Slack does (url-encoded `payload=` bodies for interactions, JSON for the handshake).

use async_trait::async_trait;
use lib::cache::MemoryCache;
use lib::gateway::{self, ACTIVE_TEXT};
use lib::llm::{LlmError, TextGenerator};
use lib::relay::Relay;
use lib::slack::{SlackApi, SlackError};
use lib::zoho::{CreatedTask, ReferenceItem, TicketBackend, TicketDraft, ZohoError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Default)]
struct RecordingSlack {
    posted: Mutex<Vec<(String, String)>>,
    views: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl SlackApi for RecordingSlack {
    async fn permalink(&self, _channel: &str, _ts: &str) -> Result<Option<String>, SlackError> {
        Ok(Some("https://team.slack.com/archives/C1/p123".to_string()))
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackError> {
        self.posted
            .lock()
            .expect("lock")
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn open_view(&self, trigger_id: &str, view: &Value) -> Result<(), SlackError> {
        self.views
            .lock()
            .expect("lock")
            .push((trigger_id.to_string(), view.clone()));
        Ok(())
    }
}

struct StubTickets {
    list_fails: bool,
    created: Mutex<Vec<TicketDraft>>,
}

#[async_trait]
impl TicketBackend for StubTickets {
    async fn list_active_projects(&self) -> Result<Vec<ReferenceItem>, ZohoError> {
        if self.list_fails {
            return Err(ZohoError::FetchFailed);
        }
        Ok(vec![ReferenceItem {
            id: "P1".to_string(),
            name: "Website".to_string(),
        }])
    }

    async fn create_task(&self, draft: &TicketDraft) -> Result<CreatedTask, ZohoError> {
        self.created.lock().expect("lock").push(draft.clone());
        Ok(CreatedTask {
            id: "T9".to_string(),
            url: "https://projects.zoho.com/portal/acme#taskdetail/P1/T9".to_string(),
        })
    }
}

struct CannedModel;

#[async_trait]
impl TextGenerator for CannedModel {
    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        Ok("TITLE: Fix login bug\nDESCRIPTION:\n- login fails on submit".to_string())
    }
}

/// A model that never answers.
struct HungModel;

#[async_trait]
impl TextGenerator for HungModel {
    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        std::future::pending().await
    }
}

struct Harness {
    base: String,
    slack: Arc<RecordingSlack>,
    tickets: Arc<StubTickets>,
    stop: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl Harness {
    async fn start(list_fails: bool) -> Self {
        Self::start_with_model(list_fails, Arc::new(CannedModel)).await
    }

    async fn start_with_model(list_fails: bool, model: Arc<dyn TextGenerator>) -> Self {
        let slack = Arc::new(RecordingSlack::default());
        let tickets = Arc::new(StubTickets {
            list_fails,
            created: Mutex::new(Vec::new()),
        });
        let relay = Relay::new(
            slack.clone(),
            tickets.clone(),
            model,
            Arc::new(MemoryCache::new()),
            Duration::from_secs(3600),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind free port");
        let base = format!("http://{}", listener.local_addr().expect("local_addr"));
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(gateway::serve(listener, Arc::new(relay), async move {
            let _ = stopped.await;
        }));
        Self {
            base,
            slack,
            tickets,
            stop: Some(stop),
            server,
        }
    }

    async fn post_interaction(&self, payload: &Value) -> reqwest::Response {
        let body: String = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("payload", &payload.to_string())
            .finish();
        reqwest::Client::new()
            .post(format!("{}/slack/events", self.base))
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("post interaction")
    }

    async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.server
            .await
            .expect("server task joins")
            .expect("server exits cleanly");
    }
}

fn shortcut_payload() -> Value {
    json!({
        "type": "message_action",
        "trigger_id": "trig-1",
        "channel": { "id": "C1" },
        "message": { "ts": "123.45", "text": "Fix the *login* bug" }
    })
}

#[tokio::test]
async fn handshake_echoes_challenge() {
    let h = Harness::start(false).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/", h.base))
        .json(&json!({ "type": "url_verification", "challenge": "abc" }))
        .send()
        .await
        .expect("post handshake");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "abc");
    h.shutdown().await;
}

#[tokio::test]
async fn get_and_unknown_events_answer_liveness_text() {
    let h = Harness::start(false).await;
    let resp = reqwest::get(format!("{}/anything", h.base)).await.expect("get");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), ACTIVE_TEXT);

    let resp = h.post_interaction(&json!({ "type": "block_actions" })).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), ACTIVE_TEXT);
    h.shutdown().await;
}

#[tokio::test]
async fn shortcut_is_acknowledged_and_form_opened_in_background() {
    let h = Harness::start(false).await;
    let resp = h.post_interaction(&shortcut_payload()).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "");

    let slack = h.slack.clone();
    // Graceful shutdown drains the flow, so the view is recorded once shutdown returns.
    h.shutdown().await;

    let views = slack.views.lock().expect("lock").clone();
    assert_eq!(views.len(), 1);
    let (trigger, view) = &views[0];
    assert_eq!(trigger, "trig-1");
    assert_eq!(view["callback_id"], "create_ticket_modal");
    let metadata: Value =
        serde_json::from_str(view["private_metadata"].as_str().expect("metadata")).expect("json");
    assert_eq!(
        metadata,
        json!({
            "channelId": "C1",
            "messageId": "123.45",
            "permalink": "https://team.slack.com/archives/C1/p123"
        })
    );
}

#[tokio::test]
async fn shortcut_ack_does_not_wait_for_a_stalled_flow() {
    let h = Harness::start_with_model(false, Arc::new(HungModel)).await;
    for _ in 0..20 {
        let resp = tokio::time::timeout(Duration::from_secs(3), h.post_interaction(&shortcut_payload()))
            .await
            .expect("shortcut acknowledged before the flow finishes");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.expect("body"), "");
    }
    assert!(h.slack.views.lock().expect("lock").is_empty());
    // The stalled flows would hold a graceful shutdown open forever.
    h.server.abort();
}

#[tokio::test]
async fn submission_creates_ticket_and_clears_form() {
    let h = Harness::start(false).await;
    let submission = json!({
        "type": "view_submission",
        "view": {
            "private_metadata": "{\"channelId\":\"C1\",\"messageId\":\"123.45\",\"permalink\":\"https://x\"}",
            "state": { "values": {
                "project_block": { "project_input": { "selected_option": { "value": "P1" } } },
                "title_block": { "title_input": { "value": "Fix login bug" } },
                "description_block": { "description_input": { "value": "- login fails" } },
                "priority_block": { "priority_input": { "selected_option": { "value": "High" } } }
            } }
        }
    });

    let resp = h.post_interaction(&submission).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body, json!({ "response_action": "clear" }));

    let created = h.tickets.created.lock().expect("lock").clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "Fix login bug");
    assert_eq!(created[0].destination_id, "P1");

    let posted = h.slack.posted.lock().expect("lock").clone();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].0, "C1");
    assert!(posted[0]
        .1
        .contains("<https://projects.zoho.com/portal/acme#taskdetail/P1/T9|View in Zoho Projects>"));
    h.shutdown().await;
}

#[tokio::test]
async fn background_failure_is_posted_to_channel() {
    let h = Harness::start(true).await;
    let resp = h.post_interaction(&shortcut_payload()).await;
    assert_eq!(resp.status(), 200);

    let slack = h.slack.clone();
    h.shutdown().await;

    assert!(slack.views.lock().expect("lock").is_empty());
    let posted = slack.posted.lock().expect("lock").clone();
    assert_eq!(
        posted,
        vec![(
            "C1".to_string(),
            "❌ Error: Failed to fetch projects".to_string()
        )]
    );
}
