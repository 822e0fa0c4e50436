//! Webhook gateway: a single HTTP endpoint for every Slack interaction.

use crate::config::Config;
use crate::gateway::worker::{spawn_worker, FlowQueue};
use crate::relay::Relay;
use crate::slack::{decode_event, InboundEvent};
use crate::submission::handle_submission;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::Method,
    response::{IntoResponse, Response},
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;

/// Body for GETs and unrecognized events; doubles as a liveness check.
pub const ACTIVE_TEXT: &str = "Slack-Zoho Ticket Creator Active";

#[derive(Clone)]
pub struct GatewayState {
    pub relay: Arc<Relay>,
    /// Sender into the background flow worker.
    pub queue: FlowQueue,
}

/// Every path and method is served by the webhook handler.
pub fn router(state: GatewayState) -> Router {
    Router::new().fallback(webhook).with_state(state)
}

async fn webhook(State(state): State<GatewayState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        return ACTIVE_TEXT.into_response();
    }
    let body = String::from_utf8_lossy(&body);
    match decode_event(&body) {
        InboundEvent::UrlVerification { challenge } => challenge.into_response(),
        InboundEvent::Shortcut(invocation) => {
            if !state.queue.enqueue(invocation).await {
                log::warn!("flow queue closed; shortcut acknowledged but not processed");
            }
            "".into_response()
        }
        InboundEvent::ViewSubmission(submission) => {
            Json(handle_submission(&state.relay, submission).await).into_response()
        }
        InboundEvent::Unrecognized => ACTIVE_TEXT.into_response(),
    }
}

/// Serve on `listener` until `shutdown` completes, then wait for in-flight ticket flows.
pub async fn serve<F>(listener: tokio::net::TcpListener, relay: Arc<Relay>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (queue, worker) = spawn_worker(relay.clone());
    let app = router(GatewayState { relay, queue });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("gateway server exited")?;

    // The router (and with it every queue sender) is gone, so the worker drains and stops.
    if let Err(e) = worker.await {
        log::warn!("ticket flow worker ended abnormally: {}", e);
    }
    Ok(())
}

/// Build the relay from config, bind, and serve until SIGINT/SIGTERM.
pub async fn run_gateway(config: Config) -> Result<()> {
    let relay = Arc::new(Relay::from_config(&config)?);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    serve(listener, relay, shutdown_signal()).await?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, finishing requests and draining ticket flows");
}
