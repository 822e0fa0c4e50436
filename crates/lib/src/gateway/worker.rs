//! Background worker for ticket-creation flows.
//!
//! The webhook handler only enqueues; the worker spawns each flow into a `JoinSet` so flows
//! run concurrently and outlive the HTTP response. When every sender is dropped the worker
//! stops taking work and waits for the flows already running.

use crate::flow::run_ticket_creation;
use crate::relay::Relay;
use crate::slack::ShortcutInvocation;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

const QUEUE_CAPACITY: usize = 64;

/// Sending half handed to the webhook handler.
#[derive(Clone)]
pub struct FlowQueue {
    tx: mpsc::Sender<ShortcutInvocation>,
}

impl FlowQueue {
    /// Queue a flow. Returns false when the worker has already shut down.
    pub async fn enqueue(&self, invocation: ShortcutInvocation) -> bool {
        self.tx.send(invocation).await.is_ok()
    }
}

/// Start the worker. The returned handle completes once the queue is closed and every
/// spawned flow has finished.
pub fn spawn_worker(relay: Arc<Relay>) -> (FlowQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<ShortcutInvocation>(QUEUE_CAPACITY);
    let handle = tokio::spawn(async move {
        let mut flows = JoinSet::new();
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(invocation) => {
                        let relay = relay.clone();
                        flows.spawn(async move {
                            run_ticket_creation(&relay, invocation).await;
                        });
                    }
                    None => break,
                },
                Some(done) = flows.join_next(), if !flows.is_empty() => {
                    if let Err(e) = done {
                        log::warn!("ticket flow task failed: {}", e);
                    }
                }
            }
        }
        if !flows.is_empty() {
            log::info!("draining {} in-flight ticket flow(s)", flows.len());
        }
        while let Some(done) = flows.join_next().await {
            if let Err(e) = done {
                log::warn!("ticket flow task failed: {}", e);
            }
        }
        log::info!("ticket flow worker finished");
    });
    (FlowQueue { tx }, handle)
}
