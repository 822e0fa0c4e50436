//! Gateway: the Slack webhook endpoint and its background flow worker.
//!
//! Handshakes and form submissions are answered inline. Shortcuts are acknowledged at
//! once and their ticket-creation flow runs on the worker.

mod server;
mod worker;

pub use server::{router, run_gateway, serve, GatewayState, ACTIVE_TEXT};
pub use worker::{spawn_worker, FlowQueue};
