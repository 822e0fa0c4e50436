//! Ticket relay core library: turns a Slack message shortcut into a Zoho Projects task
//! via an LLM-prefilled Slack form. Used by the `ticketrelay` CLI.

pub mod cache;
pub mod config;
pub mod flow;
pub mod gateway;
pub mod llm;
pub mod relay;
pub mod slack;
pub mod submission;
pub mod summarize;
pub mod zoho;

#[cfg(test)]
mod test_support;
