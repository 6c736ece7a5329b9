//! Delivery seam — decouples the scheduler from chat transports.
//!
//! The scheduler never talks to a messaging platform directly. It renders a
//! notification, resolves the raw session key and hands the message to a
//! [`Notifier`]. The production wiring forwards onto an mpsc channel drained
//! by the host process; tests plug in a recording double.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::reminder::types::ReminderRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Raw (deisolated) session key the message is addressed to.
    pub session_key: String,
    pub content: String,
    /// Task = an instruction for the assistant to execute; reminder = a
    /// notification for the user.
    pub is_task: bool,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Sends a rendered notification to its chat session.
///
/// Implementations may rephrase the content through an LLM before sending;
/// the scheduler guarantees exactly one call per due occurrence.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: OutboundMessage) -> anyhow::Result<()>;
}

/// Forwards outbound messages onto an mpsc channel.
pub struct ChannelNotifier {
    tx: mpsc::Sender<OutboundMessage>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<OutboundMessage>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn deliver(&self, message: OutboundMessage) -> anyhow::Result<()> {
        self.tx
            .send(message)
            .await
            .map_err(|e| anyhow!("outbound channel closed: {e}"))
    }
}

/// Plain-text rendering used when no LLM phrasing is available.
pub fn render_notification(record: &ReminderRecord) -> String {
    if record.is_task {
        format!("Execute the scheduled task now: {}", record.text)
    } else {
        format!("⏰ Reminder: {}", record.text)
    }
}
