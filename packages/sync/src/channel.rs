//! # Cross-Tab Broadcast
//!
//! One named channel per campaign (`"campaign:{id}"`). Every tab editing the
//! campaign joins it and publishes its document after each accepted change.
//! Receivers replace their own document with the newest one they see (last
//! write wins, no merge).
//!
//! The payload is the document JSON and nothing else: no history, no
//! selection, no save-in-flight flag. The sender's [`TabId`] rides alongside
//! only so a tab can skip its own messages.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use campaign_model::{CampaignConfig, ModelError};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use uuid::Uuid;

use crate::config::DEFAULT_CHANNEL_CAPACITY;
use crate::SyncError;

/// Identity of one joined tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(Uuid);

impl TabId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0.simple())
    }
}

/// A message on a campaign channel
#[derive(Debug, Clone)]
pub struct Envelope {
    pub origin: TabId,

    /// Serialized `CampaignConfig`
    pub payload: Arc<str>,
}

impl Envelope {
    pub fn decode(&self) -> Result<CampaignConfig, ModelError> {
        let document = CampaignConfig::from_json(&self.payload)?;
        document.validate()?;
        Ok(document)
    }
}

/// Registry of per-campaign channels shared by every tab of a process
#[derive(Debug)]
pub struct BroadcastHub {
    capacity: usize,
    channels: RwLock<HashMap<String, broadcast::Sender<Envelope>>>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: RwLock::new(HashMap::new()),
        }
    }

    pub fn channel_name(document_id: Uuid) -> String {
        format!("campaign:{}", document_id)
    }

    /// Join the channel for `document_id`, creating it on first use.
    pub fn join(&self, document_id: Uuid) -> TabChannel {
        let name = Self::channel_name(document_id);
        let sender = self.sender(&name);
        let receiver = sender.subscribe();
        let id = TabId::new();
        tracing::debug!(channel = %name, tab = %id, "joined channel");

        TabChannel {
            id,
            name,
            sender,
            receiver,
        }
    }

    /// Number of tabs currently joined to the campaign's channel
    pub fn audience(&self, document_id: Uuid) -> usize {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        channels
            .get(&Self::channel_name(document_id))
            .map_or(0, broadcast::Sender::receiver_count)
    }

    fn sender(&self, name: &str) -> broadcast::Sender<Envelope> {
        {
            let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
            if let Some(sender) = channels.get(name) {
                return sender.clone();
            }
        }

        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// One tab's membership in a campaign channel
#[derive(Debug)]
pub struct TabChannel {
    id: TabId,
    name: String,
    sender: broadcast::Sender<Envelope>,
    receiver: broadcast::Receiver<Envelope>,
}

impl TabChannel {
    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send `document` to the other tabs. Returns how many received it.
    pub fn publish(&self, document: &CampaignConfig) -> Result<usize, SyncError> {
        let envelope = Envelope {
            origin: self.id,
            payload: Arc::from(document.to_json()?),
        };

        // Our own receiver is always subscribed, so a send only fails if the
        // channel is gone; treat that as nobody listening.
        let delivered = self.sender.send(envelope).unwrap_or(0);
        tracing::trace!(channel = %self.name, tab = %self.id, delivered, "published document");
        Ok(delivered.saturating_sub(1))
    }

    /// Drain pending messages and return the newest document from another
    /// tab, if any.
    pub fn try_latest(&mut self) -> Option<CampaignConfig> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => {
                    if let Some(document) = self.accept(&envelope) {
                        latest = Some(document);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %self.name, skipped, "tab fell behind, skipping to newer messages");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        latest
    }

    /// Wait for the next message from another tab, without decoding it.
    pub async fn recv_envelope(&mut self) -> Option<Envelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) if envelope.origin == self.id => continue,
                Ok(envelope) => return Some(envelope),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %self.name, skipped, "tab fell behind, skipping to newer messages");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next decodable document from another tab.
    pub async fn recv(&mut self) -> Option<CampaignConfig> {
        loop {
            let envelope = self.recv_envelope().await?;
            if let Some(document) = self.accept(&envelope) {
                return Some(document);
            }
        }
    }

    fn accept(&self, envelope: &Envelope) -> Option<CampaignConfig> {
        if envelope.origin == self.id {
            return None;
        }
        match envelope.decode() {
            Ok(document) => {
                tracing::trace!(channel = %self.name, from = %envelope.origin, "received document");
                Some(document)
            }
            Err(err) => {
                tracing::warn!(channel = %self.name, from = %envelope.origin, "ignoring undecodable document: {}", err);
                None
            }
        }
    }
}
