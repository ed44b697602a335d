// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Notifications from the browse engine to the presentation layer.

use tokio::sync::mpsc;

use crate::tree::EntryId;
use crate::types::NodeId;

/// Receives selection, activation and status notifications.
///
/// Every browse call produces exactly one `status` notification.
pub trait BrowseListener: Send + Sync {
    /// The selected entry changed.
    fn selection_changed(&self, _entry: Option<EntryId>) {}

    /// A Variable entry was activated. Carries the resolved canonical id.
    fn node_activated(&self, _node_id: &NodeId) {}

    /// Outcome of a browse call.
    fn status(&self, _text: &str, _success: bool) {}
}

/// Listener that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl BrowseListener for NullListener {}

// =============================================================================
// BrowseEvent / ChannelListener
// =============================================================================

/// Owned form of a listener notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseEvent {
    /// See [`BrowseListener::selection_changed`].
    SelectionChanged(Option<EntryId>),
    /// See [`BrowseListener::node_activated`].
    NodeActivated(NodeId),
    /// See [`BrowseListener::status`].
    Status {
        /// Human-readable message.
        text: String,
        /// Whether the browse succeeded.
        success: bool,
    },
}

/// A channel-based listener.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    sender: mpsc::UnboundedSender<BrowseEvent>,
}

impl ChannelListener {
    /// Creates a listener and the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BrowseEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: BrowseEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Browse event receiver dropped");
        }
    }
}

impl BrowseListener for ChannelListener {
    fn selection_changed(&self, entry: Option<EntryId>) {
        self.send(BrowseEvent::SelectionChanged(entry));
    }

    fn node_activated(&self, node_id: &NodeId) {
        self.send(BrowseEvent::NodeActivated(node_id.clone()));
    }

    fn status(&self, text: &str, success: bool) {
        self.send(BrowseEvent::Status {
            text: text.to_string(),
            success,
        });
    }
}
