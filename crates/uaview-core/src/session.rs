// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The session capability consumed by the browse engine and the subscription
//! manager.
//!
//! Network transport, secure channels, encoding and reconnect handling all
//! live behind [`Session`]. The core only issues the calls listed here and
//! receives the session through dependency injection:
//!
//! ```text
//! ┌───────────────┐   browse_first / browse_next    ┌───────────────┐
//! │ BrowseEngine  │ ──────────────────────────────▶ │               │
//! └───────────────┘                                 │    Session    │
//! ┌───────────────┐   create_subscription / items   │  (external)   │
//! │ Subscription  │ ──────────────────────────────▶ │               │
//! │   Manager     │ ◀────────────────────────────── │               │
//! └───────────────┘   DataChangeSink (any thread)   └───────────────┘
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::browse::NodeRef;
use crate::error::SessionResult;
use crate::subscription::DataChangeSink;
use crate::types::{
    result_mask, well_known, AttributeId, BrowseDirection, NamespaceTable, NodeId, StatusCode,
    UaValue,
};

// =============================================================================
// Browse Requests
// =============================================================================

/// Default number of references requested per browse page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Parameters of the first browse call for a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseRequest {
    /// Reference direction.
    pub direction: BrowseDirection,
    /// Reference type filter.
    pub reference_type_id: NodeId,
    /// Whether subtypes of the reference type match.
    pub include_subtypes: bool,
    /// Node class filter (0 = all classes).
    pub node_class_mask: u32,
    /// Requested reference fields.
    pub result_mask: u32,
    /// Page size hint for the server.
    pub max_references: u32,
}

impl BrowseRequest {
    /// Forward hierarchical references of every node class, all fields.
    pub fn hierarchical() -> Self {
        Self {
            direction: BrowseDirection::Forward,
            reference_type_id: well_known::HIERARCHICAL_REFERENCES,
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: result_mask::ALL,
            max_references: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the page size hint.
    pub fn with_max_references(mut self, max_references: u32) -> Self {
        self.max_references = max_references;
        self
    }
}

impl Default for BrowseRequest {
    fn default() -> Self {
        Self::hierarchical()
    }
}

/// Opaque server-issued pagination cursor.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContinuationPoint(pub Vec<u8>);

impl ContinuationPoint {
    /// Creates a continuation point from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ContinuationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContinuationPoint({} bytes)", self.0.len())
    }
}

/// One page of browse results.
#[derive(Debug, Clone, Default)]
pub struct BrowsePage {
    /// References in server order.
    pub references: Vec<NodeRef>,
    /// Cursor for the next page, `None` when the result set is complete.
    pub continuation: Option<ContinuationPoint>,
}

impl BrowsePage {
    /// Creates a final page.
    pub fn last(references: Vec<NodeRef>) -> Self {
        Self {
            references,
            continuation: None,
        }
    }

    /// Creates a page followed by more results.
    pub fn partial(references: Vec<NodeRef>, continuation: ContinuationPoint) -> Self {
        Self {
            references,
            continuation: Some(continuation),
        }
    }
}

// =============================================================================
// Write / Monitoring Requests
// =============================================================================

/// A value to write to a node attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteValue {
    /// Target node (canonical).
    pub node_id: NodeId,
    /// Target attribute.
    pub attribute: AttributeId,
    /// Value to write.
    pub value: UaValue,
}

impl WriteValue {
    /// Creates a write of the Value attribute.
    pub fn value(node_id: NodeId, value: impl Into<UaValue>) -> Self {
        Self {
            node_id,
            attribute: AttributeId::Value,
            value: value.into(),
        }
    }
}

/// A monitored item to register on a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredItemRequest {
    /// Monitored node (canonical).
    pub node_id: NodeId,
    /// Monitored attribute.
    pub attribute: AttributeId,
    /// Client handle echoed back in every data change.
    pub client_handle: u32,
    /// Requested sampling interval.
    pub sampling_interval: Duration,
}

/// One value change delivered by a subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChangeRecord {
    /// Client handle of the monitored item.
    pub client_handle: u32,
    /// Decoded value.
    pub value: UaValue,
    /// Status attached to the value.
    pub status: StatusCode,
    /// Source timestamp, when reported.
    pub source_timestamp: Option<DateTime<Utc>>,
}

impl DataChangeRecord {
    /// Creates a good-status record.
    pub fn good(client_handle: u32, value: impl Into<UaValue>) -> Self {
        Self {
            client_handle,
            value: value.into(),
            status: StatusCode::GOOD,
            source_timestamp: Some(Utc::now()),
        }
    }

    /// Creates a record carrying only a status.
    pub fn with_status(client_handle: u32, status: StatusCode) -> Self {
        Self {
            client_handle,
            value: UaValue::Null,
            status,
            source_timestamp: None,
        }
    }
}

/// Connection status reported by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// The session is connected and usable.
    Connected,
    /// The session is closed.
    Disconnected,
    /// The connection dropped and the session is reconnecting.
    Interrupted,
}

// =============================================================================
// Session Trait
// =============================================================================

/// Capability handle of an established client session.
///
/// Implementations must be `Send + Sync`. Data changes may be delivered to a
/// [`DataChangeSink`] from any thread; the sink marshals them onto the owning
/// thread itself.
#[async_trait]
pub trait Session: Send + Sync {
    /// Browses a node and returns the first page of references.
    async fn browse_first(&self, node_id: &NodeId, request: &BrowseRequest)
        -> SessionResult<BrowsePage>;

    /// Fetches the next page for a continuation point.
    async fn browse_next(&self, continuation: &ContinuationPoint) -> SessionResult<BrowsePage>;

    /// Returns a snapshot of the namespace table.
    fn namespace_table(&self) -> NamespaceTable;

    /// Writes attribute values, returning one status per value.
    async fn write(&self, values: &[WriteValue]) -> SessionResult<Vec<StatusCode>>;

    /// Creates a subscription delivering change batches to `sink`.
    ///
    /// Returns the server-assigned subscription id.
    async fn create_subscription(
        &self,
        publishing_interval: Duration,
        sink: DataChangeSink,
    ) -> SessionResult<u32>;

    /// Registers monitored items, returning one status per item.
    async fn create_monitored_items(
        &self,
        subscription_id: u32,
        items: &[MonitoredItemRequest],
    ) -> SessionResult<Vec<StatusCode>>;

    /// Deletes a subscription.
    async fn delete_subscription(&self, subscription_id: u32) -> SessionResult<()>;
}

// =============================================================================
// Tests
// =============================================================================
