// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # uaview-core
//!
//! Client-side core of an OPC UA address-space explorer.
//!
//! - **Browse**: lazy, continuation-paginated discovery of the node hierarchy
//!   with classification and deterministic sibling ordering
//! - **Tree**: arena-backed cache of discovered entries with bracketed updates
//! - **Subscription**: monitored items bound to consumer slots, with stale
//!   generation filtering
//! - **Dispatch**: thread-affine forwarding of session callbacks
//! - **Writer**: attribute writes
//! - **Config / Logging**: file and environment configuration, subscriber setup
//!
//! The network session is injected through the [`Session`] trait.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use uaview_core::{BrowseEngine, DispatchBridge, SubscriptionManager, TreeCache};
//!
//! let session = Arc::new(my_session);
//! let engine = BrowseEngine::new(Arc::clone(&session));
//! let mut tree = TreeCache::new();
//! engine.browse(&mut tree, None).await;
//!
//! let (bridge, mut dispatch) = DispatchBridge::new();
//! let manager = SubscriptionManager::new(session, bridge);
//! let handle = manager.create_default_subscription().await?;
//! // on the UI thread, each frame:
//! dispatch.run_pending();
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod error;
pub mod session;
pub mod types;

// =============================================================================
// Browse Modules
// =============================================================================

pub mod browse;
pub mod tree;

// =============================================================================
// Subscription Modules
// =============================================================================

pub mod dispatch;
pub mod subscription;
pub mod writer;

// =============================================================================
// Ambient Modules
// =============================================================================

pub mod config;
pub mod logging;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::{
    BindError, BindResult, BrowseError, BrowseResult, ConfigError, ConfigResult, DispatchError,
    ErrorCode, ErrorSeverity, SessionError, SessionResult, UaViewError, UaViewResult,
};
pub use types::{
    well_known, AttributeId, BrowseDirection, ExpandedNodeId, NamespaceTable, NodeClass, NodeId,
    StatusCode, UaValue,
};

pub use browse::{
    classify, BrowseCancel, BrowseEngine, BrowseEvent, BrowseListener, BrowseOutcome, Category,
    ChannelListener, DragPayload, NodeRef,
};
pub use session::{
    BrowsePage, BrowseRequest, ConnectionStatus, ContinuationPoint, DataChangeRecord,
    MonitoredItemRequest, Session, WriteValue,
};
pub use tree::{EntryId, EntryPayload, TreeCache, TreeEntry, TreeObserver, UpdateScope};

pub use dispatch::{DispatchBridge, DispatchLoop};
pub use subscription::{
    BindTarget, ConsumerSlot, DataChangeSink, MonitoredBinding, SubscriptionHandle,
    SubscriptionManager, SubscriptionStats, VisualState,
};
pub use writer::ValueWriter;

pub use config::{BrowseSettings, ConfigLoader, ExplorerConfig, SubscriptionSettings};
pub use logging::{init_logging, LogFormat};
