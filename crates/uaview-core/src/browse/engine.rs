// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Lazy, paginated discovery of a node's children.
//!
//! # Browse flow
//!
//! ```text
//!  browse(cache, parent)
//!     │
//!     ├─ resolve target ──────────────── failure ──┐
//!     ├─ fetch decision ── skip ──▶ "Using cached children."
//!     ▼                                            │
//!  clear children (update scope)                   │
//!     │                                            │
//!  browse_first ─▶ browse_next* (cancel checked) ──┤
//!     ▼                                            ▼
//!  commit + browsed + sort (update scope)    restore placeholder
//!     │                                            │
//!  "Browse succeeded." (0)         "An exception occurred ..." (-1)
//! ```
//!
//! Every call emits exactly one status notification.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::classify::classify;
use super::listener::{BrowseListener, NullListener};
use super::node_ref::NodeRef;
use super::stats::BrowseStatistics;
use crate::config::BrowseSettings;
use crate::error::{BrowseError, BrowseResult, UaViewError};
use crate::session::{BrowseRequest, ConnectionStatus, Session};
use crate::tree::{EntryId, EntryPayload, TreeCache};
use crate::types::{well_known, InvalidNodeId, NamespaceTable, NodeClass, NodeId};

/// Status text of a completed fetch.
pub const STATUS_SUCCEEDED: &str = "Browse succeeded.";

/// Status text when cached children are reused.
pub const STATUS_CACHED: &str = "Using cached children.";

/// Prefix of the failure status text.
pub const STATUS_FAILED_PREFIX: &str = "An exception occurred while browsing: ";

// =============================================================================
// BrowseOutcome / BrowseCancel
// =============================================================================

/// Successful result of a browse call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseOutcome {
    /// Children were fetched from the server.
    Fetched {
        /// Number of children committed.
        count: usize,
        /// Number of pages drained.
        pages: usize,
    },
    /// The entry was already browsed; children were left untouched.
    Cached,
}

/// Cancellation token checked between continuation pages.
///
/// Only a request made while a drain runs counts: each fetch discards
/// whatever was pending when it started, and the drain that observes a
/// request consumes it.
#[derive(Debug, Clone, Default)]
pub struct BrowseCancel {
    requested: Arc<AtomicBool>,
}

impl BrowseCancel {
    /// Creates a token with no pending request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of the running drain.
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if a request is pending.
    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }
}

// =============================================================================
// DragPayload
// =============================================================================

/// Data carried by a drag gesture started on a Variable entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DragPayload {
    /// Canonical id of the dragged node.
    pub node_id: NodeId,
    /// Node class of the dragged node.
    pub node_class: NodeClass,
}

impl DragPayload {
    /// Returns the textual drag data, e.g. `ns=3;s="start"`.
    pub fn text(&self) -> String {
        self.node_id.to_opc_string()
    }
}

impl fmt::Display for DragPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl FromStr for DragPayload {
    type Err = InvalidNodeId;

    /// Parses dropped text. Only Variables can be dragged.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            node_id: s.parse()?,
            node_class: NodeClass::Variable,
        })
    }
}

// =============================================================================
// BrowseEngine
// =============================================================================

/// Discovers children on demand and keeps a [`TreeCache`] populated.
pub struct BrowseEngine<S: Session + ?Sized> {
    session: Arc<S>,
    settings: BrowseSettings,
    listener: Arc<dyn BrowseListener>,
    cancel: BrowseCancel,
    stats: Arc<BrowseStatistics>,
}

impl<S: Session + ?Sized> BrowseEngine<S> {
    /// Creates an engine with default settings and no listener.
    pub fn new(session: Arc<S>) -> Self {
        Self {
            session,
            settings: BrowseSettings::default(),
            listener: Arc::new(NullListener),
            cancel: BrowseCancel::new(),
            stats: Arc::new(BrowseStatistics::new()),
        }
    }

    /// Sets the browse settings.
    pub fn with_settings(mut self, settings: BrowseSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the listener receiving status, selection and activation events.
    pub fn with_listener(mut self, listener: Arc<dyn BrowseListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Returns the settings.
    pub fn settings(&self) -> &BrowseSettings {
        &self.settings
    }

    /// Toggles re-fetching of already browsed entries.
    pub fn set_rebrowse_on_expand(&mut self, enabled: bool) {
        self.settings.rebrowse_on_expand = enabled;
    }

    /// Returns a handle that cancels the running drain.
    pub fn cancel_handle(&self) -> BrowseCancel {
        self.cancel.clone()
    }

    /// Returns the statistics.
    pub fn stats(&self) -> &BrowseStatistics {
        &self.stats
    }

    /// Browses `parent` (the server root when `None`).
    ///
    /// Returns `0` on success and `-1` on failure; the detail travels through
    /// the listener's status notification.
    pub async fn browse(&self, cache: &mut TreeCache, parent: Option<EntryId>) -> i32 {
        match self.browse_checked(cache, parent).await {
            Ok(_) => 0,
            Err(_) => -1,
        }
    }

    /// Browses `parent` and returns the typed outcome.
    ///
    /// Emits the same single status notification as [`browse`](Self::browse).
    pub async fn browse_checked(
        &self,
        cache: &mut TreeCache,
        parent: Option<EntryId>,
    ) -> BrowseResult<BrowseOutcome> {
        let result = self.run_browse(cache, parent).await;
        match &result {
            Ok(BrowseOutcome::Fetched { .. }) => self.listener.status(STATUS_SUCCEEDED, true),
            Ok(BrowseOutcome::Cached) => self.listener.status(STATUS_CACHED, true),
            Err(e) => {
                self.stats.record_failure();
                UaViewError::from(e.clone()).log("browse");
                self.listener.status(&format!("{STATUS_FAILED_PREFIX}{e}"), false);
            }
        }
        result
    }

    async fn run_browse(
        &self,
        cache: &mut TreeCache,
        parent: Option<EntryId>,
    ) -> BrowseResult<BrowseOutcome> {
        let namespaces = self.session.namespace_table();
        let (target, node_id, is_root) = resolve_target(cache, parent, &namespaces)?;

        if !self.should_fetch(cache, target, is_root) {
            self.stats.record_skip();
            tracing::debug!(node_id = %node_id, "Using cached children");
            return Ok(BrowseOutcome::Cached);
        }

        let freed = cache.begin_update().clear_children(target);
        tracing::debug!(node_id = %node_id, freed, "Browsing node");

        let (references, pages) = match self.fetch_all(&node_id).await {
            Ok(fetched) => fetched,
            Err(e) => {
                cache.begin_update().restore_placeholder(target);
                return Err(e);
            }
        };

        let count = references.len();
        {
            let mut scope = cache.begin_update();
            let classified = references.into_iter().map(|node| {
                let category = classify(&node, &namespaces);
                (node, category)
            });
            scope
                .replace_children(target, classified)
                .ok_or_else(|| BrowseError::unresolved("tree entry vanished during browse"))?;
            scope.set_browsed(target, true);
            scope.sort_children(target);
        }

        self.stats.record_browse(pages, count);
        tracing::info!(node_id = %node_id, references = count, pages, "Browse completed");

        Ok(BrowseOutcome::Fetched { count, pages })
    }

    fn should_fetch(&self, cache: &TreeCache, target: EntryId, is_root: bool) -> bool {
        if self.settings.rebrowse_on_expand {
            return true;
        }
        if is_root {
            return true;
        }
        let browsed = cache.get(target).is_some_and(|entry| entry.is_browsed());
        !browsed
    }

    async fn fetch_all(&self, node_id: &NodeId) -> BrowseResult<(Vec<NodeRef>, usize)> {
        self.cancel.take();

        let request = BrowseRequest::hierarchical().with_max_references(self.settings.page_size);
        let first = self
            .session
            .browse_first(node_id, &request)
            .await
            .map_err(|e| BrowseError::transport(node_id.to_string(), e))?;

        let mut references = first.references;
        let mut continuation = first.continuation;
        let mut pages = 1;

        while let Some(point) = continuation {
            if self.cancel.take() {
                return Err(BrowseError::cancelled(node_id.to_string(), pages));
            }
            let page = self
                .session
                .browse_next(&point)
                .await
                .map_err(|e| BrowseError::transport(node_id.to_string(), e))?;
            pages += 1;
            tracing::trace!(
                node_id = %node_id,
                page = pages,
                references = page.references.len(),
                "Continuation page received"
            );
            references.extend(page.references);
            continuation = page.continuation;
        }

        Ok((references, pages))
    }

    // =========================================================================
    // Selection / Activation / Drag
    // =========================================================================

    /// Reports a selection change. Unknown ids are reported as no selection.
    pub fn select(&self, cache: &TreeCache, entry: Option<EntryId>) {
        let entry = entry.filter(|id| cache.contains(*id));
        self.listener.selection_changed(entry);
    }

    /// Activates an entry (double click).
    ///
    /// Only non-absolute Variables fire `node_activated`; returns whether the
    /// notification was sent.
    pub fn activate(&self, cache: &TreeCache, entry: EntryId) -> bool {
        match self.live_variable_id(cache, entry) {
            Some(node_id) => {
                tracing::debug!(node_id = %node_id, "Node activated");
                self.listener.node_activated(&node_id);
                true
            }
            None => false,
        }
    }

    /// Returns the drag payload of an entry, `None` for anything that is not
    /// a non-absolute Variable.
    pub fn drag_payload(&self, cache: &TreeCache, entry: EntryId) -> Option<DragPayload> {
        self.live_variable_id(cache, entry).map(|node_id| DragPayload {
            node_id,
            node_class: NodeClass::Variable,
        })
    }

    fn live_variable_id(&self, cache: &TreeCache, entry: EntryId) -> Option<NodeId> {
        let node = cache.get(entry)?.node_ref()?;
        if !node.is_live_variable() {
            return None;
        }
        node.resolve(&self.session.namespace_table())
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Reacts to a session status change.
    ///
    /// `Connected` browses the root and returns its result code.
    /// `Disconnected` drops every discovered entry. `Interrupted` keeps the
    /// tree as is.
    pub async fn on_connection_status(
        &self,
        cache: &mut TreeCache,
        status: ConnectionStatus,
    ) -> i32 {
        match status {
            ConnectionStatus::Connected => self.browse(cache, None).await,
            ConnectionStatus::Disconnected => {
                let root = cache.root();
                let freed = cache.begin_update().clear_children(root);
                tracing::info!(freed, "Session disconnected, tree cleared");
                0
            }
            ConnectionStatus::Interrupted => {
                tracing::warn!("Session interrupted");
                0
            }
        }
    }
}

impl<S: Session + ?Sized> fmt::Debug for BrowseEngine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowseEngine")
            .field("settings", &self.settings)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

/// Maps the requested parent onto its entry and the canonical id to browse.
fn resolve_target(
    cache: &TreeCache,
    parent: Option<EntryId>,
    namespaces: &NamespaceTable,
) -> BrowseResult<(EntryId, NodeId, bool)> {
    let Some(id) = parent else {
        return Ok((cache.root(), well_known::ROOT_FOLDER, true));
    };
    let entry = cache
        .get(id)
        .ok_or_else(|| BrowseError::unresolved("tree entry no longer exists"))?;
    match entry.payload() {
        EntryPayload::Root => Ok((id, well_known::ROOT_FOLDER, true)),
        EntryPayload::Placeholder => Err(BrowseError::unresolved(
            "placeholder entries cannot be browsed",
        )),
        EntryPayload::Node(node) => {
            let node_id = node.resolve(namespaces).ok_or_else(|| {
                BrowseError::unresolved(format!(
                    "'{}' is not in the namespace table",
                    node.target_id
                ))
            })?;
            Ok((id, node_id, false))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
