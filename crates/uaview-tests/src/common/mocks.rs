// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Mock session and recording collaborators for exercising the explorer core
//! in isolation.
//!
//! ## Design Principles
//!
//! - Scripted browse pages per node, continuation tokens generated for you
//! - Failure injection through atomic flags
//! - Recording of interactions for verification
//! - Data changes delivered from a real foreign thread

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use uaview_core::{
    browse::{BrowseCancel, BrowseEvent, BrowseListener, NodeRef},
    error::{DispatchError, SessionError, SessionResult},
    session::{
        BrowsePage, BrowseRequest, ContinuationPoint, DataChangeRecord, MonitoredItemRequest,
        Session, WriteValue,
    },
    subscription::{ConsumerSlot, DataChangeSink, VisualState},
    tree::{EntryId, TreeObserver},
    types::{NamespaceTable, NodeId, StatusCode},
};

// =============================================================================
// Mock Session
// =============================================================================

/// A scriptable in-memory session.
pub struct MockSession {
    /// Namespace table returned to callers.
    namespaces: RwLock<NamespaceTable>,

    /// First page per browsed node.
    first_pages: RwLock<HashMap<NodeId, BrowsePage>>,

    /// Follow-up pages keyed by continuation bytes.
    next_pages: RwLock<HashMap<Vec<u8>, BrowsePage>>,

    /// Force the next browse call (first or next) to fail.
    fail_next_browse: AtomicBool,

    /// Force every continuation call to fail.
    fail_browse_next: AtomicBool,

    /// Force subscription creation to fail.
    fail_create_subscription: AtomicBool,

    /// Token cancelled by the next continuation call.
    cancel_on_next: Mutex<Option<BrowseCancel>>,

    /// Status returned for every monitored item.
    item_status: Mutex<StatusCode>,

    /// Status returned for every write.
    write_status: Mutex<StatusCode>,

    /// Browse call count.
    browse_count: AtomicU64,

    /// Continuation call count.
    browse_next_count: AtomicU64,

    /// Nodes passed to `browse_first`, in call order.
    browsed_nodes: Mutex<Vec<NodeId>>,

    /// Requests passed to `browse_first`, in call order.
    browse_requests: Mutex<Vec<BrowseRequest>>,

    /// Write history for verification.
    write_history: Mutex<Vec<WriteValue>>,

    /// Sinks of created subscriptions keyed by server id. Deleted
    /// subscriptions keep their sink so late deliveries can be replayed.
    sinks: Mutex<Vec<(u32, DataChangeSink)>>,

    /// Registered monitored items with their subscription id.
    monitored_items: Mutex<Vec<(u32, MonitoredItemRequest)>>,

    /// Deleted subscription ids.
    deleted: Mutex<Vec<u32>>,

    /// Next server-side subscription id.
    next_subscription_id: AtomicU32,
}

impl MockSession {
    /// Creates a session with the standard namespace and the `urn:uaview:test`
    /// namespace at index 1.
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(NamespaceTable::from_uris([
                uaview_core::types::OPC_UA_NAMESPACE,
                "urn:uaview:test",
            ])),
            first_pages: RwLock::new(HashMap::new()),
            next_pages: RwLock::new(HashMap::new()),
            fail_next_browse: AtomicBool::new(false),
            fail_browse_next: AtomicBool::new(false),
            fail_create_subscription: AtomicBool::new(false),
            cancel_on_next: Mutex::new(None),
            item_status: Mutex::new(StatusCode::GOOD),
            write_status: Mutex::new(StatusCode::GOOD),
            browse_count: AtomicU64::new(0),
            browse_next_count: AtomicU64::new(0),
            browsed_nodes: Mutex::new(Vec::new()),
            browse_requests: Mutex::new(Vec::new()),
            write_history: Mutex::new(Vec::new()),
            sinks: Mutex::new(Vec::new()),
            monitored_items: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            next_subscription_id: AtomicU32::new(1),
        }
    }

    /// Wraps the session in an `Arc`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Scripts the children of `node` split into `pages`.
    ///
    /// Continuation tokens are generated so that pages arrive in order.
    pub fn script_pages(&self, node: NodeId, pages: Vec<Vec<NodeRef>>) {
        let count = pages.len().max(1);
        let token = |index: usize| format!("{node}#{index}").into_bytes();

        let mut pages = pages.into_iter();
        let first = pages.next().unwrap_or_default();
        let first = if count > 1 {
            BrowsePage::partial(first, ContinuationPoint::new(token(1)))
        } else {
            BrowsePage::last(first)
        };
        self.first_pages.write().insert(node.clone(), first);

        let mut next = self.next_pages.write();
        for (offset, references) in pages.enumerate() {
            let index = offset + 1;
            let page = if index + 1 < count {
                BrowsePage::partial(references, ContinuationPoint::new(token(index + 1)))
            } else {
                BrowsePage::last(references)
            };
            next.insert(token(index), page);
        }
    }

    /// Scripts the children of `node` as a single page.
    pub fn script_children(&self, node: NodeId, children: Vec<NodeRef>) {
        self.script_pages(node, vec![children]);
    }

    /// Replaces the namespace table.
    pub fn set_namespaces(&self, table: NamespaceTable) {
        *self.namespaces.write() = table;
    }

    /// Force the next browse call to fail.
    pub fn fail_next_browse(&self) {
        self.fail_next_browse.store(true, Ordering::SeqCst);
    }

    /// Force all continuation calls to fail.
    pub fn fail_browse_next(&self, fail: bool) {
        self.fail_browse_next.store(fail, Ordering::SeqCst);
    }

    /// Force subscription creation to fail.
    pub fn fail_create_subscription(&self, fail: bool) {
        self.fail_create_subscription.store(fail, Ordering::SeqCst);
    }

    /// Cancels `token` from inside the next continuation call, as a user
    /// would while a long drain is running.
    pub fn cancel_during_next(&self, token: BrowseCancel) {
        *self.cancel_on_next.lock() = Some(token);
    }

    /// Sets the status returned for monitored items.
    pub fn set_item_status(&self, status: StatusCode) {
        *self.item_status.lock() = status;
    }

    /// Sets the status returned for writes.
    pub fn set_write_status(&self, status: StatusCode) {
        *self.write_status.lock() = status;
    }

    /// Get the browse count.
    pub fn browse_count(&self) -> u64 {
        self.browse_count.load(Ordering::SeqCst)
    }

    /// Get the continuation count.
    pub fn browse_next_count(&self) -> u64 {
        self.browse_next_count.load(Ordering::SeqCst)
    }

    /// Get the browsed nodes in call order.
    pub fn browsed_nodes(&self) -> Vec<NodeId> {
        self.browsed_nodes.lock().clone()
    }

    /// Get the browse requests in call order.
    pub fn browse_requests(&self) -> Vec<BrowseRequest> {
        self.browse_requests.lock().clone()
    }

    /// Get the write history.
    pub fn write_history(&self) -> Vec<WriteValue> {
        self.write_history.lock().clone()
    }

    /// Get the registered monitored items.
    pub fn monitored_items(&self) -> Vec<(u32, MonitoredItemRequest)> {
        self.monitored_items.lock().clone()
    }

    /// Get the deleted subscription ids.
    pub fn deleted_subscriptions(&self) -> Vec<u32> {
        self.deleted.lock().clone()
    }

    /// Returns the client handle most recently registered for `node`.
    pub fn client_handle_for(&self, node: &NodeId) -> Option<u32> {
        self.monitored_items
            .lock()
            .iter()
            .rev()
            .find(|(_, item)| &item.node_id == node)
            .map(|(_, item)| item.client_handle)
    }

    /// Returns the sink of a subscription.
    pub fn sink(&self, subscription_id: u32) -> Option<DataChangeSink> {
        self.sinks
            .lock()
            .iter()
            .find(|(id, _)| *id == subscription_id)
            .map(|(_, sink)| sink.clone())
    }

    /// Delivers a batch from a freshly spawned thread, like a network stack
    /// would, and waits for the hand-off to complete.
    pub fn push_data_change(
        &self,
        subscription_id: u32,
        batch: Vec<DataChangeRecord>,
    ) -> Result<(), DispatchError> {
        let Some(sink) = self.sink(subscription_id) else {
            return Ok(());
        };
        thread::spawn(move || sink.on_data_changed(batch))
            .join()
            .unwrap_or(Err(DispatchError::OwnerGone))
    }

    /// Clear all counters and history.
    pub fn reset(&self) {
        self.browse_count.store(0, Ordering::SeqCst);
        self.browse_next_count.store(0, Ordering::SeqCst);
        self.browsed_nodes.lock().clear();
        self.browse_requests.lock().clear();
        self.write_history.lock().clear();
        self.fail_next_browse.store(false, Ordering::SeqCst);
        self.fail_browse_next.store(false, Ordering::SeqCst);
        self.fail_create_subscription.store(false, Ordering::SeqCst);
        self.cancel_on_next.lock().take();
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Session for MockSession {
    async fn browse_first(
        &self,
        node_id: &NodeId,
        request: &BrowseRequest,
    ) -> SessionResult<BrowsePage> {
        self.browse_count.fetch_add(1, Ordering::SeqCst);
        self.browsed_nodes.lock().push(node_id.clone());
        self.browse_requests.lock().push(request.clone());

        if self.fail_next_browse.swap(false, Ordering::SeqCst) {
            return Err(SessionError::transport("mock browse failure"));
        }
        match self.first_pages.read().get(node_id) {
            Some(page) => Ok(page.clone()),
            None => Err(SessionError::bad_status("Browse", StatusCode::BAD_NODE_ID_UNKNOWN)),
        }
    }

    async fn browse_next(&self, continuation: &ContinuationPoint) -> SessionResult<BrowsePage> {
        self.browse_next_count.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = self.cancel_on_next.lock().take() {
            token.cancel();
        }

        if self.fail_browse_next.load(Ordering::SeqCst)
            || self.fail_next_browse.swap(false, Ordering::SeqCst)
        {
            return Err(SessionError::timeout("BrowseNext", Duration::from_secs(5)));
        }
        self.next_pages
            .read()
            .get(continuation.as_bytes())
            .cloned()
            .ok_or(SessionError::BadContinuationPoint)
    }

    fn namespace_table(&self) -> NamespaceTable {
        self.namespaces.read().clone()
    }

    async fn write(&self, values: &[WriteValue]) -> SessionResult<Vec<StatusCode>> {
        self.write_history.lock().extend_from_slice(values);
        let status = *self.write_status.lock();
        Ok(vec![status; values.len()])
    }

    async fn create_subscription(
        &self,
        _publishing_interval: Duration,
        sink: DataChangeSink,
    ) -> SessionResult<u32> {
        if self.fail_create_subscription.load(Ordering::SeqCst) {
            return Err(SessionError::NotConnected);
        }
        let id = self.next_subscription_id.fetch_add(1, Ordering::SeqCst);
        self.sinks.lock().push((id, sink));
        Ok(id)
    }

    async fn create_monitored_items(
        &self,
        subscription_id: u32,
        items: &[MonitoredItemRequest],
    ) -> SessionResult<Vec<StatusCode>> {
        let status = *self.item_status.lock();
        let mut recorded = self.monitored_items.lock();
        for item in items {
            recorded.push((subscription_id, item.clone()));
        }
        Ok(vec![status; items.len()])
    }

    async fn delete_subscription(&self, subscription_id: u32) -> SessionResult<()> {
        self.deleted.lock().push(subscription_id);
        Ok(())
    }
}

// =============================================================================
// Recording Listener
// =============================================================================

/// Browse listener that records every notification.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<BrowseEvent>>,
}

impl RecordingListener {
    /// Creates a shared listener.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns all recorded events.
    pub fn events(&self) -> Vec<BrowseEvent> {
        self.events.lock().clone()
    }

    /// Returns the recorded status notifications.
    pub fn statuses(&self) -> Vec<(String, bool)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                BrowseEvent::Status { text, success } => Some((text.clone(), *success)),
                _ => None,
            })
            .collect()
    }

    /// Returns the activated node ids.
    pub fn activated(&self) -> Vec<NodeId> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                BrowseEvent::NodeActivated(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the reported selections.
    pub fn selections(&self) -> Vec<Option<EntryId>> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                BrowseEvent::SelectionChanged(entry) => Some(*entry),
                _ => None,
            })
            .collect()
    }

    /// Clears the recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl BrowseListener for RecordingListener {
    fn selection_changed(&self, entry: Option<EntryId>) {
        self.events.lock().push(BrowseEvent::SelectionChanged(entry));
    }

    fn node_activated(&self, node_id: &NodeId) {
        self.events.lock().push(BrowseEvent::NodeActivated(node_id.clone()));
    }

    fn status(&self, text: &str, success: bool) {
        self.events.lock().push(BrowseEvent::Status {
            text: text.to_string(),
            success,
        });
    }
}

// =============================================================================
// Recording Slot
// =============================================================================

/// Consumer slot that records everything it is asked to show.
#[derive(Debug, Default)]
pub struct RecordingSlot {
    shown: Mutex<Vec<(String, VisualState)>>,
}

impl RecordingSlot {
    /// Creates a shared slot.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns everything shown so far.
    pub fn shown(&self) -> Vec<(String, VisualState)> {
        self.shown.lock().clone()
    }

    /// Returns the last shown text and state.
    pub fn last(&self) -> Option<(String, VisualState)> {
        self.shown.lock().last().cloned()
    }

    /// Returns `true` if nothing was shown.
    pub fn is_untouched(&self) -> bool {
        self.shown.lock().is_empty()
    }
}

impl ConsumerSlot for RecordingSlot {
    fn show(&self, text: &str, state: VisualState) {
        self.shown.lock().push((text.to_string(), state));
    }
}

// =============================================================================
// Recording Observer
// =============================================================================

/// Tree observer counting update brackets. Clones share their counters.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    begins: Arc<AtomicU64>,
    ends: Arc<AtomicU64>,
}

impl RecordingObserver {
    /// Creates an observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many scopes were opened.
    pub fn begins(&self) -> u64 {
        self.begins.load(Ordering::SeqCst)
    }

    /// Returns how many scopes were closed.
    pub fn ends(&self) -> u64 {
        self.ends.load(Ordering::SeqCst)
    }

    /// Returns `true` when every opened scope was closed.
    pub fn is_balanced(&self) -> bool {
        self.begins() == self.ends()
    }
}

impl TreeObserver for RecordingObserver {
    fn begin_update(&self) {
        self.begins.fetch_add(1, Ordering::SeqCst);
    }

    fn end_update(&self) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }
}
