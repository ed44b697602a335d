// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription data-change dispatcher.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     SubscriptionManager<S>                      │
//! │   create_subscription / add_monitored_item / bind / dispose     │
//! └─────────────────────────────────────────────────────────────────┘
//!          │ DataChangeSink (generation N)          ▲
//!          ▼                                        │ bindings
//!   Session threads ──▶ DispatchBridge ──▶ owning thread: deliver()
//!                                                   │
//!                                                   ▼
//!                                        ConsumerSlot::show(text, state)
//! ```
//!
//! Every subscription is stamped with a generation. Creating a new
//! subscription or disposing the manager bumps the generation, and batches
//! carrying an older generation are dropped before they touch any slot.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::browse::{DragPayload, NodeRef};
use crate::config::SubscriptionSettings;
use crate::dispatch::DispatchBridge;
use crate::error::{BindError, BindResult, DispatchError, SessionError, UaViewError};
use crate::session::{DataChangeRecord, MonitoredItemRequest, Session};
use crate::types::{AttributeId, ExpandedNodeId, NodeClass, NodeId};

// =============================================================================
// Consumer Slots
// =============================================================================

/// Visual state of a consumer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualState {
    /// The value was read successfully.
    Good,
    /// The value carries a non-good status; the text is the status name.
    Fault,
}

/// A presentation element that displays one monitored value.
///
/// Slots are only ever called on the thread owning the [`DispatchBridge`].
/// The manager holds them weakly; a dropped slot is skipped silently.
pub trait ConsumerSlot: Send + Sync {
    /// Displays `text` in the given visual state.
    fn show(&self, text: &str, state: VisualState);
}

// =============================================================================
// BindTarget / SubscriptionHandle / MonitoredBinding
// =============================================================================

/// A node proposed for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindTarget {
    /// Target id, possibly absolute.
    pub node_id: ExpandedNodeId,
    /// Node class of the target.
    pub node_class: NodeClass,
}

impl BindTarget {
    /// Creates a target for a local Variable.
    pub fn variable(node_id: NodeId) -> Self {
        Self {
            node_id: ExpandedNodeId::local(node_id),
            node_class: NodeClass::Variable,
        }
    }

    /// Checks that the target can be monitored and returns its canonical id.
    ///
    /// No network call is made.
    pub fn validate(&self) -> BindResult<NodeId> {
        if self.node_id.is_absolute() {
            return Err(BindError::invalid_target(
                self.node_id.to_string(),
                "absolute node ids cannot be monitored",
            ));
        }
        if self.node_class != NodeClass::Variable {
            return Err(BindError::invalid_target(
                self.node_id.to_string(),
                format!("{} nodes cannot be monitored", self.node_class),
            ));
        }
        Ok(self.node_id.node_id.clone())
    }
}

impl From<DragPayload> for BindTarget {
    fn from(payload: DragPayload) -> Self {
        Self {
            node_id: ExpandedNodeId::local(payload.node_id),
            node_class: payload.node_class,
        }
    }
}

impl From<&NodeRef> for BindTarget {
    fn from(node: &NodeRef) -> Self {
        Self {
            node_id: node.target_id.clone(),
            node_class: node.node_class,
        }
    }
}

/// Identifies one subscription created by a [`SubscriptionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    /// Local generation, compared by value to detect stale batches.
    pub generation: u64,
    /// Server-assigned subscription id.
    pub server_id: u32,
}

/// A registered monitored item and the slot it feeds.
#[derive(Clone)]
pub struct MonitoredBinding {
    node_id: NodeId,
    attribute: AttributeId,
    client_handle: u32,
    slot: Weak<dyn ConsumerSlot>,
}

impl MonitoredBinding {
    /// Returns the monitored node.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Returns the monitored attribute.
    pub fn attribute(&self) -> AttributeId {
        self.attribute
    }

    /// Returns the client handle of the monitored item.
    pub fn client_handle(&self) -> u32 {
        self.client_handle
    }

    /// Returns `true` while the consumer slot is alive.
    pub fn is_alive(&self) -> bool {
        self.slot.strong_count() > 0
    }
}

impl fmt::Debug for MonitoredBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitoredBinding")
            .field("node_id", &self.node_id)
            .field("attribute", &self.attribute)
            .field("client_handle", &self.client_handle)
            .field("alive", &self.is_alive())
            .finish()
    }
}

// =============================================================================
// SubscriptionStats
// =============================================================================

/// Delivery statistics.
#[derive(Debug, Default)]
pub struct SubscriptionStats {
    batches: AtomicU64,
    delivered: AtomicU64,
    stale_batches: AtomicU64,
    dropped_records: AtomicU64,
    bindings: AtomicU64,
}

impl SubscriptionStats {
    /// Creates new statistics.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_batch(&self, delivered: usize, dropped: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.delivered.fetch_add(delivered as u64, Ordering::Relaxed);
        self.dropped_records.fetch_add(dropped as u64, Ordering::Relaxed);
    }

    fn record_stale(&self, records: usize) {
        self.stale_batches.fetch_add(1, Ordering::Relaxed);
        self.dropped_records.fetch_add(records as u64, Ordering::Relaxed);
    }

    fn record_binding(&self) {
        self.bindings.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns batches delivered to slots.
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Returns records shown on a slot.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Returns batches dropped for carrying a superseded generation.
    pub fn stale_batches(&self) -> u64 {
        self.stale_batches.load(Ordering::Relaxed)
    }

    /// Returns records that reached no slot.
    pub fn dropped_records(&self) -> u64 {
        self.dropped_records.load(Ordering::Relaxed)
    }

    /// Returns bindings registered since creation.
    pub fn bindings(&self) -> u64 {
        self.bindings.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Shared State / DataChangeSink
// =============================================================================

#[derive(Default)]
struct Shared {
    generation: AtomicU64,
    bindings: RwLock<HashMap<u32, MonitoredBinding>>,
    stats: SubscriptionStats,
}

impl Shared {
    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Runs on the owning thread.
    fn deliver(
        &self,
        generation: u64,
        batch: Vec<DataChangeRecord>,
    ) -> Result<usize, DispatchError> {
        let current = self.current_generation();
        if generation != current {
            self.stats.record_stale(batch.len());
            return Err(DispatchError::StaleDelivery {
                generation,
                current,
            });
        }

        let targets: Vec<_> = {
            let bindings = self.bindings.read();
            batch
                .into_iter()
                .map(|record| {
                    let slot = bindings
                        .get(&record.client_handle)
                        .and_then(|binding| binding.slot.upgrade());
                    (record, slot)
                })
                .collect()
        };

        let mut delivered = 0;
        let mut dropped = 0;
        for (record, slot) in targets {
            let Some(slot) = slot else {
                dropped += 1;
                continue;
            };
            if record.status.is_good() {
                slot.show(&record.value.to_string(), VisualState::Good);
            } else {
                slot.show(&record.status.to_string(), VisualState::Fault);
            }
            delivered += 1;
        }
        self.stats.record_batch(delivered, dropped);
        Ok(delivered)
    }
}

/// Change callback handed to the session for one subscription.
///
/// Cloneable and `Send`: the session may invoke it from any thread. Batches
/// are forwarded through the [`DispatchBridge`] and checked against the
/// current generation on the owning thread.
#[derive(Clone)]
pub struct DataChangeSink {
    generation: u64,
    shared: Arc<Shared>,
    bridge: DispatchBridge,
}

impl DataChangeSink {
    /// Returns the generation this sink was stamped with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forwards a batch of changes to the owning thread.
    ///
    /// Fails only when the owning loop is gone.
    pub fn on_data_changed(&self, batch: Vec<DataChangeRecord>) -> Result<(), DispatchError> {
        let shared = Arc::clone(&self.shared);
        let generation = self.generation;
        self.bridge.post(move || {
            if let Err(e) = shared.deliver(generation, batch) {
                UaViewError::from(e).log("data change delivery");
            }
        })
    }
}

impl fmt::Debug for DataChangeSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataChangeSink")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// SubscriptionManager
// =============================================================================

struct StagedBinding {
    node_id: NodeId,
    slot: Weak<dyn ConsumerSlot>,
}

/// Creates subscriptions and routes their data changes to consumer slots.
pub struct SubscriptionManager<S: Session + ?Sized> {
    session: Arc<S>,
    bridge: DispatchBridge,
    settings: SubscriptionSettings,
    shared: Arc<Shared>,
    current: Mutex<Option<SubscriptionHandle>>,
    staged: Mutex<Vec<StagedBinding>>,
    next_client_handle: AtomicU32,
}

impl<S: Session + ?Sized> SubscriptionManager<S> {
    /// Creates a manager delivering through `bridge`.
    pub fn new(session: Arc<S>, bridge: DispatchBridge) -> Self {
        Self {
            session,
            bridge,
            settings: SubscriptionSettings::default(),
            shared: Arc::new(Shared::default()),
            current: Mutex::new(None),
            staged: Mutex::new(Vec::new()),
            next_client_handle: AtomicU32::new(1),
        }
    }

    /// Sets the subscription settings.
    pub fn with_settings(mut self, settings: SubscriptionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the settings.
    pub fn settings(&self) -> &SubscriptionSettings {
        &self.settings
    }

    /// Returns the active subscription, if any.
    pub fn current(&self) -> Option<SubscriptionHandle> {
        *self.current.lock()
    }

    /// Returns the current generation.
    pub fn generation(&self) -> u64 {
        self.shared.current_generation()
    }

    /// Returns the registered bindings.
    pub fn bindings(&self) -> Vec<MonitoredBinding> {
        self.shared.bindings.read().values().cloned().collect()
    }

    /// Returns the number of registered bindings.
    pub fn binding_count(&self) -> usize {
        self.shared.bindings.read().len()
    }

    /// Returns the number of bindings waiting for a subscription.
    pub fn staged_count(&self) -> usize {
        self.staged.lock().len()
    }

    /// Returns delivery statistics.
    pub fn stats(&self) -> &SubscriptionStats {
        &self.shared.stats
    }

    /// Creates a subscription using the configured publishing interval.
    pub async fn create_default_subscription(&self) -> BindResult<SubscriptionHandle> {
        self.create_subscription(self.settings.publishing_interval).await
    }

    /// Creates a subscription and makes it current.
    ///
    /// The previous subscription, if any, is superseded at once and deleted
    /// on the session. Its live bindings and every staged binding are
    /// registered on the new subscription.
    pub async fn create_subscription(&self, interval: Duration) -> BindResult<SubscriptionHandle> {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self.current.lock().take();
        self.carry_over_bindings();

        if let Some(previous) = previous {
            self.delete_on_session(previous).await;
        }

        let sink = DataChangeSink {
            generation,
            shared: Arc::clone(&self.shared),
            bridge: self.bridge.clone(),
        };
        let server_id = self.session.create_subscription(interval, sink).await?;
        let handle = SubscriptionHandle {
            generation,
            server_id,
        };

        if self.shared.current_generation() != generation {
            self.delete_on_session(handle).await;
            return Err(BindError::stale(generation, self.shared.current_generation()));
        }
        *self.current.lock() = Some(handle);

        tracing::info!(
            subscription_id = server_id,
            generation,
            publishing_interval_ms = interval.as_millis() as u64,
            "Subscription created"
        );

        let staged = std::mem::take(&mut *self.staged.lock());
        for binding in staged {
            if binding.slot.strong_count() == 0 {
                continue;
            }
            let node_id = binding.node_id.clone();
            if self.register(handle, binding.node_id, binding.slot).await.is_err() {
                tracing::debug!(node_id = %node_id, "Staged binding dropped");
            }
        }

        Ok(handle)
    }

    /// Registers a monitored item on `handle` feeding `slot`.
    ///
    /// Binding a slot that is already bound replaces its previous binding.
    pub async fn add_monitored_item<C>(
        &self,
        handle: SubscriptionHandle,
        target: impl Into<BindTarget>,
        slot: &Arc<C>,
    ) -> BindResult<()>
    where
        C: ConsumerSlot + 'static,
    {
        let node_id = target.into().validate()?;
        self.ensure_current(handle)?;
        let slot = Arc::downgrade(slot);
        let slot: Weak<dyn ConsumerSlot> = slot;
        self.register(handle, node_id, slot).await
    }

    /// Binds `target` to `slot` on the current subscription, or stages the
    /// binding until the next [`create_subscription`](Self::create_subscription).
    pub async fn bind<C>(&self, target: impl Into<BindTarget>, slot: &Arc<C>) -> BindResult<()>
    where
        C: ConsumerSlot + 'static,
    {
        let node_id = target.into().validate()?;
        let slot = Arc::downgrade(slot);
        let slot: Weak<dyn ConsumerSlot> = slot;

        let Some(handle) = self.current() else {
            let mut staged = self.staged.lock();
            staged.retain(|existing| !existing.slot.ptr_eq(&slot));
            tracing::debug!(node_id = %node_id, "Binding staged until a subscription exists");
            staged.push(StagedBinding { node_id, slot });
            return Ok(());
        };
        self.register(handle, node_id, slot).await
    }

    /// Supersedes the current subscription, deletes it on the session and
    /// drops every binding.
    pub async fn dispose(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        let previous = self.current.lock().take();
        let removed = {
            let mut bindings = self.shared.bindings.write();
            let removed = bindings.len();
            bindings.clear();
            removed
        };
        self.staged.lock().clear();

        if let Some(previous) = previous {
            self.delete_on_session(previous).await;
        }
        tracing::info!(bindings = removed, "Subscription manager disposed");
    }

    fn ensure_current(&self, handle: SubscriptionHandle) -> BindResult<()> {
        let current = self.shared.current_generation();
        if handle.generation != current || self.current() != Some(handle) {
            return Err(BindError::stale(handle.generation, current));
        }
        Ok(())
    }

    async fn register(
        &self,
        handle: SubscriptionHandle,
        node_id: NodeId,
        slot: Weak<dyn ConsumerSlot>,
    ) -> BindResult<()> {
        let result = self.try_register(handle, node_id, slot).await;
        if let Err(e) = &result {
            UaViewError::from(e.clone()).log("monitored item registration");
        }
        result
    }

    async fn try_register(
        &self,
        handle: SubscriptionHandle,
        node_id: NodeId,
        slot: Weak<dyn ConsumerSlot>,
    ) -> BindResult<()> {
        let client_handle = self.next_client_handle.fetch_add(1, Ordering::Relaxed);
        let request = MonitoredItemRequest {
            node_id: node_id.clone(),
            attribute: AttributeId::Value,
            client_handle,
            sampling_interval: self.settings.sampling_interval,
        };

        let statuses = self
            .session
            .create_monitored_items(handle.server_id, std::slice::from_ref(&request))
            .await?;
        let status = statuses
            .first()
            .copied()
            .ok_or(SessionError::EmptyResponse {
                service: "CreateMonitoredItems",
            })?;
        if !status.is_good() {
            return Err(BindError::rejected(node_id.to_string(), status));
        }
        self.ensure_current(handle)?;

        {
            let mut bindings = self.shared.bindings.write();
            bindings.retain(|_, existing| !existing.slot.ptr_eq(&slot));
            bindings.insert(
                client_handle,
                MonitoredBinding {
                    node_id: node_id.clone(),
                    attribute: AttributeId::Value,
                    client_handle,
                    slot,
                },
            );
        }
        self.shared.stats.record_binding();

        tracing::info!(
            subscription_id = handle.server_id,
            node_id = %node_id,
            client_handle,
            "Monitored item added"
        );
        Ok(())
    }

    fn carry_over_bindings(&self) {
        let carried: Vec<StagedBinding> = self
            .shared
            .bindings
            .write()
            .drain()
            .map(|(_, binding)| binding)
            .filter(MonitoredBinding::is_alive)
            .map(|binding| StagedBinding {
                node_id: binding.node_id,
                slot: binding.slot,
            })
            .collect();
        if carried.is_empty() {
            return;
        }
        let mut staged = self.staged.lock();
        for binding in carried {
            if !staged.iter().any(|existing| existing.slot.ptr_eq(&binding.slot)) {
                staged.push(binding);
            }
        }
    }

    async fn delete_on_session(&self, handle: SubscriptionHandle) {
        match self.session.delete_subscription(handle.server_id).await {
            Ok(()) => tracing::debug!(subscription_id = handle.server_id, "Subscription deleted"),
            Err(e) => UaViewError::from(e).log("subscription delete"),
        }
    }
}

impl<S: Session + ?Sized> fmt::Debug for SubscriptionManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("current", &self.current())
            .field("bindings", &self.binding_count())
            .field("staged", &self.staged_count())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::thread;

    use async_trait::async_trait;

    use super::*;
    use crate::dispatch::DispatchLoop;
    use crate::error::SessionResult;
    use crate::session::{BrowsePage, BrowseRequest, ContinuationPoint, WriteValue};
    use crate::types::{NamespaceTable, StatusCode};

    #[derive(Default)]
    struct FakeSession {
        sinks: Mutex<Vec<DataChangeSink>>,
        items: Mutex<Vec<(u32, MonitoredItemRequest)>>,
        deleted: Mutex<Vec<u32>>,
        item_status: Mutex<Option<StatusCode>>,
        next_id: AtomicU32,
    }

    impl FakeSession {
        fn sink(&self, index: usize) -> DataChangeSink {
            self.sinks.lock()[index].clone()
        }

        fn handle_for(&self, node_id: &NodeId) -> u32 {
            self.items
                .lock()
                .iter()
                .rev()
                .find(|(_, item)| &item.node_id == node_id)
                .map(|(_, item)| item.client_handle)
                .unwrap()
        }
    }

    #[async_trait]
    impl Session for FakeSession {
        async fn browse_first(&self, _: &NodeId, _: &BrowseRequest) -> SessionResult<BrowsePage> {
            Ok(BrowsePage::default())
        }

        async fn browse_next(&self, _: &ContinuationPoint) -> SessionResult<BrowsePage> {
            Err(SessionError::BadContinuationPoint)
        }

        fn namespace_table(&self) -> NamespaceTable {
            NamespaceTable::new()
        }

        async fn write(&self, values: &[WriteValue]) -> SessionResult<Vec<StatusCode>> {
            Ok(vec![StatusCode::GOOD; values.len()])
        }

        async fn create_subscription(
            &self,
            _: Duration,
            sink: DataChangeSink,
        ) -> SessionResult<u32> {
            self.sinks.lock().push(sink);
            Ok(100 + self.next_id.fetch_add(1, Ordering::Relaxed))
        }

        async fn create_monitored_items(
            &self,
            subscription_id: u32,
            items: &[MonitoredItemRequest],
        ) -> SessionResult<Vec<StatusCode>> {
            let status = (*self.item_status.lock()).unwrap_or(StatusCode::GOOD);
            let mut recorded = self.items.lock();
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

    #[derive(Default)]
    struct Slot(Mutex<Vec<(String, VisualState)>>);

    impl ConsumerSlot for Slot {
        fn show(&self, text: &str, state: VisualState) {
            self.0.lock().push((text.to_string(), state));
        }
    }

    fn setup() -> (Arc<FakeSession>, SubscriptionManager<FakeSession>, DispatchLoop) {
        let session = Arc::new(FakeSession::default());
        let (bridge, dispatch) = DispatchBridge::new();
        let manager = SubscriptionManager::new(Arc::clone(&session), bridge);
        (session, manager, dispatch)
    }

    fn deliver_from_session_thread(sink: DataChangeSink, batch: Vec<DataChangeRecord>) {
        thread::spawn(move || sink.on_data_changed(batch).unwrap())
            .join()
            .unwrap();
    }

    #[tokio::test]
    async fn test_value_then_bad_status() {
        let (session, manager, mut dispatch) = setup();
        let handle = manager.create_subscription(Duration::from_millis(250)).await.unwrap();
        let slot = Arc::new(Slot::default());
        let node = NodeId::numeric(2, 7);
        manager
            .add_monitored_item(handle, BindTarget::variable(node.clone()), &slot)
            .await
            .unwrap();
        let client_handle = session.handle_for(&node);

        deliver_from_session_thread(
            session.sink(0),
            vec![DataChangeRecord::good(client_handle, 42)],
        );
        assert!(slot.0.lock().is_empty());
        assert_eq!(dispatch.run_pending(), 1);
        assert_eq!(*slot.0.lock(), vec![("42".to_string(), VisualState::Good)]);

        deliver_from_session_thread(
            session.sink(0),
            vec![DataChangeRecord::with_status(client_handle, StatusCode::BAD_NOT_READABLE)],
        );
        dispatch.run_pending();
        assert_eq!(
            slot.0.lock().last().unwrap(),
            &("BadNotReadable".to_string(), VisualState::Fault)
        );
        assert_eq!(manager.stats().delivered(), 2);
    }

    #[tokio::test]
    async fn test_invalid_targets_register_nothing() {
        let (session, manager, _dispatch) = setup();
        let handle = manager.create_subscription(Duration::from_millis(250)).await.unwrap();
        let slot = Arc::new(Slot::default());

        let object = BindTarget {
            node_id: ExpandedNodeId::local(NodeId::numeric(2, 1)),
            node_class: NodeClass::Object,
        };
        let absolute = BindTarget {
            node_id: ExpandedNodeId::with_namespace_uri(NodeId::numeric(0, 1), "urn:x"),
            node_class: NodeClass::Variable,
        };

        for target in [object, absolute] {
            let err = manager.add_monitored_item(handle, target, &slot).await.unwrap_err();
            assert!(matches!(err, BindError::InvalidTarget { .. }));
        }
        assert!(session.items.lock().is_empty());
        assert_eq!(manager.binding_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_batches_never_reach_slots() {
        let (session, manager, mut dispatch) = setup();
        let first = manager.create_subscription(Duration::from_millis(250)).await.unwrap();
        let slot = Arc::new(Slot::default());
        let node = NodeId::numeric(2, 7);
        manager
            .add_monitored_item(first, BindTarget::variable(node.clone()), &slot)
            .await
            .unwrap();
        let old_handle = session.handle_for(&node);

        let second = manager.create_subscription(Duration::from_millis(250)).await.unwrap();
        assert!(second.generation > first.generation);
        assert_eq!(*session.deleted.lock(), vec![first.server_id]);

        deliver_from_session_thread(session.sink(0), vec![DataChangeRecord::good(old_handle, 1)]);
        dispatch.run_pending();
        assert!(slot.0.lock().is_empty());
        assert_eq!(manager.stats().stale_batches(), 1);

        let err = manager
            .add_monitored_item(first, BindTarget::variable(NodeId::numeric(2, 8)), &slot)
            .await
            .unwrap_err();
        assert!(matches!(err, BindError::StaleSubscription { .. }));

        // The binding moved onto the new subscription.
        let new_handle = session.handle_for(&node);
        assert_ne!(new_handle, old_handle);
        deliver_from_session_thread(session.sink(1), vec![DataChangeRecord::good(new_handle, 5)]);
        dispatch.run_pending();
        assert_eq!(*slot.0.lock(), vec![("5".to_string(), VisualState::Good)]);
    }

    #[tokio::test]
    async fn test_rejected_item_leaves_no_binding() {
        let (session, manager, _dispatch) = setup();
        let handle = manager.create_subscription(Duration::from_millis(250)).await.unwrap();
        *session.item_status.lock() = Some(StatusCode::BAD_NODE_ID_UNKNOWN);
        let slot = Arc::new(Slot::default());

        let err = manager
            .add_monitored_item(handle, BindTarget::variable(NodeId::numeric(2, 99)), &slot)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BindError::Rejected { status, .. } if status == StatusCode::BAD_NODE_ID_UNKNOWN
        ));
        assert_eq!(manager.binding_count(), 0);
    }

    #[tokio::test]
    async fn test_rebinding_slot_replaces_binding() {
        let (session, manager, mut dispatch) = setup();
        let handle = manager.create_subscription(Duration::from_millis(250)).await.unwrap();
        let slot = Arc::new(Slot::default());
        let a = NodeId::numeric(2, 1);
        let b = NodeId::numeric(2, 2);

        manager.add_monitored_item(handle, BindTarget::variable(a.clone()), &slot).await.unwrap();
        manager.add_monitored_item(handle, BindTarget::variable(b.clone()), &slot).await.unwrap();
        assert_eq!(manager.binding_count(), 1);
        assert_eq!(manager.bindings()[0].node_id(), &b);

        let old = session.handle_for(&a);
        deliver_from_session_thread(session.sink(0), vec![DataChangeRecord::good(old, 1)]);
        dispatch.run_pending();
        assert!(slot.0.lock().is_empty());
        assert_eq!(manager.stats().dropped_records(), 1);
    }

    #[tokio::test]
    async fn test_staged_binding_registers_on_create() {
        let (session, manager, _dispatch) = setup();
        let slot = Arc::new(Slot::default());
        manager.bind(BindTarget::variable(NodeId::numeric(2, 5)), &slot).await.unwrap();
        assert_eq!(manager.staged_count(), 1);
        assert!(session.items.lock().is_empty());

        let handle = manager.create_subscription(Duration::from_millis(250)).await.unwrap();
        assert_eq!(manager.staged_count(), 0);
        assert_eq!(manager.binding_count(), 1);
        assert_eq!(session.items.lock()[0].0, handle.server_id);
    }

    #[tokio::test]
    async fn test_dropped_slot_is_skipped() {
        let (session, manager, mut dispatch) = setup();
        let handle = manager.create_subscription(Duration::from_millis(250)).await.unwrap();
        let slot = Arc::new(Slot::default());
        let node = NodeId::numeric(2, 7);
        manager
            .add_monitored_item(handle, BindTarget::variable(node.clone()), &slot)
            .await
            .unwrap();
        let client_handle = session.handle_for(&node);
        drop(slot);

        deliver_from_session_thread(
            session.sink(0),
            vec![DataChangeRecord::good(client_handle, 1)],
        );
        dispatch.run_pending();
        assert_eq!(manager.stats().delivered(), 0);
        assert_eq!(manager.stats().dropped_records(), 1);
    }

    #[tokio::test]
    async fn test_dispose_supersedes_and_clears() {
        let (session, manager, mut dispatch) = setup();
        let handle = manager.create_subscription(Duration::from_millis(250)).await.unwrap();
        let slot = Arc::new(Slot::default());
        let node = NodeId::numeric(2, 7);
        manager
            .add_monitored_item(handle, BindTarget::variable(node.clone()), &slot)
            .await
            .unwrap();
        let client_handle = session.handle_for(&node);

        manager.dispose().await;
        assert_eq!(manager.current(), None);
        assert_eq!(manager.binding_count(), 0);
        assert_eq!(*session.deleted.lock(), vec![handle.server_id]);

        deliver_from_session_thread(
            session.sink(0),
            vec![DataChangeRecord::good(client_handle, 1)],
        );
        dispatch.run_pending();
        assert!(slot.0.lock().is_empty());
    }

    #[test]
    fn test_drag_payload_becomes_bind_target() {
        let payload: DragPayload = "ns=3;s=\"start\"".parse().unwrap();
        let target = BindTarget::from(payload);
        assert_eq!(target.validate().unwrap(), NodeId::string(3, "\"start\""));
    }
}
