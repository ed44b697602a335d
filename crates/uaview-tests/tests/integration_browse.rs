// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Integration tests for the browse engine.
//!
//! ## Test Categories
//!
//! - Tree population and sibling ordering
//! - Continuation paging
//! - Cached versus forced re-browse
//! - Failure handling and status reporting
//! - Selection, activation and drag
//! - Connection status reactions

use std::sync::Arc;

use uaview_core::{
    browse::{
        classify, BrowseOutcome, Category, STATUS_CACHED, STATUS_FAILED_PREFIX, STATUS_SUCCEEDED,
    },
    error::BrowseError,
    session::ConnectionStatus,
    types::{well_known, NodeClass},
    BrowseEngine, BrowseSettings, EntryId, TreeCache,
};
use uaview_tests::common::*;

fn engine_with_listener(
    session: &Arc<MockSession>,
) -> (BrowseEngine<MockSession>, Arc<RecordingListener>) {
    let listener = RecordingListener::shared();
    let engine = BrowseEngine::new(Arc::clone(session)).with_listener(listener.clone());
    (engine, listener)
}

fn child(cache: &TreeCache, parent: EntryId, text: &str) -> EntryId {
    cache
        .find_child(parent, text)
        .unwrap_or_else(|| panic!("'{}' not found under parent", text))
}

// =============================================================================
// Population & Ordering
// =============================================================================

#[tokio::test]
async fn test_root_browse_sorts_folders_before_variables() {
    init_test_logging();

    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, Scenario::root_children());
    let (engine, listener) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    assert_eq!(engine.browse(&mut cache, None).await, 0);

    let root = cache.root();
    cache.assert_texts(root, &Scenario::root_children_sorted());
    cache.assert_sorted(root);

    let keys: Vec<_> = cache
        .child_entries(root)
        .map(|entry| (entry.category().unwrap(), entry.text()))
        .collect();
    let mut resorted = keys.clone();
    classify::sort_siblings(&mut resorted, |&(category, text)| (category, text));
    assert_eq!(resorted, keys);

    assert_eq!(
        listener.statuses(),
        vec![(STATUS_SUCCEEDED.to_string(), true)]
    );
    assert_eq!(session.browsed_nodes(), vec![well_known::ROOT_FOLDER]);
}

#[tokio::test]
async fn test_every_discovered_entry_starts_with_placeholder() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, Scenario::mixed_children());
    let (engine, _) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;

    let root = cache.root();
    for &id in cache.children_of(root) {
        cache.assert_placeholder_only(id);
        assert!(!cache.get(id).unwrap().is_browsed());
    }
}

#[tokio::test]
async fn test_mixed_children_are_classified_and_ranked() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, Scenario::mixed_children());
    let (engine, _) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;

    let root = cache.root();
    cache.assert_texts(
        root,
        &["Reset", "Motor", "null", "EngineeringUnits", "Diagnostics", "Speed"],
    );
    let categories: Vec<_> = cache
        .child_entries(root)
        .map(|entry| entry.category().unwrap())
        .collect();
    assert_eq!(
        categories,
        vec![
            Category::Method,
            Category::Object,
            Category::Object,
            Category::Property,
            Category::Folder,
            Category::Variable,
        ]
    );
    let icons: Vec<_> = cache
        .child_entries(root)
        .map(|entry| entry.icon_key().unwrap())
        .collect();
    assert_eq!(icons[4], "treefolder");
    assert_eq!(icons[3], "property");
}

#[tokio::test]
async fn test_nested_browse_replaces_placeholder() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, Scenario::root_children());
    session.script_children(
        NodeFixtures::id("Objects"),
        vec![NodeFixtures::variable("b"), NodeFixtures::variable("A")],
    );
    let (engine, _) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;
    let objects = child(&cache, cache.root(), "Objects");
    cache.assert_placeholder_only(objects);

    let outcome = engine.browse_checked(&mut cache, Some(objects)).await.unwrap();
    assert_eq!(outcome, BrowseOutcome::Fetched { count: 2, pages: 1 });
    cache.assert_texts(objects, &["A", "b"]);
    assert!(cache.get(objects).unwrap().is_browsed());
    assert_eq!(cache.parent_of(child(&cache, objects, "A")), Some(objects));
}

#[tokio::test]
async fn test_empty_folder_browses_to_no_children() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, vec![NodeFixtures::folder("Empty")]);
    session.script_children(NodeFixtures::id("Empty"), Vec::new());
    let (engine, _) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;
    let empty = child(&cache, cache.root(), "Empty");
    assert_eq!(engine.browse(&mut cache, Some(empty)).await, 0);

    assert!(cache.children_of(empty).is_empty());
    assert!(cache.get(empty).unwrap().is_browsed());
}

#[test]
fn test_classification_is_pure_and_total() {
    let session = MockSession::new();
    let namespaces = uaview_core::Session::namespace_table(&session);

    for node in Scenario::mixed_children() {
        let first = classify(&node, &namespaces);
        let second = classify(&node, &namespaces);
        assert_eq!(first, second);
        assert!(Category::ALL.contains(&first));
    }

    let folder_variable =
        NodeFixtures::variable("Odd").with_type_definition(well_known::FOLDER_TYPE);
    assert_eq!(classify(&folder_variable, &namespaces), Category::Folder);

    let unspecified = uaview_core::NodeRef::new(NodeFixtures::id("X"), NodeClass::Unspecified);
    assert_eq!(classify(&unspecified, &namespaces), Category::Error);
}

// =============================================================================
// Paging
// =============================================================================

#[tokio::test]
async fn test_continuation_pages_are_concatenated() {
    let session = MockSession::shared();
    let tags = Scenario::tags(7);
    session.script_pages(
        well_known::ROOT_FOLDER,
        vec![tags[..3].to_vec(), tags[3..5].to_vec(), tags[5..].to_vec()],
    );
    let (engine, _) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    let outcome = engine.browse_checked(&mut cache, None).await.unwrap();

    assert_eq!(outcome, BrowseOutcome::Fetched { count: 7, pages: 3 });
    assert_eq!(session.browse_count(), 1);
    assert_eq!(session.browse_next_count(), 2);
    cache.assert_texts(
        cache.root(),
        &["Tag000", "Tag001", "Tag002", "Tag003", "Tag004", "Tag005", "Tag006"],
    );

    let stats = engine.stats().snapshot();
    assert_eq!(stats.browses, 1);
    assert_eq!(stats.pages, 3);
    assert_eq!(stats.references, 7);
}

#[tokio::test]
async fn test_configured_page_size_reaches_request() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, Vec::new());
    let engine = BrowseEngine::new(Arc::clone(&session)).with_settings(BrowseSettings {
        rebrowse_on_expand: false,
        page_size: 25,
    });
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;

    let requests = session.browse_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].max_references, 25);
    assert_eq!(requests[0].reference_type_id, well_known::HIERARCHICAL_REFERENCES);
    assert!(requests[0].include_subtypes);
    assert_eq!(requests[0].result_mask, 0x3F);
}

#[tokio::test]
async fn test_failed_continuation_restores_placeholder() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, vec![NodeFixtures::folder("Plant")]);
    session.script_pages(
        NodeFixtures::id("Plant"),
        vec![Scenario::tags(2), Scenario::tags(2)],
    );
    let (engine, listener) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;
    listener.clear();
    let plant = child(&cache, cache.root(), "Plant");

    session.fail_browse_next(true);
    assert_eq!(engine.browse(&mut cache, Some(plant)).await, -1);

    cache.assert_placeholder_only(plant);
    assert!(!cache.get(plant).unwrap().is_browsed());

    let statuses = listener.statuses();
    assert_eq!(statuses.len(), 1);
    assert!(statuses[0].0.starts_with(STATUS_FAILED_PREFIX));
    assert!(!statuses[0].1);
    assert_eq!(engine.stats().snapshot().failures, 1);

    session.fail_browse_next(false);
    assert_eq!(engine.browse(&mut cache, Some(plant)).await, 0);
    assert_eq!(cache.children_of(plant).len(), 4);
}

#[tokio::test]
async fn test_failed_first_page_restores_placeholder() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, vec![NodeFixtures::folder("F")]);
    session.script_children(NodeFixtures::id("F"), Scenario::tags(3));
    let (engine, listener) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;
    listener.clear();
    let folder = child(&cache, cache.root(), "F");

    session.fail_next_browse();
    assert_eq!(engine.browse(&mut cache, Some(folder)).await, -1);

    assert_eq!(session.browse_next_count(), 0);
    assert!(!cache.get(folder).unwrap().is_browsed());
    cache.assert_placeholder_only(folder);

    let statuses = listener.statuses();
    assert_eq!(statuses.len(), 1);
    assert!(statuses[0].0.starts_with(STATUS_FAILED_PREFIX));
    assert!(statuses[0].0.contains("mock browse failure"));
    assert!(!statuses[0].1);
}

#[tokio::test]
async fn test_browse_failure_is_logged_with_error_code() {
    let (logs, _guard) = capture_logs();
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, vec![NodeFixtures::folder("F")]);
    let (engine, _) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;
    let folder = child(&cache, cache.root(), "F");
    session.fail_next_browse();
    assert_eq!(engine.browse(&mut cache, Some(folder)).await, -1);

    let output = logs.contents();
    assert!(output.contains("UV-0102"), "missing error code in:\n{output}");
    assert!(output.contains("mock browse failure"));
    assert!(output.contains("retryable=true"));
}

#[tokio::test]
async fn test_cancel_between_pages() {
    let session = MockSession::shared();
    session.script_pages(
        well_known::ROOT_FOLDER,
        vec![Scenario::tags(2), Scenario::tags(2), Scenario::tags(2)],
    );
    let (engine, _) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    session.cancel_during_next(engine.cancel_handle());
    let err = engine.browse_checked(&mut cache, None).await.unwrap_err();
    assert!(matches!(err, BrowseError::Cancelled { pages: 2, .. }));
    assert_eq!(session.browse_next_count(), 1);
    assert!(cache.children_of(cache.root()).is_empty());

    // The request was consumed by the cancelled drain.
    assert!(!engine.cancel_handle().is_cancelled());
    assert_eq!(engine.browse(&mut cache, None).await, 0);
    assert_eq!(cache.children_of(cache.root()).len(), 6);
}

#[tokio::test]
async fn test_cancel_outside_a_drain_is_discarded() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, vec![NodeFixtures::folder("Plant")]);
    session.script_pages(
        NodeFixtures::id("Plant"),
        vec![Scenario::tags(2), Scenario::tags(3)],
    );
    let (engine, _) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    // Single page: no continuation ever checks the token.
    engine.cancel_handle().cancel();
    assert_eq!(engine.browse(&mut cache, None).await, 0);

    let plant = child(&cache, cache.root(), "Plant");
    let outcome = engine.browse_checked(&mut cache, Some(plant)).await.unwrap();
    assert_eq!(outcome, BrowseOutcome::Fetched { count: 5, pages: 2 });
    assert_eq!(cache.children_of(plant).len(), 5);
    assert!(!engine.cancel_handle().is_cancelled());
}

// =============================================================================
// Cached vs Forced Re-browse
// =============================================================================

#[tokio::test]
async fn test_second_expand_uses_cached_children() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, vec![NodeFixtures::folder("Line1")]);
    session.script_children(NodeFixtures::id("Line1"), Scenario::tags(3));
    let (engine, listener) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;
    let line = child(&cache, cache.root(), "Line1");
    engine.browse(&mut cache, Some(line)).await;
    let before: Vec<_> = cache.children_of(line).to_vec();
    listener.clear();
    session.reset();

    let outcome = engine.browse_checked(&mut cache, Some(line)).await.unwrap();

    assert_eq!(outcome, BrowseOutcome::Cached);
    assert_eq!(session.browse_count(), 0);
    assert_eq!(cache.children_of(line), before.as_slice());
    assert_eq!(listener.statuses(), vec![(STATUS_CACHED.to_string(), true)]);
    assert_eq!(engine.stats().snapshot().skipped, 1);
}

#[tokio::test]
async fn test_rebrowse_on_expand_refetches() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, vec![NodeFixtures::folder("Line1")]);
    session.script_children(NodeFixtures::id("Line1"), Scenario::tags(3));
    let listener = RecordingListener::shared();
    let mut engine = BrowseEngine::new(Arc::clone(&session)).with_listener(listener.clone());
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;
    let line = child(&cache, cache.root(), "Line1");
    engine.browse(&mut cache, Some(line)).await;

    session.script_children(NodeFixtures::id("Line1"), Scenario::tags(1));
    engine.set_rebrowse_on_expand(true);
    let outcome = engine.browse_checked(&mut cache, Some(line)).await.unwrap();

    assert_eq!(outcome, BrowseOutcome::Fetched { count: 1, pages: 1 });
    cache.assert_texts(line, &["Tag000"]);
}

#[tokio::test]
async fn test_root_is_always_refetched() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, Scenario::root_children());
    let (engine, _) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;
    engine.browse(&mut cache, None).await;

    assert_eq!(session.browse_count(), 2);
    assert_eq!(cache.children_of(cache.root()).len(), 5);
}

// =============================================================================
// Unresolvable Targets
// =============================================================================

#[tokio::test]
async fn test_placeholder_entry_cannot_be_browsed() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, vec![NodeFixtures::folder("F")]);
    let (engine, listener) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;
    let folder = child(&cache, cache.root(), "F");
    let placeholder = cache.children_of(folder)[0];
    listener.clear();

    let err = engine
        .browse_checked(&mut cache, Some(placeholder))
        .await
        .unwrap_err();
    assert!(matches!(err, BrowseError::UnresolvedReference { .. }));
    assert_eq!(listener.statuses().len(), 1);
    assert_eq!(session.browse_count(), 1);
}

#[tokio::test]
async fn test_remote_reference_is_not_browsed() {
    let session = MockSession::shared();
    session.script_children(
        well_known::ROOT_FOLDER,
        vec![NodeFixtures::remote_variable("Far")],
    );
    let (engine, _) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    engine.browse(&mut cache, None).await;
    let far = child(&cache, cache.root(), "Far");

    assert_eq!(engine.browse(&mut cache, Some(far)).await, -1);
    assert_eq!(session.browse_count(), 1);
}

// =============================================================================
// Observer Brackets
// =============================================================================

#[tokio::test]
async fn test_update_scopes_are_balanced() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, vec![NodeFixtures::folder("F")]);
    let (engine, _) = engine_with_listener(&session);
    let observer = RecordingObserver::new();
    let mut cache = TreeCache::with_observer(observer.clone());

    engine.browse(&mut cache, None).await;
    assert!(observer.begins() >= 1);
    assert!(observer.is_balanced());

    let folder = child(&cache, cache.root(), "F");
    session.fail_next_browse();
    engine.browse(&mut cache, Some(folder)).await;
    assert!(observer.is_balanced());

    let begins = observer.begins();
    engine.browse(&mut cache, Some(folder)).await;
    assert!(observer.is_balanced());
    assert!(observer.begins() > begins);
}

// =============================================================================
// Selection / Activation / Drag
// =============================================================================

#[tokio::test]
async fn test_activation_and_drag_only_for_variables() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, Scenario::root_children());
    let (engine, listener) = engine_with_listener(&session);
    let mut cache = TreeCache::new();
    engine.browse(&mut cache, None).await;

    let temperature = child(&cache, cache.root(), "Temperature");
    let objects = child(&cache, cache.root(), "Objects");

    assert!(engine.activate(&cache, temperature));
    assert!(!engine.activate(&cache, objects));
    assert_eq!(listener.activated(), vec![NodeFixtures::id("Temperature")]);

    let payload = engine.drag_payload(&cache, temperature).unwrap();
    assert_eq!(payload.node_class, NodeClass::Variable);
    assert_eq!(payload.text(), "ns=1;s=Temperature");
    assert!(engine.drag_payload(&cache, objects).is_none());
}

#[tokio::test]
async fn test_selection_reports_known_entries_only() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, vec![NodeFixtures::folder("F")]);
    let (engine, listener) = engine_with_listener(&session);
    let mut cache = TreeCache::new();
    engine.browse(&mut cache, None).await;

    let folder = child(&cache, cache.root(), "F");
    let placeholder = cache.children_of(folder)[0];
    engine.select(&cache, Some(folder));

    // Re-browsing the root frees the old subtree.
    engine.browse(&mut cache, None).await;
    engine.select(&cache, Some(placeholder));
    engine.select(&cache, None);

    assert_eq!(listener.selections(), vec![Some(folder), None, None]);
}

// =============================================================================
// Connection Status
// =============================================================================

#[tokio::test]
async fn test_connection_status_drives_root() {
    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, Scenario::root_children());
    let (engine, _) = engine_with_listener(&session);
    let mut cache = TreeCache::new();

    assert_eq!(
        engine
            .on_connection_status(&mut cache, ConnectionStatus::Connected)
            .await,
        0
    );
    assert_eq!(cache.children_of(cache.root()).len(), 5);

    engine
        .on_connection_status(&mut cache, ConnectionStatus::Interrupted)
        .await;
    assert_eq!(cache.children_of(cache.root()).len(), 5);

    engine
        .on_connection_status(&mut cache, ConnectionStatus::Disconnected)
        .await;
    assert!(cache.children_of(cache.root()).is_empty());
    assert_eq!(cache.len(), 1);
}
