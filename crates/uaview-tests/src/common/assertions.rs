// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom assertions for explorer tests.

use uaview_core::{
    browse::classify,
    subscription::VisualState,
    tree::{EntryId, TreeCache},
};

use super::mocks::RecordingSlot;

// =============================================================================
// Tree Assertions
// =============================================================================

/// Assertions over the children of a tree entry.
pub trait TreeAssertions {
    /// Assert the children of `parent` are in sibling order.
    fn assert_sorted(&self, parent: EntryId);

    /// Assert `parent` holds exactly one placeholder child.
    fn assert_placeholder_only(&self, parent: EntryId);

    /// Assert the children texts of `parent`, in order.
    fn assert_texts(&self, parent: EntryId, expected: &[&str]);

    /// Returns the children texts of `parent`.
    fn texts(&self, parent: EntryId) -> Vec<String>;
}

impl TreeAssertions for TreeCache {
    fn assert_sorted(&self, parent: EntryId) {
        let children: Vec<_> = self.child_entries(parent).collect();
        let ordered = classify::is_ordered(&children, |entry| {
            (
                entry.category().unwrap_or(classify::Category::Error),
                entry.text(),
            )
        });
        assert!(
            ordered,
            "Children are not in sibling order: {:?}",
            self.texts(parent)
        );
    }

    fn assert_placeholder_only(&self, parent: EntryId) {
        let children: Vec<_> = self.child_entries(parent).collect();
        assert_eq!(
            children.len(),
            1,
            "Expected a single placeholder child, found {:?}",
            self.texts(parent)
        );
        assert!(
            children[0].is_placeholder(),
            "Expected a placeholder child, found '{}'",
            children[0].text()
        );
    }

    fn assert_texts(&self, parent: EntryId, expected: &[&str]) {
        let actual = self.texts(parent);
        assert_eq!(
            actual, expected,
            "Children mismatch: expected {:?}, got {:?}",
            expected, actual
        );
    }

    fn texts(&self, parent: EntryId) -> Vec<String> {
        self.child_entries(parent)
            .map(|entry| entry.text().to_string())
            .collect()
    }
}

// =============================================================================
// Slot Assertions
// =============================================================================

/// Assertions over what a consumer slot displayed.
pub trait SlotAssertions {
    /// Assert the last displayed text and state.
    fn assert_last(&self, text: &str, state: VisualState);

    /// Assert the slot was never touched.
    fn assert_untouched(&self);
}

impl SlotAssertions for RecordingSlot {
    fn assert_last(&self, text: &str, state: VisualState) {
        match self.last() {
            Some((actual_text, actual_state)) => {
                assert_eq!(actual_text, text, "Slot text mismatch");
                assert_eq!(
                    actual_state, state,
                    "Slot state mismatch for '{}'",
                    actual_text
                );
            }
            None => panic!("Slot shows nothing, expected '{}' ({:?})", text, state),
        }
    }

    fn assert_untouched(&self) {
        assert!(
            self.is_untouched(),
            "Slot should be untouched, shows {:?}",
            self.shown()
        );
    }
}
