// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory cache of the discovered hierarchy.
//!
//! Entries live in a generational arena and are addressed by [`EntryId`].
//! Ids of removed entries never alias newly inserted ones, so a stale id held
//! by the presentation layer simply resolves to nothing.
//!
//! # Update scopes
//!
//! Every mutation goes through an [`UpdateScope`] obtained from
//! [`TreeCache::begin_update`]. Opening the scope notifies the
//! [`TreeObserver`] that a batch starts; dropping it notifies the end of the
//! batch. Observers can therefore defer redraws and never see a half-updated
//! sibling list.
//!
//! ```text
//! begin_update() ──▶ observer.begin_update()
//!     │  clear_children / append_node / set_browsed / sort_children
//!     ▼
//! drop(scope)    ──▶ observer.end_update()
//! ```
//!
//! # Placeholders
//!
//! A `Node` entry that has not been browsed exposes exactly one
//! [`EntryPayload::Placeholder`] child so the presentation layer offers an
//! expand affordance. The synthetic root has no placeholder.

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::browse::classify::{self, Category};
use crate::browse::NodeRef;

/// Text of placeholder entries.
pub const PLACEHOLDER_TEXT: &str = "dummy";

/// Text of the synthetic root entry.
pub const ROOT_TEXT: &str = "Root";

// =============================================================================
// EntryId / Payload / Entry
// =============================================================================

/// Stable handle of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(Index);

/// What a tree entry stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPayload {
    /// The synthetic root above the server's RootFolder children.
    Root,
    /// A discovered reference.
    Node(NodeRef),
    /// Expand affordance of an unbrowsed entry.
    Placeholder,
}

/// One visual node of the tree.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    payload: EntryPayload,
    category: Option<Category>,
    text: String,
    browsed: bool,
    parent: Option<EntryId>,
    children: Vec<EntryId>,
}

impl TreeEntry {
    fn new(payload: EntryPayload, category: Option<Category>, parent: Option<EntryId>) -> Self {
        let text = match &payload {
            EntryPayload::Root => ROOT_TEXT.to_string(),
            EntryPayload::Node(node) => node.display_text().to_string(),
            EntryPayload::Placeholder => PLACEHOLDER_TEXT.to_string(),
        };
        Self {
            payload,
            category,
            text,
            browsed: false,
            parent,
            children: Vec::new(),
        }
    }

    /// Returns the payload.
    pub fn payload(&self) -> &EntryPayload {
        &self.payload
    }

    /// Returns the reference of a `Node` entry.
    pub fn node_ref(&self) -> Option<&NodeRef> {
        match &self.payload {
            EntryPayload::Node(node) => Some(node),
            EntryPayload::Root | EntryPayload::Placeholder => None,
        }
    }

    /// Returns `true` for placeholder entries.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.payload, EntryPayload::Placeholder)
    }

    /// Returns `true` for the synthetic root.
    pub fn is_root(&self) -> bool {
        matches!(self.payload, EntryPayload::Root)
    }

    /// Returns the category, `None` for root and placeholders.
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Returns the icon key of the entry.
    pub fn icon_key(&self) -> Option<&'static str> {
        self.category.map(|c| c.icon_key())
    }

    /// Returns the displayed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether children have been fetched at least once.
    pub fn is_browsed(&self) -> bool {
        self.browsed
    }

    /// Returns the parent entry.
    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    /// Returns the ordered children.
    pub fn children(&self) -> &[EntryId] {
        &self.children
    }

    fn sort_key(&self) -> (Category, &str) {
        (self.category.unwrap_or(Category::Error), self.text.as_str())
    }
}

// =============================================================================
// TreeObserver
// =============================================================================

/// Receives the begin/end brackets of every update scope.
pub trait TreeObserver {
    /// A batch of mutations starts.
    fn begin_update(&self) {}

    /// The batch is complete and may be rendered.
    fn end_update(&self) {}
}

/// Observer that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TreeObserver for NoopObserver {}

// =============================================================================
// TreeCache
// =============================================================================

/// Owner of every tree entry.
pub struct TreeCache {
    arena: Arena<TreeEntry>,
    root: EntryId,
    observer: Box<dyn TreeObserver>,
}

impl TreeCache {
    /// Creates a cache holding only the synthetic root.
    pub fn new() -> Self {
        Self::with_observer(NoopObserver)
    }

    /// Creates a cache reporting update scopes to `observer`.
    pub fn with_observer(observer: impl TreeObserver + 'static) -> Self {
        let mut arena = Arena::new();
        let root = EntryId(arena.insert(TreeEntry::new(
            EntryPayload::Root,
            Some(Category::Folder),
            None,
        )));
        Self {
            arena,
            root,
            observer: Box::new(observer),
        }
    }

    /// Returns the synthetic root.
    pub fn root(&self) -> EntryId {
        self.root
    }

    /// Returns an entry.
    pub fn get(&self, id: EntryId) -> Option<&TreeEntry> {
        self.arena.get(id.0)
    }

    /// Returns `true` if the id refers to a live entry.
    pub fn contains(&self, id: EntryId) -> bool {
        self.arena.contains(id.0)
    }

    /// Returns the ordered children of an entry (empty for unknown ids).
    pub fn children_of(&self, id: EntryId) -> &[EntryId] {
        self.get(id).map(TreeEntry::children).unwrap_or(&[])
    }

    /// Iterates over the child entries of an entry.
    pub fn child_entries(&self, id: EntryId) -> impl Iterator<Item = &TreeEntry> + '_ {
        self.children_of(id)
            .iter()
            .filter_map(move |child| self.get(*child))
    }

    /// Returns the parent of an entry.
    pub fn parent_of(&self, id: EntryId) -> Option<EntryId> {
        self.get(id).and_then(TreeEntry::parent)
    }

    /// Finds the first child whose text matches exactly.
    pub fn find_child(&self, id: EntryId, text: &str) -> Option<EntryId> {
        self.children_of(id)
            .iter()
            .copied()
            .find(|child| self.get(*child).is_some_and(|e| e.text() == text))
    }

    /// Returns the number of live entries, root and placeholders included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if only the root exists.
    pub fn is_empty(&self) -> bool {
        self.arena.len() <= 1
    }

    /// Opens an update scope.
    pub fn begin_update(&mut self) -> UpdateScope<'_> {
        self.observer.begin_update();
        UpdateScope { cache: self }
    }

    fn remove_subtree(&mut self, id: EntryId) -> usize {
        let Some(entry) = self.arena.remove(id.0) else {
            return 0;
        };
        1 + entry
            .children
            .into_iter()
            .map(|child| self.remove_subtree(child))
            .sum::<usize>()
    }
}

impl Default for TreeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TreeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeCache")
            .field("entries", &self.arena.len())
            .field("root", &self.root)
            .finish()
    }
}

// =============================================================================
// UpdateScope
// =============================================================================

/// Exclusive mutation scope over a [`TreeCache`].
///
/// The observer's `end_update` runs when the scope is dropped, including on
/// early returns.
pub struct UpdateScope<'a> {
    cache: &'a mut TreeCache,
}

impl UpdateScope<'_> {
    /// Returns a read view of the cache.
    pub fn cache(&self) -> &TreeCache {
        self.cache
    }

    /// Removes every child of `parent` together with its subtree.
    ///
    /// Returns the number of entries freed.
    #[instrument(level = "trace", skip(self))]
    pub fn clear_children(&mut self, parent: EntryId) -> usize {
        let children = match self.cache.arena.get_mut(parent.0) {
            Some(entry) => std::mem::take(&mut entry.children),
            None => return 0,
        };
        children
            .into_iter()
            .map(|child| self.cache.remove_subtree(child))
            .sum()
    }

    /// Appends a classified reference with its placeholder child.
    pub fn append_node(
        &mut self,
        parent: EntryId,
        node: NodeRef,
        category: Category,
    ) -> Option<EntryId> {
        let id = self.insert_child(parent, EntryPayload::Node(node), Some(category))?;
        self.insert_child(id, EntryPayload::Placeholder, None)?;
        Some(id)
    }

    /// Replaces all children of `parent` with classified references.
    ///
    /// Returns the number of children appended, or `None` if `parent` is gone.
    pub fn replace_children(
        &mut self,
        parent: EntryId,
        nodes: impl IntoIterator<Item = (NodeRef, Category)>,
    ) -> Option<usize> {
        if !self.cache.contains(parent) {
            return None;
        }
        self.clear_children(parent);
        let mut appended = 0;
        for (node, category) in nodes {
            self.append_node(parent, node, category)?;
            appended += 1;
        }
        Some(appended)
    }

    /// Gives an unbrowsed, childless `Node` entry its placeholder back.
    pub fn restore_placeholder(&mut self, id: EntryId) -> bool {
        let needs_placeholder = self.cache.get(id).is_some_and(|entry| {
            entry.node_ref().is_some() && !entry.browsed && entry.children.is_empty()
        });
        needs_placeholder && self.insert_child(id, EntryPayload::Placeholder, None).is_some()
    }

    /// Sets the browsed flag.
    pub fn set_browsed(&mut self, id: EntryId, browsed: bool) -> bool {
        match self.cache.arena.get_mut(id.0) {
            Some(entry) => {
                entry.browsed = browsed;
                true
            }
            None => false,
        }
    }

    /// Sorts the full sibling set of `parent`.
    pub fn sort_children(&mut self, parent: EntryId) {
        let Some(entry) = self.cache.get(parent) else {
            return;
        };
        let mut children = entry.children.clone();
        let arena = &self.cache.arena;
        classify::sort_siblings(&mut children, |child| match arena.get(child.0) {
            Some(entry) => entry.sort_key(),
            None => (Category::Error, ""),
        });
        if let Some(entry) = self.cache.arena.get_mut(parent.0) {
            entry.children = children;
        }
    }

    fn insert_child(
        &mut self,
        parent: EntryId,
        payload: EntryPayload,
        category: Option<Category>,
    ) -> Option<EntryId> {
        if !self.cache.contains(parent) {
            return None;
        }
        let id = EntryId(
            self.cache
                .arena
                .insert(TreeEntry::new(payload, category, Some(parent))),
        );
        self.cache.arena.get_mut(parent.0)?.children.push(id);
        Some(id)
    }
}

impl Drop for UpdateScope<'_> {
    fn drop(&mut self) {
        self.cache.observer.end_update();
    }
}

// =============================================================================
// Tests
// =============================================================================
