// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Classification of references into display categories and the sibling
//! ordering derived from it.
//!
//! Classification is a pure function of the reference attributes and the
//! namespace table. The first matching rule wins:
//!
//! 1. type definition resolves to `FolderType` (i=61) → [`Category::Folder`]
//! 2. reference type is `HasProperty` (i=46) → [`Category::Property`]
//! 3. otherwise the node class maps directly; `Unspecified` → [`Category::Error`]
//!
//! Siblings are ordered by category rank, then by display name compared
//! case-insensitively. The sort is stable and always applied to the full
//! sibling set.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::node_ref::NodeRef;
use crate::types::{well_known, NamespaceTable, NodeClass};

// =============================================================================
// Category
// =============================================================================

/// Display category of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Unknown or unmapped node class.
    Error,
    /// Method node.
    Method,
    /// Object node.
    Object,
    /// Object type node.
    ObjectType,
    /// Variable reached through `HasProperty`.
    Property,
    /// Reference type node.
    ReferenceType,
    /// Object typed as `FolderType`.
    Folder,
    /// Variable node.
    Variable,
    /// Variable type node.
    VariableType,
    /// View node.
    View,
    /// Data type node.
    DataType,
}

impl Category {
    /// Every category, in rank order.
    pub const ALL: [Category; 11] = [
        Category::Error,
        Category::Method,
        Category::Object,
        Category::ObjectType,
        Category::Property,
        Category::ReferenceType,
        Category::Folder,
        Category::Variable,
        Category::VariableType,
        Category::View,
        Category::DataType,
    ];

    /// Returns the primary sort rank. Rank 7 is unassigned.
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Error => 0,
            Self::Method => 1,
            Self::Object => 2,
            Self::ObjectType => 3,
            Self::Property => 4,
            Self::ReferenceType => 5,
            Self::Folder => 6,
            Self::Variable => 8,
            Self::VariableType => 9,
            Self::View => 10,
            Self::DataType => 11,
        }
    }

    /// Returns the icon key used by the presentation layer.
    pub const fn icon_key(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Method => "method",
            Self::Object => "object",
            Self::ObjectType => "objecttype",
            Self::Property => "property",
            Self::ReferenceType => "reftype",
            Self::Folder => "treefolder",
            Self::Variable => "variable",
            Self::VariableType => "variabletype",
            Self::View => "view",
            Self::DataType => "datatype",
        }
    }

    /// Maps a node class onto its direct category.
    pub const fn from_node_class(class: NodeClass) -> Self {
        match class {
            NodeClass::Object => Self::Object,
            NodeClass::Variable => Self::Variable,
            NodeClass::Method => Self::Method,
            NodeClass::ObjectType => Self::ObjectType,
            NodeClass::VariableType => Self::VariableType,
            NodeClass::ReferenceType => Self::ReferenceType,
            NodeClass::DataType => Self::DataType,
            NodeClass::View => Self::View,
            NodeClass::Unspecified => Self::Error,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.icon_key())
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Classifies a reference.
pub fn classify(node: &NodeRef, namespaces: &NamespaceTable) -> Category {
    if namespaces.resolve(&node.type_definition_id).as_ref() == Some(&well_known::FOLDER_TYPE) {
        return Category::Folder;
    }
    if node.reference_type_id == well_known::HAS_PROPERTY {
        return Category::Property;
    }
    Category::from_node_class(node.node_class)
}

// =============================================================================
// Ordering
// =============================================================================

/// Compares two names case-insensitively without allocating.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Compares two siblings by `(rank, case-insensitive name)`.
pub fn compare(a: (Category, &str), b: (Category, &str)) -> Ordering {
    a.0.rank()
        .cmp(&b.0.rank())
        .then_with(|| compare_names(a.1, b.1))
}

/// Stably sorts siblings by `(rank, case-insensitive name)`.
pub fn sort_siblings<'k, T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (Category, &'k str),
{
    items.sort_by(|a, b| compare(key(a), key(b)));
}

/// Returns `true` if the siblings are non-decreasing in sibling order.
pub fn is_ordered<'k, T, F>(items: &[T], key: F) -> bool
where
    F: Fn(&T) -> (Category, &'k str),
{
    items
        .windows(2)
        .all(|pair| compare(key(&pair[0]), key(&pair[1])) != Ordering::Greater)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExpandedNodeId, NodeId};

    fn node(class: NodeClass) -> NodeRef {
        NodeRef::new(NodeId::numeric(2, 10), class)
    }

    #[test]
    fn test_folder_wins_over_everything() {
        let table = NamespaceTable::new();
        let folder = node(NodeClass::Object)
            .with_type_definition(well_known::FOLDER_TYPE)
            .with_reference_type(well_known::HAS_PROPERTY);
        assert_eq!(classify(&folder, &table), Category::Folder);
    }

    #[test]
    fn test_folder_type_by_namespace_uri() {
        let table = NamespaceTable::new();
        let folder = node(NodeClass::Object).with_type_definition(
            ExpandedNodeId::with_namespace_uri(
                NodeId::numeric(0, 61),
                crate::types::OPC_UA_NAMESPACE,
            ),
        );
        assert_eq!(classify(&folder, &table), Category::Folder);
    }

    #[test]
    fn test_property_before_node_class() {
        let table = NamespaceTable::new();
        let property = node(NodeClass::Variable).with_reference_type(well_known::HAS_PROPERTY);
        assert_eq!(classify(&property, &table), Category::Property);
    }

    #[test]
    fn test_node_class_mapping() {
        let table = NamespaceTable::new();
        assert_eq!(classify(&node(NodeClass::Variable), &table), Category::Variable);
        assert_eq!(classify(&node(NodeClass::Method), &table), Category::Method);
        assert_eq!(classify(&node(NodeClass::View), &table), Category::View);
        assert_eq!(classify(&node(NodeClass::Unspecified), &table), Category::Error);
    }

    #[test]
    fn test_classification_is_pure() {
        let table = NamespaceTable::new();
        let a = node(NodeClass::DataType).with_display_name("Int32");
        let b = a.clone();
        assert_eq!(classify(&a, &table), classify(&b, &table));
    }

    #[test]
    fn test_rank_is_a_total_order() {
        let ranks: Vec<u8> = Category::ALL.iter().map(Category::rank).collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Category::Folder.icon_key(), "treefolder");
        assert_eq!(Category::ReferenceType.icon_key(), "reftype");
    }

    #[test]
    fn test_sort_siblings() {
        let mut items = vec![
            (Category::Variable, "speed"),
            (Category::Folder, "beta"),
            (Category::Variable, "Alpha"),
            (Category::Folder, "Alpha"),
            (Category::Method, "zeta"),
        ];
        sort_siblings(&mut items, |(c, n)| (*c, *n));
        assert_eq!(
            items,
            vec![
                (Category::Method, "zeta"),
                (Category::Folder, "Alpha"),
                (Category::Folder, "beta"),
                (Category::Variable, "Alpha"),
                (Category::Variable, "speed"),
            ]
        );
        assert!(is_ordered(&items, |(c, n)| (*c, *n)));

        let before = items.clone();
        sort_siblings(&mut items, |(c, n)| (*c, *n));
        assert_eq!(items, before);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let mut items = vec![(Category::Object, "pump", 1), (Category::Object, "PUMP", 2)];
        sort_siblings(&mut items, |(c, n, _)| (*c, *n));
        assert_eq!(items[0].2, 1);
        assert_eq!(items[1].2, 2);
    }
}
