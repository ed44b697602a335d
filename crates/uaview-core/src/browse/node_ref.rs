// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Immutable description of one discovered reference.

use serde::{Deserialize, Serialize};

use crate::types::{well_known, ExpandedNodeId, NamespaceTable, NodeClass, NodeId};

/// Text shown for references without a display name.
pub const MISSING_DISPLAY_NAME: &str = "null";

/// One child relationship returned by a browse or continuation call.
///
/// Created fresh for every response and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    /// Target node, possibly absolute.
    pub target_id: ExpandedNodeId,

    /// Localized display name, absent when the server sent none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Node class of the target.
    #[serde(default)]
    pub node_class: NodeClass,

    /// Reference type from the parent to the target.
    pub reference_type_id: NodeId,

    /// Type definition of the target (null id when not reported).
    pub type_definition_id: ExpandedNodeId,
}

impl NodeRef {
    /// Creates a reference reached through `Organizes` with no type definition.
    pub fn new(target_id: impl Into<ExpandedNodeId>, node_class: NodeClass) -> Self {
        Self {
            target_id: target_id.into(),
            display_name: None,
            node_class,
            reference_type_id: well_known::ORGANIZES,
            type_definition_id: ExpandedNodeId::local(NodeId::null()),
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the reference type.
    pub fn with_reference_type(mut self, reference_type_id: NodeId) -> Self {
        self.reference_type_id = reference_type_id;
        self
    }

    /// Sets the type definition.
    pub fn with_type_definition(mut self, type_definition_id: impl Into<ExpandedNodeId>) -> Self {
        self.type_definition_id = type_definition_id.into();
        self
    }

    /// Returns the display name, or `"null"` when absent.
    pub fn display_text(&self) -> &str {
        self.display_name.as_deref().unwrap_or(MISSING_DISPLAY_NAME)
    }

    /// Returns `true` if the target is namespace-URI qualified or remote.
    pub fn is_absolute(&self) -> bool {
        self.target_id.is_absolute()
    }

    /// Returns `true` for non-absolute Variable targets, the only ones that
    /// can be dragged, activated or monitored.
    pub fn is_live_variable(&self) -> bool {
        !self.is_absolute() && self.node_class == NodeClass::Variable
    }

    /// Resolves the target into a canonical id.
    pub fn resolve(&self, namespaces: &NamespaceTable) -> Option<NodeId> {
        namespaces.resolve(&self.target_id)
    }
}
