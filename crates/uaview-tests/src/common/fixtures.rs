// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Reference fixtures and address-space scenarios.

use uaview_core::{
    browse::NodeRef,
    types::{well_known, ExpandedNodeId, NodeClass, NodeId},
};

/// Namespace index of the test server namespace.
pub const TEST_NS: u16 = 1;

/// Factory for the reference shapes returned by a server.
pub struct NodeFixtures;

impl NodeFixtures {
    /// An Object typed as FolderType, organized under its parent.
    pub fn folder(name: &str) -> NodeRef {
        NodeRef::new(NodeId::string(TEST_NS, name), NodeClass::Object)
            .with_display_name(name)
            .with_reference_type(well_known::ORGANIZES)
            .with_type_definition(well_known::FOLDER_TYPE)
    }

    /// A plain Variable.
    pub fn variable(name: &str) -> NodeRef {
        NodeRef::new(NodeId::string(TEST_NS, name), NodeClass::Variable)
            .with_display_name(name)
            .with_reference_type(well_known::HAS_COMPONENT)
            .with_type_definition(well_known::BASE_DATA_VARIABLE_TYPE)
    }

    /// A non-folder Object.
    pub fn object(name: &str) -> NodeRef {
        NodeRef::new(NodeId::string(TEST_NS, name), NodeClass::Object)
            .with_display_name(name)
            .with_reference_type(well_known::HAS_COMPONENT)
    }

    /// A Variable reached through HasProperty.
    pub fn property(name: &str) -> NodeRef {
        NodeRef::new(NodeId::string(TEST_NS, name), NodeClass::Variable)
            .with_display_name(name)
            .with_reference_type(well_known::HAS_PROPERTY)
            .with_type_definition(well_known::PROPERTY_TYPE)
    }

    /// A Method.
    pub fn method(name: &str) -> NodeRef {
        NodeRef::new(NodeId::string(TEST_NS, name), NodeClass::Method)
            .with_display_name(name)
            .with_reference_type(well_known::HAS_COMPONENT)
    }

    /// A Variable living on another server.
    pub fn remote_variable(name: &str) -> NodeRef {
        NodeRef::new(
            ExpandedNodeId::remote(NodeId::string(TEST_NS, name), 2),
            NodeClass::Variable,
        )
        .with_display_name(name)
    }

    /// A reference with no display name.
    pub fn unnamed(identifier: u32) -> NodeRef {
        NodeRef::new(NodeId::numeric(TEST_NS, identifier), NodeClass::Object)
    }

    /// Canonical id of a fixture created with `name`.
    pub fn id(name: &str) -> NodeId {
        NodeId::string(TEST_NS, name)
    }
}

/// Canned address-space layouts.
pub struct Scenario;

impl Scenario {
    /// Three folders and two variables under RootFolder, in scrambled server
    /// order.
    pub fn root_children() -> Vec<NodeRef> {
        vec![
            NodeFixtures::variable("Temperature"),
            NodeFixtures::folder("Views"),
            NodeFixtures::folder("Objects"),
            NodeFixtures::variable("Pressure"),
            NodeFixtures::folder("Types"),
        ]
    }

    /// Texts of [`root_children`](Self::root_children) in display order.
    pub fn root_children_sorted() -> Vec<&'static str> {
        vec!["Objects", "Types", "Views", "Pressure", "Temperature"]
    }

    /// One reference of every category shape, shuffled.
    pub fn mixed_children() -> Vec<NodeRef> {
        vec![
            NodeFixtures::variable("Speed"),
            NodeFixtures::method("Reset"),
            NodeFixtures::property("EngineeringUnits"),
            NodeFixtures::folder("Diagnostics"),
            NodeFixtures::object("Motor"),
            NodeFixtures::unnamed(900),
        ]
    }

    /// `count` variables named `Tag000`, `Tag001`, ...
    pub fn tags(count: usize) -> Vec<NodeRef> {
        (0..count)
            .map(|i| NodeFixtures::variable(&format!("Tag{i:03}")))
            .collect()
    }
}
