// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Address-space types shared by the browse engine and the subscription
//! dispatcher.
//!
//! - **NodeId / ExpandedNodeId**: node identifiers, local and server-qualified
//! - **NamespaceTable**: resolution of expanded ids into canonical ids
//! - **NodeClass / BrowseDirection / AttributeId**: protocol enumerations
//! - **StatusCode**: service and value status with well-known names
//! - **UaValue**: decoded variant values as delivered by data changes
//!
//! # Examples
//!
//! ```
//! use uaview_core::types::{ExpandedNodeId, NamespaceTable, NodeId};
//!
//! let mut namespaces = NamespaceTable::new();
//! namespaces.push("urn:plant:line1");
//!
//! let remote = ExpandedNodeId::with_namespace_uri(NodeId::string(0, "Pump"), "urn:plant:line1");
//! assert_eq!(namespaces.resolve(&remote), Some(NodeId::string(1, "Pump")));
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// NodeId
// =============================================================================

/// Canonical node identifier, relative to the session's namespace table.
///
/// ```
/// use uaview_core::types::NodeId;
///
/// let parsed: NodeId = "ns=3;s=\"start\"".parse().unwrap();
/// assert_eq!(parsed, NodeId::string(3, "\"start\""));
/// assert_eq!(NodeId::numeric(0, 85).to_string(), "i=85");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node ID.
    #[inline]
    pub const fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node ID.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque (byte string) node ID.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Returns the null node ID (ns=0, i=0).
    #[inline]
    pub const fn null() -> Self {
        Self::numeric(0, 0)
    }

    /// Returns `true` if this is the null node ID.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && matches!(self.identifier, NodeIdentifier::Numeric(0))
    }

    /// Returns the numeric value if this is a numeric identifier.
    #[inline]
    pub fn as_numeric(&self) -> Option<u32> {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value if this is a string identifier.
    #[inline]
    pub fn as_string(&self) -> Option<&str> {
        match &self.identifier {
            NodeIdentifier::String(v) => Some(v),
            _ => None,
        }
    }

    /// Converts to the textual form `ns=<index>;<type>=<value>`.
    ///
    /// The namespace prefix is omitted for namespace 0.
    pub fn to_opc_string(&self) -> String {
        if self.namespace_index == 0 {
            self.identifier.to_string()
        } else {
            format!("ns={};{}", self.namespace_index, self.identifier)
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = InvalidNodeId;

    /// Parses `ns=2;i=1001`, `ns=2;s=Name`, `ns=2;g=<uuid>`, `ns=2;b=<base64>`
    /// and the same forms without the namespace prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns, id) = rest
                    .split_once(';')
                    .ok_or_else(|| InvalidNodeId::new(s, "missing identifier after namespace"))?;
                let ns: u16 = ns
                    .parse()
                    .map_err(|_| InvalidNodeId::new(s, "invalid namespace index"))?;
                (ns, id)
            }
            None => (0, s),
        };

        Ok(Self {
            namespace_index,
            identifier: parse_identifier(s, identifier_part)?,
        })
    }
}

fn parse_identifier(input: &str, part: &str) -> Result<NodeIdentifier, InvalidNodeId> {
    if let Some(id) = part.strip_prefix("i=") {
        id.parse()
            .map(NodeIdentifier::Numeric)
            .map_err(|_| InvalidNodeId::new(input, "invalid numeric identifier"))
    } else if let Some(id) = part.strip_prefix("s=") {
        Ok(NodeIdentifier::String(id.to_string()))
    } else if let Some(id) = part.strip_prefix("g=") {
        Uuid::parse_str(id)
            .map(NodeIdentifier::Guid)
            .map_err(|e| InvalidNodeId::new(input, format!("invalid GUID: {e}")))
    } else if let Some(id) = part.strip_prefix("b=") {
        BASE64
            .decode(id)
            .map(NodeIdentifier::Opaque)
            .map_err(|e| InvalidNodeId::new(input, format!("invalid base64: {e}")))
    } else {
        Err(InvalidNodeId::new(
            input,
            "unknown identifier type, expected i=, s=, g= or b=",
        ))
    }
}

/// Error returned when a node id string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid node id '{input}': {reason}")]
pub struct InvalidNodeId {
    /// The rejected input.
    pub input: String,
    /// Why it was rejected.
    pub reason: String,
}

impl InvalidNodeId {
    fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// The four identifier kinds of a node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),
    /// String identifier.
    String(String),
    /// GUID identifier.
    Guid(Uuid),
    /// Opaque identifier.
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={v}"),
            Self::String(v) => write!(f, "s={v}"),
            Self::Guid(v) => write!(f, "g={v}"),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// ExpandedNodeId
// =============================================================================

/// A node id that may be qualified by a namespace URI and a server index.
///
/// References returned by a browse carry expanded ids. They must be resolved
/// through the session's [`NamespaceTable`] before being used in further
/// service calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpandedNodeId {
    /// The node id. Its namespace index is ignored when `namespace_uri` is set.
    pub node_id: NodeId,

    /// Namespace URI, when the id is namespace-qualified by URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_uri: Option<String>,

    /// Server index (0 = the connected server).
    #[serde(default)]
    pub server_index: u32,
}

impl ExpandedNodeId {
    /// Wraps a local node id.
    pub fn local(node_id: NodeId) -> Self {
        Self {
            node_id,
            namespace_uri: None,
            server_index: 0,
        }
    }

    /// Creates an id qualified by namespace URI.
    pub fn with_namespace_uri(node_id: NodeId, uri: impl Into<String>) -> Self {
        Self {
            node_id,
            namespace_uri: Some(uri.into()),
            server_index: 0,
        }
    }

    /// Creates an id pointing into another server.
    pub fn remote(node_id: NodeId, server_index: u32) -> Self {
        Self {
            node_id,
            namespace_uri: None,
            server_index,
        }
    }

    /// Returns `true` if the id is qualified by a namespace URI or points at
    /// another server.
    pub fn is_absolute(&self) -> bool {
        self.namespace_uri.is_some() || self.server_index != 0
    }

    /// Returns `true` if the id points at another server.
    pub fn is_remote(&self) -> bool {
        self.server_index != 0
    }
}

impl From<NodeId> for ExpandedNodeId {
    fn from(node_id: NodeId) -> Self {
        Self::local(node_id)
    }
}

impl fmt::Display for ExpandedNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.server_index != 0 {
            write!(f, "svr={};", self.server_index)?;
        }
        match &self.namespace_uri {
            Some(uri) => write!(f, "nsu={};{}", uri, self.node_id.identifier),
            None => write!(f, "{}", self.node_id),
        }
    }
}

// =============================================================================
// NamespaceTable
// =============================================================================

/// The standard OPC UA namespace URI, always at index 0.
pub const OPC_UA_NAMESPACE: &str = "http://opcfoundation.org/UA/";

/// Namespace index to URI mapping owned by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceTable {
    uris: Vec<String>,
}

impl NamespaceTable {
    /// Creates a table containing only the standard namespace.
    pub fn new() -> Self {
        Self {
            uris: vec![OPC_UA_NAMESPACE.to_string()],
        }
    }

    /// Creates a table from a complete URI list (index 0 first).
    pub fn from_uris<I, S>(uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            uris: uris.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends a URI, returning its index. Known URIs keep their index.
    pub fn push(&mut self, uri: impl Into<String>) -> u16 {
        let uri = uri.into();
        if let Some(index) = self.index_of(&uri) {
            return index;
        }
        self.uris.push(uri);
        (self.uris.len() - 1) as u16
    }

    /// Returns the index of a URI.
    pub fn index_of(&self, uri: &str) -> Option<u16> {
        self.uris
            .iter()
            .position(|u| u == uri)
            .and_then(|i| u16::try_from(i).ok())
    }

    /// Returns the URI at an index.
    pub fn uri(&self, index: u16) -> Option<&str> {
        self.uris.get(index as usize).map(String::as_str)
    }

    /// Returns the number of namespaces.
    pub fn len(&self) -> usize {
        self.uris.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    /// Resolves an expanded id into a canonical id of the connected server.
    ///
    /// Returns `None` for ids of other servers and for unknown namespace URIs.
    pub fn resolve(&self, id: &ExpandedNodeId) -> Option<NodeId> {
        if id.is_remote() {
            return None;
        }
        match &id.namespace_uri {
            Some(uri) => self.index_of(uri).map(|namespace_index| NodeId {
                namespace_index,
                identifier: id.node_id.identifier.clone(),
            }),
            None => Some(id.node_id.clone()),
        }
    }
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Well-known ids
// =============================================================================

/// Well-known node ids of namespace 0 used by the browser.
pub mod well_known {
    use super::NodeId;

    /// RootFolder object (i=84).
    pub const ROOT_FOLDER: NodeId = NodeId::numeric(0, 84);

    /// Objects folder (i=85).
    pub const OBJECTS_FOLDER: NodeId = NodeId::numeric(0, 85);

    /// FolderType object type (i=61).
    pub const FOLDER_TYPE: NodeId = NodeId::numeric(0, 61);

    /// HierarchicalReferences reference type (i=33).
    pub const HIERARCHICAL_REFERENCES: NodeId = NodeId::numeric(0, 33);

    /// HasProperty reference type (i=46).
    pub const HAS_PROPERTY: NodeId = NodeId::numeric(0, 46);

    /// Organizes reference type (i=35).
    pub const ORGANIZES: NodeId = NodeId::numeric(0, 35);

    /// HasComponent reference type (i=47).
    pub const HAS_COMPONENT: NodeId = NodeId::numeric(0, 47);

    /// BaseDataVariableType (i=63).
    pub const BASE_DATA_VARIABLE_TYPE: NodeId = NodeId::numeric(0, 63);

    /// PropertyType (i=68).
    pub const PROPERTY_TYPE: NodeId = NodeId::numeric(0, 68);
}

// =============================================================================
// NodeClass
// =============================================================================

/// Node class of an address-space node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    /// Class not reported.
    #[default]
    Unspecified,
    /// Object node.
    Object,
    /// Variable node.
    Variable,
    /// Method node.
    Method,
    /// Object type node.
    ObjectType,
    /// Variable type node.
    VariableType,
    /// Reference type node.
    ReferenceType,
    /// Data type node.
    DataType,
    /// View node.
    View,
}

impl NodeClass {
    /// Returns the protocol bit mask value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Unspecified => 0,
            Self::Object => 1,
            Self::Variable => 2,
            Self::Method => 4,
            Self::ObjectType => 8,
            Self::VariableType => 16,
            Self::ReferenceType => 32,
            Self::DataType => 64,
            Self::View => 128,
        }
    }

    /// Creates from the protocol value. Unknown values map to `Unspecified`.
    pub fn from_value(value: u32) -> Self {
        match value {
            1 => Self::Object,
            2 => Self::Variable,
            4 => Self::Method,
            8 => Self::ObjectType,
            16 => Self::VariableType,
            32 => Self::ReferenceType,
            64 => Self::DataType,
            128 => Self::View,
            _ => Self::Unspecified,
        }
    }

    /// Returns `true` if nodes of this class carry a live value.
    pub const fn has_value(&self) -> bool {
        matches!(self, Self::Variable)
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unspecified => "Unspecified",
            Self::Object => "Object",
            Self::Variable => "Variable",
            Self::Method => "Method",
            Self::ObjectType => "ObjectType",
            Self::VariableType => "VariableType",
            Self::ReferenceType => "ReferenceType",
            Self::DataType => "DataType",
            Self::View => "View",
        };
        f.write_str(name)
    }
}

// =============================================================================
// BrowseDirection
// =============================================================================

/// Direction of the references followed by a browse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrowseDirection {
    /// Forward references.
    #[default]
    Forward,
    /// Inverse references.
    Inverse,
    /// Both directions.
    Both,
}

impl BrowseDirection {
    /// Returns the protocol value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Forward => 0,
            Self::Inverse => 1,
            Self::Both => 2,
        }
    }
}

/// Browse result mask bits.
pub mod result_mask {
    /// ReferenceTypeId field.
    pub const REFERENCE_TYPE: u32 = 0x01;
    /// IsForward field.
    pub const IS_FORWARD: u32 = 0x02;
    /// NodeClass field.
    pub const NODE_CLASS: u32 = 0x04;
    /// BrowseName field.
    pub const BROWSE_NAME: u32 = 0x08;
    /// DisplayName field.
    pub const DISPLAY_NAME: u32 = 0x10;
    /// TypeDefinition field.
    pub const TYPE_DEFINITION: u32 = 0x20;
    /// Every field.
    pub const ALL: u32 = 0x3F;
}

// =============================================================================
// AttributeId
// =============================================================================

/// Node attributes addressed by monitored items and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeId {
    /// NodeId attribute.
    NodeId,
    /// NodeClass attribute.
    NodeClass,
    /// BrowseName attribute.
    BrowseName,
    /// DisplayName attribute.
    DisplayName,
    /// Description attribute.
    Description,
    /// Value attribute.
    #[default]
    Value,
    /// DataType attribute.
    DataType,
    /// AccessLevel attribute.
    AccessLevel,
}

impl AttributeId {
    /// Returns the protocol numeric value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::NodeId => 1,
            Self::NodeClass => 2,
            Self::BrowseName => 3,
            Self::DisplayName => 4,
            Self::Description => 5,
            Self::Value => 13,
            Self::DataType => 14,
            Self::AccessLevel => 17,
        }
    }
}

// =============================================================================
// StatusCode
// =============================================================================

/// A 32-bit status code. The two high bits carry the severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// Good.
    pub const GOOD: Self = Self(0x0000_0000);
    /// BadUnexpectedError.
    pub const BAD_UNEXPECTED_ERROR: Self = Self(0x8001_0000);
    /// BadInternalError.
    pub const BAD_INTERNAL_ERROR: Self = Self(0x8002_0000);
    /// BadCommunicationError.
    pub const BAD_COMMUNICATION_ERROR: Self = Self(0x8005_0000);
    /// BadTimeout.
    pub const BAD_TIMEOUT: Self = Self(0x800A_0000);
    /// BadTooManyOperations.
    pub const BAD_TOO_MANY_OPERATIONS: Self = Self(0x8010_0000);
    /// BadSessionIdInvalid.
    pub const BAD_SESSION_ID_INVALID: Self = Self(0x8025_0000);
    /// BadSubscriptionIdInvalid.
    pub const BAD_SUBSCRIPTION_ID_INVALID: Self = Self(0x8028_0000);
    /// BadNoCommunication.
    pub const BAD_NO_COMMUNICATION: Self = Self(0x8031_0000);
    /// BadWaitingForInitialData.
    pub const BAD_WAITING_FOR_INITIAL_DATA: Self = Self(0x8032_0000);
    /// BadNodeIdInvalid.
    pub const BAD_NODE_ID_INVALID: Self = Self(0x8033_0000);
    /// BadNodeIdUnknown.
    pub const BAD_NODE_ID_UNKNOWN: Self = Self(0x8034_0000);
    /// BadAttributeIdInvalid.
    pub const BAD_ATTRIBUTE_ID_INVALID: Self = Self(0x8035_0000);
    /// BadNotReadable.
    pub const BAD_NOT_READABLE: Self = Self(0x803A_0000);
    /// BadNotWritable.
    pub const BAD_NOT_WRITABLE: Self = Self(0x803B_0000);
    /// BadContinuationPointInvalid.
    pub const BAD_CONTINUATION_POINT_INVALID: Self = Self(0x804A_0000);
    /// BadTypeMismatch.
    pub const BAD_TYPE_MISMATCH: Self = Self(0x8074_0000);
    /// BadOutOfService.
    pub const BAD_OUT_OF_SERVICE: Self = Self(0x808D_0000);

    const SEVERITY_MASK: u32 = 0xC000_0000;
    const UNCERTAIN: u32 = 0x4000_0000;
    const BAD: u32 = 0x8000_0000;

    /// Returns the raw value.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` for a good severity.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & Self::SEVERITY_MASK == 0
    }

    /// Returns `true` for an uncertain severity.
    #[inline]
    pub const fn is_uncertain(&self) -> bool {
        self.0 & Self::SEVERITY_MASK == Self::UNCERTAIN
    }

    /// Returns `true` for a bad severity.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & Self::BAD != 0
    }

    /// Returns the symbolic name of well-known codes. Info bits are ignored.
    pub fn name(&self) -> Option<&'static str> {
        let name = match self.0 & 0xFFFF_0000 {
            0x0000_0000 => "Good",
            0x8001_0000 => "BadUnexpectedError",
            0x8002_0000 => "BadInternalError",
            0x8005_0000 => "BadCommunicationError",
            0x800A_0000 => "BadTimeout",
            0x8010_0000 => "BadTooManyOperations",
            0x8025_0000 => "BadSessionIdInvalid",
            0x8028_0000 => "BadSubscriptionIdInvalid",
            0x8031_0000 => "BadNoCommunication",
            0x8032_0000 => "BadWaitingForInitialData",
            0x8033_0000 => "BadNodeIdInvalid",
            0x8034_0000 => "BadNodeIdUnknown",
            0x8035_0000 => "BadAttributeIdInvalid",
            0x803A_0000 => "BadNotReadable",
            0x803B_0000 => "BadNotWritable",
            0x804A_0000 => "BadContinuationPointInvalid",
            0x8074_0000 => "BadTypeMismatch",
            0x808D_0000 => "BadOutOfService",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

impl From<u32> for StatusCode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

// =============================================================================
// UaValue
// =============================================================================

/// A decoded variant value.
#[derive(Debug, Clone, PartialEq)]
pub enum UaValue {
    /// Boolean value.
    Boolean(bool),
    /// Signed byte.
    SByte(i8),
    /// Unsigned byte.
    Byte(u8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit double.
    Double(f64),
    /// String value.
    String(String),
    /// Date/time value.
    DateTime(DateTime<Utc>),
    /// GUID value.
    Guid(Uuid),
    /// Byte string.
    ByteString(Vec<u8>),
    /// Array of values.
    Array(Vec<UaValue>),
    /// Null value.
    Null,
}

impl UaValue {
    /// Returns `true` if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an f64 when numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::SByte(v) => Some(*v as f64),
            Self::Byte(v) => Some(*v as f64),
            Self::Int16(v) => Some(*v as f64),
            Self::UInt16(v) => Some(*v as f64),
            Self::Int32(v) => Some(*v as f64),
            Self::UInt32(v) => Some(*v as f64),
            Self::Int64(v) => Some(*v as f64),
            Self::UInt64(v) => Some(*v as f64),
            Self::Float(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for UaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::SByte(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::DateTime(v) => f.write_str(&v.to_rfc3339()),
            Self::Guid(v) => write!(f, "{v}"),
            Self::ByteString(v) => f.write_str(&BASE64.encode(v)),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Null => f.write_str("null"),
        }
    }
}

impl From<bool> for UaValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for UaValue {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<f64> for UaValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for UaValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
