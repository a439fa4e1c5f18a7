// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Node ids and the `ReadValueId` that names the attribute a monitored item watches.

use std::fmt;

/// The kind of identifier, numeric or string.
#[derive(Eq, PartialEq, Clone, Debug, Hash, Serialize, Deserialize)]
pub enum Identifier {
    Numeric(u32),
    String(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Identifier::Numeric(v) => write!(f, "i={}", v),
            Identifier::String(v) => write!(f, "s={}", v),
        }
    }
}

impl From<u32> for Identifier {
    fn from(v: u32) -> Self {
        Identifier::Numeric(v)
    }
}

impl<'a> From<&'a str> for Identifier {
    fn from(v: &'a str) -> Self {
        Identifier::String(v.to_string())
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Identifier::String(v)
    }
}

/// An identifier for a node in the address space of an OPC UA Server.
#[derive(PartialEq, Eq, Clone, Debug, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};{}", self.namespace, self.identifier)
        } else {
            write!(f, "{}", self.identifier)
        }
    }
}

impl NodeId {
    pub fn new<T>(namespace: u16, value: T) -> NodeId
    where
        T: Into<Identifier>,
    {
        NodeId {
            namespace,
            identifier: value.into(),
        }
    }

    /// Returns a null node id
    pub fn null() -> NodeId {
        NodeId::new(0, 0u32)
    }

    pub fn is_null(&self) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(0)
    }
}

/// The attributes a monitored item may watch. Only the ones with a bearing on monitoring are
/// listed.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum AttributeId {
    NodeId = 1,
    BrowseName = 3,
    DisplayName = 4,
    EventNotifier = 12,
    Value = 13,
}

impl AttributeId {
    pub fn from_u32(attribute_id: u32) -> Result<AttributeId, ()> {
        let attribute_id = match attribute_id {
            1 => AttributeId::NodeId,
            3 => AttributeId::BrowseName,
            4 => AttributeId::DisplayName,
            12 => AttributeId::EventNotifier,
            13 => AttributeId::Value,
            _ => {
                debug!("Invalid attribute id {}", attribute_id);
                return Err(());
            }
        };
        Ok(attribute_id)
    }
}

/// Identifies the attribute of a node to read or monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadValueId {
    pub node_id: NodeId,
    pub attribute_id: u32,
    pub index_range: Option<String>,
}

impl Default for ReadValueId {
    fn default() -> Self {
        Self {
            node_id: NodeId::null(),
            attribute_id: AttributeId::Value as u32,
            index_range: None,
        }
    }
}

impl From<NodeId> for ReadValueId {
    fn from(node_id: NodeId) -> Self {
        Self {
            node_id,
            ..Default::default()
        }
    }
}

impl ReadValueId {
    /// A `ReadValueId` that subscribes to the events of a node.
    pub fn events(node_id: NodeId) -> Self {
        Self {
            node_id,
            attribute_id: AttributeId::EventNotifier as u32,
            index_range: None,
        }
    }

    pub fn is_event_notifier(&self) -> bool {
        self.attribute_id == AttributeId::EventNotifier as u32
    }
}
