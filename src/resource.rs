//! Resource and box spec types
//!
//! [`Th2Resource`] is the untyped document a caller hands in. [`BoxSpec`] is
//! the typed view of a box spec in the latest schema, covering only the
//! parts link injection touches. Everything else rides along in the
//! flattened `extra` maps and is written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LinkError, Result};
use crate::version::LinkSchemaVersion;

/// `kind` of link documents
pub const LINK_KIND: &str = "Th2Link";

/// A named resource document (box, link, dictionary, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Th2Resource {
    /// Declared `apiVersion` tag
    #[serde(default)]
    pub api_version: String,
    /// Resource kind (e.g., "Th2Box", "Th2Link")
    #[serde(default)]
    pub kind: String,
    /// Resource metadata
    pub metadata: Metadata,
    /// Untyped spec payload
    #[serde(default)]
    pub spec: Value,
}

/// Resource metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Th2Resource {
    /// Create a new resource
    pub fn new(name: impl Into<String>, kind: impl Into<String>, api_version: impl Into<String>, spec: Value) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata: Metadata { name: name.into(), extra: Map::new() },
            spec,
        }
    }

    /// Create a box resource in the latest schema
    pub fn new_box(name: impl Into<String>, spec: Value) -> Self {
        Self::new(name, "Th2Box", LinkSchemaVersion::LATEST.api_version(), spec)
    }

    /// Get the resource name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Check whether this resource is a link document
    pub fn is_link(&self) -> bool {
        self.kind == LINK_KIND
    }

    /// File name for writing this resource on its own: `<name>.yaml`
    ///
    /// Fails for names that are not a single plain path component.
    pub fn file_name(&self) -> Result<String> {
        let name = self.name();
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(&['/', '\\', '\0'][..]);
        if !plain {
            return Err(LinkError::InvalidDocument(format!(
                "resource name {:?} cannot be used as a file name",
                name
            )));
        }
        Ok(format!("{}.yaml", name))
    }

    /// Decode the spec into the typed box view
    pub fn box_spec(&self) -> Result<BoxSpec> {
        Ok(serde_json::from_value(self.spec.clone())?)
    }

    /// Replace the spec with the encoded box view
    pub fn set_box_spec(&mut self, spec: &BoxSpec) -> Result<()> {
        self.spec = serde_json::to_value(spec)?;
        Ok(())
    }
}

/// A link document: name, declared version tag, untyped spec
#[derive(Debug, Clone, PartialEq)]
pub struct LinkDocument {
    pub name: String,
    pub api_version: String,
    pub spec: Value,
}

impl LinkDocument {
    /// Create a new link document
    pub fn new(name: impl Into<String>, api_version: impl Into<String>, spec: Value) -> Self {
        Self {
            name: name.into(),
            api_version: api_version.into(),
            spec,
        }
    }
}

impl From<&Th2Resource> for LinkDocument {
    fn from(resource: &Th2Resource) -> Self {
        Self::new(resource.name(), resource.api_version.clone(), resource.spec.clone())
    }
}

// =============================================================================
// Box Spec (latest schema)
// =============================================================================

/// One side of a connection: a box and one of its pins
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkEndpoint {
    #[serde(rename = "box")]
    pub box_name: String,
    pub pin: String,
}

impl LinkEndpoint {
    pub fn new(box_name: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            box_name: box_name.into(),
            pin: pin.into(),
        }
    }
}

/// Typed view of a box spec
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pins: Option<PinSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pin declarations of a box
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PinSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mq: Option<MqSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<GrpcSection>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Message queue pins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MqSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribers: Option<Vec<LinkedPin>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// gRPC pins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrpcSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Vec<LinkedPin>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A subscriber or client pin carrying resolved link endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedPin {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_to: Option<Vec<LinkEndpoint>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LinkedPin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link_to: None,
            extra: Map::new(),
        }
    }

    /// Linked endpoints (empty when `linkTo` is absent)
    pub fn links(&self) -> &[LinkEndpoint] {
        self.link_to.as_deref().unwrap_or_default()
    }

    /// Replace the linked endpoints
    ///
    /// A pin without a `linkTo` key only gains one when there is something
    /// to link; an explicit list, even an empty one, is always kept.
    pub fn set_links(&mut self, links: &[LinkEndpoint]) {
        if links.is_empty() && self.link_to.is_none() {
            return;
        }
        self.link_to = Some(links.to_vec());
    }
}

impl BoxSpec {
    /// Message queue subscriber pins (empty when none are declared)
    pub fn subscribers(&self) -> &[LinkedPin] {
        self.pins
            .as_ref()
            .and_then(|p| p.mq.as_ref())
            .and_then(|mq| mq.subscribers.as_deref())
            .unwrap_or_default()
    }

    /// gRPC client pins (empty when none are declared)
    pub fn clients(&self) -> &[LinkedPin] {
        self.pins
            .as_ref()
            .and_then(|p| p.grpc.as_ref())
            .and_then(|grpc| grpc.client.as_deref())
            .unwrap_or_default()
    }

    /// Mutable message queue subscriber pins
    pub fn subscribers_mut(&mut self) -> &mut [LinkedPin] {
        self.pins
            .as_mut()
            .and_then(|p| p.mq.as_mut())
            .and_then(|mq| mq.subscribers.as_deref_mut())
            .unwrap_or_default()
    }

    /// Mutable gRPC client pins
    pub fn clients_mut(&mut self) -> &mut [LinkedPin] {
        self.pins
            .as_mut()
            .and_then(|p| p.grpc.as_mut())
            .and_then(|grpc| grpc.client.as_deref_mut())
            .unwrap_or_default()
    }
}
