//! Link Documents
//!
//! Decodes link document payloads into their declared schema version's shape
//! and normalizes every version to one canonical [`LinkSet`].
//!
//! Route records (`from`/`to` pairs, dictionary descriptors) are shared by all
//! versions; only the containers holding them differ per version.

pub mod v1;
pub mod v2;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LinkError, Result};
use crate::resource::{LinkDocument, LinkEndpoint};
use crate::version::LinkSchemaVersion;

// =============================================================================
// Route Records
// =============================================================================

/// A pin-to-pin connection (message queue or gRPC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRoute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub from: LinkEndpoint,
    pub to: LinkEndpoint,
}

impl PinRoute {
    pub fn new(from: LinkEndpoint, to: LinkEndpoint) -> Self {
        Self { name: None, from, to }
    }
}

/// Dictionary descriptor of a single-dictionary route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub dictionary_type: String,
}

/// Links one dictionary to a box under a dictionary type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryRoute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "box")]
    pub box_name: String,
    pub dictionary: DictionaryDescription,
}

/// Dictionary descriptor of a multi-dictionary route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiDictionaryDescription {
    pub name: String,
    pub alias: String,
}

impl MultiDictionaryDescription {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }
}

/// Links several aliased dictionaries to a box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiDictionaryRoute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "box")]
    pub box_name: String,
    #[serde(default)]
    pub dictionaries: Vec<MultiDictionaryDescription>,
}

// =============================================================================
// Canonical Link Set
// =============================================================================

/// Version-independent content of one link document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    pub mq: Vec<PinRoute>,
    pub grpc: Vec<PinRoute>,
    pub dictionaries: Vec<DictionaryRoute>,
    pub multi_dictionaries: Vec<MultiDictionaryRoute>,
}

impl LinkSet {
    /// Decode a link document under its declared version and normalize it
    pub fn from_document(document: &LinkDocument) -> Result<Self> {
        let version: LinkSchemaVersion = document.api_version.parse()?;
        Ok(VersionedLinkSpec::decode(version, &document.spec)?.normalize())
    }

    /// Check whether the document declared no relations at all
    pub fn is_empty(&self) -> bool {
        self.mq.is_empty()
            && self.grpc.is_empty()
            && self.dictionaries.is_empty()
            && self.multi_dictionaries.is_empty()
    }

    /// Total number of routes
    pub fn len(&self) -> usize {
        self.mq.len() + self.grpc.len() + self.dictionaries.len() + self.multi_dictionaries.len()
    }
}

// =============================================================================
// Versioned Spec
// =============================================================================

/// A link spec decoded in the shape of its declared version
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedLinkSpec {
    V1(v1::LinkSpecV1),
    V2(v2::LinkSpecV2),
}

impl VersionedLinkSpec {
    /// Decode a payload as the given version's shape
    ///
    /// A `null` payload decodes as a spec without relations.
    pub fn decode(version: LinkSchemaVersion, spec: &Value) -> Result<Self> {
        let payload = match spec {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other.clone(),
        };

        let mismatch = |source| LinkError::SchemaMismatch {
            version: version.api_version(),
            source,
        };

        match version {
            LinkSchemaVersion::V1 => serde_json::from_value(payload).map(Self::V1).map_err(mismatch),
            LinkSchemaVersion::V2 => serde_json::from_value(payload).map(Self::V2).map_err(mismatch),
        }
    }

    /// The version this spec was decoded as
    pub fn version(&self) -> LinkSchemaVersion {
        match self {
            Self::V1(_) => LinkSchemaVersion::V1,
            Self::V2(_) => LinkSchemaVersion::V2,
        }
    }

    /// Convert to the canonical representation
    pub fn normalize(self) -> LinkSet {
        match self {
            Self::V1(spec) => spec.normalize(),
            Self::V2(spec) => spec.normalize(),
        }
    }
}
