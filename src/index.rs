//! Link Index
//!
//! Folds every link document of a run into one [`ResourceLinkIndex`]:
//! box name -> pin slot -> [`LinkTo`]. Message queue links are indexed by
//! the consuming box (subscribers list who feeds them), gRPC links by the
//! calling box (clients list whom they call). Dictionary links land in the
//! reserved [`DICTIONARIES_SLOT`] of the box they are linked to.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::DuplicateLinkPolicy;
use crate::diagnostics::ErrorSink;
use crate::link::{LinkSet, MultiDictionaryDescription};
use crate::resource::{LinkDocument, LinkEndpoint};

/// Pin slot name aggregating a box's dictionary links
pub const DICTIONARIES_SLOT: &str = "dictionaries";

/// Build the resolved reference expression for a dictionary name
pub fn dictionary_link(name: &str) -> String {
    format!("${{dictionary_link:{}}}", name)
}

// =============================================================================
// LinkTo
// =============================================================================

/// Everything linked to one pin slot of one box
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkTo {
    /// Publishers feeding this subscriber pin
    pub mq: Vec<LinkEndpoint>,
    /// Servers this client pin calls
    pub grpc: Vec<LinkEndpoint>,
    /// Dictionary type -> resolved reference
    pub dictionaries: BTreeMap<String, String>,
    /// Aliased dictionaries to substitute inside custom config
    pub multi_dictionaries: Vec<MultiDictionaryDescription>,
}

impl LinkTo {
    pub fn is_empty(&self) -> bool {
        self.mq.is_empty()
            && self.grpc.is_empty()
            && self.dictionaries.is_empty()
            && self.multi_dictionaries.is_empty()
    }
}

fn record_endpoint(list: &mut Vec<LinkEndpoint>, endpoint: LinkEndpoint, policy: DuplicateLinkPolicy) {
    if policy == DuplicateLinkPolicy::Replace {
        if let Some(existing) = list.iter_mut().find(|e| **e == endpoint) {
            *existing = endpoint;
            return;
        }
    }
    list.push(endpoint);
}

fn record_alias(
    list: &mut Vec<MultiDictionaryDescription>,
    descriptor: MultiDictionaryDescription,
    policy: DuplicateLinkPolicy,
) {
    if policy == DuplicateLinkPolicy::Replace {
        if let Some(existing) = list.iter_mut().find(|d| d.alias == descriptor.alias) {
            *existing = descriptor;
            return;
        }
    }
    list.push(descriptor);
}

// =============================================================================
// Resource Link Index
// =============================================================================

/// Box name -> pin slot -> links, read-only once built
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceLinkIndex {
    entries: BTreeMap<String, BTreeMap<String, LinkTo>>,
}

impl ResourceLinkIndex {
    /// Build the index from a complete set of link documents
    ///
    /// Documents that fail to decode are reported to `errors` and contribute
    /// nothing.
    pub fn build<'a, I>(documents: I, policy: DuplicateLinkPolicy, errors: &mut ErrorSink) -> Self
    where
        I: IntoIterator<Item = &'a LinkDocument>,
    {
        let mut builder = IndexBuilder::new(policy);
        for document in documents {
            builder.add_document(document, errors);
        }
        builder.finish()
    }

    /// Links of one pin slot
    pub fn get(&self, box_name: &str, slot: &str) -> Option<&LinkTo> {
        self.entries.get(box_name).and_then(|slots| slots.get(slot))
    }

    /// All pin slots of one box
    pub fn slots(&self, box_name: &str) -> Option<&BTreeMap<String, LinkTo>> {
        self.entries.get(box_name)
    }

    /// The dictionary slot of one box
    pub fn dictionaries(&self, box_name: &str) -> Option<&LinkTo> {
        self.get(box_name, DICTIONARIES_SLOT)
    }

    /// Iterate boxes in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, LinkTo>)> {
        self.entries.iter()
    }

    /// Box names present in the index
    pub fn box_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains_box(&self, box_name: &str) -> bool {
        self.entries.contains_key(box_name)
    }

    /// Number of boxes with at least one link
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Index Builder
// =============================================================================

/// Incremental builder behind [`ResourceLinkIndex::build`]
#[derive(Debug)]
pub struct IndexBuilder {
    policy: DuplicateLinkPolicy,
    entries: BTreeMap<String, BTreeMap<String, LinkTo>>,
}

impl IndexBuilder {
    pub fn new(policy: DuplicateLinkPolicy) -> Self {
        Self {
            policy,
            entries: BTreeMap::new(),
        }
    }

    fn slot(&mut self, box_name: &str, slot: &str) -> &mut LinkTo {
        self.entries
            .entry(box_name.to_string())
            .or_default()
            .entry(slot.to_string())
            .or_default()
    }

    /// Decode one document and fold its links in
    pub fn add_document(&mut self, document: &LinkDocument, errors: &mut ErrorSink) {
        match LinkSet::from_document(document) {
            Ok(links) => {
                tracing::debug!(document = %document.name, routes = links.len(), "indexing link document");
                self.add_links(links, errors);
            }
            Err(err) => errors.schema_mismatch(&document.name, &document.api_version, err),
        }
    }

    /// Fold an already normalized link set in
    pub fn add_links(&mut self, links: LinkSet, errors: &mut ErrorSink) {
        let policy = self.policy;

        for route in links.mq {
            let slot = self.slot(&route.to.box_name, &route.to.pin);
            record_endpoint(&mut slot.mq, route.from, policy);
        }

        for route in links.grpc {
            let slot = self.slot(&route.from.box_name, &route.from.pin);
            record_endpoint(&mut slot.grpc, route.to, policy);
        }

        for route in links.dictionaries {
            let slot = self.slot(&route.box_name, DICTIONARIES_SLOT);
            let dictionary = route.dictionary;
            let reference = dictionary_link(&dictionary.name);
            match slot.dictionaries.get(&dictionary.dictionary_type) {
                // The same link seen again is not a conflict under `Replace`
                Some(existing) if policy == DuplicateLinkPolicy::Replace && *existing == reference => {}
                Some(_) => errors.dictionary_type_conflict(&route.box_name, &dictionary.dictionary_type),
                None => {
                    slot.dictionaries.insert(dictionary.dictionary_type, reference);
                }
            }
        }

        for route in links.multi_dictionaries {
            let slot = self.slot(&route.box_name, DICTIONARIES_SLOT);
            for descriptor in route.dictionaries {
                record_alias(&mut slot.multi_dictionaries, descriptor, policy);
            }
        }
    }

    pub fn finish(self) -> ResourceLinkIndex {
        ResourceLinkIndex { entries: self.entries }
    }
}
