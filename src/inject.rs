//! Reference Injection
//!
//! Writes the resolved links of a [`ResourceLinkIndex`] into box specs:
//! subscriber and client pins get their `linkTo` lists, the custom config
//! gets its dictionary aliases rewritten and a `dictionaries` section.
//!
//! Pin link lists are replaced, never appended to, so injecting the same
//! index twice leaves a spec unchanged.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use crate::alias::AliasRewriter;
use crate::config::AliasRewriteMode;
use crate::diagnostics::{ErrorKind, ErrorSink};
use crate::error::{LinkError, Result};
use crate::index::{LinkTo, ResourceLinkIndex, DICTIONARIES_SLOT};
use crate::resource::{BoxSpec, LinkedPin, Th2Resource};
use crate::version::LinkSchemaVersion;

/// Applies a read-only link index to box resources
#[derive(Debug, Clone, Copy)]
pub struct ReferenceInjector<'a> {
    index: &'a ResourceLinkIndex,
    alias_mode: AliasRewriteMode,
}

impl<'a> ReferenceInjector<'a> {
    pub fn new(index: &'a ResourceLinkIndex, alias_mode: AliasRewriteMode) -> Self {
        Self { index, alias_mode }
    }

    /// Inject links into every resource the index names
    ///
    /// Index entries without a matching resource are skipped. Returns the
    /// names of the rewritten resources in index order.
    pub fn inject(&self, resources: &mut [Th2Resource], errors: &mut ErrorSink) -> Vec<String> {
        // Later resources shadow earlier ones with the same name
        let by_name: HashMap<String, usize> = resources
            .iter()
            .enumerate()
            .map(|(position, resource)| (resource.name().to_string(), position))
            .collect();

        let mut converted = Vec::new();

        for (box_name, slots) in self.index.iter() {
            let Some(&position) = by_name.get(box_name) else {
                tracing::debug!(resource = %box_name, "linked box not in resource set, skipping");
                continue;
            };

            if self.inject_resource(&mut resources[position], slots, errors) {
                converted.push(box_name.clone());
            }
        }

        converted
    }

    fn inject_resource(
        &self,
        resource: &mut Th2Resource,
        slots: &BTreeMap<String, LinkTo>,
        errors: &mut ErrorSink,
    ) -> bool {
        let box_name = resource.name().to_string();

        let mut spec = match resource.box_spec() {
            Ok(spec) => spec,
            Err(err) => {
                errors.error(
                    &box_name,
                    ErrorKind::ResourceSpecMismatch,
                    format!("spec is not a {} box spec: {}", LinkSchemaVersion::LATEST, err),
                );
                return false;
            }
        };

        self.inject_spec(&box_name, &mut spec, slots, errors);

        if let Err(err) = resource.set_box_spec(&spec) {
            errors.error(&box_name, ErrorKind::ResourceSpecMismatch, err.to_string());
            return false;
        }
        resource.api_version = LinkSchemaVersion::LATEST.api_version();

        tracing::debug!(resource = %box_name, slots = slots.len(), "injected links");
        true
    }

    /// Apply one box's pin slots to its decoded spec
    pub fn inject_spec(
        &self,
        box_name: &str,
        spec: &mut BoxSpec,
        slots: &BTreeMap<String, LinkTo>,
        errors: &mut ErrorSink,
    ) {
        let subscriber_at = pin_positions(spec.subscribers());
        let client_at = pin_positions(spec.clients());

        for (slot, link_to) in slots {
            if let Some(&position) = subscriber_at.get(slot) {
                spec.subscribers_mut()[position].set_links(&link_to.mq);
            }
            if let Some(&position) = client_at.get(slot) {
                spec.clients_mut()[position].set_links(&link_to.grpc);
            }
        }

        let Some(dictionaries) = slots.get(DICTIONARIES_SLOT) else {
            return;
        };

        if !dictionaries.multi_dictionaries.is_empty() {
            if let Some(config) = spec.custom_config.as_ref() {
                let rewriter = AliasRewriter::new(self.alias_mode, &dictionaries.multi_dictionaries);
                match rewriter.rewrite(config) {
                    Ok(rewritten) => spec.custom_config = Some(rewritten),
                    Err(err) => errors.error(
                        box_name,
                        ErrorKind::AliasSubstitutionFailure,
                        format!("custom config left unchanged: {}", err),
                    ),
                }
            }
        }

        if !dictionaries.dictionaries.is_empty() {
            if let Err(err) = merge_dictionaries(&mut spec.custom_config, &dictionaries.dictionaries) {
                errors.error(box_name, ErrorKind::DictionaryInjectionFailure, err.to_string());
            }
        }
    }
}

/// Pin name -> position, the last pin wins on duplicate names
fn pin_positions(pins: &[LinkedPin]) -> HashMap<String, usize> {
    pins.iter()
        .enumerate()
        .map(|(position, pin)| (pin.name.clone(), position))
        .collect()
}

/// Merge resolved dictionary references into `customConfig.dictionaries`
///
/// Creates the custom config and the `dictionaries` mapping when absent.
/// Other keys, and dictionary types not being injected, are kept.
pub fn merge_dictionaries(
    custom_config: &mut Option<Value>,
    dictionaries: &BTreeMap<String, String>,
) -> Result<()> {
    let config = custom_config.get_or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(config) = config else {
        return Err(LinkError::CustomConfigNotMapping);
    };

    let section = config
        .entry(DICTIONARIES_SLOT)
        .or_insert_with(|| Value::Object(Map::new()));
    if !section.is_object() {
        *section = Value::Object(Map::new());
    }

    if let Value::Object(section) = section {
        for (dictionary_type, reference) in dictionaries {
            section.insert(dictionary_type.clone(), Value::String(reference.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicateLinkPolicy;
    use crate::resource::{LinkDocument, LinkEndpoint};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn index_of(spec: Value) -> ResourceLinkIndex {
        let docs = vec![LinkDocument::new("links", "th2.exactpro.com/v1", spec)];
        let mut errors = ErrorSink::new();
        let index = ResourceLinkIndex::build(&docs, DuplicateLinkPolicy::Accumulate, &mut errors);
        assert!(errors.is_empty(), "{}", errors);
        index
    }

    fn box_with_pins() -> Th2Resource {
        Th2Resource::new_box("c", json!({
            "imageName": "ghcr.io/th2/check1",
            "pins": {
                "mq": { "subscribers": [{ "name": "in1", "attributes": ["parsed"] }] },
                "grpc": { "client": [{ "name": "to_act", "serviceClass": "ActService" }] }
            }
        }))
    }

    #[test]
    fn test_subscriber_gets_inbound_endpoint() {
        let index = index_of(json!({
            "boxes-relation": {
                "router-mq": [{ "from": { "box": "a", "pin": "out1" }, "to": { "box": "c", "pin": "in1" } }]
            }
        }));
        let mut resources = vec![box_with_pins()];
        let mut errors = ErrorSink::new();

        let converted = ReferenceInjector::new(&index, AliasRewriteMode::Text).inject(&mut resources, &mut errors);

        assert_eq!(converted, vec!["c".to_string()]);
        let spec = resources[0].box_spec().unwrap();
        assert_eq!(spec.subscribers()[0].links(), &[LinkEndpoint::new("a", "out1")]);
        assert_eq!(spec.subscribers()[0].extra["attributes"], json!(["parsed"]));
        assert!(spec.clients()[0].links().is_empty());
        assert_eq!(spec.extra["imageName"], json!("ghcr.io/th2/check1"));
    }

    #[test]
    fn test_client_gets_outbound_endpoint() {
        let index = index_of(json!({
            "boxes-relation": {
                "router-grpc": [{ "from": { "box": "c", "pin": "to_act" }, "to": { "box": "act", "pin": "server" } }]
            }
        }));
        let mut resources = vec![box_with_pins()];
        let mut errors = ErrorSink::new();

        ReferenceInjector::new(&index, AliasRewriteMode::Text).inject(&mut resources, &mut errors);

        let spec = resources[0].box_spec().unwrap();
        assert_eq!(spec.clients()[0].links(), &[LinkEndpoint::new("act", "server")]);
        assert_eq!(spec.clients()[0].extra["serviceClass"], json!("ActService"));
    }

    #[test]
    fn test_declared_lists_are_kept_as_written() {
        let index = index_of(json!({
            "boxes-relation": {
                "router-mq": [{ "from": { "box": "a", "pin": "out1" }, "to": { "box": "c", "pin": "shared" } }]
            }
        }));
        let spec = json!({
            "pins": {
                "mq": { "subscribers": [{ "name": "shared" }, { "name": "idle", "linkTo": [] }] },
                "grpc": { "client": [{ "name": "shared" }], "server": [] }
            }
        });
        let mut resources = vec![Th2Resource::new_box("c", spec)];
        let mut errors = ErrorSink::new();

        ReferenceInjector::new(&index, AliasRewriteMode::Text).inject(&mut resources, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(resources[0].spec["pins"], json!({
            "mq": {
                "subscribers": [
                    { "name": "shared", "linkTo": [{ "box": "a", "pin": "out1" }] },
                    { "name": "idle", "linkTo": [] }
                ]
            },
            "grpc": { "client": [{ "name": "shared" }], "server": [] }
        }));
    }

    #[test]
    fn test_dictionary_creates_custom_config() {
        let index = index_of(json!({
            "dictionaries-relation": [{ "box": "c", "dictionary": { "name": "dict1", "type": "general" } }]
        }));
        let mut resources = vec![Th2Resource::new_box("c", json!({ "imageName": "img" }))];
        let mut errors = ErrorSink::new();

        ReferenceInjector::new(&index, AliasRewriteMode::Text).inject(&mut resources, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(
            resources[0].spec["customConfig"],
            json!({ "dictionaries": { "general": "${dictionary_link:dict1}" } })
        );
    }

    #[test]
    fn test_injection_is_idempotent() {
        let index = index_of(json!({
            "boxes-relation": {
                "router-mq": [{ "from": { "box": "a", "pin": "out1" }, "to": { "box": "c", "pin": "in1" } }],
                "router-grpc": [{ "from": { "box": "c", "pin": "to_act" }, "to": { "box": "act", "pin": "server" } }]
            },
            "dictionaries-relation": [{ "box": "c", "dictionary": { "name": "dict1", "type": "general" } }],
            "multi-dictionaries-relation": [{ "box": "c", "dictionaries": [{ "name": "fix50", "alias": "fix" }] }]
        }));
        let mut resource = box_with_pins();
        resource.spec["customConfig"] = json!({ "codec": { "dictionary": "fix" } });
        let mut resources = vec![resource];
        let mut errors = ErrorSink::new();
        let injector = ReferenceInjector::new(&index, AliasRewriteMode::Text);

        injector.inject(&mut resources, &mut errors);
        let once = resources.clone();
        injector.inject(&mut resources, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(resources, once);
        assert_eq!(resources[0].spec["customConfig"], json!({
            "codec": { "dictionary": "${dictionary_link:fix50}" },
            "dictionaries": { "general": "${dictionary_link:dict1}" }
        }));
    }

    #[test]
    fn test_unknown_box_and_unlinked_box() {
        let index = index_of(json!({
            "boxes-relation": {
                "router-mq": [{ "from": { "box": "a", "pin": "out1" }, "to": { "box": "ghost", "pin": "in1" } }]
            }
        }));
        let original = box_with_pins();
        let mut resources = vec![original.clone()];
        let mut errors = ErrorSink::new();

        let converted = ReferenceInjector::new(&index, AliasRewriteMode::Text).inject(&mut resources, &mut errors);

        assert!(converted.is_empty());
        assert!(errors.is_empty());
        assert_eq!(resources[0], original);
    }

    #[test]
    fn test_undecodable_spec_is_reported() {
        let index = index_of(json!({
            "dictionaries-relation": [{ "box": "c", "dictionary": { "name": "dict1", "type": "general" } }]
        }));
        let original = Th2Resource::new_box("c", json!({ "pins": { "mq": { "subscribers": "in1" } } }));
        let mut resources = vec![original.clone()];
        let mut errors = ErrorSink::new();

        let converted = ReferenceInjector::new(&index, AliasRewriteMode::Text).inject(&mut resources, &mut errors);

        assert!(converted.is_empty());
        assert_eq!(errors.count_of(ErrorKind::ResourceSpecMismatch), 1);
        assert_eq!(resources[0], original);
    }

    #[test]
    fn test_failed_alias_rewrite_keeps_config() {
        let index = index_of(json!({
            "multi-dictionaries-relation": [{ "box": "c", "dictionaries": [{ "name": "broken: [", "alias": "x" }] }]
        }));
        let mut resources = vec![Th2Resource::new_box("c", json!({ "customConfig": { "a": "x" } }))];
        let mut errors = ErrorSink::new();

        ReferenceInjector::new(&index, AliasRewriteMode::Text).inject(&mut resources, &mut errors);

        assert_eq!(errors.count_of(ErrorKind::AliasSubstitutionFailure), 1);
        assert_eq!(errors.all()[0].resource_name, "c");
        assert_eq!(resources[0].spec["customConfig"], json!({ "a": "x" }));
    }

    #[test]
    fn test_last_resource_with_name_wins() {
        let index = index_of(json!({
            "dictionaries-relation": [{ "box": "c", "dictionary": { "name": "dict1", "type": "general" } }]
        }));
        let first = Th2Resource::new_box("c", json!({ "imageName": "first" }));
        let mut resources = vec![first.clone(), Th2Resource::new_box("c", json!({ "imageName": "second" }))];
        let mut errors = ErrorSink::new();

        ReferenceInjector::new(&index, AliasRewriteMode::Text).inject(&mut resources, &mut errors);

        assert_eq!(resources[0], first);
        assert!(resources[1].spec.get("customConfig").is_some());
    }

    #[test]
    fn test_merge_keeps_other_keys() {
        let mut config = Some(json!({ "port": 1, "dictionaries": { "level1": "${dictionary_link:old}" } }));
        let dictionaries = BTreeMap::from([("general".to_string(), "${dictionary_link:d}".to_string())]);

        merge_dictionaries(&mut config, &dictionaries).unwrap();

        assert_eq!(config, Some(json!({
            "port": 1,
            "dictionaries": { "level1": "${dictionary_link:old}", "general": "${dictionary_link:d}" }
        })));
    }

    #[test]
    fn test_merge_into_scalar_config_fails() {
        let mut config = Some(json!("plain"));
        let dictionaries = BTreeMap::from([("general".to_string(), "${dictionary_link:d}".to_string())]);

        let err = merge_dictionaries(&mut config, &dictionaries).unwrap_err();
        assert!(matches!(err, LinkError::CustomConfigNotMapping));
        assert_eq!(config, Some(json!("plain")));
    }
}
