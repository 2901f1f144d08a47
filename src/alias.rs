//! Dictionary Alias Rewriting
//!
//! Boxes refer to multi-linked dictionaries through aliases placed anywhere
//! inside their custom config. The rewriter replaces every alias scalar with
//! the resolved `${dictionary_link:<name>}` expression.
//!
//! [`AliasRewriteMode::Text`] works on the block-style YAML form of the config:
//! one combined pattern matches `" <alias>\n"`, i.e. an alias preceded by a
//! space and ending its line. The result is parsed back before it is
//! accepted, and every inserted reference must read back whole. A
//! substitution that breaks the document surfaces as
//! [`LinkError::AliasSubstitution`], one that silently alters it (a name
//! carrying ` #` turns the line tail into a comment) as
//! [`LinkError::AliasSubstitutionMangled`].
//!
//! [`AliasRewriteMode::Structural`] walks the value tree and replaces string
//! values equal to an alias. Mapping keys are never rewritten.

use std::collections::HashMap;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::config::AliasRewriteMode;
use crate::error::{LinkError, Result};
use crate::index::dictionary_link;
use crate::link::MultiDictionaryDescription;

/// Rewrites dictionary aliases for one set of descriptors
#[derive(Debug)]
pub struct AliasRewriter {
    mode: AliasRewriteMode,
    /// alias -> resolved reference, first descriptor per alias wins
    replacements: HashMap<String, String>,
    /// Aliases in first-seen order
    aliases: Vec<String>,
}

impl AliasRewriter {
    pub fn new(mode: AliasRewriteMode, descriptors: &[MultiDictionaryDescription]) -> Self {
        let mut replacements = HashMap::with_capacity(descriptors.len());
        let mut aliases = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if replacements.contains_key(&descriptor.alias) {
                continue;
            }
            replacements.insert(descriptor.alias.clone(), dictionary_link(&descriptor.name));
            aliases.push(descriptor.alias.clone());
        }

        Self { mode, replacements, aliases }
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Produce the rewritten config, leaving the input untouched
    pub fn rewrite(&self, config: &Value) -> Result<Value> {
        if self.is_empty() {
            return Ok(config.clone());
        }

        match self.mode {
            AliasRewriteMode::Text => self.rewrite_text(config),
            AliasRewriteMode::Structural => {
                let mut rewritten = config.clone();
                self.rewrite_tree(&mut rewritten);
                Ok(rewritten)
            }
        }
    }

    /// The combined pattern matching any configured alias as a line-ending scalar
    pub fn pattern(&self) -> Result<Regex> {
        let alternation = self
            .aliases
            .iter()
            .map(|alias| regex::escape(alias))
            .collect::<Vec<_>>()
            .join("|");
        Ok(Regex::new(&format!(" ({})\n", alternation))?)
    }

    fn rewrite_text(&self, config: &Value) -> Result<Value> {
        let text = serde_yaml::to_string(config)?;
        let pattern = self.pattern()?;

        let mut substitutions: HashMap<&str, usize> = HashMap::new();
        let substituted = pattern.replace_all(&text, |caps: &Captures<'_>| {
            match self.replacements.get(&caps[1]) {
                Some(reference) => {
                    *substitutions.entry(reference.as_str()).or_default() += 1;
                    format!(" {}\n", reference)
                }
                None => caps[0].to_string(),
            }
        });

        let rewritten: Value = serde_yaml::from_str(&substituted).map_err(LinkError::AliasSubstitution)?;

        // Every inserted reference must read back whole
        for (reference, count) in substitutions {
            if occurrences(&rewritten, reference) != occurrences(config, reference) + count {
                return Err(LinkError::AliasSubstitutionMangled(reference.to_string()));
            }
        }

        Ok(rewritten)
    }

    fn rewrite_tree(&self, value: &mut Value) {
        match value {
            Value::String(s) => {
                if let Some(reference) = self.replacements.get(s.as_str()) {
                    *s = reference.clone();
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.rewrite_tree(item);
                }
            }
            Value::Object(map) => {
                for (_, item) in map.iter_mut() {
                    self.rewrite_tree(item);
                }
            }
            _ => {}
        }
    }
}

/// Count `needle` across every key and string value of a tree
fn occurrences(value: &Value, needle: &str) -> usize {
    match value {
        Value::String(s) => s.matches(needle).count(),
        Value::Array(items) => items.iter().map(|item| occurrences(item, needle)).sum(),
        Value::Object(map) => map
            .iter()
            .map(|(key, item)| key.matches(needle).count() + occurrences(item, needle))
            .sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn descriptors(pairs: &[(&str, &str)]) -> Vec<MultiDictionaryDescription> {
        pairs.iter().map(|(name, alias)| MultiDictionaryDescription::new(*name, *alias)).collect()
    }

    fn sample_config() -> Value {
        json!({
            "codecs": [
                { "name": "fix", "settings": { "dictionary": "main_dict", "verbose": true } },
                { "name": "ext", "settings": { "dictionary": "extra_dict" } }
            ],
            "fallback": ["main_dict", "other"],
            "main_dict": "key-not-value",
            "port": 8080
        })
    }

    #[test]
    fn test_text_rewrite_replaces_nested_scalars() {
        let rewriter = AliasRewriter::new(
            AliasRewriteMode::Text,
            &descriptors(&[("fix50-main", "main_dict"), ("fix50-extra", "extra_dict")]),
        );

        let rewritten = rewriter.rewrite(&sample_config()).unwrap();
        assert_eq!(rewritten, json!({
            "codecs": [
                { "name": "fix", "settings": { "dictionary": "${dictionary_link:fix50-main}", "verbose": true } },
                { "name": "ext", "settings": { "dictionary": "${dictionary_link:fix50-extra}" } }
            ],
            "fallback": ["${dictionary_link:fix50-main}", "other"],
            "main_dict": "key-not-value",
            "port": 8080
        }));
    }

    #[test]
    fn test_structural_matches_text_mode() {
        let descriptors = descriptors(&[("fix50-main", "main_dict"), ("fix50-extra", "extra_dict")]);
        let text = AliasRewriter::new(AliasRewriteMode::Text, &descriptors).rewrite(&sample_config()).unwrap();
        let tree = AliasRewriter::new(AliasRewriteMode::Structural, &descriptors).rewrite(&sample_config()).unwrap();
        assert_eq!(text, tree);
    }

    #[test]
    fn test_partial_matches_are_ignored() {
        let rewriter = AliasRewriter::new(AliasRewriteMode::Text, &descriptors(&[("d", "dict")]));
        let config = json!({ "a": "dict_v2", "b": "dictionary", "c": "dict" });

        let rewritten = rewriter.rewrite(&config).unwrap();
        assert_eq!(rewritten, json!({ "a": "dict_v2", "b": "dictionary", "c": "${dictionary_link:d}" }));
    }

    #[test]
    fn test_text_mode_matches_alias_after_inner_space() {
        let descriptors = descriptors(&[("d", "dict")]);
        let config = json!({ "b": "my dict" });

        let text = AliasRewriter::new(AliasRewriteMode::Text, &descriptors).rewrite(&config).unwrap();
        assert_eq!(text, json!({ "b": "my ${dictionary_link:d}" }));

        let tree = AliasRewriter::new(AliasRewriteMode::Structural, &descriptors).rewrite(&config).unwrap();
        assert_eq!(tree, config);
    }

    #[test]
    fn test_aliases_are_escaped() {
        let rewriter = AliasRewriter::new(AliasRewriteMode::Text, &descriptors(&[("d", "a.b")]));
        let config = json!({ "x": "a.b", "y": "aXb" });

        let rewritten = rewriter.rewrite(&config).unwrap();
        assert_eq!(rewritten, json!({ "x": "${dictionary_link:d}", "y": "aXb" }));
    }

    #[test]
    fn test_first_descriptor_per_alias_wins() {
        let rewriter = AliasRewriter::new(
            AliasRewriteMode::Structural,
            &descriptors(&[("first", "dict"), ("second", "dict")]),
        );
        let rewritten = rewriter.rewrite(&json!({ "d": "dict" })).unwrap();
        assert_eq!(rewritten, json!({ "d": "${dictionary_link:first}" }));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let rewriter = AliasRewriter::new(AliasRewriteMode::Text, &descriptors(&[("fix50-main", "main_dict")]));
        let once = rewriter.rewrite(&sample_config()).unwrap();
        let twice = rewriter.rewrite(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_substitution_breaking_yaml_is_reported() {
        let descriptors = descriptors(&[("broken: [", "x")]);
        let config = json!({ "a": "x", "b": "y" });

        let err = AliasRewriter::new(AliasRewriteMode::Text, &descriptors).rewrite(&config).unwrap_err();
        assert!(matches!(err, LinkError::AliasSubstitution(_)));

        let tree = AliasRewriter::new(AliasRewriteMode::Structural, &descriptors).rewrite(&config).unwrap();
        assert_eq!(tree, json!({ "a": "${dictionary_link:broken: [}", "b": "y" }));
    }

    #[test]
    fn test_substitution_truncated_by_comment_is_reported() {
        let descriptors = descriptors(&[("x #y", "d")]);
        let config = json!({ "a": "d" });

        let err = AliasRewriter::new(AliasRewriteMode::Text, &descriptors).rewrite(&config).unwrap_err();
        assert!(matches!(err, LinkError::AliasSubstitutionMangled(ref reference) if reference == "${dictionary_link:x #y}"));

        let tree = AliasRewriter::new(AliasRewriteMode::Structural, &descriptors).rewrite(&config).unwrap();
        assert_eq!(tree, json!({ "a": "${dictionary_link:x #y}" }));
    }

    #[test]
    fn test_no_descriptors_returns_input() {
        let rewriter = AliasRewriter::new(AliasRewriteMode::Text, &[]);
        assert!(rewriter.is_empty());
        assert_eq!(rewriter.rewrite(&sample_config()).unwrap(), sample_config());
    }
}
