//! Diagnostics
//!
//! Collects resource-scoped errors during a conversion run. Nothing here
//! aborts a run: every failure becomes an [`ErrorMessage`] and the caller
//! inspects the list afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Error Kinds
// =============================================================================

/// Category of a collected error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Link document payload does not decode under its declared version
    DocumentSchemaMismatch,
    /// Two single-dictionary links target the same box and type
    DictionaryTypeConflict,
    /// Custom config no longer parses after alias substitution
    AliasSubstitutionFailure,
    /// Box spec does not decode as (or encode from) the latest box shape
    ResourceSpecMismatch,
    /// Resolved dictionaries could not be merged into the custom config
    DictionaryInjectionFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentSchemaMismatch => "document-schema-mismatch",
            Self::DictionaryTypeConflict => "dictionary-type-conflict",
            Self::AliasSubstitutionFailure => "alias-substitution-failure",
            Self::ResourceSpecMismatch => "resource-spec-mismatch",
            Self::DictionaryInjectionFailure => "dictionary-injection-failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Error Message
// =============================================================================

/// A single collected error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Resource (link document or box) the error belongs to
    pub resource_name: String,
    /// Human-readable message
    pub message: String,
    pub kind: ErrorKind,
}

impl ErrorMessage {
    pub fn new(resource_name: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            message: message.into(),
            kind,
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.resource_name, self.message)
    }
}

// =============================================================================
// Error Sink
// =============================================================================

/// Append-only error list for one conversion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorSink {
    items: Vec<ErrorMessage>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error
    pub fn push(&mut self, item: ErrorMessage) {
        tracing::warn!(resource = %item.resource_name, kind = %item.kind, "{}", item.message);
        self.items.push(item);
    }

    /// Add an error from its parts
    pub fn error(&mut self, resource_name: impl Into<String>, kind: ErrorKind, message: impl Into<String>) {
        self.push(ErrorMessage::new(resource_name, kind, message));
    }

    /// Record a link document that failed to decode
    ///
    /// Produces two entries: a generic one and one carrying the decode detail.
    pub fn schema_mismatch(&mut self, document: &str, api_version: &str, detail: impl fmt::Display) {
        self.error(
            document,
            ErrorKind::DocumentSchemaMismatch,
            format!("failed to parse link document as {}, document is skipped", api_version),
        );
        self.error(document, ErrorKind::DocumentSchemaMismatch, detail.to_string());
    }

    /// Record a second dictionary linked under an already linked type
    pub fn dictionary_type_conflict(&mut self, box_name: &str, dictionary_type: &str) {
        self.error(
            box_name,
            ErrorKind::DictionaryTypeConflict,
            format!("multiple dictionaries linked under type: {}", dictionary_type),
        );
    }

    /// Get all items, insertion order
    pub fn all(&self) -> &[ErrorMessage] {
        &self.items
    }

    /// Items recorded for one resource
    pub fn for_resource<'a>(&'a self, resource_name: &'a str) -> impl Iterator<Item = &'a ErrorMessage> + 'a {
        self.items.iter().filter(move |i| i.resource_name == resource_name)
    }

    /// Count items of one kind
    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.items.iter().filter(|i| i.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Merge another sink into this one
    pub fn merge(&mut self, other: ErrorSink) {
        self.items.extend(other.items);
    }

    /// Move every item into the caller's summary
    pub fn drain_into(self, summary: &mut ConversionSummary) {
        summary.errors.extend(self.items);
    }
}

impl fmt::Display for ErrorSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}

impl IntoIterator for ErrorSink {
    type Item = ErrorMessage;
    type IntoIter = std::vec::IntoIter<ErrorMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorSink {
    type Item = &'a ErrorMessage;
    type IntoIter = std::slice::Iter<'a, ErrorMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// =============================================================================
// Conversion Summary
// =============================================================================

/// Caller-owned outcome of one or more conversion runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionSummary {
    /// Boxes whose spec was rewritten, in processing order
    pub converted: Vec<String>,
    /// Every collected error, in insertion order
    pub errors: Vec<ErrorMessage>,
}

impl ConversionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the output can be trusted as fully resolved
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Exit decision for a run: errors only fail it when `strict`
    pub fn passes(&self, strict: bool) -> bool {
        !strict || self.is_clean()
    }

    /// Format the summary for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.errors {
            output.push_str(&format!("{}\n", item));
        }

        output.push_str(&format!(
            "{} box(es) converted, {} error(s)\n",
            self.converted.len(),
            self.errors.len()
        ));

        output
    }
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}
