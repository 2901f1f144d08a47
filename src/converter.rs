//! Link Converter
//!
//! One conversion run: index every link document, inject the index into the
//! box resources, then hand the collected errors to the caller's summary.

use crate::config::ConverterConfig;
use crate::diagnostics::{ConversionSummary, ErrorSink};
use crate::index::ResourceLinkIndex;
use crate::inject::ReferenceInjector;
use crate::resource::{LinkDocument, Th2Resource};

/// Runs link conversions with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct LinkConverter {
    config: ConverterConfig,
}

impl LinkConverter {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Build the link index alone
    pub fn build_index(&self, links: &[LinkDocument], errors: &mut ErrorSink) -> ResourceLinkIndex {
        ResourceLinkIndex::build(links, self.config.index.duplicate_policy, errors)
    }

    /// Convert `resources` in place using `links`
    ///
    /// Never fails: everything that could not be resolved is appended to
    /// `summary.errors`. The index is returned for inspection.
    pub fn convert(
        &self,
        links: &[LinkDocument],
        resources: &mut [Th2Resource],
        summary: &mut ConversionSummary,
    ) -> ResourceLinkIndex {
        let mut errors = ErrorSink::new();

        let index = self.build_index(links, &mut errors);
        let converted = ReferenceInjector::new(&index, self.config.alias.mode).inject(resources, &mut errors);

        tracing::info!(
            links = links.len(),
            boxes = resources.len(),
            converted = converted.len(),
            errors = errors.len(),
            "link conversion finished"
        );

        summary.converted.extend(converted);
        errors.drain_into(summary);
        index
    }

    /// Convert a mixed document set
    ///
    /// `Th2Link` documents are consumed as links and removed; every other
    /// document is treated as a box resource and kept in its original order.
    pub fn convert_documents(&self, documents: &mut Vec<Th2Resource>, summary: &mut ConversionSummary) -> ResourceLinkIndex {
        let links: Vec<LinkDocument> = documents
            .iter()
            .filter(|d| d.is_link())
            .map(LinkDocument::from)
            .collect();
        documents.retain(|d| !d.is_link());

        self.convert(&links, documents, summary)
    }
}
