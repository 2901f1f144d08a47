//! th2 Link Resolution
//!
//! Turns declarative link documents (`Th2Link`) into references embedded
//! directly in the box specs they connect.
//!
//! ## Flow
//!
//! ```text
//! Th2Link v1/v2 ──decode──▶ LinkSet ──index──▶ ResourceLinkIndex
//!                                                     │
//! Th2Box (latest) ◀──────────── inject ───────────────┘
//!   pins.mq.subscribers[].linkTo      ◀ message queue links (by consumer)
//!   pins.grpc.client[].linkTo         ◀ gRPC links (by caller)
//!   customConfig.dictionaries         ◀ dictionary links
//!   customConfig ... <alias>          ◀ multi-dictionary links
//! ```
//!
//! Every failure is collected as an [`ErrorMessage`]; a run always completes.

pub mod alias;
pub mod config;
pub mod converter;
pub mod diagnostics;
pub mod error;
pub mod index;
pub mod inject;
pub mod link;
pub mod loader;
pub mod resource;
pub mod version;

pub use alias::AliasRewriter;
pub use config::{AliasRewriteMode, ConverterConfig, DuplicateLinkPolicy};
pub use converter::LinkConverter;
pub use diagnostics::{ConversionSummary, ErrorKind, ErrorMessage, ErrorSink};
pub use error::{LinkError, Result};
pub use index::{dictionary_link, LinkTo, ResourceLinkIndex, DICTIONARIES_SLOT};
pub use inject::ReferenceInjector;
pub use link::{LinkSet, VersionedLinkSpec};
pub use resource::{BoxSpec, LinkDocument, LinkEndpoint, Th2Resource};
pub use version::LinkSchemaVersion;
