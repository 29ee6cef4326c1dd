//! Domain models and rules for auditing cask urls.
//!
//! This module contains the parsed document model, reference normalization,
//! annotation parsing and the decision engine that ties them together.

/// Documents, declarations and source positions.
pub mod document;
pub use document::{Comment, Declaration, DeclarationKind, Document, Position, Reference, SourceRange};

mod registry;
pub use registry::{DomainRegistry, PublicSuffixList};

/// Reference normalization.
pub mod reference;
pub use reference::{RegistrableDomain, domain_of, extract_url, full_reference_of, hostname_of};

/// Verification comment parsing.
pub mod annotation;
pub use annotation::{
    asserted_domain, comment_matches_format, comment_matches_full_reference, has_comment,
};

/// The decision engine.
pub mod audit;
pub use audit::{Auditor, Diagnostic, DiagnosticKind, Facts, REFERENCE_URL, audit};

mod config;
pub use config::Config;
