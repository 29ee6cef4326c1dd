//! Cask url auditing
//!
//! Homebrew casks declare a `homepage` and one or more `url` stanzas. When a
//! download is served from a different domain than the homepage, the `url`
//! must carry a comment recording that the domain was verified as official:
//!
//! ```ruby
//! # github.com/foo/bar/ was verified as official when first introduced to the cask
//! url "https://github.com/foo/bar/releases/download/v#{version}/Foo.dmg"
//! ```
//!
//! This crate reads cask sources and reports `url` stanzas whose comment is
//! missing, unnecessary, malformed or does not match the url.
//!
//! ```
//! use caskaudit::{CaskFile, DiagnosticKind, PublicSuffixList, audit};
//!
//! let document = CaskFile::parse(
//!     r#"cask "foo" do
//!   url "https://files.other.org/foo.dmg"
//!   homepage "https://example.com"
//! end
//! "#,
//! )
//! .unwrap();
//!
//! let diagnostics = audit(&document, &PublicSuffixList);
//! assert_eq!(diagnostics[0].kind(), DiagnosticKind::Missing);
//! ```

pub mod domain;
pub use domain::{
    Config, Diagnostic, DiagnosticKind, Document, DomainRegistry, PublicSuffixList, audit,
};

/// Filesystem storage and directory scanning for casks.
pub mod storage;
pub use storage::{CaskFile, Directory};

pub mod report;
pub use report::{FileReport, Reporter};
