//! The decision engine.
//!
//! Every `url` stanza of a cask is compared against the cask's `homepage`.
//! Exactly one of the following applies, checked in this order:
//!
//! | domain   | comment | corresponds | well formed | outcome       |
//! |----------|---------|-------------|-------------|---------------|
//! | same     | yes     | yes         | any         | `Unnecessary` |
//! | differs  | no      | -           | -           | `Missing`     |
//! | differs  | yes     | no          | yes         | `NoMatch`     |
//! | differs  | yes     | any         | no          | `WrongFormat` |
//! | otherwise |         |             |             | none          |
//!
//! A malformed comment does not assert a domain, so it is reported as
//! `WrongFormat` rather than `NoMatch` even if its first word is not part of
//! the url.

use std::fmt;

use serde::Serialize;
use tracing::instrument;

use crate::domain::{
    Comment, Declaration, Document, DomainRegistry, RegistrableDomain, SourceRange,
    asserted_domain, comment_matches_format, comment_matches_full_reference, domain_of,
    full_reference_of, has_comment,
};

/// Documentation for the comment policy, linked from diagnostics.
pub const REFERENCE_URL: &str = "https://github.com/Homebrew/homebrew-cask/blob/master/doc/cask_language_reference/stanzas/url.md#when-url-and-homepage-hostnames-differ-add-a-comment";

/// The kind of problem found with a `url` stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// The url matches the homepage, so the verification comment is not
    /// needed.
    Unnecessary,
    /// The url does not match the homepage and has no comment.
    Missing,
    /// The comment vouches for a different domain than the url uses.
    NoMatch,
    /// The comment does not use the required phrasing.
    WrongFormat,
}

impl DiagnosticKind {
    /// A short, stable name for the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unnecessary => "unnecessary",
            Self::Missing => "missing",
            Self::NoMatch => "no-match",
            Self::WrongFormat => "wrong-format",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    location: SourceRange,
    message: String,
}

impl Diagnostic {
    /// What was found.
    #[must_use]
    pub const fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// The comment's range, or the whole stanza for [`DiagnosticKind::Missing`].
    #[must_use]
    pub const fn location(&self) -> SourceRange {
        self.location
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The observations the decision is made from.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Facts {
    /// The url's registrable domain equals the homepage's.
    pub domain_matches: bool,
    /// The stanza carries a comment.
    pub has_comment: bool,
    /// The domain asserted by the comment occurs in the url.
    pub corresponds: bool,
    /// The comment uses the required phrasing.
    pub well_formed: bool,
}

impl Facts {
    /// Collects the facts for a declaration.
    #[must_use]
    pub fn of(
        decl: &Declaration,
        domain: &RegistrableDomain,
        homepage: &RegistrableDomain,
    ) -> Self {
        Self {
            domain_matches: domain.matches(homepage),
            has_comment: has_comment(decl),
            corresponds: comment_matches_full_reference(decl),
            well_formed: comment_matches_format(decl),
        }
    }

    /// Picks the outcome. The first matching row wins.
    #[must_use]
    pub const fn verdict(self) -> Option<DiagnosticKind> {
        match self {
            Self {
                domain_matches: true,
                has_comment: true,
                corresponds: true,
                ..
            } => Some(DiagnosticKind::Unnecessary),
            Self {
                domain_matches: false,
                has_comment: false,
                ..
            } => Some(DiagnosticKind::Missing),
            Self {
                domain_matches: false,
                has_comment: true,
                corresponds: false,
                well_formed: true,
            } => Some(DiagnosticKind::NoMatch),
            Self {
                domain_matches: false,
                has_comment: true,
                well_formed: false,
                ..
            } => Some(DiagnosticKind::WrongFormat),
            _ => None,
        }
    }
}

/// Audits the downloads of one document against its homepage.
#[derive(Debug)]
pub struct Auditor<'a, R: ?Sized> {
    registry: &'a R,
    homepage: RegistrableDomain,
}

impl<'a, R> Auditor<'a, R>
where
    R: DomainRegistry + ?Sized,
{
    /// Prepares an audit of `document`.
    ///
    /// Returns `None` when the document has no homepage; there is nothing to
    /// compare against in that case.
    #[must_use]
    pub fn for_document(document: &Document, registry: &'a R) -> Option<Self> {
        let homepage = document.homepage()?;
        let homepage = domain_of(homepage.reference(), registry);
        if homepage.is_empty() {
            tracing::warn!(
                token = document.token(),
                "homepage has no recognisable host, every url will be reported"
            );
        }
        Some(Self { registry, homepage })
    }

    /// The homepage's registrable domain.
    #[must_use]
    pub const fn homepage(&self) -> &RegistrableDomain {
        &self.homepage
    }

    /// Decides the outcome for a single `url` stanza.
    #[must_use]
    pub fn evaluate(&self, decl: &Declaration) -> Option<Diagnostic> {
        let domain = domain_of(decl.reference(), self.registry);
        let facts = Facts::of(decl, &domain, &self.homepage);
        let kind = facts.verdict()?;
        tracing::debug!(?facts, %kind, %domain, "url stanza flagged");

        let comment_range = || decl.comment().map_or_else(|| decl.range(), Comment::range);

        let (location, message) = match kind {
            DiagnosticKind::Unnecessary => (
                comment_range(),
                format!(
                    "`{domain}` matches `{homepage}`, the comment above the `url` stanza is unnecessary",
                    homepage = self.homepage
                ),
            ),
            DiagnosticKind::Missing => (
                decl.range(),
                format!(
                    "`{domain}` does not match `{homepage}`, a comment has to be added above the `url` stanza. For details, see {REFERENCE_URL}",
                    homepage = self.homepage
                ),
            ),
            DiagnosticKind::NoMatch => (
                comment_range(),
                format!(
                    "`{asserted}` does not match `{full}`",
                    asserted = asserted_domain(decl),
                    full = full_reference_of(decl.reference())
                ),
            ),
            DiagnosticKind::WrongFormat => (
                comment_range(),
                format!(
                    "`{comment}` does not match the expected comment format. For details, see {REFERENCE_URL}",
                    comment = decl.comment().map_or("", Comment::text)
                ),
            ),
        };

        Some(Diagnostic {
            kind,
            location,
            message,
        })
    }
}

/// Audits every `url` stanza of a document, in source order.
///
/// A document without a homepage produces no diagnostics.
#[must_use]
#[instrument(level = "debug", skip_all, fields(token = document.token()))]
pub fn audit<R>(document: &Document, registry: &R) -> Vec<Diagnostic>
where
    R: DomainRegistry + ?Sized,
{
    let Some(auditor) = Auditor::for_document(document, registry) else {
        tracing::debug!("no homepage, nothing to check");
        return Vec::new();
    };

    document
        .downloads()
        .filter_map(|decl| auditor.evaluate(decl))
        .collect()
}
