//! The parsed form of a cask: an ordered list of top-level declarations.
//!
//! A [`Document`] is produced once per analysis pass by the document reader
//! (see [`crate::storage::CaskFile`]) and is read-only afterwards.

use std::fmt;

use serde::Serialize;

/// A 1-based line and column in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number in characters, starting at 1.
    pub column: usize,
}

impl Position {
    /// Creates a position from a 1-based line and column.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span of source text. The end position is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceRange {
    /// First character of the span.
    pub start: Position,
    /// One past the last character of the span.
    pub end: Position,
}

impl SourceRange {
    /// Creates a range from its two endpoints.
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A `#` comment, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    text: String,
    range: SourceRange,
}

impl Comment {
    /// Creates a comment from its raw text (including the leading `#`).
    #[must_use]
    pub fn new(text: impl Into<String>, range: SourceRange) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }

    /// The raw comment text, including the leading `#`.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the comment sits in the source.
    #[must_use]
    pub const fn range(&self) -> SourceRange {
        self.range
    }
}

/// What a declaration declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKind {
    /// The canonical `homepage` of the cask.
    Homepage,
    /// A `url` stanza pointing at a download.
    Download,
    /// Any other stanza, named by its keyword.
    Other(String),
}

impl DeclarationKind {
    /// Maps a stanza keyword onto its kind.
    #[must_use]
    pub fn from_stanza(name: &str) -> Self {
        match name {
            "homepage" => Self::Homepage,
            "url" => Self::Download,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The argument of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A plain string literal, with escapes resolved.
    Literal(String),
    /// Anything else (interpolated strings, method calls, concatenations),
    /// kept as its source text.
    Expression(String),
}

impl Reference {
    /// The text of the reference as seen by the normalizer.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(text) | Self::Expression(text) => text,
        }
    }
}

/// A single top-level stanza of a cask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    kind: DeclarationKind,
    reference: Reference,
    range: SourceRange,
    comments: Vec<Comment>,
}

impl Declaration {
    /// Creates a declaration.
    ///
    /// `comments` are the comments attached to the stanza, in source order.
    #[must_use]
    pub const fn new(
        kind: DeclarationKind,
        reference: Reference,
        range: SourceRange,
        comments: Vec<Comment>,
    ) -> Self {
        Self {
            kind,
            reference,
            range,
            comments,
        }
    }

    /// The kind of stanza.
    #[must_use]
    pub const fn kind(&self) -> &DeclarationKind {
        &self.kind
    }

    /// The first argument of the stanza.
    #[must_use]
    pub const fn reference(&self) -> &Reference {
        &self.reference
    }

    /// The full extent of the stanza, excluding comments.
    #[must_use]
    pub const fn range(&self) -> SourceRange {
        self.range
    }

    /// All comments attached to the stanza, in source order.
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// The comment the stanza is annotated with: the last attached one.
    #[must_use]
    pub fn comment(&self) -> Option<&Comment> {
        self.comments.last()
    }

    /// Whether this is a `homepage` stanza.
    #[must_use]
    pub fn is_homepage(&self) -> bool {
        self.kind == DeclarationKind::Homepage
    }

    /// Whether this is a `url` stanza.
    #[must_use]
    pub fn is_download(&self) -> bool {
        self.kind == DeclarationKind::Download
    }
}

/// A parsed cask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    token: Option<String>,
    declarations: Vec<Declaration>,
}

impl Document {
    /// Creates a document from the cask token and its declarations in source
    /// order.
    #[must_use]
    pub const fn new(token: Option<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            token,
            declarations,
        }
    }

    /// The name given to the `cask` block, if it was a string literal.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// All top-level declarations in source order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    /// The homepage declaration. If several exist, the first one wins.
    #[must_use]
    pub fn homepage(&self) -> Option<&Declaration> {
        self.declarations.iter().find(|decl| decl.is_homepage())
    }

    /// The download declarations in source order.
    pub fn downloads(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(|decl| decl.is_download())
    }
}
