//! Reading cask sources into [`Document`]s.
//!
//! Only the top level of the `cask "<token>" do ... end` block is turned into
//! declarations. Nested blocks such as `on_arm do ... end` or `livecheck do
//! ... end` are kept whole as a single declaration named after their keyword.

use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use crate::{
    domain::{Comment, Declaration, DeclarationKind, Document, Reference, SourceRange},
    storage::lexer::{LexError, Lexer, Token, TokenKind},
};

/// Keywords that open a block when they start a statement.
const BLOCK_KEYWORDS: &[&str] = &[
    "if", "unless", "while", "until", "case", "begin", "def", "class", "module",
];

/// A cask source file and its parsed contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaskFile {
    path: PathBuf,
    document: Document,
}

impl CaskFile {
    /// Parses cask source text.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be tokenized, has no
    /// `cask ... do` block, or the block is never closed.
    pub fn parse(source: &str) -> Result<Document, ParseError> {
        let tokens = Lexer::new(source).tokenize()?;
        StatementReader::new(source, &tokens).read_document()
    }

    /// Reads and parses a cask from `reader`, recording `path` as its origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader fails, the content is not UTF-8, or the
    /// content cannot be parsed.
    pub fn read<R: Read>(reader: &mut R, path: PathBuf) -> Result<Self, LoadError> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        let document = Self::parse(&source)?;
        Ok(Self { path, document })
    }

    /// Loads and parses the cask at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read, or cannot
    /// be parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let mut file = File::open(path).map_err(|io_error| match io_error.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound,
            _ => LoadError::Io(io_error),
        })?;
        Self::read(&mut file, path.to_path_buf())
    }

    /// Where the cask was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed cask.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// The cask token, taken from the file stem.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.path.file_stem().and_then(std::ffi::OsStr::to_str)
    }
}

/// Errors that can occur when parsing cask source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The source could not be split into tokens.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// There is no `cask ... do` block.
    #[error("no `cask ... do` block found")]
    MissingCaskBlock,
    /// The `cask` block, or a block inside it, is never closed.
    #[error("`cask` block starting on line {line} is never closed")]
    UnterminatedBlock {
        /// Line the `cask` block starts on.
        line: usize,
    },
}

/// Errors that can occur when loading a cask from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The cask file was not found.
    #[error("cask file not found")]
    NotFound,
    /// An I/O error occurred.
    #[error("failed to read cask file")]
    Io(#[from] io::Error),
    /// The cask source could not be parsed.
    #[error("failed to parse cask file")]
    Parse(#[from] ParseError),
}

/// One top-level statement: a token range plus the comments attached to it.
struct Statement {
    tokens: std::ops::Range<usize>,
    comments: Vec<Comment>,
}

struct StatementReader<'a> {
    source: &'a str,
    tokens: &'a [Token],
    cursor: usize,
}

impl<'a> StatementReader<'a> {
    const fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            source,
            tokens,
            cursor: 0,
        }
    }

    fn read_document(mut self) -> Result<Document, ParseError> {
        let (token, line) = self.enter_cask_block()?;

        let mut declarations = Vec::new();
        let mut pending = Vec::new();
        loop {
            let Some(next) = self.tokens.get(self.cursor) else {
                return Err(ParseError::UnterminatedBlock { line });
            };
            match &next.kind {
                TokenKind::Newline | TokenKind::Punct(';') => self.cursor += 1,
                TokenKind::Comment(text) => {
                    pending.push(Comment::new(text.clone(), next.range));
                    self.cursor += 1;
                }
                TokenKind::Word(word) if word == "end" => break,
                _ => {
                    let mut statement = self.read_statement(line)?;
                    pending.append(&mut statement.comments);
                    statement.comments = std::mem::take(&mut pending);
                    declarations.extend(self.declaration(statement));
                }
            }
        }

        tracing::trace!(
            token = token.as_deref(),
            declarations = declarations.len(),
            "parsed cask"
        );
        Ok(Document::new(token, declarations))
    }

    /// Moves the cursor past `cask "<token>" do`. Returns the token, if it is
    /// a plain string, and the line the block starts on.
    fn enter_cask_block(&mut self) -> Result<(Option<String>, usize), ParseError> {
        let mut at_line_start = true;
        for (index, token) in self.tokens.iter().enumerate() {
            match &token.kind {
                TokenKind::Word(word) if word == "cask" && at_line_start => {
                    let line = token.range.start.line;
                    let header = self.tokens[index + 1..]
                        .iter()
                        .take_while(|token| token.kind != TokenKind::Newline);
                    let mut name = None;
                    for (offset, header_token) in header.enumerate() {
                        match &header_token.kind {
                            TokenKind::Str {
                                value,
                                interpolated: false,
                            } if name.is_none() => name = Some(value.clone()),
                            TokenKind::Word(word) if word == "do" => {
                                self.cursor = index + offset + 2;
                                return Ok((name, line));
                            }
                            _ => {}
                        }
                    }
                    at_line_start = false;
                }
                TokenKind::Newline => at_line_start = true,
                TokenKind::Comment(_) => {}
                _ => at_line_start = false,
            }
        }
        Err(ParseError::MissingCaskBlock)
    }

    /// Reads a statement starting at the cursor, leaving the cursor on the
    /// token that ended it.
    fn read_statement(&mut self, block_line: usize) -> Result<Statement, ParseError> {
        let start = self.cursor;
        let mut comments = Vec::new();
        let mut brackets = 0usize;
        let mut blocks = 0usize;
        let mut clause_start = true;
        let mut last_code: Option<usize> = None;

        while let Some(token) = self.tokens.get(self.cursor) {
            let balanced = brackets == 0 && blocks == 0;
            match &token.kind {
                TokenKind::Newline | TokenKind::Punct(';') => {
                    if balanced && !self.continues(last_code) {
                        break;
                    }
                    clause_start = true;
                    self.cursor += 1;
                    continue;
                }
                TokenKind::Comment(text) => {
                    comments.push(Comment::new(text.clone(), token.range));
                    self.cursor += 1;
                    continue;
                }
                TokenKind::Punct('(' | '[' | '{') => brackets += 1,
                TokenKind::Punct(')' | ']' | '}') => brackets = brackets.saturating_sub(1),
                TokenKind::Word(word) if word == "do" => blocks += 1,
                TokenKind::Word(word) if word == "end" => {
                    if blocks == 0 {
                        break;
                    }
                    blocks -= 1;
                }
                TokenKind::Word(word) if clause_start && BLOCK_KEYWORDS.contains(&word.as_str()) => {
                    blocks += 1;
                }
                _ => {}
            }
            clause_start = matches!(token.kind, TokenKind::Punct('='));
            last_code = Some(self.cursor);
            self.cursor += 1;
        }

        if self.cursor >= self.tokens.len() && (brackets > 0 || blocks > 0) {
            return Err(ParseError::UnterminatedBlock { line: block_line });
        }

        let end = last_code.map_or(start, |index| index + 1);
        Ok(Statement {
            tokens: start..end,
            comments,
        })
    }

    /// Whether a line break after the token at `last_code` continues the
    /// statement.
    fn continues(&self, last_code: Option<usize>) -> bool {
        let trailing_operator = last_code
            .and_then(|index| self.tokens.get(index))
            .is_some_and(|token| {
                matches!(
                    token.kind,
                    TokenKind::Punct(
                        ',' | '\\' | '+' | '-' | '*' | '|' | '&' | '=' | '.' | '?' | ':' | '<'
                            | '>'
                    )
                )
            });
        trailing_operator || self.next_line_starts_with_dot()
    }

    fn next_line_starts_with_dot(&self) -> bool {
        self.tokens[self.cursor + 1..]
            .iter()
            .find(|token| !matches!(token.kind, TokenKind::Newline | TokenKind::Comment(_)))
            .is_some_and(|token| {
                token.kind == TokenKind::Punct('.') || token.kind == TokenKind::Punct('&')
            })
    }

    fn declaration(&self, statement: Statement) -> Option<Declaration> {
        let tokens = &self.tokens[statement.tokens];
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            return None;
        };
        let range = SourceRange::new(first.range.start, last.range.end);

        let kind = match &first.kind {
            TokenKind::Word(name) => DeclarationKind::from_stanza(name),
            _ => DeclarationKind::Other(self.source[first.span.clone()].to_string()),
        };
        let reference = self.first_argument(&tokens[1..], first);

        Some(Declaration::new(
            kind,
            reference,
            range,
            statement.comments,
        ))
    }

    /// The first argument of a stanza call, e.g. the url of
    /// `url "https://...", verified: "..."`.
    fn first_argument(&self, tokens: &[Token], name: &Token) -> Reference {
        let code: Vec<&Token> = tokens
            .iter()
            .filter(|token| !matches!(token.kind, TokenKind::Comment(_) | TokenKind::Newline))
            .collect();

        let parenthesized = code
            .first()
            .is_some_and(|token| token.kind == TokenKind::Punct('(') && token.span.start == name.span.end);
        let code = if parenthesized { &code[1..] } else { &code[..] };

        let mut depth = 0usize;
        let mut argument: &[&Token] = code;
        for (index, token) in code.iter().enumerate() {
            let at_top = depth == 0;
            match &token.kind {
                TokenKind::Punct('{') if at_top && index > 0 => {
                    argument = &code[..index];
                    break;
                }
                TokenKind::Punct('(' | '[' | '{') => depth += 1,
                TokenKind::Punct(')') if at_top && parenthesized => {
                    argument = &code[..index];
                    break;
                }
                TokenKind::Punct(')' | ']' | '}') => depth = depth.saturating_sub(1),
                TokenKind::Punct(',') if at_top => {
                    argument = &code[..index];
                    break;
                }
                TokenKind::Word(word)
                    if at_top && matches!(word.as_str(), "do" | "if" | "unless") =>
                {
                    argument = &code[..index];
                    break;
                }
                _ => {}
            }
        }

        match argument {
            [] => Reference::Expression(String::new()),
            [single] => match &single.kind {
                TokenKind::Str {
                    value,
                    interpolated: false,
                } => Reference::Literal(value.clone()),
                _ => Reference::Expression(self.source[single.span.clone()].to_string()),
            },
            [first, .., last] => {
                Reference::Expression(self.source[first.span.start..last.span.end].to_string())
            }
        }
    }
}
