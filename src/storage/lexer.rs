//! A tokenizer for the subset of Ruby used in cask files.
//!
//! It only needs to be good enough to find statement boundaries, string
//! literals and comments. It does not understand precedence or method calls.

use std::{iter::Peekable, ops::Range, str::CharIndices};

use crate::domain::{Position, SourceRange};

/// A lexical token and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offsets into the source.
    pub span: Range<usize>,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Newline,
    /// A `#` comment, including the `#`.
    Comment(String),
    /// A string literal. `value` has escapes resolved; it is only meaningful
    /// when the literal is not interpolated.
    Str { value: String, interpolated: bool },
    /// Heredocs, `%w[]`-style and regex literals. Opaque.
    Literal,
    /// Identifiers, keywords, numbers, instance variables and symbols' names.
    Word(String),
    Punct(char),
}

/// Errors raised while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// A string literal was still open at the end of input.
    #[error("unterminated string starting on line {line}")]
    UnterminatedString {
        /// Line the string starts on.
        line: usize,
    },
    /// A heredoc terminator was never found.
    #[error("unterminated heredoc `{terminator}` starting on line {line}")]
    UnterminatedHeredoc {
        /// The identifier closing the heredoc.
        terminator: String,
        /// Line the heredoc starts on.
        line: usize,
    },
    /// A percent or regex literal was still open at the end of input.
    #[error("unterminated literal starting on line {line}")]
    UnterminatedLiteral {
        /// Line the literal starts on.
        line: usize,
    },
}

struct PendingHeredoc {
    terminator: String,
    indented_end: bool,
    token_index: usize,
    line: usize,
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    heredocs: Vec<PendingHeredoc>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            tokens: Vec::new(),
            heredocs: Vec::new(),
        }
    }

    /// Splits the whole source into tokens.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(&(offset, c)) = self.chars.peek() {
            let start = self.position();
            match c {
                '\n' => {
                    self.bump();
                    self.push(TokenKind::Newline, offset, start);
                    self.read_heredoc_bodies()?;
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '\\' if line_break_len(&self.source[offset + 1..]) > 0 => {
                    for _ in 0..=line_break_len(&self.source[offset + 1..]) {
                        self.bump();
                    }
                }
                '#' => {
                    let text = self.take_while(|c| !matches!(c, '\n' | '\r'));
                    self.push(TokenKind::Comment(text), offset, start);
                }
                '"' | '`' => {
                    self.bump();
                    let (value, interpolated) = self.read_double_quoted(c, start.line)?;
                    self.push(
                        TokenKind::Str {
                            value,
                            interpolated,
                        },
                        offset,
                        start,
                    );
                }
                '\'' => {
                    self.bump();
                    let value = self.read_single_quoted(start.line)?;
                    self.push(
                        TokenKind::Str {
                            value,
                            interpolated: false,
                        },
                        offset,
                        start,
                    );
                }
                '<' if self.at_heredoc_start(offset) => {
                    self.read_heredoc_opener(offset, start);
                }
                '%' if self.at_percent_literal(offset) => {
                    self.read_percent_literal(start.line)?;
                    self.push(TokenKind::Literal, offset, start);
                }
                '?' if self.at_char_literal(offset) => {
                    self.bump();
                    if self.bump() == Some('\\') {
                        self.bump();
                    }
                    self.push(TokenKind::Literal, offset, start);
                }
                '/' if self.in_operand_position(offset) => {
                    self.bump();
                    self.read_until_closing('/', None, start.line)?;
                    self.take_while(|c| c.is_ascii_alphabetic());
                    self.push(TokenKind::Literal, offset, start);
                }
                c if is_word_char(c) => {
                    let mut word = self.take_while(is_word_char);
                    if let Some(&(_, suffix @ ('?' | '!'))) = self.chars.peek() {
                        if self.peek_second() != Some('=') {
                            self.bump();
                            word.push(suffix);
                        }
                    }
                    self.push(TokenKind::Word(word), offset, start);
                }
                c => {
                    self.bump();
                    self.push(TokenKind::Punct(c), offset, start);
                }
            }
        }

        if let Some(heredoc) = self.heredocs.first() {
            return Err(LexError::UnterminatedHeredoc {
                terminator: heredoc.terminator.clone(),
                line: heredoc.line,
            });
        }

        Ok(self.tokens)
    }

    const fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn offset(&mut self) -> usize {
        let end = self.source.len();
        self.chars.peek().map_or(end, |&(offset, _)| offset)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if !predicate(c) {
                break;
            }
            taken.push(c);
            self.bump();
        }
        taken
    }

    fn push(&mut self, kind: TokenKind, start_offset: usize, start: Position) {
        let end_offset = self.offset();
        let end = self.position();
        self.tokens.push(Token {
            kind,
            span: start_offset..end_offset,
            range: SourceRange::new(start, end),
        });
    }

    fn last_significant(&self) -> Option<&TokenKind> {
        self.tokens
            .iter()
            .rev()
            .map(|token| &token.kind)
            .find(|kind| !matches!(kind, TokenKind::Comment(_)))
    }

    /// A `/`, `%` or `<<` at `offset` starts a literal when it cannot be a
    /// binary operator.
    fn in_operand_position(&self, offset: usize) -> bool {
        match self.last_significant() {
            None | Some(TokenKind::Newline) => true,
            Some(TokenKind::Punct(c)) => !matches!(c, ')' | ']' | '}'),
            Some(TokenKind::Word(word)) => matches!(
                word.as_str(),
                "if" | "unless" | "when" | "and" | "or" | "not" | "return" | "then"
            ) || is_call_with_space(word, &self.source[offset..]),
            Some(_) => false,
        }
    }

    /// Reads the body of a `"` (or backtick) string, whose opening quote has
    /// been consumed. Interpolations are skipped with their nesting respected.
    fn read_double_quoted(&mut self, quote: char, line: usize) -> Result<(String, bool), LexError> {
        let mut value = String::new();
        let mut interpolated = false;
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedString { line }),
                Some(c) if c == quote => return Ok((value, interpolated)),
                Some('\\') => match self.bump() {
                    None => return Err(LexError::UnterminatedString { line }),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(escaped) => value.push(escaped),
                },
                Some('#') if matches!(self.chars.peek(), Some(&(_, '{'))) => {
                    self.bump();
                    interpolated = true;
                    self.skip_interpolation(line)?;
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// Skips the code of a `#{...}` whose opening brace has been consumed.
    fn skip_interpolation(&mut self, line: usize) -> Result<(), LexError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.bump() {
                None => return Err(LexError::UnterminatedString { line }),
                Some('{') => depth += 1,
                Some('}') => depth -= 1,
                Some(quote @ ('"' | '`')) => {
                    self.read_double_quoted(quote, line)?;
                }
                Some('\'') => {
                    self.read_single_quoted(line)?;
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn read_single_quoted(&mut self, line: usize) -> Result<String, LexError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedString { line }),
                Some('\'') => return Ok(value),
                Some('\\') => match self.bump() {
                    None => return Err(LexError::UnterminatedString { line }),
                    Some(escaped @ ('\'' | '\\')) => value.push(escaped),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                },
                Some(c) => value.push(c),
            }
        }
    }

    /// `?x` and `?\n` style character literals.
    fn at_char_literal(&self, offset: usize) -> bool {
        let mut rest = self.source[offset + 1..].chars();
        let complete = match rest.next() {
            Some('\\') => true,
            Some(c) if !c.is_whitespace() => rest.next().is_none_or(|next| !is_word_char(next)),
            _ => false,
        };
        complete && self.in_operand_position(offset)
    }

    fn at_percent_literal(&self, offset: usize) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        match ahead.next().map(|(_, c)| c) {
            Some(c) if is_percent_delimiter(c) => self.in_operand_position(offset),
            Some('q' | 'Q' | 'w' | 'W' | 'i' | 'I' | 'r' | 's' | 'x') => ahead
                .next()
                .is_some_and(|(_, c)| is_percent_delimiter(c)),
            _ => false,
        }
    }

    fn read_percent_literal(&mut self, line: usize) -> Result<(), LexError> {
        self.bump();
        let letter = match self.chars.peek() {
            Some(&(_, c)) if c.is_ascii_alphabetic() => self.bump(),
            _ => None,
        };
        let open = self.bump().ok_or(LexError::UnterminatedLiteral { line })?;
        let (close, nests) = match open {
            '(' => (')', Some('(')),
            '[' => (']', Some('[')),
            '{' => ('}', Some('{')),
            '<' => ('>', Some('<')),
            other => (other, None),
        };
        self.read_until_closing(close, nests, line)?;
        if letter == Some('r') {
            // flags, e.g. %r{...}i
            self.take_while(|c| c.is_ascii_alphabetic());
        }
        Ok(())
    }

    fn read_until_closing(
        &mut self,
        close: char,
        nests: Option<char>,
        line: usize,
    ) -> Result<(), LexError> {
        let mut depth = 1usize;
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedLiteral { line }),
                Some('\\') => {
                    self.bump();
                }
                Some(c) if Some(c) == nests => depth += 1,
                Some(c) if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn at_heredoc_start(&self, offset: usize) -> bool {
        parse_heredoc_opener(&self.source[offset..]).is_some() && self.in_operand_position(offset)
    }

    fn read_heredoc_opener(&mut self, offset: usize, start: Position) {
        let Some((consumed, terminator, indented_end)) =
            parse_heredoc_opener(&self.source[offset..])
        else {
            return;
        };
        for _ in 0..consumed {
            self.bump();
        }
        self.push(TokenKind::Literal, offset, start);
        self.heredocs.push(PendingHeredoc {
            terminator,
            indented_end,
            token_index: self.tokens.len() - 1,
            line: start.line,
        });
    }

    /// Consumes the bodies of heredocs opened on the line just finished. The
    /// opener token is widened to cover its body.
    fn read_heredoc_bodies(&mut self) -> Result<(), LexError> {
        for heredoc in std::mem::take(&mut self.heredocs) {
            loop {
                if self.chars.peek().is_none() {
                    return Err(LexError::UnterminatedHeredoc {
                        terminator: heredoc.terminator,
                        line: heredoc.line,
                    });
                }
                let line = self.take_while(|c| c != '\n');
                let is_end = if heredoc.indented_end {
                    line.trim() == heredoc.terminator
                } else {
                    line.trim_end_matches('\r') == heredoc.terminator
                };
                let end_offset = self.offset();
                let end = self.position();
                self.bump();
                if is_end {
                    let token = &mut self.tokens[heredoc.token_index];
                    token.span.end = end_offset;
                    token.range.end = end;
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Parses `<<~ID`, `<<-ID`, `<<ID` and their quoted forms at the start of
/// `rest`. Returns the number of chars consumed, the terminator and whether
/// the terminator may be indented.
fn parse_heredoc_opener(rest: &str) -> Option<(usize, String, bool)> {
    let after = rest.strip_prefix("<<")?;
    let (indented_end, after, mut consumed) = match after.chars().next()? {
        '~' | '-' => (true, &after[1..], 3),
        _ => (false, after, 2),
    };
    let (quote, after) = match after.chars().next()? {
        q @ ('"' | '\'' | '`') => (Some(q), &after[1..]),
        _ => (None, after),
    };
    let terminator: String = after
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if terminator.is_empty() || !terminator.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    consumed += terminator.chars().count();
    if let Some(q) = quote {
        if !after[terminator.len()..].starts_with(q) {
            return None;
        }
        consumed += 2;
    }
    Some((consumed, terminator, indented_end))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '$')
}

const fn is_percent_delimiter(c: char) -> bool {
    matches!(c, '(' | '[' | '{' | '<' | '|' | '!' | '/' | '^')
}

/// The length of the line break at the start of `rest`, if any.
fn line_break_len(rest: &str) -> usize {
    if rest.starts_with('\n') {
        1
    } else if rest.starts_with("\r\n") {
        2
    } else {
        0
    }
}

/// `regex /foo/` and `url <<~EOS` style calls: a bare word followed by a
/// space and then the literal, with no space after the operator.
fn is_call_with_space(word: &str, rest: &str) -> bool {
    word.starts_with(|c: char| c.is_ascii_lowercase())
        && rest.len() > 1
        && !rest[1..].starts_with([' ', '='])
        && !rest.starts_with("<<=")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn word(text: &str) -> TokenKind {
        TokenKind::Word(text.to_string())
    }

    fn string(value: &str, interpolated: bool) -> TokenKind {
        TokenKind::Str {
            value: value.to_string(),
            interpolated,
        }
    }

    #[test]
    fn stanza_with_string() {
        assert_eq!(
            kinds("url \"https://example.com/a.dmg\"\n"),
            vec![
                word("url"),
                string("https://example.com/a.dmg", false),
                TokenKind::Newline
            ]
        );
    }

    #[test]
    fn hash_inside_string_is_not_a_comment() {
        assert_eq!(
            kinds("url \"https://example.com/#download\" # trailing"),
            vec![
                word("url"),
                string("https://example.com/#download", false),
                TokenKind::Comment("# trailing".to_string()),
            ]
        );
    }

    #[test]
    fn interpolation_is_skipped() {
        assert_eq!(
            kinds(r#"url "https://x.org/#{version.csv.first}/#{"nested"}.dmg""#),
            vec![word("url"), string("https://x.org//.dmg", true)]
        );
    }

    #[test]
    fn escapes_are_resolved() {
        assert_eq!(
            kinds(r#"name "Say \"hi\"""#),
            vec![word("name"), string("Say \"hi\"", false)]
        );
        assert_eq!(
            kinds(r"name 'it\'s'"),
            vec![word("name"), string("it's", false)]
        );
    }

    #[test]
    fn predicate_words_keep_their_suffix() {
        assert_eq!(
            kinds("auto_updates true if arm?"),
            vec![word("auto_updates"), word("true"), word("if"), word("arm?")]
        );
    }

    #[test]
    fn positions_are_one_based() {
        let tokens = Lexer::new("cask \"foo\" do\n  url \"x\"\nend\n")
            .tokenize()
            .unwrap();
        let url = tokens
            .iter()
            .find(|token| token.kind == word("url"))
            .unwrap();
        assert_eq!(url.range.start, Position::new(2, 3));
        assert_eq!(url.range.end, Position::new(2, 6));
        assert_eq!(url.span, 16..19);
    }

    #[test]
    fn heredoc_body_is_one_token() {
        let source = "caveats <<~EOS\n  # not a comment\n  \"not a string\n  EOS\nurl \"x\"\n";
        let tokens = Lexer::new(source).tokenize().unwrap();
        let kinds: Vec<_> = tokens.iter().map(|token| token.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                word("caveats"),
                TokenKind::Literal,
                TokenKind::Newline,
                word("url"),
                string("x", false),
                TokenKind::Newline,
            ]
        );
        assert_eq!(tokens[1].range.end.line, 4);
    }

    #[test]
    fn unterminated_heredoc_is_an_error() {
        let result = Lexer::new("caveats <<~EOS\n  text\n").tokenize();
        assert!(matches!(
            result,
            Err(LexError::UnterminatedHeredoc { line: 1, .. })
        ));
    }

    #[test]
    fn percent_literals_are_opaque() {
        assert_eq!(
            kinds("depends_on arch: %w[x86_64 #arm64]\n"),
            vec![
                word("depends_on"),
                word("arch"),
                TokenKind::Punct(':'),
                TokenKind::Literal,
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn regex_literals_are_opaque() {
        assert_eq!(
            kinds(r#"regex(/href="(.+?)#x"/i)"#),
            vec![
                word("regex"),
                TokenKind::Punct('('),
                TokenKind::Literal,
                TokenKind::Punct(')'),
            ]
        );
        assert_eq!(
            kinds(r"regex %r{/v(\d+)}i"),
            vec![word("regex"), TokenKind::Literal]
        );
    }

    #[test]
    fn division_is_not_a_regex() {
        assert_eq!(
            kinds("x = (a) / 2 # half"),
            vec![
                word("x"),
                TokenKind::Punct('='),
                TokenKind::Punct('('),
                word("a"),
                TokenKind::Punct(')'),
                TokenKind::Punct('/'),
                word("2"),
                TokenKind::Comment("# half".to_string()),
            ]
        );
    }

    #[test]
    fn line_continuation_is_skipped() {
        assert_eq!(
            kinds("url \\\n  \"x\"\n"),
            vec![word("url"), string("x", false), TokenKind::Newline]
        );
    }

    #[test]
    fn crlf_heredocs_and_comments() {
        let source = "caveats <<EOS\r\n hi\r\nEOS\r\n# note\r\nurl \\\r\n  \"x\"\r\n";
        assert_eq!(
            kinds(source),
            vec![
                word("caveats"),
                TokenKind::Literal,
                TokenKind::Newline,
                TokenKind::Comment("# note".to_string()),
                TokenKind::Newline,
                word("url"),
                string("x", false),
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn char_literals_do_not_open_strings() {
        assert_eq!(
            kinds("x = [?\", ?a, ?\\n]\nurl \"y\"\n"),
            vec![
                word("x"),
                TokenKind::Punct('='),
                TokenKind::Punct('['),
                TokenKind::Literal,
                TokenKind::Punct(','),
                TokenKind::Literal,
                TokenKind::Punct(','),
                TokenKind::Literal,
                TokenKind::Punct(']'),
                TokenKind::Newline,
                word("url"),
                string("y", false),
                TokenKind::Newline,
            ]
        );
    }

    #[test]
    fn ternary_is_not_a_char_literal() {
        assert_eq!(
            kinds("a ? b : c"),
            vec![
                word("a"),
                TokenKind::Punct('?'),
                word("b"),
                TokenKind::Punct(':'),
                word("c"),
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let result = Lexer::new("cask \"foo\" do\n  url \"https://example.com\nend\n").tokenize();
        assert_eq!(result, Err(LexError::UnterminatedString { line: 2 }));
    }
}
