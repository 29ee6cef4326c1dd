//! Verification comments on `url` stanzas.
//!
//! When a download is served from a different domain than the homepage, the
//! stanza must be annotated with a comment of the form
//!
//! ```text
//! # example.com was verified as official when first introduced to the cask
//! ```
//!
//! The helpers here read the *last* comment attached to a declaration.

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

use crate::domain::{Declaration, full_reference_of};

/// The required phrasing. Searched for anywhere in the comment.
pub const COMMENT_FORMAT: &str =
    "# [^ ]+ was verified as official when first introduced to the cask";

static COMMENT_FORMAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COMMENT_FORMAT).expect("comment format pattern is valid"));

static ASSERTED_DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^ ]*# ([^ ]+) .*").expect("asserted domain pattern is valid")
});

/// Whether the declaration carries a comment.
#[must_use]
pub fn has_comment(decl: &Declaration) -> bool {
    decl.comment().is_some()
}

/// Whether the declaration's comment contains the required phrasing.
#[must_use]
pub fn comment_matches_format(decl: &Declaration) -> bool {
    decl.comment().is_some_and(|comment| is_well_formed(comment.text()))
}

/// The domain the declaration's comment claims was verified.
///
/// This is best effort and works on malformed comments too: when the comment
/// does not look like `# <token> ...` at all, its full text is returned.
#[must_use]
pub fn asserted_domain(decl: &Declaration) -> Cow<'_, str> {
    decl.comment()
        .map_or(Cow::Borrowed(""), |comment| asserted_token(comment.text()))
}

/// Whether the asserted domain occurs in the stanza's url.
///
/// This is substring containment, so `example.com` corresponds to
/// `downloads.example.com/file.dmg`.
#[must_use]
pub fn comment_matches_full_reference(decl: &Declaration) -> bool {
    has_comment(decl)
        && full_reference_of(decl.reference()).contains(asserted_domain(decl).as_ref())
}

fn is_well_formed(text: &str) -> bool {
    COMMENT_FORMAT_PATTERN.is_match(text)
}

fn asserted_token(text: &str) -> Cow<'_, str> {
    ASSERTED_DOMAIN_PATTERN.replacen(text, 1, "$1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, DeclarationKind, Position, Reference, SourceRange};

    const VERIFIED: &str =
        "# other.org was verified as official when first introduced to the cask";

    fn download(url: &str, comment: Option<&str>) -> Declaration {
        let range = SourceRange::new(Position::new(4, 3), Position::new(4, 40));
        let comments = comment
            .map(|text| {
                vec![Comment::new(
                    text,
                    SourceRange::new(Position::new(3, 3), Position::new(3, 3 + text.len())),
                )]
            })
            .unwrap_or_default();
        Declaration::new(
            DeclarationKind::Download,
            Reference::Literal(url.to_string()),
            range,
            comments,
        )
    }

    #[test]
    fn no_comment() {
        let decl = download("https://files.other.org/x.dmg", None);
        assert!(!has_comment(&decl));
        assert!(!comment_matches_format(&decl));
        assert!(!comment_matches_full_reference(&decl));
        assert_eq!(asserted_domain(&decl), "");
    }

    #[test]
    fn well_formed_comment() {
        let decl = download("https://files.other.org/x.dmg", Some(VERIFIED));
        assert!(has_comment(&decl));
        assert!(comment_matches_format(&decl));
        assert_eq!(asserted_domain(&decl), "other.org");
        assert!(comment_matches_full_reference(&decl));
    }

    #[test]
    fn format_is_searched_not_anchored() {
        let text = "# NOTE: # cdn.other.org was verified as official when first introduced to the cask!";
        assert!(is_well_formed(text));
    }

    #[test]
    fn wrong_phrasing_is_not_well_formed() {
        assert!(!is_well_formed("# checked manually"));
        assert!(!is_well_formed(
            "# other.org was verified as official when first added to the cask"
        ));
        assert!(!is_well_formed(
            "#other.org was verified as official when first introduced to the cask"
        ));
    }

    #[test]
    fn asserted_token_is_first_word_after_hash() {
        assert_eq!(asserted_token("# checked manually"), "checked");
        assert_eq!(
            asserted_token("# github.com/foo/bar/ was verified as official when first introduced to the cask"),
            "github.com/foo/bar/"
        );
    }

    #[test]
    fn asserted_token_falls_back_to_raw_text() {
        assert_eq!(asserted_token("# other.org"), "# other.org");
        assert_eq!(asserted_token("#nospace here"), "#nospace here");
    }

    #[test]
    fn correspondence_is_substring_containment() {
        let decl = download(
            "https://github.com/foo/bar/releases/download/v1/Bar.dmg",
            Some("# github.com/foo/bar/ was verified as official when first introduced to the cask"),
        );
        assert!(comment_matches_full_reference(&decl));

        let decl = download(
            "https://github.com/baz/bar/releases/download/v1/Bar.dmg",
            Some("# github.com/foo/bar/ was verified as official when first introduced to the cask"),
        );
        assert!(!comment_matches_full_reference(&decl));
    }

    #[test]
    fn correspondence_ignores_scheme_and_www() {
        let decl = download(
            "https://www.other.org/x.dmg",
            Some("# www.other.org was verified as official when first introduced to the cask"),
        );
        assert!(!comment_matches_full_reference(&decl));
    }

    #[test]
    fn last_comment_is_used() {
        let decl = Declaration::new(
            DeclarationKind::Download,
            Reference::Literal("https://files.other.org/x.dmg".to_string()),
            SourceRange::new(Position::new(4, 3), Position::new(4, 40)),
            vec![
                Comment::new(
                    "# unrelated note",
                    SourceRange::new(Position::new(2, 3), Position::new(2, 19)),
                ),
                Comment::new(
                    VERIFIED,
                    SourceRange::new(Position::new(3, 3), Position::new(3, 73)),
                ),
            ],
        );
        assert!(comment_matches_format(&decl));
        assert_eq!(asserted_domain(&decl), "other.org");
    }
}
