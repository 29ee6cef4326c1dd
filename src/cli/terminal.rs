//! Colour for terminal output

use caskaudit::DiagnosticKind;
use owo_colors::{OwoColorize, colors::css};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// How a piece of output is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Every cask is consistent.
    Clean,
    /// A download domain nobody has vouched for.
    Unverified,
    /// A comment that needs rewording.
    Malformed,
    /// A comment that can simply be deleted.
    Redundant,
    /// Totals and other summaries.
    Summary,
    /// Source locations and placeholders.
    Muted,
    /// References echoed back by the `domain` command.
    Reference,
}

impl From<DiagnosticKind> for Tone {
    fn from(kind: DiagnosticKind) -> Self {
        match kind {
            DiagnosticKind::Missing | DiagnosticKind::NoMatch => Self::Unverified,
            DiagnosticKind::WrongFormat => Self::Malformed,
            DiagnosticKind::Unnecessary => Self::Redundant,
        }
    }
}

impl Tone {
    /// Paints `text`, or returns it unchanged when colour is unsupported.
    pub fn paint(self, text: &str) -> String {
        if !supports_color() {
            return text.to_string();
        }
        match self {
            Self::Clean => text.fg::<css::Green>().to_string(),
            Self::Unverified => text.fg::<css::Red>().to_string(),
            Self::Malformed | Self::Summary => text.fg::<css::Orange>().to_string(),
            Self::Redundant => text.fg::<css::Gold>().to_string(),
            Self::Reference => text.fg::<css::LightBlue>().to_string(),
            Self::Muted => text.dimmed().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unverified_domains_share_a_tone() {
        assert_eq!(Tone::from(DiagnosticKind::Missing), Tone::Unverified);
        assert_eq!(Tone::from(DiagnosticKind::NoMatch), Tone::Unverified);
        assert_eq!(Tone::from(DiagnosticKind::WrongFormat), Tone::Malformed);
        assert_eq!(Tone::from(DiagnosticKind::Unnecessary), Tone::Redundant);
    }

    #[test]
    fn painted_text_keeps_its_content() {
        for tone in [Tone::Clean, Tone::Unverified, Tone::Muted] {
            assert!(tone.paint("no-match").contains("no-match"));
        }
    }
}
