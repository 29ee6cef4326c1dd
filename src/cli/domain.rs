use caskaudit::{
    PublicSuffixList,
    domain::{Reference, domain_of, full_reference_of, hostname_of},
};
use clap::Parser;

use super::terminal::Tone;

#[derive(Debug, Parser)]
#[command(about = "Show how references are normalized before they are compared")]
pub struct Domain {
    /// Urls, or quoted Ruby expressions containing a url
    #[arg(required = true)]
    references: Vec<String>,
}

impl Domain {
    pub fn run(self) {
        for raw in self.references {
            let reference = parse_reference(raw);
            let domain = domain_of(&reference, &PublicSuffixList);

            println!("{}", Tone::Reference.paint(reference.as_str()));
            println!("  full reference: {}", full_reference_of(&reference));
            println!("  hostname:       {}", hostname_of(&reference));
            if domain.is_empty() {
                println!("  domain:         {}", Tone::Muted.paint("(none)"));
            } else {
                println!("  domain:         {domain}");
            }
        }
    }
}

/// Anything that contains a quote is treated as source code rather than a
/// plain url.
fn parse_reference(raw: String) -> Reference {
    if raw.contains('"') {
        Reference::Expression(raw)
    } else {
        Reference::Literal(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_urls_are_literals() {
        assert_eq!(
            parse_reference("https://example.com".to_string()),
            Reference::Literal("https://example.com".to_string())
        );
    }

    #[test]
    fn quoted_source_is_an_expression() {
        let raw = r#""https://example.com/#{version}.dmg""#.to_string();
        assert_eq!(parse_reference(raw.clone()), Reference::Expression(raw));
    }
}
