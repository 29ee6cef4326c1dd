//! Forwarding diagnostics to a reporting surface.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::Diagnostic;

/// The diagnostics produced by auditing one cask file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// The cask file.
    pub path: PathBuf,
    /// Diagnostics in source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    /// Whether auditing the file found nothing.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// A surface that diagnostics are reported to.
pub trait Reporter {
    /// Receives one diagnostic produced for the file at `path`.
    fn report(&mut self, path: &Path, diagnostic: &Diagnostic);
}

/// Collects diagnostics in memory.
impl Reporter for Vec<(PathBuf, Diagnostic)> {
    fn report(&mut self, path: &Path, diagnostic: &Diagnostic) {
        self.push((path.to_path_buf(), diagnostic.clone()));
    }
}

impl<R> Reporter for &mut R
where
    R: Reporter + ?Sized,
{
    fn report(&mut self, path: &Path, diagnostic: &Diagnostic) {
        (**self).report(path, diagnostic);
    }
}

/// Sends every diagnostic in `reports` to `reporter`, in order.
///
/// Returns the number of diagnostics forwarded.
pub fn forward<'a, I, R>(reports: I, reporter: &mut R) -> usize
where
    I: IntoIterator<Item = &'a FileReport>,
    R: Reporter + ?Sized,
{
    let mut count = 0;
    for report in reports {
        for diagnostic in &report.diagnostics {
            reporter.report(&report.path, diagnostic);
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Comment, Declaration, DeclarationKind, Document, Position, PublicSuffixList, Reference,
        SourceRange, audit,
    };

    const fn range(line: usize) -> SourceRange {
        SourceRange::new(Position::new(line, 3), Position::new(line, 40))
    }

    fn report(path: &str, downloads: &[&str]) -> FileReport {
        let mut declarations = vec![Declaration::new(
            DeclarationKind::Homepage,
            Reference::Literal("https://example.com".to_string()),
            range(1),
            Vec::<Comment>::new(),
        )];
        for (index, url) in downloads.iter().enumerate() {
            declarations.push(Declaration::new(
                DeclarationKind::Download,
                Reference::Literal((*url).to_string()),
                range(index + 2),
                Vec::new(),
            ));
        }
        let document = Document::new(None, declarations);
        FileReport {
            path: PathBuf::from(path),
            diagnostics: audit(&document, &PublicSuffixList),
        }
    }

    #[test]
    fn forwards_in_order() {
        let reports = vec![
            report("a.rb", &["https://other.org/a.dmg", "https://third.net/a.dmg"]),
            report("b.rb", &["https://example.com/b.dmg"]),
            report("c.rb", &["https://fourth.io/c.dmg"]),
        ];

        let mut collected: Vec<(PathBuf, Diagnostic)> = Vec::new();
        let count = forward(&reports, &mut collected);

        assert_eq!(count, 3);
        let paths: Vec<_> = collected
            .iter()
            .map(|(path, diagnostic)| (path.to_str().unwrap(), diagnostic.location().start.line))
            .collect();
        assert_eq!(paths, vec![("a.rb", 2), ("a.rb", 3), ("c.rb", 2)]);
        assert!(reports[1].is_clean());
    }

    #[test]
    fn forwards_through_mutable_reference() {
        let reports = vec![report("a.rb", &["https://other.org/a.dmg"])];
        let mut collected: Vec<(PathBuf, Diagnostic)> = Vec::new();
        let mut reporter = &mut collected;

        assert_eq!(forward(&reports, &mut reporter), 1);
        assert_eq!(collected.len(), 1);
    }
}
