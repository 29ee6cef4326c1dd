use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context;
use caskaudit::{
    Diagnostic, Directory, FileReport, PublicSuffixList, Reporter, report::forward,
};
use clap::Parser;
use tracing::instrument;

use super::terminal::Tone;

#[derive(Debug, Default, Parser)]
#[command(about = "Audit cask urls against their homepage")]
pub struct Check {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Summary,
}

impl Check {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let directory = Directory::new(root);
        let context = format!("failed to load casks from {}", directory.root().display());
        let directory = directory.load_all().context(context)?;

        let reports = directory.audit(&PublicSuffixList);

        let total = match self.output {
            OutputFormat::Table => self.output_table(&reports),
            OutputFormat::Json => Self::output_json(&reports)?,
            OutputFormat::Summary => Self::output_summary(&reports),
        };

        if total > 0 {
            std::process::exit(2);
        }

        Ok(())
    }

    fn output_table(&self, reports: &[FileReport]) -> usize {
        let mut table = Table { quiet: self.quiet };
        let total = forward(reports, &mut table);

        if self.quiet {
            return total;
        }

        if total == 0 {
            let line = format!("All {} casks are consistent (0 issues)", reports.len());
            println!("{}", Tone::Clean.paint(&line));
        } else {
            let files = reports.iter().filter(|report| !report.is_clean()).count();
            let line = format!(
                "Summary: {total} issues found in {files} of {} casks",
                reports.len()
            );
            println!("\n{}", Tone::Summary.paint(&line));
        }
        total
    }

    fn output_json(reports: &[FileReport]) -> anyhow::Result<usize> {
        use serde_json::json;

        let mut totals = Totals::default();
        let total = forward(reports, &mut totals);

        let files: Vec<_> = reports.iter().filter(|report| !report.is_clean()).collect();

        let output = json!({
            "status": if total == 0 { "consistent" } else { "issues_found" },
            "files": files,
            "summary": {
                "casks": reports.len(),
                "casks_with_issues": files.len(),
                "total_issues": total,
                "by_kind": totals.by_kind,
            }
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(total)
    }

    fn output_summary(reports: &[FileReport]) -> usize {
        let total = forward(reports, &mut Totals::default());
        println!("issues={total}");
        total
    }
}

/// Prints one line per diagnostic, coloured by kind.
struct Table {
    quiet: bool,
}

impl Reporter for Table {
    fn report(&mut self, path: &Path, diagnostic: &Diagnostic) {
        if self.quiet {
            return;
        }
        let location = format!("{}:{}", path.display(), diagnostic.location().start);
        let kind = diagnostic.kind();
        println!(
            "{}: {}: {}",
            Tone::Muted.paint(&location),
            Tone::from(kind).paint(kind.name()),
            diagnostic.message()
        );
    }
}

/// Counts diagnostics by kind.
#[derive(Debug, Default)]
struct Totals {
    by_kind: BTreeMap<&'static str, usize>,
}

impl Reporter for Totals {
    fn report(&mut self, _path: &Path, diagnostic: &Diagnostic) {
        *self.by_kind.entry(diagnostic.kind().name()).or_default() += 1;
    }
}
