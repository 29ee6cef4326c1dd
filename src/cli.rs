use std::path::PathBuf;

mod check;
mod domain;
mod terminal;

use check::Check;
use clap::ArgAction;
use domain::Domain;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The cask file, or the directory of casks, to audit
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Check(Check::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Audit every cask's urls against its homepage (default)
    ///
    /// Exits with status 2 when anything is reported.
    Check(Check),

    /// Show how references are normalized before they are compared
    Domain(Domain),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Check(command) => command.run(root)?,
            Self::Domain(command) => command.run(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn check_is_the_default_command() {
        let cli = Cli::try_parse_from(["cask-audit", "-vv", "--root", "Casks"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.root, PathBuf::from("Casks"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn global_arguments_after_subcommand() {
        let cli = Cli::try_parse_from(["cask-audit", "check", "--output", "json", "-r", "x.rb"])
            .unwrap();
        assert_eq!(cli.root, PathBuf::from("x.rb"));
        assert!(matches!(cli.command, Some(Command::Check(_))));
    }

    #[test]
    fn domain_requires_a_reference() {
        assert!(Cli::try_parse_from(["cask-audit", "domain"]).is_err());
        let cli = Cli::try_parse_from(["cask-audit", "domain", "https://example.com"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Domain(_))));
    }
}
