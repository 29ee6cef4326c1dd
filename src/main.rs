//! `cask-audit` checks that the download urls of Homebrew casks match their
//! homepage, or carry a comment recording that the download domain was
//! verified as official.

use clap::Parser;

mod cli;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    Cli::parse().run()
}
