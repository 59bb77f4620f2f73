//! packforge CLI.
//!
//! ```sh
//! packforge --config packforge.json build
//! packforge diff      # manifest from local changes only
//! packforge commit    # accept the last diff's fingerprints
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use packforge_core::{Action, BuilderOptions, Outcome, PackageBuilder};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "packforge", version, about = "Salesforce package.xml manifest builder")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, default_value = "packforge.json")]
    config: PathBuf,

    /// Verbose logging (debug level unless RUST_LOG is set).
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    action: ActionCommand,
}

#[derive(Subcommand)]
enum ActionCommand {
    /// Build a manifest; uses the diff path when source_dir is configured.
    Build,
    /// Build a manifest from local changes only.
    Diff,
    /// Commit the fingerprints recorded by the last diff.
    Commit,
}

impl From<&ActionCommand> for Action {
    fn from(cmd: &ActionCommand) -> Self {
        match cmd {
            ActionCommand::Build => Action::Build,
            ActionCommand::Diff => Action::Diff,
            ActionCommand::Commit => Action::Commit,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let options = BuilderOptions::from_file(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let builder = PackageBuilder::new(options)?;
    let outcome = builder.run(Action::from(&cli.action)).await?;

    match outcome {
        Outcome::Written(path) => println!("Wrote {}", path.display()),
        Outcome::NothingToDo => println!("No changes detected - nothing to do"),
        Outcome::Committed(count) => println!("Committed {count} fingerprint(s)"),
    }

    Ok(())
}
