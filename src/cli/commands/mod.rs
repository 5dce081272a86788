//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod generate;
pub mod inspect;
pub mod verify;
pub mod version;

use std::path::Path;

use crate::cli::args::{Cli, Commands};
use crate::error::FixCorpusError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), FixCorpusError> {
    match cli.command {
        Commands::Generate(args) => generate::run(&args, cli.quiet).map(|_| ()),
        Commands::Inspect(args) => inspect::run(&args),
        Commands::Verify(args) => verify::run(&args, cli.quiet).await.map(|_| ()),
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Writes the Prometheus snapshot to `path` when one was requested.
pub(crate) fn write_metrics_snapshot(path: Option<&Path>) -> Result<(), FixCorpusError> {
    if let Some(path) = path
        && let Some(text) = crate::observability::render_metrics()
    {
        std::fs::write(path, text)?;
        tracing::info!(path = %path.display(), "metrics snapshot written");
    }
    Ok(())
}
