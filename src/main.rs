//! `fixcorpus` - Dictionary-driven FIX test corpus synthesizer

use clap::Parser;

use fixcorpus::cli::args::Cli;
use fixcorpus::cli::commands;
use fixcorpus::error::ExitCode;
use fixcorpus::observability::{LogFormat, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(LogFormat::from(cli.log_format), cli.verbose, cli.color);
    }

    match commands::dispatch(cli).await {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
