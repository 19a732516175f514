//! Shipit - release publishing tool for Chunky

mod cli;
mod exit_codes;

use clap::Parser;
use console::{style, Term};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cli::Cli;

fn main() {
    let cli = Cli::parse();
    let guard = init_tracing(cli.verbose, cli.quiet);

    let code = match cli.execute() {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            tracing::error!("release aborted: {:#}", e);
            report_failure(&e);
            exit_codes::for_error(&e)
        }
    };

    drop(guard);
    std::process::exit(code);
}

/// Print the error chain and keep the window open when attached to a terminal
fn report_failure(error: &anyhow::Error) {
    eprintln!("{}", style("Unexpected error:").red().bold());
    for cause in error.chain() {
        eprintln!("  {}", cause);
    }
    eprintln!("{}", style("Release aborted.").red());

    let term = Term::stdout();
    if term.is_term() {
        println!("Press Enter to exit");
        let _ = term.read_line();
    }
}

/// Set up tracing with two layers:
/// - Console: controlled by RUST_LOG (default: warn, info with -v, error with -q)
/// - File: always debug-level JSON to ~/.shipit/logs/
fn init_tracing(verbose: bool, quiet: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_level = if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Some(log_dir) = log_directory() {
        let file_appender = tracing_appender::rolling::daily(&log_dir, "shipit.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_filter(console_filter),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_filter(EnvFilter::new("debug")),
            )
            .init();

        return Some(guard);
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(console_filter),
        )
        .init();

    None
}

/// Returns the log directory path, creating it if needed.
fn log_directory() -> Option<std::path::PathBuf> {
    let log_dir = dirs::home_dir()?.join(".shipit").join("logs");
    std::fs::create_dir_all(&log_dir).ok()?;
    Some(log_dir)
}
