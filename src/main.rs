use clap::Parser;
use slate::cli::commands::Cli;
use slate::cli::handlers;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `SLATE_LOG` takes an env-filter directive (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("SLATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
