// Membership integrity audit for FreeTalk clubs.
//
// Reads every club, reports duplicate memberships, and prints an aggregate
// summary. Read-only; repairs are done by the separate fix-duplicate-clubs
// tool. Invoked with no arguments.

use std::io;
use std::process::ExitCode;

use audit_core::{driver, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr; the report owns stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,audit_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("audit failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout();
    match driver::execute(&config, &mut stdout).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            let err = anyhow::Error::new(err);
            eprintln!("audit failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
