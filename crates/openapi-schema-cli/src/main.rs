use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use unrelated_openapi_schema_cli::{Cli, render};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing();

    let output = render(&cli)?;
    println!("{output}");
    Ok(())
}

// stdout carries the JSON output; logs go to stderr.
fn setup_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
