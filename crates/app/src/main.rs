use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Extract billing fields from an electricity bill image and flag unusual consumption.
#[derive(Debug, Parser)]
#[command(name = "wattcheck", version)]
struct Cli {
    /// Photo or scan of the bill (PNG, JPEG, ...).
    image: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only the JSON report.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let explicit = std::env::var_os(commands::CONFIG_ENV).is_some();
    let config = commands::load_config(commands::config_path().as_deref(), explicit)?;

    let json = commands::scan_bill(&cli.image, &config)?;
    println!("{json}");
    Ok(())
}
