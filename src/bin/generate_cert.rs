use std::path::PathBuf;

use attendance_server::init_logging;
use attendance_server::tls::{generate_localhost_credentials, VALIDITY_DAYS};
use clap::Parser;
use log::info;

/// Write a self-signed localhost certificate and key for the HTTPS mode.
#[derive(Debug, Parser)]
#[command(name = "generate-cert", version)]
struct Cli {
    /// Directory that receives localhost.pem and localhost.key
    #[arg(default_value = ".")]
    dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let paths = generate_localhost_credentials(&cli.dir)?;
    info!(
        "PEM certificate and key generated: {}, {} (valid {} days)",
        paths.cert.display(),
        paths.key.display(),
        VALIDITY_DAYS
    );
    Ok(())
}
