use std::process::ExitCode;

use attendance_server::config::{Config, PORT_RANGE};
use attendance_server::init_logging;
use attendance_server::server::{self, ServerError};
use clap::Parser;
use dotenv::dotenv;
use log::{error, info};

/// Serve the face-recognition app and persist its attendance records.
#[derive(Debug, Parser)]
#[command(name = "server", version)]
struct Cli {
    /// Port to listen on (1024-65535, default 8000)
    #[arg(value_parser = clap::value_parser!(u16).range(
        i64::from(*PORT_RANGE.start())..=i64::from(*PORT_RANGE.end())
    ))]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    dotenv().ok();

    let cli = Cli::parse();
    init_logging();

    let mut config = Config::default();
    if let Some(port) = cli.port {
        config.port = port;
    }

    info!("🎯 Face Recognition Attendance Server starting...");

    match server::run(config).await {
        Ok(()) => {
            info!("👋 Thanks for using Face Recognition App!");
            ExitCode::SUCCESS
        }
        Err(ServerError::MissingAssets(missing)) => {
            error!("❌ Missing required files/directories:");
            for entry in missing {
                error!("   - {entry}");
            }
            error!("❌ Please ensure all required files are present before running the app.");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("❌ {e}");
            error!("❌ Failed to start the server");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_is_optional() {
        let cli = Cli::try_parse_from(["server"]).unwrap();
        assert_eq!(cli.port, None);
    }

    #[test]
    fn accepts_range_bounds() {
        assert_eq!(Cli::try_parse_from(["server", "1024"]).unwrap().port, Some(1024));
        assert_eq!(Cli::try_parse_from(["server", "65535"]).unwrap().port, Some(65535));
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        for arg in ["80", "1023", "65536", "-1", "eight"] {
            assert!(Cli::try_parse_from(["server", arg]).is_err(), "{arg} accepted");
        }
    }

    #[test]
    fn rejects_extra_arguments() {
        assert!(Cli::try_parse_from(["server", "8000", "9000"]).is_err());
    }
}
