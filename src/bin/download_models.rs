use std::path::PathBuf;
use std::process::ExitCode;

use attendance_server::init_logging;
use attendance_server::weights::{download_ssd_mobilenet, WEIGHTS_BASE_URL};
use clap::Parser;
use log::{error, info, warn};

/// Download the SSD MobileNet v1 face detector weights.
#[derive(Debug, Parser)]
#[command(name = "download-models", version)]
struct Cli {
    /// App directory; files land in <DIR>/models/ssd_mobilenetv1
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Where the weight files are fetched from
    #[arg(long, default_value = WEIGHTS_BASE_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    info!("🚀 Downloading SSD MobileNet v1 models...");
    let client = reqwest::Client::new();
    let report = match download_ssd_mobilenet(&client, &cli.base_url, &cli.dir).await {
        Ok(report) => report,
        Err(e) => {
            error!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("📊 Downloaded {}/{} files", report.downloaded, report.attempted);
    if report.complete {
        info!("✅ SSD MobileNet v1 models downloaded successfully!");
        info!("🎯 You can now use SSD MobileNet v1 in your face recognition app!");
        ExitCode::SUCCESS
    } else {
        error!("❌ Some required files are missing");
        warn!("⚠️ Download failed. You can still use TinyFaceDetector models.");
        ExitCode::FAILURE
    }
}
