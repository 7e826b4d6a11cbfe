//! Fetches the SSD MobileNet v1 weights the browser app can optionally load.

use std::path::{Path, PathBuf};

use log::{error, info};
use thiserror::Error;

pub const WEIGHTS_BASE_URL: &str =
    "https://github.com/justadudewhohacks/face-api.js/raw/master/weights";
pub const SSD_MOBILENET_DIR: &str = "models/ssd_mobilenetv1";

pub const SSD_MOBILENET_FILES: [&str; 3] = [
    "ssd_mobilenetv1_model-weights_manifest.json",
    "ssd_mobilenetv1_model-shard1",
    "ssd_mobilenetv1_model-shard2",
];

/// The model loads without shard2 on some builds of the weights.
pub const SSD_MOBILENET_REQUIRED: [&str; 2] = [
    "ssd_mobilenetv1_model-weights_manifest.json",
    "ssd_mobilenetv1_model-shard1",
];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub downloaded: usize,
    pub attempted: usize,
    /// All of [`SSD_MOBILENET_REQUIRED`] are present afterwards.
    pub complete: bool,
}

/// Download one file, returning the number of bytes written.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<usize, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let bytes = response.bytes().await?;
    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
    Ok(bytes.len())
}

/// Fetch every SSD MobileNet file from `base_url` into `base_dir/models/ssd_mobilenetv1`.
///
/// A failed file is reported and skipped; only failing to create the target
/// directory aborts the run.
pub async fn download_ssd_mobilenet(
    client: &reqwest::Client,
    base_url: &str,
    base_dir: &Path,
) -> Result<FetchReport, FetchError> {
    let model_dir = base_dir.join(SSD_MOBILENET_DIR);
    tokio::fs::create_dir_all(&model_dir)
        .await
        .map_err(|source| FetchError::Io {
            path: model_dir.clone(),
            source,
        })?;

    let mut downloaded = 0;
    for name in SSD_MOBILENET_FILES {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), name);
        info!("Downloading {name}...");
        match download_file(client, &url, &model_dir.join(name)).await {
            Ok(_) => {
                info!("✅ Downloaded {name}");
                downloaded += 1;
            }
            Err(e) => error!("❌ Failed to download {name}: {e}"),
        }
    }

    Ok(FetchReport {
        downloaded,
        attempted: SSD_MOBILENET_FILES.len(),
        complete: has_required_files(&model_dir),
    })
}

pub fn has_required_files(model_dir: &Path) -> bool {
    SSD_MOBILENET_REQUIRED
        .iter()
        .all(|name| model_dir.join(name).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Router;

    fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    async fn serve_weights(with_shard2: bool) -> String {
        let mut app = Router::new()
            .route(
                "/ssd_mobilenetv1_model-weights_manifest.json",
                get(|| async { r#"[{"paths":["shard1"]}]"# }),
            )
            .route("/ssd_mobilenetv1_model-shard1", get(|| async { "abc" }));
        if with_shard2 {
            app = app.route("/ssd_mobilenetv1_model-shard2", get(|| async { "def" }));
        }

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn downloads_all_files() {
        let base_url = serve_weights(true).await;
        let tmp = tempfile::tempdir().unwrap();

        let report = download_ssd_mobilenet(&client(), &base_url, tmp.path())
            .await
            .unwrap();

        assert_eq!(
            report,
            FetchReport {
                downloaded: 3,
                attempted: 3,
                complete: true
            }
        );
        let model_dir = tmp.path().join(SSD_MOBILENET_DIR);
        let shard = std::fs::read(model_dir.join("ssd_mobilenetv1_model-shard1")).unwrap();
        assert_eq!(shard, b"abc");
    }

    #[tokio::test]
    async fn missing_optional_shard_still_completes() {
        let base_url = serve_weights(false).await;
        let tmp = tempfile::tempdir().unwrap();

        let report = download_ssd_mobilenet(&client(), &base_url, tmp.path())
            .await
            .unwrap();

        assert_eq!(report.downloaded, 2);
        assert!(report.complete);
    }

    #[tokio::test]
    async fn http_errors_carry_the_status() {
        let base_url = serve_weights(false).await;
        let tmp = tempfile::tempdir().unwrap();
        let url = format!("{base_url}/nope");

        let err = download_file(&client(), &url, &tmp.path().join("nope"))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert!(!tmp.path().join("nope").exists());
    }

    #[test]
    fn required_files_check() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!has_required_files(tmp.path()));
        std::fs::write(tmp.path().join(SSD_MOBILENET_REQUIRED[0]), "{}").unwrap();
        assert!(!has_required_files(tmp.path()));
        std::fs::write(tmp.path().join(SSD_MOBILENET_REQUIRED[1]), "x").unwrap();
        assert!(has_required_files(tmp.path()));
    }
}
