use std::io::ErrorKind;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use axum_server::Handle;
use log::{error, info, warn};
use thiserror::Error;
use tokio::signal;
use tokio::task::JoinHandle;

use crate::config::{Config, ConfigError};
use crate::routes::create_routes;
use crate::tls::{self, TlsError};
use crate::types::COLLECTIONS;

/// Files and directories the browser app cannot run without.
pub const REQUIRED_ASSETS: [&str; 6] = [
    "index.html",
    "face-api.min.js",
    "models/tiny_face_detector",
    "models/face_recognition",
    "models/face_landmark_68",
    "Faces",
];

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("missing required files/directories: {}", .0.join(", "))]
    MissingAssets(Vec<String>),
    #[error(transparent)]
    Tls(#[from] TlsError),
    #[error("port {port} is in use and none of the next {window} ports are free")]
    PortsExhausted { port: u16, window: u16 },
    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Every entry of `assets` missing under `base_dir`, reported together.
pub fn check_requirements(base_dir: &Path, assets: &[&str]) -> Result<(), ServerError> {
    let missing: Vec<String> = assets
        .iter()
        .filter(|asset| !base_dir.join(asset).exists())
        .map(|asset| asset.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServerError::MissingAssets(missing))
    }
}

/// Bind `host:port`; if the port is taken, try the next `scan_window` ports.
pub fn bind_listener(host: &str, port: u16, scan_window: u16) -> Result<TcpListener, ServerError> {
    let listener = match TcpListener::bind((host, port)) {
        Ok(listener) => listener,
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            warn!("❌ Port {port} is already in use. Trying to find another port...");
            scan_forward(host, port, scan_window)?
        }
        Err(source) => {
            return Err(ServerError::Bind {
                addr: format!("{host}:{port}"),
                source,
            })
        }
    };

    listener
        .set_nonblocking(true)
        .map_err(|source| ServerError::Bind {
            addr: format!("{host}:{port}"),
            source,
        })?;
    Ok(listener)
}

fn scan_forward(host: &str, port: u16, scan_window: u16) -> Result<TcpListener, ServerError> {
    (1..=scan_window)
        .filter_map(|offset| port.checked_add(offset))
        .find_map(|candidate| {
            let listener = TcpListener::bind((host, candidate)).ok()?;
            info!("✅ Using port {candidate} instead");
            Some(listener)
        })
        .ok_or(ServerError::PortsExhausted {
            port,
            window: scan_window,
        })
}

/// Open `url` in the default browser after `delay`, without holding up the server.
pub fn spawn_browser(url: String, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        info!("🌐 Opening {url} in your browser...");
        let target = url.clone();
        match tokio::task::spawn_blocking(move || open::that(target)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("⚠️ Could not open a browser ({e}); visit {url} manually"),
            Err(e) => warn!("⚠️ Browser task failed: {e}"),
        }
    })
}

/// Run the server until Ctrl+C. A signal-driven stop is a success.
pub async fn run(config: Config) -> Result<(), ServerError> {
    config.validate()?;

    if config.check_requirements {
        check_requirements(&config.base_dir, &REQUIRED_ASSETS)?;
        info!("✅ All required files found");
    }

    let tls_config = if config.tls_enabled {
        Some(tls::load_rustls_config(&config.cert_path, &config.key_path).await?)
    } else {
        None
    };

    let listener = bind_listener(&config.host, config.port, config.port_scan_window)?;
    let port = listener
        .local_addr()
        .map_err(ServerError::Serve)?
        .port();

    let app = create_routes(&config);
    let url = format!("{}://localhost:{}", config.scheme(), port);
    print_banner(&config, &url);

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    if config.open_browser {
        spawn_browser(url, config.browser_delay);
    }

    let served = match tls_config {
        Some(tls_config) => {
            axum_server::tls_rustls::from_tcp_rustls(listener, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
        None => {
            axum_server::from_tcp(listener)
                .handle(handle)
                .serve(app.into_make_service())
                .await
        }
    };
    served.map_err(ServerError::Serve)?;

    info!("🛑 Server stopped by user");
    Ok(())
}

fn print_banner(config: &Config, url: &str) {
    info!("🚀 Face Recognition Attendance Server");
    info!("📁 Serving from: {}", config.base_dir.display());
    if config.tls_enabled {
        info!("🔒 HTTPS server running at: {url}");
    } else {
        info!("🌐 Server running at: {url}");
    }
    for collection in COLLECTIONS.iter() {
        info!(
            "{} POST {} → Record/{}",
            collection.emoji, collection.path, collection.file_name
        );
    }
    info!(
        "🗂️ Timestamped backups in Record/BackUP (newest {} kept per collection)",
        config.backup_retention
    );
    info!("🔄 Press Ctrl+C to stop the server");
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
