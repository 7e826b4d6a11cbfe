pub mod backup;
pub mod config;
pub mod records;
pub mod routes;
pub mod server;
pub mod static_files;
pub mod tls;
pub mod types;
pub mod weights;

/// Console logging for the binaries; `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();
}
