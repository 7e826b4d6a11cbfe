//! Self-signed `localhost` credentials for the HTTPS mode.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use chrono::{Datelike, Days, Utc};
use rcgen::{date_time_ymd, CertificateParams, DistinguishedName, DnType, KeyPair};
use thiserror::Error;

pub const CERT_FILE: &str = "localhost.pem";
pub const KEY_FILE: &str = "localhost.key";
pub const VALIDITY_DAYS: u64 = 365;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("certificate generation failed: {0}")]
    Generate(#[from] rcgen::Error),
    #[error("validity window overflows the calendar")]
    Validity,
    #[error("missing TLS file {} (run generate-cert first)", .0.display())]
    Missing(PathBuf),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid certificate or key: {0}")]
    Load(#[source] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct CredentialPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Write `localhost.key` and `localhost.pem` into `dir`, valid from today for
/// [`VALIDITY_DAYS`] days.
pub fn generate_localhost_credentials(dir: &Path) -> Result<CredentialPaths, TlsError> {
    let today = Utc::now().date_naive();
    let expires = today
        .checked_add_days(Days::new(VALIDITY_DAYS))
        .ok_or(TlsError::Validity)?;

    let mut params = CertificateParams::new(vec!["localhost".to_string()])?;
    params.distinguished_name = localhost_subject();
    params.not_before = date_time_ymd(today.year(), today.month() as u8, today.day() as u8);
    params.not_after = date_time_ymd(expires.year(), expires.month() as u8, expires.day() as u8);

    let key_pair = KeyPair::generate()?;
    let cert = params.self_signed(&key_pair)?;

    let paths = CredentialPaths {
        cert: dir.join(CERT_FILE),
        key: dir.join(KEY_FILE),
    };
    write(&paths.key, key_pair.serialize_pem())?;
    write(&paths.cert, cert.pem())?;
    Ok(paths)
}

/// Read the PEM pair the HTTPS listener is wrapped with.
pub async fn load_rustls_config(cert: &Path, key: &Path) -> Result<RustlsConfig, TlsError> {
    for path in [cert, key] {
        if !path.is_file() {
            return Err(TlsError::Missing(path.to_path_buf()));
        }
    }
    RustlsConfig::from_pem_file(cert, key)
        .await
        .map_err(TlsError::Load)
}

fn localhost_subject() -> DistinguishedName {
    let mut subject = DistinguishedName::new();
    subject.push(DnType::CountryName, "IN");
    subject.push(DnType::StateOrProvinceName, "State");
    subject.push(DnType::LocalityName, "Localhost");
    subject.push(DnType::OrganizationName, "Localhost");
    subject.push(DnType::CommonName, "localhost");
    subject
}

fn write(path: &Path, contents: String) -> Result<(), TlsError> {
    std::fs::write(path, contents).map_err(|source| TlsError::Io {
        path: path.to_path_buf(),
        source,
    })
}
