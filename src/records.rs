//! Persistence for the record collections posted by the browser client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::{header::CONTENT_LENGTH, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Local, NaiveDateTime};
use log::{error, info};
use serde_json::Value;
use thiserror::Error;
use tokio::fs;

use crate::backup;
use crate::config::Config;
use crate::types::{Collection, SaveResponse};

pub const BACKUP_DIR_NAME: &str = "BackUP";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("missing Content-Length header")]
    MissingContentLength,
    #[error("could not read request body: {0}")]
    Body(String),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a successful save.
#[derive(Debug, Clone)]
pub struct SaveReceipt {
    pub count: usize,
    pub timestamp: String,
    pub target: PathBuf,
    pub backup: PathBuf,
}

/// Writes collections under `Record/` and their snapshots under `Record/BackUP/`.
#[derive(Debug, Clone)]
pub struct RecordStore {
    records_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl RecordStore {
    pub fn new(records_dir: impl Into<PathBuf>, retention: usize) -> Self {
        let records_dir = records_dir.into();
        Self {
            backups_dir: records_dir.join(BACKUP_DIR_NAME),
            records_dir,
            retention,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.records_dir(), config.backup_retention)
    }

    pub fn records_dir(&self) -> &Path {
        &self.records_dir
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    pub fn collection_path(&self, collection: &Collection) -> PathBuf {
        self.records_dir.join(collection.file_name)
    }

    pub async fn save(
        &self,
        collection: &Collection,
        body: &[u8],
    ) -> Result<SaveReceipt, SaveError> {
        self.save_at(collection, body, Local::now().naive_local())
            .await
    }

    /// Overwrite `collection` with `body` and snapshot it as of `now`.
    ///
    /// Nothing touches the filesystem until the body has parsed.
    pub async fn save_at(
        &self,
        collection: &Collection,
        body: &[u8],
        now: NaiveDateTime,
    ) -> Result<SaveReceipt, SaveError> {
        let records: Value = serde_json::from_slice(body)?;
        let count = record_count(&records);
        let pretty = serde_json::to_string_pretty(&records)?;

        fs::create_dir_all(&self.backups_dir)
            .await
            .map_err(|source| SaveError::Io {
                path: self.backups_dir.clone(),
                source,
            })?;

        let target = self.collection_path(collection);
        write(&target, &pretty).await?;

        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let backup_path = self.backups_dir.join(collection.backup_file_name(&timestamp));
        write(&backup_path, &pretty).await?;

        backup::sweep(&self.backups_dir, &collection.backup_pattern(), self.retention).await;

        Ok(SaveReceipt {
            count,
            timestamp,
            target,
            backup: backup_path,
        })
    }
}

async fn write(path: &Path, contents: &str) -> Result<(), SaveError> {
    fs::write(path, contents)
        .await
        .map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Array elements, object keys, or string characters. A bare number or
/// boolean counts as one record and `null` as none.
fn record_count(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(fields) => fields.len(),
        Value::String(text) => text.chars().count(),
        Value::Null => 0,
        Value::Bool(_) | Value::Number(_) => 1,
    }
}

/// POST handler shared by every entry in [`crate::types::COLLECTIONS`].
pub async fn save_collection(
    store: Arc<RecordStore>,
    collection: &'static Collection,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match persist(&store, collection, &headers, body).await {
        Ok(receipt) => {
            info!(
                "{} Saved {} {} to {} and {}",
                collection.emoji,
                receipt.count,
                collection.label,
                receipt.target.display(),
                receipt.backup.display()
            );
            let response = SaveResponse::Success {
                message: format!("{} {} saved", receipt.count, collection.label),
                timestamp: receipt.timestamp,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("❌ Error saving {}: {}", collection.label, e);
            let response = SaveResponse::Error {
                message: e.to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

async fn persist(
    store: &RecordStore,
    collection: &Collection,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<SaveReceipt, SaveError> {
    if !headers.contains_key(CONTENT_LENGTH) {
        return Err(SaveError::MissingContentLength);
    }
    let body = body.map_err(|e| SaveError::Body(e.body_text()))?;
    store.save(collection, &body).await
}
