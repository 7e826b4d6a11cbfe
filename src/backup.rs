//! Retention for timestamped backup snapshots.
//!
//! Backups are matched with a single-`*` file name pattern such as
//! `punch_in_backup_*.json`. Only the newest `keep` files (by modification
//! time) survive a sweep.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, info, warn};
use tokio::fs;

/// A file name pattern with exactly one `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPattern {
    prefix: String,
    suffix: String,
}

impl BackupPattern {
    pub fn new(pattern: &str) -> Self {
        match pattern.split_once('*') {
            Some((prefix, suffix)) => Self {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            },
            None => Self {
                prefix: pattern.to_string(),
                suffix: String::new(),
            },
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        file_name.len() >= self.prefix.len() + self.suffix.len()
            && file_name.starts_with(&self.prefix)
            && file_name.ends_with(&self.suffix)
    }
}

/// Delete all but the `keep` most recently modified files in `dir` matching
/// `pattern`. Returns the paths that were removed.
///
/// Failures are logged and skipped: a file that disappears between listing and
/// removal (another sweep got there first) is not an error.
pub async fn sweep(dir: &Path, pattern: &str, keep: usize) -> Vec<PathBuf> {
    let pattern = BackupPattern::new(pattern);
    let mut candidates = match list_matching(dir, &pattern).await {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!("⚠️ Could not list backups in {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    if candidates.len() <= keep {
        return Vec::new();
    }

    // Newest first; equal mtimes fall back to the (timestamped) name.
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let mut deleted = Vec::new();
    for (path, _) in candidates.into_iter().skip(keep) {
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("🗑️ Deleted old backup: {}", display_name(&path));
                deleted.push(path);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("backup {} already removed", path.display());
            }
            Err(e) => warn!("⚠️ Could not delete {}: {}", path.display(), e),
        }
    }
    deleted
}

async fn list_matching(
    dir: &Path,
    pattern: &BackupPattern,
) -> std::io::Result<Vec<(PathBuf, SystemTime)>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut matches = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !pattern.matches(name) {
            continue;
        }
        // Entries can vanish under a concurrent sweep.
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        matches.push((entry.path(), modified));
    }
    Ok(matches)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
