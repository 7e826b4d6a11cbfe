use serde::{Deserialize, Serialize};

/// One persisted record collection and the endpoint that overwrites it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub path: &'static str,
    pub file_name: &'static str,
    /// Backups are named `<backup_stem>_<YYYYMMDD_HHMMSS>.json`.
    pub backup_stem: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
}

pub static COLLECTIONS: [Collection; 4] = [
    Collection {
        path: "/save-records",
        file_name: "Local.json",
        backup_stem: "backup",
        label: "records",
        emoji: "💾",
    },
    Collection {
        path: "/save-punch-in",
        file_name: "Punch_in.json",
        backup_stem: "punch_in_backup",
        label: "punch-in records",
        emoji: "🎯",
    },
    Collection {
        path: "/save-punch-out",
        file_name: "Punch_out.json",
        backup_stem: "punch_out_backup",
        label: "punch-out records",
        emoji: "🔴",
    },
    Collection {
        path: "/save-currently-online",
        file_name: "Currently_online.json",
        backup_stem: "currently_online_backup",
        label: "currently online records",
        emoji: "👥",
    },
];

impl Collection {
    pub fn by_path(path: &str) -> Option<&'static Collection> {
        COLLECTIONS.iter().find(|c| c.path == path)
    }

    pub fn backup_file_name(&self, timestamp: &str) -> String {
        format!("{}_{}.json", self.backup_stem, timestamp)
    }

    /// Glob-style pattern matching every backup of this collection.
    pub fn backup_pattern(&self) -> String {
        format!("{}_*.json", self.backup_stem)
    }
}

/// Body returned by every save endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SaveResponse {
    Success { message: String, timestamp: String },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        assert_eq!(
            Collection::by_path("/save-punch-out").map(|c| c.file_name),
            Some("Punch_out.json")
        );
        assert!(Collection::by_path("/Save-Records").is_none());
        assert!(Collection::by_path("/save-records/").is_none());
    }

    #[test]
    fn backup_names_follow_stem() {
        let records = Collection::by_path("/save-records").unwrap();
        assert_eq!(
            records.backup_file_name("20240101_080000"),
            "backup_20240101_080000.json"
        );
        let online = Collection::by_path("/save-currently-online").unwrap();
        assert_eq!(online.backup_pattern(), "currently_online_backup_*.json");
    }

    #[test]
    fn envelope_is_tagged_by_status() {
        let ok = SaveResponse::Success {
            message: "3 records saved".into(),
            timestamp: "20240101_080000".into(),
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": "success", "message": "3 records saved", "timestamp": "20240101_080000"})
        );

        let err = SaveResponse::Error {
            message: "boom".into(),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"status": "error", "message": "boom"})
        );
    }
}
