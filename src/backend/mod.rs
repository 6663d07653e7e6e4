//! Back-end collaborators
//!
//! The site never implements storage itself; it talks to three collaborators
//! through the traits below. Every failure crosses the boundary as a
//! [`CollaboratorError`] carrying a code and a message.

pub mod local;

pub use local::LocalBackend;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::forms::{ContactMessage, FileAttachment};

/// Result of a storage upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    pub original_name: String,
    pub file_type: String,
}

/// Project record sent to the data collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
}

/// Project record as listed by the data collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProject {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait ContactBackend: Send + Sync {
    async fn submit_contact(&self, message: &ContactMessage) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Store a project; returns its id
    async fn submit_project(&self, project: &NewProject) -> Result<String, CollaboratorError>;

    /// All projects, newest first
    async fn list_projects(&self) -> Result<Vec<StoredProject>, CollaboratorError>;
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload_file(&self, file: &FileAttachment, folder: &str) -> Result<UploadedFile, CollaboratorError>;
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    // Two decimals, trailing zeros dropped by f64's Display
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_file_size(5_500_000), "5.25 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }

    #[test]
    fn test_wire_names_match_collaborator_contract() {
        let uploaded = UploadedFile {
            download_url: "file:///tmp/a.png".to_string(),
            original_name: "a.png".to_string(),
            file_type: "image/png".to_string(),
        };
        let json = serde_json::to_value(&uploaded).unwrap();
        assert_eq!(json["downloadURL"], "file:///tmp/a.png");
        assert_eq!(json["originalName"], "a.png");
        assert_eq!(json["fileType"], "image/png");

        let project = NewProject {
            title: "T".to_string(),
            description: "D".to_string(),
            file_url: None,
            file_name: None,
            file_type: None,
        };
        let json = serde_json::to_value(&project).unwrap();
        assert!(json["fileUrl"].is_null());
    }
}
