//! File-backed collaborators
//!
//! Layout under the data directory:
//! - `contacts.json`: every contact message, oldest first
//! - `projects.json`: every project, newest first
//! - `uploads/<folder>/<stamp>-<seq>_<name>`: attachment bytes

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ContactBackend, FileStorage, NewProject, ProjectStore, StoredProject, UploadedFile};
use crate::constants::storage::{CONTACTS_FILE, DEFAULT_PROJECT_STATUS, PROJECTS_FILE, UPLOADS_DIR};
use crate::error::CollaboratorError;
use crate::forms::{ContactMessage, FileAttachment};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredContact {
    #[serde(flatten)]
    message: ContactMessage,
    timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
    /// Serializes read-modify-write of the JSON files
    write_lock: Mutex<()>,
    /// Keeps stored upload names unique within one millisecond
    upload_seq: AtomicU64,
}

impl LocalBackend {
    /// Create the data directory (and uploads dir) if missing
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(UPLOADS_DIR))
            .await
            .with_context(|| format!("Failed to create data directory: {}", root.display()))?;

        info!(path = %root.display(), "Opened local back end");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
            upload_seq: AtomicU64::new(1),
        })
    }

    /// Every stored contact message, oldest first
    pub async fn contacts(&self) -> Result<Vec<ContactMessage>, CollaboratorError> {
        let stored: Vec<StoredContact> = self.read_list(CONTACTS_FILE).await?;
        Ok(stored.into_iter().map(|c| c.message).collect())
    }

    async fn read_list<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, CollaboratorError> {
        let path = self.root.join(file);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CollaboratorError::io(&format!("Failed to read {file}"), &e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            CollaboratorError::new("storage/corrupt", format!("Failed to parse {file}: {e}"))
        })
    }

    /// Write through a temp file so a crash never leaves half a list
    async fn write_list<T: Serialize>(&self, file: &str, items: &[T]) -> Result<(), CollaboratorError> {
        let json = serde_json::to_vec_pretty(items).map_err(|e| {
            CollaboratorError::new("storage/encode", format!("Failed to serialize {file}: {e}"))
        })?;

        let path = self.root.join(file);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| CollaboratorError::io(&format!("Failed to write {file}"), &e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| CollaboratorError::io(&format!("Failed to replace {file}"), &e))?;

        debug!(file, count = items.len(), "Wrote list");
        Ok(())
    }
}

#[async_trait]
impl ContactBackend for LocalBackend {
    async fn submit_contact(&self, message: &ContactMessage) -> Result<(), CollaboratorError> {
        let _guard = self.write_lock.lock().await;

        let mut contacts: Vec<StoredContact> = self.read_list(CONTACTS_FILE).await?;
        contacts.push(StoredContact {
            message: message.clone(),
            timestamp: Utc::now(),
        });
        self.write_list(CONTACTS_FILE, &contacts).await?;

        info!(email = %message.email, subject = %message.subject, "Stored contact message");
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for LocalBackend {
    async fn submit_project(&self, project: &NewProject) -> Result<String, CollaboratorError> {
        let _guard = self.write_lock.lock().await;

        let mut projects: Vec<StoredProject> = self.read_list(PROJECTS_FILE).await?;
        let timestamp = Utc::now();
        let id = format!("{}-{}", timestamp.format("%Y%m%d%H%M%S%3f"), projects.len() + 1);

        projects.insert(
            0,
            StoredProject {
                id: id.clone(),
                title: project.title.clone(),
                description: project.description.clone(),
                file_url: project.file_url.clone(),
                file_name: project.file_name.clone(),
                file_type: project.file_type.clone(),
                status: Some(DEFAULT_PROJECT_STATUS.to_string()),
                timestamp,
            },
        );
        self.write_list(PROJECTS_FILE, &projects).await?;

        info!(project_id = %id, title = %project.title, "Stored project");
        Ok(id)
    }

    async fn list_projects(&self) -> Result<Vec<StoredProject>, CollaboratorError> {
        let mut projects: Vec<StoredProject> = self.read_list(PROJECTS_FILE).await?;
        projects.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!(count = projects.len(), "Listed projects");
        Ok(projects)
    }
}

#[async_trait]
impl FileStorage for LocalBackend {
    async fn upload_file(&self, file: &FileAttachment, folder: &str) -> Result<UploadedFile, CollaboratorError> {
        if folder.is_empty()
            || folder.contains("..")
            || folder.contains(['/', '\\'])
        {
            return Err(CollaboratorError::new(
                "storage/invalid-folder",
                format!("Invalid upload folder: {folder}"),
            ));
        }

        let dir = self.root.join(UPLOADS_DIR).join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CollaboratorError::io("Failed to create upload folder", &e))?;

        let stored_name = format!(
            "{}-{}_{}",
            Utc::now().timestamp_millis(),
            self.upload_seq.fetch_add(1, Ordering::Relaxed),
            sanitize_file_name(&file.name)
        );
        let path = dir.join(&stored_name);
        tokio::fs::write(&path, &file.data)
            .await
            .map_err(|e| CollaboratorError::io("Failed to store upload", &e))?;

        let absolute = std::path::absolute(&path).unwrap_or(path);
        info!(file = %file.name, size = file.size, path = %absolute.display(), "Stored upload");

        Ok(UploadedFile {
            download_url: format!("file://{}", absolute.display()),
            original_name: file.name.clone(),
            file_type: file.mime_type.clone(),
        })
    }
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
