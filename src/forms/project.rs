use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::validation::{self, Field, FieldErrors};
use super::{FormData, SubmitControl};
use crate::backend::{format_file_size, FileStorage, NewProject, ProjectStore};
use crate::config::FormSettings;
use crate::constants::forms::UPLOAD_FOLDER;
use crate::error::SiteError;
use crate::notify::{NotificationCenter, NotificationKind};
use crate::projects::ProjectsPanel;

const IDLE_LABEL: &str = "Submit Project";
const BUSY_LABEL: &str = "Submitting...";
const UPLOAD_LABEL: &str = "Uploading file...";
const SUCCESS_NOTICE: &str = "Project submitted successfully! It will be reviewed and published soon.";
const FAILURE_NOTICE: &str = "Failed to submit project. Please try again.";

/// A file picked by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl FileAttachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: data.len() as u64,
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read a file from disk, guessing its type from the extension
    pub async fn from_path(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read attachment {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Attachment path has no file name: {}", path.display()))?;

        Ok(Self::new(name, mime_for_path(path), data))
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// MIME type by file extension; unknown extensions are opaque binary
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileRejection {
    #[error("File size exceeds {}MB limit", .limit / (1024 * 1024))]
    TooLarge { size: u64, limit: u64 },

    #[error("File type not allowed. Please upload images or PDF files.")]
    TypeNotAllowed { mime_type: String },
}

/// Size and type constraints for attachments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePolicy {
    pub max_bytes: u64,
    pub allowed_types: Vec<String>,
}

impl FilePolicy {
    pub fn from_settings(settings: &FormSettings) -> Self {
        Self {
            max_bytes: settings.max_upload_bytes,
            allowed_types: settings.allowed_upload_types.clone(),
        }
    }

    /// Size is checked before type
    pub fn check(&self, file: &FileAttachment) -> Result<(), FileRejection> {
        if file.size > self.max_bytes {
            return Err(FileRejection::TooLarge {
                size: file.size,
                limit: self.max_bytes,
            });
        }
        if !self.allowed_types.iter().any(|t| t == &file.mime_type) {
            return Err(FileRejection::TypeNotAllowed {
                mime_type: file.mime_type.clone(),
            });
        }
        Ok(())
    }
}

impl Default for FilePolicy {
    fn default() -> Self {
        Self::from_settings(&FormSettings::default())
    }
}

/// What the upload area shows for the selected file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePreview {
    pub name: String,
    pub size: String,
    pub is_image: bool,
}

pub fn validate(fields: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if validation::is_blank(fields.get("title")) {
        errors.insert(Field::Title, validation::REQUIRED_NOTICE);
    }
    if validation::is_blank(fields.get("description")) {
        errors.insert(Field::Description, validation::REQUIRED_NOTICE);
    }
    errors
}

#[derive(Debug)]
pub struct ProjectForm {
    fields: FormData,
    errors: FieldErrors,
    selected: Option<FileAttachment>,
    policy: FilePolicy,
    control: SubmitControl,
}

impl ProjectForm {
    pub fn new(policy: FilePolicy) -> Self {
        Self {
            fields: FormData::new(),
            errors: FieldErrors::default(),
            selected: None,
            policy,
            control: SubmitControl::new(IDLE_LABEL),
        }
    }

    pub fn set_field(&mut self, name: &str, value: &str) {
        self.fields.set(name, value);
    }

    pub fn fields(&self) -> &FormData {
        &self.fields
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn control(&self) -> &SubmitControl {
        &self.control
    }

    /// Check the file immediately; a rejected file is dropped and any
    /// earlier selection stays in place.
    pub fn select_file(
        &mut self,
        file: FileAttachment,
        notices: &mut NotificationCenter,
        now: Duration,
    ) -> Result<(), SiteError> {
        if let Err(rejection) = self.policy.check(&file) {
            warn!(file = %file.name, size = file.size, mime = %file.mime_type, reason = %rejection, "File rejected");
            notices.show(rejection.to_string(), NotificationKind::Error, now);
            return Err(rejection.into());
        }

        debug!(file = %file.name, size = file.size, "File selected");
        self.selected = Some(file);
        Ok(())
    }

    pub fn clear_file(&mut self) {
        self.selected = None;
    }

    pub fn selected_file(&self) -> Option<&FileAttachment> {
        self.selected.as_ref()
    }

    pub fn preview(&self) -> Option<FilePreview> {
        self.selected.as_ref().map(|file| FilePreview {
            name: file.name.clone(),
            size: format_file_size(file.size),
            is_image: file.is_image(),
        })
    }

    /// Validate fields, re-check the selected file, enter the loading state
    pub fn begin(&mut self) -> Result<NewProject, SiteError> {
        if self.control.is_disabled() {
            return Err(SiteError::InFlight);
        }

        self.errors = validate(&self.fields);
        if !self.errors.is_empty() {
            debug!(errors = %self.errors, "Project form invalid");
            return Err(SiteError::Validation(self.errors.clone()));
        }

        if let Some(file) = &self.selected {
            if let Err(rejection) = self.policy.check(file) {
                warn!(file = %file.name, reason = %rejection, "Selected file no longer allowed");
                self.selected = None;
                return Err(rejection.into());
            }
        }

        self.control.begin(BUSY_LABEL)?;
        Ok(NewProject {
            title: self.fields.get("title").trim().to_string(),
            description: self.fields.get("description").trim().to_string(),
            file_url: None,
            file_name: None,
            file_type: None,
        })
    }

    /// Upload the attachment (if any), store the record, refresh the list.
    /// Returns the new project's id.
    pub async fn submit<B>(
        &mut self,
        backend: &B,
        panel: &mut ProjectsPanel,
        notices: &mut NotificationCenter,
        now: Duration,
    ) -> Result<String, SiteError>
    where
        B: FileStorage + ProjectStore + ?Sized,
    {
        let project = match self.begin() {
            Ok(project) => project,
            Err(err) => {
                match &err {
                    SiteError::Validation(errors) => {
                        notices.show(errors.summary(), NotificationKind::Error, now);
                    }
                    SiteError::FileRejected(_) => {
                        notices.show(err.to_string(), NotificationKind::Error, now);
                    }
                    _ => {}
                }
                return Err(err);
            }
        };

        let outcome = self.send(backend, project).await;
        self.control.settle();

        match outcome {
            Ok(id) => {
                info!(project_id = %id, "Project submitted");
                self.fields.reset();
                self.errors.clear();
                self.clear_file();
                notices.show(SUCCESS_NOTICE, NotificationKind::Success, now);

                // A failed refresh shows in the panel's own error state
                if let Err(err) = panel.refresh(backend).await {
                    warn!(error = %err, "Project list refresh failed");
                }
                Ok(id)
            }
            Err(err) => {
                warn!(error = %err, "Project submission failed");
                notices.show(err.user_message(FAILURE_NOTICE), NotificationKind::Error, now);
                Err(err)
            }
        }
    }

    async fn send<B>(&mut self, backend: &B, mut project: NewProject) -> Result<String, SiteError>
    where
        B: FileStorage + ProjectStore + ?Sized,
    {
        if let Some(file) = &self.selected {
            self.control.relabel(UPLOAD_LABEL);
            let uploaded = backend
                .upload_file(file, UPLOAD_FOLDER)
                .await
                .map_err(SiteError::Upload)?;
            debug!(url = %uploaded.download_url, "Attachment uploaded");

            project.file_url = Some(uploaded.download_url);
            project.file_name = Some(uploaded.original_name);
            project.file_type = Some(uploaded.file_type);
        }

        backend
            .submit_project(&project)
            .await
            .map_err(SiteError::Submission)
    }
}

impl Default for ProjectForm {
    fn default() -> Self {
        Self::new(FilePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::RecordingBackend;
    use crate::error::CollaboratorError;
    use crate::projects::PanelState;
    use crate::timer::at_ms;

    const MB: usize = 1024 * 1024;

    fn filled() -> ProjectForm {
        let mut form = ProjectForm::default();
        form.set_field("title", "Campus Screening Survey");
        form.set_field("description", "Uptake of screening among students.");
        form
    }

    #[test]
    fn test_policy_checks_size_then_type() {
        let policy = FilePolicy::default();

        let big = FileAttachment::new("scan.exe", "application/x-msdownload", vec![0; 6 * MB]);
        assert!(matches!(policy.check(&big), Err(FileRejection::TooLarge { .. })));
        assert_eq!(policy.check(&big).unwrap_err().to_string(), "File size exceeds 5MB limit");

        let exe = FileAttachment::new("tool.exe", "application/x-msdownload", vec![0; 10]);
        assert_eq!(
            policy.check(&exe).unwrap_err().to_string(),
            "File type not allowed. Please upload images or PDF files."
        );

        let exact = FileAttachment::new("poster.pdf", "application/pdf", vec![0; 5 * MB]);
        assert!(policy.check(&exact).is_ok());
    }

    #[test]
    fn test_rejected_file_keeps_earlier_selection() {
        let mut form = filled();
        let mut notices = NotificationCenter::default();
        form.select_file(
            FileAttachment::new("ok.png", "image/png", vec![1, 2, 3]),
            &mut notices,
            at_ms(0),
        )
        .unwrap();

        let result = form.select_file(
            FileAttachment::new("huge.png", "image/png", vec![0; 6 * MB]),
            &mut notices,
            at_ms(10),
        );

        assert!(matches!(result, Err(SiteError::FileRejected(_))));
        assert_eq!(form.selected_file().map(|f| f.name.as_str()), Some("ok.png"));
        assert_eq!(form.preview().unwrap().name, "ok.png");
        assert_eq!(notices.latest().unwrap().kind, NotificationKind::Error);
    }

    #[test]
    fn test_preview() {
        let mut form = ProjectForm::default();
        let mut notices = NotificationCenter::default();
        form.select_file(
            FileAttachment::new("poster.png", "image/png", vec![0; 1536]),
            &mut notices,
            at_ms(0),
        )
        .unwrap();

        let preview = form.preview().unwrap();
        assert_eq!(preview.name, "poster.png");
        assert_eq!(preview.size, "1.5 KB");
        assert!(preview.is_image);
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/Poster.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("report.pdf")), "application/pdf");
        assert_eq!(mime_for_path(Path::new("README")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_oversized_file_never_uploaded() {
        let backend = RecordingBackend::default();
        let mut panel = ProjectsPanel::new();
        let mut notices = NotificationCenter::default();
        let mut form = filled();

        let _ = form.select_file(
            FileAttachment::new("scan.png", "image/png", vec![0; 6 * MB]),
            &mut notices,
            at_ms(0),
        );
        form.submit(&backend, &mut panel, &mut notices, at_ms(10)).await.unwrap();

        assert_eq!(RecordingBackend::calls(&backend.upload_calls), 0);
        let stored = backend.projects.lock().unwrap();
        assert_eq!(stored[0].file_url, None);
    }

    #[tokio::test]
    async fn test_png_uploaded_then_listed() {
        let backend = RecordingBackend::default();
        let mut panel = ProjectsPanel::new();
        let mut notices = NotificationCenter::default();
        let mut form = filled();

        form.select_file(
            FileAttachment::new("poster.png", "image/png", vec![7; 2 * MB]),
            &mut notices,
            at_ms(0),
        )
        .unwrap();
        let id = form.submit(&backend, &mut panel, &mut notices, at_ms(10)).await.unwrap();

        assert_eq!(id, "project-1");
        assert_eq!(RecordingBackend::calls(&backend.upload_calls), 1);
        assert_eq!(*backend.uploaded_folders.lock().unwrap(), vec!["projects".to_string()]);
        assert_eq!(RecordingBackend::calls(&backend.list_calls), 1);
        assert!(matches!(panel.state(), PanelState::Loaded(cards) if cards.len() == 1));

        assert!(form.fields().is_empty());
        assert!(form.selected_file().is_none());
        assert_eq!(notices.latest().unwrap().message, SUCCESS_NOTICE);
        assert!(!form.control().is_disabled());
    }

    #[tokio::test]
    async fn test_missing_title_sends_nothing() {
        let backend = RecordingBackend::default();
        let mut panel = ProjectsPanel::new();
        let mut notices = NotificationCenter::default();
        let mut form = ProjectForm::default();
        form.set_field("description", "Something");

        let result = form.submit(&backend, &mut panel, &mut notices, at_ms(0)).await;

        assert!(matches!(result, Err(SiteError::Validation(_))));
        assert!(form.errors().is_invalid(Field::Title));
        assert_eq!(RecordingBackend::calls(&backend.submit_calls), 0);
        assert_eq!(notices.latest().unwrap().message, "Please fill in all required fields");
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_form() {
        let backend = RecordingBackend {
            fail_submit: Some(CollaboratorError::new("permission-denied", "Missing or insufficient permissions.")),
            ..Default::default()
        };
        let mut panel = ProjectsPanel::new();
        let mut notices = NotificationCenter::default();
        let mut form = filled();
        form.select_file(
            FileAttachment::new("poster.png", "image/png", vec![3; 128]),
            &mut notices,
            at_ms(0),
        )
        .unwrap();

        let result = form.submit(&backend, &mut panel, &mut notices, at_ms(5)).await;

        assert!(matches!(result, Err(SiteError::Submission(_))));
        assert_eq!(RecordingBackend::calls(&backend.upload_calls), 1);
        assert_eq!(RecordingBackend::calls(&backend.list_calls), 0);
        assert_eq!(form.fields().get("title"), "Campus Screening Survey");
        assert_eq!(form.fields().get("description"), "Uptake of screening among students.");
        assert!(form.selected_file().is_some());
        assert!(!form.control().is_disabled());
        assert_eq!(form.control().label(), "Submit Project");
        assert_eq!(notices.latest().unwrap().message, "Missing or insufficient permissions.");
        assert_eq!(panel.state(), &PanelState::Loading);
    }

    #[tokio::test]
    async fn test_refresh_failure_after_submit_still_succeeds() {
        let backend = RecordingBackend {
            fail_list: Some(CollaboratorError::new("unavailable", "Service unavailable")),
            ..Default::default()
        };
        let mut panel = ProjectsPanel::new();
        let mut notices = NotificationCenter::default();
        let mut form = filled();

        let id = form.submit(&backend, &mut panel, &mut notices, at_ms(0)).await.unwrap();

        assert_eq!(id, "project-1");
        assert_eq!(RecordingBackend::calls(&backend.list_calls), 1);
        assert_eq!(panel.state(), &PanelState::Error);
        assert!(form.fields().is_empty());
        assert_eq!(notices.latest().unwrap().message, SUCCESS_NOTICE);
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_form() {
        let backend = RecordingBackend {
            fail_upload: Some(CollaboratorError::new("storage/quota", "Storage quota exceeded")),
            ..Default::default()
        };
        let mut panel = ProjectsPanel::new();
        let mut notices = NotificationCenter::default();
        let mut form = filled();
        form.select_file(
            FileAttachment::new("doc.pdf", "application/pdf", vec![1; 64]),
            &mut notices,
            at_ms(0),
        )
        .unwrap();

        let result = form.submit(&backend, &mut panel, &mut notices, at_ms(5)).await;

        assert!(matches!(result, Err(SiteError::Upload(_))));
        assert_eq!(RecordingBackend::calls(&backend.submit_calls), 0);
        assert_eq!(form.fields().get("title"), "Campus Screening Survey");
        assert!(form.selected_file().is_some());
        assert_eq!(form.control().label(), "Submit Project");
        assert_eq!(notices.latest().unwrap().message, "Storage quota exceeded");
    }

    #[tokio::test]
    async fn test_selected_file_rechecked_on_submit() {
        let backend = RecordingBackend::default();
        let mut panel = ProjectsPanel::new();
        let mut notices = NotificationCenter::default();
        let mut form = filled();
        form.select_file(
            FileAttachment::new("anim.gif", "image/gif", vec![0; 32]),
            &mut notices,
            at_ms(0),
        )
        .unwrap();

        form.policy = FilePolicy {
            max_bytes: 1024,
            allowed_types: vec!["application/pdf".to_string()],
        };
        let result = form.submit(&backend, &mut panel, &mut notices, at_ms(5)).await;

        assert!(matches!(result, Err(SiteError::FileRejected(FileRejection::TypeNotAllowed { .. }))));
        assert_eq!(RecordingBackend::calls(&backend.upload_calls), 0);
        assert!(form.selected_file().is_none());
        assert!(!form.control().is_disabled());
    }
}
