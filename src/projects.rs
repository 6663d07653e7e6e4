//! Project list view
//!
//! Renders the projects grid from the data collaborator's records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::{ProjectStore, StoredProject};
use crate::error::SiteError;

const EMPTY_TEXT: &str = "No projects available yet. Be the first to submit a project!";
const ERROR_TEXT: &str = "Failed to load projects. Please try again later.";
const LOADING_TEXT: &str = "Loading projects...";

/// One rendered project card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status_label: String,
    pub status_class: &'static str,
    /// Set when the attachment is an image
    pub image_url: Option<String>,
    pub file_link: Option<FileLink>,
    pub submitted_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLink {
    pub url: String,
    pub label: &'static str,
    pub icon: &'static str,
}

impl ProjectCard {
    pub fn from_record(project: &StoredProject) -> Self {
        let file_type = project.file_type.as_deref().unwrap_or("");
        let is_pdf = file_type.contains("pdf");

        let image_url = project
            .file_url
            .clone()
            .filter(|_| file_type.starts_with("image"));

        let file_link = match (&project.file_url, &project.file_name) {
            (Some(url), Some(_)) => Some(FileLink {
                url: url.clone(),
                label: if is_pdf { "View Document" } else { "View Image" },
                icon: if is_pdf { "file-pdf" } else { "image" },
            }),
            _ => None,
        };

        Self {
            id: project.id.clone(),
            title: project.title.clone(),
            description: project.description.clone(),
            status_label: project
                .status
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Pending".to_string()),
            status_class: status_class(project.status.as_deref()),
            image_url,
            file_link,
            submitted_on: format_date(&project.timestamp),
        }
    }

    pub fn render_html(&self) -> String {
        let status = format!(
            r#"<div class="project-status {}">{}</div>"#,
            self.status_class,
            escape_html(&self.status_label)
        );

        let header = match &self.image_url {
            Some(url) => format!(
                r#"<div class="project-image"><img src="{}" alt="{}" loading="lazy">{}</div>"#,
                escape_html(url),
                escape_html(&self.title),
                status
            ),
            None => format!(r#"<div class="project-header">{status}</div>"#),
        };

        let file = match &self.file_link {
            Some(link) => format!(
                r#"<div class="project-file"><a href="{}" target="_blank" rel="noopener" class="file-link"><i class="fas fa-{}"></i> {}</a></div>"#,
                escape_html(&link.url),
                link.icon,
                link.label
            ),
            None => String::new(),
        };

        format!(
            r#"<div class="project-card">{header}<div class="project-content"><h3 class="project-title">{}</h3><p class="project-description">{}</p>{file}<div class="project-meta"><small>Submitted on {}</small></div></div></div>"#,
            escape_html(&self.title),
            escape_html(&self.description),
            self.submitted_on
        )
    }
}

/// Case-insensitive status to CSS class; unknown or missing is pending
pub fn status_class(status: Option<&str>) -> &'static str {
    match status.map(str::to_ascii_lowercase).as_deref() {
        Some("active") => "status-active",
        Some("completed") => "status-completed",
        _ => "status-pending",
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// "October 19, 2026"
pub fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%B %-d, %Y").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "cards", rename_all = "lowercase")]
pub enum PanelState {
    Loading,
    Empty,
    Error,
    Loaded(Vec<ProjectCard>),
}

#[derive(Debug)]
pub struct ProjectsPanel {
    state: PanelState,
}

impl ProjectsPanel {
    pub fn new() -> Self {
        Self {
            state: PanelState::Loading,
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// Fetch the list and switch to empty, loaded or error
    pub async fn refresh<S: ProjectStore + ?Sized>(&mut self, store: &S) -> Result<(), SiteError> {
        self.state = PanelState::Loading;

        match store.list_projects().await {
            Ok(projects) if projects.is_empty() => {
                debug!("No projects to show");
                self.state = PanelState::Empty;
                Ok(())
            }
            Ok(projects) => {
                debug!(count = projects.len(), "Loaded projects");
                self.state = PanelState::Loaded(projects.iter().map(ProjectCard::from_record).collect());
                Ok(())
            }
            Err(err) => {
                warn!(code = %err.code, error = %err, "Failed to load projects");
                self.state = PanelState::Error;
                Err(SiteError::Network(err))
            }
        }
    }

    pub fn render_html(&self) -> String {
        match &self.state {
            PanelState::Loading => format!(
                r#"<div class="projects-loading"><div class="loading-spinner"></div><p>{LOADING_TEXT}</p></div>"#
            ),
            PanelState::Empty => format!(
                r##"<div class="projects-empty"><p>{EMPTY_TEXT}</p><a href="#submit-project" class="btn btn--primary">Submit Project</a></div>"##
            ),
            PanelState::Error => format!(
                r#"<div class="projects-error"><p>{ERROR_TEXT}</p><button class="btn btn--secondary">Retry</button></div>"#
            ),
            PanelState::Loaded(cards) => cards.iter().map(ProjectCard::render_html).collect(),
        }
    }
}

impl Default for ProjectsPanel {
    fn default() -> Self {
        Self::new()
    }
}
