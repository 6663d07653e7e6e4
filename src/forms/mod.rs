//! Form coordination
//!
//! Each form owns its field values, its inline errors and its submit control.
//! Submission is split into `begin` (validate, disable the control) and
//! `finish` (settle the control, report the outcome) around the awaited
//! collaborator call, so at most one request per form is ever in flight.

pub mod contact;
pub mod newsletter;
pub mod project;
pub mod validation;

pub use contact::{ContactForm, ContactMessage};
pub use newsletter::NewsletterForm;
pub use project::{FileAttachment, FilePolicy, FileRejection, ProjectForm};
pub use validation::{validate_email, Field, FieldErrors};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::SiteError;

/// Field values keyed by input name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    /// Missing inputs read as empty, like an untouched form control
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }

    /// True when every input is blank
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }

    /// Form reset: every input back to empty
    pub fn reset(&mut self) {
        self.0.clear();
    }
}

/// Submit button state: label and disabled flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitControl {
    idle_label: String,
    label: String,
    disabled: bool,
}

impl SubmitControl {
    pub fn new(idle_label: &str) -> Self {
        Self {
            idle_label: idle_label.to_string(),
            label: idle_label.to_string(),
            disabled: false,
        }
    }

    /// Enter the loading state; fails if a request is already in flight
    pub fn begin(&mut self, busy_label: &str) -> Result<(), SiteError> {
        if self.disabled {
            return Err(SiteError::InFlight);
        }
        self.disabled = true;
        self.label = busy_label.to_string();
        debug!(label = busy_label, "Submit control busy");
        Ok(())
    }

    /// Change the busy label mid-flight (e.g. while uploading)
    pub fn relabel(&mut self, busy_label: &str) {
        if self.disabled {
            self.label = busy_label.to_string();
        }
    }

    /// Back to the idle label and enabled; safe to call more than once
    pub fn settle(&mut self) {
        self.disabled = false;
        self.label = self.idle_label.clone();
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}
