use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::validation::{self, Field, FieldErrors};
use super::{FormData, SubmitControl};
use crate::backend::ContactBackend;
use crate::constants::forms::{DEFAULT_CONTACT_SUBJECT, MIN_MESSAGE_CHARS, MIN_NAME_CHARS};
use crate::error::{CollaboratorError, SiteError};
use crate::notify::{NotificationCenter, NotificationKind};

const IDLE_LABEL: &str = "Send Message";
const BUSY_LABEL: &str = "Sending...";
const SUCCESS_NOTICE: &str = "Message sent successfully! We'll get back to you soon.";
const FAILURE_NOTICE: &str = "Failed to send message. Please try again.";

/// Record handed to the contact collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    /// Build from raw fields; a blank subject gets the default one
    pub fn from_fields(fields: &FormData) -> Self {
        let subject = fields.get("subject").trim();
        Self {
            name: fields.get("name").trim().to_string(),
            email: fields.get("email").trim().to_string(),
            subject: if subject.is_empty() {
                DEFAULT_CONTACT_SUBJECT.to_string()
            } else {
                subject.to_string()
            },
            message: fields.get("message").trim().to_string(),
        }
    }
}

/// Check name, email and message; subject is optional
pub fn validate(fields: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if !validation::has_min_chars(fields.get("name"), MIN_NAME_CHARS) {
        errors.insert(Field::Name, "Please enter your full name (at least 2 characters)");
    }
    if !validation::validate_email(fields.get("email").trim()) {
        errors.insert(Field::Email, "Please enter a valid email address");
    }
    if !validation::has_min_chars(fields.get("message"), MIN_MESSAGE_CHARS) {
        errors.insert(Field::Message, "Please enter a message (at least 10 characters)");
    }

    errors
}

#[derive(Debug)]
pub struct ContactForm {
    fields: FormData,
    errors: FieldErrors,
    control: SubmitControl,
}

impl ContactForm {
    pub fn new() -> Self {
        Self {
            fields: FormData::new(),
            errors: FieldErrors::default(),
            control: SubmitControl::new(IDLE_LABEL),
        }
    }

    pub fn with_fields(fields: FormData) -> Self {
        Self {
            fields,
            ..Self::new()
        }
    }

    pub fn set_field(&mut self, name: &str, value: &str) {
        self.fields.set(name, value);
    }

    pub fn fields(&self) -> &FormData {
        &self.fields
    }

    /// Inline errors from the last attempt
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn control(&self) -> &SubmitControl {
        &self.control
    }

    /// Validate and enter the loading state. Inline errors are replaced
    /// by this attempt's errors; nothing is sent when any field fails.
    pub fn begin(&mut self) -> Result<ContactMessage, SiteError> {
        if self.control.is_disabled() {
            return Err(SiteError::InFlight);
        }

        self.errors = validate(&self.fields);
        if !self.errors.is_empty() {
            debug!(errors = %self.errors, "Contact form invalid");
            return Err(SiteError::Validation(self.errors.clone()));
        }

        self.control.begin(BUSY_LABEL)?;
        Ok(ContactMessage::from_fields(&self.fields))
    }

    /// Settle the control and report the collaborator's outcome
    pub fn finish(
        &mut self,
        result: Result<(), CollaboratorError>,
        notices: &mut NotificationCenter,
        now: Duration,
    ) -> Result<(), SiteError> {
        self.control.settle();

        match result {
            Ok(()) => {
                info!("Contact message sent");
                self.fields.reset();
                self.errors.clear();
                notices.show(SUCCESS_NOTICE, NotificationKind::Success, now);
                Ok(())
            }
            Err(err) => {
                warn!(code = %err.code, error = %err, "Contact submission failed");
                let err = SiteError::Submission(err);
                notices.show(err.user_message(FAILURE_NOTICE), NotificationKind::Error, now);
                Err(err)
            }
        }
    }

    pub async fn submit<B: ContactBackend + ?Sized>(
        &mut self,
        backend: &B,
        notices: &mut NotificationCenter,
        now: Duration,
    ) -> Result<(), SiteError> {
        let message = match self.begin() {
            Ok(message) => message,
            Err(err) => {
                if let SiteError::Validation(errors) = &err {
                    notices.show(errors.summary(), NotificationKind::Error, now);
                }
                return Err(err);
            }
        };
        let result = backend.submit_contact(&message).await;
        self.finish(result, notices, now)
    }
}

impl Default for ContactForm {
    fn default() -> Self {
        Self::new()
    }
}
