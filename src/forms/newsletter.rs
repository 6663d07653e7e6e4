use std::time::Duration;
use tracing::info;

use super::validation::{validate_email, Field, FieldErrors};
use crate::error::SiteError;
use crate::notify::{NotificationCenter, NotificationKind};

const INVALID_EMAIL: &str = "Please enter a valid email address";
const SUCCESS_NOTICE: &str = "Thank you for subscribing to our newsletter!";

/// Single-field signup; there is no subscription back end, so a valid
/// address is acknowledged and the form reset.
#[derive(Debug, Default)]
pub struct NewsletterForm {
    email: String,
}

impl NewsletterForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_string();
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn submit(&mut self, notices: &mut NotificationCenter, now: Duration) -> Result<(), SiteError> {
        if !validate_email(self.email.trim()) {
            notices.show(INVALID_EMAIL, NotificationKind::Error, now);
            let mut errors = FieldErrors::default();
            errors.insert(Field::Email, INVALID_EMAIL);
            return Err(SiteError::Validation(errors));
        }

        info!(email = %self.email.trim(), "Newsletter signup");
        notices.show(SUCCESS_NOTICE, NotificationKind::Success, now);
        self.email.clear();
        Ok(())
    }
}
