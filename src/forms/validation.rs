use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// `local@domain.tld` shape: no whitespace, exactly one `@`, a dot in the domain
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Notice for any failed attempt that is not just a bad address
pub const REQUIRED_NOTICE: &str = "Please fill in all required fields";

pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Trimmed length in characters is at least `min`
pub fn has_min_chars(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Form inputs that can carry an inline error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
    Title,
    Description,
}

impl Field {
    /// Input name / element id
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Subject => "subject",
            Field::Message => "message",
            Field::Title => "title",
            Field::Description => "description",
        }
    }

    /// Id of the element holding this field's inline error text
    pub fn error_element_id(&self) -> String {
        format!("{}-error", self.as_str())
    }
}

/// Per-field validation failures, in form order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Whether the input should be marked invalid
    pub fn is_invalid(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    pub fn first_message(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Single notice for the whole attempt: the address message when the
    /// email is the only failure, the required-fields text otherwise
    pub fn summary(&self) -> &str {
        match self.get(Field::Email) {
            Some(message) if self.len() == 1 => message,
            _ => REQUIRED_NOTICE,
        }
    }

    /// `Ok(())` when nothing failed
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{}: {}", field.as_str(), message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
