//! Input validation for template API requests

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length for common string fields
pub const MAX_NAME_LENGTH: usize = 64;
pub const MAX_NAMESPACE_LENGTH: usize = 64;
pub const MAX_TAG_LENGTH: usize = 30;
pub const MAX_DESCRIPTION_LENGTH: usize = 4096;
pub const MAX_LABELS: usize = 16;

/// Template and namespace name grammar
static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*$").unwrap());

/// Exact semantic version, e.g. 1.2.3
static VERSION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").unwrap());

/// Tag grammar (e.g. stable, latest, v1)
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").unwrap());

/// Validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str, code: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            code: code.to_string(),
        }
    }
}

/// Validation result
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Input validator
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self { errors: vec![] }
    }

    /// Validate and return result
    pub fn validate(self) -> ValidationResult {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    /// Add an error
    pub fn error(&mut self, field: &str, message: &str, code: &str) -> &mut Self {
        self.errors.push(ValidationError::new(field, message, code));
        self
    }

    /// Validate a template or namespace name
    pub fn name(&mut self, field: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.error(field, "This field is required", "required");
        } else if value.len() > MAX_NAME_LENGTH {
            self.error(field, "Name is too long", "too_long");
        } else if !NAME_REGEX.is_match(value) {
            self.error(
                field,
                "Name must be alphanumeric with dashes or underscores",
                "invalid_format",
            );
        }
        self
    }

    /// Validate an exact version string
    pub fn version(&mut self, field: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.error(field, "Version is required", "required");
        } else if !VERSION_REGEX.is_match(value) {
            self.error(field, "Version must be exact, e.g. 1.2.3", "invalid_format");
        }
        self
    }

    /// Validate a tag name
    pub fn tag(&mut self, field: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.error(field, "Tag is required", "required");
        } else if value.len() > MAX_TAG_LENGTH {
            self.error(field, "Tag is too long", "too_long");
        } else if !TAG_REGEX.is_match(value) {
            self.error(
                field,
                "Tag must start with a letter and be alphanumeric",
                "invalid_format",
            );
        }
        self
    }

    /// Validate an optional description
    pub fn description(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            if v.len() > MAX_DESCRIPTION_LENGTH {
                self.error(field, "Description is too long", "too_long");
            }
        }
        self
    }

    /// Validate the label list
    pub fn labels(&mut self, field: &str, values: &[String]) -> &mut Self {
        if values.len() > MAX_LABELS {
            self.error(
                field,
                &format!("At most {} labels are allowed", MAX_LABELS),
                "too_many",
            );
        }
        for label in values {
            if label.is_empty() || label.len() > MAX_NAME_LENGTH {
                self.error(field, "Labels must be 1-64 characters", "invalid");
                break;
            }
        }
        self
    }

    /// Validate that a config payload is a JSON object
    pub fn config(&mut self, field: &str, value: &serde_json::Value) -> &mut Self {
        if !value.is_object() {
            self.error(field, "Config must be a JSON object", "invalid_format");
        }
        self
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
