//! # Errors
//!
//! Diagnostics about documents ([`ValidationError`], collected in a
//! [`ValidationErrorList`]) and failures of the library itself ([`Error`]).

use std::ops::Deref;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::ast::NodeKind;
use crate::path::FieldPath;
use crate::registry::Profile;

/// Stage that produced a diagnostic
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
pub enum ErrorKind {
    /// Structural schema violation, aborts the parse
    Syntax,
    /// A field could not be converted to its typed form
    Parsing,
    /// A cross-field or cross-node rule was violated
    Semantic,
}

impl ErrorKind {
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::Syntax)
    }
}

/// Single diagnostic about a document.
///
/// Serializes as `{"kind": ..., "path": "/slash/delimited", "message": ...}`.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{kind} error at {}: {message}", .path.label())]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub path: FieldPath,
    pub message: String,
    /// Branch failures behind an aggregate `one_of` error
    #[serde(skip)]
    pub causes: Vec<ValidationError>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
            causes: Vec::new(),
        }
    }

    pub fn syntax(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, path, message)
    }

    pub fn parsing(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parsing, path, message)
    }

    pub fn semantic(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Semantic, path, message)
    }

    pub fn missing_field(path: FieldPath) -> Self {
        let message = match path.last_key() {
            Some(key) => format!("missing required field '{}'", key),
            None => "missing required field".to_string(),
        };
        Self::parsing(path, message)
    }

    /// Parsing error for a value of the wrong JSON type or format
    pub fn expected(path: FieldPath, expected: &str, found: &Value) -> Self {
        Self::parsing(
            path,
            format!("expected {}, found {}", expected, json_type_name(found)),
        )
    }

    pub fn with_causes(mut self, causes: Vec<ValidationError>) -> Self {
        self.causes = causes;
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// Name of a JSON value's type as used in diagnostics
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered list of diagnostics; empty means success
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrorList {
    errors: Vec<ValidationError>,
}

impl ValidationErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |error| error.kind == kind)
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(ValidationError::is_fatal)
    }

    /// Errors whose path equals `path`
    pub fn at(&self, path: &FieldPath) -> Vec<&ValidationError> {
        self.errors.iter().filter(|error| &error.path == path).collect()
    }

    /// Keeps at most `max` entries and notes how many were dropped.
    ///
    /// The note takes the kind of the first dropped entry, so a list of
    /// syntax errors stays syntax-only.
    pub fn truncate_to(&mut self, max: usize) {
        let Some(first_dropped) = self.errors.get(max) else {
            return;
        };
        let kind = first_dropped.kind;
        let dropped = self.errors.len() - max;
        self.errors.truncate(max);
        self.errors.push(ValidationError::new(
            kind,
            FieldPath::root(),
            format!("error limit of {} reached, {} further errors dropped", max, dropped),
        ));
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Serializes every entry as `{kind, path, message}`
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl Deref for ValidationErrorList {
    type Target = [ValidationError];

    fn deref(&self) -> &Self::Target {
        &self.errors
    }
}

impl Extend<ValidationError> for ValidationErrorList {
    fn extend<T: IntoIterator<Item = ValidationError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl FromIterator<ValidationError> for ValidationErrorList {
    fn from_iter<T: IntoIterator<Item = ValidationError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<ValidationError>> for ValidationErrorList {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for ValidationErrorList {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrorList {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Failures of the library itself, as opposed to diagnostics about a document
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid schema for profile {profile}: {message}")]
    InvalidSchema { profile: Profile, message: String },

    #[error("Duplicate registration of {what} '{name}' in profile {profile}")]
    DuplicateRegistration {
        what: &'static str,
        name: String,
        profile: Profile,
    },

    #[error("Node kind {0} is not built by a node builder")]
    UnsupportedNodeKind(NodeKind),

    #[error("Default registry failed to initialize: {0}")]
    DefaultRegistry(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid base URI: {0}")]
    InvalidBaseUri(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type InternalResult<T> = Result<T, Error>;
