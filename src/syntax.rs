//! # Syntax Gate
//!
//! Checks a document against the structural JSON Schema of its profile before
//! anything is built. Every violation becomes a fatal `Syntax` error located
//! at the offending instance; a document with any of them yields no manifest.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::path::FieldPath;
use crate::registry::{Profile, Registry};

pub struct SyntaxAnalyzer<'a> {
    registry: &'a Registry,
}

impl<'a> SyntaxAnalyzer<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// All structural violations of `document`, in validator order
    #[tracing::instrument(level = "debug", skip(self, document))]
    pub fn analyze(&self, document: &Value, profile: Profile) -> Vec<ValidationError> {
        let Some(schema) = self.registry.schema(profile) else {
            warn!("no schema registered for {}, skipping structural checks", profile);
            return Vec::new();
        };

        let errors: Vec<ValidationError> = schema
            .validator()
            .iter_errors(document)
            .map(|e| {
                let path = FieldPath::from_pointer(&e.instance_path.to_string());
                ValidationError::syntax(path, e.to_string())
            })
            .collect();
        debug!("{} structural violations", errors.len());
        errors
    }
}
