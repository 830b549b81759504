use serde::{Deserialize, Serialize};

use crate::{Error, InternalResult};

/// Tuning knobs of a parse.
///
/// Every field has a default, so an empty JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Maximum nesting depth of collections and nested links
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Resolve relative, non-templated hrefs against the base URI
    #[serde(default = "default_true")]
    pub resolve_relative_hrefs: bool,

    /// Run the structural schema gate before building
    #[serde(default = "default_true")]
    pub syntax_check: bool,

    /// Cap on reported diagnostics
    #[serde(default)]
    pub max_errors: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            resolve_relative_hrefs: default_true(),
            syntax_check: default_true(),
            max_errors: None,
        }
    }
}

impl ParserConfig {
    /// Reads a configuration from JSON text supplied by the caller
    pub fn from_json_str(s: &str) -> InternalResult<Self> {
        let config: ParserConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> InternalResult<()> {
        if self.max_depth == 0 {
            return Err(Error::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_errors == Some(0) {
            return Err(Error::InvalidConfig(
                "max_errors must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = Some(max_errors);
        self
    }

    pub fn without_syntax_check(mut self) -> Self {
        self.syntax_check = false;
        self
    }

    pub fn without_href_resolution(mut self) -> Self {
        self.resolve_relative_hrefs = false;
        self
    }
}

fn default_max_depth() -> usize {
    32
}

fn default_true() -> bool {
    true
}
