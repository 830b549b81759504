//! # Manifest Parser
//!
//! Drives one document through the pipeline:
//!
//! ```text
//! Init → SyntaxChecked → Built → SemanticChecked → Done
//!   └──── syntax errors ───────────────────────────↗ (no manifest)
//! ```
//!
//! Only the syntax gate can end a parse early. Parsing and semantic errors
//! are accumulated next to the manifest they describe, so callers must look
//! at [`ParseResult::errors`] even when a manifest is returned.

use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::analyzer::core::ParseContext;
use crate::ast::Manifest;
use crate::builder::AstBuilder;
use crate::config::ParserConfig;
use crate::error::{ValidationError, ValidationErrorList};
use crate::path::FieldPath;
use crate::registry::{Profile, Registry};
use crate::semantic::SemanticAnalyzer;
use crate::syntax::SyntaxAnalyzer;
use crate::InternalResult;

/// Pipeline position of one parse
#[derive(Debug)]
enum ParseState {
    Init,
    SyntaxChecked,
    Built(Manifest),
    SemanticChecked(Manifest),
    Done(Option<Manifest>),
}

impl ParseState {
    fn name(&self) -> &'static str {
        match self {
            ParseState::Init => "Init",
            ParseState::SyntaxChecked => "SyntaxChecked",
            ParseState::Built(_) => "Built",
            ParseState::SemanticChecked(_) => "SemanticChecked",
            ParseState::Done(_) => "Done",
        }
    }
}

/// Outcome of a parse: the manifest, unless the syntax gate rejected the
/// document, and every diagnostic in pipeline order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub manifest: Option<Manifest>,
    pub errors: ValidationErrorList,
}

impl ParseResult {
    /// A manifest was built and no diagnostic was reported
    pub fn is_success(&self) -> bool {
        self.manifest.is_some() && self.errors.is_empty()
    }

    pub fn into_parts(self) -> (Option<Manifest>, ValidationErrorList) {
        (self.manifest, self.errors)
    }
}

/// Parses documents of any profile against one registry and configuration.
///
/// The parser holds no per-document state; one instance can serve any
/// number of threads.
#[derive(Debug, Clone)]
pub struct ManifestParser<'r> {
    registry: &'r Registry,
    config: ParserConfig,
}

impl<'r> ManifestParser<'r> {
    /// Fails with [`Error::InvalidConfig`] when `config` does not validate
    ///
    /// [`Error::InvalidConfig`]: crate::Error::InvalidConfig
    pub fn new(registry: &'r Registry, config: ParserConfig) -> InternalResult<Self> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses `document` as `profile`, resolving relative hrefs against `base_uri`
    #[tracing::instrument(
        level = "debug",
        skip(self, document, base_uri),
        fields(base_uri = %base_uri)
    )]
    pub fn parse(&self, document: &Value, profile: Profile, base_uri: &Url) -> ParseResult {
        let mut errors = ValidationErrorList::new();
        let mut state = ParseState::Init;

        let manifest = loop {
            state = match state {
                ParseState::Init => {
                    if !self.config.syntax_check {
                        debug!("structural checks disabled");
                        ParseState::SyntaxChecked
                    } else {
                        let violations =
                            SyntaxAnalyzer::new(self.registry).analyze(document, profile);
                        if violations.is_empty() {
                            ParseState::SyntaxChecked
                        } else {
                            errors.extend(violations);
                            ParseState::Done(None)
                        }
                    }
                }
                ParseState::SyntaxChecked => {
                    let ctx = ParseContext::new(base_uri, self.registry, profile, &self.config);
                    let mut builder = AstBuilder::new(ctx);
                    let manifest = builder.build_manifest(document);
                    errors.extend(builder.finish());
                    ParseState::Built(manifest)
                }
                ParseState::Built(manifest) => {
                    let findings =
                        SemanticAnalyzer::new(self.registry).analyze(&manifest, profile);
                    errors.extend(findings);
                    ParseState::SemanticChecked(manifest)
                }
                ParseState::SemanticChecked(manifest) => ParseState::Done(Some(manifest)),
                ParseState::Done(manifest) => break manifest,
            };
            debug!("parse state: {} ({} errors so far)", state.name(), errors.len());
        };

        if let Some(max_errors) = self.config.max_errors {
            errors.truncate_to(max_errors);
        }
        info!(
            "parsed {} document: manifest {}, {} errors",
            profile,
            if manifest.is_some() { "built" } else { "rejected" },
            errors.len()
        );
        ParseResult { manifest, errors }
    }

    /// Parses JSON text; `base_uri` must be an absolute URI
    pub fn parse_str(
        &self,
        text: &str,
        profile: Profile,
        base_uri: &str,
    ) -> InternalResult<ParseResult> {
        let document: Value = serde_json::from_str(text)?;
        let base_uri = Url::parse(base_uri)?;
        Ok(self.parse(&document, profile, &base_uri))
    }
}

/// Parses `document` with the default registry and configuration
pub fn parse(document: &Value, profile: Profile, base_uri: &Url) -> ParseResult {
    let parser = Registry::default_registry()
        .and_then(|registry| ManifestParser::new(registry, ParserConfig::default()));
    match parser {
        Ok(parser) => parser.parse(document, profile, base_uri),
        Err(error) => ParseResult {
            manifest: None,
            errors: vec![ValidationError::syntax(FieldPath::root(), error.to_string())].into(),
        },
    }
}

/// Parses JSON text with the default registry and configuration
pub fn parse_str(text: &str, profile: Profile, base_uri: &str) -> InternalResult<ParseResult> {
    let registry = Registry::default_registry()?;
    ManifestParser::new(registry, ParserConfig::default())?.parse_str(text, profile, base_uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use serde_json::json;

    fn base() -> Url {
        Url::parse("https://pub.example/").unwrap()
    }

    fn minimal() -> Value {
        json!({
            "metadata": {"type": "http://example/type"},
            "links": [{"href": "/m", "rel": ["self"]}]
        })
    }

    #[test]
    fn test_minimal_manifest() {
        let result = parse(&minimal(), Profile::Rwpm, &base());
        assert!(result.is_success(), "{:?}", result.errors);
        let manifest = result.manifest.unwrap();
        assert_eq!(manifest.links.len(), 1);
        assert_eq!(manifest.links[0].href_str(), Some("https://pub.example/m"));
    }

    #[test]
    fn test_syntax_errors_reject_the_document() {
        let result = parse(&json!({"links": {}}), Profile::Rwpm, &base());
        assert!(result.manifest.is_none());
        assert!(!result.errors.is_empty());
        assert_eq!(result.errors.count(ErrorKind::Syntax), result.errors.len());
    }

    #[test]
    fn test_syntax_check_can_be_disabled() {
        let registry = Registry::default_registry().unwrap();
        let parser =
            ManifestParser::new(registry, ParserConfig::default().without_syntax_check()).unwrap();
        let result = parser.parse(&json!({"links": {}}), Profile::Rwpm, &base());
        assert!(result.manifest.is_some());
        assert_eq!(result.errors.count(ErrorKind::Syntax), 0);
        assert!(result.errors.count(ErrorKind::Parsing) >= 2);
    }

    #[test]
    fn test_error_cap() {
        let registry = Registry::default_registry().unwrap();
        let parser =
            ManifestParser::new(registry, ParserConfig::default().with_max_errors(1)).unwrap();
        let document = json!({
            "metadata": {
                "type": "http://example/type",
                "modified": "never",
                "numberOfPages": "ten"
            },
            "links": []
        });
        let result = parser.parse(&document, Profile::Rwpm, &base());
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].path.to_string(), "metadata.modified");
        assert!(result.errors[1].message.starts_with("error limit of 1 reached"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let registry = Registry::default_registry().unwrap();
        assert!(matches!(
            ManifestParser::new(registry, ParserConfig::default().with_max_depth(0)),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ManifestParser::new(registry, ParserConfig::default().with_max_errors(0)),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_parse_str() {
        let result =
            parse_str(&minimal().to_string(), Profile::Rwpm, "https://pub.example/").unwrap();
        assert!(result.is_success());

        assert!(matches!(
            parse_str("{not json", Profile::Rwpm, "https://pub.example/"),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            parse_str("{}", Profile::Rwpm, "relative/base"),
            Err(Error::InvalidBaseUri(_))
        ));
    }
}
