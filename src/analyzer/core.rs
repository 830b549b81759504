//! # Core Parser Definitions
//!
//! This module defines the field-level parser interface that every combinator
//! and node parser implements.

use serde_json::Value;
use url::Url;

use crate::config::ParserConfig;
use crate::error::ValidationError;
use crate::path::FieldPath;
use crate::registry::{Profile, Registry};

/// Parser trait defines the core field parsing interface.
///
/// A parser looks at one JSON value, located at `path` in the source document,
/// and either produces a typed value or a single [`ValidationError`] naming
/// what was expected. Parsers never abort a whole document: callers decide
/// whether a failure is recorded and replaced by a default.
///
/// # Type Parameters
///
/// * `O` - The output value type
pub trait Parser<O> {
    /// Attempts to convert `input` into `O`.
    ///
    /// # Arguments
    ///
    /// * `input` - The JSON value to convert
    /// * `path` - Location of `input`, attached to any error
    /// * `ctx` - Shared parse state (base URI, registry, configuration)
    fn parse(&self, input: &Value, path: &FieldPath, ctx: &ParseContext<'_>) -> FieldResult<O>;
}

impl<O, P: Parser<O> + ?Sized> Parser<O> for &P {
    fn parse(&self, input: &Value, path: &FieldPath, ctx: &ParseContext<'_>) -> FieldResult<O> {
        (**self).parse(input, path, ctx)
    }
}

impl<O, P: Parser<O> + ?Sized> Parser<O> for Box<P> {
    fn parse(&self, input: &Value, path: &FieldPath, ctx: &ParseContext<'_>) -> FieldResult<O> {
        (**self).parse(input, path, ctx)
    }
}

/// Result type for field parsing operations.
pub type FieldResult<O> = Result<O, ValidationError>;

/// Read-only state shared by every parser during one parse
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub base_uri: &'a Url,
    pub registry: &'a Registry,
    pub profile: Profile,
    pub config: &'a ParserConfig,
    /// Current nesting depth
    pub depth: usize,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        base_uri: &'a Url,
        registry: &'a Registry,
        profile: Profile,
        config: &'a ParserConfig,
    ) -> Self {
        Self {
            base_uri,
            registry,
            profile,
            config,
            depth: 0,
        }
    }

    /// The same context one nesting level deeper
    pub fn nested(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }

    pub fn at_depth(&self, depth: usize) -> Self {
        Self { depth, ..*self }
    }

    pub fn depth_exceeded(&self) -> bool {
        self.depth >= self.config.max_depth
    }

    pub fn depth_error(&self, path: &FieldPath) -> ValidationError {
        ValidationError::parsing(
            path.clone(),
            format!(
                "maximum nesting depth of {} exceeded",
                self.config.max_depth
            ),
        )
    }
}

/// A value built on a best-effort basis, together with the errors recovered
/// while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial<T> {
    pub value: T,
    pub errors: Vec<ValidationError>,
}

impl<T> Partial<T> {
    pub fn new(value: T, errors: Vec<ValidationError>) -> Self {
        Self { value, errors }
    }

    pub fn ok(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Partial<U> {
        Partial {
            value: f(self.value),
            errors: self.errors,
        }
    }

    /// Moves the recovered errors into `sink` and returns the value
    pub fn collect_into(self, sink: &mut Vec<ValidationError>) -> T {
        sink.extend(self.errors);
        self.value
    }
}

impl<T> Partial<Vec<Partial<T>>> {
    /// Merges element errors into the list's errors
    pub fn flatten(self) -> Partial<Vec<T>> {
        let mut errors = self.errors;
        let value = self
            .value
            .into_iter()
            .map(|element| element.collect_into(&mut errors))
            .collect();
        Partial { value, errors }
    }
}

impl<T: Default> Default for Partial<T> {
    fn default() -> Self {
        Self::ok(T::default())
    }
}
