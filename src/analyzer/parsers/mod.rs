//! # Node Parsers
//!
//! Parsers and node builders for the document model:
//!
//! * [`metadata`]: `metadata` objects, contributors and subjects
//! * [`link`]: link objects and link arrays
//! * [`collection`]: the generic collection builder every profile starts from
//! * [`opds2`]: the OPDS 2.0 feed builder
//! * [`odl`]: the ODL license builder
//!
//! Object-shaped parsers read their fields through a [`FieldReader`], which
//! records every field-level failure and keeps the keys it was not asked
//! about as extensions.

pub mod collection;
pub mod link;
pub mod metadata;
pub mod odl;
pub mod opds2;

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::core::{FieldResult, ParseContext, Parser, Partial};
use super::prelude::{optional, required};
use crate::ast::Extensions;
use crate::error::ValidationError;
use crate::path::FieldPath;

/// Reads the fields of one JSON object, accumulating errors.
pub struct FieldReader<'v, 'a> {
    input: &'v Value,
    object: &'v Map<String, Value>,
    path: FieldPath,
    ctx: ParseContext<'a>,
    known: BTreeSet<String>,
    errors: Vec<ValidationError>,
}

impl<'v, 'a> FieldReader<'v, 'a> {
    /// Fails if `input` is not an object; `what` names the expected node
    pub fn new(
        input: &'v Value,
        path: &FieldPath,
        ctx: &ParseContext<'a>,
        what: &str,
    ) -> FieldResult<Self> {
        let object = input.as_object().ok_or_else(|| {
            ValidationError::expected(path.clone(), &format!("an object ({})", what), input)
        })?;
        Ok(Self {
            input,
            object,
            path: path.clone(),
            ctx: *ctx,
            known: BTreeSet::new(),
            errors: Vec::new(),
        })
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn context(&self) -> &ParseContext<'a> {
        &self.ctx
    }

    /// Marks keys as handled so they stay out of the extension bag
    pub fn mark_known(&mut self, keys: &[&str]) {
        self.known.extend(keys.iter().map(|key| key.to_string()));
    }

    /// The raw value of a present, non-null key
    pub fn raw(&mut self, key: &str) -> Option<&'v Value> {
        self.known.insert(key.to_string());
        self.object.get(key).filter(|value| !value.is_null())
    }

    pub fn record(&mut self, error: ValidationError) {
        tracing::trace!("recovered: {}", error);
        self.errors.push(error);
    }

    pub fn recover<O>(&mut self, result: FieldResult<O>) -> Option<O> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.record(error);
                None
            }
        }
    }

    /// Keeps the value and the errors recovered while building it
    pub fn absorb<T>(&mut self, partial: Partial<T>) -> T {
        partial.collect_into(&mut self.errors)
    }

    /// Absence is not an error
    pub fn optional<O>(&mut self, key: &str, parser: impl Parser<O>) -> Option<O> {
        self.known.insert(key.to_string());
        let result = optional(key, parser).parse(self.input, &self.path, &self.ctx);
        self.recover(result).flatten()
    }

    /// Absence is a "missing required field" error
    pub fn required<O>(&mut self, key: &str, parser: impl Parser<O>) -> Option<O> {
        self.known.insert(key.to_string());
        let result = required(key, parser).parse(self.input, &self.path, &self.ctx);
        self.recover(result)
    }

    /// Like [`FieldReader::optional`] for parsers that recover errors themselves
    pub fn optional_partial<T>(
        &mut self,
        key: &str,
        parser: impl Parser<Partial<T>>,
    ) -> Option<T> {
        self.optional(key, parser).map(|partial| self.absorb(partial))
    }

    pub fn required_partial<T>(
        &mut self,
        key: &str,
        parser: impl Parser<Partial<T>>,
    ) -> Option<T> {
        self.required(key, parser).map(|partial| self.absorb(partial))
    }

    /// Reads the first present alias that parses, e.g. `@type` before `type`.
    ///
    /// If every present alias fails, only the first failure is recorded. When
    /// none is present and `required` is set, the error names the last alias.
    pub fn aliased<O>(
        &mut self,
        keys: &[&str],
        parser: impl Parser<O>,
        required: bool,
    ) -> Option<O> {
        self.mark_known(keys);
        let mut first_error = None;
        for key in keys {
            let Some(value) = self.raw(key) else {
                continue;
            };
            match parser.parse(value, &self.path.key(*key), &self.ctx) {
                Ok(parsed) => return Some(parsed),
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }
        match first_error {
            Some(error) => self.record(error),
            None if required => {
                if let Some(key) = keys.last() {
                    self.record(ValidationError::missing_field(self.path.key(*key)));
                }
            }
            None => {}
        }
        None
    }

    /// Keys that were never read, cloned verbatim
    pub fn extensions(&self) -> Extensions {
        self.object
            .iter()
            .filter(|(key, _)| !self.known.contains(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Present keys not yet read, in document order
    pub fn unread_keys(&self) -> Vec<&'v str> {
        self.object
            .keys()
            .filter(|key| !self.known.contains(key.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn finish<T>(self, value: T) -> Partial<T> {
        Partial::new(value, self.errors)
    }
}
