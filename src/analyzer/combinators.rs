//! # Field Combinators
//!
//! Building blocks that convert raw JSON values into typed fields. Small
//! parsers are composed into node parsers; every failure carries the
//! [`FieldPath`] of the offending value.
//!
//! ## Combinator Types
//!
//! * **Primitive Parsers**: `Str`, `Number`, `UnsignedInteger`, `Boolean`,
//!   `Uri`, `UriOrTemplate`, `MediaTypeParser`, `LanguageTag`, `DateTimeParser`
//! * **Structural Combinators**: `Required`, `OptionalField`
//! * **Repetition Combinators**: `ArrayOf`, `OneOrManyOf` (element-wise, never all-or-nothing)
//! * **Alternative Combinators**: `OneOf`
//! * **Transformation Combinators**: `Map`, `MapRes`, `Satisfy`, `Flatten`

use std::collections::BTreeMap;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde_json::Value;
use url::Url;

use super::core::{FieldResult, ParseContext, Parser, Partial};
use super::primitives;
use super::uri_template::parse_uri_template;
use crate::ast::{Href, LocalizedString, MediaType};
use crate::error::ValidationError;
use crate::path::FieldPath;

/// Str: Accepts any JSON string
#[derive(Clone, Copy, Default)]
pub struct Str;

impl Parser<String> for Str {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        _ctx: &ParseContext<'_>,
    ) -> FieldResult<String> {
        input
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ValidationError::expected(path.clone(), "a string", input))
    }
}

/// Number: Accepts any JSON number as `f64`
#[derive(Clone, Copy, Default)]
pub struct Number;

impl Parser<f64> for Number {
    fn parse(&self, input: &Value, path: &FieldPath, _ctx: &ParseContext<'_>) -> FieldResult<f64> {
        input
            .as_f64()
            .ok_or_else(|| ValidationError::expected(path.clone(), "a number", input))
    }
}

/// UnsignedInteger: Accepts non-negative integral JSON numbers
#[derive(Clone, Copy, Default)]
pub struct UnsignedInteger;

impl Parser<u64> for UnsignedInteger {
    fn parse(&self, input: &Value, path: &FieldPath, _ctx: &ParseContext<'_>) -> FieldResult<u64> {
        input.as_u64().ok_or_else(|| {
            if input.is_number() {
                ValidationError::parsing(
                    path.clone(),
                    format!("expected a non-negative integer, found {}", input),
                )
            } else {
                ValidationError::expected(path.clone(), "a non-negative integer", input)
            }
        })
    }
}

#[derive(Clone, Copy, Default)]
pub struct Boolean;

impl Parser<bool> for Boolean {
    fn parse(&self, input: &Value, path: &FieldPath, _ctx: &ParseContext<'_>) -> FieldResult<bool> {
        input
            .as_bool()
            .ok_or_else(|| ValidationError::expected(path.clone(), "a boolean", input))
    }
}

/// Uri: Accepts a string holding an absolute URI
#[derive(Clone, Copy, Default)]
pub struct Uri;

impl Parser<Url> for Uri {
    fn parse(&self, input: &Value, path: &FieldPath, _ctx: &ParseContext<'_>) -> FieldResult<Url> {
        let value = input.as_str().ok_or_else(|| {
            ValidationError::expected(path.clone(), "a string (absolute URI)", input)
        })?;
        Url::parse(value).map_err(|e| {
            ValidationError::parsing(
                path.clone(),
                format!("expected an absolute URI, found '{}' ({})", value, e),
            )
        })
    }
}

/// UriOrTemplate: Parses an `href`
///
/// With `templated` set, the value must be a well-formed URI template and is
/// kept unresolved. Otherwise the value is a URI reference, resolved against
/// the base URI when the configuration asks for it.
#[derive(Clone, Copy, Default)]
pub struct UriOrTemplate {
    templated: bool,
}

impl UriOrTemplate {
    pub fn new(templated: bool) -> Self {
        Self { templated }
    }
}

impl Parser<Href> for UriOrTemplate {
    fn parse(&self, input: &Value, path: &FieldPath, ctx: &ParseContext<'_>) -> FieldResult<Href> {
        let value = input
            .as_str()
            .ok_or_else(|| ValidationError::expected(path.clone(), "a string (URI)", input))?;
        if value.trim().is_empty() {
            return Err(ValidationError::parsing(
                path.clone(),
                "expected a non-empty URI, found an empty string",
            ));
        }
        if self.templated {
            return parse_uri_template(value)
                .map(Href::Template)
                .map_err(|message| ValidationError::parsing(path.clone(), message));
        }
        primitives::resolve_href(value, ctx.base_uri, ctx.config.resolve_relative_hrefs).map_err(
            |reason| {
                ValidationError::parsing(
                    path.clone(),
                    format!("expected a URI, found '{}' ({})", value, reason),
                )
            },
        )
    }
}

/// MediaTypeParser: Accepts a syntactically valid media type.
///
/// Types unknown to the registry are passed through unchanged.
#[derive(Clone, Copy, Default)]
pub struct MediaTypeParser;

impl Parser<MediaType> for MediaTypeParser {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<MediaType> {
        let value = input.as_str().ok_or_else(|| {
            ValidationError::expected(path.clone(), "a string (media type)", input)
        })?;
        if !primitives::is_media_type(value) {
            return Err(ValidationError::parsing(
                path.clone(),
                format!("expected a media type (type/subtype), found '{}'", value),
            ));
        }
        let media_type = MediaType::new(value);
        if ctx.registry.media_type_flags(ctx.profile, &media_type).is_none() {
            tracing::trace!("unregistered media type {} at {}", media_type, path);
        }
        Ok(media_type)
    }
}

#[derive(Clone, Copy, Default)]
pub struct LanguageTag;

impl Parser<String> for LanguageTag {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        _ctx: &ParseContext<'_>,
    ) -> FieldResult<String> {
        let value = input.as_str().ok_or_else(|| {
            ValidationError::expected(path.clone(), "a string (language tag)", input)
        })?;
        if primitives::is_language_tag(value) {
            Ok(value.to_string())
        } else {
            Err(ValidationError::parsing(
                path.clone(),
                format!("expected a BCP 47 language tag, found '{}'", value),
            ))
        }
    }
}

#[derive(Clone, Copy, Default)]
pub struct DateTimeParser;

impl Parser<DateTime<Utc>> for DateTimeParser {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        _ctx: &ParseContext<'_>,
    ) -> FieldResult<DateTime<Utc>> {
        let value = input
            .as_str()
            .ok_or_else(|| ValidationError::expected(path.clone(), "a string (date-time)", input))?;
        primitives::parse_date_time(value).ok_or_else(|| {
            ValidationError::parsing(
                path.clone(),
                format!("expected an RFC 3339 date-time, found '{}'", value),
            )
        })
    }
}

/// LanguageMap: A plain string or an object mapping language tags to strings
#[derive(Clone, Copy, Default)]
pub struct LanguageMap;

impl Parser<LocalizedString> for LanguageMap {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        _ctx: &ParseContext<'_>,
    ) -> FieldResult<LocalizedString> {
        match input {
            Value::String(value) => Ok(LocalizedString::Plain(value.clone())),
            Value::Object(entries) if !entries.is_empty() => {
                let mut values = BTreeMap::new();
                for (language, value) in entries {
                    let entry_path = path.key(language.as_str());
                    if !primitives::is_language_tag(language) {
                        return Err(ValidationError::parsing(
                            entry_path,
                            format!("expected a BCP 47 language tag as key, found '{}'", language),
                        ));
                    }
                    let value = value
                        .as_str()
                        .ok_or_else(|| ValidationError::expected(entry_path, "a string", value))?;
                    values.insert(language.clone(), value.to_string());
                }
                Ok(LocalizedString::Localized(values))
            }
            _ => Err(ValidationError::expected(
                path.clone(),
                "a string or a language map",
                input,
            )),
        }
    }
}

/// ArrayOf: Applies a parser to every element of an array
///
/// Failing elements are dropped and reported one error each; successfully
/// parsed siblings are always kept. A non-array input is a single error.
#[derive(Clone)]
pub struct ArrayOf<P, O> {
    parser: P,
    _phantom: PhantomData<O>,
}

impl<P, O> ArrayOf<P, O> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<P, O> ArrayOf<P, O>
where
    P: Parser<O>,
{
    fn parse_elements(
        &self,
        elements: &[Value],
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> Partial<Vec<O>> {
        let mut values = Vec::with_capacity(elements.len());
        let mut errors = Vec::new();
        for (index, element) in elements.iter().enumerate() {
            match self.parser.parse(element, &path.index(index), ctx) {
                Ok(value) => values.push(value),
                Err(error) => errors.push(error),
            }
        }
        Partial::new(values, errors)
    }
}

impl<P, O> Parser<Partial<Vec<O>>> for ArrayOf<P, O>
where
    P: Parser<O>,
{
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<Vec<O>>> {
        match input {
            Value::Array(elements) => Ok(self.parse_elements(elements, path, ctx)),
            _ => Err(ValidationError::expected(path.clone(), "an array", input)),
        }
    }
}

/// OneOrManyOf: Like [`ArrayOf`], but a single non-array value is accepted as a one-element list
#[derive(Clone)]
pub struct OneOrManyOf<P, O> {
    inner: ArrayOf<P, O>,
}

impl<P, O> OneOrManyOf<P, O> {
    pub fn new(parser: P) -> Self {
        Self {
            inner: ArrayOf::new(parser),
        }
    }
}

impl<P, O> Parser<Partial<Vec<O>>> for OneOrManyOf<P, O>
where
    P: Parser<O>,
{
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<Vec<O>>> {
        match input {
            Value::Array(elements) => Ok(self.inner.parse_elements(elements, path, ctx)),
            _ => self
                .inner
                .parser
                .parse(input, path, ctx)
                .map(|value| Partial::ok(vec![value])),
        }
    }
}

impl<P, T> ArrayOf<P, Partial<T>> {
    /// Merges the errors recovered inside each element into the list's errors
    pub fn flattened(self) -> Flatten<Self, T> {
        Flatten::new(self)
    }
}

impl<P, T> OneOrManyOf<P, Partial<T>> {
    pub fn flattened(self) -> Flatten<Self, T> {
        Flatten::new(self)
    }
}

/// Flatten: Turns a list of partial values into one partial list
#[derive(Clone)]
pub struct Flatten<P, T> {
    parser: P,
    _phantom: PhantomData<T>,
}

impl<P, T> Flatten<P, T> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<P, T> Parser<Partial<Vec<T>>> for Flatten<P, T>
where
    P: Parser<Partial<Vec<Partial<T>>>>,
{
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<Vec<T>>> {
        self.parser.parse(input, path, ctx).map(Partial::flatten)
    }
}

/// OneOf: Tries multiple parsers and succeeds with the first successful one
///
/// If every branch fails, the error lists each branch's expectation in order
/// and keeps the branch errors as causes.
pub struct OneOf<O> {
    parsers: Vec<Box<dyn Parser<O>>>,
}

impl<O> OneOf<O> {
    pub fn new(parsers: Vec<Box<dyn Parser<O>>>) -> Self {
        Self { parsers }
    }
}

impl<O> Parser<O> for OneOf<O> {
    fn parse(&self, input: &Value, path: &FieldPath, ctx: &ParseContext<'_>) -> FieldResult<O> {
        let mut causes = Vec::with_capacity(self.parsers.len());
        for parser in &self.parsers {
            match parser.parse(input, path, ctx) {
                Ok(value) => return Ok(value),
                Err(error) => causes.push(error),
            }
        }
        let branches = causes
            .iter()
            .map(|cause| cause.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Err(ValidationError::parsing(
            path.clone(),
            format!("no alternative matched: {}", branches),
        )
        .with_causes(causes))
    }
}

/// Map: Transforms the output of a parser using a function
#[derive(Clone)]
pub struct Map<P, F, A, B> {
    parser: P,
    f: F,
    _phantom: PhantomData<(A, B)>,
}

impl<P, F, A, B> Map<P, F, A, B> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<A, B, P, F> Parser<B> for Map<P, F, A, B>
where
    P: Parser<A>,
    F: Fn(A) -> B,
{
    fn parse(&self, input: &Value, path: &FieldPath, ctx: &ParseContext<'_>) -> FieldResult<B> {
        self.parser.parse(input, path, ctx).map(&self.f)
    }
}

/// MapRes: Transforms the output of a parser with a fallible function
#[derive(Clone)]
pub struct MapRes<P, F, A, B> {
    parser: P,
    f: F,
    _phantom: PhantomData<(A, B)>,
}

impl<P, F, A, B> MapRes<P, F, A, B> {
    pub fn new(parser: P, f: F) -> Self {
        Self {
            parser,
            f,
            _phantom: PhantomData,
        }
    }
}

impl<A, B, P, F> Parser<B> for MapRes<P, F, A, B>
where
    P: Parser<A>,
    F: Fn(A, &FieldPath) -> FieldResult<B>,
{
    fn parse(&self, input: &Value, path: &FieldPath, ctx: &ParseContext<'_>) -> FieldResult<B> {
        let value = self.parser.parse(input, path, ctx)?;
        (self.f)(value, path)
    }
}

/// Satisfy: Succeeds only if the parsed value passes a check
///
/// The check returns the message of the error to report.
#[derive(Clone)]
pub struct Satisfy<P, F, O> {
    parser: P,
    check: F,
    _phantom: PhantomData<O>,
}

impl<P, F, O> Satisfy<P, F, O> {
    pub fn new(parser: P, check: F) -> Self {
        Self {
            parser,
            check,
            _phantom: PhantomData,
        }
    }
}

impl<P, F, O> Parser<O> for Satisfy<P, F, O>
where
    P: Parser<O>,
    F: Fn(&O) -> Result<(), String>,
{
    fn parse(&self, input: &Value, path: &FieldPath, ctx: &ParseContext<'_>) -> FieldResult<O> {
        let value = self.parser.parse(input, path, ctx)?;
        (self.check)(&value).map_err(|message| ValidationError::parsing(path.clone(), message))?;
        Ok(value)
    }
}

fn object_field<'v>(
    input: &'v Value,
    key: &str,
    path: &FieldPath,
) -> FieldResult<Option<&'v Value>> {
    let object = input
        .as_object()
        .ok_or_else(|| ValidationError::expected(path.clone(), "an object", input))?;
    Ok(object.get(key).filter(|value| !value.is_null()))
}

/// Required: Extracts a mandatory key of an object and parses its value
///
/// An absent key, or one holding `null`, is a "missing required field" error.
#[derive(Clone)]
pub struct Required<'k, P, O> {
    key: &'k str,
    parser: P,
    _phantom: PhantomData<O>,
}

impl<'k, P, O> Required<'k, P, O> {
    pub fn new(key: &'k str, parser: P) -> Self {
        Self {
            key,
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<P, O> Parser<O> for Required<'_, P, O>
where
    P: Parser<O>,
{
    fn parse(&self, input: &Value, path: &FieldPath, ctx: &ParseContext<'_>) -> FieldResult<O> {
        let field_path = path.key(self.key);
        match object_field(input, self.key, path)? {
            Some(value) => self.parser.parse(value, &field_path, ctx),
            None => Err(ValidationError::missing_field(field_path)),
        }
    }
}

/// OptionalField: Extracts an optional key of an object
///
/// Absence is `None`, never an error; a present but malformed value is.
#[derive(Clone)]
pub struct OptionalField<'k, P, O> {
    key: &'k str,
    parser: P,
    _phantom: PhantomData<O>,
}

impl<'k, P, O> OptionalField<'k, P, O> {
    pub fn new(key: &'k str, parser: P) -> Self {
        Self {
            key,
            parser,
            _phantom: PhantomData,
        }
    }
}

impl<P, O> Parser<Option<O>> for OptionalField<'_, P, O>
where
    P: Parser<O>,
{
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Option<O>> {
        match object_field(input, self.key, path)? {
            Some(value) => self.parser.parse(value, &path.key(self.key), ctx).map(Some),
            None => Ok(None),
        }
    }
}
