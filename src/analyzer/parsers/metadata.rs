use std::str::FromStr;

use serde_json::Value;
use strum::IntoEnumIterator;

use super::link::links;
use super::FieldReader;
use crate::analyzer::core::{FieldResult, ParseContext, Parser, Partial};
use crate::analyzer::combinators::OneOf;
use crate::analyzer::prelude::*;
use crate::ast::{Contributor, ContributorRole, Metadata, ReadingProgression, Subject};
use crate::error::ValidationError;
use crate::path::FieldPath;

const TYPE_KEYS: [&str; 2] = ["@type", "type"];

/// Parses a `metadata` object.
///
/// `required` lists fields whose absence is an error; `type` covers its
/// `@type` alias. `consumed` lists keys read by a profile-specific builder,
/// which are kept out of the extension bag.
#[derive(Debug, Clone, Default)]
pub struct MetadataParser {
    required: Vec<&'static str>,
    consumed: Vec<&'static str>,
}

impl MetadataParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requiring(mut self, fields: &[&'static str]) -> Self {
        self.required.extend_from_slice(fields);
        self
    }

    pub fn consuming(mut self, fields: &[&'static str]) -> Self {
        self.consumed.extend_from_slice(fields);
        self
    }

    fn is_required(&self, field: &str) -> bool {
        self.required.contains(&field)
    }
}

impl Parser<Partial<Metadata>> for MetadataParser {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<Metadata>> {
        let mut reader = FieldReader::new(input, path, ctx, "metadata")?;
        reader.mark_known(&self.consumed);

        let mut metadata = Metadata::empty(path.clone());
        metadata.type_uri = reader.aliased(&TYPE_KEYS, uri(), self.is_required("type"));

        metadata.title = if self.is_required("title") {
            reader.required("title", localized_string())
        } else {
            reader.optional("title", localized_string())
        };
        metadata.subtitle = reader.optional("subtitle", localized_string());
        metadata.identifier = if self.is_required("identifier") {
            reader.required("identifier", string())
        } else {
            reader.optional("identifier", string())
        };
        metadata.languages = reader
            .optional_partial("language", one_or_many(language_tag()))
            .unwrap_or_default();
        metadata.modified = reader.optional("modified", date_time());
        metadata.published = reader.optional("published", date_time());
        metadata.description = reader.optional("description", string());
        metadata.reading_progression = reader.optional(
            "readingProgression",
            map_res(string(), |value: String, path: &FieldPath| {
                ReadingProgression::from_str(&value).map_err(|_| {
                    ValidationError::parsing(
                        path.clone(),
                        format!(
                            "expected one of ltr, rtl, ttb, btt, auto, found '{}'",
                            value
                        ),
                    )
                })
            }),
        );
        metadata.number_of_pages = reader.optional("numberOfPages", unsigned());
        metadata.duration = reader.optional("duration", non_negative());

        for role in ContributorRole::iter() {
            let parser = one_or_many::<_, Partial<Contributor>>(ContributorParser).flattened();
            if let Some(contributors) = reader.optional_partial(role.as_ref(), parser) {
                if !contributors.is_empty() {
                    metadata.contributors.insert(role, contributors);
                }
            }
        }
        let subjects = one_or_many::<_, Partial<Subject>>(SubjectParser).flattened();
        metadata.subjects = reader
            .optional_partial("subject", subjects)
            .unwrap_or_default();

        metadata.extensions = reader.extensions();
        Ok(reader.finish(metadata))
    }
}

/// A number that must not be negative
pub fn non_negative() -> impl Parser<f64> {
    satisfy(number(), |value: &f64| {
        if *value >= 0.0 {
            Ok(())
        } else {
            Err(format!("expected a non-negative number, found {}", value))
        }
    })
}

/// A name given as a plain string, or the full object form
fn name_or_object<T, P>(named: fn(&str, FieldPath) -> T, object: P) -> OneOf<Partial<T>>
where
    T: 'static,
    P: Parser<Partial<T>> + 'static,
{
    one_of(vec![
        Box::new(map_res(string(), move |name: String, path: &FieldPath| {
            Ok(Partial::ok(named(&name, path.clone())))
        })) as Box<dyn Parser<Partial<T>>>,
        Box::new(object),
    ])
}

/// A contributor given as a name or as an object
#[derive(Debug, Clone, Copy, Default)]
pub struct ContributorParser;

impl Parser<Partial<Contributor>> for ContributorParser {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<Contributor>> {
        name_or_object(Contributor::named, ContributorObject).parse(input, path, ctx)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ContributorObject;

impl Parser<Partial<Contributor>> for ContributorObject {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<Contributor>> {
        let mut reader = FieldReader::new(input, path, ctx, "contributor")?;
        let mut contributor = Contributor::named("", path.clone());
        if let Some(name) = reader.required("name", localized_string()) {
            contributor.name = name;
        }
        contributor.identifier = reader.optional("identifier", string());
        contributor.sort_as = reader.optional("sortAs", string());
        contributor.roles = reader
            .optional_partial("role", one_or_many(string()))
            .unwrap_or_default();
        contributor.position = reader.optional("position", non_negative());
        contributor.links = reader.optional_partial("links", links()).unwrap_or_default();
        contributor.extensions = reader.extensions();
        Ok(reader.finish(contributor))
    }
}

/// A subject given as a name or as an object
#[derive(Debug, Clone, Copy, Default)]
pub struct SubjectParser;

impl Parser<Partial<Subject>> for SubjectParser {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<Subject>> {
        name_or_object(Subject::named, SubjectObject).parse(input, path, ctx)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SubjectObject;

impl Parser<Partial<Subject>> for SubjectObject {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<Subject>> {
        let mut reader = FieldReader::new(input, path, ctx, "subject")?;
        let mut subject = Subject::named("", path.clone());
        if let Some(name) = reader.required("name", localized_string()) {
            subject.name = name;
        }
        subject.sort_as = reader.optional("sortAs", string());
        subject.code = reader.optional("code", string());
        subject.scheme = reader.optional("scheme", uri());
        subject.links = reader.optional_partial("links", links()).unwrap_or_default();
        subject.extensions = reader.extensions();
        Ok(reader.finish(subject))
    }
}
