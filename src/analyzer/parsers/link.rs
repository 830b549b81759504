use std::collections::BTreeSet;

use serde_json::Value;

use super::metadata::non_negative;
use super::FieldReader;
use crate::analyzer::core::{FieldResult, ParseContext, Parser, Partial};
use crate::analyzer::prelude::*;
use crate::ast::{Extensions, Link};
use crate::error::ValidationError;
use crate::path::FieldPath;

/// Parses one link object.
///
/// A link is kept even when some of its fields fail; a bad `href` leaves
/// `href` empty and records the error. Nested `alternate` and `children`
/// arrays count toward the maximum nesting depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkParser;

impl Parser<Partial<Link>> for LinkParser {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<Link>> {
        let mut reader = FieldReader::new(input, path, ctx, "link")?;
        let mut link = Link {
            path: path.clone(),
            ..Default::default()
        };

        link.templated = reader.optional("templated", boolean()).unwrap_or(false);
        link.href = reader.required("href", uri_or_template(link.templated));
        link.media_type = reader.optional("type", media_type());
        link.rels = reader
            .optional_partial("rel", one_or_many(non_empty_string()))
            .map(|rels| rels.into_iter().collect::<BTreeSet<_>>())
            .unwrap_or_default();
        link.title = reader.optional("title", string());
        link.height = reader.optional("height", unsigned());
        link.width = reader.optional("width", unsigned());
        link.size = reader.optional("size", unsigned());
        link.duration = reader.optional("duration", non_negative());
        link.bitrate = reader.optional("bitrate", non_negative());
        link.languages = reader
            .optional_partial("language", one_or_many(language_tag()))
            .unwrap_or_default();
        link.properties = reader.optional("properties", Properties).unwrap_or_default();

        let nested = ctx.nested();
        for key in ["alternate", "children"] {
            let Some(value) = reader.raw(key) else {
                continue;
            };
            let nested_path = path.key(key);
            let result = if nested.depth_exceeded() {
                tracing::warn!("link nesting depth exceeded at {}", nested_path);
                Err(nested.depth_error(&nested_path))
            } else {
                links().parse(value, &nested_path, &nested)
            };
            if let Some(partial) = reader.recover(result) {
                let nested_links = reader.absorb(partial);
                match key {
                    "alternate" => link.alternates = nested_links,
                    _ => link.children = nested_links,
                }
            }
        }

        link.extensions = reader.extensions();
        Ok(reader.finish(link))
    }
}

/// An array of links, keeping every link that could be read
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkList;

impl Parser<Partial<Vec<Link>>> for LinkList {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<Vec<Link>>> {
        array_of::<_, Partial<Link>>(link()).flattened()
            .parse(input, path, ctx)
    }
}

pub fn link() -> LinkParser {
    LinkParser
}

pub fn links() -> LinkList {
    LinkList
}

/// The open `properties` object of a link
#[derive(Debug, Clone, Copy, Default)]
pub struct Properties;

impl Parser<Extensions> for Properties {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        _ctx: &ParseContext<'_>,
    ) -> FieldResult<Extensions> {
        input
            .as_object()
            .cloned()
            .ok_or_else(|| ValidationError::expected(path.clone(), "an object", input))
    }
}

fn non_empty_string() -> impl Parser<String> {
    satisfy(string(), |value: &String| {
        if value.trim().is_empty() {
            Err("expected a non-empty string".to_string())
        } else {
            Ok(())
        }
    })
}
