use std::collections::BTreeSet;
use std::fmt;

use url::Url;

use super::{Extensions, Node, NodeKind};
use crate::path::FieldPath;

/// A typed link object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Link {
    /// `None` only when the source value could not be parsed
    pub href: Option<Href>,
    pub templated: bool,
    pub media_type: Option<MediaType>,
    pub rels: BTreeSet<String>,
    pub title: Option<String>,
    pub height: Option<u64>,
    pub width: Option<u64>,
    /// Size in bytes
    pub size: Option<u64>,
    pub duration: Option<f64>,
    pub bitrate: Option<f64>,
    pub languages: Vec<String>,
    pub properties: Extensions,
    pub alternates: Vec<Link>,
    pub children: Vec<Link>,
    pub extensions: Extensions,
    pub path: FieldPath,
}

impl Link {
    pub fn new(href: Href, path: FieldPath) -> Self {
        Self {
            templated: matches!(href, Href::Template(_)),
            href: Some(href),
            path,
            ..Default::default()
        }
    }

    pub fn with_rel(mut self, rel: &str) -> Self {
        self.rels.insert(rel.to_string());
        self
    }

    pub fn with_media_type(mut self, media_type: &str) -> Self {
        self.media_type = Some(MediaType::new(media_type));
        self
    }

    pub fn has_rel(&self, rel: &str) -> bool {
        self.rels.contains(rel)
    }

    /// True if any relation starts with `prefix`
    pub fn has_rel_prefix(&self, prefix: &str) -> bool {
        self.rels.iter().any(|rel| rel.starts_with(prefix))
    }

    pub fn href_str(&self) -> Option<&str> {
        self.href.as_ref().map(Href::as_str)
    }
}

impl Node for Link {
    fn kind(&self) -> NodeKind {
        NodeKind::Link
    }

    fn path(&self) -> &FieldPath {
        &self.path
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

/// Target of a link
#[derive(Debug, Clone, PartialEq)]
pub enum Href {
    /// Absolute, or resolved against the base URI
    Uri(Url),
    /// Relative reference kept as written
    Reference(String),
    /// RFC 6570 template, never resolved
    Template(UriTemplate),
}

impl Href {
    pub fn as_str(&self) -> &str {
        match self {
            Href::Uri(url) => url.as_str(),
            Href::Reference(reference) => reference,
            Href::Template(template) => &template.template,
        }
    }

    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Href::Uri(url) => Some(url),
            _ => None,
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, Href::Template(_))
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A URI template and the variable names its expressions reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    pub template: String,
    pub variables: Vec<String>,
    /// Number of `{...}` expressions
    pub expressions: usize,
}

impl UriTemplate {
    pub fn has_expressions(&self) -> bool {
        self.expressions > 0
    }
}

/// A media type string such as `application/opds+json; charset=utf-8`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaType(String);

impl MediaType {
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `type/subtype` in lower case, without parameters
    pub fn essence(&self) -> String {
        self.0
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// `key=value` parameters, keys lower-cased
    pub fn parameters(&self) -> Vec<(String, String)> {
        self.0
            .split(';')
            .skip(1)
            .filter_map(|parameter| {
                let (key, value) = parameter.split_once('=')?;
                Some((
                    key.trim().to_ascii_lowercase(),
                    value.trim().trim_matches('"').to_string(),
                ))
            })
            .collect()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
