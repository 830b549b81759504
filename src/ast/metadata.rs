use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use url::Url;

use super::{Extensions, Link, Node, NodeKind};
use crate::path::FieldPath;

/// Descriptive metadata of a collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// `type` (or `@type`) of the described resource
    pub type_uri: Option<Url>,
    pub title: Option<LocalizedString>,
    pub subtitle: Option<LocalizedString>,
    pub identifier: Option<String>,
    /// BCP 47 language tags
    pub languages: Vec<String>,
    pub modified: Option<DateTime<Utc>>,
    pub published: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub reading_progression: Option<ReadingProgression>,
    pub number_of_pages: Option<u64>,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub contributors: BTreeMap<ContributorRole, Vec<Contributor>>,
    pub subjects: Vec<Subject>,
    pub extensions: Extensions,
    pub path: FieldPath,
}

impl Metadata {
    pub fn empty(path: FieldPath) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Contributors listed under `role`
    pub fn contributors(&self, role: ContributorRole) -> &[Contributor] {
        self.contributors
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn authors(&self) -> &[Contributor] {
        self.contributors(ContributorRole::Author)
    }

    /// Title in its default language
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_ref().and_then(LocalizedString::default_value)
    }
}

impl Node for Metadata {
    fn kind(&self) -> NodeKind {
        NodeKind::Metadata
    }

    fn path(&self) -> &FieldPath {
        &self.path
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

/// A string given either directly or as a map of language tag to translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalizedString {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl LocalizedString {
    /// Value for `language`, falling back to the default value
    pub fn get(&self, language: Option<&str>) -> Option<&str> {
        match (self, language) {
            (LocalizedString::Localized(values), Some(language)) => values
                .get(language)
                .map(String::as_str)
                .or_else(|| self.default_value()),
            _ => self.default_value(),
        }
    }

    /// The plain value, or for a language map the `en` entry and then the first entry
    pub fn default_value(&self) -> Option<&str> {
        match self {
            LocalizedString::Plain(value) => Some(value),
            LocalizedString::Localized(values) => values
                .get("en")
                .or_else(|| values.values().next())
                .map(String::as_str),
        }
    }
}

impl From<&str> for LocalizedString {
    fn from(value: &str) -> Self {
        LocalizedString::Plain(value.to_string())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum ReadingProgression {
    Ltr,
    Rtl,
    Ttb,
    Btt,
    Auto,
}

/// Role under which a contributor is listed in metadata
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum ContributorRole {
    Author,
    Translator,
    Editor,
    Artist,
    Illustrator,
    Letterer,
    Penciler,
    Colorist,
    Inker,
    Narrator,
    Contributor,
    Publisher,
    Imprint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contributor {
    pub name: LocalizedString,
    pub identifier: Option<String>,
    pub sort_as: Option<String>,
    /// Free-form roles given by an object's `role` field
    pub roles: Vec<String>,
    pub position: Option<f64>,
    pub links: Vec<Link>,
    pub extensions: Extensions,
    pub path: FieldPath,
}

impl Contributor {
    pub fn named(name: &str, path: FieldPath) -> Self {
        Self {
            name: name.into(),
            identifier: None,
            sort_as: None,
            roles: Vec::new(),
            position: None,
            links: Vec::new(),
            extensions: Extensions::new(),
            path,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub name: LocalizedString,
    pub sort_as: Option<String>,
    pub code: Option<String>,
    pub scheme: Option<Url>,
    pub links: Vec<Link>,
    pub extensions: Extensions,
    pub path: FieldPath,
}

impl Subject {
    pub fn named(name: &str, path: FieldPath) -> Self {
        Self {
            name: name.into(),
            sort_as: None,
            code: None,
            scheme: None,
            links: Vec::new(),
            extensions: Extensions::new(),
            path,
        }
    }
}
