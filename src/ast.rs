//! # Document Model
//!
//! Typed nodes produced by the AST builder. Every node remembers the
//! [`FieldPath`] it was built from and keeps any field it did not recognize in
//! an [`Extensions`] bag, verbatim.
//!
//! ```text
//! Manifest
//! └── Collection (root)
//!     ├── Metadata
//!     ├── links: Vec<Link>
//!     └── sub_collections: Vec<SubCollection>
//!         └── role → OneOrMany<Collection>   (recursive)
//! ```
//!
//! Nodes are immutable once the parse returns; they are plain data and can be
//! shared across threads.

pub mod collection;
pub mod link;
pub mod metadata;

use std::ops::Deref;

use serde_json::Value;
use url::Url;

pub use collection::{
    Collection, FeedDetails, LicenseDetails, LicenseProtection, LicenseTerms, NodeDetails,
    SubCollection,
};
pub use link::{Href, Link, MediaType, UriTemplate};
pub use metadata::{
    Contributor, ContributorRole, LocalizedString, Metadata, ReadingProgression, Subject,
};

use crate::path::FieldPath;
use crate::registry::Profile;

/// Unrecognized fields of a node, preserved as they appeared in the source
pub type Extensions = serde_json::Map<String, Value>;

/// Tagged category of an AST node.
///
/// The set is closed; profiles attach behaviour to a kind through the
/// registry rather than by adding variants at runtime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString,
)]
pub enum NodeKind {
    Manifest,
    Metadata,
    Link,
    Collection,
    Publication,
    Facet,
    Group,
    License,
}

impl NodeKind {
    /// Kinds that are built as a [`Collection`]
    pub fn is_collection_like(self) -> bool {
        !matches!(self, NodeKind::Metadata | NodeKind::Link)
    }
}

/// Common accessors of every AST node
pub trait Node {
    fn kind(&self) -> NodeKind;

    /// Location of the node in the source document
    fn path(&self) -> &FieldPath;

    fn extensions(&self) -> &Extensions;

    fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions().get(key)
    }
}

/// A value that the source may give either as a single item or as an array
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item),
            OneOrMany::Many(items) => items,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<'a, T> IntoIterator for &'a OneOrMany<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Document root.
///
/// Dereferences to its root [`Collection`], so `manifest.links` and
/// `manifest.metadata` read naturally.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub profile: Profile,
    /// `@context` URIs in source order
    pub context: Vec<Url>,
    pub root: Collection,
}

impl Manifest {
    pub fn new(profile: Profile, context: Vec<Url>, root: Collection) -> Self {
        Self {
            profile,
            context,
            root,
        }
    }

    /// The first link carrying the `self` relation
    pub fn self_link(&self) -> Option<&Link> {
        self.root.links_with_rel("self").next()
    }
}

impl Deref for Manifest {
    type Target = Collection;

    fn deref(&self) -> &Self::Target {
        &self.root
    }
}

impl Node for Manifest {
    fn kind(&self) -> NodeKind {
        NodeKind::Manifest
    }

    fn path(&self) -> &FieldPath {
        &self.root.path
    }

    fn extensions(&self) -> &Extensions {
        &self.root.extensions
    }
}
