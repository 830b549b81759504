use chrono::{DateTime, Utc};

use super::{Extensions, Link, MediaType, Metadata, Node, NodeKind, OneOrMany};
use crate::path::FieldPath;

/// A node with metadata, links and named sub-collections.
///
/// Manifests, feeds, publications, groups, facets and licenses are all
/// collections distinguished by [`NodeKind`] and [`NodeDetails`].
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub kind: NodeKind,
    pub metadata: Metadata,
    pub links: Vec<Link>,
    pub sub_collections: Vec<SubCollection>,
    pub details: NodeDetails,
    pub extensions: Extensions,
    pub path: FieldPath,
}

impl Collection {
    pub fn new(kind: NodeKind, path: FieldPath) -> Self {
        Self {
            kind,
            metadata: Metadata::empty(path.key("metadata")),
            links: Vec::new(),
            sub_collections: Vec::new(),
            details: NodeDetails::None,
            extensions: Extensions::new(),
            path,
        }
    }

    /// A collection given in compact form: just an array of links
    pub fn compact(links: Vec<Link>, path: FieldPath) -> Self {
        let mut collection = Self::new(NodeKind::Collection, path);
        collection.links = links;
        collection
    }

    pub fn links_with_rel<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |link| link.has_rel(rel))
    }

    pub fn sub_collection(&self, role: &str) -> Option<&SubCollection> {
        self.sub_collections.iter().find(|sub| sub.role == role)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.sub_collection(role).is_some()
    }

    /// Collections filed under `role`, empty if the role is absent
    pub fn role_collections<'a>(&'a self, role: &str) -> impl Iterator<Item = &'a Collection> + 'a {
        self.sub_collection(role)
            .into_iter()
            .flat_map(|sub| sub.collections.iter())
    }

    /// Links of every collection filed under `role`
    pub fn role_links<'a>(&'a self, role: &str) -> impl Iterator<Item = &'a Link> + 'a {
        self.role_collections(role)
            .flat_map(|collection| collection.links.iter())
    }

    pub fn reading_order(&self) -> impl Iterator<Item = &Link> {
        self.role_links("readingOrder")
    }

    pub fn resources(&self) -> impl Iterator<Item = &Link> {
        self.role_links("resources")
    }

    pub fn publications(&self) -> impl Iterator<Item = &Collection> {
        self.role_collections("publications")
    }

    pub fn feed_details(&self) -> Option<&FeedDetails> {
        match &self.details {
            NodeDetails::Feed(details) => Some(details),
            _ => None,
        }
    }

    pub fn license_details(&self) -> Option<&LicenseDetails> {
        match &self.details {
            NodeDetails::License(details) => Some(details),
            _ => None,
        }
    }
}

impl Node for Collection {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn path(&self) -> &FieldPath {
        &self.path
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

/// A role entry of a parent collection
#[derive(Debug, Clone, PartialEq)]
pub struct SubCollection {
    /// Case-sensitive role name, e.g. `readingOrder`
    pub role: String,
    pub collections: OneOrMany<Collection>,
    pub path: FieldPath,
}

impl SubCollection {
    pub fn new(role: &str, collections: OneOrMany<Collection>, path: FieldPath) -> Self {
        Self {
            role: role.to_string(),
            collections,
            path,
        }
    }
}

/// Profile-specific typed data attached to a collection
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NodeDetails {
    #[default]
    None,
    Feed(FeedDetails),
    License(LicenseDetails),
}

/// Paging information of an OPDS feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDetails {
    pub number_of_items: Option<u64>,
    pub items_per_page: Option<u64>,
    pub current_page: Option<u64>,
}

/// Metadata of an ODL license
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicenseDetails {
    pub identifier: Option<String>,
    pub formats: Vec<MediaType>,
    pub created: Option<DateTime<Utc>>,
    pub terms: Option<LicenseTerms>,
    pub protection: Option<LicenseProtection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseTerms {
    pub checkouts: Option<u64>,
    pub expires: Option<DateTime<Utc>>,
    pub concurrency: Option<u64>,
    /// Loan length in seconds
    pub length: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseProtection {
    pub formats: Vec<MediaType>,
    pub devices: Option<u64>,
    pub copy: Option<bool>,
    pub print: Option<bool>,
    pub tts: Option<bool>,
}
