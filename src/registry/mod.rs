//! # Registry: Vocabularies and Dispatch per Profile
//!
//! The registry holds everything that differs between RWPM, OPDS 2.0 and ODL:
//!
//! * **Media types** with [`MediaTypeFlags`] describing what a type denotes
//! * **Link relations** with a [`Cardinality`] at the document root
//! * **Collection roles** per parent node kind (`readingOrder`, `publications`, ...)
//! * **Node builders** per `(Profile, NodeKind)`
//! * **Semantic rules** per profile
//! * **Structural schemas** per profile
//!
//! ## Profile Layering
//!
//! ```text
//! ODL → OPDS2 → RWPM
//! ```
//!
//! A derived profile only registers what it adds or overrides. Every lookup
//! walks the profile's lineage and returns the first hit, so an ODL parse sees
//! RWPM relations without ODL re-declaring them.
//!
//! ## Lifecycle
//!
//! A [`RegistryBuilder`] collects registrations and [`RegistryBuilder::build`]
//! freezes them into a [`Registry`], which only offers lookups. The default
//! registry is built once, lazily, and shared by every parse.

pub mod odl;
pub mod opds2;
pub mod rwpm;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::BitOr;

use lazy_static::lazy_static;
use serde_json::Value;

use crate::ast::{MediaType, NodeKind};
use crate::builder::NodeBuilder;
use crate::semantic::SemanticRule;
use crate::{Error, InternalResult};

/// Named format variant selecting schema, registry entries and rules
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
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Profile {
    Rwpm,
    Opds2,
    Odl,
}

impl Profile {
    /// The profile this one extends
    pub fn parent(self) -> Option<Profile> {
        match self {
            Profile::Rwpm => None,
            Profile::Opds2 => Some(Profile::Rwpm),
            Profile::Odl => Some(Profile::Opds2),
        }
    }

    /// This profile followed by its ancestors, most derived first
    pub fn lineage(self) -> Vec<Profile> {
        let mut lineage = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent() {
            lineage.push(parent);
            current = parent;
        }
        lineage
    }

    pub fn extends(self, other: Profile) -> bool {
        self.lineage().contains(&other)
    }
}

/// What a registered media type denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MediaTypeFlags(u8);

impl MediaTypeFlags {
    pub const NONE: MediaTypeFlags = MediaTypeFlags(0);
    /// A publication manifest
    pub const MANIFEST: MediaTypeFlags = MediaTypeFlags(1);
    /// A catalog feed
    pub const FEED: MediaTypeFlags = MediaTypeFlags(1 << 1);
    /// A license or license status document
    pub const LICENSE: MediaTypeFlags = MediaTypeFlags(1 << 2);
    /// Publication content (text, audio, packaged formats)
    pub const CONTENT: MediaTypeFlags = MediaTypeFlags(1 << 3);
    pub const IMAGE: MediaTypeFlags = MediaTypeFlags(1 << 4);

    pub fn contains(self, other: MediaTypeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: MediaTypeFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for MediaTypeFlags {
    type Output = MediaTypeFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        MediaTypeFlags(self.0 | rhs.0)
    }
}

/// How often a relation may appear among the root links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Cardinality {
    #[strum(serialize = "any number of times")]
    Any,
    #[strum(serialize = "at most once")]
    AtMostOne,
    #[strum(serialize = "exactly once")]
    ExactlyOne,
    #[strum(serialize = "at least once")]
    AtLeastOne,
}

impl Cardinality {
    pub fn allows(self, count: usize) -> bool {
        match self {
            Cardinality::Any => true,
            Cardinality::AtMostOne => count <= 1,
            Cardinality::ExactlyOne => count == 1,
            Cardinality::AtLeastOne => count >= 1,
        }
    }
}

/// A named sub-collection slot of a parent node kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRole {
    pub name: String,
    /// Kind of the collections filed under the role
    pub kind: NodeKind,
    /// Given as a bare array of links
    pub compact: bool,
    /// Given as an array of collections
    pub multiple: bool,
}

impl CollectionRole {
    /// An array-of-links role such as `readingOrder`
    pub fn compact(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::Collection,
            compact: true,
            multiple: false,
        }
    }

    /// A single full collection object
    pub fn single(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            compact: false,
            multiple: false,
        }
    }

    /// An array of full collection objects such as `publications`
    pub fn many(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            compact: false,
            multiple: true,
        }
    }
}

/// A compiled structural schema
pub struct Schema {
    pub(crate) source: Value,
    pub(crate) validator: jsonschema::Validator,
}

impl Schema {
    pub fn compile(profile: Profile, source: Value) -> InternalResult<Self> {
        let validator = jsonschema::validator_for(&source).map_err(|e| Error::InvalidSchema {
            profile,
            message: e.to_string(),
        })?;
        Ok(Self { source, validator })
    }

    pub fn source(&self) -> &Value {
        &self.source
    }

    pub fn validator(&self) -> &jsonschema::Validator {
        &self.validator
    }
}

/// Frozen lookup tables shared by every parse
#[derive(Default)]
pub struct Registry {
    media_types: HashMap<(Profile, String), MediaTypeFlags>,
    relations: HashMap<(Profile, String), Cardinality>,
    roles: HashMap<(Profile, NodeKind, String), CollectionRole>,
    builders: HashMap<(Profile, NodeKind), Box<dyn NodeBuilder>>,
    rules: HashMap<Profile, Vec<Box<dyn SemanticRule>>>,
    schemas: HashMap<Profile, Schema>,
}

lazy_static! {
    static ref DEFAULT_REGISTRY: Result<Registry, String> =
        RegistryBuilder::with_defaults()
            .map(RegistryBuilder::build)
            .map_err(|e| e.to_string());
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The registry with the RWPM, OPDS 2.0 and ODL tables, built on first use
    pub fn default_registry() -> InternalResult<&'static Registry> {
        DEFAULT_REGISTRY
            .as_ref()
            .map_err(|message| Error::DefaultRegistry(message.clone()))
    }

    fn find<T>(&self, profile: Profile, lookup: impl Fn(Profile) -> Option<T>) -> Option<T> {
        profile.lineage().into_iter().find_map(lookup)
    }

    pub fn media_type_flags(
        &self,
        profile: Profile,
        media_type: &MediaType,
    ) -> Option<MediaTypeFlags> {
        let essence = media_type.essence();
        self.find(profile, |p| self.media_types.get(&(p, essence.clone())).copied())
    }

    pub fn relation(&self, profile: Profile, name: &str) -> Option<Cardinality> {
        self.find(profile, |p| self.relations.get(&(p, name.to_string())).copied())
    }

    /// Every relation visible to `profile`, derived entries overriding base ones
    pub fn relations(&self, profile: Profile) -> BTreeMap<String, Cardinality> {
        let mut merged = BTreeMap::new();
        for p in profile.lineage().into_iter().rev() {
            for ((owner, name), cardinality) in &self.relations {
                if *owner == p {
                    merged.insert(name.clone(), *cardinality);
                }
            }
        }
        merged
    }

    pub fn collection_role(
        &self,
        profile: Profile,
        parent: NodeKind,
        name: &str,
    ) -> Option<&CollectionRole> {
        self.find(profile, |p| self.roles.get(&(p, parent, name.to_string())))
    }

    /// Role names visible under `parent`, sorted
    pub fn collection_roles(&self, profile: Profile, parent: NodeKind) -> Vec<&CollectionRole> {
        let mut merged: BTreeMap<&str, &CollectionRole> = BTreeMap::new();
        for p in profile.lineage().into_iter().rev() {
            for ((owner, kind, name), role) in &self.roles {
                if *owner == p && *kind == parent {
                    merged.insert(name.as_str(), role);
                }
            }
        }
        merged.into_values().collect()
    }

    pub fn node_builder(&self, profile: Profile, kind: NodeKind) -> Option<&dyn NodeBuilder> {
        self.find(profile, |p| self.builders.get(&(p, kind)).map(|b| b.as_ref()))
    }

    /// Rules of the profile and its ancestors, base profile first
    pub fn semantic_rules(&self, profile: Profile) -> Vec<&dyn SemanticRule> {
        profile
            .lineage()
            .into_iter()
            .rev()
            .filter_map(|p| self.rules.get(&p))
            .flat_map(|rules| rules.iter().map(|rule| rule.as_ref()))
            .collect()
    }

    pub fn schema(&self, profile: Profile) -> Option<&Schema> {
        self.find(profile, |p| self.schemas.get(&p))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("media_types", &self.media_types.len())
            .field("relations", &self.relations.len())
            .field("roles", &self.roles.len())
            .field("builders", &self.builders.len())
            .field("rules", &self.rules.values().map(Vec::len).sum::<usize>())
            .field("schemas", &self.schemas.len())
            .finish()
    }
}

/// Collects registrations before a [`Registry`] is frozen.
///
/// Registering the same name twice within one profile is an error; a derived
/// profile may register a name its base already has, which overrides it.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder preloaded with the RWPM, OPDS 2.0 and ODL tables
    pub fn with_defaults() -> InternalResult<Self> {
        let mut builder = Self::new();
        rwpm::register(&mut builder)?;
        opds2::register(&mut builder)?;
        odl::register(&mut builder)?;
        Ok(builder)
    }

    pub fn register_media_type(
        &mut self,
        name: &str,
        profile: Profile,
        flags: MediaTypeFlags,
    ) -> InternalResult<&mut Self> {
        let key = (profile, MediaType::new(name).essence());
        if self.registry.media_types.contains_key(&key) {
            return Err(duplicate("media type", name, profile));
        }
        self.registry.media_types.insert(key, flags);
        Ok(self)
    }

    pub fn register_relation(
        &mut self,
        name: &str,
        profile: Profile,
        cardinality: Cardinality,
    ) -> InternalResult<&mut Self> {
        let key = (profile, name.to_string());
        if self.registry.relations.contains_key(&key) {
            return Err(duplicate("relation", name, profile));
        }
        self.registry.relations.insert(key, cardinality);
        Ok(self)
    }

    pub fn register_collection_role(
        &mut self,
        profile: Profile,
        parent: NodeKind,
        role: CollectionRole,
    ) -> InternalResult<&mut Self> {
        let key = (profile, parent, role.name.clone());
        if self.registry.roles.contains_key(&key) {
            return Err(duplicate("collection role", &role.name, profile));
        }
        self.registry.roles.insert(key, role);
        Ok(self)
    }

    /// Registers the builder for collection-like node kinds.
    ///
    /// Metadata and links are built by field parsers and cannot be replaced.
    pub fn register_node_builder(
        &mut self,
        kind: NodeKind,
        profile: Profile,
        builder: impl NodeBuilder + 'static,
    ) -> InternalResult<&mut Self> {
        if !kind.is_collection_like() {
            return Err(Error::UnsupportedNodeKind(kind));
        }
        if self.registry.builders.contains_key(&(profile, kind)) {
            return Err(duplicate("node builder", &kind.to_string(), profile));
        }
        self.registry
            .builders
            .insert((profile, kind), Box::new(builder));
        Ok(self)
    }

    pub fn register_semantic_rule(
        &mut self,
        profile: Profile,
        rule: impl SemanticRule + 'static,
    ) -> InternalResult<&mut Self> {
        let rules = self.registry.rules.entry(profile).or_default();
        if rules.iter().any(|known| known.name() == rule.name()) {
            return Err(duplicate("semantic rule", rule.name(), profile));
        }
        rules.push(Box::new(rule));
        Ok(self)
    }

    /// Compiles and registers the structural schema of a profile
    pub fn register_schema(
        &mut self,
        profile: Profile,
        schema: Value,
    ) -> InternalResult<&mut Self> {
        if self.registry.schemas.contains_key(&profile) {
            return Err(duplicate("schema", &profile.to_string(), profile));
        }
        let schema = Schema::compile(profile, schema)?;
        self.registry.schemas.insert(profile, schema);
        Ok(self)
    }

    /// Replaces the schema of a profile, e.g. with a stricter one
    pub fn replace_schema(&mut self, profile: Profile, schema: Value) -> InternalResult<&mut Self> {
        let schema = Schema::compile(profile, schema)?;
        self.registry.schemas.insert(profile, schema);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        tracing::debug!("registry built: {:?}", self.registry);
        self.registry
    }
}

fn duplicate(what: &'static str, name: &str, profile: Profile) -> Error {
    Error::DuplicateRegistration {
        what,
        name: name.to_string(),
        profile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_profile_names_and_lineage() {
        assert_eq!(Profile::Opds2.to_string(), "OPDS2");
        assert_eq!(Profile::from_str("odl").unwrap(), Profile::Odl);
        assert_eq!(
            Profile::Odl.lineage(),
            vec![Profile::Odl, Profile::Opds2, Profile::Rwpm]
        );
        assert!(Profile::Odl.extends(Profile::Rwpm));
        assert!(!Profile::Rwpm.extends(Profile::Opds2));
    }

    #[test]
    fn test_flags() {
        let flags = MediaTypeFlags::MANIFEST | MediaTypeFlags::FEED;
        assert!(flags.contains(MediaTypeFlags::FEED));
        assert!(!flags.contains(MediaTypeFlags::LICENSE));
        assert!(flags.intersects(MediaTypeFlags::MANIFEST | MediaTypeFlags::LICENSE));
    }

    #[test]
    fn test_cardinality() {
        assert!(Cardinality::ExactlyOne.allows(1));
        assert!(!Cardinality::ExactlyOne.allows(0));
        assert!(!Cardinality::AtMostOne.allows(2));
        assert!(Cardinality::AtLeastOne.allows(3));
        assert_eq!(Cardinality::ExactlyOne.to_string(), "exactly once");
    }

    #[test]
    fn test_lineage_fallback() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_relation("self", Profile::Rwpm, Cardinality::ExactlyOne)
            .unwrap()
            .register_relation("next", Profile::Opds2, Cardinality::AtMostOne)
            .unwrap()
            .register_media_type("application/opds+json", Profile::Opds2, MediaTypeFlags::FEED)
            .unwrap();
        let registry = builder.build();

        assert_eq!(
            registry.relation(Profile::Odl, "self"),
            Some(Cardinality::ExactlyOne)
        );
        assert_eq!(registry.relation(Profile::Rwpm, "next"), None);
        assert_eq!(registry.relations(Profile::Opds2).len(), 2);
        assert_eq!(
            registry.media_type_flags(
                Profile::Odl,
                &MediaType::new("application/opds+json; charset=utf-8")
            ),
            Some(MediaTypeFlags::FEED)
        );
    }

    #[test]
    fn test_duplicate_registration() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_relation("self", Profile::Rwpm, Cardinality::ExactlyOne)
            .unwrap();
        let error = builder
            .register_relation("self", Profile::Rwpm, Cardinality::Any)
            .unwrap_err();
        assert!(matches!(error, Error::DuplicateRegistration { what: "relation", .. }));

        // a derived profile may override
        builder
            .register_relation("self", Profile::Opds2, Cardinality::AtLeastOne)
            .unwrap();
        let registry = builder.build();
        assert_eq!(
            registry.relation(Profile::Opds2, "self"),
            Some(Cardinality::AtLeastOne)
        );
        assert_eq!(
            registry.relation(Profile::Rwpm, "self"),
            Some(Cardinality::ExactlyOne)
        );
    }

    #[test]
    fn test_invalid_schema() {
        let mut builder = RegistryBuilder::new();
        let result = builder.register_schema(Profile::Rwpm, serde_json::json!({"type": 12}));
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));
    }

    #[test]
    fn test_default_registry() {
        let registry = Registry::default_registry().unwrap();
        assert!(registry.schema(Profile::Rwpm).is_some());
        assert!(registry.schema(Profile::Odl).is_some());
        assert!(registry
            .collection_role(Profile::Odl, NodeKind::Publication, "licenses")
            .is_some());
        assert!(registry
            .collection_role(Profile::Opds2, NodeKind::Publication, "licenses")
            .is_none());
        assert!(!registry.semantic_rules(Profile::Odl).is_empty());
    }
}
