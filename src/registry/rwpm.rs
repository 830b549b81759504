//! Readium Web Publication Manifest tables

use serde_json::Value;

use super::{Cardinality, CollectionRole, MediaTypeFlags, Profile, RegistryBuilder};
use crate::analyzer::parsers::collection::CollectionBuilder;
use crate::ast::NodeKind;
use crate::semantic::rules::rwpm::{
    IdentifierIsUri, ReadingOrderTypes, RelationCardinality, SelfLinkType, TemplatedHref,
    UniqueRoles,
};
use crate::{Error, InternalResult};

const SCHEMA: &str = include_str!("../../schemas/rwpm.schema.json");

pub const MANIFEST_MEDIA_TYPE: &str = "application/webpub+json";

/// Roles given as bare arrays of links under the manifest root
pub const COMPACT_ROLES: [&str; 10] = [
    "readingOrder",
    "resources",
    "toc",
    "page-list",
    "landmarks",
    "loa",
    "loi",
    "lot",
    "lov",
    "guided",
];

const MEDIA_TYPES: [(&str, MediaTypeFlags); 12] = [
    (MANIFEST_MEDIA_TYPE, MediaTypeFlags::MANIFEST),
    ("application/audiobook+json", MediaTypeFlags::MANIFEST),
    ("application/divina+json", MediaTypeFlags::MANIFEST),
    ("application/epub+zip", MediaTypeFlags::CONTENT),
    ("application/pdf", MediaTypeFlags::CONTENT),
    ("application/xhtml+xml", MediaTypeFlags::CONTENT),
    ("text/html", MediaTypeFlags::CONTENT),
    ("audio/mpeg", MediaTypeFlags::CONTENT),
    ("image/jpeg", MediaTypeFlags::IMAGE),
    ("image/png", MediaTypeFlags::IMAGE),
    ("image/gif", MediaTypeFlags::IMAGE),
    ("image/webp", MediaTypeFlags::IMAGE),
];

const RELATIONS: [(&str, Cardinality); 8] = [
    ("self", Cardinality::ExactlyOne),
    ("alternate", Cardinality::Any),
    ("cover", Cardinality::Any),
    ("manifest", Cardinality::Any),
    ("search", Cardinality::Any),
    ("contents", Cardinality::Any),
    ("license", Cardinality::Any),
    ("related", Cardinality::Any),
];

pub(crate) fn register(builder: &mut RegistryBuilder) -> InternalResult<()> {
    let profile = Profile::Rwpm;
    for (name, flags) in MEDIA_TYPES {
        builder.register_media_type(name, profile, flags)?;
    }
    for (name, cardinality) in RELATIONS {
        builder.register_relation(name, profile, cardinality)?;
    }
    for role in COMPACT_ROLES {
        builder.register_collection_role(
            profile,
            NodeKind::Manifest,
            CollectionRole::compact(role),
        )?;
    }

    builder
        .register_node_builder(
            NodeKind::Manifest,
            profile,
            CollectionBuilder::requiring_metadata(&["type"]),
        )?
        .register_node_builder(NodeKind::Collection, profile, CollectionBuilder::new())?;

    builder
        .register_semantic_rule(profile, RelationCardinality)?
        .register_semantic_rule(profile, UniqueRoles)?
        .register_semantic_rule(profile, TemplatedHref)?
        .register_semantic_rule(profile, SelfLinkType)?
        .register_semantic_rule(profile, ReadingOrderTypes)?
        .register_semantic_rule(profile, IdentifierIsUri)?;

    builder.register_schema(profile, embedded_schema(profile, SCHEMA)?)?;
    Ok(())
}

/// Parses a schema compiled into the crate
pub(crate) fn embedded_schema(profile: Profile, source: &str) -> InternalResult<Value> {
    serde_json::from_str(source).map_err(|e| Error::InvalidSchema {
        profile,
        message: e.to_string(),
    })
}
