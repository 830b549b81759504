//! OPDS 2.0 tables, layered on RWPM

use super::rwpm::{embedded_schema, COMPACT_ROLES};
use super::{Cardinality, CollectionRole, MediaTypeFlags, Profile, RegistryBuilder};
use crate::analyzer::parsers::collection::CollectionBuilder;
use crate::analyzer::parsers::opds2::FeedBuilder;
use crate::ast::NodeKind;
use crate::semantic::rules::opds2::{
    FeedHasContent, GroupContent, NavigationTitles, PublicationAcquisition,
};
use crate::InternalResult;

const SCHEMA: &str = include_str!("../../schemas/opds2.schema.json");

pub const FEED_MEDIA_TYPE: &str = "application/opds+json";
pub const PUBLICATION_MEDIA_TYPE: &str = "application/opds-publication+json";

/// Prefix shared by every acquisition relation
pub const ACQUISITION_PREFIX: &str = "http://opds-spec.org/acquisition";

const MEDIA_TYPES: [(&str, MediaTypeFlags); 3] = [
    (FEED_MEDIA_TYPE, MediaTypeFlags::FEED),
    (PUBLICATION_MEDIA_TYPE, MediaTypeFlags::MANIFEST),
    ("application/opds-authentication+json", MediaTypeFlags::NONE),
];

const RELATIONS: [(&str, Cardinality); 12] = [
    ("first", Cardinality::AtMostOne),
    ("last", Cardinality::AtMostOne),
    ("next", Cardinality::AtMostOne),
    ("previous", Cardinality::AtMostOne),
    ("start", Cardinality::AtMostOne),
    ("subsection", Cardinality::Any),
    ("collection", Cardinality::Any),
    ("http://opds-spec.org/acquisition", Cardinality::Any),
    ("http://opds-spec.org/acquisition/open-access", Cardinality::Any),
    ("http://opds-spec.org/acquisition/buy", Cardinality::Any),
    ("http://opds-spec.org/acquisition/sample", Cardinality::Any),
    ("http://opds-spec.org/shelf", Cardinality::AtMostOne),
];

pub(crate) fn register(builder: &mut RegistryBuilder) -> InternalResult<()> {
    let profile = Profile::Opds2;
    for (name, flags) in MEDIA_TYPES {
        builder.register_media_type(name, profile, flags)?;
    }
    for (name, cardinality) in RELATIONS {
        builder.register_relation(name, profile, cardinality)?;
    }

    builder
        .register_collection_role(
            profile,
            NodeKind::Manifest,
            CollectionRole::many("publications", NodeKind::Publication),
        )?
        .register_collection_role(
            profile,
            NodeKind::Manifest,
            CollectionRole::compact("navigation"),
        )?
        .register_collection_role(
            profile,
            NodeKind::Manifest,
            CollectionRole::many("facets", NodeKind::Facet),
        )?
        .register_collection_role(
            profile,
            NodeKind::Manifest,
            CollectionRole::many("groups", NodeKind::Group),
        )?
        .register_collection_role(
            profile,
            NodeKind::Group,
            CollectionRole::many("publications", NodeKind::Publication),
        )?
        .register_collection_role(
            profile,
            NodeKind::Group,
            CollectionRole::compact("navigation"),
        )?
        .register_collection_role(
            profile,
            NodeKind::Publication,
            CollectionRole::compact("images"),
        )?;
    for role in COMPACT_ROLES {
        builder.register_collection_role(
            profile,
            NodeKind::Publication,
            CollectionRole::compact(role),
        )?;
    }

    builder
        .register_node_builder(NodeKind::Manifest, profile, FeedBuilder::new())?
        .register_node_builder(
            NodeKind::Publication,
            profile,
            CollectionBuilder::requiring_metadata(&["title"]),
        )?
        .register_node_builder(
            NodeKind::Group,
            profile,
            CollectionBuilder::requiring_metadata(&["title"]),
        )?
        .register_node_builder(
            NodeKind::Facet,
            profile,
            CollectionBuilder::requiring_metadata(&["title"]),
        )?;

    builder
        .register_semantic_rule(profile, FeedHasContent)?
        .register_semantic_rule(profile, NavigationTitles)?
        .register_semantic_rule(profile, GroupContent)?
        .register_semantic_rule(profile, PublicationAcquisition)?;

    builder.register_schema(profile, embedded_schema(profile, SCHEMA)?)?;
    Ok(())
}
