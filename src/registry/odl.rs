//! ODL tables, layered on OPDS 2.0

use super::rwpm::embedded_schema;
use super::{Cardinality, CollectionRole, MediaTypeFlags, Profile, RegistryBuilder};
use crate::analyzer::parsers::odl::LicenseBuilder;
use crate::ast::NodeKind;
use crate::semantic::rules::odl::{LicenseLinks, PublicationLicenses};
use crate::InternalResult;

const SCHEMA: &str = include_str!("../../schemas/odl.schema.json");

/// License Info Document
pub const LICENSE_INFO_MEDIA_TYPE: &str = "application/vnd.odl.info+json";
pub const BORROW_RELATION: &str = "http://opds-spec.org/acquisition/borrow";

const MEDIA_TYPES: [(&str, MediaTypeFlags); 3] = [
    (LICENSE_INFO_MEDIA_TYPE, MediaTypeFlags::LICENSE),
    (
        "application/vnd.readium.license.status.v1.0+json",
        MediaTypeFlags::LICENSE,
    ),
    (
        "application/vnd.readium.lcp.license.v1.0+json",
        MediaTypeFlags::LICENSE,
    ),
];

pub(crate) fn register(builder: &mut RegistryBuilder) -> InternalResult<()> {
    let profile = Profile::Odl;
    for (name, flags) in MEDIA_TYPES {
        builder.register_media_type(name, profile, flags)?;
    }
    builder
        .register_relation(BORROW_RELATION, profile, Cardinality::Any)?
        .register_relation("status", profile, Cardinality::Any)?;

    builder.register_collection_role(
        profile,
        NodeKind::Publication,
        CollectionRole::many("licenses", NodeKind::License),
    )?;
    builder.register_node_builder(NodeKind::License, profile, LicenseBuilder::new())?;

    builder
        .register_semantic_rule(profile, PublicationLicenses)?
        .register_semantic_rule(profile, LicenseLinks)?;

    builder.register_schema(profile, embedded_schema(profile, SCHEMA)?)?;
    Ok(())
}
