mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use webpub_manifest::ast::Collection;
use webpub_manifest::semantic::{CollectionSite, SemanticContext, SemanticRule};
use webpub_manifest::{
    Cardinality, Error, ErrorKind, ManifestParser, MediaTypeFlags, NodeKind, ParserConfig,
    Profile, Registry, RegistryBuilder,
};

const PINNED: &str = "http://example.org/rel/pinned";

fn minimal() -> serde_json::Value {
    json!({
        "metadata": {"type": "http://example/type", "title": "Plain"},
        "links": [{"href": "/m", "rel": "self"}]
    })
}

fn parse_with(
    registry: &Registry,
    document: &serde_json::Value,
    profile: Profile,
) -> webpub_manifest::ParseResult {
    ManifestParser::new(registry, ParserConfig::default())
        .unwrap()
        .parse(document, profile, &base())
}

/// Every root collection needs a title
struct RootTitle;

impl SemanticRule for RootTitle {
    fn name(&self) -> &str {
        "root-title"
    }

    fn check_collection(
        &self,
        collection: &Collection,
        site: &CollectionSite<'_>,
        ctx: &mut SemanticContext<'_>,
    ) {
        if site.is_root() && collection.metadata.title_text() != Some("Required") {
            ctx.add_error(collection.metadata.path.key("title"), "title must be 'Required'");
        }
    }
}

#[test]
fn test_custom_relation_cardinality() {
    let mut builder = RegistryBuilder::with_defaults().unwrap();
    builder
        .register_relation(PINNED, Profile::Rwpm, Cardinality::AtLeastOne)
        .unwrap();
    let registry = builder.build();

    let result = parse_with(&registry, &minimal(), Profile::Rwpm);
    assert_eq!(
        errors_of(&result, ErrorKind::Semantic),
        vec![(
            "".to_string(),
            format!("relation '{}' must appear at least once among the root links, found 0", PINNED)
        )]
    );

    let mut document = minimal();
    document["links"]
        .as_array_mut()
        .unwrap()
        .push(json!({"href": "/pin", "rel": PINNED}));
    assert!(parse_with(&registry, &document, Profile::Rwpm).errors.is_empty());

    // The rule is inherited by derived profiles
    assert_eq!(registry.relation(Profile::Odl, PINNED), Some(Cardinality::AtLeastOne));
}

#[test]
fn test_custom_semantic_rule() {
    let mut builder = RegistryBuilder::with_defaults().unwrap();
    builder.register_semantic_rule(Profile::Rwpm, RootTitle).unwrap();
    let registry = builder.build();

    let result = parse_with(&registry, &minimal(), Profile::Rwpm);
    assert_eq!(
        errors_of(&result, ErrorKind::Semantic),
        vec![("metadata.title".to_string(), "title must be 'Required'".to_string())]
    );
    assert!(result.manifest.is_some());

    // The default registry is untouched
    assert!(parse_as(&minimal(), Profile::Rwpm).errors.is_empty());
}

#[test]
fn test_custom_media_type_on_self_link() {
    let mut document = minimal();
    document["links"][0]["type"] = json!("application/x-reader-manifest+json");

    // Unknown types are not judged
    assert!(parse_as(&document, Profile::Rwpm).errors.is_empty());

    let mut builder = RegistryBuilder::with_defaults().unwrap();
    builder
        .register_media_type(
            "application/x-reader-manifest+json",
            Profile::Rwpm,
            MediaTypeFlags::IMAGE,
        )
        .unwrap();
    let registry = builder.build();
    let result = parse_with(&registry, &document, Profile::Rwpm);
    assert_eq!(result.errors.count(ErrorKind::Semantic), 1);
    assert_eq!(result.errors[0].path.to_string(), "links[0].type");
}

#[test]
fn test_replaced_schema() {
    let mut builder = RegistryBuilder::with_defaults().unwrap();
    builder
        .replace_schema(
            Profile::Rwpm,
            json!({
                "type": "object",
                "required": ["metadata", "links", "readingOrder"]
            }),
        )
        .unwrap();
    let registry = builder.build();

    let result = parse_with(&registry, &minimal(), Profile::Rwpm);
    assert!(result.manifest.is_none());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::Syntax);
    assert_eq!(result.errors[0].path.to_string(), "");
    assert!(result.errors[0].message.contains("readingOrder"));
}

#[test]
fn test_registration_failures() {
    let mut builder = RegistryBuilder::with_defaults().unwrap();

    assert!(matches!(
        builder.register_relation("self", Profile::Rwpm, Cardinality::Any),
        Err(Error::DuplicateRegistration { what: "relation", .. })
    ));
    assert!(matches!(
        builder.register_node_builder(
            NodeKind::Metadata,
            Profile::Odl,
            webpub_manifest::analyzer::parsers::collection::CollectionBuilder::new(),
        ),
        Err(Error::UnsupportedNodeKind(NodeKind::Metadata))
    ));
    assert!(matches!(
        builder.register_schema(Profile::Odl, json!({"type": 12})),
        Err(Error::DuplicateRegistration { .. })
    ));
    assert!(matches!(
        builder.replace_schema(Profile::Odl, json!({"type": 12})),
        Err(Error::InvalidSchema { profile: Profile::Odl, .. })
    ));

    // A derived profile may override its base
    assert!(builder
        .register_relation("self", Profile::Opds2, Cardinality::AtMostOne)
        .is_ok());
    let registry = builder.build();
    assert_eq!(registry.relation(Profile::Odl, "self"), Some(Cardinality::AtMostOne));
    assert_eq!(registry.relation(Profile::Rwpm, "self"), Some(Cardinality::ExactlyOne));
}
