mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use webpub_manifest::semantic::SemanticAnalyzer;
use webpub_manifest::{
    Collection, ErrorKind, FieldPath, NodeKind, OneOrMany, Profile, Registry, SubCollection,
};

fn rwpm_document(links: serde_json::Value) -> serde_json::Value {
    json!({
        "metadata": {"type": "http://example/type"},
        "links": links
    })
}

#[test]
fn test_templated_link_without_expression() {
    let document = rwpm_document(json!([
        {"href": "/m", "rel": "self"},
        {"href": "https://pub.example/search", "rel": "search", "templated": true},
        {"href": "https://pub.example/find{?q}", "rel": "search", "templated": true},
        {"href": "https://pub.example/a{b}", "rel": "alternate"}
    ]));
    let result = parse_as(&document, Profile::Rwpm);
    assert_eq!(
        errors_of(&result, ErrorKind::Semantic),
        vec![(
            "links[1].href".to_string(),
            "templated link href 'https://pub.example/search' contains no template expression"
                .to_string()
        )]
    );
    assert!(errors_of(&result, ErrorKind::Parsing).is_empty());
}

#[test]
fn test_duplicate_roles_in_built_tree() {
    let result = parse_as(
        &rwpm_document(json!([{"href": "/m", "rel": "self"}])),
        Profile::Rwpm,
    );
    let mut manifest = result.manifest.unwrap();
    let analyzer = SemanticAnalyzer::new(Registry::default_registry().unwrap());
    assert!(analyzer.analyze(&manifest, Profile::Rwpm).is_empty());

    for _ in 0..2 {
        let path = FieldPath::root().key("guided");
        manifest.root.sub_collections.push(SubCollection::new(
            "guided",
            OneOrMany::One(Collection::compact(vec![], path.clone())),
            path,
        ));
    }
    let errors = analyzer.analyze(&manifest, Profile::Rwpm);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Semantic);
    assert_eq!(errors[0].path, FieldPath::root().key("guided"));
    assert!(errors[0].message.contains("'guided'"));
}

#[test]
fn test_nested_duplicate_roles_are_reported_per_parent() {
    let registry = Registry::default_registry().unwrap();
    let mut feed = Collection::new(NodeKind::Manifest, FieldPath::root());
    let group_path = FieldPath::root().key("groups").index(0);
    let mut group = Collection::new(NodeKind::Group, group_path.clone());
    for _ in 0..2 {
        group.sub_collections.push(SubCollection::new(
            "navigation",
            OneOrMany::One(Collection::compact(vec![], group_path.key("navigation"))),
            group_path.key("navigation"),
        ));
    }
    feed.sub_collections.push(SubCollection::new(
        "groups",
        OneOrMany::Many(vec![group]),
        FieldPath::root().key("groups"),
    ));
    let manifest = webpub_manifest::Manifest::new(Profile::Opds2, vec![], feed);

    let errors = SemanticAnalyzer::new(registry).analyze(&manifest, Profile::Opds2);
    let duplicates: Vec<_> = errors
        .iter()
        .filter(|e| e.message.starts_with("role 'navigation'"))
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].path.to_string(), "groups[0].navigation");
}

#[test]
fn test_reading_order_types_and_identifier() {
    let document = json!({
        "metadata": {"type": "http://example/type", "identifier": "isbn 1234"},
        "links": [{"href": "/m", "rel": "self", "type": "image/png"}],
        "readingOrder": [
            {"href": "c1.html", "type": "text/html"},
            {"href": "c2.html"}
        ]
    });
    let result = parse_as(&document, Profile::Rwpm);
    assert_eq!(
        errors_of(&result, ErrorKind::Semantic),
        vec![
            (
                "links[0].type".to_string(),
                "media type 'image/png' of the self link is not a manifest or feed type".to_string()
            ),
            (
                "metadata.identifier".to_string(),
                "identifier 'isbn 1234' is not an absolute URI".to_string()
            ),
            (
                "readingOrder[1].type".to_string(),
                "reading order items must declare a media type".to_string()
            ),
        ]
    );
}

#[test]
fn test_semantic_errors_keep_the_manifest() {
    let document = rwpm_document(json!([]));
    let result = parse_as(&document, Profile::Rwpm);
    assert!(result.manifest.is_some());
    assert!(!result.errors.has_fatal());
    assert_eq!(result.errors.count(ErrorKind::Semantic), 1);
}
