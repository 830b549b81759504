use std::collections::BTreeMap;

use url::Url;

use crate::ast::{Collection, Href, Link};
use crate::registry::MediaTypeFlags;
use crate::semantic::{CollectionSite, SemanticContext, SemanticRule};

/// Registered relations appear at the root as often as their cardinality allows
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationCardinality;

impl SemanticRule for RelationCardinality {
    fn name(&self) -> &str {
        "relation-cardinality"
    }

    fn check_collection(
        &self,
        collection: &Collection,
        site: &CollectionSite<'_>,
        ctx: &mut SemanticContext<'_>,
    ) {
        if !site.is_root() {
            return;
        }
        for (rel, cardinality) in ctx.registry.relations(ctx.profile) {
            let count = collection.links_with_rel(&rel).count();
            if !cardinality.allows(count) {
                ctx.add_error(
                    collection.path.clone(),
                    format!(
                        "relation '{}' must appear {} among the root links, found {}",
                        rel, cardinality, count
                    ),
                );
            }
        }
    }
}

/// Role names are unique among the sub-collections of one parent
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueRoles;

impl SemanticRule for UniqueRoles {
    fn name(&self) -> &str {
        "unique-roles"
    }

    fn check_collection(
        &self,
        collection: &Collection,
        _site: &CollectionSite<'_>,
        ctx: &mut SemanticContext<'_>,
    ) {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for sub in &collection.sub_collections {
            *counts.entry(sub.role.as_str()).or_default() += 1;
        }
        for (role, count) in counts.into_iter().filter(|(_, count)| *count > 1) {
            ctx.add_error(
                collection.path.key(role),
                format!("role '{}' appears {} times under the same parent", role, count),
            );
        }
    }
}

/// A link marked `templated` carries at least one template expression
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplatedHref;

impl SemanticRule for TemplatedHref {
    fn name(&self) -> &str {
        "templated-href"
    }

    fn check_link(&self, link: &Link, ctx: &mut SemanticContext<'_>) {
        if !link.templated {
            return;
        }
        if let Some(Href::Template(template)) = &link.href {
            if !template.has_expressions() {
                ctx.add_error(
                    link.path.key("href"),
                    format!(
                        "templated link href '{}' contains no template expression",
                        template.template
                    ),
                );
            }
        }
    }
}

/// A recognized media type on the root `self` link denotes a manifest or feed
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfLinkType;

impl SemanticRule for SelfLinkType {
    fn name(&self) -> &str {
        "self-link-type"
    }

    fn check_collection(
        &self,
        collection: &Collection,
        site: &CollectionSite<'_>,
        ctx: &mut SemanticContext<'_>,
    ) {
        if !site.is_root() {
            return;
        }
        for link in collection.links_with_rel("self") {
            let Some(media_type) = &link.media_type else {
                continue;
            };
            let Some(flags) = ctx.registry.media_type_flags(ctx.profile, media_type) else {
                continue;
            };
            if !flags.intersects(MediaTypeFlags::MANIFEST | MediaTypeFlags::FEED) {
                ctx.add_error(
                    link.path.key("type"),
                    format!(
                        "media type '{}' of the self link is not a manifest or feed type",
                        media_type
                    ),
                );
            }
        }
    }
}

/// Every reading order item declares its media type
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadingOrderTypes;

impl SemanticRule for ReadingOrderTypes {
    fn name(&self) -> &str {
        "reading-order-types"
    }

    fn check_collection(
        &self,
        collection: &Collection,
        site: &CollectionSite<'_>,
        ctx: &mut SemanticContext<'_>,
    ) {
        if site.role != Some("readingOrder") {
            return;
        }
        for link in collection.links.iter().filter(|link| link.media_type.is_none()) {
            ctx.add_error(
                link.path.key("type"),
                "reading order items must declare a media type",
            );
        }
    }
}

/// The root `identifier`, when given, is an absolute URI
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierIsUri;

impl SemanticRule for IdentifierIsUri {
    fn name(&self) -> &str {
        "identifier-is-uri"
    }

    fn check_collection(
        &self,
        collection: &Collection,
        site: &CollectionSite<'_>,
        ctx: &mut SemanticContext<'_>,
    ) {
        if !site.is_root() {
            return;
        }
        let Some(identifier) = &collection.metadata.identifier else {
            return;
        };
        if Url::parse(identifier).is_err() {
            ctx.add_error(
                collection.metadata.path.key("identifier"),
                format!("identifier '{}' is not an absolute URI", identifier),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::uri_template::parse_uri_template;
    use crate::ast::{Manifest, NodeKind, OneOrMany, SubCollection};
    use crate::error::{ErrorKind, ValidationError};
    use crate::path::FieldPath;
    use crate::registry::{Cardinality, Profile, Registry, RegistryBuilder};
    use crate::semantic::SemanticAnalyzer;

    fn href(value: &str) -> Href {
        Href::Uri(Url::parse(value).unwrap())
    }

    fn analyze_with(
        rule: impl SemanticRule + 'static,
        manifest: &Manifest,
    ) -> Vec<ValidationError> {
        let mut builder = RegistryBuilder::new();
        builder.register_semantic_rule(Profile::Rwpm, rule).unwrap();
        builder
            .register_media_type("application/webpub+json", Profile::Rwpm, MediaTypeFlags::MANIFEST)
            .unwrap()
            .register_media_type("image/png", Profile::Rwpm, MediaTypeFlags::IMAGE)
            .unwrap()
            .register_relation("self", Profile::Rwpm, Cardinality::ExactlyOne)
            .unwrap();
        let registry = builder.build();
        SemanticAnalyzer::new(&registry).analyze(manifest, Profile::Rwpm)
    }

    fn manifest_with_links(links: Vec<Link>) -> Manifest {
        let mut root = Collection::new(NodeKind::Manifest, FieldPath::root());
        root.links = links;
        Manifest::new(Profile::Rwpm, vec![], root)
    }

    fn root_link(index: usize, rel: &str) -> Link {
        Link::new(
            href("https://pub.example/m"),
            FieldPath::root().key("links").index(index),
        )
        .with_rel(rel)
    }

    #[test]
    fn test_missing_self() {
        let manifest = manifest_with_links(vec![root_link(0, "alternate")]);
        let errors = analyze_with(RelationCardinality, &manifest);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Semantic);
        assert!(errors[0].path.is_root());
        assert_eq!(
            errors[0].message,
            "relation 'self' must appear exactly once among the root links, found 0"
        );

        let manifest = manifest_with_links(vec![root_link(0, "self")]);
        assert!(analyze_with(RelationCardinality, &manifest).is_empty());
    }

    #[test]
    fn test_duplicate_self() {
        let manifest = manifest_with_links(vec![root_link(0, "self"), root_link(1, "self")]);
        let errors = analyze_with(RelationCardinality, &manifest);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.ends_with("found 2"));
    }

    #[test]
    fn test_duplicate_roles() {
        let mut manifest = manifest_with_links(vec![]);
        for _ in 0..2 {
            let path = FieldPath::root().key("toc");
            manifest.root.sub_collections.push(SubCollection::new(
                "toc",
                OneOrMany::One(Collection::compact(vec![], path.clone())),
                path,
            ));
        }
        let errors = analyze_with(UniqueRoles, &manifest);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'toc'"));

        manifest.root.sub_collections[1].role = "landmarks".to_string();
        assert!(analyze_with(UniqueRoles, &manifest).is_empty());
    }

    #[test]
    fn test_templated_href() {
        let path = FieldPath::root().key("links").index(0);
        let mut link = Link::new(
            Href::Template(parse_uri_template("https://pub.example/search").unwrap()),
            path.clone(),
        );
        link.templated = true;
        let errors = analyze_with(TemplatedHref, &manifest_with_links(vec![link.clone()]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, path.key("href"));

        link.href = Some(Href::Template(
            parse_uri_template("https://pub.example/search{?query}").unwrap(),
        ));
        assert!(analyze_with(TemplatedHref, &manifest_with_links(vec![link])).is_empty());

        // a token in a non-templated href is allowed
        let plain = Link::new(Href::Reference("search{?query}".to_string()), path);
        assert!(!plain.templated);
        assert!(analyze_with(TemplatedHref, &manifest_with_links(vec![plain])).is_empty());
    }

    #[test]
    fn test_self_link_type() {
        let good = root_link(0, "self").with_media_type("application/webpub+json");
        assert!(analyze_with(SelfLinkType, &manifest_with_links(vec![good])).is_empty());

        let unknown = root_link(0, "self").with_media_type("application/x-unknown");
        assert!(analyze_with(SelfLinkType, &manifest_with_links(vec![unknown])).is_empty());

        let image = root_link(0, "self").with_media_type("image/png");
        let errors = analyze_with(SelfLinkType, &manifest_with_links(vec![image]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "links[0].type");
    }

    #[test]
    fn test_identifier_is_uri() {
        let mut manifest = manifest_with_links(vec![]);
        manifest.root.metadata.identifier = Some("not a uri".to_string());
        let errors = analyze_with(IdentifierIsUri, &manifest);
        assert_eq!(errors[0].path.to_string(), "metadata.identifier");

        manifest.root.metadata.identifier = Some("urn:isbn:9780000000000".to_string());
        assert!(analyze_with(IdentifierIsUri, &manifest).is_empty());
    }

    #[test]
    fn test_default_rules_are_registered() {
        let registry = Registry::default_registry().unwrap();
        let names: Vec<&str> = registry
            .semantic_rules(Profile::Rwpm)
            .iter()
            .map(|rule| rule.name())
            .collect();
        assert!(names.contains(&"relation-cardinality"));
        assert!(names.contains(&"unique-roles"));
        assert!(names.contains(&"templated-href"));
    }
}
