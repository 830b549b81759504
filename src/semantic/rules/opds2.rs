use crate::ast::{Collection, NodeKind};
use crate::registry::opds2::ACQUISITION_PREFIX;
use crate::semantic::{CollectionSite, SemanticContext, SemanticRule};

const FEED_CONTENT_ROLES: [&str; 3] = ["publications", "navigation", "groups"];

/// A feed lists publications, navigation or groups
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedHasContent;

impl SemanticRule for FeedHasContent {
    fn name(&self) -> &str {
        "feed-has-content"
    }

    fn check_collection(
        &self,
        collection: &Collection,
        site: &CollectionSite<'_>,
        ctx: &mut SemanticContext<'_>,
    ) {
        if !site.is_root() || collection.kind != NodeKind::Manifest {
            return;
        }
        if !FEED_CONTENT_ROLES.iter().any(|role| collection.has_role(role)) {
            ctx.add_error(
                collection.path.clone(),
                "a feed must contain at least one of publications, navigation or groups",
            );
        }
    }
}

/// Navigation links have a title to display
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationTitles;

impl SemanticRule for NavigationTitles {
    fn name(&self) -> &str {
        "navigation-titles"
    }

    fn check_collection(
        &self,
        collection: &Collection,
        site: &CollectionSite<'_>,
        ctx: &mut SemanticContext<'_>,
    ) {
        if site.role != Some("navigation") {
            return;
        }
        for link in collection.links.iter().filter(|link| link.title.is_none()) {
            ctx.add_error(link.path.key("title"), "navigation links must have a title");
        }
    }
}

/// A group holds either publications or navigation, not both and not neither
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupContent;

impl SemanticRule for GroupContent {
    fn name(&self) -> &str {
        "group-content"
    }

    fn check_collection(
        &self,
        collection: &Collection,
        _site: &CollectionSite<'_>,
        ctx: &mut SemanticContext<'_>,
    ) {
        if collection.kind != NodeKind::Group {
            return;
        }
        let publications = collection.has_role("publications");
        let navigation = collection.has_role("navigation");
        if publications == navigation {
            ctx.add_error(
                collection.path.clone(),
                "a group must contain exactly one of publications or navigation",
            );
        }
    }
}

/// A publication can be acquired: through an acquisition link or a license
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicationAcquisition;

impl SemanticRule for PublicationAcquisition {
    fn name(&self) -> &str {
        "publication-acquisition"
    }

    fn check_collection(
        &self,
        collection: &Collection,
        _site: &CollectionSite<'_>,
        ctx: &mut SemanticContext<'_>,
    ) {
        if collection.kind != NodeKind::Publication {
            return;
        }
        let acquirable = collection
            .links
            .iter()
            .any(|link| link.has_rel_prefix(ACQUISITION_PREFIX));
        if !acquirable && !collection.has_role("licenses") {
            ctx.add_error(
                collection.path.key("links"),
                "a publication must have at least one acquisition link",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::manifest_parser::ManifestParser;
    use crate::registry::{Profile, Registry};
    use serde_json::json;
    use url::Url;

    fn semantic_messages(document: serde_json::Value) -> Vec<(String, String)> {
        let registry = Registry::default_registry().unwrap();
        let parser = ManifestParser::new(registry, ParserConfig::default()).unwrap();
        let base = Url::parse("https://catalog.example/").unwrap();
        let result = parser.parse(&document, Profile::Opds2, &base);
        assert!(result.manifest.is_some());
        result
            .errors
            .iter()
            .map(|e| (e.path.to_string(), e.message.clone()))
            .collect()
    }

    #[test]
    fn test_valid_feed() {
        let errors = semantic_messages(json!({
            "metadata": {"title": "Catalog"},
            "links": [{"href": "/opds", "rel": "self", "type": "application/opds+json"}],
            "publications": [{
                "metadata": {"title": "A Book"},
                "links": [{"href": "/b.epub", "rel": "http://opds-spec.org/acquisition/open-access", "type": "application/epub+zip"}]
            }]
        }));
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_feed_rules() {
        let errors = semantic_messages(json!({
            "metadata": {"title": "Catalog"},
            "links": [
                {"href": "/opds", "rel": "self"},
                {"href": "/opds?page=2", "rel": "next"},
                {"href": "/opds?page=3", "rel": "next"}
            ],
            "groups": [{
                "metadata": {"title": "Empty"},
                "navigation": [{"href": "/sub"}],
                "publications": [{"metadata": {"title": "No way to get it"}, "links": []}]
            }]
        }));
        assert_eq!(
            errors,
            vec![
                (
                    "".to_string(),
                    "relation 'next' must appear at most once among the root links, found 2"
                        .to_string()
                ),
                (
                    "groups[0]".to_string(),
                    "a group must contain exactly one of publications or navigation".to_string()
                ),
                (
                    "groups[0].navigation[0].title".to_string(),
                    "navigation links must have a title".to_string()
                ),
                (
                    "groups[0].publications[0].links".to_string(),
                    "a publication must have at least one acquisition link".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_empty_feed() {
        let errors = semantic_messages(json!({
            "metadata": {"title": "Catalog"},
            "links": [{"href": "/opds", "rel": "self"}]
        }));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].1.starts_with("a feed must contain"));
    }
}
