//! # AST Builder
//!
//! Turns a structurally valid JSON document into the typed document model.
//!
//! ## Building Strategy
//!
//! Nodes are built bottom-up. For every collection-like node the builder asks
//! the registry for the [`NodeBuilder`] registered under
//! `(profile, node kind)`, walking the profile lineage, so OPDS 2.0 and ODL
//! substitute their own builders without touching the RWPM ones.
//!
//! ## Error Accumulation
//!
//! Field-level failures never stop the build. Each one is recorded with kind
//! `Parsing` and the field's location, and the field falls back to a default.
//! Collection nesting deeper than [`ParserConfig::max_depth`] is reported
//! instead of followed.
//!
//! [`ParserConfig::max_depth`]: crate::config::ParserConfig::max_depth

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::analyzer::combinators::OneOf;
use crate::analyzer::core::{ParseContext, Parser, Partial};
use crate::analyzer::parsers::collection::CollectionBuilder;
use crate::analyzer::prelude::*;
use crate::ast::{Collection, Manifest, NodeKind};
use crate::error::{ValidationError, ValidationErrorList};
use crate::path::FieldPath;
use crate::registry::{Profile, Registry};

/// Builds one collection-like node kind for a profile.
///
/// Implementations read `input` (located at `path`) and return the node,
/// recording every recovered error on `builder`. Nested collections must be
/// built through [`AstBuilder::build_collection`] so dispatch and the depth
/// guard apply to them.
pub trait NodeBuilder: Send + Sync {
    fn build(
        &self,
        builder: &mut AstBuilder<'_>,
        input: &Value,
        path: &FieldPath,
        kind: NodeKind,
    ) -> Collection;
}

impl<F> NodeBuilder for F
where
    F: Fn(&mut AstBuilder<'_>, &Value, &FieldPath, NodeKind) -> Collection + Send + Sync,
{
    fn build(
        &self,
        builder: &mut AstBuilder<'_>,
        input: &Value,
        path: &FieldPath,
        kind: NodeKind,
    ) -> Collection {
        self(builder, input, path, kind)
    }
}

/// Owns the nodes and the error list while a document is being built
pub struct AstBuilder<'a> {
    ctx: ParseContext<'a>,
    depth: usize,
    errors: ValidationErrorList,
}

impl<'a> AstBuilder<'a> {
    pub fn new(ctx: ParseContext<'a>) -> Self {
        Self {
            ctx,
            depth: 0,
            errors: ValidationErrorList::new(),
        }
    }

    /// Parse context at the current nesting depth
    pub fn context(&self) -> ParseContext<'a> {
        self.ctx.at_depth(self.depth)
    }

    pub fn profile(&self) -> Profile {
        self.ctx.profile
    }

    pub fn registry(&self) -> &'a Registry {
        self.ctx.registry
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn record(&mut self, error: ValidationError) {
        warn!("recovered from {}", error);
        self.errors.push(error);
    }

    pub fn record_all(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        for error in errors {
            self.record(error);
        }
    }

    /// Keeps a partial value and records the errors recovered while building it
    pub fn absorb<T>(&mut self, partial: Partial<T>) -> T {
        let Partial { value, errors } = partial;
        self.record_all(errors);
        value
    }

    /// Builds a collection-like node through the registry's dispatch table
    pub fn build_collection(
        &mut self,
        kind: NodeKind,
        input: &Value,
        path: &FieldPath,
    ) -> Collection {
        if self.depth >= self.ctx.config.max_depth {
            warn!("nesting depth {} reached at {}", self.depth, path);
            let error = self.ctx.depth_error(path);
            self.errors.push(error);
            return Collection::new(kind, path.clone());
        }

        self.depth += 1;
        let registry = self.registry();
        let collection = match registry.node_builder(self.profile(), kind) {
            Some(node_builder) => node_builder.build(self, input, path, kind),
            None => {
                debug!(
                    "no node builder for {} in profile {}, using the generic one",
                    kind,
                    self.profile()
                );
                CollectionBuilder::new().build(self, input, path, kind)
            }
        };
        self.depth -= 1;

        debug!(
            "built {} at {} ({} links, {} sub-collections)",
            kind,
            path.label(),
            collection.links.len(),
            collection.sub_collections.len()
        );
        collection
    }

    /// Builds the document root: `@context` and the root collection
    #[tracing::instrument(level = "debug", skip(self, document), fields(profile = %self.profile()))]
    pub fn build_manifest(&mut self, document: &Value) -> Manifest {
        let root = FieldPath::root();
        let context = match document.get("@context").filter(|value| !value.is_null()) {
            Some(value) => {
                let ctx = self.context();
                match context_uris().parse(value, &root.key("@context"), &ctx) {
                    Ok(partial) => self.absorb(partial),
                    Err(error) => {
                        self.record(error);
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        let collection = self.build_collection(NodeKind::Manifest, document, &root);
        Manifest::new(self.profile(), context, collection)
    }

    pub fn errors(&self) -> &ValidationErrorList {
        &self.errors
    }

    pub fn finish(self) -> ValidationErrorList {
        self.errors
    }
}

/// `@context`: one URI or an array of URIs
fn context_uris() -> OneOf<Partial<Vec<Url>>> {
    one_of(vec![
        Box::new(map(uri(), |uri: Url| Partial::ok(vec![uri])))
            as Box<dyn Parser<Partial<Vec<Url>>>>,
        Box::new(array_of(uri())),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;
    use crate::config::ParserConfig;
    use crate::error::ErrorKind;
    use crate::registry::RegistryBuilder;
    use serde_json::json;
    use url::Url;

    fn build(
        document: Value,
        profile: Profile,
        config: &ParserConfig,
    ) -> (Manifest, ValidationErrorList) {
        let base = Url::parse("https://pub.example/").unwrap();
        let registry = Registry::default_registry().unwrap();
        let mut builder = AstBuilder::new(ParseContext::new(&base, registry, profile, config));
        let manifest = builder.build_manifest(&document);
        (manifest, builder.finish())
    }

    #[test]
    fn test_builds_root_links_and_context() {
        let (manifest, errors) = build(
            json!({
                "@context": "https://readium.org/webpub-manifest/context.jsonld",
                "metadata": {"type": "http://example/type"},
                "links": [{"href": "/m", "rel": ["self"]}],
                "readingOrder": [{"href": "c1.html", "type": "text/html"}],
                "x-custom": 1
            }),
            Profile::Rwpm,
            &ParserConfig::default(),
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(manifest.context.len(), 1);
        assert_eq!(manifest.links[0].href_str(), Some("https://pub.example/m"));
        assert_eq!(
            manifest.reading_order().next().unwrap().href_str(),
            Some("https://pub.example/c1.html")
        );
        assert_eq!(manifest.extension("x-custom"), Some(&json!(1)));
        assert!(manifest.extension("@context").is_none());
        assert!(manifest.extension("readingOrder").is_none());
    }

    #[test]
    fn test_context_forms() {
        let document = |context: Value| {
            json!({
                "@context": context,
                "metadata": {"type": "http://example/type"},
                "links": []
            })
        };
        let config = ParserConfig::default();

        let (manifest, errors) = build(
            document(json!(["https://schema.org", "not absolute"])),
            Profile::Rwpm,
            &config,
        );
        assert_eq!(manifest.context.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "@context[1]");

        let (manifest, errors) = build(document(json!(5)), Profile::Rwpm, &config);
        assert!(manifest.context.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "no alternative matched: expected a string (absolute URI), found number; \
             expected an array, found number"
        );
        assert_eq!(errors[0].causes.len(), 2);
    }

    #[test]
    fn test_collection_depth_guard() {
        let config = ParserConfig::default().with_max_depth(2);
        let (manifest, errors) = build(
            json!({
                "metadata": {"title": "Feed"},
                "links": [],
                "groups": [{
                    "metadata": {"title": "Group"},
                    "publications": [{"metadata": {"title": "Deep"}, "links": []}]
                }]
            }),
            Profile::Opds2,
            &config,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Parsing);
        assert_eq!(
            errors[0].path,
            FieldPath::root().key("groups").index(0).key("publications").index(0)
        );
        assert!(errors[0].message.contains("maximum nesting depth of 2"));
        // the over-deep node is still present, empty
        let group = manifest.role_collections("groups").next().unwrap();
        assert_eq!(group.publications().count(), 1);
    }

    fn tagging_builder(
        builder: &mut AstBuilder<'_>,
        input: &Value,
        path: &FieldPath,
        kind: NodeKind,
    ) -> Collection {
        let mut collection = CollectionBuilder::new().build(builder, input, path, kind);
        collection
            .extensions
            .insert("seen-by".to_string(), json!("custom"));
        collection
    }

    #[test]
    fn test_custom_node_builder_dispatch() {
        let mut registry = RegistryBuilder::with_defaults().unwrap();
        registry
            .register_node_builder(
                NodeKind::Facet,
                Profile::Odl,
                tagging_builder,
            )
            .unwrap();
        let registry = registry.build();
        let base = Url::parse("https://pub.example/").unwrap();
        let config = ParserConfig::default();
        let mut builder =
            AstBuilder::new(ParseContext::new(&base, &registry, Profile::Odl, &config));
        let manifest = builder.build_manifest(&json!({
            "metadata": {"title": "Feed"},
            "facets": [{"metadata": {"title": "Format"}, "links": []}]
        }));
        let facet = manifest.role_collections("facets").next().unwrap();
        assert_eq!(facet.kind, NodeKind::Facet);
        assert_eq!(facet.extensions.get("seen-by"), Some(&json!("custom")));
    }
}
