//! # Semantic Analyzer
//!
//! Runs the semantic rules registered for a profile over a built [`Manifest`].
//!
//! ## Rule Interface
//!
//! A [`SemanticRule`] is a plugin visitor: it overrides the hooks it needs
//! (`check_manifest`, `check_collection`, `check_link`) and reports findings
//! through the [`SemanticContext`]. Rules are independent of each other; a
//! rule never sees another rule's errors and never stops the walk.
//!
//! ## Traversal
//!
//! ```text
//! check_manifest
//! └── check_collection (root, then every sub-collection, depth first)
//!     └── check_link (the collection's links, then their children and alternates)
//! ```
//!
//! Rules of the base profile run before the rules of derived profiles.

pub mod rules;

use tracing::debug;

use crate::ast::{Collection, Link, Manifest, NodeKind};
use crate::error::ValidationError;
use crate::path::FieldPath;
use crate::registry::{Profile, Registry};

/// A check over the document model yielding `Semantic` errors
pub trait SemanticRule: Send + Sync {
    /// Unique within a profile
    fn name(&self) -> &str;

    fn check_manifest(&self, _manifest: &Manifest, _ctx: &mut SemanticContext<'_>) {}

    fn check_collection(
        &self,
        _collection: &Collection,
        _site: &CollectionSite<'_>,
        _ctx: &mut SemanticContext<'_>,
    ) {
    }

    fn check_link(&self, _link: &Link, _ctx: &mut SemanticContext<'_>) {}
}

/// Where a collection sits in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSite<'n> {
    /// Role the collection is filed under; `None` at the root
    pub role: Option<&'n str>,
    pub parent: Option<NodeKind>,
    pub depth: usize,
}

impl<'n> CollectionSite<'n> {
    pub fn root() -> Self {
        Self {
            role: None,
            parent: None,
            depth: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn child(&self, role: &'n str, parent: NodeKind) -> Self {
        Self {
            role: Some(role),
            parent: Some(parent),
            depth: self.depth + 1,
        }
    }
}

/// Lookups available to rules, and the sink for their findings
pub struct SemanticContext<'a> {
    pub registry: &'a Registry,
    pub profile: Profile,
    errors: Vec<ValidationError>,
}

impl<'a> SemanticContext<'a> {
    pub fn new(registry: &'a Registry, profile: Profile) -> Self {
        Self {
            registry,
            profile,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, path: FieldPath, message: impl Into<String>) {
        let error = ValidationError::semantic(path, message);
        debug!("{}", error);
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

pub struct SemanticAnalyzer<'a> {
    registry: &'a Registry,
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Runs every rule of `profile` and its ancestors over `manifest`
    #[tracing::instrument(level = "debug", skip(self, manifest))]
    pub fn analyze(&self, manifest: &Manifest, profile: Profile) -> Vec<ValidationError> {
        let rules = self.registry.semantic_rules(profile);
        debug!("running {} semantic rules", rules.len());

        let mut ctx = SemanticContext::new(self.registry, profile);
        for rule in &rules {
            rule.check_manifest(manifest, &mut ctx);
        }
        walk_collection(&rules, &manifest.root, CollectionSite::root(), &mut ctx);
        ctx.into_errors()
    }
}

fn walk_collection(
    rules: &[&dyn SemanticRule],
    collection: &Collection,
    site: CollectionSite<'_>,
    ctx: &mut SemanticContext<'_>,
) {
    for rule in rules {
        rule.check_collection(collection, &site, ctx);
    }
    for link in &collection.links {
        walk_link(rules, link, ctx);
    }
    for sub in &collection.sub_collections {
        for child in &sub.collections {
            walk_collection(rules, child, site.child(&sub.role, collection.kind), ctx);
        }
    }
}

fn walk_link(rules: &[&dyn SemanticRule], link: &Link, ctx: &mut SemanticContext<'_>) {
    for rule in rules {
        rule.check_link(link, ctx);
    }
    for nested in link.children.iter().chain(&link.alternates) {
        walk_link(rules, nested, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Href, OneOrMany, SubCollection};
    use crate::registry::RegistryBuilder;
    use url::Url;

    struct SiteRecorder;

    impl SemanticRule for SiteRecorder {
        fn name(&self) -> &str {
            "site-recorder"
        }

        fn check_collection(
            &self,
            collection: &Collection,
            site: &CollectionSite<'_>,
            ctx: &mut SemanticContext<'_>,
        ) {
            let role = site.role.unwrap_or("-");
            ctx.add_error(collection.path.clone(), format!("{} {}", role, site.depth));
        }

        fn check_link(&self, link: &Link, ctx: &mut SemanticContext<'_>) {
            ctx.add_error(link.path.clone(), "link");
        }
    }

    #[test]
    fn test_walk_order() {
        let mut builder = RegistryBuilder::new();
        builder.register_semantic_rule(Profile::Rwpm, SiteRecorder).unwrap();
        let registry = builder.build();

        let root_path = FieldPath::root();
        let href = Href::Uri(Url::parse("https://pub.example/a").unwrap());
        let mut parent = Link::new(href.clone(), root_path.key("links").index(0));
        parent
            .children
            .push(Link::new(href.clone(), parent.path.key("children").index(0)));
        let mut root = Collection::new(NodeKind::Manifest, root_path.clone());
        root.links.push(parent);
        let toc_path = root_path.key("toc");
        root.sub_collections.push(SubCollection::new(
            "toc",
            OneOrMany::One(Collection::compact(
                vec![Link::new(href, toc_path.index(0))],
                toc_path.clone(),
            )),
            toc_path,
        ));
        let manifest = Manifest::new(Profile::Rwpm, vec![], root);

        let errors = SemanticAnalyzer::new(&registry).analyze(&manifest, Profile::Opds2);
        let seen: Vec<String> = errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        assert_eq!(
            seen,
            vec![
                ": - 0",
                "links[0]: link",
                "links[0].children[0]: link",
                "toc: toc 1",
                "toc[0]: link",
            ]
        );
    }
}
