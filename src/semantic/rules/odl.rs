use crate::ast::{Collection, NodeKind};
use crate::registry::odl::BORROW_RELATION;
use crate::registry::MediaTypeFlags;
use crate::semantic::{CollectionSite, SemanticContext, SemanticRule};

/// Every publication of an ODL feed is licensed
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicationLicenses;

impl SemanticRule for PublicationLicenses {
    fn name(&self) -> &str {
        "publication-licenses"
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
        if collection.role_collections("licenses").next().is_none() {
            ctx.add_error(
                collection.path.key("licenses"),
                "a publication must have at least one license",
            );
        }
    }
}

/// A license links to its License Info Document and can be borrowed
#[derive(Debug, Clone, Copy, Default)]
pub struct LicenseLinks;

impl SemanticRule for LicenseLinks {
    fn name(&self) -> &str {
        "license-links"
    }

    fn check_collection(
        &self,
        collection: &Collection,
        _site: &CollectionSite<'_>,
        ctx: &mut SemanticContext<'_>,
    ) {
        if collection.kind != NodeKind::License {
            return;
        }

        let mut self_links = 0;
        for link in collection.links_with_rel("self") {
            self_links += 1;
            let Some(media_type) = &link.media_type else {
                continue;
            };
            let recognized = ctx.registry.media_type_flags(ctx.profile, media_type);
            if recognized.is_some_and(|flags| !flags.contains(MediaTypeFlags::LICENSE)) {
                ctx.add_error(
                    link.path.key("type"),
                    format!(
                        "media type '{}' of a license self link is not a license document type",
                        media_type
                    ),
                );
            }
        }
        if self_links == 0 {
            ctx.add_error(
                collection.path.key("links"),
                "a license must have a 'self' link to its License Info Document",
            );
        }

        if collection.links_with_rel(BORROW_RELATION).next().is_none() {
            ctx.add_error(
                collection.path.key("links"),
                format!("a license must have a '{}' link", BORROW_RELATION),
            );
        }
    }
}
