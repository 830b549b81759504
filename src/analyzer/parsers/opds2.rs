use serde_json::Value;

use super::collection::CollectionBuilder;
use super::FieldReader;
use crate::analyzer::prelude::*;
use crate::ast::{Collection, FeedDetails, NodeDetails, NodeKind};
use crate::builder::{AstBuilder, NodeBuilder};
use crate::path::FieldPath;

const FEED_METADATA: [&str; 3] = ["numberOfItems", "itemsPerPage", "currentPage"];

/// Builds an OPDS 2.0 feed: a collection whose metadata carries a title and
/// optional paging counters.
#[derive(Debug, Clone)]
pub struct FeedBuilder {
    collection: CollectionBuilder,
}

impl Default for FeedBuilder {
    fn default() -> Self {
        Self {
            collection: CollectionBuilder::requiring_metadata(&["title"])
                .consuming_metadata(&FEED_METADATA),
        }
    }
}

impl FeedBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeBuilder for FeedBuilder {
    fn build(
        &self,
        builder: &mut AstBuilder<'_>,
        input: &Value,
        path: &FieldPath,
        kind: NodeKind,
    ) -> Collection {
        let mut collection = self.collection.build(builder, input, path, kind);

        let Some(metadata) = input.get("metadata").filter(|value| value.is_object()) else {
            return collection;
        };
        let ctx = builder.context();
        let metadata_path = path.key("metadata");
        if let Ok(mut reader) = FieldReader::new(metadata, &metadata_path, &ctx, "metadata") {
            let details = FeedDetails {
                number_of_items: reader.optional("numberOfItems", unsigned()),
                items_per_page: reader.optional("itemsPerPage", unsigned()),
                current_page: reader.optional("currentPage", unsigned()),
            };
            collection.details = NodeDetails::Feed(details);
            builder.absorb(reader.finish(()));
        }
        collection
    }
}
