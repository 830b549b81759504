use serde_json::Value;
use tracing::trace;

use super::link::links;
use super::metadata::MetadataParser;
use super::FieldReader;
use crate::analyzer::core::Parser;
use crate::ast::{Collection, NodeKind, OneOrMany, SubCollection};
use crate::builder::{AstBuilder, NodeBuilder};
use crate::error::ValidationError;
use crate::path::FieldPath;
use crate::registry::CollectionRole;

/// Builds any collection-like node: `metadata`, `links` and the sub-collection
/// roles the registry knows for the node kind.
///
/// Keys that are neither of those are kept as extensions. Profile builders
/// wrap this one and add their typed details on top.
#[derive(Debug, Clone, Default)]
pub struct CollectionBuilder {
    metadata_required: bool,
    metadata: MetadataParser,
}

impl CollectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `metadata` must be present and carry `fields`
    pub fn requiring_metadata(fields: &[&'static str]) -> Self {
        Self {
            metadata_required: true,
            metadata: MetadataParser::new().requiring(fields),
        }
    }

    /// Metadata keys read by a wrapping builder
    pub fn consuming_metadata(mut self, fields: &[&'static str]) -> Self {
        self.metadata = self.metadata.consuming(fields);
        self
    }

    fn build_body(
        &self,
        builder: &mut AstBuilder<'_>,
        input: &Value,
        path: &FieldPath,
        kind: NodeKind,
    ) -> Collection {
        let mut collection = Collection::new(kind, path.clone());
        let ctx = builder.context();
        let what = kind.to_string().to_lowercase();
        let mut reader = match FieldReader::new(input, path, &ctx, &what) {
            Ok(reader) => reader,
            Err(error) => {
                builder.record(error);
                return collection;
            }
        };
        if kind == NodeKind::Manifest {
            reader.mark_known(&["@context"]);
        }

        let metadata = if self.metadata_required {
            reader.required_partial("metadata", &self.metadata)
        } else {
            reader.optional_partial("metadata", &self.metadata)
        };
        if let Some(metadata) = metadata {
            collection.metadata = metadata;
        }
        collection.links = reader.optional_partial("links", links()).unwrap_or_default();

        let registry = builder.registry();
        let profile = builder.profile();
        let mut roles: Vec<(&CollectionRole, &Value)> = Vec::new();
        for key in reader.unread_keys() {
            if let Some(role) = registry.collection_role(profile, kind, key) {
                if let Some(value) = reader.raw(key) {
                    roles.push((role, value));
                }
            }
        }
        collection.extensions = reader.extensions();
        builder.absorb(reader.finish(()));

        for (role, value) in roles {
            trace!("building role {} of {}", role.name, path.label());
            if let Some(sub) = build_role(builder, role, value, &path.key(role.name.as_str())) {
                collection.sub_collections.push(sub);
            }
        }
        collection
    }
}

impl NodeBuilder for CollectionBuilder {
    fn build(
        &self,
        builder: &mut AstBuilder<'_>,
        input: &Value,
        path: &FieldPath,
        kind: NodeKind,
    ) -> Collection {
        self.build_body(builder, input, path, kind)
    }
}

/// Builds the collections filed under one role, in the shape the role allows
fn build_role(
    builder: &mut AstBuilder<'_>,
    role: &CollectionRole,
    value: &Value,
    path: &FieldPath,
) -> Option<SubCollection> {
    let collections = if role.compact {
        let ctx = builder.context();
        match links().parse(value, path, &ctx) {
            Ok(partial) => {
                OneOrMany::One(Collection::compact(builder.absorb(partial), path.clone()))
            }
            Err(error) => {
                builder.record(error);
                return None;
            }
        }
    } else {
        match value {
            Value::Array(items) => OneOrMany::Many(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| builder.build_collection(role.kind, item, &path.index(i)))
                    .collect(),
            ),
            Value::Object(_) if !role.multiple => {
                OneOrMany::One(builder.build_collection(role.kind, value, path))
            }
            _ => {
                let expected = if role.multiple {
                    "an array of collections"
                } else {
                    "a collection object"
                };
                builder.record(ValidationError::expected(path.clone(), expected, value));
                return None;
            }
        }
    };
    Some(SubCollection::new(&role.name, collections, path.clone()))
}
