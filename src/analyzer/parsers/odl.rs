use serde_json::Value;

use super::collection::CollectionBuilder;
use super::FieldReader;
use crate::analyzer::core::{FieldResult, ParseContext, Parser, Partial};
use crate::analyzer::prelude::*;
use crate::ast::{
    Collection, LicenseDetails, LicenseProtection, LicenseTerms, NodeDetails, NodeKind,
};
use crate::builder::{AstBuilder, NodeBuilder};
use crate::path::FieldPath;

const LICENSE_METADATA: [&str; 4] = ["format", "created", "terms", "protection"];

/// Builds an ODL license: a collection whose metadata describes the loan
/// terms and the protection applied to the licensed copies.
///
/// `identifier`, `format` and `created` are mandatory.
#[derive(Debug, Clone)]
pub struct LicenseBuilder {
    collection: CollectionBuilder,
}

impl Default for LicenseBuilder {
    fn default() -> Self {
        Self {
            collection: CollectionBuilder::requiring_metadata(&["identifier"])
                .consuming_metadata(&LICENSE_METADATA),
        }
    }
}

impl LicenseBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeBuilder for LicenseBuilder {
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
            let details = LicenseDetails {
                identifier: collection.metadata.identifier.clone(),
                formats: reader
                    .required_partial("format", one_or_many(media_type()))
                    .unwrap_or_default(),
                created: reader.required("created", date_time()),
                terms: reader.optional_partial("terms", TermsParser),
                protection: reader.optional_partial("protection", ProtectionParser),
            };
            collection.details = NodeDetails::License(details);
            builder.absorb(reader.finish(()));
        }
        collection
    }
}

/// The `terms` object of a license
#[derive(Debug, Clone, Copy, Default)]
pub struct TermsParser;

impl Parser<Partial<LicenseTerms>> for TermsParser {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<LicenseTerms>> {
        let mut reader = FieldReader::new(input, path, ctx, "license terms")?;
        let terms = LicenseTerms {
            checkouts: reader.optional("checkouts", unsigned()),
            expires: reader.optional("expires", date_time()),
            concurrency: reader.optional("concurrency", unsigned()),
            length: reader.optional("length", unsigned()),
        };
        Ok(reader.finish(terms))
    }
}

/// The `protection` object of a license
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtectionParser;

impl Parser<Partial<LicenseProtection>> for ProtectionParser {
    fn parse(
        &self,
        input: &Value,
        path: &FieldPath,
        ctx: &ParseContext<'_>,
    ) -> FieldResult<Partial<LicenseProtection>> {
        let mut reader = FieldReader::new(input, path, ctx, "license protection")?;
        let protection = LicenseProtection {
            formats: reader
                .optional_partial("format", one_or_many(media_type()))
                .unwrap_or_default(),
            devices: reader.optional("devices", unsigned()),
            copy: reader.optional("copy", boolean()),
            print: reader.optional("print", boolean()),
            tts: reader.optional("tts", boolean()),
        };
        Ok(reader.finish(protection))
    }
}
