//! # webpub-manifest: Typed Readium Manifests, OPDS 2.0 Feeds and ODL
//!
//! Parses JSON documents of the Readium Web Publication Manifest family into
//! a typed document model and reports everything wrong with them as
//! located, classified diagnostics.
//!
//! ## Profiles
//!
//! Three profiles are supported, each layered on the previous one:
//! - RWPM: publication manifests
//! - OPDS 2.0: catalog feeds of publications, navigation, facets and groups
//! - ODL: OPDS 2.0 feeds whose publications carry library licenses
//!
//! Everything that differs between profiles (media types, link relations,
//! sub-collection roles, node builders, semantic rules and structural schemas)
//! lives in the [`registry`].
//!
//! ## Processing Pipeline
//!
//! ```text
//! JSON → Syntax Gate → AST Builder → Semantic Analyzer → ParseResult
//! ```
//!
//! ### Stage 1: Syntax Gate
//!
//! The [`syntax`] module validates the document against the profile's JSON
//! Schema. Any violation is a fatal `Syntax` error and no manifest is built.
//!
//! ### Stage 2: AST Building
//!
//! The [`builder`] module builds the [`ast`] bottom-up with the field parsers
//! of the [`analyzer`]. Malformed fields become `Parsing` errors and fall back
//! to defaults; the build always completes.
//!
//! ### Stage 3: Semantic Analysis
//!
//! The [`semantic`] module runs the profile's rules over the finished tree and
//! reports cross-field and cross-node problems as `Semantic` errors.
//!
//! ## Entry Points
//!
//! [`parse`] and [`parse_str`] use the default registry and configuration.
//! [`ManifestParser`] takes a custom [`Registry`] and [`ParserConfig`].
//!
//! ```ignore
//! use webpub_manifest::{parse, Profile};
//!
//! let base = url::Url::parse("https://pub.example/")?;
//! let result = parse(&document, Profile::Rwpm, &base);
//! for error in &result.errors {
//!     eprintln!("{}", error);
//! }
//! ```

pub mod analyzer;
pub mod ast;
pub mod builder;
pub mod config;
pub mod error;
pub mod manifest_parser;
pub mod path;
pub mod registry;
pub mod semantic;
pub mod syntax;

// Re-exports
pub use ast::*;
pub use config::ParserConfig;
pub use error::*;
pub use manifest_parser::{parse, parse_str, ManifestParser, ParseResult};
pub use path::{FieldPath, PathSegment};
pub use registry::{Cardinality, CollectionRole, MediaTypeFlags, Profile, Registry, RegistryBuilder};
