//! # Field Analyzer
//!
//! The analyzer turns individual JSON values into typed values using a parser
//! combinator design.
//!
//! ## Core Components
//!
//! * **Parser Trait**: One JSON value in, one typed value or one error out
//! * **Primitives**: Language tags, media types, date-times and URI resolution
//! * **Combinators**: Arrays, one-or-many values, alternatives and validation
//! * **Node Parsers**: Metadata, links and the collection builders of each profile
//!
//! ## Position in the Pipeline
//!
//! ```text
//! JSON → Syntax Gate → Analyzer / AST Builder → Semantic Rules → Manifest
//! ```
//!
//! ## Usage Example
//!
//! ```ignore
//! use webpub_manifest::analyzer::prelude::*;
//! use webpub_manifest::analyzer::Parser;
//!
//! let languages = one_or_many(language_tag());
//! let result = languages.parse(&json!(["en", "fr"]), &FieldPath::root(), &ctx);
//! ```

pub mod combinators;
pub mod core;
pub mod parsers;
pub mod prelude;
pub mod primitives;
pub mod uri_template;

pub use core::FieldResult;
pub use core::ParseContext;
pub use core::Parser;
pub use core::Partial;
