#![allow(dead_code)]

use serde_json::Value;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use url::Url;
use webpub_manifest::{ErrorKind, ManifestParser, ParseResult, ParserConfig, Profile, Registry};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub const RWPM_MOBY_DICK: &str = include_str!("../fixtures/rwpm_moby_dick.json");
pub const OPDS2_CATALOG: &str = include_str!("../fixtures/opds2_catalog.json");
pub const ODL_LIBRARY: &str = include_str!("../fixtures/odl_library.json");

pub fn fixture(text: &str) -> Value {
    serde_json::from_str(text).expect("fixture is valid JSON")
}

pub fn base() -> Url {
    Url::parse("https://pub.example/").unwrap()
}

pub fn parse_as(document: &Value, profile: Profile) -> ParseResult {
    webpub_manifest::parse(document, profile, &base())
}

pub fn parse_with_config(document: &Value, profile: Profile, config: ParserConfig) -> ParseResult {
    let registry = Registry::default_registry().unwrap();
    ManifestParser::new(registry, config)
        .unwrap()
        .parse(document, profile, &base())
}

/// `(path, message)` of every error of `kind`
pub fn errors_of(result: &ParseResult, kind: ErrorKind) -> Vec<(String, String)> {
    result
        .errors
        .of_kind(kind)
        .map(|e| (e.path.to_string(), e.message.clone()))
        .collect()
}
