//! # Primitive Value Formats
//!
//! String-level recognizers shared by the field combinators: language tags,
//! media types, date-times and URI references.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use crate::ast::Href;

lazy_static! {
    static ref LANGUAGE_TAG: Regex =
        Regex::new(r"^[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*$").unwrap();
    static ref MEDIA_TYPE: Regex = Regex::new(
        r#"^[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]{0,126}/[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]{0,126}(\s*;\s*[A-Za-z0-9!#$&^_.+-]+\s*=\s*("[^"]*"|[^;\s"]+))*\s*$"#
    )
    .unwrap();
}

/// Simplified BCP 47 check: a primary subtag followed by alphanumeric subtags
pub fn is_language_tag(value: &str) -> bool {
    LANGUAGE_TAG.is_match(value)
}

/// RFC 6838 `type/subtype` with optional `; key=value` parameters
pub fn is_media_type(value: &str) -> bool {
    MEDIA_TYPE.is_match(value.trim())
}

/// Accepts RFC 3339 date-times, date-times without an offset (read as UTC)
/// and bare dates (midnight UTC).
pub fn parse_date_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.with_timezone(&Utc));
    }
    if let Ok(date_time) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(date_time.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date_time| date_time.and_utc())
}

/// Outcome of reading a URI reference
#[derive(Debug, Clone, PartialEq)]
pub enum UriReference {
    Absolute(Url),
    Relative(String),
}

/// Splits a string into an absolute URI or a relative reference.
///
/// Any failure other than a missing scheme is reported as the parser's message.
pub fn classify_uri(value: &str) -> Result<UriReference, String> {
    match Url::parse(value) {
        Ok(url) => Ok(UriReference::Absolute(url)),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Ok(UriReference::Relative(value.to_string()))
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Builds an href from a non-templated reference, resolving it against `base` when asked to
pub fn resolve_href(value: &str, base: &Url, resolve: bool) -> Result<Href, String> {
    match classify_uri(value)? {
        UriReference::Absolute(url) => Ok(Href::Uri(url)),
        UriReference::Relative(reference) if resolve => base
            .join(&reference)
            .map(Href::Uri)
            .map_err(|e| e.to_string()),
        UriReference::Relative(reference) => Ok(Href::Reference(reference)),
    }
}
