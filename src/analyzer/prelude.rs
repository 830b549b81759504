use super::combinators::*;
use super::core::Parser;

pub fn string() -> Str {
    Str
}

pub fn number() -> Number {
    Number
}

pub fn unsigned() -> UnsignedInteger {
    UnsignedInteger
}

pub fn boolean() -> Boolean {
    Boolean
}

pub fn uri() -> Uri {
    Uri
}

pub fn uri_or_template(templated: bool) -> UriOrTemplate {
    UriOrTemplate::new(templated)
}

pub fn media_type() -> MediaTypeParser {
    MediaTypeParser
}

pub fn language_tag() -> LanguageTag {
    LanguageTag
}

pub fn date_time() -> DateTimeParser {
    DateTimeParser
}

pub fn localized_string() -> LanguageMap {
    LanguageMap
}

pub fn array_of<P, O>(parser: P) -> ArrayOf<P, O>
where
    P: Parser<O>,
{
    ArrayOf::new(parser)
}

pub fn one_or_many<P, O>(parser: P) -> OneOrManyOf<P, O>
where
    P: Parser<O>,
{
    OneOrManyOf::new(parser)
}

pub fn one_of<O>(parsers: Vec<Box<dyn Parser<O>>>) -> OneOf<O> {
    OneOf::new(parsers)
}

pub fn map<P, F, A, B>(parser: P, f: F) -> Map<P, F, A, B>
where
    P: Parser<A>,
    F: Fn(A) -> B,
{
    Map::new(parser, f)
}

pub fn map_res<P, F, A, B>(parser: P, f: F) -> MapRes<P, F, A, B>
where
    P: Parser<A>,
    F: Fn(A, &crate::path::FieldPath) -> super::core::FieldResult<B>,
{
    MapRes::new(parser, f)
}

pub fn satisfy<P, F, O>(parser: P, check: F) -> Satisfy<P, F, O>
where
    P: Parser<O>,
    F: Fn(&O) -> Result<(), String>,
{
    Satisfy::new(parser, check)
}

pub fn required<P, O>(key: &str, parser: P) -> Required<'_, P, O>
where
    P: Parser<O>,
{
    Required::new(key, parser)
}

pub fn optional<P, O>(key: &str, parser: P) -> OptionalField<'_, P, O>
where
    P: Parser<O>,
{
    OptionalField::new(key, parser)
}
