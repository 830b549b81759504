//! # URI Templates
//!
//! Recognizes RFC 6570 templates such as `/search{?query,page}` and extracts
//! the variable names they reference. Templates are validated, never expanded.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, map, opt, recognize},
    error::{context, VerboseError},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, terminated},
    IResult,
};

use crate::ast::UriTemplate;

type TemplateResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Debug, PartialEq)]
enum Part<'a> {
    Literal(&'a str),
    Expression(Vec<&'a str>),
}

fn literal(input: &str) -> TemplateResult<Part<'_>> {
    context(
        "literal",
        map(take_while1(|c: char| c != '{' && c != '}'), Part::Literal),
    )(input)
}

fn is_varchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '%'
}

fn variable_name(input: &str) -> TemplateResult<&str> {
    context(
        "variable name",
        recognize(separated_list1(char('.'), take_while1(is_varchar))),
    )(input)
}

fn modifier(input: &str) -> TemplateResult<Option<&str>> {
    opt(alt((tag("*"), recognize(preceded(char(':'), digit1)))))(input)
}

fn variable_spec(input: &str) -> TemplateResult<&str> {
    terminated(variable_name, modifier)(input)
}

#[tracing::instrument(level = "trace", skip(input))]
fn expression(input: &str) -> TemplateResult<Part<'_>> {
    context(
        "expression",
        map(
            delimited(
                char('{'),
                preceded(
                    opt(one_of("+#./;?&=,!@|")),
                    separated_list1(char(','), variable_spec),
                ),
                char('}'),
            ),
            Part::Expression,
        ),
    )(input)
}

fn template(input: &str) -> TemplateResult<Vec<Part<'_>>> {
    all_consuming(many0(alt((expression, literal))))(input)
}

/// Parses a URI template.
///
/// Returns the template with its distinct variable names in order of first
/// appearance, or a message locating the first malformed character.
pub fn parse_uri_template(input: &str) -> Result<UriTemplate, String> {
    let (_, parts) = template(input).map_err(|e| match e {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = e
                .errors
                .first()
                .map(|(rest, _)| input.len() - rest.len())
                .unwrap_or_default();
            format!("malformed URI template at offset {}", offset)
        }
        nom::Err::Incomplete(_) => "incomplete URI template".to_string(),
    })?;

    let mut variables: Vec<String> = Vec::new();
    let mut expressions = 0;
    for part in parts {
        if let Part::Expression(names) = part {
            expressions += 1;
            for name in names {
                if !variables.iter().any(|known| known == name) {
                    variables.push(name.to_string());
                }
            }
        }
    }

    Ok(UriTemplate {
        template: input.to_string(),
        variables,
        expressions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_expressions() {
        let template = parse_uri_template("https://example.org/search{?query,page}").unwrap();
        assert_eq!(template.variables, vec!["query", "page"]);
        assert_eq!(template.expressions, 1);
        assert!(template.has_expressions());
    }

    #[test]
    fn test_modifiers_and_repeats() {
        let template = parse_uri_template("/books/{id}/{id:3}{/path*}{#frag}").unwrap();
        assert_eq!(template.variables, vec!["id", "path", "frag"]);
        assert_eq!(template.expressions, 4);
    }

    #[test]
    fn test_no_expressions() {
        let template = parse_uri_template("https://example.org/static").unwrap();
        assert!(!template.has_expressions());
        assert!(template.variables.is_empty());
    }

    #[test]
    fn test_malformed() {
        assert!(parse_uri_template("/search{?query").is_err());
        assert!(parse_uri_template("/search{}").is_err());
        assert!(parse_uri_template("/search}").is_err());
        let message = parse_uri_template("/a{b c}").unwrap_err();
        assert!(message.starts_with("malformed URI template"));
    }
}
