//! Compiles the textual `-fn-*` function sources into callbacks.
//!
//! Only a small expression language is accepted, optionally wrapped in
//! `function(...) { ... }` with an optional `return` and trailing `;`:
//!
//! | source | value |
//! |---|---|
//! | `42`, `-1.5` | the number as written |
//! | `'text'`, `"text"` | the string |
//! | `true`, `false` | the keyword |
//! | `attribute` | the attribute name being resolved |
//! | `$el.css('prop')` | computed style of the first element |
//! | `$el.attr('name')` | attribute of the first element |
//! | `$el.html()` / `$el.text()` | inner markup / text of the first element |
//! | `$el.hasClass('x')` | `true` if any element has the class |
//! | `$el.length` | number of elements in the set |

use super::AttributeFunction;
use crate::algebra::unquote;
use crate::dom::{DomAdapter, ElementSet};
use crate::error::{CsspecError, Result};
use crate::expectation::Expectation;
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used, reason = "pattern is a valid literal")]
static FUNCTION_WRAPPER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^function\s*\([^)]*\)\s*\{(?s)(.*)\}$").expect("valid regex pattern")
});

#[allow(clippy::expect_used, reason = "pattern is a valid literal")]
static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)$").expect("valid regex pattern"));

#[allow(clippy::expect_used, reason = "pattern is a valid literal")]
static ELEMENT_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\$el\.(css|attr|html|text|hasClass)\(\s*(?:'([^']*)'|"([^"]*)")?\s*\)$"#)
        .expect("valid regex pattern")
});

/// A compiled function source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceFunction {
    Literal(String),
    AttributeName,
    Css(String),
    Attr(String),
    Html,
    Text,
    HasClass(String),
    Length,
}

impl SourceFunction {
    /// # Errors
    /// Returns [`CsspecError::FunctionSource`] for anything outside the accepted forms.
    pub fn compile(source: &str) -> Result<Self> {
        let unsupported = || CsspecError::FunctionSource {
            text: source.to_owned(),
        };
        let mut body = source.trim();
        if let Some(captures) = FUNCTION_WRAPPER.captures(body) {
            body = captures.get(1).map_or("", |inner| inner.as_str()).trim();
        }
        if let Some(rest) = body.strip_prefix("return") {
            if !rest.starts_with(char::is_whitespace) && !rest.is_empty() {
                return Err(unsupported());
            }
            body = rest.trim_start();
        }
        body = body.strip_suffix(';').unwrap_or(body).trim_end();

        if body.is_empty() {
            return Err(unsupported());
        }
        if NUMBER.is_match(body) || body == "true" || body == "false" {
            return Ok(Self::Literal(body.to_owned()));
        }
        let quoted = (body.starts_with('\'') && body.ends_with('\''))
            || (body.starts_with('"') && body.ends_with('"'));
        if quoted && body.len() >= 2 {
            return Ok(Self::Literal(unquote(body).to_owned()));
        }
        if body == "attribute" {
            return Ok(Self::AttributeName);
        }
        if body == "$el.length" {
            return Ok(Self::Length);
        }
        let captures = ELEMENT_CALL.captures(body).ok_or_else(unsupported)?;
        let argument = captures
            .get(2)
            .or_else(|| captures.get(3))
            .map(|value| value.as_str().to_owned());
        let method = captures.get(1).map_or("", |method| method.as_str());
        match (method, argument) {
            ("css", Some(property)) => Ok(Self::Css(property)),
            ("attr", Some(name)) => Ok(Self::Attr(name)),
            ("hasClass", Some(class)) => Ok(Self::HasClass(class)),
            ("html", None) => Ok(Self::Html),
            ("text", None) => Ok(Self::Text),
            _ => Err(unsupported()),
        }
    }
}

impl<D: DomAdapter> AttributeFunction<D> for SourceFunction {
    fn evaluate(
        &self,
        doc: &D,
        target: &ElementSet<D::Element>,
        attribute: &str,
        _expectation: &Expectation,
    ) -> Option<String> {
        match self {
            Self::Literal(value) => Some(value.clone()),
            Self::AttributeName => Some(attribute.to_owned()),
            Self::Length => Some(target.len().to_string()),
            Self::HasClass(class) => Some(
                target
                    .iter()
                    .any(|element| doc.has_class(element, class))
                    .to_string(),
            ),
            Self::Css(property) => doc.computed_style(target.first()?, property),
            Self::Attr(name) => doc.attribute(target.first()?, name),
            Self::Html => Some(doc.inner_markup(target.first()?)),
            Self::Text => Some(doc.text(target.first()?)),
        }
    }
}
