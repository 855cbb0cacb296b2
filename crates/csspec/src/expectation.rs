//! Expectations: one declaration of a test rule, compared against the fixture.
//!
//! The expected side of a declaration may reference values of other elements with
//! `selector[attribute]` terms. The selector is relative to the test target:
//!
//! - `^`, `^^`, ... walk back that many clauses of the test selector,
//! - `^*` is every ancestor of the target, closest first,
//! - `&` is the target itself and `&&`, `&&&`, ... are `^`, `^^`, ...,
//! - a bare selector is searched below the target.
//!
//! An empty selector (`[color]`) reads the attribute of the target.

use crate::algebra::{split_clauses, unquote};
use crate::dom::{DomAdapter, ElementSet};
use crate::error::Result;
use crate::stylesheet::StylesheetRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[allow(clippy::expect_used, reason = "pattern is a valid literal")]
static ATTRIBUTE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(?(([.#:]*[^.#:)]+\s*)*)\)?\[([^\]]+)\]").expect("valid regex pattern")
});

#[allow(clippy::expect_used, reason = "pattern is a valid literal")]
static RELATIVE_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((\^+)(\*)?|(&))?(\S+)?(\s+(.+))?").expect("valid regex pattern")
});

/// Rendering of an attribute that resolved to nothing.
const MISSING: &str = "(none)";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Expectation {
    pub attribute: String,
    pub expected: String,
}

impl Expectation {
    pub fn new(attribute: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            expected: expected.into(),
        }
    }

    /// Compare the attribute of `target` with the expected expression.
    ///
    /// Returns `None` when they agree, or the failure message.
    ///
    /// # Errors
    /// Propagates selector errors from relative references and custom attributes.
    pub fn test<D: DomAdapter>(
        &self,
        doc: &D,
        registry: &StylesheetRegistry<D>,
        target: &ElementSet<D::Element>,
    ) -> Result<Option<String>> {
        let actual = self.resolve_attribute(doc, registry, target, &self.attribute)?;
        let expected = self.resolve_expression(doc, registry, target, &self.expected)?;
        if actual.as_deref().unwrap_or_default() == expected {
            return Ok(None);
        }
        Ok(Some(format!(
            "expected :{} to be {} but was {}.",
            self.attribute,
            expected,
            actual.as_deref().unwrap_or(MISSING)
        )))
    }

    /// A custom attribute function if one applies and is at least as specific as the
    /// declaration winning the cascade, otherwise the computed style of the first element.
    ///
    /// # Errors
    /// Fails if a custom attribute selector cannot be matched.
    pub fn resolve_attribute<D: DomAdapter>(
        &self,
        doc: &D,
        registry: &StylesheetRegistry<D>,
        target: &ElementSet<D::Element>,
        attribute: &str,
    ) -> Result<Option<String>> {
        let function = registry
            .element_fn_attribute(doc, target, attribute)?
            .filter(|function| {
                target
                    .first()
                    .and_then(|element| doc.declared_weight(element, attribute))
                    .is_none_or(|declared| function.specificity >= declared)
            });
        if let Some(function) = function {
            let value = function
                .evaluate(doc, target, self)
                .filter(|value| !value.is_empty());
            if value.is_some() {
                return Ok(value);
            }
        }
        Ok(target
            .first()
            .and_then(|element| doc.computed_style(element, attribute)))
    }

    /// Unquote `expression` and substitute every `selector[attribute]` reference.
    ///
    /// # Errors
    /// Fails if a relative selector cannot be parsed.
    pub fn resolve_expression<D: DomAdapter>(
        &self,
        doc: &D,
        registry: &StylesheetRegistry<D>,
        target: &ElementSet<D::Element>,
        expression: &str,
    ) -> Result<String> {
        let expression = unquote(expression);
        let mut resolved = String::with_capacity(expression.len());
        let mut last = 0;
        for captures in ATTRIBUTE_REFERENCE.captures_iter(expression) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let relative = captures.get(1).map_or("", |found| found.as_str()).trim();
            let attribute = captures.get(3).map_or("", |found| found.as_str());
            let element = if relative.is_empty() {
                target.clone()
            } else {
                resolve_relative_element(doc, relative, target)?
            };
            let value = self.resolve_attribute(doc, registry, &element, attribute)?;
            resolved.push_str(&expression[last..whole.start()]);
            resolved.push_str(value.as_deref().unwrap_or_default());
            last = whole.end();
        }
        resolved.push_str(&expression[last..]);
        Ok(resolved)
    }
}

/// Rewrite a leading run of two or more `&` into one fewer `^`.
fn normalize_ampersands(relative: &str) -> String {
    let count = relative.chars().take_while(|&character| character == '&').count();
    if count < 2 {
        return relative.to_owned();
    }
    format!("{}{}", "^".repeat(count - 1), &relative[count..])
}

/// Resolve a relative element reference against the current target.
///
/// # Errors
/// Fails if a selector in the reference cannot be parsed.
pub fn resolve_relative_element<D: DomAdapter>(
    doc: &D,
    relative: &str,
    current: &ElementSet<D::Element>,
) -> Result<ElementSet<D::Element>> {
    let relative = normalize_ampersands(relative.trim());
    let Some(captures) = RELATIVE_ELEMENT.captures(&relative) else {
        return Ok(current.clone());
    };
    let carets = captures.get(2).map(|found| found.as_str().len());
    let star = captures.get(3).is_some();
    let ampersand = captures.get(4).is_some();
    let mut selector = captures.get(5).map(|found| found.as_str().to_owned());
    let mut child = captures.get(7).map(|found| found.as_str().to_owned());

    let mut single = false;
    let mut set = current.clone();
    match carets {
        Some(_) if star => set = current.parents(doc, None)?,
        Some(count) => {
            single = true;
            let clauses = split_clauses(&current.selector);
            let initial = clauses[..clauses.len().saturating_sub(count)].join(" ");
            let filter = Some(initial.as_str()).filter(|initial| !initial.is_empty());
            let walk = clauses
                .last()
                .and_then(|clause| clause.chars().next())
                .unwrap_or(' ');
            set = match walk {
                '>' => current.parent(doc),
                '+' => current.prev(doc),
                '~' => current.prev_all(doc, filter)?,
                _ => current.parents(doc, filter)?,
            };
        }
        None if ampersand => {}
        None => {
            let descendant = format!(
                "{} {}",
                selector.take().unwrap_or_default(),
                child.take().unwrap_or_default()
            );
            child = Some(descendant.trim().to_owned()).filter(|descendant| !descendant.is_empty());
        }
    }

    if let Some(selector) = selector.as_deref() {
        set = set.filter(doc, selector)?;
    }
    if let Some(child) = child.as_deref() {
        set = set.find(doc, child)?;
    }
    Ok(if single { set.at(0) } else { set })
}
