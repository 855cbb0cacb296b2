//! Custom attributes computed by registered functions.
//!
//! A stylesheet declares `-fn-<attribute>: "<source>"` inside a rule; the attribute then
//! resolves through that function for elements matched by the rule's selector or nested
//! inside them. When several registrations match, the most specific selector wins and a
//! tie goes to the one registered last.

pub mod source;

use crate::algebra::selector_specificity;
use crate::dom::{DomAdapter, ElementSet};
use crate::error::Result;
use crate::expectation::Expectation;
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

pub use source::SourceFunction;

/// Property prefix that declares a custom attribute function.
pub const FN_PREFIX: &str = "-fn-";

/// A callback producing the value of a custom attribute for a target set.
pub trait AttributeFunction<D: DomAdapter>: Send + Sync {
    fn evaluate(
        &self,
        doc: &D,
        target: &ElementSet<D::Element>,
        attribute: &str,
        expectation: &Expectation,
    ) -> Option<String>;
}

impl<D, F> AttributeFunction<D> for F
where
    D: DomAdapter,
    F: Fn(&D, &ElementSet<D::Element>, &str, &Expectation) -> Option<String> + Send + Sync,
{
    fn evaluate(
        &self,
        doc: &D,
        target: &ElementSet<D::Element>,
        attribute: &str,
        expectation: &Expectation,
    ) -> Option<String> {
        self(doc, target, attribute, expectation)
    }
}

/// The attribute name declared by a property, if it is a `-fn-` property.
pub fn fn_attribute_name(property: &str) -> Option<&str> {
    property
        .strip_prefix(FN_PREFIX)
        .filter(|name| !name.is_empty())
}

/// One registered function with the selector scoping it.
pub struct FnAttribute<D: DomAdapter> {
    pub attribute: String,
    pub selector: String,
    pub function: Arc<dyn AttributeFunction<D>>,
    pub specificity: u64,
}

impl<D: DomAdapter> Clone for FnAttribute<D> {
    fn clone(&self) -> Self {
        Self {
            attribute: self.attribute.clone(),
            selector: self.selector.clone(),
            function: Arc::clone(&self.function),
            specificity: self.specificity,
        }
    }
}

impl<D: DomAdapter> fmt::Debug for FnAttribute<D> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FnAttribute")
            .field("attribute", &self.attribute)
            .field("selector", &self.selector)
            .field("specificity", &self.specificity)
            .finish_non_exhaustive()
    }
}

impl<D: DomAdapter> FnAttribute<D> {
    /// # Errors
    /// Fails if the selector cannot be parsed for its specificity.
    pub fn new(
        attribute: &str,
        function: Arc<dyn AttributeFunction<D>>,
        selector: &str,
        inline: bool,
        important: bool,
    ) -> Result<Self> {
        Ok(Self {
            attribute: attribute.to_owned(),
            selector: selector.to_owned(),
            function,
            specificity: selector_specificity(selector, inline, important)?,
        })
    }

    /// True if any element of the set, or one of its ancestors, matches the selector.
    ///
    /// # Errors
    /// Fails if the selector cannot be parsed by the document.
    pub fn match_element(&self, doc: &D, target: &ElementSet<D::Element>) -> Result<bool> {
        let nested = format!("{} *", self.selector);
        for element in target.iter() {
            if doc.matches(element, &self.selector)? || doc.matches(element, &nested)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn evaluate(
        &self,
        doc: &D,
        target: &ElementSet<D::Element>,
        expectation: &Expectation,
    ) -> Option<String> {
        self.function
            .evaluate(doc, target, &self.attribute, expectation)
    }
}

/// Pick the most specific candidate; the later one wins a tie.
pub(crate) fn most_specific<'a, D: DomAdapter>(
    candidates: impl IntoIterator<Item = &'a FnAttribute<D>>,
) -> Option<&'a FnAttribute<D>> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.specificity < current.specificity => Some(current),
        _ => Some(candidate),
    })
}

/// Attribute name to registered functions, in registration order.
pub struct FunctionRegistry<D: DomAdapter> {
    attributes: HashMap<String, Vec<FnAttribute<D>>>,
}

impl<D: DomAdapter> Default for FunctionRegistry<D> {
    fn default() -> Self {
        Self {
            attributes: HashMap::new(),
        }
    }
}

impl<D: DomAdapter> FunctionRegistry<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for `attribute` under `selector`.
    ///
    /// # Errors
    /// Fails if the selector cannot be parsed.
    pub fn register(
        &mut self,
        attribute: &str,
        function: Arc<dyn AttributeFunction<D>>,
        selector: &str,
        inline: bool,
        important: bool,
    ) -> Result<()> {
        let fn_attribute = FnAttribute::new(attribute, function, selector, inline, important)?;
        self.attributes
            .entry(attribute.to_owned())
            .or_default()
            .push(fn_attribute);
        Ok(())
    }

    /// Compile `source` and register it.
    ///
    /// # Errors
    /// Fails if the source form is unsupported or the selector cannot be parsed.
    pub fn register_source(
        &mut self,
        attribute: &str,
        source: &str,
        selector: &str,
        inline: bool,
        important: bool,
    ) -> Result<()> {
        let function = SourceFunction::compile(source)?;
        self.register(attribute, Arc::new(function), selector, inline, important)
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.values().map(Vec::len).sum()
    }

    pub fn get(&self, attribute: &str) -> &[FnAttribute<D>] {
        self.attributes
            .get(attribute)
            .map_or(&[], Vec::as_slice)
    }

    /// The winning function for `attribute` on the target set, if any matches.
    ///
    /// # Errors
    /// Fails if a registered selector cannot be parsed by the document.
    pub fn lookup(
        &self,
        doc: &D,
        target: &ElementSet<D::Element>,
        attribute: &str,
    ) -> Result<Option<&FnAttribute<D>>> {
        let mut matching = Vec::new();
        for candidate in self.get(attribute) {
            if candidate.match_element(doc, target)? {
                matching.push(candidate);
            }
        }
        Ok(most_specific(matching))
    }
}
