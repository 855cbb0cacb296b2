//! The document capability the engine runs against.
//!
//! [`DomAdapter`] is the narrow set of operations the engine needs from a document;
//! [`ElementSet`] is an ordered, duplicate-free selection of elements plus the selector
//! that produced it, with the traversal helpers relative addressing is built from.

use anyhow::Error;
use core::fmt::Debug;

/// A stylesheet source found in the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StyleSource {
    /// Text of a `<style>` element.
    Inline(String),
    /// The raw `href` of a `<link rel="stylesheet">`.
    Linked(String),
}

pub trait DomAdapter {
    type Element: Copy + Eq + Debug;
    type StyleHandle: Copy + Debug;
    /// Children displaced by [`DomAdapter::replace_inner_markup`], kept for restoring.
    type Detached: Debug;

    /// All elements matching `selector`, in document order.
    ///
    /// # Errors
    /// Returns an error if the selector cannot be parsed.
    fn query(&self, selector: &str) -> Result<Vec<Self::Element>, Error>;

    /// Elements matching `selector` relative to `scope`. A leading combinator is allowed;
    /// without one, descendants of `scope` are searched.
    ///
    /// # Errors
    /// Returns an error if the selector cannot be parsed.
    fn find(&self, scope: Self::Element, selector: &str) -> Result<Vec<Self::Element>, Error>;

    /// # Errors
    /// Returns an error if the selector cannot be parsed.
    fn matches(&self, element: Self::Element, selector: &str) -> Result<bool, Error>;

    fn parent(&self, element: Self::Element) -> Option<Self::Element>;

    /// Ancestor elements, closest first.
    fn ancestors(&self, element: Self::Element) -> Vec<Self::Element>;

    fn previous_sibling(&self, element: Self::Element) -> Option<Self::Element>;

    /// Preceding sibling elements, closest first.
    fn preceding_siblings(&self, element: Self::Element) -> Vec<Self::Element>;

    /// Sort into document order and drop duplicates.
    fn sort_document_order(&self, elements: &mut Vec<Self::Element>);

    fn attribute(&self, element: Self::Element, name: &str) -> Option<String>;

    fn set_attribute(&mut self, element: Self::Element, name: &str, value: &str);

    fn remove_attribute(&mut self, element: Self::Element, name: &str);

    fn has_class(&self, element: Self::Element, class: &str) -> bool;

    /// Returns false if the class was already present.
    fn add_class(&mut self, element: Self::Element, class: &str) -> bool;

    /// Returns false if the class was absent.
    fn remove_class(&mut self, element: Self::Element, class: &str) -> bool;

    fn id(&self, element: Self::Element) -> Option<String> {
        self.attribute(element, "id")
    }

    fn set_id(&mut self, element: Self::Element, id: &str) {
        self.set_attribute(element, "id", id);
    }

    fn inner_markup(&self, element: Self::Element) -> String;

    /// Replace the children of `element` with `markup` parsed in its context and hand back
    /// the previous children.
    ///
    /// # Errors
    /// Returns an error if the markup cannot be parsed.
    fn replace_inner_markup(
        &mut self,
        element: Self::Element,
        markup: &str,
    ) -> Result<Self::Detached, Error>;

    /// Put back children taken by [`DomAdapter::replace_inner_markup`], the same nodes and
    /// not copies.
    ///
    /// # Errors
    /// Returns an error if `element` is gone.
    fn restore_inner(
        &mut self,
        element: Self::Element,
        detached: Self::Detached,
    ) -> Result<(), Error>;

    fn text(&self, element: Self::Element) -> String;

    /// Computed value of a style property, `None` when the property has no value.
    fn computed_style(&self, element: Self::Element, property: &str) -> Option<String>;

    /// Weight of the author declaration winning the cascade for `property`, on the scale
    /// of [`crate::algebra::specificity`]. `None` when no author rule declares it.
    fn declared_weight(&self, element: Self::Element, property: &str) -> Option<u64>;

    /// Attach stylesheet text to the document so it takes part in computed style.
    fn attach_style(&mut self, css: &str) -> Self::StyleHandle;

    /// Returns false if the handle was not attached.
    fn detach_style(&mut self, handle: Self::StyleHandle) -> bool;

    /// Stylesheet sources declared by the page, in document order.
    fn style_sources(&self) -> Vec<StyleSource>;
}

/// An ordered selection of elements and the selector describing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementSet<E> {
    pub nodes: Vec<E>,
    pub selector: String,
}

impl<E: Copy + Eq + Debug> ElementSet<E> {
    pub fn new(nodes: Vec<E>, selector: impl Into<String>) -> Self {
        Self {
            nodes,
            selector: selector.into(),
        }
    }

    /// Select every element of the document matching `selector`.
    ///
    /// # Errors
    /// Returns an error if the selector cannot be parsed.
    pub fn select<D: DomAdapter<Element = E>>(doc: &D, selector: &str) -> Result<Self, Error> {
        Ok(Self::new(doc.query(selector)?, selector))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn first(&self) -> Option<E> {
        self.nodes.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = E> + '_ {
        self.nodes.iter().copied()
    }

    fn derive(&self, nodes: Vec<E>, suffix: &str) -> Self {
        Self::new(nodes, format!("{}{suffix}", self.selector).trim().to_owned())
    }

    /// The element at `index` as a one-element set, or an empty set.
    #[must_use]
    pub fn at(&self, index: usize) -> Self {
        self.derive(self.nodes.get(index).copied().into_iter().collect(), "")
    }

    /// Elements matching `selector` relative to each element of the set.
    ///
    /// # Errors
    /// Returns an error if the selector cannot be parsed.
    pub fn find<D: DomAdapter<Element = E>>(&self, doc: &D, selector: &str) -> Result<Self, Error> {
        let mut nodes = Vec::new();
        for node in self.iter() {
            nodes.extend(doc.find(node, selector)?);
        }
        doc.sort_document_order(&mut nodes);
        Ok(self.derive(nodes, &format!(" {selector}")))
    }

    /// Elements of the set matching `selector`.
    ///
    /// # Errors
    /// Returns an error if the selector cannot be parsed.
    pub fn filter<D: DomAdapter<Element = E>>(&self, doc: &D, selector: &str) -> Result<Self, Error> {
        let mut nodes = Vec::new();
        for node in self.iter() {
            if doc.matches(node, selector)? {
                nodes.push(node);
            }
        }
        Ok(self.derive(nodes, selector))
    }

    /// Parent of each element.
    pub fn parent<D: DomAdapter<Element = E>>(&self, doc: &D) -> Self {
        let mut nodes: Vec<E> = self.iter().filter_map(|node| doc.parent(node)).collect();
        doc.sort_document_order(&mut nodes);
        self.derive(nodes, "")
    }

    /// Immediately preceding sibling of each element.
    pub fn prev<D: DomAdapter<Element = E>>(&self, doc: &D) -> Self {
        let mut nodes: Vec<E> = self
            .iter()
            .filter_map(|node| doc.previous_sibling(node))
            .collect();
        doc.sort_document_order(&mut nodes);
        self.derive(nodes, "")
    }

    /// All ancestors, closest first, optionally filtered.
    ///
    /// # Errors
    /// Returns an error if the filter cannot be parsed.
    pub fn parents<D: DomAdapter<Element = E>>(
        &self,
        doc: &D,
        filter: Option<&str>,
    ) -> Result<Self, Error> {
        let nodes = self.iter().flat_map(|node| doc.ancestors(node)).collect();
        self.collect_filtered(doc, nodes, filter)
    }

    /// All preceding siblings, closest first, optionally filtered.
    ///
    /// # Errors
    /// Returns an error if the filter cannot be parsed.
    pub fn prev_all<D: DomAdapter<Element = E>>(
        &self,
        doc: &D,
        filter: Option<&str>,
    ) -> Result<Self, Error> {
        let nodes = self
            .iter()
            .flat_map(|node| doc.preceding_siblings(node))
            .collect();
        self.collect_filtered(doc, nodes, filter)
    }

    fn collect_filtered<D: DomAdapter<Element = E>>(
        &self,
        doc: &D,
        candidates: Vec<E>,
        filter: Option<&str>,
    ) -> Result<Self, Error> {
        let mut nodes: Vec<E> = Vec::with_capacity(candidates.len());
        for node in candidates {
            if nodes.contains(&node) {
                continue;
            }
            if let Some(selector) = filter.filter(|selector| !selector.is_empty())
                && !doc.matches(node, selector)?
            {
                continue;
            }
            nodes.push(node);
        }
        Ok(self.derive(nodes, ""))
    }
}
