//! The selector subset csspec needs: parsing, matching against an element tree and
//! specificity.
//!
//! Supported:
//! - Type, universal, class, id and attribute selectors
//! - `:not(...)`, `:scope`, `:root`, `:empty` and the child-indexed pseudo-classes
//! - Combinators: descendant, child, adjacent sibling, general sibling
//! - Scoped selectors with a leading combinator (`> div`), anchored on `:scope`
//! - Specificity triples and their base-256 weight

mod matcher;
mod parser;
mod specificity;

pub use matcher::{matches_complex, matches_compound};
pub use parser::{
    SelectorParseError, parse_complex_selector, parse_scoped_selector, parse_selector_list,
};
pub use specificity::{Specificity, specificity_of_complex};

/// Tree access the matcher needs from a document.
pub trait ElementAdapter {
    type Handle: Copy + Eq;

    /// The document node is not an element.
    fn parent(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Previous sibling element, skipping text and comment nodes.
    fn previous_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Next sibling element, skipping text and comment nodes.
    fn next_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    fn tag_name(&self, element: Self::Handle) -> &str;

    fn element_id(&self, element: Self::Handle) -> Option<&str>;

    fn has_class(&self, element: Self::Handle, class: &str) -> bool;

    fn attr(&self, element: Self::Handle, name: &str) -> Option<&str>;

    /// True if the element has no element children and no non-empty text.
    fn is_empty(&self, element: Self::Handle) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttrOperator {
    /// `[name]`
    Exists,
    /// `[name=value]`
    Equals,
    /// `[name~=value]`
    Includes,
    /// `[name|=value]`
    DashMatch,
    /// `[name^=value]`
    Prefix,
    /// `[name$=value]`
    Suffix,
    /// `[name*=value]`
    Substring,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PseudoClass {
    /// `:scope`, the element a scoped query is anchored on.
    Scope,
    /// `:root`
    Root,
    /// `:empty`
    Empty,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// Any other pseudo-class, kept verbatim (never matches).
    Other(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    Type(String),
    Class(String),
    IdSelector(String),
    Attribute {
        name: String,
        operator: AttrOperator,
        value: String,
    },
    Universal,
    /// `:not(a, b)` over compound arguments.
    Negation(Vec<CompoundSelector>),
    PseudoClass(PseudoClass),
    /// `::name`. Elements never match a pseudo-element.
    PseudoElement(String),
}

/// Simple selectors with no combinator between them, like `div.a#b`.
#[derive(Clone, Debug, PartialEq, Eq, Default, Hash)]
pub struct CompoundSelector {
    pub simples: Vec<SimpleSelector>,
}

impl CompoundSelector {
    pub fn is_empty(&self) -> bool {
        self.simples.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// Compounds joined by combinators. `rest` pairs each compound with the combinator that links it to the compound on its left.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ComplexSelector {
    pub first: CompoundSelector,
    pub rest: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    pub fn len(&self) -> usize {
        self.rest.len().saturating_add(1)
    }

    /// Always false: a complex selector has at least its first compound.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// The compound at `index`, counted from the left.
    pub fn compound(&self, index: usize) -> Option<&CompoundSelector> {
        match index.checked_sub(1) {
            None => Some(&self.first),
            Some(rest_index) => self.rest.get(rest_index).map(|pair| &pair.1),
        }
    }

    /// The combinator on the left of the compound at `index`.
    pub fn combinator_before(&self, index: usize) -> Option<Combinator> {
        index
            .checked_sub(1)
            .and_then(|rest_index| self.rest.get(rest_index))
            .map(|pair| pair.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}
