//! Right-to-left matching of parsed selectors.

use crate::{
    AttrOperator, Combinator, ComplexSelector, CompoundSelector, ElementAdapter, PseudoClass,
    SimpleSelector,
};

/// Match a complex selector against an element.
///
/// Matching runs right to left and backtracks, so every candidate relative is tried for
/// descendant and general-sibling combinators. `scope` is the element `:scope` refers to.
pub fn matches_complex<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
    scope: Option<A::Handle>,
) -> bool {
    matches_from(adapter, element, sel, sel.len().saturating_sub(1), scope)
}

/// True if `element` matches the compound at `index` and everything left of it.
fn matches_from<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
    index: usize,
    scope: Option<A::Handle>,
) -> bool {
    let Some(compound) = sel.compound(index) else {
        return false;
    };
    if !matches_compound(adapter, element, compound, scope) {
        return false;
    }
    let Some(combinator) = sel.combinator_before(index) else {
        return true;
    };
    let left = index.saturating_sub(1);
    match combinator {
        Combinator::Child => adapter
            .parent(element)
            .is_some_and(|parent| matches_from(adapter, parent, sel, left, scope)),
        Combinator::AdjacentSibling => adapter
            .previous_sibling_element(element)
            .is_some_and(|prev| matches_from(adapter, prev, sel, left, scope)),
        Combinator::Descendant => {
            let mut current = adapter.parent(element);
            while let Some(ancestor) = current {
                if matches_from(adapter, ancestor, sel, left, scope) {
                    return true;
                }
                current = adapter.parent(ancestor);
            }
            false
        }
        Combinator::GeneralSibling => {
            let mut current = adapter.previous_sibling_element(element);
            while let Some(sibling) = current {
                if matches_from(adapter, sibling, sel, left, scope) {
                    return true;
                }
                current = adapter.previous_sibling_element(sibling);
            }
            false
        }
    }
}

/// Match a compound selector against a single element.
pub fn matches_compound<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    compound: &CompoundSelector,
    scope: Option<A::Handle>,
) -> bool {
    compound
        .simples
        .iter()
        .all(|simple| matches_simple(adapter, element, simple, scope))
}

/// Match one simple selector.
fn matches_simple<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    simple: &SimpleSelector,
    scope: Option<A::Handle>,
) -> bool {
    match simple {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(type_name) => adapter.tag_name(element) == type_name.as_str(),
        SimpleSelector::Class(class_name) => adapter.has_class(element, class_name),
        SimpleSelector::IdSelector(id_value) => adapter
            .element_id(element)
            .is_some_and(|value| value == id_value.as_str()),
        SimpleSelector::Attribute {
            name,
            operator,
            value,
        } => adapter
            .attr(element, name)
            .is_some_and(|actual| attribute_matches(*operator, actual, value)),
        SimpleSelector::Negation(compounds) => !compounds
            .iter()
            .any(|compound| matches_compound(adapter, element, compound, scope)),
        SimpleSelector::PseudoClass(pseudo) => matches_pseudo(adapter, element, pseudo, scope),
        SimpleSelector::PseudoElement(_) => false,
    }
}

fn attribute_matches(operator: AttrOperator, actual: &str, expected: &str) -> bool {
    match operator {
        AttrOperator::Exists => true,
        AttrOperator::Equals => actual == expected,
        AttrOperator::Includes => actual.split_whitespace().any(|word| word == expected),
        AttrOperator::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected)
                    .is_some_and(|tail| tail.starts_with('-'))
        }
        AttrOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttrOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttrOperator::Substring => !expected.is_empty() && actual.contains(expected),
    }
}

fn matches_pseudo<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    pseudo: &PseudoClass,
    scope: Option<A::Handle>,
) -> bool {
    match pseudo {
        PseudoClass::Scope => scope.map_or_else(
            || adapter.parent(element).is_none(),
            |anchor| anchor == element,
        ),
        PseudoClass::Root => adapter.parent(element).is_none(),
        PseudoClass::Empty => adapter.is_empty(element),
        PseudoClass::FirstChild => adapter.previous_sibling_element(element).is_none(),
        PseudoClass::LastChild => adapter.next_sibling_element(element).is_none(),
        PseudoClass::OnlyChild => {
            adapter.previous_sibling_element(element).is_none()
                && adapter.next_sibling_element(element).is_none()
        }
        PseudoClass::Other(_) => false,
    }
}
