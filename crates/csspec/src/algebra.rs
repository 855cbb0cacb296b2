//! Selector algebra: roles, clause and selector splitting, specificity.
//!
//! A test selector such as `.-describe-menu > li.-when-open- .-it-shows` is a sequence of
//! whitespace-separated clauses. Each clause is a compound selector made of simple
//! selectors, and each simple selector has a role decided only by its literal text.

use crate::error::{CsspecError, Result};
use core::mem::take;

/// Weight of one element or pseudo-element.
const ELEMENT_WEIGHT: u64 = 1;
/// Weight of one class, pseudo-class or attribute selector.
const CLASS_WEIGHT: u64 = 256;
/// Weight of one id selector.
const ID_WEIGHT: u64 = 256 * 256;
/// Bonus for inline declarations.
const INLINE_WEIGHT: u64 = 256 * 256 * 256;
/// Bonus for `!important` declarations.
const IMPORTANT_WEIGHT: u64 = 256 * 256 * 256 * 256;

/// What a simple selector means to the test engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// `.-describe-...`: names a scope and is applied to the element.
    Context,
    /// `.-when-...`: a state class applied to the element.
    State,
    /// `.-when-...-`: a state that attaches the selector following it.
    StateSelector,
    /// `.-it-...`: marks the selector as a test case.
    Test,
    /// Anything else: structural, used to find elements.
    Selector,
}

pub fn classify(selector: &str) -> Role {
    if selector.starts_with(".-describe") {
        Role::Context
    } else if selector.starts_with(".-when") && selector.ends_with('-') {
        Role::StateSelector
    } else if selector.starts_with(".-when") {
        Role::State
    } else if selector.starts_with(".-it") {
        Role::Test
    } else {
        Role::Selector
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorKind {
    Universal,
    Element,
    Class,
    PseudoClass,
    PseudoElement,
    Id,
    Attribute,
}

/// One parsed simple selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleSelector {
    pub kind: SelectorKind,
    /// The name without its sigil: `x` for `.x`, `#x` and `:not(.x)`.
    pub token: String,
    /// True for `:not(...)`.
    pub negative: bool,
    /// The literal text this selector was parsed from.
    pub text: String,
}

impl SimpleSelector {
    pub const fn weight(&self) -> u64 {
        match self.kind {
            SelectorKind::Universal => 0,
            SelectorKind::Element | SelectorKind::PseudoElement => ELEMENT_WEIGHT,
            SelectorKind::Class | SelectorKind::PseudoClass | SelectorKind::Attribute => {
                CLASS_WEIGHT
            }
            SelectorKind::Id => ID_WEIGHT,
        }
    }
}

const fn is_combinator(character: char) -> bool {
    matches!(character, '>' | '+' | '~' | '^' | '&')
}

fn is_all_combinators(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_combinator)
}

/// Split a compound selector into clauses.
///
/// Combinators bind to the clause that follows them, whatever the spacing:
/// `a > b`, `a>b` and `a   >b` all give `["a", ">b"]`. Characters inside parentheses
/// or attribute brackets never split.
pub fn split_clauses(selector: &str) -> Vec<String> {
    let mut clauses = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for character in selector.trim().chars() {
        if depth == 0 {
            if character.is_whitespace() {
                // A bare combinator waits for the clause it belongs to.
                if !current.is_empty() && !is_all_combinators(&current) {
                    clauses.push(take(&mut current));
                }
                continue;
            }
            if is_combinator(character) && !current.is_empty() && !is_all_combinators(&current) {
                clauses.push(take(&mut current));
            }
        }
        match character {
            '(' | '[' => depth = depth.saturating_add(1),
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        current.push(character);
    }
    if !current.is_empty() {
        clauses.push(current);
    }
    clauses
}

/// The combinator prefix of a clause and the compound that follows it.
pub fn clause_parts(clause: &str) -> (&str, &str) {
    let body_start = clause
        .char_indices()
        .find(|(_, character)| !is_combinator(*character))
        .map_or(clause.len(), |(index, _)| index);
    let (combinator, body) = clause.split_at(body_start);
    (combinator, body.trim_start())
}

/// Split one clause into its simple selectors, dropping the leading combinator.
pub fn split_selectors(clause: &str) -> Vec<String> {
    let (_, body) = clause_parts(clause);
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for character in body.chars() {
        if depth == 0 && !current.is_empty() {
            let starts_piece = match character {
                '.' | '#' | '[' | '*' => true,
                // `::` stays together as one pseudo-element sigil.
                ':' => current != ":",
                _ => false,
            };
            if starts_piece {
                pieces.push(take(&mut current));
            }
        }
        match character {
            '(' | '[' => depth = depth.saturating_add(1),
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        current.push(character);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Parse one simple selector as produced by [`split_selectors`].
///
/// # Errors
/// Fails on an empty selector, an unmatched `:not(`, characters after `*` and empty
/// class, id or attribute names.
pub fn parse_selector(text: &str) -> Result<SimpleSelector> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CsspecError::parse(text, "empty selector"));
    }
    if let Some(rest) = trimmed.strip_prefix(":not(") {
        let inner = rest
            .strip_suffix(')')
            .ok_or_else(|| CsspecError::parse(text, "unmatched :not("))?;
        let mut parsed = parse_selector(inner)?;
        parsed.negative = !parsed.negative;
        parsed.text = trimmed.to_owned();
        return Ok(parsed);
    }
    let named = |kind: SelectorKind, name: &str| {
        if name.is_empty() {
            return Err(CsspecError::parse(text, "missing name"));
        }
        Ok(SimpleSelector {
            kind,
            token: name.to_owned(),
            negative: false,
            text: trimmed.to_owned(),
        })
    };
    if let Some(rest) = trimmed.strip_prefix('*') {
        if !rest.is_empty() {
            return Err(CsspecError::parse(text, "unexpected characters after *"));
        }
        return Ok(SimpleSelector {
            kind: SelectorKind::Universal,
            token: String::from("*"),
            negative: false,
            text: trimmed.to_owned(),
        });
    }
    if let Some(name) = trimmed.strip_prefix("::") {
        return named(SelectorKind::PseudoElement, name);
    }
    if let Some(name) = trimmed.strip_prefix(':') {
        return named(SelectorKind::PseudoClass, name);
    }
    if let Some(name) = trimmed.strip_prefix('.') {
        return named(SelectorKind::Class, name);
    }
    if let Some(name) = trimmed.strip_prefix('#') {
        return named(SelectorKind::Id, name);
    }
    if let Some(rest) = trimmed.strip_prefix('[') {
        let inner = rest
            .strip_suffix(']')
            .ok_or_else(|| CsspecError::parse(text, "unmatched ["))?;
        return named(SelectorKind::Attribute, inner.trim());
    }
    if trimmed.contains(['(', ')', '[', ']']) {
        return Err(CsspecError::parse(text, "unbalanced brackets"));
    }
    named(SelectorKind::Element, trimmed)
}

/// Specificity of a compound selector as one integer with base 256 per component.
pub fn specificity(compound: &[SimpleSelector], inline: bool, important: bool) -> u64 {
    let total = compound
        .iter()
        .map(SimpleSelector::weight)
        .fold(0, u64::saturating_add);
    with_tiers(total, inline, important)
}

/// Add the inline and `!important` tiers to a selector weight.
pub const fn with_tiers(weight: u64, inline: bool, important: bool) -> u64 {
    let mut total = weight;
    if inline {
        total = total.saturating_add(INLINE_WEIGHT);
    }
    if important {
        total = total.saturating_add(IMPORTANT_WEIGHT);
    }
    total
}

/// Specificity of a full selector, summing every clause.
///
/// # Errors
/// Fails if any simple selector cannot be parsed.
pub fn selector_specificity(selector: &str, inline: bool, important: bool) -> Result<u64> {
    let compound = split_clauses(selector)
        .iter()
        .flat_map(|clause| split_selectors(clause))
        .map(|piece| parse_selector(&piece))
        .collect::<Result<Vec<_>>>()?;
    Ok(specificity(&compound, inline, important))
}

/// Turn a role selector into words: `.-describe-a-thing` becomes `describe a thing`,
/// or `a thing` with `omit_type`. Plain selectors have no words.
pub fn selector_to_natural_language(selector: &str, omit_type: bool) -> Option<String> {
    if classify(selector) == Role::Selector {
        return None;
    }
    let skip = if omit_type { 2 } else { 1 };
    let words: Vec<&str> = selector.split('-').skip(skip).collect();
    Some(words.join(" ").trim().to_owned())
}

/// Remove one pair of matching surrounding quotes, if present.
pub fn unquote(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinators_inside_parentheses_do_not_split() {
        assert_eq!(split_clauses("li:nth-child(2n+1) > a"), ["li:nth-child(2n+1)", ">a"]);
        assert_eq!(split_clauses("[class~=x]+b"), ["[class~=x]", "+b"]);
    }

    #[test]
    fn clause_parts_separates_the_combinator() {
        assert_eq!(clause_parts(">.a"), (">", ".a"));
        assert_eq!(clause_parts("&&#x"), ("&&", "#x"));
        assert_eq!(clause_parts(".a"), ("", ".a"));
    }

    #[test]
    fn unquote_strips_one_pair() {
        assert_eq!(unquote("'a'"), "a");
        assert_eq!(unquote(" \"b\" "), "b");
        assert_eq!(unquote("\"c'"), "\"c'");
    }
}
