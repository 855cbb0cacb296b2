//! CSS selector parsing.

use crate::{
    AttrOperator, Combinator, ComplexSelector, CompoundSelector, PseudoClass, SelectorList,
    SimpleSelector,
};
use core::iter::Peekable;
use core::mem::take;
use core::str::Chars;
use thiserror::Error;

/// A selector that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid selector `{input}`: {reason}")]
pub struct SelectorParseError {
    /// The selector text as given.
    pub input: String,
    /// What went wrong.
    pub reason: String,
}

impl SelectorParseError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Tokens of a complex selector.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Tok {
    /// An explicit combinator (`>`, `+`, `~`).
    Combinator(Combinator),
    /// Whitespace, a descendant combinator unless next to an explicit one.
    Whitespace,
    /// A simple selector.
    Simple(SimpleSelector),
}

/// Tokenizer over one complex selector.
struct SelectorTokenizer<'input> {
    /// Full input, used for error messages.
    source: &'input str,
    /// Remaining characters.
    chars: Peekable<Chars<'input>>,
}

/// True for characters that may continue an identifier.
fn is_ident_char(character: char) -> bool {
    character.is_alphanumeric() || character == '-' || character == '_' || !character.is_ascii()
}

impl<'input> SelectorTokenizer<'input> {
    fn new(source: &'input str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> SelectorParseError {
        SelectorParseError::new(self.source, reason)
    }

    /// Return the next token, if any.
    fn next_token(&mut self) -> Result<Option<Tok>, SelectorParseError> {
        let Some(&current) = self.chars.peek() else {
            return Ok(None);
        };
        let token = match current {
            character if character.is_whitespace() => {
                while self.chars.peek().is_some_and(|next| next.is_whitespace()) {
                    self.chars.next();
                }
                Tok::Whitespace
            }
            '>' | '+' | '~' => {
                self.chars.next();
                Tok::Combinator(match current {
                    '>' => Combinator::Child,
                    '+' => Combinator::AdjacentSibling,
                    _ => Combinator::GeneralSibling,
                })
            }
            '*' => {
                self.chars.next();
                Tok::Simple(SimpleSelector::Universal)
            }
            '.' => {
                self.chars.next();
                Tok::Simple(SimpleSelector::Class(self.required_ident("class name")?))
            }
            '#' => {
                self.chars.next();
                Tok::Simple(SimpleSelector::IdSelector(self.required_ident("id")?))
            }
            '[' => {
                self.chars.next();
                Tok::Simple(self.consume_attribute()?)
            }
            ':' => {
                self.chars.next();
                Tok::Simple(self.consume_pseudo()?)
            }
            character if is_ident_char(character) || character == '\\' => {
                Tok::Simple(SimpleSelector::Type(self.consume_ident().to_ascii_lowercase()))
            }
            other => return Err(self.error(format!("unexpected character `{other}`"))),
        };
        Ok(Some(token))
    }

    /// Consume an identifier, honoring backslash escapes of single characters.
    fn consume_ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(&character) = self.chars.peek() {
            if character == '\\' {
                self.chars.next();
                if let Some(escaped) = self.chars.next() {
                    out.push(escaped);
                }
                continue;
            }
            if !is_ident_char(character) {
                break;
            }
            out.push(character);
            self.chars.next();
        }
        out
    }

    fn required_ident(&mut self, what: &str) -> Result<String, SelectorParseError> {
        let ident = self.consume_ident();
        if ident.is_empty() {
            return Err(self.error(format!("empty {what}")));
        }
        Ok(ident)
    }

    fn skip_spaces(&mut self) {
        while self.chars.peek().is_some_and(|next| next.is_whitespace()) {
            self.chars.next();
        }
    }

    /// Parse the inside of `[...]` after the opening bracket.
    fn consume_attribute(&mut self) -> Result<SimpleSelector, SelectorParseError> {
        self.skip_spaces();
        let name = self.required_ident("attribute name")?.to_ascii_lowercase();
        self.skip_spaces();
        let operator = match self.chars.peek().copied() {
            Some(']') => {
                self.chars.next();
                return Ok(SimpleSelector::Attribute {
                    name,
                    operator: AttrOperator::Exists,
                    value: String::new(),
                });
            }
            Some('=') => AttrOperator::Equals,
            Some('~') => AttrOperator::Includes,
            Some('|') => AttrOperator::DashMatch,
            Some('^') => AttrOperator::Prefix,
            Some('$') => AttrOperator::Suffix,
            Some('*') => AttrOperator::Substring,
            _ => return Err(self.error("malformed attribute selector")),
        };
        self.chars.next();
        if operator != AttrOperator::Equals && self.chars.next() != Some('=') {
            return Err(self.error("malformed attribute operator"));
        }
        self.skip_spaces();
        let value = match self.chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                self.chars.next();
                let mut out = String::new();
                loop {
                    match self.chars.next() {
                        Some(character) if character == quote => break,
                        Some(character) => out.push(character),
                        None => return Err(self.error("unterminated attribute value")),
                    }
                }
                out
            }
            _ => self.consume_ident(),
        };
        self.skip_spaces();
        if self.chars.next() != Some(']') {
            return Err(self.error("unclosed attribute selector"));
        }
        Ok(SimpleSelector::Attribute {
            name,
            operator,
            value,
        })
    }

    /// Read a balanced parenthesized argument after its opening parenthesis.
    fn consume_arguments(&mut self) -> Result<String, SelectorParseError> {
        let mut depth = 1usize;
        let mut out = String::new();
        for character in self.chars.by_ref() {
            match character {
                '(' => depth = depth.saturating_add(1),
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(out);
                    }
                }
                _ => {}
            }
            out.push(character);
        }
        Err(self.error("unmatched `(`"))
    }

    /// Parse a pseudo-class or pseudo-element after the first colon.
    fn consume_pseudo(&mut self) -> Result<SimpleSelector, SelectorParseError> {
        if self.chars.peek() == Some(&':') {
            self.chars.next();
            let name = self.required_ident("pseudo-element")?;
            return Ok(SimpleSelector::PseudoElement(name.to_ascii_lowercase()));
        }
        let name = self.required_ident("pseudo-class")?.to_ascii_lowercase();
        if self.chars.peek() == Some(&'(') {
            self.chars.next();
            let arguments = self.consume_arguments()?;
            if name == "not" {
                return parse_negation(&arguments)
                    .map_err(|err| self.error(format!("in :not(): {}", err.reason)));
            }
            return Ok(SimpleSelector::PseudoClass(PseudoClass::Other(format!(
                "{name}({arguments})"
            ))));
        }
        Ok(SimpleSelector::PseudoClass(match name.as_str() {
            "scope" => PseudoClass::Scope,
            "root" => PseudoClass::Root,
            "empty" => PseudoClass::Empty,
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            "only-child" => PseudoClass::OnlyChild,
            _ => PseudoClass::Other(name),
        }))
    }
}

/// Parse the argument list of `:not(...)`: comma-separated compounds.
fn parse_negation(arguments: &str) -> Result<SimpleSelector, SelectorParseError> {
    let mut compounds = Vec::new();
    for part in arguments.split(',') {
        let selector = parse_complex_selector(part.trim())?;
        if !selector.rest.is_empty() {
            return Err(SelectorParseError::new(
                arguments,
                "combinators are not allowed in :not()",
            ));
        }
        compounds.push(selector.first);
    }
    Ok(SimpleSelector::Negation(compounds))
}

/// Parse a selector list from CSS text.
///
/// # Errors
/// Returns an error if any alternative is malformed or the list is empty.
pub fn parse_selector_list(input: &str) -> Result<SelectorList, SelectorParseError> {
    let mut list = SelectorList::default();
    for part in input.split(',') {
        list.selectors.push(parse_complex_selector(part.trim())?);
    }
    Ok(list)
}

/// Parse one complex selector.
///
/// # Errors
/// Returns an error on empty input, dangling or doubled combinators and malformed simple
/// selectors.
pub fn parse_complex_selector(input: &str) -> Result<ComplexSelector, SelectorParseError> {
    let (leading, selector) = parse_with_leading(input)?;
    if leading.is_some() {
        return Err(SelectorParseError::new(input, "leading combinator"));
    }
    Ok(selector)
}

/// Parse a selector relative to a scope element, as used by scoped queries.
///
/// The result is anchored on `:scope`: `div` becomes `:scope div` and `> div` becomes
/// `:scope > div`.
///
/// # Errors
/// Returns an error under the same conditions as [`parse_complex_selector`].
pub fn parse_scoped_selector(input: &str) -> Result<ComplexSelector, SelectorParseError> {
    let (leading, selector) = parse_with_leading(input)?;
    let mut rest = Vec::with_capacity(selector.rest.len().saturating_add(1));
    rest.push((leading.unwrap_or(Combinator::Descendant), selector.first));
    rest.extend(selector.rest);
    Ok(ComplexSelector {
        first: CompoundSelector {
            simples: vec![SimpleSelector::PseudoClass(PseudoClass::Scope)],
        },
        rest,
    })
}

/// Parse a complex selector that may start with a combinator.
fn parse_with_leading(
    input: &str,
) -> Result<(Option<Combinator>, ComplexSelector), SelectorParseError> {
    let mut tokens = SelectorTokenizer::new(input.trim());
    let mut compounds: Vec<(Option<Combinator>, CompoundSelector)> = Vec::new();
    let mut current = CompoundSelector::default();
    let mut leading: Option<Combinator> = None;
    let mut pending: Option<Combinator> = None;
    let mut saw_whitespace = false;

    while let Some(token) = tokens.next_token()? {
        match token {
            Tok::Whitespace => {
                if !current.is_empty() {
                    compounds.push((pending.take(), take(&mut current)));
                }
                saw_whitespace = true;
            }
            Tok::Combinator(comb) => {
                if !current.is_empty() {
                    compounds.push((pending.take(), take(&mut current)));
                }
                if pending.is_some() {
                    return Err(tokens.error("consecutive combinators"));
                }
                if compounds.is_empty() {
                    if leading.is_some() {
                        return Err(tokens.error("consecutive combinators"));
                    }
                    leading = Some(comb);
                } else {
                    pending = Some(comb);
                }
                saw_whitespace = false;
            }
            Tok::Simple(simple) => {
                if current.is_empty() && !compounds.is_empty() && pending.is_none() {
                    pending = saw_whitespace.then_some(Combinator::Descendant);
                }
                saw_whitespace = false;
                current.simples.push(simple);
            }
        }
    }
    if !current.is_empty() {
        compounds.push((pending.take(), current));
    }
    if pending.is_some() {
        return Err(tokens.error("dangling combinator"));
    }

    let mut iter = compounds.into_iter();
    let Some((_, first)) = iter.next() else {
        return Err(tokens.error("empty selector"));
    };
    let rest = iter
        .map(|(comb, compound)| (comb.unwrap_or(Combinator::Descendant), compound))
        .collect();
    Ok((leading, ComplexSelector { first, rest }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_around_combinators_is_insignificant() {
        let spaced = parse_complex_selector("div > .a").unwrap();
        let tight = parse_complex_selector("div>.a").unwrap();
        assert_eq!(spaced, tight);
        assert_eq!(spaced.rest[0].0, Combinator::Child);
    }

    #[test]
    fn leading_combinator_only_in_scoped_mode() {
        assert!(parse_complex_selector("> div").is_err());
        let scoped = parse_scoped_selector("> div").unwrap();
        assert_eq!(scoped.rest[0].0, Combinator::Child);
    }

    #[test]
    fn dangling_and_doubled_combinators_fail() {
        assert!(parse_complex_selector("div >").is_err());
        assert!(parse_complex_selector("div > > p").is_err());
        assert!(parse_complex_selector("").is_err());
    }

    #[test]
    fn classes_keep_case_and_types_lowercase() {
        let sel = parse_complex_selector("DIV#newID.Foo").unwrap();
        assert_eq!(
            sel.first.simples,
            vec![
                SimpleSelector::Type("div".into()),
                SimpleSelector::IdSelector("newID".into()),
                SimpleSelector::Class("Foo".into()),
            ]
        );
    }
}
