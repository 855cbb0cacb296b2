//! Stylesheet-source parsing on top of `cssparser`.
//!
//! Produces an order-preserving rule list: each qualified rule keeps its raw prelude
//! (the selector list as authored) and its declarations in source order. At-rules are
//! skipped. Values are kept as raw text so callers can interpret quoted strings and
//! custom properties themselves.

use cssparser::{
    AtRuleParser as CssAtRuleParser, CowRcStr, DeclarationParser as CssDeclarationParser,
    ParseError, Parser, ParserInput, ParserState, QualifiedRuleParser as CssQualifiedRuleParser,
    RuleBodyItemParser as CssRuleBodyItemParser, RuleBodyParser as CssRuleBodyParser,
    StyleSheetParser,
};

/// `name: value [!important]` with the value kept as written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    /// The selector list as authored.
    pub prelude: String,
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    /// The comma-separated selector alternatives of this rule, in authored order.
    pub fn selectors(&self) -> Vec<String> {
        split_selector_list(&self.prelude)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub rules: Vec<StyleRule>,
}

/// Split a selector list on commas that are not nested in parentheses, brackets or quotes.
///
/// Whitespace around each alternative is dropped and empty alternatives are skipped.
pub fn split_selector_list(prelude: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for character in prelude.chars() {
        if let Some(open) = quote {
            if character == open {
                quote = None;
            }
            current.push(character);
            continue;
        }
        match character {
            '"' | '\'' => quote = Some(character),
            '(' | '[' => depth = depth.saturating_add(1),
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                push_alternative(&mut out, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(character);
    }
    push_alternative(&mut out, &current);
    out
}

/// Append a trimmed, non-empty selector alternative.
fn push_alternative(out: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_owned());
    }
}

/// Strip a trailing `!important` from a raw value.
fn split_important(raw: &str) -> (String, bool) {
    let value = raw.trim();
    value
        .strip_suffix("important")
        .map(str::trim_end)
        .and_then(|rest| rest.strip_suffix('!'))
        .map_or_else(
            || (value.to_owned(), false),
            |rest| (rest.trim_end().to_owned(), true),
        )
}

/// Consume the rest of `input` and return its source text.
fn rest_of<'input>(input: &mut Parser<'input, '_>) -> &'input str {
    let start = input.position();
    while input.next_including_whitespace_and_comments().is_ok() {}
    input.slice_from(start)
}

/// Parser for the inside of a rule block. Nested rules and at-rules use the rejecting
/// defaults, so only declarations survive.
struct BlockBody;

impl CssDeclarationParser<'_> for BlockBody {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'input>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, '_>,
        _declaration_start: &ParserState,
    ) -> Result<Declaration, ParseError<'input, ()>> {
        let (value, important) = split_important(rest_of(input));
        Ok(Declaration {
            name: name.to_ascii_lowercase(),
            value,
            important,
        })
    }
}

impl CssAtRuleParser<'_> for BlockBody {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();
}

impl CssQualifiedRuleParser<'_> for BlockBody {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();
}

impl CssRuleBodyItemParser<'_, Declaration, ()> for BlockBody {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Top-level parser: qualified rules become [`StyleRule`]s, at-rules are rejected and
/// skipped with their blocks.
struct TopLevel;

impl CssAtRuleParser<'_> for TopLevel {
    type Prelude = ();
    type AtRule = StyleRule;
    type Error = ();
}

impl CssQualifiedRuleParser<'_> for TopLevel {
    type Prelude = String;
    type QualifiedRule = StyleRule;
    type Error = ();

    fn parse_prelude<'input>(
        &mut self,
        input: &mut Parser<'input, '_>,
    ) -> Result<String, ParseError<'input, ()>> {
        Ok(rest_of(input).trim().to_owned())
    }

    fn parse_block<'input>(
        &mut self,
        prelude: String,
        _start: &ParserState,
        input: &mut Parser<'input, '_>,
    ) -> Result<StyleRule, ParseError<'input, ()>> {
        Ok(StyleRule {
            prelude,
            declarations: collect_declarations(input),
        })
    }
}

/// Collect the declarations of a rule body, skipping invalid items.
fn collect_declarations(block: &mut Parser) -> Vec<Declaration> {
    CssRuleBodyParser::new(block, &mut BlockBody)
        .flatten()
        .collect()
}

/// Parse stylesheet text. Invalid rules and declarations are dropped.
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    Stylesheet {
        rules: StyleSheetParser::new(&mut parser, &mut TopLevel)
            .flatten()
            .collect(),
    }
}

/// Parse a bare declaration list, as found in a `style` attribute.
pub fn parse_declaration_list(text: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    collect_declarations(&mut parser)
}
