//! Computed style for the fixture document.
//!
//! The engine owns a user-agent sheet plus any number of attached author sheets, each
//! identified by a [`SheetHandle`]. Values are computed on demand against the current
//! state of a [`html::Dom`], so mutations to classes, ids or inline style are picked up
//! without invalidation bookkeeping.
use css_selectors::{ComplexSelector, Specificity, matches_complex, parse_complex_selector, specificity_of_complex};
use css_syntax::{Declaration, parse_declaration_list, parse_stylesheet};
use html::{Dom, NodeId};
use log::{debug, warn};
use std::collections::HashMap;

mod cascade;
mod properties;

use cascade::{CascadedDecl, cascade_put};
pub use cascade::Origin;

/// How the winning author declaration of a property was declared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeclarationRank {
    /// Selector specificity, zero for inline style.
    pub specificity: Specificity,
    pub inline: bool,
    pub important: bool,
}

/// Identifies one attached author sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetHandle(u64);

/// A rule with its selectors parsed once at attach time.
#[derive(Debug, Clone)]
struct PreparedRule {
    selectors: Vec<(ComplexSelector, Specificity)>,
    declarations: Vec<Declaration>,
    source_order: u32,
}

#[derive(Debug, Clone)]
struct AttachedSheet {
    handle: SheetHandle,
    origin: Origin,
    rules: Vec<PreparedRule>,
}

pub struct StyleEngine {
    sheets: Vec<AttachedSheet>,
    next_handle: u64,
    next_order: u32,
}

impl Default for StyleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleEngine {
    /// Create an engine holding only the built-in user-agent sheet.
    pub fn new() -> Self {
        let mut engine = Self {
            sheets: Vec::new(),
            next_handle: 0,
            next_order: 0,
        };
        engine.attach_with_origin(properties::UA_CSS, Origin::UserAgent);
        engine
    }

    /// Attach author CSS text. Later sheets win ties over earlier ones.
    pub fn attach(&mut self, css: &str) -> SheetHandle {
        self.attach_with_origin(css, Origin::Author)
    }

    fn attach_with_origin(&mut self, css: &str, origin: Origin) -> SheetHandle {
        let handle = SheetHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        let mut rules = Vec::new();
        for rule in parse_stylesheet(css).rules {
            let selectors: Vec<(ComplexSelector, Specificity)> = rule
                .selectors()
                .iter()
                .filter_map(|text| match parse_complex_selector(text) {
                    Ok(sel) => {
                        let specificity = specificity_of_complex(&sel);
                        Some((sel, specificity))
                    }
                    Err(err) => {
                        // The sheet may carry selectors meant for the test runner only.
                        debug!(target: "style_engine", "skipping selector {text:?}: {err}");
                        None
                    }
                })
                .collect();
            if selectors.is_empty() {
                continue;
            }
            rules.push(PreparedRule {
                selectors,
                declarations: rule.declarations,
                source_order: self.next_order,
            });
            self.next_order = self.next_order.saturating_add(1);
        }
        debug!(target: "style_engine", "attached sheet {handle:?} with {} rules", rules.len());
        self.sheets.push(AttachedSheet {
            handle,
            origin,
            rules,
        });
        handle
    }

    /// Detach a sheet. Returns false if it was not attached.
    pub fn detach(&mut self, handle: SheetHandle) -> bool {
        let before = self.sheets.len();
        self.sheets
            .retain(|sheet| sheet.handle != handle || sheet.origin == Origin::UserAgent);
        let removed = self.sheets.len() != before;
        if !removed {
            warn!(target: "style_engine", "detach of unknown sheet {handle:?}");
        }
        removed
    }

    /// Number of attached author sheets.
    pub fn author_sheet_count(&self) -> usize {
        self.sheets
            .iter()
            .filter(|sheet| sheet.origin == Origin::Author)
            .count()
    }

    /// All cascaded (winning) declarations for an element, keyed by property name.
    fn cascade(&self, dom: &Dom, node: NodeId) -> HashMap<String, CascadedDecl> {
        let mut props = HashMap::new();
        for sheet in &self.sheets {
            for rule in &sheet.rules {
                let Some(specificity) = rule
                    .selectors
                    .iter()
                    .filter(|(sel, _)| matches_complex(dom, node, sel, None))
                    .map(|(_, specificity)| *specificity)
                    .max()
                else {
                    continue;
                };
                for decl in &rule.declarations {
                    for (name, value) in properties::expand_shorthand(&decl.name, &decl.value) {
                        let entry = CascadedDecl {
                            value: value.trim().to_owned(),
                            important: decl.important,
                            origin: sheet.origin,
                            specificity,
                            source_order: rule.source_order,
                            inline: false,
                        };
                        cascade_put(&mut props, &name, entry);
                    }
                }
            }
        }
        if let Some(style) = dom.attr(node, "style") {
            for decl in parse_declaration_list(style) {
                for (name, value) in properties::expand_shorthand(&decl.name, &decl.value) {
                    let entry = CascadedDecl {
                        value: value.trim().to_owned(),
                        important: decl.important,
                        origin: Origin::Author,
                        specificity: Specificity::default(),
                        source_order: u32::MAX,
                        inline: true,
                    };
                    cascade_put(&mut props, &name, entry);
                }
            }
        }
        props
    }

    /// The cascaded value of `property`, before inheritance and initial values apply.
    pub fn specified_value(&self, dom: &Dom, node: NodeId, property: &str) -> Option<String> {
        if !dom.is_element(node) {
            return None;
        }
        let property = property.to_ascii_lowercase();
        self.cascade(dom, node)
            .remove(&property)
            .map(|decl| decl.value)
    }

    /// Rank of the author declaration that wins the cascade for `property`. `None` when the
    /// property is not declared on the element or only the user-agent sheet declares it.
    pub fn declaration_rank(
        &self,
        dom: &Dom,
        node: NodeId,
        property: &str,
    ) -> Option<DeclarationRank> {
        if !dom.is_element(node) {
            return None;
        }
        self.cascade(dom, node)
            .remove(&property.to_ascii_lowercase())
            .filter(|decl| decl.origin == Origin::Author)
            .map(|decl| DeclarationRank {
                specificity: decl.specificity,
                inline: decl.inline,
                important: decl.important,
            })
    }

    /// The computed value of `property` for an element.
    ///
    /// Cascaded values are returned as authored. `inherit` and uncascaded inherited
    /// properties take the parent's computed value; `initial` and uncascaded other
    /// properties take the initial value. Unknown uncascaded properties yield `None`.
    pub fn computed_value(&self, dom: &Dom, node: NodeId, property: &str) -> Option<String> {
        if !dom.is_element(node) {
            return None;
        }
        let property = property.to_ascii_lowercase();
        let specified = self.specified_value(dom, node, &property);
        match specified.as_deref() {
            Some(keyword) if keyword.eq_ignore_ascii_case("inherit") => {
                self.inherited_value(dom, node, &property)
            }
            Some(keyword) if keyword.eq_ignore_ascii_case("initial") => {
                properties::initial_value(&property).map(str::to_owned)
            }
            Some(_) => specified,
            None if properties::is_inherited(&property) => self.inherited_value(dom, node, &property),
            None => properties::initial_value(&property).map(str::to_owned),
        }
    }

    fn inherited_value(&self, dom: &Dom, node: NodeId, property: &str) -> Option<String> {
        dom.parent_element(node).map_or_else(
            || properties::initial_value(property).map(str::to_owned),
            |parent| self.computed_value(dom, parent, property),
        )
    }
}
