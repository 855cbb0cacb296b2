//! Test cases: one selector alternative of a test rule and its expectations.
//!
//! Executing a case applies the classes, ids and content its clauses imply to the
//! fixture, evaluates every expectation against the resulting target and then undoes
//! every mutation in reverse order.

use crate::algebra::{
    Role, classify, clause_parts, parse_selector, selector_to_natural_language, split_clauses,
    split_selectors, unquote,
};
use crate::dom::{DomAdapter, ElementSet};
use crate::error::{CsspecError, Result};
use crate::expectation::Expectation;
use crate::stylesheet::StylesheetRegistry;
use core::fmt;
use core::mem::{replace, take};
use log::{debug, error, trace};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[allow(clippy::expect_used, reason = "pattern is a valid literal")]
static APPLICABLE_SELECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\.|#|:not\(\.|:not\(#)([^)]+)\)?$").expect("valid regex pattern")
});

#[allow(clippy::expect_used, reason = "pattern is a valid literal")]
static QUOTED_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*('(.*)'|"(.*)")\s*$"#).expect("valid regex pattern"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Pending,
    Inapplicable,
}

impl Outcome {
    /// Progress symbol used in the dot line of a report.
    pub const fn symbol(self) -> char {
        match self {
            Self::Pass => '.',
            Self::Fail => 'F',
            Self::Pending => '*',
            Self::Inapplicable => '_',
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Pending => "pending",
            Self::Inapplicable => "inapplicable",
        })
    }
}

/// What one execution of a test case produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CaseResult {
    pub selector: String,
    pub description: String,
    pub outcome: Outcome,
    pub messages: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    selector: String,
    clauses: Vec<String>,
    expectations: Vec<Expectation>,
}

impl TestCase {
    /// # Errors
    /// Fails if any simple selector of `selector` cannot be parsed.
    pub fn new(selector: &str, expectations: Vec<Expectation>) -> Result<Self> {
        let clauses = split_clauses(selector);
        for clause in &clauses {
            for piece in split_selectors(clause) {
                parse_selector(&piece)?;
            }
        }
        Ok(Self {
            selector: selector.trim().to_owned(),
            clauses,
            expectations,
        })
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    /// Run the case against `fixture`. The document is restored before returning, also
    /// when an error is returned.
    ///
    /// # Errors
    /// Fails if a clause cannot be applied or a selector cannot be parsed.
    pub fn exec<D: DomAdapter>(
        &self,
        doc: &mut D,
        registry: &StylesheetRegistry<D>,
        fixture: &ElementSet<D::Element>,
    ) -> Result<CaseResult> {
        let (outcome, messages) = if self.expectations.is_empty() {
            (Outcome::Pending, Vec::new())
        } else {
            let mut execution = Execution::new(doc);
            execution.test_target(self, registry, fixture)?
        };
        debug!(target: "csspec::test_case", "{outcome}: {}", self.selector);
        Ok(CaseResult {
            selector: self.selector.clone(),
            description: self.description(),
            outcome,
            messages,
        })
    }

    /// The clauses read as a sentence: role words dropped, structural selectors skipped.
    pub fn description(&self) -> String {
        self.clauses
            .iter()
            .flat_map(|clause| split_selectors(clause))
            .filter_map(|piece| selector_to_natural_language(&piece, true))
            .filter(|words| !words.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One reversible mutation.
enum Undo<D: DomAdapter> {
    RestoreAttribute {
        element: D::Element,
        name: &'static str,
        value: Option<String>,
    },
    RestoreChildren {
        element: D::Element,
        detached: D::Detached,
    },
}

/// The mutable state of one execution. Dropping it rolls the document back.
struct Execution<'doc, D: DomAdapter> {
    doc: &'doc mut D,
    undo: Vec<Undo<D>>,
}

impl<'doc, D: DomAdapter> Execution<'doc, D> {
    fn new(doc: &'doc mut D) -> Self {
        Self {
            doc,
            undo: Vec::new(),
        }
    }

    fn test_target(
        &mut self,
        case: &TestCase,
        registry: &StylesheetRegistry<D>,
        fixture: &ElementSet<D::Element>,
    ) -> Result<(Outcome, Vec<String>)> {
        let mut target = self.apply_clauses(&case.clauses, fixture)?;
        if target.is_empty() {
            return Ok((Outcome::Inapplicable, Vec::new()));
        }
        target.selector.clone_from(&case.selector);

        let mut messages = Vec::new();
        for expectation in &case.expectations {
            if let Some(message) = expectation.test(&*self.doc, registry, &target)? {
                messages.push(message);
            }
        }
        let outcome = if messages.is_empty() {
            Outcome::Pass
        } else {
            Outcome::Fail
        };
        Ok((outcome, messages))
    }

    fn apply_clauses(
        &mut self,
        clauses: &[String],
        fixture: &ElementSet<D::Element>,
    ) -> Result<ElementSet<D::Element>> {
        let mut current = fixture.clone();
        for (index, clause) in clauses.iter().enumerate() {
            current = self.apply_clause(clause, index == 0, current)?;
            self.apply_content(&current)?;
        }
        Ok(current)
    }

    fn apply_clause(
        &mut self,
        clause: &str,
        first_clause: bool,
        input: ElementSet<D::Element>,
    ) -> Result<ElementSet<D::Element>> {
        let (combinator, _) = clause_parts(clause);
        let mut queues = Queues {
            combinator,
            first_clause,
            first_apply: true,
            filters: Vec::new(),
            contexts: Vec::new(),
        };
        let mut current = input;
        let mut forced = false;
        for piece in split_selectors(clause) {
            let role = classify(&piece);
            if forced || matches!(role, Role::State | Role::StateSelector) {
                current = self.apply_queues(&mut queues, current)?;
                self.apply_selector(&piece, &current)?;
                forced = role == Role::StateSelector;
                continue;
            }
            match role {
                Role::Selector => queues.filters.push(piece),
                Role::Context => queues.contexts.push(piece),
                _ => {}
            }
        }
        self.apply_queues(&mut queues, current)
    }

    fn apply_queues(
        &mut self,
        queues: &mut Queues<'_>,
        input: ElementSet<D::Element>,
    ) -> Result<ElementSet<D::Element>> {
        let filters = take(&mut queues.filters).concat();
        let contexts = take(&mut queues.contexts);
        let first_apply = replace(&mut queues.first_apply, false);

        let current = if !filters.is_empty() {
            if first_apply {
                input.find(&*self.doc, &format!("{}{filters}", queues.combinator))?
            } else {
                input.filter(&*self.doc, &filters)?
            }
        } else if first_apply && !queues.first_clause {
            let descend = format!("{}{}", queues.combinator, contexts.concat());
            if descend.is_empty() {
                return Ok(input);
            }
            return Ok(input.find(&*self.doc, &descend)?);
        } else {
            input
        };
        for context in &contexts {
            self.apply_selector(context, &current)?;
        }
        Ok(current)
    }

    fn apply_selector(&mut self, selector: &str, set: &ElementSet<D::Element>) -> Result<()> {
        let captures = APPLICABLE_SELECTOR
            .captures(selector)
            .ok_or_else(|| CsspecError::UnappliableSelector(selector.to_owned()))?;
        let prefix = captures.get(1).map_or("", |found| found.as_str());
        let name = captures.get(2).map_or("", |found| found.as_str());
        for element in set.iter() {
            match prefix {
                "." => self.apply_class(element, name, false),
                ":not(." => self.apply_class(element, name, true),
                "#" => self.apply_id(element, name, false),
                _ => self.apply_id(element, name, true),
            }
        }
        Ok(())
    }

    fn apply_class(&mut self, element: D::Element, class: &str, remove: bool) {
        let before = self.doc.attribute(element, "class");
        let changed = if remove {
            self.doc.remove_class(element, class)
        } else {
            self.doc.add_class(element, class)
        };
        if changed {
            trace!(target: "csspec::test_case", "class {class:?} on {element:?} (remove: {remove})");
            self.undo.push(Undo::RestoreAttribute {
                element,
                name: "class",
                value: before,
            });
        }
    }

    fn apply_id(&mut self, element: D::Element, id: &str, clear: bool) {
        let before = self.doc.id(element);
        let current = before.as_deref().unwrap_or_default();
        let replacement = match (clear, current == id) {
            (false, false) => id,
            (true, true) => "",
            _ => return,
        };
        self.doc.set_id(element, replacement);
        self.undo.push(Undo::RestoreAttribute {
            element,
            name: "id",
            value: before,
        });
    }

    fn apply_content(&mut self, set: &ElementSet<D::Element>) -> Result<()> {
        for element in set.iter() {
            let Some(content) = self.doc.computed_style(element, "content") else {
                continue;
            };
            if !QUOTED_CONTENT.is_match(&content) {
                continue;
            }
            let replacement = unquote(&content);
            let markup = self.doc.inner_markup(element);
            if replacement == markup {
                continue;
            }
            let detached = self.doc.replace_inner_markup(element, replacement)?;
            self.undo.push(Undo::RestoreChildren { element, detached });
        }
        Ok(())
    }

    fn rollback(&mut self) {
        while let Some(undo) = self.undo.pop() {
            match undo {
                Undo::RestoreAttribute {
                    element,
                    name,
                    value: Some(value),
                } => self.doc.set_attribute(element, name, &value),
                Undo::RestoreAttribute {
                    element,
                    name,
                    value: None,
                } => self.doc.remove_attribute(element, name),
                Undo::RestoreChildren { element, detached } => {
                    if let Err(err) = self.doc.restore_inner(element, detached) {
                        error!(target: "csspec::test_case", "cannot restore markup of {element:?}: {err}");
                    }
                }
            }
        }
    }
}

impl<D: DomAdapter> Drop for Execution<'_, D> {
    fn drop(&mut self) {
        self.rollback();
    }
}

/// Selectors collected since the last flush of a clause.
struct Queues<'clause> {
    combinator: &'clause str,
    first_clause: bool,
    first_apply: bool,
    filters: Vec<String>,
    contexts: Vec<String>,
}
