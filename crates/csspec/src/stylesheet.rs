//! Stylesheets as sources of test cases and custom attribute functions.
//!
//! A [`Stylesheet`] wraps one CSS source. Once its text is available it is attached to
//! the document, so its rules take part in computed style, and prepared: every selector
//! alternative carrying an `-it-` class becomes a [`TestCase`] and every `-fn-`
//! declaration registers a custom attribute function.
//!
//! The live sheets of a run are owned by a [`StylesheetRegistry`], which is also where
//! custom attributes are resolved across sheets.

use crate::algebra::unquote;
use crate::dom::{DomAdapter, ElementSet};
use crate::error::{CsspecError, Result};
use crate::expectation::Expectation;
use crate::function::{
    AttributeFunction, FnAttribute, FunctionRegistry, fn_attribute_name, most_specific,
};
use crate::test_case::{CaseResult, TestCase};
use core::fmt;
use css_syntax::{Declaration, parse_stylesheet};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use url::Url;

#[allow(clippy::expect_used, reason = "pattern is a valid literal")]
static TEST_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.-it\b").expect("valid regex pattern"));

/// Called once when a stylesheet finished loading and preparing.
pub type OnLoad<D> = Box<dyn FnOnce(&Stylesheet<D>)>;

/// True if `selector` is a test selector.
///
/// # Errors
/// Returns [`CsspecError::NestedRequirement`] if it holds more than one `-it-` class.
pub fn has_test_selector(selector: &str) -> Result<bool> {
    match TEST_CLASS.find_iter(selector).count() {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(CsspecError::NestedRequirement(selector.to_owned())),
    }
}

/// Where the text of a stylesheet comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SheetOrigin {
    Inline,
    External(Url),
}

impl fmt::Display for SheetOrigin {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => formatter.write_str("inline stylesheet"),
            Self::External(url) => write!(formatter, "{url}"),
        }
    }
}

pub struct Stylesheet<D: DomAdapter> {
    origin: SheetOrigin,
    source: Option<String>,
    loaded: bool,
    test_cases: Vec<TestCase>,
    functions: FunctionRegistry<D>,
    style_handle: Option<D::StyleHandle>,
    on_load: Option<OnLoad<D>>,
}

impl<D: DomAdapter> fmt::Debug for Stylesheet<D> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Stylesheet")
            .field("origin", &self.origin)
            .field("loaded", &self.loaded)
            .field("test_cases", &self.test_cases.len())
            .field("functions", &self.functions.attribute_count())
            .field("style_handle", &self.style_handle)
            .finish_non_exhaustive()
    }
}

impl<D: DomAdapter> Stylesheet<D> {
    fn unloaded(origin: SheetOrigin, on_load: Option<OnLoad<D>>) -> Self {
        Self {
            origin,
            source: None,
            loaded: false,
            test_cases: Vec::new(),
            functions: FunctionRegistry::new(),
            style_handle: None,
            on_load,
        }
    }

    /// A sheet whose text is already known. It is attached and prepared right away and
    /// `on_load` fires before this returns.
    ///
    /// # Errors
    /// Fails if the text cannot be prepared.
    pub fn inline(doc: &mut D, css: &str, on_load: Option<OnLoad<D>>) -> Result<Self> {
        let mut sheet = Self::unloaded(SheetOrigin::Inline, on_load);
        sheet.after_load(doc, css)?;
        Ok(sheet)
    }

    /// A sheet that loads once its text has been fetched and handed to [`Self::after_load`].
    pub fn external(url: Url, on_load: Option<OnLoad<D>>) -> Self {
        Self::unloaded(SheetOrigin::External(url), on_load)
    }

    pub const fn origin(&self) -> &SheetOrigin {
        &self.origin
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub const fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn test_cases(&self) -> &[TestCase] {
        &self.test_cases
    }

    pub const fn functions(&self) -> &FunctionRegistry<D> {
        &self.functions
    }

    /// Register a callback for `attribute` on elements matching `selector`, next to the
    /// functions declared in the source. Preparing the sheet again drops it.
    ///
    /// # Errors
    /// Fails if the selector cannot be parsed.
    pub fn register_function(
        &mut self,
        attribute: &str,
        function: Arc<dyn AttributeFunction<D>>,
        selector: &str,
        important: bool,
    ) -> Result<()> {
        self.functions
            .register(attribute, function, selector, false, important)
    }

    /// Record the loaded text, attach it to the document, prepare it and notify.
    ///
    /// # Errors
    /// Fails if a selector is malformed, nests `-it-` classes or a function source is
    /// unsupported. The sheet then stays unloaded and its rules are not attached.
    pub fn after_load(&mut self, doc: &mut D, source: &str) -> Result<()> {
        self.source = Some(source.to_owned());
        self.prepare()?;
        if self.style_handle.is_none() {
            self.style_handle = Some(doc.attach_style(source));
        }
        self.loaded = true;
        if let Some(on_load) = self.on_load.take() {
            on_load(self);
        }
        Ok(())
    }

    /// Build the test cases and functions from the recorded source.
    ///
    /// # Errors
    /// See [`Self::after_load`].
    pub fn prepare(&mut self) -> Result<()> {
        let Some(source) = self.source.as_deref() else {
            warn!(target: "csspec::stylesheet", "{} has no source to prepare", self.origin);
            return Ok(());
        };
        let mut test_cases = Vec::new();
        let mut functions = FunctionRegistry::new();
        for rule in parse_stylesheet(source).rules {
            let selectors = rule.selectors();
            let expectations: Vec<Expectation> = rule
                .declarations
                .iter()
                .filter(|decl| fn_attribute_name(&decl.name).is_none())
                .map(|decl| Expectation::new(decl.name.clone(), decl.value.clone()))
                .collect();
            for selector in &selectors {
                if has_test_selector(selector)? {
                    test_cases.push(TestCase::new(selector, expectations.clone())?);
                }
            }
            for decl in &rule.declarations {
                register_declaration(&mut functions, decl, &selectors)?;
            }
        }
        info!(
            target: "csspec::stylesheet",
            "{}: {} test cases, {} functions",
            self.origin,
            test_cases.len(),
            functions.attribute_count()
        );
        self.test_cases = test_cases;
        self.functions = functions;
        Ok(())
    }

    /// The winning function of this sheet for `attribute` on the target set.
    ///
    /// # Errors
    /// Fails if a registered selector cannot be matched.
    pub fn match_fn_attribute(
        &self,
        doc: &D,
        target: &ElementSet<D::Element>,
        attribute: &str,
    ) -> Result<Option<&FnAttribute<D>>> {
        self.functions.lookup(doc, target, attribute)
    }

    /// Execute every test case of this sheet in order.
    ///
    /// # Errors
    /// Stops at the first case that cannot be executed.
    pub fn exec_all_test_cases(
        &self,
        doc: &mut D,
        registry: &StylesheetRegistry<D>,
        fixture: &ElementSet<D::Element>,
    ) -> Result<Vec<CaseResult>> {
        self.test_cases
            .iter()
            .map(|case| case.exec(doc, registry, fixture))
            .collect()
    }

    /// Detach the attached style text from the document. Calling it again does nothing.
    pub fn remove(&mut self, doc: &mut D) {
        if let Some(handle) = self.style_handle.take() {
            doc.detach_style(handle);
            debug!(target: "csspec::stylesheet", "detached {}", self.origin);
        }
    }
}

fn register_declaration<D: DomAdapter>(
    functions: &mut FunctionRegistry<D>,
    decl: &Declaration,
    selectors: &[String],
) -> Result<()> {
    let Some(attribute) = fn_attribute_name(&decl.name) else {
        return Ok(());
    };
    let source = unquote(&decl.value);
    for selector in selectors {
        functions.register_source(attribute, source, selector, false, decl.important)?;
    }
    Ok(())
}

/// The live stylesheets of one run, in load order.
pub struct StylesheetRegistry<D: DomAdapter> {
    sheets: Vec<Stylesheet<D>>,
}

impl<D: DomAdapter> Default for StylesheetRegistry<D> {
    fn default() -> Self {
        Self { sheets: Vec::new() }
    }
}

impl<D: DomAdapter> fmt::Debug for StylesheetRegistry<D> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(&self.sheets).finish()
    }
}

impl<D: DomAdapter> StylesheetRegistry<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet and return its index.
    pub fn push(&mut self, sheet: Stylesheet<D>) -> usize {
        self.sheets.push(sheet);
        self.sheets.len() - 1
    }

    /// Add an inline sheet, loaded immediately.
    ///
    /// # Errors
    /// Fails if the text cannot be prepared.
    pub fn append_stylesheet(&mut self, doc: &mut D, css: &str) -> Result<usize> {
        let sheet = Stylesheet::inline(doc, css, None)?;
        Ok(self.push(sheet))
    }

    /// Take a sheet out of the registry and detach it from the document.
    pub fn remove(&mut self, doc: &mut D, index: usize) -> Option<Stylesheet<D>> {
        if index >= self.sheets.len() {
            return None;
        }
        let mut sheet = self.sheets.remove(index);
        sheet.remove(doc);
        Some(sheet)
    }

    /// Detach and drop every sheet.
    pub fn clear(&mut self, doc: &mut D) {
        for mut sheet in self.sheets.drain(..) {
            sheet.remove(doc);
        }
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stylesheet<D>> {
        self.sheets.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Stylesheet<D>> {
        self.sheets.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stylesheet<D>> + '_ {
        self.sheets.iter()
    }

    pub fn test_case_count(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.test_cases.len()).sum()
    }

    /// The function resolving `attribute` on the target set across all sheets.
    ///
    /// # Errors
    /// Fails if a registered selector cannot be matched.
    pub fn element_fn_attribute(
        &self,
        doc: &D,
        target: &ElementSet<D::Element>,
        attribute: &str,
    ) -> Result<Option<&FnAttribute<D>>> {
        let mut winners = Vec::new();
        for sheet in &self.sheets {
            if let Some(winner) = sheet.match_fn_attribute(doc, target, attribute)? {
                winners.push(winner);
            }
        }
        Ok(most_specific(winners))
    }

    /// Execute the test cases of every loaded sheet.
    ///
    /// # Errors
    /// Stops at the first case that cannot be executed.
    pub fn exec_all(
        &self,
        doc: &mut D,
        fixture: &ElementSet<D::Element>,
    ) -> Result<Vec<CaseResult>> {
        let mut results = Vec::with_capacity(self.test_case_count());
        for sheet in self.sheets.iter().filter(|sheet| sheet.loaded) {
            results.extend(sheet.exec_all_test_cases(doc, self, fixture)?);
        }
        Ok(results)
    }
}
