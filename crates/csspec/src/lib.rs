//! CSS-driven behavioral tests.
//!
//! Specifications are written as stylesheets: a rule whose selector carries an `-it-`
//! class is a test case, the `-describe-` and `-when-` classes of its selector say how
//! to prepare the fixture, and its declarations are the expected computed values.
//!
//! ```css
//! .-describe-menu.-when-open .item.-it-is-visible { display: block }
//! ```
//!
//! The engine is generic over [`DomAdapter`]; [`HtmlDocument`] runs it headless.

#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_errors_doc,
    reason = "Error conditions are documented where they are not obvious"
)]

pub mod algebra;
pub mod config;
pub mod document;
pub mod dom;
pub mod error;
pub mod expectation;
pub mod fetch;
pub mod function;
pub mod report;
pub mod runner;
pub mod stylesheet;
pub mod test_case;

pub use config::{CsspecConfig, ReportFormat};
pub use document::HtmlDocument;
pub use dom::{DomAdapter, ElementSet, StyleSource};
pub use error::{CsspecError, Result};
pub use expectation::{Expectation, resolve_relative_element};
pub use function::{AttributeFunction, FnAttribute, FunctionRegistry, SourceFunction};
pub use report::{Counts, Report};
pub use runner::Runner;
pub use stylesheet::{OnLoad, SheetOrigin, Stylesheet, StylesheetRegistry, has_test_selector};
pub use test_case::{CaseResult, Outcome, TestCase};
