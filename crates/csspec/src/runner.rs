//! The run coordinator: discover stylesheets, wait for them, execute, report.

use crate::config::CsspecConfig;
use crate::document::HtmlDocument;
use crate::dom::{DomAdapter, ElementSet, StyleSource};
use crate::error::Result;
use crate::fetch::{fetch_text, resolve_reference};
use crate::report::Report;
use crate::stylesheet::{Stylesheet, StylesheetRegistry};
use futures::future::try_join_all;
use log::{info, warn};
use url::Url;

/// A stylesheet source with its location resolved.
enum Pending {
    Inline(String),
    External(Url),
}

pub struct Runner {
    config: CsspecConfig,
}

impl Runner {
    pub const fn new(config: CsspecConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &CsspecConfig {
        &self.config
    }

    /// Load every stylesheet of the page plus `extra_sources`, run all test cases against
    /// the fixture and report.
    ///
    /// Linked and extra sources are resolved against `base`. Returns `None` without
    /// loading anything if the page has no fixture.
    ///
    /// # Errors
    /// Fails if a stylesheet cannot be fetched or prepared, or a test case cannot be
    /// executed.
    pub async fn run<D: DomAdapter>(
        &self,
        doc: &mut D,
        registry: &mut StylesheetRegistry<D>,
        base: Option<&Url>,
        extra_sources: &[String],
    ) -> Result<Option<Report>> {
        let fixture = ElementSet::select(&*doc, &self.config.fixture_selector)?;
        if fixture.is_empty() {
            warn!(
                target: "csspec::runner",
                "fixture {} not found, nothing to run",
                self.config.fixture_selector
            );
            return Ok(None);
        }

        let pending = Self::discover(doc, base, extra_sources)?;
        let urls: Vec<&Url> = pending
            .iter()
            .filter_map(|source| match source {
                Pending::External(url) => Some(url),
                Pending::Inline(_) => None,
            })
            .collect();
        info!(
            target: "csspec::runner",
            "loading {} stylesheets ({} external)",
            pending.len(),
            urls.len()
        );
        let limit = self.config.load_timeout();
        let mut fetched = try_join_all(urls.iter().map(|url| fetch_text(url, limit)))
            .await?
            .into_iter();

        for source in &pending {
            let sheet = match source {
                Pending::Inline(css) => Stylesheet::inline(doc, css, None)?,
                Pending::External(url) => {
                    let mut sheet = Stylesheet::external(url.clone(), None);
                    let text = fetched.next().unwrap_or_default();
                    sheet.after_load(doc, &text)?;
                    sheet
                }
            };
            registry.push(sheet);
        }

        let report = Report::new(registry.exec_all(doc, &fixture)?);
        info!(
            target: "csspec::runner",
            "{} cases: {} pass, {} fail",
            report.counts.total,
            report.counts.pass,
            report.counts.fail
        );
        Ok(Some(report))
    }

    fn discover<D: DomAdapter>(
        doc: &D,
        base: Option<&Url>,
        extra_sources: &[String],
    ) -> Result<Vec<Pending>> {
        let mut pending = Vec::new();
        for source in doc.style_sources() {
            pending.push(match source {
                StyleSource::Inline(css) => Pending::Inline(css),
                StyleSource::Linked(href) => Pending::External(resolve_reference(&href, base)?),
            });
        }
        for reference in extra_sources {
            pending.push(Pending::External(resolve_reference(reference, base)?));
        }
        Ok(pending)
    }

    /// Parse `markup` into a fresh document and run it with its own registry.
    ///
    /// # Errors
    /// See [`Self::run`]; also fails if the markup cannot be parsed.
    pub async fn run_markup(
        &self,
        markup: &str,
        url: Option<Url>,
        extra_sources: &[String],
    ) -> Result<Option<Report>> {
        let mut doc = HtmlDocument::parse(markup, url)?;
        let mut registry = StylesheetRegistry::new();
        let base = doc.url.clone();
        self.run(&mut doc, &mut registry, base.as_ref(), extra_sources)
            .await
    }

    /// Fetch the page at `reference` (URL or path) and run it.
    ///
    /// # Errors
    /// See [`Self::run_markup`]; also fails if the page cannot be fetched.
    pub async fn run_page(&self, reference: &str, extra_sources: &[String]) -> Result<Option<Report>> {
        let url = resolve_reference(reference, None)?;
        let markup = fetch_text(&url, self.config.load_timeout()).await?;
        self.run_markup(&markup, Some(url), extra_sources).await
    }
}
