//! Headless binding of [`DomAdapter`] over the `html` tree and the style engine.

use crate::algebra::with_tiers;
use crate::dom::{DomAdapter, StyleSource};
use anyhow::Error;
use html::{Dom, DomUpdate, NodeId};
use log::warn;
use style_engine::{SheetHandle, StyleEngine};
use url::Url;

/// A parsed page plus the stylesheets attached to it.
pub struct HtmlDocument {
    pub dom: Dom,
    pub styles: StyleEngine,
    /// Where the page came from; relative stylesheet links resolve against it.
    pub url: Option<Url>,
}

impl HtmlDocument {
    /// # Errors
    /// Returns an error if the markup cannot be parsed.
    pub fn parse(markup: &str, url: Option<Url>) -> Result<Self, Error> {
        Ok(Self {
            dom: Dom::parse(markup)?,
            styles: StyleEngine::new(),
            url,
        })
    }

    fn update(&mut self, update: DomUpdate) {
        if let Err(err) = self.dom.apply_update(update) {
            warn!(target: "csspec::document", "update failed: {err}");
        }
    }
}

fn is_stylesheet_link(dom: &Dom, node: NodeId) -> bool {
    dom.attr(node, "rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}

impl DomAdapter for HtmlDocument {
    type Element = NodeId;
    type StyleHandle = SheetHandle;
    type Detached = Vec<NodeId>;

    fn query(&self, selector: &str) -> Result<Vec<NodeId>, Error> {
        self.dom.query_selector_all(selector)
    }

    fn find(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, Error> {
        self.dom.select_within(scope, selector)
    }

    fn matches(&self, element: NodeId, selector: &str) -> Result<bool, Error> {
        self.dom.matches(element, selector)
    }

    fn parent(&self, element: NodeId) -> Option<NodeId> {
        self.dom.parent_element(element)
    }

    fn ancestors(&self, element: NodeId) -> Vec<NodeId> {
        self.dom.ancestor_elements(element)
    }

    fn previous_sibling(&self, element: NodeId) -> Option<NodeId> {
        self.dom.preceding_sibling_elements(element).first().copied()
    }

    fn preceding_siblings(&self, element: NodeId) -> Vec<NodeId> {
        self.dom.preceding_sibling_elements(element)
    }

    fn sort_document_order(&self, elements: &mut Vec<NodeId>) {
        self.dom.sort_document_order(elements);
    }

    fn attribute(&self, element: NodeId, name: &str) -> Option<String> {
        self.dom.attr(element, name).map(str::to_owned)
    }

    fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) {
        self.update(DomUpdate::SetAttr {
            node: element,
            name: name.to_owned(),
            value: Some(value.to_owned()),
        });
    }

    fn remove_attribute(&mut self, element: NodeId, name: &str) {
        self.update(DomUpdate::SetAttr {
            node: element,
            name: name.to_owned(),
            value: None,
        });
    }

    fn has_class(&self, element: NodeId, class: &str) -> bool {
        self.dom.has_class(element, class)
    }

    fn add_class(&mut self, element: NodeId, class: &str) -> bool {
        self.dom.add_class(element, class)
    }

    fn remove_class(&mut self, element: NodeId, class: &str) -> bool {
        self.dom.remove_class(element, class)
    }

    fn inner_markup(&self, element: NodeId) -> String {
        self.dom.inner_html(element)
    }

    fn replace_inner_markup(
        &mut self,
        element: NodeId,
        markup: &str,
    ) -> Result<Vec<NodeId>, Error> {
        self.dom.apply_update(DomUpdate::SetInnerHtml {
            node: element,
            html: markup.to_owned(),
        })
    }

    fn restore_inner(&mut self, element: NodeId, detached: Vec<NodeId>) -> Result<(), Error> {
        self.dom
            .apply_update(DomUpdate::RestoreChildren {
                node: element,
                children: detached,
            })
            .map(drop)
    }

    fn text(&self, element: NodeId) -> String {
        self.dom.text_content(element)
    }

    fn computed_style(&self, element: NodeId, property: &str) -> Option<String> {
        self.styles
            .computed_value(&self.dom, element, property)
            .filter(|value| !value.is_empty())
    }

    fn declared_weight(&self, element: NodeId, property: &str) -> Option<u64> {
        self.styles
            .declaration_rank(&self.dom, element, property)
            .map(|rank| with_tiers(rank.specificity.weight(), rank.inline, rank.important))
    }

    fn attach_style(&mut self, css: &str) -> SheetHandle {
        self.styles.attach(css)
    }

    fn detach_style(&mut self, handle: SheetHandle) -> bool {
        self.styles.detach(handle)
    }

    fn style_sources(&self) -> Vec<StyleSource> {
        self.dom
            .elements()
            .into_iter()
            .filter_map(|node| match self.dom.tag(node)? {
                "style" => Some(StyleSource::Inline(self.dom.text_content(node))),
                "link" if is_stylesheet_link(&self.dom, node) => self
                    .dom
                    .attr(node, "href")
                    .map(|href| StyleSource::Linked(href.to_owned())),
                _ => None,
            })
            .collect()
    }
}
