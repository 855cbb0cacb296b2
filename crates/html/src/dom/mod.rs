//! Arena-backed document tree used as the test fixture.
//!
//! Nodes live in an `indextree` arena. Removed subtrees stay allocated but are marked
//! removed, so a stale `NodeId` never aliases a live node; every accessor treats removed
//! nodes as absent.
use anyhow::{Error, anyhow};
use css_selectors::{
    ElementAdapter, matches_complex, parse_complex_selector, parse_scoped_selector,
};
use css_syntax::split_selector_list;
use indextree::{Arena, NodeId};
use smallvec::SmallVec;
use std::collections::HashMap;

pub mod printing;
pub mod updating;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Document,
    Element {
        tag: String,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomNode {
    pub kind: NodeKind,
    /// Attributes in source order.
    pub attrs: SmallVec<(String, String), 4>,
}

impl DomNode {
    pub fn element(tag: &str) -> Self {
        Self {
            kind: NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
            },
            attrs: SmallVec::new(),
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        }
    }

    pub fn comment(text: &str) -> Self {
        Self {
            kind: NodeKind::Comment {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

pub struct Dom {
    pub(crate) arena: Arena<DomNode>,
    pub(crate) root: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// An empty document.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(DomNode::default());
        Self { arena, root }
    }

    /// The document node.
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// The node's data, or `None` if it was removed or never existed.
    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.arena
            .get(id)
            .filter(|node| !node.is_removed())
            .map(|node| node.get())
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut DomNode> {
        self.arena
            .get_mut(id)
            .filter(|node| !node.is_removed())
            .map(|node| node.get_mut())
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id)
            .is_some_and(|node| matches!(node.kind, NodeKind::Element { .. }))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Element { tag } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?.attr(name)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|token| token == class))
    }

    /// Parent element; `None` for the document element and for detached nodes.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?;
        let parent = self.arena.get(id)?.parent()?;
        self.is_element(parent).then_some(parent)
    }

    /// Element children in order.
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        id.children(&self.arena)
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// Ancestor elements, closest first.
    pub fn ancestor_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent_element(id);
        while let Some(ancestor) = current {
            out.push(ancestor);
            current = self.parent_element(ancestor);
        }
        out
    }

    /// Preceding sibling elements, closest first.
    pub fn preceding_sibling_elements(&self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        id.preceding_siblings(&self.arena)
            .skip(1)
            .filter(|sibling| self.is_element(*sibling))
            .collect()
    }

    /// Descendant elements in document order, excluding `id` itself.
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        if self.node(id).is_none() {
            return Vec::new();
        }
        id.descendants(&self.arena)
            .skip(1)
            .filter(|node| self.is_element(*node))
            .collect()
    }

    /// All elements of the document in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendant_elements(self.root)
    }

    /// The document element (`<html>`), if any.
    pub fn document_element(&self) -> Option<NodeId> {
        self.child_elements(self.root).into_iter().next()
    }

    /// Sort nodes into document order and drop duplicates and removed nodes.
    pub fn sort_document_order(&self, nodes: &mut Vec<NodeId>) {
        let order: HashMap<NodeId, usize> = self
            .root
            .descendants(&self.arena)
            .enumerate()
            .map(|(index, node)| (node, index))
            .collect();
        nodes.retain(|node| order.contains_key(node));
        nodes.sort_by_key(|node| order.get(node).copied().unwrap_or(usize::MAX));
        nodes.dedup();
    }

    /// All elements matching `selector`, in document order.
    ///
    /// # Errors
    /// Returns an error if the selector cannot be parsed.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, Error> {
        let parsed = parse_complex_list(selector, false)?;
        Ok(self
            .elements()
            .into_iter()
            .filter(|element| {
                parsed
                    .iter()
                    .any(|sel| matches_complex(self, *element, sel, None))
            })
            .collect())
    }

    /// Elements matching `selector` relative to `scope`, in document order.
    ///
    /// The selector may start with a combinator (`> div`); without one it selects
    /// descendants of `scope`.
    ///
    /// # Errors
    /// Returns an error if the selector cannot be parsed.
    pub fn select_within(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, Error> {
        let parsed = parse_complex_list(selector, true)?;
        Ok(self
            .elements()
            .into_iter()
            .filter(|element| {
                parsed
                    .iter()
                    .any(|sel| matches_complex(self, *element, sel, Some(scope)))
            })
            .collect())
    }

    /// True if the element matches `selector`.
    ///
    /// # Errors
    /// Returns an error if the selector cannot be parsed.
    pub fn matches(&self, id: NodeId, selector: &str) -> Result<bool, Error> {
        if !self.is_element(id) {
            return Ok(false);
        }
        let parsed = parse_complex_list(selector, false)?;
        Ok(parsed.iter().any(|sel| matches_complex(self, id, sel, None)))
    }
}

/// Parse a comma-separated selector list, scoped or not.
fn parse_complex_list(
    selector: &str,
    scoped: bool,
) -> Result<Vec<css_selectors::ComplexSelector>, Error> {
    let parts = split_selector_list(selector);
    if parts.is_empty() {
        return Err(anyhow!("empty selector"));
    }
    parts
        .iter()
        .map(|part| {
            let parsed = if scoped {
                parse_scoped_selector(part)
            } else {
                parse_complex_selector(part)
            };
            parsed.map_err(Error::from)
        })
        .collect()
}

impl ElementAdapter for Dom {
    type Handle = NodeId;

    fn parent(&self, element: NodeId) -> Option<NodeId> {
        self.parent_element(element)
    }

    fn previous_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        self.node(element)?;
        element
            .preceding_siblings(&self.arena)
            .skip(1)
            .find(|sibling| self.is_element(*sibling))
    }

    fn next_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        self.node(element)?;
        element
            .following_siblings(&self.arena)
            .skip(1)
            .find(|sibling| self.is_element(*sibling))
    }

    fn tag_name(&self, element: NodeId) -> &str {
        self.tag(element).unwrap_or_default()
    }

    fn element_id(&self, element: NodeId) -> Option<&str> {
        self.attr(element, "id")
    }

    fn has_class(&self, element: NodeId, class: &str) -> bool {
        Self::has_class(self, element, class)
    }

    fn attr(&self, element: NodeId, name: &str) -> Option<&str> {
        Self::attr(self, element, name)
    }

    fn is_empty(&self, element: NodeId) -> bool {
        element.children(&self.arena).all(|child| {
            match self.node(child).map(|node| &node.kind) {
                Some(NodeKind::Element { .. }) => false,
                Some(NodeKind::Text { text }) => text.is_empty(),
                _ => true,
            }
        })
    }
}
