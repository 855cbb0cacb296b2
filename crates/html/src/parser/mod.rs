//! HTML parsing into the arena tree.
//!
//! html5ever builds an `RcDom`, which is then walked once and copied into the arena.
//! Whitespace text and comments are kept so serialized markup matches what was parsed.
//! Inner markup is parsed as a fragment in the context of the element receiving it.

use crate::dom::{Dom, DomNode, NodeKind};
use anyhow::{Error, anyhow};
use html5ever::tendril::TendrilSink as _;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{LocalName, ParseOpts, QualName, ns, parse_document, parse_fragment};
use indextree::NodeId;
use log::trace;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

fn parse_opts() -> ParseOpts {
    ParseOpts {
        tree_builder: TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn parse_rcdom(html: &str) -> Result<RcDom, Error> {
    parse_document(RcDom::default(), parse_opts())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|err| anyhow!("failed to parse HTML: {err}"))
}

fn parse_rcdom_fragment(html: &str, context: &str) -> Result<RcDom, Error> {
    let context = QualName::new(None, ns!(html), LocalName::from(context));
    parse_fragment(RcDom::default(), parse_opts(), context, Vec::new(), false)
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|err| anyhow!("failed to parse HTML fragment: {err}"))
}

/// Copy `handle` and its subtree under `parent`.
fn walk_tree(dom: &mut Dom, handle: &Handle, parent: NodeId) -> Result<(), Error> {
    let node = match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let mut node = DomNode::element(&name.local);
            node.attrs = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            node
        }
        NodeData::Text { contents } => DomNode::text(&contents.borrow()),
        NodeData::Comment { contents } => DomNode::comment(contents),
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                walk_tree(dom, child, parent)?;
            }
            return Ok(());
        }
        NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => return Ok(()),
    };
    let is_element = matches!(node.kind, NodeKind::Element { .. });
    let id = dom.append_child(parent, node)?;
    if is_element {
        for child in handle.children.borrow().iter() {
            walk_tree(dom, child, id)?;
        }
    }
    Ok(())
}

/// Find the first element child of `handle` named `tag`.
fn child_named(handle: &Handle, tag: &str) -> Option<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .find(|child| matches!(&child.data, NodeData::Element { name, .. } if &*name.local == tag))
        .cloned()
}

impl Dom {
    /// Parse a full HTML document.
    ///
    /// # Errors
    /// Returns an error if html5ever fails to read the input.
    pub fn parse(html: &str) -> Result<Self, Error> {
        let rcdom = parse_rcdom(html)?;
        let mut dom = Self::new();
        let root = dom.root();
        walk_tree(&mut dom, &rcdom.document, root)?;
        trace!("parsed document with {} elements", dom.elements().len());
        Ok(dom)
    }

    /// Replace the children of `id` with the nodes parsed from `html`.
    ///
    /// The markup is parsed as a fragment with `id` as context, so `<td>` content survives
    /// inside a `<tr>`. The previous children are detached, not dropped, and returned in
    /// order so [`Dom::restore_children`] can put the same nodes back.
    ///
    /// # Errors
    /// Returns an error if `id` is not a live element or the markup cannot be parsed.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Result<Vec<NodeId>, Error> {
        let Some(context) = self.tag(id).map(str::to_owned) else {
            return Err(anyhow!("cannot set markup of a removed or non-element node"));
        };
        let rcdom = parse_rcdom_fragment(html, &context)?;
        let displaced = self.detach_children(id);
        // The fragment parser wraps its output in a synthetic `<html>` root.
        if let Some(root) = child_named(&rcdom.document, "html") {
            for child in root.children.borrow().iter() {
                walk_tree(self, child, id)?;
            }
        }
        Ok(displaced)
    }
}
