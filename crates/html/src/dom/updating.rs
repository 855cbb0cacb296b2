use super::{Dom, DomNode};
use anyhow::{Error, anyhow};
use indextree::NodeId;
use log::trace;

/// A single tree mutation, used to replay or revert changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomUpdate {
    /// Set an attribute, or remove it when `value` is `None`.
    SetAttr {
        node: NodeId,
        name: String,
        value: Option<String>,
    },
    /// Replace all children with the parsed markup.
    SetInnerHtml { node: NodeId, html: String },
    /// Drop the current children and re-attach `children`, previously displaced by
    /// [`DomUpdate::SetInnerHtml`].
    RestoreChildren { node: NodeId, children: Vec<NodeId> },
}

impl Dom {
    /// Append `node` as the last child of `parent`.
    ///
    /// # Errors
    /// Returns an error if `parent` was removed.
    pub fn append_child(&mut self, parent: NodeId, node: DomNode) -> Result<NodeId, Error> {
        if self.node(parent).is_none() {
            return Err(anyhow!("cannot append to a removed node"));
        }
        let id = self.arena.new_node(node);
        parent
            .checked_append(id, &mut self.arena)
            .map_err(|err| anyhow!("failed to append node: {err}"))?;
        Ok(id)
    }

    /// Remove every child subtree of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = id.children(&self.arena).collect();
        for child in children {
            child.remove_subtree(&mut self.arena);
        }
    }

    /// Unlink the children of `id` and return them in order. The subtrees stay
    /// allocated, unreachable from the root until re-attached.
    pub fn detach_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children: Vec<NodeId> = id.children(&self.arena).collect();
        for child in &children {
            child.detach(&mut self.arena);
        }
        children
    }

    /// Replace the children of `id` with previously detached `children`.
    ///
    /// # Errors
    /// Returns an error if `id` was removed or a child cannot be re-attached.
    pub fn restore_children(&mut self, id: NodeId, children: &[NodeId]) -> Result<(), Error> {
        if self.node(id).is_none() {
            return Err(anyhow!("cannot restore children of a removed node"));
        }
        self.clear_children(id);
        for child in children {
            id.checked_append(*child, &mut self.arena)
                .map_err(|err| anyhow!("failed to re-attach node: {err}"))?;
        }
        Ok(())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if let Some(slot) = node.attrs.iter_mut().find(|(key, _)| key == name) {
            value.clone_into(&mut slot.1);
        } else {
            node.attrs.push((name.to_owned(), value.to_owned()));
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(node) = self.node_mut(id) {
            node.attrs.retain(|(key, _)| key != name);
        }
    }

    /// Add a class token. Returns false if it was already present.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        if self.has_class(id, class) || self.node(id).is_none() {
            return false;
        }
        let value = match self.attr(id, "class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_owned(),
        };
        self.set_attr(id, "class", &value);
        true
    }

    /// Remove every occurrence of a class token. Returns false if it was absent.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        if !self.has_class(id, class) {
            return false;
        }
        let value = self
            .attr(id, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
            .filter(|token| *token != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(id, "class", &value);
        true
    }

    /// Apply one update and return the children it displaced, if any.
    ///
    /// # Errors
    /// Returns an error if replacing or restoring children fails.
    pub fn apply_update(&mut self, update: DomUpdate) -> Result<Vec<NodeId>, Error> {
        trace!("applying {update:?}");
        match update {
            DomUpdate::SetAttr {
                node,
                name,
                value: Some(value),
            } => self.set_attr(node, &name, &value),
            DomUpdate::SetAttr {
                node,
                name,
                value: None,
            } => self.remove_attr(node, &name),
            DomUpdate::SetInnerHtml { node, html } => return self.set_inner_html(node, &html),
            DomUpdate::RestoreChildren { node, children } => {
                self.restore_children(node, &children)?;
            }
        }
        Ok(Vec::new())
    }
}
