use core::fmt;

use super::{Dom, DomNode, NodeKind};
use indextree::NodeId;

use serde_json::{Value, json};

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text children are written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

fn escape_text(text: &str, out: &mut String) {
    for character in text.chars() {
        match character {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(character),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for character in value.chars() {
        match character {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(character),
        }
    }
}

fn write_children(dom: &Dom, id: NodeId, out: &mut String) {
    let raw = dom
        .tag(id)
        .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
    for child in id.children(&dom.arena) {
        match dom.node(child).map(|node| &node.kind) {
            Some(NodeKind::Text { text }) if raw => out.push_str(text),
            Some(_) => write_node(dom, child, out),
            None => {}
        }
    }
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(DomNode { kind, attrs }) = dom.node(id) else {
        return;
    };
    match kind {
        NodeKind::Document => write_children(dom, id, out),
        NodeKind::Element { tag } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_attr(value, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            write_children(dom, id, out);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeKind::Text { text } => escape_text(text, out),
        NodeKind::Comment { text } => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn node_to_json(dom: &Dom, id: NodeId) -> Value {
    let Some(DomNode { kind, attrs }) = dom.node(id) else {
        return Value::Null;
    };
    let children = || -> Vec<Value> {
        id.children(&dom.arena)
            .map(|child| node_to_json(dom, child))
            .filter(|value| !value.is_null())
            .collect()
    };
    match kind {
        NodeKind::Document => json!({ "type": "document", "children": children() }),
        NodeKind::Element { tag } => {
            // Attribute order is part of the snapshot so rollback checks see reordering.
            let attrs_list: Vec<Value> = attrs
                .iter()
                .map(|(name, value)| json!([name, value]))
                .collect();
            json!({
                "type": "element",
                "tag": tag,
                "attrs": attrs_list,
                "children": children(),
            })
        }
        NodeKind::Text { text } => json!({ "type": "text", "text": text }),
        NodeKind::Comment { text } => json!({ "type": "comment", "text": text }),
    }
}

impl Dom {
    /// Serialized markup of the node's children.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        if self.node(id).is_some() {
            write_children(self, id, &mut out);
        }
        out
    }

    /// Serialized markup of the node itself.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        write_node(self, id, &mut out);
        out
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        if self.node(id).is_none() {
            return String::new();
        }
        id.descendants(&self.arena)
            .filter_map(|node| match &self.node(node)?.kind {
                NodeKind::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Build a deterministic JSON representation of the tree.
    /// Schema:
    /// - Document: { "type":"document", "children":[ ... ] }
    /// - Element: { "type":"element", "tag": "div", "attrs": [[name, value], ..], "children":[ ... ] }
    /// - Text: { "type":"text", "text":"..." }
    /// - Comment: { "type":"comment", "text":"..." }
    pub fn to_json_value(&self) -> Value {
        node_to_json(self, self.root)
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            for _ in 0..depth {
                f.write_str("  ")?;
            }
            Ok(())
        }

        fn fmt_node(
            dom: &Dom,
            id: NodeId,
            f: &mut fmt::Formatter<'_>,
            depth: usize,
        ) -> fmt::Result {
            let Some(DomNode { kind, attrs }) = dom.node(id) else {
                return Ok(());
            };
            // Whitespace-only text is skipped for a cleaner tree.
            if matches!(kind, NodeKind::Text { text } if text.trim().is_empty()) {
                return Ok(());
            }
            write_indent(f, depth)?;
            match kind {
                NodeKind::Document => writeln!(f, "#document")?,
                NodeKind::Element { tag } => {
                    write!(f, "<{tag}")?;
                    for (name, value) in attrs {
                        write!(f, " {name}={value:?}")?;
                    }
                    writeln!(f, ">")?;
                }
                NodeKind::Text { text } => writeln!(f, "{text:?}")?,
                NodeKind::Comment { text } => writeln!(f, "<!--{text}-->")?,
            }
            for child in id.children(&dom.arena) {
                fmt_node(dom, child, f, depth.saturating_add(1))?;
            }
            Ok(())
        }

        fmt_node(self, self.root, f, 0)
    }
}
