use core::fmt;
use core::fmt::Write as _;

use indextree::NodeId;
use serde_json::{Map, Value, json};

use super::{DOMNode, Document, NodeKey, NodeKind};

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn sorted_attrs(node: &DOMNode) -> Vec<(&str, &str)> {
    let mut pairs: Vec<(&str, &str)> = node
        .attrs
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    pairs.sort_by(|left, right| left.0.cmp(right.0));
    pairs
}

fn flush_text(children: &mut Vec<Value>, text_buf: &mut String) {
    if !text_buf.is_empty() {
        children.push(json!({ "type": "text", "text": text_buf.clone() }));
    }
    text_buf.clear();
}

// Adjacent text nodes are merged so snapshots do not depend on how a
// component split its text into children.
fn coalesce_children(doc: &Document, id: NodeId) -> Vec<Value> {
    let mut children: Vec<Value> = Vec::new();
    let mut text_buf = String::new();
    for child in id.children(&doc.dom) {
        let Some(entry) = doc.dom.get(child) else {
            continue;
        };
        if let NodeKind::Text { text } = &entry.get().kind {
            text_buf.push_str(text);
            continue;
        }
        flush_text(&mut children, &mut text_buf);
        children.push(node_to_json(doc, child));
    }
    flush_text(&mut children, &mut text_buf);
    children
}

fn node_to_json(doc: &Document, id: NodeId) -> Value {
    let Some(entry) = doc.dom.get(id) else {
        return Value::Null;
    };
    let node = entry.get();
    match &node.kind {
        NodeKind::Document => json!({ "type": "document", "children": coalesce_children(doc, id) }),
        NodeKind::Element { tag } => {
            let mut attrs_obj = Map::new();
            for (name, value) in sorted_attrs(node) {
                attrs_obj.insert(name.to_owned(), Value::String(value.to_owned()));
            }
            json!({
                "type": "element",
                "tag": tag,
                "attrs": Value::Object(attrs_obj),
                "children": coalesce_children(doc, id),
            })
        }
        NodeKind::Text { text } => json!({ "type": "text", "text": text }),
    }
}

fn write_markup(doc: &Document, id: NodeId, out: &mut String) -> fmt::Result {
    let Some(entry) = doc.dom.get(id) else {
        return Ok(());
    };
    let node = entry.get();
    match &node.kind {
        NodeKind::Document => {
            for child in id.children(&doc.dom) {
                write_markup(doc, child, out)?;
            }
        }
        NodeKind::Element { tag } => {
            write!(out, "<{tag}")?;
            for (name, value) in sorted_attrs(node) {
                write!(out, " {name}=\"{}\"", escape_markup(value))?;
            }
            out.push('>');
            for child in id.children(&doc.dom) {
                write_markup(doc, child, out)?;
            }
            write!(out, "</{tag}>")?;
        }
        NodeKind::Text { text } => out.push_str(&escape_markup(text)),
    }
    Ok(())
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            for _ in 0..depth {
                f.write_str("  ")?;
            }
            Ok(())
        }

        fn fmt_node(doc: &Document, id: NodeId, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            let Some(entry) = doc.dom.get(id) else {
                return Ok(());
            };
            let node = entry.get();
            write_indent(f, depth)?;
            match &node.kind {
                NodeKind::Document => writeln!(f, "#document")?,
                NodeKind::Element { tag } => {
                    write!(f, "<{tag}")?;
                    for (name, value) in sorted_attrs(node) {
                        write!(f, " {name}=\"{}\"", escape_text(value))?;
                    }
                    let listeners = doc.listener_count(NodeKey(id));
                    if listeners > 0 {
                        write!(f, " [{listeners} listener(s)]")?;
                    }
                    writeln!(f, ">")?;
                }
                NodeKind::Text { text } => writeln!(f, "\"{}\"", escape_text(text))?,
            }
            for child in id.children(&doc.dom) {
                fmt_node(doc, child, f, depth + 1)?;
            }
            Ok(())
        }

        writeln!(f, "DOM")?;
        fmt_node(self, self.root, f, 0)
    }
}

impl Document {
    /// Build a deterministic JSON representation of the document.
    /// Schema:
    /// - Document: { "type":"document", "children":[ ... ] }
    /// - Element: { "type":"element", "tag": "div", "attrs": {..}, "children":[ ... ] }
    /// - Text: { "type":"text", "text":"..." }
    pub fn to_json(&self) -> Value {
        node_to_json(self, self.root)
    }

    /// Pretty JSON string for snapshots and logs.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_else(|_| String::from("{}"))
    }

    /// Serialize `node` and its subtree as markup, attributes sorted by name.
    pub fn outer_html(&self, node: NodeKey) -> String {
        let mut out = String::new();
        if self.get(node).is_some() && write_markup(self, node.0, &mut out).is_err() {
            out.clear();
        }
        out
    }

    /// Markup of the whole document.
    pub fn to_html(&self) -> String {
        self.outer_html(self.root())
    }
}
