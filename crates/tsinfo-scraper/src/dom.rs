//! Minimal HTML tree builder for frame snapshots.
//!
//! Builds an arena of element and text nodes from raw markup using manual
//! byte scanning, with `regex` only for attribute lists. It understands
//! comments, doctype, void elements, raw-text elements (`script`, `style`,
//! `textarea`), character references, and the implicit end tags that table
//! markup relies on (`<td>` closing the previous cell, `<tr>` closing the
//! previous row). It is not an HTML5 parser: misnested markup is resolved by
//! popping to the nearest open element with the same name, and unmatched
//! end tags are ignored.
//!
//! Nodes are stored in document order, so iterating the arena yields the
//! same order as `querySelectorAll`.

use std::sync::LazyLock;

use regex::Regex;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'=<>/]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("valid attribute regex")
});

#[derive(Debug)]
enum NodeKind {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// A parsed frame document.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

/// Borrowed handle to an element (or the document root) inside a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    index: usize,
}

impl Document {
    /// Parses `html` leniently. Never fails; garbage in yields a sparse tree.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let mut builder = TreeBuilder::new();
        builder.run(html);
        Document {
            nodes: builder.nodes,
        }
    }

    /// The document node, usable as a search scope.
    #[must_use]
    pub fn root(&self) -> Element<'_> {
        Element {
            doc: self,
            index: 0,
        }
    }

    /// First element in document order whose `id` attribute equals `id`.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<Element<'_>> {
        self.root().descendants().find(|el| el.attr("id") == Some(id))
    }

    /// All elements named `tag`, in document order.
    pub fn elements_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = Element<'a>> + 'a {
        self.root().descendants().filter(move |el| el.tag() == tag)
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Element { .. }))
            .count()
    }
}

impl<'a> Element<'a> {
    /// Lower-cased tag name; `"#document"` for the root.
    #[must_use]
    pub fn tag(&self) -> &'a str {
        match &self.doc.nodes[self.index].kind {
            NodeKind::Element { tag, .. } => tag,
            NodeKind::Document => "#document",
            NodeKind::Text(_) => "#text",
        }
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match &self.doc.nodes[self.index].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendant text nodes (`textContent`).
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![self.index];
        while let Some(index) = stack.pop() {
            let node = &self.doc.nodes[index];
            if let NodeKind::Text(text) = &node.kind {
                out.push_str(text);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    #[must_use]
    pub fn parent(&self) -> Option<Element<'a>> {
        self.doc.nodes[self.index].parent.map(|index| Element {
            doc: self.doc,
            index,
        })
    }

    /// Nearest inclusive ancestor named `tag` (DOM `closest`).
    #[must_use]
    pub fn closest(&self, tag: &str) -> Option<Element<'a>> {
        let mut current = Some(*self);
        while let Some(el) = current {
            if el.tag() == tag {
                return Some(el);
            }
            current = el.parent();
        }
        None
    }

    /// Descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let doc = self.doc;
        let mut stack: Vec<usize> = doc.nodes[self.index].children.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            while let Some(index) = stack.pop() {
                let node = &doc.nodes[index];
                stack.extend(node.children.iter().rev());
                if matches!(node.kind, NodeKind::Element { .. }) {
                    return Some(Element { doc, index });
                }
            }
            None
        })
    }
}

struct TreeBuilder {
    nodes: Vec<Node>,
    open: Vec<usize>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            open: vec![0],
        }
    }

    fn run(&mut self, html: &str) {
        let bytes = html.as_bytes();
        let mut pos = 0usize;

        while pos < bytes.len() {
            if bytes[pos] != b'<' {
                let end = html[pos..].find('<').map_or(bytes.len(), |i| pos + i);
                self.push_text(&decode_entities(&html[pos..end]));
                pos = end;
                continue;
            }

            let rest = &html[pos..];
            if rest.starts_with("<!--") {
                pos = rest[4..].find("-->").map_or(bytes.len(), |i| pos + 4 + i + 3);
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                pos = rest.find('>').map_or(bytes.len(), |i| pos + i + 1);
                continue;
            }

            let next = bytes.get(pos + 1).copied();
            if next == Some(b'/') && bytes.get(pos + 2).is_some_and(u8::is_ascii_alphabetic) {
                let end = rest.find('>').map_or(bytes.len(), |i| pos + i + 1);
                let name = tag_name(&html[pos + 2..end]);
                self.close(&name);
                pos = end;
                continue;
            }

            if next.is_some_and(|b| b.is_ascii_alphabetic()) {
                let end = find_tag_end(bytes, pos + 1);
                let inner = html[pos + 1..end.min(bytes.len())].trim_end_matches('>');
                // A trailing '/' is ignored; only void elements close at once.
                let inner = inner.trim_end_matches('/');
                let name = tag_name(inner);
                let attrs = parse_attrs(&inner[name.len().min(inner.len())..]);
                pos = end;

                if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    let element = self.open_element(name.clone(), attrs);
                    let close = format!("</{name}");
                    let body_end = find_ascii_case_insensitive(&html[pos..], &close)
                        .map_or(bytes.len(), |i| pos + i);
                    if name != "script" && name != "style" {
                        self.push_text(&decode_entities(&html[pos..body_end]));
                    }
                    self.pop_through(element);
                    pos = html[body_end..]
                        .find('>')
                        .map_or(bytes.len(), |i| body_end + i + 1);
                    continue;
                }

                let element = self.open_element(name.clone(), attrs);
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    self.pop_through(element);
                }
                continue;
            }

            // A bare '<' that does not start markup is text.
            self.push_text("<");
            pos += 1;
        }
    }

    fn current(&self) -> usize {
        self.open.last().copied().unwrap_or(0)
    }

    fn append(&mut self, kind: NodeKind) -> usize {
        let parent = self.current();
        let index = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(index);
        index
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.append(NodeKind::Text(text.to_string()));
    }

    fn open_element(&mut self, tag: String, attrs: Vec<(String, String)>) -> usize {
        self.apply_implied_end_tags(&tag);
        let index = self.append(NodeKind::Element { tag, attrs });
        self.open.push(index);
        index
    }

    /// Table cells and rows close their open siblings implicitly.
    fn apply_implied_end_tags(&mut self, tag: &str) {
        let (targets, boundaries): (&[&str], &[&str]) = match tag {
            "td" | "th" => (&["td", "th"], &["tr", "table"]),
            "tr" => (&["tr"], &["table"]),
            "thead" | "tbody" | "tfoot" => (&["thead", "tbody", "tfoot"], &["table"]),
            _ => return,
        };

        for depth in (1..self.open.len()).rev() {
            let open_tag = self.tag_of(self.open[depth]);
            if targets.contains(&open_tag) {
                self.open.truncate(depth);
                return;
            }
            if boundaries.contains(&open_tag) {
                return;
            }
        }
    }

    fn close(&mut self, name: &str) {
        if let Some(depth) = (1..self.open.len())
            .rev()
            .find(|&d| self.tag_of(self.open[d]) == name)
        {
            self.open.truncate(depth);
        }
    }

    fn pop_through(&mut self, element: usize) {
        if let Some(depth) = self.open.iter().rposition(|&i| i == element) {
            self.open.truncate(depth);
        }
    }

    fn tag_of(&self, index: usize) -> &str {
        match &self.nodes[index].kind {
            NodeKind::Element { tag, .. } => tag,
            _ => "",
        }
    }
}

fn tag_name(inner: &str) -> String {
    inner
        .split(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Index just past the `>` closing a start tag, honouring quoted values.
fn find_tag_end(bytes: &[u8], from: usize) -> usize {
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return i + 1,
            None => {}
        }
        i += 1;
    }
    bytes.len()
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .filter_map(|cap| {
            let name = cap.get(1)?.as_str().to_ascii_lowercase();
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map_or(String::new(), |m| decode_entities(m.as_str()));
            Some((name, value))
        })
        .collect()
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Decodes the named references that matter for text comparison plus
/// numeric references. Unknown references are left as-is.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let name = &after[..semi];
            decode_reference(name).map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(doc: &'a Document, tag: &'a str) -> Vec<String> {
        doc.elements_by_tag(tag)
            .map(|el| el.text().trim().to_string())
            .collect()
    }

    #[test]
    fn finds_element_by_id() {
        let doc = Document::parse(r#"<div><span id="a">one</span><span id='b'>two</span></div>"#);
        assert_eq!(doc.element_by_id("b").unwrap().text(), "two");
        assert!(doc.element_by_id("c").is_none());
    }

    #[test]
    fn implicit_cell_and_row_closing() {
        let doc = Document::parse(
            "<table><tr><td>a<td>b<tr><th>c<td>d</table><p>after</p>",
        );
        let rows: Vec<_> = doc.elements_by_tag("tr").collect();
        assert_eq!(rows.len(), 2);
        let first_cells: Vec<_> = rows[0]
            .descendants()
            .filter(|e| e.tag() == "td")
            .map(|e| e.text())
            .collect();
        assert_eq!(first_cells, vec!["a", "b"]);
        assert_eq!(texts(&doc, "p"), vec!["after"]);
        assert!(doc.elements_by_tag("p").next().unwrap().closest("table").is_none());
    }

    #[test]
    fn nested_table_cells_stay_inside_their_table() {
        let doc = Document::parse(
            "<table><tr><td><table><tr><td>inner</td></tr></table></td><td>outer</td></tr></table>",
        );
        let cells = texts(&doc, "td");
        assert_eq!(cells, vec!["inner", "inner", "outer"]);
    }

    #[test]
    fn closest_walks_up_to_row() {
        let doc = Document::parse(
            r#"<table><tr class="r"><td><div><span id="x">09:00</span></div></td><td class="vet">18:00</td></tr></table>"#,
        );
        let span = doc.element_by_id("x").unwrap();
        let row = span.closest("tr").unwrap();
        assert!(row.has_class("r"));
        assert_eq!(span.closest("span").unwrap().text(), "09:00");
    }

    #[test]
    fn decodes_entities_in_text_and_attributes() {
        let doc = Document::parse(r#"<p title="a &amp; b">x&nbsp;&lt;&#x41;&#66;&bogus;</p>"#);
        let p = doc.elements_by_tag("p").next().unwrap();
        assert_eq!(p.attr("title"), Some("a & b"));
        assert_eq!(p.text(), "x\u{a0}<AB&bogus;");
    }

    #[test]
    fn skips_comments_doctype_and_script_bodies() {
        let doc = Document::parse(
            "<!DOCTYPE html><!-- <td>hidden</td> --><script>if (a < b) { x = '<td>'; }</script><td>shown</td>",
        );
        assert_eq!(texts(&doc, "td"), vec!["shown"]);
    }

    #[test]
    fn void_elements_have_no_children() {
        let doc = Document::parse(r#"<div><br><img src="a.png"/><span>t</span></div>"#);
        let span = doc.elements_by_tag("span").next().unwrap();
        assert_eq!(span.parent().unwrap().tag(), "div");
    }

    #[test]
    fn slash_on_non_void_start_tag_is_ignored() {
        let doc = Document::parse(r#"<td><span id="x"/>09:15</td>"#);
        assert_eq!(doc.element_by_id("x").unwrap().text(), "09:15");
    }

    #[test]
    fn quoted_gt_does_not_end_tag() {
        let doc = Document::parse(r#"<td data-x="a>b" class="vet">17:30</td>"#);
        let td = doc.elements_by_tag("td").next().unwrap();
        assert_eq!(td.attr("data-x"), Some("a>b"));
        assert!(td.has_class("vet"));
        assert_eq!(td.text(), "17:30");
    }

    #[test]
    fn unmatched_end_tags_and_stray_lt_are_tolerated() {
        let doc = Document::parse("</div>a < b<span>c</span></table>");
        assert_eq!(doc.root().text(), "a < bc");
    }

    #[test]
    fn uppercase_tags_are_normalised() {
        let doc = Document::parse("<TABLE><TR><TD>x</TD></TR></TABLE>");
        assert_eq!(texts(&doc, "td"), vec!["x"]);
        assert_eq!(doc.element_count(), 3);
    }
}
