//! HTML import and export for the editable surface.
//!
//! Stored notes are whatever a contenteditable element produced, so the
//! parser is tolerant rather than conforming: it never fails, closes what
//! it can, and ignores what it cannot match.

use std::collections::HashMap;

use crate::dom::{Element, NodeData, NodeId, Surface, ZERO_WIDTH_ANCHOR};

/// Parse an HTML fragment into a fresh surface.
pub fn parse(source: &str) -> Surface {
    let mut surface = Surface::new();
    let root = surface.root();
    let mut parser = Parser {
        source,
        pos: 0,
        root,
        stack: Vec::new(),
        tags: HashMap::new(),
    };
    parser.run(&mut surface);
    tracing::trace!(
        target: "folio::html",
        bytes = source.len(),
        blocks = surface.children(root).len(),
        "parsed surface"
    );
    surface
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    root: NodeId,
    /// Open elements, outermost first. The root is never on it.
    stack: Vec<NodeId>,
    tags: HashMap<NodeId, String>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.root)
    }

    fn run(&mut self, surface: &mut Surface) {
        while self.pos < self.source.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_past("-->");
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past(">");
            } else if rest.starts_with("</") {
                self.end_tag();
            } else if rest.starts_with('<')
                && rest[1..].chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            {
                self.start_tag(surface);
            } else {
                self.text(surface);
            }
        }
    }

    fn skip_past(&mut self, terminator: &str) {
        match self.rest().find(terminator) {
            Some(i) => self.pos += i + terminator.len(),
            None => self.pos = self.source.len(),
        }
    }

    fn text(&mut self, surface: &mut Surface) {
        // A lone '<' that doesn't open a tag is literal text.
        let skip = usize::from(self.rest().starts_with('<'));
        let len = self.rest()[skip..]
            .find('<')
            .map(|i| i + skip)
            .unwrap_or(self.rest().len());
        let raw = &self.rest()[..len];
        self.pos += len;

        let decoded = html_escape::decode_html_entities(raw);
        let parent = self.current();
        if parent == surface.root() && decoded.trim().is_empty() && decoded.contains('\n') {
            return;
        }
        let last = surface.children(parent).last().copied();
        if let Some(prev) = last.filter(|n| surface.is_text(*n)) {
            let merged = format!("{}{}", surface.text(prev).unwrap_or_default(), decoded);
            let _ = surface.set_text(prev, merged);
            return;
        }
        let node = surface.create_text(&decoded);
        let _ = surface.append_child(parent, node);
    }

    fn end_tag(&mut self) {
        let body = &self.rest()[2..];
        let end = body.find('>').unwrap_or(body.len());
        let name = body[..end].trim().to_ascii_lowercase();
        self.pos += 2 + end + usize::from(end < body.len());
        self.close(&name);
    }

    /// Pop open elements up to and including the innermost `name`.
    /// Unmatched end tags are ignored.
    fn close(&mut self, name: &str) {
        if let Some(i) = self.open_index(name) {
            self.stack.truncate(i);
        }
    }

    fn open_index(&self, name: &str) -> Option<usize> {
        self.stack.iter().rposition(|n| self.tags.get(n).is_some_and(|t| t == name))
    }

    fn start_tag(&mut self, surface: &mut Surface) {
        self.pos += 1;
        let name_len = self
            .rest()
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(self.rest().len());
        let name = self.rest()[..name_len].to_ascii_lowercase();
        self.pos += name_len;

        let mut element = Element::new(&name);
        let self_closing = self.attributes(&mut element);

        if element.is_block() && self.open_index("p").is_some() {
            self.close("p");
        }

        let node = surface.create_element(element);
        let parent = self.current();
        let _ = surface.append_child(parent, node);

        let is_void = surface.element(node).is_some_and(Element::is_void);
        if !self_closing && !is_void {
            self.tags.insert(node, name);
            self.stack.push(node);
        }
    }

    /// Parse attributes up to the closing `>`. Returns true for `/>`.
    fn attributes(&mut self, element: &mut Element) -> bool {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            let rest = self.rest();

            if rest.is_empty() {
                return false;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return true;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return false;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }

            let name_len = rest
                .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                .unwrap_or(rest.len());
            let name = rest[..name_len].to_string();
            self.pos += name_len;

            let rest = self.rest();
            let trimmed = rest.trim_start();
            if !trimmed.starts_with('=') {
                element.set_attr(&name, "");
                continue;
            }
            self.pos += rest.len() - trimmed.len() + 1;
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            let value = match trimmed.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &trimmed[1..];
                    let end = body.find(quote).unwrap_or(body.len());
                    self.pos += 1 + end + usize::from(end < body.len());
                    &body[..end]
                }
                _ => {
                    let end = trimmed
                        .find(|c: char| c.is_whitespace() || c == '>')
                        .unwrap_or(trimmed.len());
                    self.pos += end;
                    &trimmed[..end]
                }
            };
            element.set_attr(&name, html_escape::decode_html_entities(value));
        }
    }
}

/// Serialize the surface's content (the root itself is not written).
///
/// Caret markers and zero-width anchors never reach the output.
pub fn serialize(surface: &Surface) -> String {
    let mut out = String::new();
    for child in surface.children(surface.root()) {
        write_node(surface, *child, &mut out);
    }
    out
}

fn write_node(surface: &Surface, id: NodeId, out: &mut String) {
    match surface.data(id) {
        Some(NodeData::Text(text)) => {
            let visible: String = text.chars().filter(|c| *c != ZERO_WIDTH_ANCHOR).collect();
            out.push_str(&html_escape::encode_text(&visible));
        }
        Some(NodeData::Element(el)) => {
            if el.marker().is_some() && surface.visible_text(id).is_empty() {
                return;
            }
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in &el.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(value));
                out.push('"');
            }
            if !el.style.is_empty() {
                out.push_str(" style=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(&el.style.to_css()));
                out.push('"');
            }
            out.push('>');
            if el.is_void() {
                return;
            }
            for child in surface.children(id) {
                write_node(surface, *child, out);
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(source: &str) -> String {
        serialize(&parse(source))
    }

    #[test]
    fn test_round_trip_simple() {
        let html = "<p>Hello <b>world</b></p><h2>Title</h2>";
        assert_eq!(round_trip(html), html);
    }

    #[test]
    fn test_normalizes_case_and_attributes() {
        insta::assert_snapshot!(
            round_trip("<P CLASS=note Data-X='1' hidden>x</P>"),
            @r#"<p class="note" data-x="1" hidden="">x</p>"#
        );
    }

    #[test]
    fn test_style_attribute_is_canonical() {
        assert_eq!(
            round_trip(r#"<span style="color:red;font-weight :bold">x</span>"#),
            r#"<span style="color: red; font-weight: bold">x</span>"#
        );
    }

    #[test]
    fn test_entities_and_escaping() {
        assert_eq!(round_trip("<p>a &amp; b &lt;c&gt;</p>"), "<p>a &amp; b &lt;c&gt;</p>");
        let surface = parse("<p>caf&eacute; &#38;</p>");
        assert_eq!(surface.text_content(surface.root()), "café &");
    }

    #[test]
    fn test_void_and_unclosed() {
        assert_eq!(round_trip("<p>one<br>two<p>three"), "<p>one<br>two</p><p>three</p>");
        assert_eq!(round_trip("<div>x<img src=a.png/></div>"), r#"<div>x<img src="a.png/"></div>"#);
    }

    #[test]
    fn test_stray_end_tags_and_comments() {
        assert_eq!(round_trip("<p>a</b><!-- note -->b</p></div>"), "<p>ab</p>");
        assert_eq!(round_trip("1 < 2"), "1 &lt; 2");
    }

    #[test]
    fn test_block_closes_open_paragraph() {
        assert_eq!(
            round_trip("<p>intro<h1>Head</h1>"),
            "<p>intro</p><h1>Head</h1>"
        );
    }

    #[test]
    fn test_layout_whitespace_between_blocks_is_dropped() {
        let surface = parse("<p>a</p>\n  <p>b</p>\n");
        assert_eq!(surface.children(surface.root()).len(), 2);
    }

    #[test]
    fn test_markers_are_not_exported() {
        let html = r#"<p>a<span data-format-marker="break">&#8203;</span>b</p>"#;
        assert_eq!(round_trip(html), "<p>ab</p>");
    }
}
