//! Content tree for the editable surface.
//!
//! All nodes live in an arena owned by [`Surface`] and are addressed by
//! [`NodeId`]. Detached nodes stay in the arena until the surface is
//! replaced wholesale (on document switch), which keeps ids stable for the
//! duration of an operation.

use std::fmt;

use smol_str::SmolStr;

use crate::error::{EditorError, Result};
use crate::style::InlineStyle;
use crate::types::{Affinity, Boundary};

/// Zero-width character anchoring caret markers.
pub const ZERO_WIDTH_ANCHOR: char = '\u{200B}';

/// Attribute carried by caret marker spans (format break, pending highlight).
pub const MARKER_ATTR: &str = "data-format-marker";

const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "li",
    "ul",
    "ol",
    "pre",
    "section",
    "article",
    "header",
    "footer",
];

const VOID_TAGS: &[&str] = &["br", "img", "hr", "wbr", "input"];

/// Arena size below which [`Surface::compact_if_sparse`] never runs.
const COMPACT_FLOOR: usize = 64;

/// Handle to a node in a [`Surface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element: tag, plain attributes, and the parsed `style` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: SmolStr,
    pub attrs: Vec<(SmolStr, String)>,
    pub style: InlineStyle,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: SmolStr::new(tag.to_ascii_lowercase()),
            attrs: Vec::new(),
            style: InlineStyle::new(),
        }
    }

    pub fn with_style(mut self, style: InlineStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        if name.eq_ignore_ascii_case("style") {
            self.style = InlineStyle::parse(&value.into());
            return;
        }
        let name = SmolStr::new(name.to_ascii_lowercase());
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    pub fn is_block(&self) -> bool {
        BLOCK_TAGS.contains(&self.tag.as_str())
    }

    pub fn is_void(&self) -> bool {
        VOID_TAGS.contains(&self.tag.as_str())
    }

    /// Inline container that may wrap text (span, b, a, ...).
    pub fn is_inline_wrapper(&self) -> bool {
        !self.is_block() && !self.is_void()
    }

    /// Heading level for h1..h6.
    pub fn heading_level(&self) -> Option<u8> {
        let rest = self.tag.strip_prefix('h')?;
        match rest.parse::<u8>() {
            Ok(level @ 1..=6) => Some(level),
            _ => None,
        }
    }

    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    /// Marker kind if this is a caret marker span.
    pub fn marker(&self) -> Option<&str> {
        self.attr(MARKER_ATTR)
    }

    /// Two wrappers that render identically and can be merged.
    pub fn same_format(&self, other: &Element) -> bool {
        self.tag == other.tag && self.attrs == other.attrs && self.style == other.style
    }

    /// True if the element carries nothing beyond its tag.
    pub fn is_bare(&self) -> bool {
        self.attrs.is_empty() && self.style.is_empty()
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The editable surface: an arena tree under a synthetic root element.
#[derive(Debug, Clone)]
pub struct Surface {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// Create an empty surface.
    pub fn new() -> Self {
        let root = Node {
            data: NodeData::Element(Element::new("body")),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.index()).ok_or(EditorError::Detached(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.index()).ok_or(EditorError::Detached(id))
    }

    // === Accessors ===

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index()).map(|n| &n.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id)? {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.index())?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(t) => Some(t.as_str()),
            NodeData::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Content length used by boundaries: chars for text, children for elements.
    pub fn node_len(&self, id: NodeId) -> usize {
        match self.data(id) {
            Some(NodeData::Text(t)) => t.chars().count(),
            Some(NodeData::Element(_)) => self.children(id).len(),
            None => 0,
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Iterate proper ancestors, innermost first, ending at the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            surface: self,
            next: self.parent(id),
        }
    }

    /// True if the node is attached under this surface's root.
    pub fn contains(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// True if `ancestor` is a proper ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Deepest node that is an ancestor-or-self of both.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain: Vec<NodeId> = std::iter::once(a).chain(self.ancestors(a)).collect();
        std::iter::once(b)
            .chain(self.ancestors(b))
            .find(|n| chain.contains(n))
    }

    /// Nearest block ancestor-or-self below the root.
    pub fn block_of(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .take_while(|n| *n != self.root)
            .find(|n| self.element(*n).is_some_and(Element::is_block))
    }

    /// Descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of the subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Text content with zero-width anchors removed.
    pub fn visible_text(&self, id: NodeId) -> String {
        self.text_content(id)
            .chars()
            .filter(|c| *c != ZERO_WIDTH_ANCHOR)
            .collect()
    }

    /// No visible text and no replaced content (images, rules).
    pub fn is_blank(&self, id: NodeId) -> bool {
        if !self.visible_text(id).is_empty() {
            return false;
        }
        !self.descendants(id).into_iter().any(|n| {
            self.element(n)
                .is_some_and(|el| el.is_void() && el.tag != "br" && el.tag != "wbr")
        })
    }

    // === Construction ===

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Copy of an element without its children, detached.
    pub fn shallow_clone(&mut self, id: NodeId) -> Result<NodeId> {
        let data = self.node(id)?.data.clone();
        Ok(self.push(data))
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<()> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(t) => {
                *t = text.into();
                Ok(())
            }
            NodeData::Element(_) => Err(EditorError::WrongKind {
                node: id,
                expected: "a text node",
            }),
        }
    }

    // === Mutation ===

    /// Remove a node from its parent. No-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent.index()) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.nodes.get_mut(id.index()) {
            n.parent = None;
        }
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(child)?;
        if self.node(parent).map(|n| matches!(n.data, NodeData::Text(_)))? {
            return Err(EditorError::WrongKind {
                node: parent,
                expected: "an element",
            });
        }
        if child == parent || child == self.root || self.is_ancestor(child, parent) {
            return Err(EditorError::InvalidRange(format!(
                "cannot insert {} under {}",
                child, parent
            )));
        }
        Ok(())
    }

    /// Insert `child` at `index` among `parent`'s children, detaching it
    /// from wherever it was. `index` counts the children without `child`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        self.check_insertable(parent, child)?;
        let len = self
            .children(parent)
            .iter()
            .filter(|c| **c != child)
            .count();
        if index > len {
            return Err(EditorError::OffsetOutOfBounds {
                node: parent,
                offset: index,
                len,
            });
        }
        self.detach(child);
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insertable(parent, child)?;
        self.detach(child);
        let len = self.children(parent).len();
        self.insert_child(parent, len, child)
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        let parent = self.parent(reference).ok_or(EditorError::Detached(reference))?;
        self.check_insertable(parent, node)?;
        self.detach(node);
        let index = self
            .index_in_parent(reference)
            .ok_or(EditorError::Detached(reference))?;
        self.insert_child(parent, index, node)
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        let parent = self.parent(reference).ok_or(EditorError::Detached(reference))?;
        self.check_insertable(parent, node)?;
        self.detach(node);
        let index = self
            .index_in_parent(reference)
            .ok_or(EditorError::Detached(reference))?;
        self.insert_child(parent, index + 1, node)
    }

    /// Put `new` where `old` is and detach `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        self.insert_before(old, new)?;
        self.detach(old);
        Ok(())
    }

    /// Move all children of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        for child in self.children(from).to_vec() {
            self.append_child(to, child)?;
        }
        Ok(())
    }

    /// Wrap `node` in a new element placed at its position.
    pub fn wrap(&mut self, node: NodeId, wrapper: Element) -> Result<NodeId> {
        let wrapper = self.create_element(wrapper);
        self.insert_before(node, wrapper)?;
        self.append_child(wrapper, node)?;
        Ok(wrapper)
    }

    /// Replace an element by its children.
    pub fn unwrap(&mut self, id: NodeId) -> Result<()> {
        if self.parent(id).is_none() {
            return Err(EditorError::Detached(id));
        }
        for child in self.children(id).to_vec() {
            self.insert_before(id, child)?;
        }
        self.detach(id);
        Ok(())
    }

    /// Split a text node at a char offset. The tail becomes a new sibling
    /// right after it, which is returned.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId> {
        let text = self.text(id).ok_or(EditorError::WrongKind {
            node: id,
            expected: "a text node",
        })?;
        let len = text.chars().count();
        if offset > len {
            return Err(EditorError::OffsetOutOfBounds {
                node: id,
                offset,
                len,
            });
        }
        let split = char_to_byte(text, offset);
        let tail = text[split..].to_string();
        let head = text[..split].to_string();
        self.set_text(id, head)?;
        let tail = self.create_text(&tail);
        if self.parent(id).is_some() {
            self.insert_after(id, tail)?;
        }
        Ok(tail)
    }

    /// Resolve a boundary to an element position, splitting a text node if
    /// the boundary falls strictly inside it.
    pub fn element_position(&mut self, at: Boundary) -> Result<(NodeId, usize)> {
        let len = self.node_len(at.node);
        if at.offset > len {
            return Err(EditorError::OffsetOutOfBounds {
                node: at.node,
                offset: at.offset,
                len,
            });
        }
        if !self.is_text(at.node) {
            return Ok((at.node, at.offset));
        }
        let parent = self.parent(at.node).ok_or(EditorError::Detached(at.node))?;
        let index = self
            .index_in_parent(at.node)
            .ok_or(EditorError::Detached(at.node))?;
        if at.offset == 0 {
            return Ok((parent, index));
        }
        if at.offset < len {
            self.split_text(at.node, at.offset)?;
        }
        Ok((parent, index + 1))
    }

    /// Split the element chain from `at` up to and including `ancestor`.
    ///
    /// Everything after the boundary moves into shallow clones; the clone of
    /// `ancestor` is inserted right after it and returned.
    pub fn split_at(&mut self, ancestor: NodeId, at: Boundary) -> Result<NodeId> {
        if ancestor != at.node && !self.is_ancestor(ancestor, at.node) {
            return Err(EditorError::NotInside {
                node: at.node,
                ancestor,
            });
        }
        if ancestor == self.root {
            return Err(EditorError::InvalidRange("cannot split the root".into()));
        }
        let (mut node, mut index) = self.element_position(at)?;
        loop {
            let clone = self.shallow_clone(node)?;
            for child in self.children(node)[index..].to_vec() {
                self.append_child(clone, child)?;
            }
            self.insert_after(node, clone)?;
            if node == ancestor {
                return Ok(clone);
            }
            index = self.index_in_parent(node).ok_or(EditorError::Detached(node))? + 1;
            node = self.parent(node).ok_or(EditorError::Detached(node))?;
        }
    }

    // === Offset mapping ===

    /// Attached, non-empty text nodes in document order with their global
    /// char offset and length.
    pub fn text_segments(&self) -> Vec<(NodeId, usize, usize)> {
        let mut out = Vec::new();
        let mut offset = 0;
        for id in self.descendants(self.root) {
            if let Some(t) = self.text(id) {
                let len = t.chars().count();
                if len > 0 {
                    out.push((id, offset, len));
                    offset += len;
                }
            }
        }
        out
    }

    /// Char count of text in a subtree.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text_content(id).chars().count()
    }

    /// Document-global char offset of a boundary.
    pub fn offset_of(&self, at: Boundary) -> Result<usize> {
        if !self.contains(at.node) {
            return Err(EditorError::Detached(at.node));
        }
        let len = self.node_len(at.node);
        if at.offset > len {
            return Err(EditorError::OffsetOutOfBounds {
                node: at.node,
                offset: at.offset,
                len,
            });
        }
        let mut before = 0;
        if at.node != self.root {
            for id in self.descendants(self.root) {
                if id == at.node {
                    break;
                }
                if let Some(t) = self.text(id) {
                    before += t.chars().count();
                }
            }
        }
        if self.is_text(at.node) {
            return Ok(before + at.offset);
        }
        let inner: usize = self.children(at.node)[..at.offset]
            .iter()
            .map(|c| self.text_len(*c))
            .sum();
        Ok(before + inner)
    }

    /// Boundary at a global char offset.
    ///
    /// At a seam between two text nodes, `Affinity::After` picks the start of
    /// the later node and `Affinity::Before` the end of the earlier one.
    pub fn boundary_at(&self, offset: usize, affinity: Affinity) -> Boundary {
        let segments = self.text_segments();
        let found = segments.iter().find(|(_, start, len)| match affinity {
            Affinity::After => offset < start + len,
            Affinity::Before => offset <= start + len,
        });
        match found.or(segments.last()) {
            Some((id, start, len)) => Boundary::new(*id, offset.saturating_sub(*start).min(*len)),
            None => Boundary::new(self.root, self.children(self.root).len()),
        }
    }

    // === Arena maintenance ===

    /// Nodes held by the arena, attached or not.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Rebuild the arena from the nodes attached under the root, in
    /// document order. Every id held across this call must be mapped.
    pub fn compact(&mut self) -> NodeMap {
        let order: Vec<NodeId> = std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .collect();
        let mut map = vec![None; self.nodes.len()];
        for (new, old) in order.iter().enumerate() {
            map[old.index()] = Some(NodeId(new as u32));
        }
        let map = NodeMap(map);

        let mut old: Vec<Option<Node>> = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(Some)
            .collect();
        self.nodes = order
            .iter()
            .filter_map(|id| old.get_mut(id.index()).and_then(Option::take))
            .map(|mut node| {
                node.parent = node.parent.and_then(|p| map.get(p));
                node.children = node.children.iter().filter_map(|c| map.get(*c)).collect();
                node
            })
            .collect();
        self.root = NodeId(0);
        map
    }

    /// Compact once detached nodes outnumber attached ones.
    pub fn compact_if_sparse(&mut self) -> Option<NodeMap> {
        let live = 1 + self.descendants(self.root).len();
        if self.nodes.len() <= 2 * live.max(COMPACT_FLOOR) {
            return None;
        }
        let before = self.nodes.len();
        let map = self.compact();
        tracing::trace!(before, after = self.nodes.len(), "compacted surface arena");
        Some(map)
    }

    // === Normalization ===

    /// Merge adjacent text, drop empty text and empty inline wrappers, and
    /// merge adjacent identical inline wrappers. Markers are left alone.
    pub fn normalize(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            if self.element(child).is_some() {
                self.normalize(child);
            }
        }

        let mut i = 0;
        loop {
            let kids = self.children(id).to_vec();
            let Some(&current) = kids.get(i) else {
                break;
            };

            let drop = match self.data(current) {
                Some(NodeData::Text(t)) => t.is_empty(),
                Some(NodeData::Element(el)) => {
                    el.is_inline_wrapper()
                        && el.marker().is_none()
                        && self.children(current).is_empty()
                }
                None => false,
            };
            if drop {
                self.detach(current);
                continue;
            }

            if i > 0 {
                let prev = kids[i - 1];
                if let (Some(a), Some(b)) = (self.text(prev), self.text(current)) {
                    let merged = format!("{}{}", a, b);
                    let _ = self.set_text(prev, merged);
                    self.detach(current);
                    continue;
                }
                let mergeable = match (self.element(prev), self.element(current)) {
                    (Some(a), Some(b)) => {
                        a.is_inline_wrapper()
                            && a.marker().is_none()
                            && b.marker().is_none()
                            && a.same_format(b)
                    }
                    _ => false,
                };
                if mergeable {
                    let _ = self.move_children(current, prev);
                    self.detach(current);
                    self.normalize(prev);
                    continue;
                }
            }
            i += 1;
        }
    }
}

/// Old-to-new id mapping produced by [`Surface::compact`].
#[derive(Debug, Clone)]
pub struct NodeMap(Vec<Option<NodeId>>);

impl NodeMap {
    /// New id of an attached node; `None` for nodes that were dropped.
    pub fn get(&self, old: NodeId) -> Option<NodeId> {
        self.0.get(old.index()).copied().flatten()
    }
}

/// Iterator over proper ancestors.
pub struct Ancestors<'a> {
    surface: &'a Surface,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.surface.parent(current);
        Some(current)
    }
}

/// Byte index of a char offset (clamped to the end).
pub(crate) fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(surface: &mut Surface, text: &str) -> (NodeId, NodeId) {
        let p = surface.create_element(Element::new("p"));
        let t = surface.create_text(text);
        surface.append_child(p, t).unwrap();
        surface.append_child(surface.root(), p).unwrap();
        (p, t)
    }

    #[test]
    fn test_split_text_keeps_order() {
        let mut s = Surface::new();
        let (p, t) = para(&mut s, "héllo world");
        let tail = s.split_text(t, 5).unwrap();
        assert_eq!(s.text(t), Some("héllo"));
        assert_eq!(s.text(tail), Some(" world"));
        assert_eq!(s.children(p), &[t, tail]);
    }

    #[test]
    fn test_offset_round_trip() {
        let mut s = Surface::new();
        let (_, a) = para(&mut s, "abc");
        let (p2, b) = para(&mut s, "def");
        assert_eq!(s.offset_of(Boundary::new(b, 1)).unwrap(), 4);
        assert_eq!(s.offset_of(Boundary::new(p2, 0)).unwrap(), 3);
        assert_eq!(s.offset_of(Boundary::new(s.root(), 2)).unwrap(), 6);

        assert_eq!(s.boundary_at(3, Affinity::Before), Boundary::new(a, 3));
        assert_eq!(s.boundary_at(3, Affinity::After), Boundary::new(b, 0));
        assert_eq!(s.boundary_at(99, Affinity::After), Boundary::new(b, 3));
    }

    #[test]
    fn test_split_at_clones_chain() {
        let mut s = Surface::new();
        let p = s.create_element(Element::new("p"));
        let bold = s.create_element(Element::new("b"));
        let t = s.create_text("bold text");
        s.append_child(bold, t).unwrap();
        s.append_child(p, bold).unwrap();
        s.append_child(s.root(), p).unwrap();

        let right = s.split_at(p, Boundary::new(t, 4)).unwrap();
        assert_eq!(s.text_content(p), "bold");
        assert_eq!(s.text_content(right), " text");
        assert_eq!(s.tag(s.children(right)[0]), Some("b"));
        assert_eq!(s.children(s.root()), &[p, right]);
    }

    #[test]
    fn test_split_at_rejects_foreign_ancestor() {
        let mut s = Surface::new();
        let (p1, _) = para(&mut s, "one");
        let (_, t2) = para(&mut s, "two");
        assert!(matches!(
            s.split_at(p1, Boundary::new(t2, 1)),
            Err(EditorError::NotInside { .. })
        ));
    }

    #[test]
    fn test_insert_rejects_cycles() {
        let mut s = Surface::new();
        let (p, t) = para(&mut s, "x");
        assert!(s.insert_child(t, 0, p).is_err());
        let root = s.root();
        assert!(s.append_child(p, root).is_err());
    }

    #[test]
    fn test_normalize_merges_wrappers_and_text() {
        let mut s = Surface::new();
        let p = s.create_element(Element::new("p"));
        s.append_child(s.root(), p).unwrap();
        for word in ["a", "b"] {
            let b = s.create_element(Element::new("b"));
            let t = s.create_text(word);
            s.append_child(b, t).unwrap();
            s.append_child(p, b).unwrap();
        }
        let empty = s.create_element(Element::new("i"));
        s.append_child(p, empty).unwrap();
        let blank = s.create_text("");
        s.append_child(p, blank).unwrap();

        s.normalize(s.root());
        assert_eq!(s.children(p).len(), 1);
        let b = s.children(p)[0];
        assert_eq!(s.children(b).len(), 1);
        assert_eq!(s.text_content(b), "ab");
    }

    #[test]
    fn test_normalize_keeps_markers() {
        let mut s = Surface::new();
        let p = s.create_element(Element::new("p"));
        s.append_child(s.root(), p).unwrap();
        let marker = s.create_element(Element::new("span").with_attr(MARKER_ATTR, "break"));
        s.append_child(p, marker).unwrap();
        s.normalize(s.root());
        assert_eq!(s.children(p), &[marker]);
    }

    #[test]
    fn test_compact_drops_detached_nodes() {
        let mut s = Surface::new();
        let (p, t) = para(&mut s, "keep");
        let (gone, _) = para(&mut s, "gone");
        s.detach(gone);
        let orphan = s.create_text("never attached");
        assert_eq!(s.arena_len(), 6);

        let map = s.compact();
        assert_eq!(s.arena_len(), 3);
        assert_eq!(map.get(gone), None);
        assert_eq!(map.get(orphan), None);
        let kept = map.get(t).unwrap();
        assert_eq!(s.text(kept), Some("keep"));
        assert_eq!(s.parent(kept), map.get(p));
        assert_eq!(s.children(s.root()), &[map.get(p).unwrap()]);
        assert_eq!(s.text_content(s.root()), "keep");
        assert!(s.compact_if_sparse().is_none());
    }

    #[test]
    fn test_block_of_and_blank() {
        let mut s = Surface::new();
        let (p, t) = para(&mut s, "\u{200B}");
        assert_eq!(s.block_of(t), Some(p));
        assert!(s.is_blank(p));
        let loose = s.create_text("loose");
        s.append_child(s.root(), loose).unwrap();
        assert_eq!(s.block_of(loose), None);
    }
}
