//! Owned document tree standing in for a page DOM.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Removed nodes stay
//! in the arena detached, so ids handed out earlier never dangle.

use std::collections::BTreeMap;
use std::fmt;

use highvocab_types::{Point, Rect};

use crate::error::DomError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Option<Rect>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            rect: None,
        }
    }
}

/// Blueprint for nodes built by [`Document::replace_node`] and
/// [`Document::append_specs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSpec {
    Text(String),
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<NodeSpec>,
    },
}

impl NodeSpec {
    pub fn text(text: impl Into<String>) -> Self {
        NodeSpec::Text(text.into())
    }

    pub fn element(tag: &str, attributes: &[(&str, &str)], children: Vec<NodeSpec>) -> Self {
        NodeSpec::Element {
            tag: tag.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }
}

/// Character offset inside a text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub node: NodeId,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: TextPosition,
    pub focus: TextPosition,
}

/// One child-list change, as a mutation observer would report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    selection: Option<Selection>,
    scroll: Point,
    mutations: Vec<MutationRecord>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty `html > head, body` skeleton.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            selection: None,
            scroll: Point::default(),
            mutations: Vec::new(),
        };
        let root = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.link(root, head, None);
        doc.link(root, body, None);
        doc.root = root;
        doc.head = head;
        doc.body = body;
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Text(_))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The node itself when it is an element, its parent otherwise.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        if self.element(id).is_some() {
            Some(id)
        } else {
            self.parent(id)
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<(), DomError> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(el) => {
                el.attributes.insert(name.to_string(), value.into());
                Ok(())
            }
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Text(current) => {
                *current = text.into();
                Ok(())
            }
            NodeKind::Element(_) => Err(DomError::NotText(id)),
        }
    }

    /// Replace all children of an element with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        if self.element(id).is_none() {
            return Err(DomError::NotAnElement(id));
        }
        let removed = std::mem::take(&mut self.nodes[id.0].children);
        for child in &removed {
            self.nodes[child.0].parent = None;
        }
        let text_node = self.create_text(text);
        self.link(id, text_node, None);
        self.mutations.push(MutationRecord {
            target: id,
            added: vec![text_node],
            removed,
        });
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert(parent, child, None)
    }

    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<(), DomError> {
        self.insert(parent, child, Some(reference))
    }

    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        let parent = self.parent(id).ok_or(DomError::Detached(id))?;
        self.unlink(id);
        self.mutations.push(MutationRecord {
            target: parent,
            added: Vec::new(),
            removed: vec![id],
        });
        Ok(())
    }

    /// Swap `node` for freshly built nodes, keeping sibling order. Nothing is
    /// touched unless the node has a parent to splice into.
    pub fn replace_node(&mut self, node: NodeId, specs: Vec<NodeSpec>) -> Result<Vec<NodeId>, DomError> {
        let parent = self.parent(node).ok_or(DomError::Detached(node))?;
        let position = self
            .children(parent)
            .iter()
            .position(|&c| c == node)
            .ok_or(DomError::NotAChild { parent, reference: node })?;

        let added: Vec<NodeId> = specs.into_iter().map(|spec| self.build(spec)).collect();
        for &id in &added {
            self.nodes[id.0].parent = Some(parent);
        }
        let children = &mut self.nodes[parent.0].children;
        children.remove(position);
        for (i, &id) in added.iter().enumerate() {
            children.insert(position + i, id);
        }
        self.nodes[node.0].parent = None;

        self.mutations.push(MutationRecord {
            target: parent,
            added: added.clone(),
            removed: vec![node],
        });
        Ok(added)
    }

    /// Build nodes from specs and append them under `parent`.
    pub fn append_specs(&mut self, parent: NodeId, specs: Vec<NodeSpec>) -> Result<Vec<NodeId>, DomError> {
        if self.element(parent).is_none() {
            return Err(DomError::NotAnElement(parent));
        }
        let added: Vec<NodeId> = specs.into_iter().map(|spec| self.build(spec)).collect();
        for &id in &added {
            self.link(parent, id, None);
        }
        self.mutations.push(MutationRecord {
            target: parent,
            added: added.clone(),
            removed: Vec::new(),
        });
        Ok(added)
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.ancestors(id).last() == Some(self.root)
    }

    /// Inclusive ancestor chain, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&n| self.parent(n))
    }

    /// Nearest inclusive ancestor element matching `pred`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&n| self.element(n).is_some_and(&pred))
    }

    /// True when `node` is `ancestor` or lies beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    /// Pre-order walk of the subtree rooted at `id`, including `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_text(n))
            .collect()
    }

    pub fn text_content(&self, id: NodeId) -> String {
        self.text_nodes(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.element(n).and_then(Element::id) == Some(element_id))
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.nodes[id.0].rect
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Option<Rect>) {
        self.nodes[id.0].rect = rect;
    }

    /// Own rectangle, or the union of everything laid out beneath the node.
    pub fn bounding_rect(&self, id: NodeId) -> Option<Rect> {
        if let Some(rect) = self.rect(id) {
            return Some(rect);
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.rect(n))
            .reduce(|acc, r| acc.union(&r))
    }

    /// Text node and character offset under a client point. Points over
    /// non-text geometry yield `None`.
    pub fn caret_from_point(&self, point: Point) -> Option<TextPosition> {
        self.text_nodes(self.body)
            .into_iter()
            .rev()
            .find_map(|node| {
                let rect = self.rect(node)?;
                if !rect.contains(point) {
                    return None;
                }
                let len = self.text(node)?.chars().count();
                if len == 0 || rect.width <= 0.0 {
                    return None;
                }
                let advance = rect.width / len as f64;
                let offset = ((point.x - rect.left) / advance).floor() as usize;
                Some(TextPosition {
                    node,
                    offset: offset.min(len - 1),
                })
            })
    }

    /// Rectangle covering characters `start..end` of a laid-out text node.
    pub fn text_range_rect(&self, node: NodeId, start: usize, end: usize) -> Option<Rect> {
        let rect = self.rect(node)?;
        let len = self.text(node)?.chars().count();
        if len == 0 {
            return Some(rect);
        }
        let advance = rect.width / len as f64;
        let start = start.min(len);
        let end = end.clamp(start, len);
        Some(Rect::new(
            rect.left + advance * start as f64,
            rect.top,
            advance * (end - start) as f64,
            rect.height,
        ))
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Text covered by the selection, in document order.
    pub fn selection_text(&self) -> Option<String> {
        let spans = self.selection_spans()?;
        let text = spans
            .iter()
            .filter_map(|&(node, start, end)| {
                let text = self.text(node)?;
                Some(text.chars().skip(start).take(end - start).collect::<String>())
            })
            .collect();
        Some(text)
    }

    pub fn selection_rect(&self) -> Option<Rect> {
        self.selection_spans()?
            .into_iter()
            .filter(|&(_, start, end)| end > start)
            .filter_map(|(node, start, end)| self.text_range_rect(node, start, end))
            .reduce(|acc, r| acc.union(&r))
    }

    pub fn scroll_offset(&self) -> Point {
        self.scroll
    }

    pub fn set_scroll_offset(&mut self, offset: Point) {
        self.scroll = offset;
    }

    /// Drain child-list changes recorded since the last call.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.serialize(self.root, &mut out);
        out
    }

    pub fn serialize_node(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize(id, &mut out);
        out
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(text) => out.push_str(&escape(text, false)),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attributes {
                    out.push_str(&format!(" {name}=\"{}\"", escape(value, true)));
                }
                out.push('>');
                for &child in self.children(id) {
                    self.serialize(child, out);
                }
                out.push_str(&format!("</{}>", el.tag));
            }
        }
    }

    /// `(text node, start, end)` triples covered by the selection.
    fn selection_spans(&self) -> Option<Vec<(NodeId, usize, usize)>> {
        let selection = self.selection?;
        let order = self.text_nodes(self.root);
        let index_of = |pos: TextPosition| order.iter().position(|&n| n == pos.node);
        let a = index_of(selection.anchor)?;
        let b = index_of(selection.focus)?;

        let (start, end) = if (a, selection.anchor.offset) <= (b, selection.focus.offset) {
            (selection.anchor, selection.focus)
        } else {
            (selection.focus, selection.anchor)
        };
        let (first, last) = (a.min(b), a.max(b));

        let spans = order[first..=last]
            .iter()
            .map(|&node| {
                let len = self.text(node).map_or(0, |t| t.chars().count());
                let from = if node == start.node { start.offset.min(len) } else { 0 };
                let to = if node == end.node { end.offset.min(len) } else { len };
                (node, from, to.max(from))
            })
            .collect();
        Some(spans)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    fn build(&mut self, spec: NodeSpec) -> NodeId {
        match spec {
            NodeSpec::Text(text) => self.create_text(text),
            NodeSpec::Element {
                tag,
                attributes,
                children,
            } => {
                let mut element = Element::new(&tag);
                element.attributes.extend(attributes);
                let id = self.push(NodeKind::Element(element));
                for child in children {
                    let child = self.build(child);
                    self.link(id, child, None);
                }
                id
            }
        }
    }

    fn insert(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<(), DomError> {
        if self.element(parent).is_none() {
            return Err(DomError::NotAnElement(parent));
        }
        if self.contains(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }
        if let Some(reference) = reference
            && self.parent(reference) != Some(parent)
        {
            return Err(DomError::NotAChild { parent, reference });
        }

        let previous = self.parent(child);
        self.unlink(child);
        if let Some(previous) = previous {
            self.mutations.push(MutationRecord {
                target: previous,
                added: Vec::new(),
                removed: vec![child],
            });
        }
        self.link(parent, child, reference);
        self.mutations.push(MutationRecord {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let children = &mut self.nodes[parent.0].children;
        let position = reference
            .and_then(|r| children.iter().position(|&c| c == r))
            .unwrap_or(children.len());
        children.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn unlink(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != child);
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
