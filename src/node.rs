use std::collections::BTreeMap;

pub type Properties = BTreeMap<String, String>;

/// One node of a rendered code tree: an element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub properties: Properties,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            properties: Properties::new(),
            children: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        self.properties.remove(key)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.property("class")
            .unwrap_or_default()
            .split_whitespace()
    }

    /// Concatenated text of every descendant leaf.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    pub fn text_len(&self) -> usize {
        self.children.iter().map(Node::text_len).sum()
    }

    fn push_text(&self, out: &mut String) {
        for child in &self.children {
            child.push_text(out);
        }
    }

    /// First element child with the given tag, searching depth-first.
    pub fn find_mut(&mut self, tag: &str) -> Option<&mut Element> {
        for child in &mut self.children {
            if let Node::Element(el) = child {
                if el.tag == tag {
                    return Some(el);
                }
                if let Some(found) = el.find_mut(tag) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Splits the subtree at byte offset `at` of its flattened text. Both
    /// halves keep this element's tag and a copy of its properties; the
    /// child straddling the offset is split recursively.
    pub fn split_at(self, at: usize) -> (Element, Element) {
        let Element {
            tag,
            properties,
            children,
        } = self;
        let mut left = Element {
            tag: tag.clone(),
            properties: properties.clone(),
            children: Vec::new(),
        };
        let mut right = Element {
            tag,
            properties,
            children: Vec::new(),
        };

        let mut offset = 0usize;
        for child in children {
            let len = child.text_len();
            if offset + len <= at {
                left.children.push(child);
            } else if offset >= at {
                right.children.push(child);
            } else {
                let (head, tail) = child.split_at(at - offset);
                left.children.push(head);
                right.children.push(tail);
            }
            offset += len;
        }
        (left, right)
    }
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn text_len(&self) -> usize {
        match self {
            Node::Element(el) => el.text_len(),
            Node::Text(value) => value.len(),
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.push_text(out),
            Node::Text(value) => out.push_str(value),
        }
    }

    /// `at` must fall on a char boundary of the node's flattened text.
    pub fn split_at(self, at: usize) -> (Node, Node) {
        match self {
            Node::Element(el) => {
                let (left, right) = el.split_at(at);
                (Node::Element(left), Node::Element(right))
            }
            Node::Text(mut value) => {
                let tail = value.split_off(at);
                (Node::Text(value), Node::Text(tail))
            }
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(value)
    }
}

/// Splits `children[index]` at `at`, leaving the head at `index` and the
/// tail at `index + 1`. Offsets at either edge are a no-op.
pub fn split_child(children: &mut Vec<Node>, index: usize, at: usize) -> bool {
    let Some(len) = children.get(index).map(Node::text_len) else {
        return false;
    };
    if at == 0 || at >= len {
        return false;
    }
    let node = children.remove(index);
    let (head, tail) = node.split_at(at);
    children.insert(index, tail);
    children.insert(index, head);
    true
}
