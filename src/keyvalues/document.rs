//! In-memory tree produced by the KeyValues parser.
//!
//! A [`Node`] is either a leaf carrying a scalar string value or a container
//! holding an ordered list of child nodes, never both. Children keep their
//! insertion order and may legally share a name; lookups by name return the
//! first match. The tree is a plain owned arena with no parent or sibling
//! back-references, so traversal is strictly top-down.

/// A single node in a KeyValues document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Payload {
    Value(String),
    Children(Vec<Node>),
}

impl Node {
    /// Create a leaf node holding a scalar value.
    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Value(value.into()),
        }
    }

    /// Create a container node holding an ordered list of children.
    pub fn container(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Children(children),
        }
    }

    /// The key this node appears under in its parent. Empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_container(&self) -> bool {
        matches!(self.payload, Payload::Children(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.payload, Payload::Value(_))
    }

    /// The scalar value of a leaf node. `None` for containers.
    pub fn value(&self) -> Option<&str> {
        match &self.payload {
            Payload::Value(value) => Some(value),
            Payload::Children(_) => None,
        }
    }

    /// Immediate children in insertion order. Empty for leaf nodes.
    pub fn children(&self) -> &[Node] {
        match &self.payload {
            Payload::Children(children) => children,
            Payload::Value(_) => &[],
        }
    }

    /// First immediate child with the given name, if any.
    ///
    /// Duplicate names are legal in KeyValues documents; the first sibling
    /// in insertion order wins, the rest stay reachable via [`children`].
    ///
    /// [`children`]: Self::children
    pub fn get_child(&self, name: &str) -> Option<&Node> {
        self.children().iter().find(|child| child.name == name)
    }

    /// Value of the first leaf child with the given name.
    ///
    /// Returns `None` when the child is missing, is itself a container, or
    /// holds an empty string. Treating an empty value as absent matches how
    /// Steam's own client reads manifest fields; callers that need to
    /// distinguish the two can inspect [`get_child`] directly.
    ///
    /// [`get_child`]: Self::get_child
    pub fn get_value(&self, name: &str) -> Option<&str> {
        match self.get_child(name).and_then(Node::value) {
            Some("") | None => None,
            Some(value) => Some(value),
        }
    }

    /// First node with the given name anywhere below this one, depth-first.
    pub fn find_first(&self, name: &str) -> Option<&Node> {
        for child in self.children() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_first(name) {
                return Some(found);
            }
        }
        None
    }
}

/// A complete parsed KeyValues document.
///
/// The root is an unnamed container whose children are the document's
/// top-level entries. Steam metadata files carry exactly one top-level
/// object (`"libraryfolders"`, `"AppState"`); [`top`](Self::top) skips the
/// synthetic root and hands that object back directly, which is the view
/// consumers almost always want.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Node,
}

impl Document {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// The unnamed root container.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The first top-level container, typically the document's only object.
    pub fn top(&self) -> Option<&Node> {
        self.root.children().iter().find(|node| node.is_container())
    }
}
