use std::fmt;

/// Declared type of a metadata node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    None,
    String,
    Integer,
    Float,
}

impl NodeType {
    /// Parse the `type` attribute of an `item`
    ///
    /// Returns `None` for unrecognized names; callers degrade those to
    /// [`NodeType::None`] after logging.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "None" => Some(Self::None),
            "String" => Some(Self::String),
            "Integer" => Some(Self::Integer),
            "Float" => Some(Self::Float),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Float => "Float",
        }
    }

    /// Zero value used when an item's text is empty
    pub fn zero_value(self) -> Value {
        match self {
            Self::None => Value::None,
            Self::String => Value::String(String::new()),
            Self::Integer => Value::Integer(0),
            Self::Float => Value::Float(0.0),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed payload of a metadata node
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    String(String),
    Integer(i64),
    Float(f64),
}

impl Value {
    pub fn node_type(&self) -> NodeType {
        match self {
            Value::None => NodeType::None,
            Value::String(_) => NodeType::String,
            Value::Integer(_) => NodeType::Integer,
            Value::Float(_) => NodeType::Float,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::None
    }
}

/// A node of the metadata tree
///
/// Nodes may carry a typed value and children at the same time. The tree is
/// strictly owned: every node owns its children, nothing is shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataNode {
    pub name: Option<String>,
    pub value: Value,
    pub children: Vec<MetadataNode>,
}

impl MetadataNode {
    /// Create an unnamed, untyped node (document or container)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a named node with a value and no children
    pub fn leaf(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: Some(name.into()),
            value,
            children: Vec::new(),
        }
    }

    /// Create a named untyped node with the given children
    pub fn container(name: impl Into<String>, children: Vec<MetadataNode>) -> Self {
        Self {
            name: Some(name.into()),
            value: Value::None,
            children,
        }
    }

    pub fn with_child(mut self, child: MetadataNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.value.node_type()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The `root` element of an ingested document
    ///
    /// Ingestion yields an unnamed document node whose first child is the
    /// markup's `root` container; resource entries and settings live below it.
    pub fn body(&self) -> Option<&MetadataNode> {
        self.children.first()
    }

    /// Total number of nodes in this subtree, including `self`
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }

    /// Depth of the deepest node below `self` (a leaf has depth 0)
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut pending = vec![(self, 0usize)];
        while let Some((node, depth)) = pending.pop() {
            max = max.max(depth);
            pending.extend(node.children.iter().map(|c| (c, depth + 1)));
        }
        max
    }
}

impl Drop for MetadataNode {
    // Children are torn down through a worklist so a deep tree cannot
    // exhaust the stack on drop.
    fn drop(&mut self) {
        if self.children.iter().all(|c| c.children.is_empty()) {
            return;
        }
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        for ty in [NodeType::None, NodeType::String, NodeType::Integer, NodeType::Float] {
            assert_eq!(NodeType::from_name(ty.name()), Some(ty));
        }
        assert_eq!(NodeType::from_name("integer"), None);
        assert_eq!(NodeType::from_name("Bool"), None);
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(NodeType::Integer.zero_value(), Value::Integer(0));
        assert_eq!(NodeType::Float.zero_value(), Value::Float(0.0));
        assert_eq!(NodeType::String.zero_value(), Value::String(String::new()));
        assert_eq!(NodeType::None.zero_value(), Value::None);
    }

    #[test]
    fn test_mixed_node() {
        let node = MetadataNode::leaf("Mixed", Value::Integer(3))
            .with_child(MetadataNode::leaf("Inner", Value::Float(1.5)));
        assert_eq!(node.node_type(), NodeType::Integer);
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.node_count(), 2);
        assert_eq!(node.depth(), 1);
    }

    #[test]
    fn test_deep_tree_drop() {
        let mut node = MetadataNode::new();
        for _ in 0..100_000 {
            node = MetadataNode::new().with_child(node);
        }
        drop(node);
    }
}
