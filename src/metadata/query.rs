use crate::error::{PackError, Result};
use crate::metadata::node::{MetadataNode, NodeType, Value};

/// Join path segments for diagnostics (`Display.Width`)
pub fn dotted(path: &[&str]) -> String {
    path.join(".")
}

impl MetadataNode {
    /// Resolve `path` below this node by name alone
    ///
    /// Each segment is matched against the current node's children in order.
    /// When a matching child cannot resolve the rest of the path, later
    /// siblings with the same name are tried, so the first hit in document
    /// order wins. An empty path resolves to `self`. Types never affect
    /// resolution; see [`MetadataNode::lookup_typed`] for type checks.
    pub fn lookup(&self, path: &[&str]) -> Option<&MetadataNode> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self);
        };

        self.children
            .iter()
            .filter(|child| child.name.as_deref() == Some(*head))
            .find_map(|child| child.lookup(rest))
    }

    /// Like [`MetadataNode::lookup`], but absence is an error
    pub fn lookup_node(&self, path: &[&str]) -> Result<&MetadataNode> {
        self.lookup(path)
            .ok_or_else(|| PackError::MissingKey(dotted(path)))
    }

    /// Like [`MetadataNode::lookup_node`], logging the dotted key on a miss
    pub fn lookup_checked(&self, path: &[&str]) -> Result<&MetadataNode> {
        self.lookup_node(path).map_err(|err| {
            tracing::error!("Key `{}` not found in metadata tree", dotted(path));
            err
        })
    }

    /// Resolve `path` and require the node to carry `expected`
    ///
    /// Absent keys yield [`PackError::MissingKey`]; present keys of another
    /// type yield [`PackError::WrongType`].
    pub fn lookup_typed(&self, path: &[&str], expected: NodeType) -> Result<&Value> {
        let node = self.lookup_node(path)?;
        check_type(node, path, expected)
    }

    /// [`MetadataNode::lookup_typed`] with the missing key logged
    pub fn lookup_typed_checked(&self, path: &[&str], expected: NodeType) -> Result<&Value> {
        let node = self.lookup_checked(path)?;
        check_type(node, path, expected)
    }

    pub fn get_integer(&self, path: &[&str]) -> Result<i64> {
        match self.lookup_typed(path, NodeType::Integer)? {
            Value::Integer(v) => Ok(*v),
            other => Err(wrong_type(path, NodeType::Integer, other.node_type())),
        }
    }

    pub fn get_float(&self, path: &[&str]) -> Result<f64> {
        match self.lookup_typed(path, NodeType::Float)? {
            Value::Float(v) => Ok(*v),
            other => Err(wrong_type(path, NodeType::Float, other.node_type())),
        }
    }

    pub fn get_str(&self, path: &[&str]) -> Result<&str> {
        match self.lookup_typed(path, NodeType::String)? {
            Value::String(v) => Ok(v),
            other => Err(wrong_type(path, NodeType::String, other.node_type())),
        }
    }
}

fn check_type<'a>(node: &'a MetadataNode, path: &[&str], expected: NodeType) -> Result<&'a Value> {
    let found = node.node_type();
    if found != expected {
        tracing::warn!("Wrong type for field `{}`: expected {}, found {}", dotted(path), expected, found);
        return Err(wrong_type(path, expected, found));
    }
    Ok(&node.value)
}

fn wrong_type(path: &[&str], expected: NodeType, found: NodeType) -> PackError {
    PackError::WrongType {
        key: dotted(path),
        expected: expected.name(),
        found: found.name(),
    }
}
