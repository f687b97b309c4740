use crate::error::{PackError, Result};
use crate::markup::tokenizer::{is_blank, Attribute, MarkupSink, Tokenizer};
use crate::metadata::{MetadataNode, NodeType, Value};
use std::io::{ErrorKind, Read};

/// Default bound on element nesting
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Read buffer size used while streaming markup
const READ_CHUNK: usize = 8 * 1024;

/// Options controlling markup ingestion
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Maximum nesting of elements below the document node
    pub max_depth: usize,

    /// Name of the source, used in log messages
    pub source: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            source: "<none>".to_string(),
        }
    }
}

impl IngestOptions {
    pub fn for_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }
}

/// Ingest exactly `len` bytes of markup from `reader`
///
/// Returns the unnamed document node; its first child is the `root` element.
pub fn ingest<R: Read>(reader: R, len: u64) -> Result<MetadataNode> {
    ingest_with(reader, len, &IngestOptions::default())
}

/// Ingest markup already held in memory
pub fn ingest_str(markup: &str) -> Result<MetadataNode> {
    ingest(markup.as_bytes(), markup.len() as u64)
}

/// Ingest exactly `len` bytes of markup with explicit options
pub fn ingest_with<R: Read>(reader: R, len: u64, options: &IngestOptions) -> Result<MetadataNode> {
    let mut source = reader.take(len);
    let mut builder = TreeBuilder::new(options);
    let mut tokenizer = Tokenizer::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        tokenizer.feed(&buf[..n], &mut builder)?;
    }

    let consumed = tokenizer.position();
    if consumed < len {
        return Err(PackError::UnexpectedEndOfInput(format!(
            "`{}` declares {} bytes of markup, only {} available",
            options.source, len, consumed
        )));
    }

    tokenizer.finish(&mut builder)?;
    builder.finish()
}

struct Frame {
    tag: String,
    node: MetadataNode,
    text: Vec<u8>,
}

/// Builds a metadata tree from tokenizer events using a bounded stack
struct TreeBuilder<'a> {
    options: &'a IngestOptions,
    stack: Vec<Frame>,
    seen_root: bool,
}

impl<'a> TreeBuilder<'a> {
    fn new(options: &'a IngestOptions) -> Self {
        Self {
            options,
            stack: vec![Frame {
                tag: String::new(),
                node: MetadataNode::new(),
                text: Vec::new(),
            }],
            seen_root: false,
        }
    }

    fn finish(mut self) -> Result<MetadataNode> {
        if self.stack.len() > 1 {
            let open: Vec<&str> = self.stack[1..].iter().map(|f| f.tag.as_str()).collect();
            return Err(PackError::UnexpectedEndOfInput(format!(
                "unclosed elements `{}` in `{}`",
                open.join("/"),
                self.options.source
            )));
        }

        match self.stack.pop() {
            Some(document) => Ok(document.node),
            None => Err(PackError::InvalidFormat("empty construction stack".to_string())),
        }
    }

    fn item_node(&self, attributes: &[Attribute]) -> MetadataNode {
        let mut node = MetadataNode::new();

        for attribute in attributes {
            match attribute.name.as_str() {
                "name" => node.name = Some(attribute.value.clone()),
                "type" => {
                    let ty = NodeType::from_name(&attribute.value).unwrap_or_else(|| {
                        tracing::warn!(
                            "<item> element has unknown type `{}` in `{}`",
                            attribute.value,
                            self.options.source
                        );
                        NodeType::None
                    });
                    node.value = ty.zero_value();
                }
                other => {
                    tracing::debug!("Ignoring attribute `{}` on <item> in `{}`", other, self.options.source)
                }
            }
        }

        node
    }

    fn coerce(&self, node: &mut MetadataNode, text: Vec<u8>, offset: u64) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        node.value = match node.node_type() {
            NodeType::None => Value::None,
            // String values must be UTF-8; there is no zero value to fall back to.
            NodeType::String => {
                let text = String::from_utf8(text).map_err(|_| PackError::MalformedMarkup {
                    offset,
                    message: format!(
                        "text of `{}` is not valid UTF-8",
                        node.name().unwrap_or("(none)")
                    ),
                })?;
                Value::String(text)
            }
            NodeType::Integer => Value::Integer(
                std::str::from_utf8(&text)
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or_else(|| {
                        self.unparsable(node, &text, NodeType::Integer);
                        0
                    }),
            ),
            NodeType::Float => Value::Float(
                std::str::from_utf8(&text)
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or_else(|| {
                        self.unparsable(node, &text, NodeType::Float);
                        0.0
                    }),
            ),
        };

        Ok(())
    }

    fn unparsable(&self, node: &MetadataNode, text: &[u8], ty: NodeType) {
        tracing::warn!(
            "Value `{}` of `{}` is not a valid {} in `{}`, using zero",
            String::from_utf8_lossy(text),
            node.name().unwrap_or("(none)"),
            ty,
            self.options.source
        );
    }
}

impl MarkupSink for TreeBuilder<'_> {
    fn start_element(&mut self, tag: &str, attributes: &[Attribute], offset: u64) -> Result<()> {
        let at_document = self.stack.len() == 1;

        if self.stack.len() > self.options.max_depth {
            return Err(PackError::DepthExceeded(self.options.max_depth));
        }

        let node = match tag {
            "root" => {
                if !at_document {
                    return Err(PackError::MalformedMarkup {
                        offset,
                        message: "<root> is only allowed at document level".to_string(),
                    });
                }
                if self.seen_root {
                    return Err(PackError::MalformedMarkup {
                        offset,
                        message: "duplicate <root> element".to_string(),
                    });
                }
                self.seen_root = true;
                MetadataNode::new()
            }
            "item" => {
                if at_document {
                    return Err(PackError::MalformedMarkup {
                        offset,
                        message: "<item> outside of <root>".to_string(),
                    });
                }
                self.item_node(attributes)
            }
            other => {
                tracing::warn!("Unknown element <{}> in `{}`", other, self.options.source);
                MetadataNode::new()
            }
        };

        self.stack
            .try_reserve(1)
            .map_err(|e| PackError::oom("markup construction stack", e))?;
        self.stack.push(Frame {
            tag: tag.to_string(),
            node,
            text: Vec::new(),
        });

        Ok(())
    }

    fn characters(&mut self, text: &[u8]) -> Result<()> {
        let Some(top) = self.stack.last_mut() else {
            return Ok(());
        };

        if top.node.node_type() == NodeType::None {
            return Ok(());
        }

        let text = if top.text.is_empty() {
            let start = text.iter().position(|&b| !is_blank(b)).unwrap_or(text.len());
            &text[start..]
        } else {
            text
        };

        top.text
            .try_reserve(text.len())
            .map_err(|e| PackError::oom("markup text buffer", e))?;
        top.text.extend_from_slice(text);

        Ok(())
    }

    fn end_element(&mut self, tag: &str, offset: u64) -> Result<()> {
        if self.stack.len() <= 1 {
            return Err(PackError::MalformedMarkup {
                offset,
                message: format!("</{}> without matching open element", tag),
            });
        }

        let Some(mut frame) = self.stack.pop() else {
            return Err(PackError::InvalidFormat("empty construction stack".to_string()));
        };

        if frame.tag != tag {
            return Err(PackError::MalformedMarkup {
                offset,
                message: format!("</{}> closes <{}>", tag, frame.tag),
            });
        }

        let mut text = std::mem::take(&mut frame.text);
        let end = text.iter().rposition(|&b| !is_blank(b)).map_or(0, |i| i + 1);
        text.truncate(end);
        self.coerce(&mut frame.node, text, offset)?;

        let Some(parent) = self.stack.last_mut() else {
            return Err(PackError::InvalidFormat("empty construction stack".to_string()));
        };
        parent
            .node
            .children
            .try_reserve(1)
            .map_err(|e| PackError::oom("metadata children", e))?;
        parent.node.children.push(frame.node);

        Ok(())
    }
}
