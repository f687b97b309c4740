//! Re-serialization of metadata trees (developer tooling)

use crate::error::Result;
use crate::metadata::{MetadataNode, Value};
use std::io::Write;

/// Write `body` back out as a `root` document
///
/// `body` is the `root` element (see [`MetadataNode::body`]); its children
/// become top-level items. Unnamed nodes are written without a `name`
/// attribute.
pub fn dump<W: Write>(body: &MetadataNode, mut sink: W) -> Result<()> {
    sink.write_all(b"<root>\n")?;
    dump_children(body, &mut sink, 1)?;
    sink.write_all(b"</root>\n")?;
    sink.flush()?;
    Ok(())
}

/// Serialize `body` into an in-memory markup document
pub fn dump_to_vec(body: &MetadataNode) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    dump(body, &mut out)?;
    Ok(out)
}

fn dump_children<W: Write>(node: &MetadataNode, sink: &mut W, depth: usize) -> Result<()> {
    for child in &node.children {
        indent(sink, depth)?;
        sink.write_all(b"<item")?;
        if let Some(name) = &child.name {
            write!(sink, " name=\"{}\"", escape(name, true))?;
        }
        writeln!(sink, " type=\"{}\">", child.node_type())?;

        match &child.value {
            Value::None => {}
            Value::String(s) => {
                indent(sink, depth + 1)?;
                writeln!(sink, "{}", escape(s, false))?;
            }
            Value::Integer(v) => {
                indent(sink, depth + 1)?;
                writeln!(sink, "{}", v)?;
            }
            Value::Float(v) => {
                indent(sink, depth + 1)?;
                writeln!(sink, "{:?}", v)?;
            }
        }

        dump_children(child, sink, depth + 1)?;
        indent(sink, depth)?;
        sink.write_all(b"</item>\n")?;
    }
    Ok(())
}

fn indent<W: Write>(sink: &mut W, depth: usize) -> Result<()> {
    for _ in 0..depth {
        sink.write_all(b"\t")?;
    }
    Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::ingest_str;

    fn sample() -> MetadataNode {
        MetadataNode::new()
            .with_child(MetadataNode::container(
                "a.raw",
                vec![
                    MetadataNode::leaf("Offset", Value::Integer(0)),
                    MetadataNode::leaf("Size", Value::Integer(4)),
                ],
            ))
            .with_child(MetadataNode::container(
                "Display",
                vec![
                    MetadataNode::leaf("FOV", Value::Float(0.1 + 0.2)),
                    MetadataNode::leaf("Big", Value::Float(1e300)),
                    MetadataNode::leaf("Neg", Value::Integer(i64::MIN)),
                ],
            ))
            .with_child(MetadataNode::leaf(
                "Title",
                Value::String("Tom & \"Jerry\" <3\n  second line".into()),
            ))
            .with_child(MetadataNode::leaf("Mixed", Value::Integer(9)).with_child(
                MetadataNode::leaf("Inner", Value::String("x".into())),
            ))
            .with_child(MetadataNode::new().with_child(MetadataNode::leaf("anon", Value::None)))
    }

    #[test]
    fn test_round_trip() {
        let body = sample();
        let markup = dump_to_vec(&body).unwrap();
        let text = String::from_utf8(markup).unwrap();
        let doc = ingest_str(&text).unwrap();
        assert_eq!(doc.body().unwrap(), &body);
    }

    #[test]
    fn test_layout() {
        let body = MetadataNode::new().with_child(MetadataNode::leaf("Width", Value::Integer(640)));
        let text = String::from_utf8(dump_to_vec(&body).unwrap()).unwrap();
        assert_eq!(
            text,
            "<root>\n\t<item name=\"Width\" type=\"Integer\">\n\t\t640\n\t</item>\n</root>\n"
        );
    }

    #[test]
    fn test_failing_sink_propagates() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let err = dump(&sample(), Broken).unwrap_err();
        assert!(err.is_io());
    }
}
