//! Push tokenizer for the pack markup
//!
//! Bytes are fed in arbitrary chunks; element and character events are
//! delivered to a [`MarkupSink`] as soon as they are complete. Comments,
//! `<!...>` declarations and `<?...?>` processing instructions are skipped.

use crate::error::{PackError, Result};

/// Attribute of a start tag, with entities already decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Receiver of tokenizer events
///
/// Tag and attribute names are delivered lowercased.
pub trait MarkupSink {
    fn start_element(&mut self, tag: &str, attributes: &[Attribute], offset: u64) -> Result<()>;
    fn characters(&mut self, text: &[u8]) -> Result<()>;
    fn end_element(&mut self, tag: &str, offset: u64) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    TagOpen,
    StartTagName,
    EndTagName,
    EndTagTrailing,
    InTag,
    AttrName,
    AfterAttrName,
    BeforeAttrValue,
    AttrValueQuoted(u8),
    AttrValueBare,
    AttrValueBareSlash,
    SelfClosing,
    BangOpen,
    CommentOpenDash,
    Comment { dashes: u8 },
    Declaration,
    ProcessingInstruction,
}

pub(crate) fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\r' | b'\t' | b'\n')
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':')
}

/// Append one byte, reporting allocation failure instead of aborting
fn grow(buf: &mut Vec<u8>, b: u8) -> Result<()> {
    buf.try_reserve(1)
        .map_err(|e| PackError::oom("markup token buffer", e))?;
    buf.push(b);
    Ok(())
}

pub struct Tokenizer {
    state: State,
    position: u64,
    tag_start: u64,
    text: Vec<u8>,
    tag: Vec<u8>,
    attr_name: Vec<u8>,
    attr_value: Vec<u8>,
    attributes: Vec<Attribute>,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            state: State::Text,
            position: 0,
            tag_start: 0,
            text: Vec::new(),
            tag: Vec::new(),
            attr_name: Vec::new(),
            attr_value: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn feed<S: MarkupSink>(&mut self, bytes: &[u8], sink: &mut S) -> Result<()> {
        for &b in bytes {
            self.step(b, sink)?;
            self.position += 1;
        }
        Ok(())
    }

    /// Signal end of input, flushing trailing character data
    pub fn finish<S: MarkupSink>(mut self, sink: &mut S) -> Result<()> {
        match self.state {
            State::Text => self.flush_text(sink),
            State::Comment { .. } | State::CommentOpenDash => Err(PackError::UnexpectedEndOfInput(
                format!("unterminated comment starting at byte {}", self.tag_start),
            )),
            _ => Err(PackError::UnexpectedEndOfInput(format!(
                "unterminated tag starting at byte {}",
                self.tag_start
            ))),
        }
    }

    fn malformed(&self, message: impl Into<String>) -> PackError {
        PackError::MalformedMarkup {
            offset: self.position,
            message: message.into(),
        }
    }

    fn step<S: MarkupSink>(&mut self, b: u8, sink: &mut S) -> Result<()> {
        match self.state {
            State::Text => {
                if b == b'<' {
                    self.flush_text(sink)?;
                    self.tag_start = self.position;
                    self.state = State::TagOpen;
                } else {
                    grow(&mut self.text, b)?;
                }
            }
            State::TagOpen => match b {
                b'/' => {
                    self.tag.clear();
                    self.state = State::EndTagName;
                }
                b'!' => self.state = State::BangOpen,
                b'?' => self.state = State::ProcessingInstruction,
                _ if b.is_ascii_alphabetic() => {
                    self.tag.clear();
                    self.attributes.clear();
                    grow(&mut self.tag, b.to_ascii_lowercase())?;
                    self.state = State::StartTagName;
                }
                _ => return Err(self.malformed(format!("unexpected `{}` after `<`", b as char))),
            },
            State::StartTagName => match b {
                _ if is_name_byte(b) => grow(&mut self.tag, b.to_ascii_lowercase())?,
                _ if is_blank(b) => self.state = State::InTag,
                b'>' => self.emit_start(sink)?,
                b'/' => self.state = State::SelfClosing,
                _ => return Err(self.malformed("invalid character in tag name")),
            },
            State::InTag => match b {
                _ if is_blank(b) => {}
                b'>' => self.emit_start(sink)?,
                b'/' => self.state = State::SelfClosing,
                _ if is_name_byte(b) => {
                    self.attr_name.clear();
                    self.attr_value.clear();
                    grow(&mut self.attr_name, b.to_ascii_lowercase())?;
                    self.state = State::AttrName;
                }
                _ => return Err(self.malformed("invalid character in tag")),
            },
            State::AttrName => match b {
                _ if is_name_byte(b) => grow(&mut self.attr_name, b.to_ascii_lowercase())?,
                b'=' => self.state = State::BeforeAttrValue,
                _ if is_blank(b) => self.state = State::AfterAttrName,
                b'>' => {
                    self.push_attribute()?;
                    self.emit_start(sink)?;
                }
                b'/' => {
                    self.push_attribute()?;
                    self.state = State::SelfClosing;
                }
                _ => return Err(self.malformed("invalid character in attribute name")),
            },
            State::AfterAttrName => match b {
                _ if is_blank(b) => {}
                b'=' => self.state = State::BeforeAttrValue,
                b'>' => {
                    self.push_attribute()?;
                    self.emit_start(sink)?;
                }
                b'/' => {
                    self.push_attribute()?;
                    self.state = State::SelfClosing;
                }
                _ if is_name_byte(b) => {
                    self.push_attribute()?;
                    grow(&mut self.attr_name, b.to_ascii_lowercase())?;
                    self.state = State::AttrName;
                }
                _ => return Err(self.malformed("invalid character after attribute name")),
            },
            State::BeforeAttrValue => match b {
                _ if is_blank(b) => {}
                b'"' | b'\'' => self.state = State::AttrValueQuoted(b),
                b'>' => return Err(self.malformed("missing attribute value")),
                _ => {
                    grow(&mut self.attr_value, b)?;
                    self.state = State::AttrValueBare;
                }
            },
            State::AttrValueQuoted(quote) => {
                if b == quote {
                    self.push_attribute()?;
                    self.state = State::InTag;
                } else {
                    grow(&mut self.attr_value, b)?;
                }
            }
            State::AttrValueBare => match b {
                _ if is_blank(b) => {
                    self.push_attribute()?;
                    self.state = State::InTag;
                }
                b'>' => {
                    self.push_attribute()?;
                    self.emit_start(sink)?;
                }
                b'/' => self.state = State::AttrValueBareSlash,
                _ => grow(&mut self.attr_value, b)?,
            },
            // A `/` inside a bare value closes the tag only when `>` follows.
            State::AttrValueBareSlash => match b {
                b'>' => {
                    self.push_attribute()?;
                    self.emit_self_closing(sink)?;
                }
                b'/' => grow(&mut self.attr_value, b'/')?,
                _ if is_blank(b) => {
                    grow(&mut self.attr_value, b'/')?;
                    self.push_attribute()?;
                    self.state = State::InTag;
                }
                _ => {
                    grow(&mut self.attr_value, b'/')?;
                    grow(&mut self.attr_value, b)?;
                    self.state = State::AttrValueBare;
                }
            },
            State::SelfClosing => {
                if b != b'>' {
                    return Err(self.malformed("expected `>` after `/`"));
                }
                self.emit_self_closing(sink)?;
            }
            State::EndTagName => match b {
                _ if is_name_byte(b) => grow(&mut self.tag, b.to_ascii_lowercase())?,
                b'>' => self.emit_end(sink)?,
                _ if is_blank(b) && !self.tag.is_empty() => self.state = State::EndTagTrailing,
                _ => return Err(self.malformed("invalid character in close tag")),
            },
            State::EndTagTrailing => match b {
                _ if is_blank(b) => {}
                b'>' => self.emit_end(sink)?,
                _ => return Err(self.malformed("expected `>` in close tag")),
            },
            State::BangOpen => match b {
                b'-' => self.state = State::CommentOpenDash,
                b'>' => self.state = State::Text,
                _ => self.state = State::Declaration,
            },
            State::CommentOpenDash => {
                self.state = if b == b'-' {
                    State::Comment { dashes: 0 }
                } else {
                    State::Declaration
                };
            }
            State::Comment { dashes } => {
                self.state = match b {
                    b'-' => State::Comment {
                        dashes: (dashes + 1).min(2),
                    },
                    b'>' if dashes >= 2 => State::Text,
                    _ => State::Comment { dashes: 0 },
                };
            }
            State::Declaration | State::ProcessingInstruction => {
                if b == b'>' {
                    self.state = State::Text;
                }
            }
        }
        Ok(())
    }

    fn flush_text<S: MarkupSink>(&mut self, sink: &mut S) -> Result<()> {
        if self.text.is_empty() {
            return Ok(());
        }
        let decoded = decode_entities(&self.text);
        self.text.clear();
        sink.characters(&decoded)
    }

    fn tag_name(&self) -> Result<String> {
        // Name bytes are restricted to ASCII.
        String::from_utf8(self.tag.clone()).map_err(|_| self.malformed("invalid tag name"))
    }

    fn push_attribute(&mut self) -> Result<()> {
        let name = String::from_utf8(std::mem::take(&mut self.attr_name))
            .map_err(|_| self.malformed("invalid attribute name"))?;
        let value = String::from_utf8(decode_entities(&self.attr_value))
            .map_err(|_| self.malformed("attribute value is not valid UTF-8"))?;
        self.attr_value.clear();
        self.attributes
            .try_reserve(1)
            .map_err(|e| PackError::oom("markup attributes", e))?;
        self.attributes.push(Attribute { name, value });
        Ok(())
    }

    fn emit_start<S: MarkupSink>(&mut self, sink: &mut S) -> Result<()> {
        let tag = self.tag_name()?;
        self.state = State::Text;
        sink.start_element(&tag, &self.attributes, self.tag_start)
    }

    fn emit_self_closing<S: MarkupSink>(&mut self, sink: &mut S) -> Result<()> {
        self.emit_start(sink)?;
        let tag = self.tag_name()?;
        sink.end_element(&tag, self.tag_start)
    }

    fn emit_end<S: MarkupSink>(&mut self, sink: &mut S) -> Result<()> {
        let tag = self.tag_name()?;
        self.state = State::Text;
        sink.end_element(&tag, self.tag_start)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the named and numeric character references the markup allows
///
/// Unknown or unterminated references are kept verbatim.
pub fn decode_entities(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] != b'&' {
            out.push(raw[i]);
            i += 1;
            continue;
        }

        let window = &raw[i + 1..raw.len().min(i + 12)];
        let decoded = window
            .iter()
            .position(|&b| b == b';')
            .and_then(|end| resolve_entity(&window[..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                i += end + 2;
            }
            None => {
                out.push(b'&');
                i += 1;
            }
        }
    }

    out
}

fn resolve_entity(name: &[u8]) -> Option<char> {
    match name {
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"amp" => Some('&'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        [b'#', b'x' | b'X', hex @ ..] => std::str::from_utf8(hex)
            .ok()
            .and_then(|s| u32::from_str_radix(s, 16).ok())
            .and_then(char::from_u32),
        [b'#', dec @ ..] => std::str::from_utf8(dec)
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .and_then(char::from_u32),
        _ => None,
    }
}
