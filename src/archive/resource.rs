use std::fmt;

/// Key of a resource within its archive's index
///
/// Ids stay valid for the archive's lifetime; the bytes behind them do not
/// survive a sweep once released, so callers re-resolve data through the
/// archive each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) usize);

impl ResourceId {
    /// Position in the pack's index (and among the `root` element's items)
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Location of a resource relative to the data region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: u64,
    pub size: u64,
}

/// One entry of the resource index
///
/// A resource is Cold while `data` is empty and Hot once its bytes have been
/// loaded. Entries whose metadata lacks `Offset` or `Size` have no span and
/// cannot be loaded or streamed.
#[derive(Debug)]
pub struct Resource {
    pub(crate) name: Option<String>,
    pub(crate) span: Option<Span>,
    pub(crate) reference_count: usize,
    pub(crate) data: Option<Vec<u8>>,
}

impl Resource {
    pub(crate) fn new(name: Option<String>, span: Option<Span>) -> Self {
        Self {
            name,
            span,
            reference_count: 0,
            data: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn size(&self) -> Option<u64> {
        self.span.map(|s| s.size)
    }

    pub fn reference_count(&self) -> usize {
        self.reference_count
    }

    pub fn is_hot(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_usable(&self) -> bool {
        self.span.is_some()
    }

    /// Loaded bytes, present only while Hot
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub(crate) fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "(unnamed)".to_string())
    }
}
