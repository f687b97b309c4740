use std::io;
use thiserror::Error;

/// Result type for resource pack operations
pub type Result<T> = std::result::Result<T, PackError>;

/// Unified error type for all resource pack operations
#[derive(Debug, Error)]
pub enum PackError {
    // Structural errors (always fatal to `Archive::open`)
    #[error("Invalid magic number in pack header: {found:#x}")]
    InvalidMagic { found: u32 },

    #[error("Pack header is truncated")]
    TruncatedHeader,

    #[error("Invalid pack format: {0}")]
    InvalidFormat(String),

    #[error("Resource #{index} is beyond pack bounds ({offset} + {size} >= {total})")]
    OutOfBounds {
        index: usize,
        offset: i64,
        size: i64,
        total: u64,
    },

    // Markup errors
    #[error("Malformed markup at byte {offset}: {message}")]
    MalformedMarkup { offset: u64, message: String },

    #[error("Unexpected end of markup input: {0}")]
    UnexpectedEndOfInput(String),

    #[error("Markup nesting exceeds maximum depth of {0}")]
    DepthExceeded(usize),

    // Lookup errors
    #[error("Key not found: {0}")]
    MissingKey(String),

    #[error("Wrong type for key `{key}`: expected {expected}, found {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Resource not found in pack: {0}")]
    ResourceNotFound(String),

    #[error("Resource has no usable Offset/Size: {0}")]
    ResourceUnavailable(String),

    // Lifecycle misuse
    #[error("Release without matching acquire: {0}")]
    NotAcquired(String),

    #[error("No current archive installed")]
    NoCurrentArchive,

    #[error("A current archive is already installed")]
    CurrentArchiveInstalled,

    #[error("Current archive is already in use")]
    CurrentArchiveBusy,

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    // Settings overrides
    #[error("TOML error: {0}")]
    TomlError(String),
}

impl PackError {
    /// True when a lookup failed because the key is absent
    pub fn is_missing_key(&self) -> bool {
        matches!(self, PackError::MissingKey(_) | PackError::ResourceNotFound(_))
    }

    /// True when a key exists but carries a different type
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, PackError::WrongType { .. })
    }

    /// True for OS and allocation failures
    pub fn is_io(&self) -> bool {
        matches!(self, PackError::Io(_) | PackError::OutOfMemory(_))
    }

    pub(crate) fn oom(what: &str, err: std::collections::TryReserveError) -> Self {
        PackError::OutOfMemory(format!("{}: {}", what, err))
    }
}

impl From<toml::de::Error> for PackError {
    fn from(err: toml::de::Error) -> Self {
        PackError::TomlError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(PackError::MissingKey("a.b".into()).is_missing_key());
        assert!(!PackError::MissingKey("a.b".into()).is_wrong_type());

        let wrong = PackError::WrongType {
            key: "Display.Width".into(),
            expected: "Integer",
            found: "String",
        };
        assert!(wrong.is_wrong_type());
        assert!(!wrong.is_missing_key());

        let io = PackError::from(io::Error::new(io::ErrorKind::UnexpectedEof, "short"));
        assert!(io.is_io());
        assert!(!io.is_missing_key());
    }

    #[test]
    fn test_display() {
        let err = PackError::InvalidMagic { found: 0xBAD };
        assert_eq!(err.to_string(), "Invalid magic number in pack header: 0xbad");
    }
}
