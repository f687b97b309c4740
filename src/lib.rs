//! Respack: resource pack archives with a typed metadata tree
//!
//! A pack is a single seekable file holding:
//! - an 8-byte header (metadata size, magic)
//! - a metadata document in a small markup language describing every resource
//! - a data region with the concatenated resource bytes
//!
//! Resources load lazily on first acquisition, are reference counted, and are
//! evicted by an explicit [`Archive::sweep`] run once per host tick. Large
//! resources can be read incrementally through a [`ResourceStream`].
//!
//! # Example
//!
//! ```no_run
//! use respack::{Archive, ArchiveWriter};
//!
//! // Create a pack
//! let mut writer = ArchiveWriter::create("game.pack")?;
//! writer.add_resource("a.raw", &[0xDE, 0xAD, 0xBE, 0xEF])?;
//! writer.finalize()?;
//!
//! // Use it
//! let mut archive = Archive::open("game.pack")?;
//! let id = archive.acquire_by_path("a.raw")?;
//! assert_eq!(archive.data(id), Some(&[0xDE, 0xAD, 0xBE, 0xEF][..]));
//! archive.release(id)?;
//! archive.sweep();
//! archive.close();
//! # Ok::<(), respack::PackError>(())
//! ```

pub mod archive;
pub mod current;
pub mod error;
pub mod markup;
pub mod metadata;
pub mod settings;

// Re-export commonly used types
pub use archive::{
    Archive, ArchiveHeader, ArchiveWriter, Resource, ResourceId, ResourceStream, Span,
    HEADER_SIZE, PACK_MAGIC,
};
pub use error::{PackError, Result};
pub use markup::{dump, ingest, ingest_str, IngestOptions};
pub use metadata::{MetadataNode, NodeType, Value};
pub use settings::{Settings, DEFAULT_SETTINGS_FILE};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Ensure core types are accessible
        let _header = ArchiveHeader::new(0);
        let _node = MetadataNode::new();
        assert_eq!(PACK_MAGIC, 0xA6A);
    }
}
