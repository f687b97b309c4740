use crate::error::{PackError, Result};
use std::io::{ErrorKind, Read, Write};

/// Magic number identifying a resource pack
pub const PACK_MAGIC: u32 = 0xA6A;

/// Header size in bytes
pub const HEADER_SIZE: u64 = 8;

/// Fixed header at the beginning of a pack
///
/// Structure (8 bytes, little-endian):
/// - Metadata size: uint32, length of the markup that follows the header
/// - Magic: uint32, always [`PACK_MAGIC`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub metadata_size: u32,
    pub magic: u32,
}

impl ArchiveHeader {
    pub fn new(metadata_size: u32) -> Self {
        Self {
            metadata_size,
            magic: PACK_MAGIC,
        }
    }

    /// File offset at which the data region starts
    pub fn data_region_offset(&self) -> u64 {
        HEADER_SIZE + u64::from(self.metadata_size)
    }

    /// Write header to a writer
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.metadata_size.to_le_bytes())?;
        writer.write_all(&self.magic.to_le_bytes())?;
        Ok(())
    }

    /// Read and validate a header
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE as usize];
        reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => PackError::TruncatedHeader,
            _ => PackError::Io(e),
        })?;

        let metadata_size = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let magic = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);

        if magic != PACK_MAGIC {
            return Err(PackError::InvalidMagic { found: magic });
        }

        Ok(Self {
            metadata_size,
            magic,
        })
    }
}
