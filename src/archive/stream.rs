use crate::archive::reader::Archive;
use crate::archive::resource::ResourceId;
use crate::error::{PackError, Result};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Take};

/// Sequential reader over one resource's bytes in the pack file
///
/// Borrows the archive's file handle, so no other archive operation (and no
/// other stream) can move the cursor while this stream is alive.
#[derive(Debug)]
pub struct ResourceStream<'a> {
    inner: Take<&'a mut File>,
    size: u64,
}

impl<'a> ResourceStream<'a> {
    /// Total size of the resource
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes not yet read
    pub fn remaining(&self) -> u64 {
        self.inner.limit()
    }
}

impl Read for ResourceStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Archive {
    /// Position the pack's cursor at a resource for direct reads
    pub fn stream(&mut self, path: &str) -> Result<ResourceStream<'_>> {
        let id = self.lookup(path)?;
        self.stream_resource(id)
    }

    pub fn stream_resource(&mut self, id: ResourceId) -> Result<ResourceStream<'_>> {
        let resource = self.entry(id)?;
        let span = resource
            .span
            .ok_or_else(|| PackError::ResourceUnavailable(resource.display_name()))?;

        let start = self.data_region_offset + span.offset;
        self.file.seek(SeekFrom::Start(start))?;

        Ok(ResourceStream {
            inner: Read::take(&mut self.file, span.size),
            size: span.size,
        })
    }
}
