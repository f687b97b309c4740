//! Reference counting and deferred eviction of resource bytes
//!
//! A resource goes Cold -> Hot on its first `acquire_by_path` and stays Hot
//! until a [`Archive::sweep`] finds it unreferenced. Releasing never frees
//! anything by itself: a resource released and re-acquired before the next
//! sweep keeps its bytes.

use crate::archive::reader::Archive;
use crate::archive::resource::ResourceId;
use crate::error::{PackError, Result};
use std::io::{Read, Seek, SeekFrom};

impl Archive {
    /// Look up a resource, load it if Cold, and take a reference
    pub fn acquire_by_path(&mut self, path: &str) -> Result<ResourceId> {
        let id = self.lookup(path).map_err(|e| {
            tracing::error!("Failed to find resource `{}`", path);
            e
        })?;

        self.load(id)?;
        self.entry_mut(id)?.reference_count += 1;

        Ok(id)
    }

    /// Take an additional reference without touching the file
    pub fn acquire(&mut self, id: ResourceId) -> Result<()> {
        self.entry_mut(id)?.reference_count += 1;
        Ok(())
    }

    /// Drop a reference
    ///
    /// Releasing an unreferenced resource is refused and leaves the count at
    /// zero.
    pub fn release(&mut self, id: ResourceId) -> Result<()> {
        let resource = self.entry_mut(id)?;
        if resource.reference_count == 0 {
            let name = resource.display_name();
            tracing::warn!("Release of unreferenced resource `{}`", name);
            return Err(PackError::NotAcquired(name));
        }
        resource.reference_count -= 1;
        Ok(())
    }

    /// Free the bytes of every Hot resource with no references
    ///
    /// Intended to run once per host tick. Returns the number of resources
    /// moved back to Cold.
    pub fn sweep(&mut self) -> usize {
        let mut evicted = 0;
        for resource in &mut self.resources {
            if resource.reference_count == 0 && resource.data.take().is_some() {
                evicted += 1;
            }
        }
        if evicted > 0 {
            tracing::debug!("Swept {} resource(s) from `{}`", evicted, self.path().display());
        }
        evicted
    }

    /// Read a Cold resource's bytes into memory
    fn load(&mut self, id: ResourceId) -> Result<()> {
        let Archive {
            resources,
            file,
            data_region_offset,
            ..
        } = self;

        let resource = resources
            .get_mut(id.0)
            .ok_or_else(|| PackError::ResourceNotFound(id.to_string()))?;
        if resource.data.is_some() {
            return Ok(());
        }

        let span = resource
            .span
            .ok_or_else(|| PackError::ResourceUnavailable(resource.display_name()))?;
        let len = usize::try_from(span.size).map_err(|_| {
            PackError::OutOfMemory(format!("resource of {} bytes", span.size))
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| PackError::oom("resource data", e))?;
        data.resize(len, 0);

        file.seek(SeekFrom::Start(*data_region_offset + span.offset))?;
        file.read_exact(&mut data)?;

        tracing::debug!("Loaded resource `{}` ({} bytes)", resource.display_name(), len);
        resource.data = Some(data);
        Ok(())
    }
}
