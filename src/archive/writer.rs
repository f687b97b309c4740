use crate::archive::format::ArchiveHeader;
use crate::archive::reader::{OFFSET_KEY, SIZE_KEY};
use crate::error::{PackError, Result};
use crate::markup;
use crate::metadata::{MetadataNode, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Normalize path to forward slashes (cross-platform compatibility)
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

struct PendingResource {
    name: String,
    data: Vec<u8>,
    fields: Vec<MetadataNode>,
}

/// Pack builder for tooling and tests
///
/// Resources are buffered until [`ArchiveWriter::finalize`], which writes the
/// header, the metadata markup and the data region in one pass.
pub struct ArchiveWriter {
    path: PathBuf,
    resources: Vec<PendingResource>,
    data_size: u64,
}

impl ArchiveWriter {
    /// Start a new pack at `path` (created or truncated on finalize)
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            resources: Vec::new(),
            data_size: 0,
        })
    }

    /// Add a resource with only the mandatory `Offset`/`Size` fields
    pub fn add_resource(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.add_resource_with(name, data, Vec::new())
    }

    /// Add a resource with extra metadata fields (e.g. image `Width`)
    pub fn add_resource_with(
        &mut self,
        name: &str,
        data: &[u8],
        fields: Vec<MetadataNode>,
    ) -> Result<()> {
        if let Some(field) = fields
            .iter()
            .find(|f| matches!(f.name(), Some(OFFSET_KEY) | Some(SIZE_KEY)))
        {
            return Err(PackError::InvalidFormat(format!(
                "field `{}` of `{}` is reserved",
                field.name().unwrap_or_default(),
                name
            )));
        }

        self.data_size += data.len() as u64;
        self.resources.push(PendingResource {
            name: normalize_path(name),
            data: data.to_vec(),
            fields,
        });
        Ok(())
    }

    /// Metadata tree that will describe the buffered resources
    pub fn metadata(&self) -> MetadataNode {
        let mut body = MetadataNode::new();
        let mut offset = 0u64;

        for resource in &self.resources {
            let mut item = MetadataNode::container(
                resource.name.clone(),
                vec![
                    MetadataNode::leaf(OFFSET_KEY, Value::Integer(offset as i64)),
                    MetadataNode::leaf(SIZE_KEY, Value::Integer(resource.data.len() as i64)),
                ],
            );
            item.children.extend(resource.fields.iter().cloned());
            body.children.push(item);
            offset += resource.data.len() as u64;
        }

        body
    }

    /// Write the pack to disk
    pub fn finalize(self) -> Result<()> {
        let markup = markup::dump_to_vec(&self.metadata())?;
        let metadata_size = u32::try_from(markup.len()).map_err(|_| {
            PackError::InvalidFormat(format!("metadata of {} bytes is too large", markup.len()))
        })?;

        let mut writer = BufWriter::new(File::create(&self.path)?);
        ArchiveHeader::new(metadata_size).write_to(&mut writer)?;
        writer.write_all(&markup)?;
        for resource in &self.resources {
            writer.write_all(&resource.data)?;
        }
        writer.flush()?;

        tracing::info!(
            "Wrote resource pack `{}` ({} entries, {} data bytes)",
            self.path.display(),
            self.resources.len(),
            self.data_size
        );
        Ok(())
    }
}
