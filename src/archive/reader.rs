use crate::archive::format::ArchiveHeader;
use crate::archive::resource::{Resource, ResourceId, Span};
use crate::error::{PackError, Result};
use crate::markup::{self, IngestOptions};
use crate::metadata::MetadataNode;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Name of the mandatory offset field of each resource entry
pub const OFFSET_KEY: &str = "Offset";

/// Name of the mandatory size field of each resource entry
pub const SIZE_KEY: &str = "Size";

/// Normalize path to forward slashes (cross-platform compatibility)
fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// An open resource pack
///
/// Owns the file handle, the metadata tree and the flat resource index.
/// Every read goes through the single shared file cursor, so all operations
/// that touch the file take `&mut self`.
pub struct Archive {
    // Field order is drop order: resource buffers are freed before the tree.
    pub(crate) resources: Vec<Resource>,
    pub(crate) by_name: HashMap<String, ResourceId>,
    pub(crate) file: File,
    pub(crate) data_region_offset: u64,
    path: PathBuf,
    header: ArchiveHeader,
    total_size: u64,
    tree: MetadataNode,
}

impl Archive {
    /// Open and index a resource pack
    ///
    /// Fails on a bad header, malformed metadata, or any entry whose bounds
    /// exceed the pack. Entries missing `Offset` or `Size` are logged and
    /// kept as unusable. Nothing is left open on failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading resource pack `{}`", path.display());

        let mut file = File::open(path)?;
        let total_size = file.metadata()?.len();

        let header = ArchiveHeader::read_from(&mut file)?;
        let data_region_offset = header.data_region_offset();
        if data_region_offset > total_size {
            return Err(PackError::InvalidFormat(format!(
                "metadata size {} exceeds pack size {}",
                header.metadata_size, total_size
            )));
        }

        let options = IngestOptions::for_source(path.display().to_string());
        let tree = markup::ingest_with(&mut file, u64::from(header.metadata_size), &options)?;
        let resources = build_index(&tree, total_size)?;

        let mut by_name = HashMap::with_capacity(resources.len());
        for (index, resource) in resources.iter().enumerate() {
            let Some(name) = &resource.name else { continue };
            if by_name.contains_key(name) {
                tracing::warn!("Duplicate resource `{}` (#{}), first entry wins", name, index);
                continue;
            }
            by_name.insert(name.clone(), ResourceId(index));
        }

        tracing::info!("Loaded `{}` resource entries", resources.len());

        Ok(Self {
            resources,
            by_name,
            file,
            data_region_offset,
            path: path.to_path_buf(),
            header,
            total_size,
            tree,
        })
    }

    /// Close the pack
    ///
    /// Sweeps, then frees every buffer regardless of reference counts.
    /// Outstanding references are reported, not treated as errors.
    pub fn close(mut self) {
        self.sweep();

        let outstanding = self.outstanding_references();
        if outstanding > 0 {
            tracing::warn!(
                "`{}` resources still referenced in closed resource pack `{}`",
                outstanding,
                self.path.display()
            );
        }

        for resource in &mut self.resources {
            resource.data = None;
        }
    }

    /// Resolve a resource path to its id
    pub fn lookup(&self, path: &str) -> Result<ResourceId> {
        let normalized = normalize_path(path);
        self.by_name
            .get(&normalized)
            .or_else(|| self.by_name.get(path))
            .copied()
            .ok_or_else(|| PackError::ResourceNotFound(path.to_string()))
    }

    /// Check if a resource exists in the pack
    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_ok()
    }

    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id.0)
    }

    /// Loaded bytes of a Hot resource
    pub fn data(&self, id: ResourceId) -> Option<&[u8]> {
        self.resource(id).and_then(Resource::data)
    }

    pub fn reference_count(&self, id: ResourceId) -> Option<usize> {
        self.resource(id).map(Resource::reference_count)
    }

    pub fn is_hot(&self, id: ResourceId) -> bool {
        self.resource(id).is_some_and(Resource::is_hot)
    }

    /// The metadata item describing a resource
    pub fn metadata(&self, id: ResourceId) -> Option<&MetadataNode> {
        self.body().and_then(|body| body.children.get(id.0))
    }

    /// Iterate over all index entries in pack order
    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceId(i), r))
    }

    /// Names of all named resources in pack order
    pub fn resource_names(&self) -> Vec<&str> {
        self.resources.iter().filter_map(Resource::name).collect()
    }

    pub fn entry_count(&self) -> usize {
        self.resources.len()
    }

    /// Number of resources with a nonzero reference count
    ///
    /// A resource acquired several times counts once.
    pub fn outstanding_references(&self) -> usize {
        self.resources
            .iter()
            .filter(|r| r.reference_count > 0)
            .count()
    }

    /// The ingested document node
    pub fn root(&self) -> &MetadataNode {
        &self.tree
    }

    /// The `root` element holding one item per resource
    pub fn body(&self) -> Option<&MetadataNode> {
        self.tree.body()
    }

    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn data_region_offset(&self) -> u64 {
        self.data_region_offset
    }

    pub(crate) fn entry(&self, id: ResourceId) -> Result<&Resource> {
        self.resources
            .get(id.0)
            .ok_or_else(|| PackError::ResourceNotFound(id.to_string()))
    }

    pub(crate) fn entry_mut(&mut self, id: ResourceId) -> Result<&mut Resource> {
        self.resources
            .get_mut(id.0)
            .ok_or_else(|| PackError::ResourceNotFound(id.to_string()))
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("total_size", &self.total_size)
            .field("data_region_offset", &self.data_region_offset)
            .field("entries", &self.resources.len())
            .finish()
    }
}

/// Build the resource index from the `root` element's items
///
/// Bounds are checked against the whole pack size, not the data region:
/// `offset < total` and `offset + size < total`. A violation rejects the
/// whole pack.
fn build_index(tree: &MetadataNode, total_size: u64) -> Result<Vec<Resource>> {
    let body = tree
        .body()
        .ok_or_else(|| PackError::InvalidFormat("pack metadata has no <root> element".to_string()))?;

    let mut resources = Vec::new();
    resources
        .try_reserve_exact(body.children.len())
        .map_err(|e| PackError::oom("resource index", e))?;

    for (index, node) in body.children.iter().enumerate() {
        let name = node.name.clone();

        let offset = match node.get_integer(&[OFFSET_KEY]) {
            Ok(offset) => offset,
            Err(e) => {
                tracing::warn!("Resource #{} appears to be missing an offset entry: {}", index, e);
                resources.push(Resource::new(name, None));
                continue;
            }
        };

        let out_of_bounds = |size: i64| PackError::OutOfBounds {
            index,
            offset,
            size,
            total: total_size,
        };

        let offset_u = u64::try_from(offset).map_err(|_| out_of_bounds(0))?;
        if offset_u >= total_size {
            tracing::error!(
                "Resource #{} appears to be beyond resource pack bounds (`{} >= {}`)",
                index,
                offset,
                total_size
            );
            return Err(out_of_bounds(0));
        }

        let size = match node.get_integer(&[SIZE_KEY]) {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!("Resource #{} appears to be missing a size entry: {}", index, e);
                resources.push(Resource::new(name, None));
                continue;
            }
        };

        let end = u64::try_from(size)
            .ok()
            .and_then(|size_u| offset_u.checked_add(size_u));
        match end {
            Some(end) if end < total_size => {}
            _ => {
                tracing::error!(
                    "Resource #{} appears to be beyond resource pack bounds (`{} + {} >= {}`)",
                    index,
                    offset,
                    size,
                    total_size
                );
                return Err(out_of_bounds(size));
            }
        }

        resources.push(Resource::new(
            name,
            Some(Span {
                offset: offset_u,
                size: size as u64,
            }),
        ));
    }

    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::ingest_str;

    #[test]
    fn test_index_skips_incomplete_entries() {
        let tree = ingest_str(
            r#"<root>
                <item name="ok"><item name="Offset" type="Integer">0</item><item name="Size" type="Integer">4</item></item>
                <item name="no-size"><item name="Offset" type="Integer">1</item></item>
                <item name="no-offset"><item name="Size" type="Integer">1</item></item>
                <item name="bad-type"><item name="Offset" type="String">0</item><item name="Size" type="Integer">1</item></item>
            </root>"#,
        )
        .unwrap();

        let index = build_index(&tree, 100).unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(index[0].span(), Some(Span { offset: 0, size: 4 }));
        assert!(!index[1].is_usable());
        assert!(!index[2].is_usable());
        assert!(!index[3].is_usable());
    }

    #[test]
    fn test_index_bounds() {
        let entry = |offset: i64, size: i64| {
            format!(
                r#"<root><item name="x"><item name="Offset" type="Integer">{}</item><item name="Size" type="Integer">{}</item></item></root>"#,
                offset, size
            )
        };

        assert!(build_index(&ingest_str(&entry(0, 9)).unwrap(), 10).is_ok());
        assert!(build_index(&ingest_str(&entry(0, 10)).unwrap(), 10).is_err());
        assert!(build_index(&ingest_str(&entry(10, 0)).unwrap(), 10).is_err());
        assert!(build_index(&ingest_str(&entry(-1, 1)).unwrap(), 10).is_err());
        assert!(build_index(&ingest_str(&entry(1, -1)).unwrap(), 10).is_err());
        assert!(build_index(&ingest_str(&entry(1, i64::MAX)).unwrap(), 10).is_err());
    }

    #[test]
    fn test_index_requires_root() {
        let err = build_index(&MetadataNode::new(), 10).unwrap_err();
        assert!(matches!(err, PackError::InvalidFormat(_)));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("textures\\grass.png"), "textures/grass.png");
    }
}
