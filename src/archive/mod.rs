mod format;
mod lifecycle;
mod reader;
mod resource;
mod stream;
mod writer;

pub use format::{ArchiveHeader, HEADER_SIZE, PACK_MAGIC};
pub use reader::{Archive, OFFSET_KEY, SIZE_KEY};
pub use resource::{Resource, ResourceId, Span};
pub use stream::ResourceStream;
pub use writer::ArchiveWriter;
