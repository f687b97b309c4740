//! The pack markup: a two-element grammar describing metadata trees
//!
//! ```text
//! <root>
//!     <item name="a.raw">
//!         <item name="Offset" type="Integer">0</item>
//!         <item name="Size" type="Integer">4</item>
//!     </item>
//! </root>
//! ```
//!
//! `root` is the single container and carries no attributes. `item` carries
//! an optional `name` and a `type` (`None`, `String`, `Integer` or `Float`);
//! its trimmed inline text becomes the typed value. Items nest freely.

mod ingest;
mod serialize;
mod tokenizer;

pub use ingest::{ingest, ingest_str, ingest_with, IngestOptions, DEFAULT_MAX_DEPTH};
pub use serialize::{dump, dump_to_vec};
pub use tokenizer::{decode_entities, Attribute, MarkupSink, Tokenizer};
