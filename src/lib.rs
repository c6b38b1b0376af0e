//! nbtr — A pure-Rust NBT-style tagged tree format.
//!
//! Trees are a root compound of named tags: scalars, packed arrays, strings,
//! homogeneous lists and nested compounds. They are built by streaming write
//! calls, stored in pooled per-type buffers, and serialized as big-endian
//! binary or as SNBT-style text.
//!
//! # Architecture
//!
//! - **`tag`** — Tag kinds, payloads and aggregate descriptors
//! - **`store`** — Pooled storage addressed by integer handles
//! - **`builder`** — Streaming write API with an explicit container stack
//! - **`reader`** — Binary and text import plus a positional read cursor
//! - **`writer`** — Builder with an open root, binary and text export
//! - **`config`** — Depth and input size limits
//! - **`async_io`** — Import/export over tokio streams (feature-gated)
//!
//! # Example
//!
//! ```
//! use nbtr::{Reader, Writer};
//! use bytes::BytesMut;
//!
//! let mut writer = Writer::with_root_name("player")?;
//! writer.write_short(20, "health")?;
//! writer.begin_compound("pos")?;
//! writer.write_double(1.5, "x")?;
//! writer.end_compound()?;
//! writer.end()?;
//!
//! let mut buf = BytesMut::new();
//! writer.export_bin(&mut buf)?;
//!
//! let mut reader = Reader::new();
//! reader.import_bin(&buf)?;
//! assert_eq!(reader.root_name(), Some("player"));
//! assert_eq!(reader.read_short("health")?, 20);
//! reader.open_compound("pos")?;
//! assert_eq!(reader.read_double("x")?, 1.5);
//! reader.close_compound()?;
//! # Ok::<(), nbtr::NbtError>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod reader;
pub mod store;
pub mod tag;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_io;

pub use builder::{BuildState, Builder};
pub use config::Limits;
pub use error::NbtError;
pub use reader::{CompoundView, ReadTag, Reader};
pub use tag::Tag;
pub use writer::{PrettyPrint, WriteTag, Writer};
