//! Write-side API: a [`Builder`] that starts with an open root and exports
//! the finished tree as binary or text.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use nbtr::{PrettyPrint, Writer};
//!
//! let mut writer = Writer::new();
//! writer.write_string("spawn", "name")?;
//! writer.begin_list("pos")?;
//! for v in [1, 2, 3] {
//!     writer.write_int(v, "")?;
//! }
//! writer.end_list()?;
//! writer.end()?;
//!
//! let mut text = String::new();
//! writer.export_string(&mut text, PrettyPrint::Disabled)?;
//! assert_eq!(text, r#"{"name":"spawn","pos":[1,2,3]}"#);
//!
//! let mut buf = BytesMut::new();
//! writer.export_bin(&mut buf)?;
//! assert_eq!(&buf[..3], &[0x0A, 0x00, 0x00]);
//! # Ok::<(), nbtr::NbtError>(())
//! ```

pub(crate) mod encode;
pub(crate) mod text;

use std::ops::{Deref, DerefMut};
use std::path::Path;

use bytes::BytesMut;

use crate::builder::{BuildState, Builder};
use crate::config::Limits;
use crate::error::NbtError;
use crate::tag::NamedDataTag;

use self::text::TextOutput;

/// Whether text output breaks lines between compound members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrettyPrint {
    #[default]
    Disabled,
    Enabled,
}

/// A builder whose root compound is opened on construction.
///
/// All builder operations are available through `Deref`. Call
/// [`Builder::end`] before exporting.
#[derive(Debug)]
pub struct Writer {
    builder: Builder,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// A writer with an anonymous root.
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// A writer whose root compound is named `name`.
    pub fn with_root_name(name: &str) -> Result<Self, NbtError> {
        Self::with_root_name_and_limits(name, Limits::default())
    }

    /// A writer with a named root that enforces `limits`.
    pub fn with_root_name_and_limits(name: &str, limits: Limits) -> Result<Self, NbtError> {
        let mut builder = Builder::with_limits(limits);
        builder.begin(name)?;
        Ok(Self { builder })
    }

    /// A writer with an anonymous root that enforces `limits`.
    pub fn with_limits(limits: Limits) -> Self {
        let mut builder = Builder::with_limits(limits);
        builder.push_root("");
        Self { builder }
    }

    /// Wraps a builder, opening an anonymous root if it has none yet.
    pub fn from_builder(mut builder: Builder) -> Self {
        if builder.state() == BuildState::NotStarted {
            builder.push_root("");
        }
        Self { builder }
    }

    /// Unwraps the underlying builder.
    pub fn into_builder(self) -> Builder {
        self.builder
    }

    /// Writes a value of any [`WriteTag`] type.
    pub fn write<T: WriteTag>(&mut self, value: T, name: &str) -> Result<(), NbtError> {
        value.write_to(&mut self.builder, name)
    }

    /// Appends the binary encoding of the finished tree to `out`.
    ///
    /// On failure `out` is left as it was.
    pub fn export_bin(&self, out: &mut BytesMut) -> Result<(), NbtError> {
        let root = self.finished_root()?;
        let start = out.len();
        encode::output_bin_tag(out, self.store(), root).inspect_err(|_| out.truncate(start))?;
        tracing::debug!(bytes = out.len() - start, "exported binary tag tree");
        Ok(())
    }

    /// Writes the binary encoding to `path`, replacing any existing file.
    pub fn export_bin_file(&self, path: impl AsRef<Path>) -> Result<(), NbtError> {
        let mut buf = BytesMut::new();
        self.export_bin(&mut buf)?;
        std::fs::write(path.as_ref(), &buf)?;
        Ok(())
    }

    /// Appends the text encoding of the finished tree to `out`.
    pub fn export_string(&self, out: &mut String, pretty: PrettyPrint) -> Result<(), NbtError> {
        let root = self.finished_root()?;
        let start = out.len();
        let result = TextOutput::new(out, self.store(), pretty).output_text_tag(root);
        if result.is_err() {
            out.truncate(start);
        }
        result?;
        tracing::debug!(bytes = out.len() - start, ?pretty, "exported text tag tree");
        Ok(())
    }

    /// Writes the text encoding to `path`, replacing any existing file.
    pub fn export_text_file(
        &self,
        path: impl AsRef<Path>,
        pretty: PrettyPrint,
    ) -> Result<(), NbtError> {
        let mut text = String::new();
        self.export_string(&mut text, pretty)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    fn finished_root(&self) -> Result<&NamedDataTag, NbtError> {
        match (self.state(), self.root()) {
            (BuildState::Finalized, Some(root)) => Ok(root),
            _ => Err(NbtError::NotFinalized),
        }
    }
}

impl From<Builder> for Writer {
    fn from(builder: Builder) -> Self {
        Self::from_builder(builder)
    }
}

impl Deref for Writer {
    type Target = Builder;

    fn deref(&self) -> &Builder {
        &self.builder
    }
}

impl DerefMut for Writer {
    fn deref_mut(&mut self) -> &mut Builder {
        &mut self.builder
    }
}

/// Types that can be written with [`Writer::write`].
pub trait WriteTag {
    fn write_to(self, builder: &mut Builder, name: &str) -> Result<(), NbtError>;
}

macro_rules! write_tag {
    ($($ty:ty => $write:ident;)*) => {$(
        impl WriteTag for $ty {
            fn write_to(self, builder: &mut Builder, name: &str) -> Result<(), NbtError> {
                builder.$write(self, name)
            }
        }
    )*};
}

write_tag! {
    i8 => write_byte;
    i16 => write_short;
    i32 => write_int;
    i64 => write_long;
    f32 => write_float;
    f64 => write_double;
    &[i8] => write_byte_array;
    &[i32] => write_int_array;
    &[i64] => write_long_array;
    &str => write_string;
}

/// Stored as a Byte, 1 or 0.
impl WriteTag for bool {
    fn write_to(self, builder: &mut Builder, name: &str) -> Result<(), NbtError> {
        builder.write_byte(i8::from(self), name)
    }
}

impl WriteTag for &String {
    fn write_to(self, builder: &mut Builder, name: &str) -> Result<(), NbtError> {
        builder.write_string(self, name)
    }
}
