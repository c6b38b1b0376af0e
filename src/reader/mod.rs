//! Read-side API: imports binary or text input and navigates the resulting
//! tree with a container-stack cursor.
//!
//! After a successful import the cursor sits inside the root compound.
//! Opening a named container requires a matching member of the open
//! compound; inside a list, tags are read positionally with an empty name.
//!
//! # Example
//!
//! ```
//! use nbtr::Reader;
//!
//! let mut reader = Reader::new();
//! reader.import_string("{pos:[1,2,3],name:\"spawn\"}")?;
//! assert_eq!(reader.read_string("name")?, "spawn");
//!
//! reader.open_list("pos")?;
//! let mut coords = Vec::new();
//! for _ in 0..reader.list_size()? {
//!     coords.push(reader.read_int("")?);
//! }
//! reader.close_list()?;
//! assert_eq!(coords, [1, 2, 3]);
//! # Ok::<(), nbtr::NbtError>(())
//! ```

pub(crate) mod decode;
pub mod stream;
pub(crate) mod text;

use std::path::{Path, PathBuf};

use crate::builder::{Builder, ContainerInfo, ContainerKind, Origin};
use crate::config::Limits;
use crate::error::NbtError;
use crate::store::{DataStore, NamedTagIndex, TagValue};
use crate::tag::{
    ByteArray, CompoundRef, IntArray, LongArray, NamedDataTag, StringRef, Tag, TagPayload,
};

use self::stream::MemoryStream;

/// Imports a tag tree and reads it back by name and position.
#[derive(Debug, Default)]
pub struct Reader {
    builder: Builder,
    file_path: Option<PathBuf>,
    /// Set by `open_compound("")` at the root; the root stays the cursor.
    in_virtual_root: bool,
}

impl Reader {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader whose imports enforce `limits`.
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            builder: Builder::with_limits(limits),
            ..Self::default()
        }
    }

    /// The limits imports enforce.
    pub fn limits(&self) -> Limits {
        self.builder.limits()
    }

    /// Path of the last successfully imported file.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// The imported tree.
    pub fn store(&self) -> &DataStore {
        self.builder.store()
    }

    /// Name of the imported root compound.
    pub fn root_name(&self) -> Option<&str> {
        self.builder.root().map(NamedDataTag::name)
    }

    // -- Import --

    /// Imports a file, trying the binary format first and falling back to text.
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<(), NbtError> {
        let path = path.as_ref();
        let data = self.read_file(path)?;
        self.import_bytes(&data)?;
        self.set_file_path(path);
        Ok(())
    }

    /// Imports a binary file.
    pub fn import_binfile(&mut self, path: impl AsRef<Path>) -> Result<(), NbtError> {
        let path = path.as_ref();
        let data = self.read_file(path)?;
        self.import_bin(&data)?;
        self.set_file_path(path);
        Ok(())
    }

    /// Imports a UTF-8 text file.
    pub fn import_textfile(&mut self, path: impl AsRef<Path>) -> Result<(), NbtError> {
        let path = path.as_ref();
        let data = self.read_file(path)?;
        let text = std::str::from_utf8(&data)
            .map_err(|e| NbtError::parse(format!("text input is not UTF-8: {e}")))?;
        self.import_string(text)?;
        self.set_file_path(path);
        Ok(())
    }

    /// Imports a binary tree from memory.
    pub fn import_bin(&mut self, data: &[u8]) -> Result<(), NbtError> {
        self.limits().check_input_len(data.len())?;
        self.reset();
        let mut stream = MemoryStream::new(data);
        let result = decode::parse_bin_stream(&mut stream, &mut self.builder);
        self.finish_import(result, "binary", data.len())
    }

    /// Imports a text tree from memory.
    pub fn import_string(&mut self, text: &str) -> Result<(), NbtError> {
        self.limits().check_input_len(text.len())?;
        self.reset();
        let result = text::parse_text_stream(text, &mut self.builder);
        self.finish_import(result, "text", text.len())
    }

    /// Imports from memory, detecting the format: binary first, then text.
    pub fn import_bytes(&mut self, data: &[u8]) -> Result<(), NbtError> {
        let bin_err = match self.import_bin(data) {
            Ok(()) => return Ok(()),
            Err(e @ NbtError::InputTooLarge { .. }) => return Err(e),
            Err(e) => e,
        };
        let Ok(text) = std::str::from_utf8(data) else {
            return Err(bin_err);
        };
        match self.import_string(text) {
            Ok(()) => Ok(()),
            // Report the error for whichever format the input resembles.
            Err(text_err) if looks_like_text(text) => Err(text_err),
            Err(_) => Err(bin_err),
        }
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, NbtError> {
        let len = std::fs::metadata(path)?.len();
        self.limits()
            .check_input_len(usize::try_from(len).unwrap_or(usize::MAX))?;
        Ok(std::fs::read(path)?)
    }

    pub(crate) fn set_file_path(&mut self, path: &Path) {
        self.file_path = Some(path.to_path_buf());
    }

    fn reset(&mut self) {
        self.builder.clear();
        self.file_path = None;
        self.in_virtual_root = false;
    }

    fn finish_import(
        &mut self,
        result: Result<(), NbtError>,
        format: &str,
        len: usize,
    ) -> Result<(), NbtError> {
        match result {
            Ok(()) => {
                tracing::debug!(
                    format,
                    bytes = len,
                    tags = self.store().named_tags().len(),
                    "imported tag tree"
                );
                Ok(())
            }
            Err(e) => {
                self.reset();
                tracing::debug!(format, error = %e, "import failed");
                Err(e)
            }
        }
    }

    // -- Navigation --

    /// Enters the named compound member, or the next compound element of
    /// the open list when `name` is empty.
    pub fn open_compound(&mut self, name: &str) -> Result<(), NbtError> {
        self.open_container(name, Tag::Compound)
            .inspect_err(|e| tracing::warn!(tag_name = name, error = %e, "open_compound failed"))
    }

    /// Closes the innermost compound. Closing the root is an error unless
    /// it was entered with `open_compound("")`.
    pub fn close_compound(&mut self) -> Result<(), NbtError> {
        let top = self.top()?;
        if !matches!(top.kind, ContainerKind::Compound(_)) {
            return Err(NbtError::structure("close_compound called while a list is open"));
        }
        if self.builder.containers.len() > 1 {
            self.builder.containers.pop();
            Ok(())
        } else if self.in_virtual_root {
            self.in_virtual_root = false;
            Ok(())
        } else {
            Err(NbtError::structure("the root compound cannot be closed"))
        }
    }

    /// Enters the named list member, or the next list element of the open
    /// list when `name` is empty.
    pub fn open_list(&mut self, name: &str) -> Result<(), NbtError> {
        self.open_container(name, Tag::List)
            .inspect_err(|e| tracing::warn!(tag_name = name, error = %e, "open_list failed"))
    }

    /// Leaves the innermost list.
    pub fn close_list(&mut self) -> Result<(), NbtError> {
        match self.top()?.kind {
            ContainerKind::List(_) => {
                self.builder.containers.pop();
                Ok(())
            }
            ContainerKind::Compound(_) => {
                Err(NbtError::structure("close_list called while a compound is open"))
            }
        }
    }

    /// Element count of the open list.
    pub fn list_size(&self) -> Result<i32, NbtError> {
        match self.top()?.kind {
            ContainerKind::List(list) => Ok(list.count),
            ContainerKind::Compound(_) => {
                Err(NbtError::structure("list_size called while a compound is open"))
            }
        }
    }

    /// Element count of the open list, or member count of the open compound.
    pub fn count(&self) -> Result<i32, NbtError> {
        Ok(self.top()?.count(self.store()))
    }

    /// Member names of the open compound; empty when a list is open.
    pub fn names(&self) -> CompoundView<'_> {
        let members = match self.builder.containers.last() {
            Some(ContainerInfo {
                kind: ContainerKind::Compound(compound),
                ..
            }) => self.store().members(*compound),
            _ => &[],
        };
        CompoundView {
            store: self.store(),
            members,
        }
    }

    /// Reads a value of any [`ReadTag`] type.
    pub fn read<T: ReadTag>(&mut self, name: &str) -> Result<T, NbtError> {
        T::read(self, name)
    }

    /// Like [`read`](Self::read), but `None` on any failure and without side effects.
    pub fn maybe_read<T: ReadTag>(&mut self, name: &str) -> Option<T> {
        T::maybe_read(self, name)
    }

    // -- Typed reads --

    /// Reads a Byte member of the open compound, or the next element of the
    /// open list when `name` is empty.
    pub fn read_byte(&mut self, name: &str) -> Result<i8, NbtError> {
        self.read_value(name)
    }

    /// Reads a Short.
    pub fn read_short(&mut self, name: &str) -> Result<i16, NbtError> {
        self.read_value(name)
    }

    /// Reads an Int.
    pub fn read_int(&mut self, name: &str) -> Result<i32, NbtError> {
        self.read_value(name)
    }

    /// Reads a Long.
    pub fn read_long(&mut self, name: &str) -> Result<i64, NbtError> {
        self.read_value(name)
    }

    /// Reads a Float.
    pub fn read_float(&mut self, name: &str) -> Result<f32, NbtError> {
        self.read_value(name)
    }

    /// Reads a Double.
    pub fn read_double(&mut self, name: &str) -> Result<f64, NbtError> {
        self.read_value(name)
    }

    /// Reads a ByteArray into a new vector.
    pub fn read_byte_array(&mut self, name: &str) -> Result<Vec<i8>, NbtError> {
        let array: ByteArray = self.read_value(name)?;
        Ok(self.store().pool_slice::<i8>(array.pool_index, array.count)?.to_vec())
    }

    /// Reads an IntArray into a new vector.
    pub fn read_int_array(&mut self, name: &str) -> Result<Vec<i32>, NbtError> {
        let array: IntArray = self.read_value(name)?;
        Ok(self.store().pool_slice::<i32>(array.pool_index, array.count)?.to_vec())
    }

    /// Reads a LongArray into a new vector.
    pub fn read_long_array(&mut self, name: &str) -> Result<Vec<i64>, NbtError> {
        let array: LongArray = self.read_value(name)?;
        Ok(self.store().pool_slice::<i64>(array.pool_index, array.count)?.to_vec())
    }

    /// Reads a String. Fails with a parse error if its bytes are not UTF-8.
    pub fn read_string(&mut self, name: &str) -> Result<String, NbtError> {
        let string: StringRef = self.read_value(name)?;
        Ok(self.store().string(string)?.to_owned())
    }

    /// Reads a String's raw bytes without UTF-8 validation.
    pub fn read_string_bytes(&mut self, name: &str) -> Result<Vec<u8>, NbtError> {
        let string: StringRef = self.read_value(name)?;
        Ok(self.store().string_bytes(string)?.to_vec())
    }

    /// Reads a Byte, or `None` if it is absent or has another type.
    pub fn maybe_read_byte(&mut self, name: &str) -> Option<i8> {
        self.maybe_read_value(name)
    }

    /// Optional [`read_short`](Self::read_short).
    pub fn maybe_read_short(&mut self, name: &str) -> Option<i16> {
        self.maybe_read_value(name)
    }

    /// Optional [`read_int`](Self::read_int).
    pub fn maybe_read_int(&mut self, name: &str) -> Option<i32> {
        self.maybe_read_value(name)
    }

    /// Optional [`read_long`](Self::read_long).
    pub fn maybe_read_long(&mut self, name: &str) -> Option<i64> {
        self.maybe_read_value(name)
    }

    /// Optional [`read_float`](Self::read_float).
    pub fn maybe_read_float(&mut self, name: &str) -> Option<f32> {
        self.maybe_read_value(name)
    }

    /// Optional [`read_double`](Self::read_double).
    pub fn maybe_read_double(&mut self, name: &str) -> Option<f64> {
        self.maybe_read_value(name)
    }

    /// Optional [`read_byte_array`](Self::read_byte_array).
    pub fn maybe_read_byte_array(&mut self, name: &str) -> Option<Vec<i8>> {
        let array: ByteArray = self.maybe_read_value(name)?;
        self.store()
            .pool_slice::<i8>(array.pool_index, array.count)
            .ok()
            .map(<[i8]>::to_vec)
    }

    /// Optional [`read_int_array`](Self::read_int_array).
    pub fn maybe_read_int_array(&mut self, name: &str) -> Option<Vec<i32>> {
        let array: IntArray = self.maybe_read_value(name)?;
        self.store()
            .pool_slice::<i32>(array.pool_index, array.count)
            .ok()
            .map(<[i32]>::to_vec)
    }

    /// Optional [`read_long_array`](Self::read_long_array).
    pub fn maybe_read_long_array(&mut self, name: &str) -> Option<Vec<i64>> {
        let array: LongArray = self.maybe_read_value(name)?;
        self.store()
            .pool_slice::<i64>(array.pool_index, array.count)
            .ok()
            .map(<[i64]>::to_vec)
    }

    /// Optional [`read_string`](Self::read_string). `None` also when the bytes are not UTF-8.
    pub fn maybe_read_string(&mut self, name: &str) -> Option<String> {
        let string: StringRef = self.maybe_read_value(name)?;
        self.store().string(string).ok().map(str::to_owned)
    }

    /// Optional [`read_string_bytes`](Self::read_string_bytes).
    pub fn maybe_read_string_bytes(&mut self, name: &str) -> Option<Vec<u8>> {
        let string: StringRef = self.maybe_read_value(name)?;
        self.store().string_bytes(string).ok().map(<[u8]>::to_vec)
    }

    // -- Cursor internals --

    fn top(&self) -> Result<&ContainerInfo, NbtError> {
        self.builder
            .containers
            .last()
            .ok_or_else(|| NbtError::structure("no tag tree has been imported"))
    }

    /// Validates `name` against the open container and, inside a list,
    /// advances the element cursor.
    fn handle_nesting(&mut self, name: &str, tag: Tag) -> Result<(), NbtError> {
        let depth = self.builder.containers.len();
        let in_virtual_root = self.in_virtual_root;
        let Some(container) = self.builder.containers.last_mut() else {
            return Err(NbtError::structure("no tag tree has been imported"));
        };
        match container.kind {
            ContainerKind::List(list) => {
                if !name.is_empty() {
                    return Err(NbtError::structure(format!(
                        "tag {name:?} requested inside a list; list elements are unnamed"
                    )));
                }
                if list.count != 0 && list.element_type != tag {
                    return Err(NbtError::TypeMismatch {
                        expected: tag,
                        found: list.element_type,
                    });
                }
                if container.current_index >= list.count {
                    return Err(NbtError::ListOverread { count: list.count });
                }
                container.current_index += 1;
                Ok(())
            }
            ContainerKind::Compound(_) => {
                let virtual_root = tag == Tag::Compound && depth == 1 && !in_virtual_root;
                if name.is_empty() && !virtual_root {
                    return Err(NbtError::structure(
                        "unnamed tag requested inside a compound",
                    ));
                }
                Ok(())
            }
        }
    }

    fn open_container(&mut self, name: &str, tag: Tag) -> Result<(), NbtError> {
        self.handle_nesting(name, tag)?;
        let container = *self.top()?;
        let opened = match container.kind {
            ContainerKind::List(list) => {
                let index = self.element_index(list.pool_index, container.current_index)?;
                let kind = match tag {
                    Tag::List => self.store().pool().get(index).copied().map(ContainerKind::List),
                    _ => self
                        .store()
                        .pool()
                        .get(index)
                        .copied()
                        .map(ContainerKind::Compound),
                };
                let kind = kind.ok_or_else(|| NbtError::structure("list element out of bounds"))?;
                ContainerInfo::new(kind, Origin::Anonymous)
            }
            ContainerKind::Compound(compound) => {
                if name.is_empty() {
                    self.in_virtual_root = true;
                    return Ok(());
                }
                let index = self.find_member(compound, name, tag)?;
                let kind = match self.store().named_tags[index.0].data_tag.payload {
                    TagPayload::List(list) => ContainerKind::List(list),
                    TagPayload::Compound(compound) => ContainerKind::Compound(compound),
                    _ => return Err(NbtError::structure("container tag without container payload")),
                };
                ContainerInfo::new(kind, Origin::Named(index))
            }
        };
        self.builder.containers.push(opened);
        Ok(())
    }

    fn read_value<T: TagValue>(&mut self, name: &str) -> Result<T, NbtError> {
        self.handle_nesting(name, T::TAG)
            .and_then(|()| self.lookup(name))
            .inspect_err(|e| tracing::warn!(tag_name = name, tag = %T::TAG, error = %e, "tag read failed"))
    }

    /// Like [`read_value`](Self::read_value), but a missing or mistyped
    /// compound member leaves no trace.
    fn maybe_read_value<T: TagValue>(&mut self, name: &str) -> Option<T> {
        if let ContainerKind::Compound(compound) = self.top().ok()?.kind {
            self.find_member(compound, name, T::TAG).ok()?;
        }
        self.handle_nesting(name, T::TAG).ok()?;
        self.lookup(name).ok()
    }

    /// Fetches the value the cursor refers to: the current list element or
    /// the named compound member.
    fn lookup<T: TagValue>(&self, name: &str) -> Result<T, NbtError> {
        let container = self.top()?;
        match container.kind {
            ContainerKind::List(list) => {
                let index = self.element_index(list.pool_index, container.current_index)?;
                self.store()
                    .pool::<T>()
                    .get(index)
                    .copied()
                    .ok_or_else(|| NbtError::structure("list element out of bounds"))
            }
            ContainerKind::Compound(compound) => {
                let index = self.find_member(compound, name, T::TAG)?;
                let tag = &self.store().named_tags[index.0];
                T::from_payload(&tag.data_tag.payload).ok_or(NbtError::TypeMismatch {
                    expected: T::TAG,
                    found: tag.tag(),
                })
            }
        }
    }

    /// Pool position of the element most recently passed by the list cursor.
    fn element_index(&self, pool_index: usize, current_index: i32) -> Result<usize, NbtError> {
        usize::try_from(current_index - 1)
            .ok()
            .and_then(|offset| pool_index.checked_add(offset))
            .ok_or_else(|| NbtError::structure("list cursor before the first element"))
    }

    /// Finds the first member named `name` with kind `tag`.
    fn find_member(
        &self,
        compound: CompoundRef,
        name: &str,
        tag: Tag,
    ) -> Result<NamedTagIndex, NbtError> {
        let store = self.store();
        let mut found = None;
        for &index in store.members(compound) {
            let Some(member) = store.named_tag(index) else {
                continue;
            };
            if member.name() != name {
                continue;
            }
            if member.tag() == tag {
                return Ok(index);
            }
            found.get_or_insert(member.tag());
        }
        Err(match found {
            Some(found) => NbtError::TypeMismatch {
                expected: tag,
                found,
            },
            None => NbtError::NotFound {
                name: name.to_owned(),
                tag,
            },
        })
    }
}

fn looks_like_text(text: &str) -> bool {
    matches!(
        text.trim_start().as_bytes().first(),
        Some(b'{' | b'"' | b'\'')
    )
}

/// A borrowed view of the member names of one compound.
#[derive(Debug, Clone, Copy)]
pub struct CompoundView<'a> {
    store: &'a DataStore,
    members: &'a [NamedTagIndex],
}

impl<'a> CompoundView<'a> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member names in insertion order.
    pub fn iter(&self) -> Names<'a> {
        Names {
            store: self.store,
            members: self.members.iter(),
        }
    }
}

impl<'a> IntoIterator for CompoundView<'a> {
    type Item = &'a str;
    type IntoIter = Names<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the names in a [`CompoundView`].
#[derive(Debug, Clone)]
pub struct Names<'a> {
    store: &'a DataStore,
    members: std::slice::Iter<'a, NamedTagIndex>,
}

impl<'a> Iterator for Names<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let store = self.store;
        self.members
            .by_ref()
            .find_map(|index| store.named_tag(*index))
            .map(NamedDataTag::name)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.members.len()))
    }
}

/// Types that can be read with [`Reader::read`] and [`Reader::maybe_read`].
pub trait ReadTag: Sized {
    fn read(reader: &mut Reader, name: &str) -> Result<Self, NbtError>;
    fn maybe_read(reader: &mut Reader, name: &str) -> Option<Self>;
}

macro_rules! read_tag {
    ($($ty:ty => $read:ident, $maybe:ident;)*) => {$(
        impl ReadTag for $ty {
            fn read(reader: &mut Reader, name: &str) -> Result<Self, NbtError> {
                reader.$read(name)
            }

            fn maybe_read(reader: &mut Reader, name: &str) -> Option<Self> {
                reader.$maybe(name)
            }
        }
    )*};
}

read_tag! {
    i8 => read_byte, maybe_read_byte;
    i16 => read_short, maybe_read_short;
    i32 => read_int, maybe_read_int;
    i64 => read_long, maybe_read_long;
    f32 => read_float, maybe_read_float;
    f64 => read_double, maybe_read_double;
    Vec<i8> => read_byte_array, maybe_read_byte_array;
    Vec<i32> => read_int_array, maybe_read_int_array;
    Vec<i64> => read_long_array, maybe_read_long_array;
    String => read_string, maybe_read_string;
}
