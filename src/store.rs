//! Pooled backing storage for tag trees.
//!
//! All tag data lives in growable per-type pools. Everything that refers to
//! stored data does so by integer index, so pool growth never invalidates a
//! handle.

use crate::error::NbtError;
use crate::tag::{
    ByteArray, CompoundRef, IntArray, ListRef, LongArray, NamedDataTag, StringRef, Tag,
    TagPayload,
};

/// Stable handle to a named tag in [`DataStore::named_tags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamedTagIndex(pub usize);

/// One growable buffer per element type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pools {
    bytes: Vec<i8>,
    shorts: Vec<i16>,
    ints: Vec<i32>,
    longs: Vec<i64>,
    floats: Vec<f32>,
    doubles: Vec<f64>,
    chars: Vec<u8>,
    byte_arrays: Vec<ByteArray>,
    int_arrays: Vec<IntArray>,
    long_arrays: Vec<LongArray>,
    strings: Vec<StringRef>,
    lists: Vec<ListRef>,
    compounds: Vec<CompoundRef>,
}

impl Pools {
    pub fn pool<T: Pooled>(&self) -> &Vec<T> {
        T::pool(self)
    }

    pub fn pool_mut<T: Pooled>(&mut self) -> &mut Vec<T> {
        T::pool_mut(self)
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.shorts.clear();
        self.ints.clear();
        self.longs.clear();
        self.floats.clear();
        self.doubles.clear();
        self.chars.clear();
        self.byte_arrays.clear();
        self.int_arrays.clear();
        self.long_arrays.clear();
        self.strings.clear();
        self.lists.clear();
        self.compounds.clear();
    }
}

/// An element type with its own pool.
pub trait Pooled: Copy + Sized {
    fn pool(pools: &Pools) -> &Vec<Self>;
    fn pool_mut(pools: &mut Pools) -> &mut Vec<Self>;
}

/// A pooled type that is also the payload of a tag kind.
pub trait TagValue: Pooled {
    const TAG: Tag;

    fn into_payload(self) -> TagPayload;
    fn from_payload(payload: &TagPayload) -> Option<Self>;
}

macro_rules! pooled {
    ($ty:ty, $field:ident, $tag:ident) => {
        pooled!($ty, $field);

        impl TagValue for $ty {
            const TAG: Tag = Tag::$tag;

            fn into_payload(self) -> TagPayload {
                TagPayload::$tag(self)
            }

            fn from_payload(payload: &TagPayload) -> Option<Self> {
                match payload {
                    TagPayload::$tag(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
    ($ty:ty, $field:ident) => {
        impl Pooled for $ty {
            fn pool(pools: &Pools) -> &Vec<Self> {
                &pools.$field
            }

            fn pool_mut(pools: &mut Pools) -> &mut Vec<Self> {
                &mut pools.$field
            }
        }
    };
}

pooled!(i8, bytes, Byte);
pooled!(i16, shorts, Short);
pooled!(i32, ints, Int);
pooled!(i64, longs, Long);
pooled!(f32, floats, Float);
pooled!(f64, doubles, Double);
pooled!(u8, chars);
pooled!(ByteArray, byte_arrays, ByteArray);
pooled!(IntArray, int_arrays, IntArray);
pooled!(LongArray, long_arrays, LongArray);
pooled!(StringRef, strings, String);
pooled!(ListRef, lists, List);
pooled!(CompoundRef, compounds, Compound);

/// Owns every pool, the flat named-tag table and the member sets of every
/// compound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataStore {
    pools: Pools,
    /// One ordered member set per compound instance.
    pub(crate) compound_storage: Vec<Vec<NamedTagIndex>>,
    pub(crate) named_tags: Vec<NamedDataTag>,
}

impl DataStore {
    /// Appends a named tag with an empty payload and returns its handle.
    pub fn add_named_data_tag(&mut self, tag: Tag, name: &str) -> NamedTagIndex {
        self.named_tags.push(NamedDataTag::new(name, tag));
        NamedTagIndex(self.named_tags.len() - 1)
    }

    /// Allocates an empty member set for a new compound.
    pub fn add_compound_storage(&mut self) -> CompoundRef {
        self.compound_storage.push(Vec::new());
        CompoundRef {
            storage_index: self.compound_storage.len() - 1,
        }
    }

    pub fn pool<T: Pooled>(&self) -> &Vec<T> {
        self.pools.pool()
    }

    pub fn pool_mut<T: Pooled>(&mut self) -> &mut Vec<T> {
        self.pools.pool_mut()
    }

    /// Returns `count` pool elements starting at `pool_index`.
    pub fn pool_slice<T: Pooled>(&self, pool_index: usize, count: i32) -> Result<&[T], NbtError> {
        if count == 0 {
            return Ok(&[]);
        }
        let count = usize::try_from(count)
            .map_err(|_| NbtError::structure(format!("negative element count {count}")))?;
        pool_index
            .checked_add(count)
            .and_then(|end| self.pool::<T>().get(pool_index..end))
            .ok_or_else(|| {
                NbtError::structure(format!(
                    "pool range {pool_index}+{count} out of bounds ({} elements)",
                    self.pool::<T>().len()
                ))
            })
    }

    pub fn named_tag(&self, index: NamedTagIndex) -> Option<&NamedDataTag> {
        self.named_tags.get(index.0)
    }

    pub fn named_tags(&self) -> &[NamedDataTag] {
        &self.named_tags
    }

    /// Member handles of a compound, in insertion order.
    pub fn members(&self, compound: CompoundRef) -> &[NamedTagIndex] {
        self.compound_storage
            .get(compound.storage_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The raw bytes stored at `string`.
    pub fn string_bytes(&self, string: StringRef) -> Result<&[u8], NbtError> {
        self.pool_slice::<u8>(string.pool_index, i32::from(string.length))
    }

    /// The string stored at `string`, validated as UTF-8.
    pub fn string(&self, string: StringRef) -> Result<&str, NbtError> {
        std::str::from_utf8(self.string_bytes(string)?)
            .map_err(|e| NbtError::parse(format!("invalid UTF-8 string: {e}")))
    }

    /// Empties every pool and table. All previously issued indices become invalid.
    pub fn clear(&mut self) {
        self.compound_storage.clear();
        self.named_tags.clear();
        self.pools.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.named_tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_survive_growth() {
        let mut store = DataStore::default();
        let first = store.add_named_data_tag(Tag::Int, "first");
        for i in 0..1000 {
            store.add_named_data_tag(Tag::Byte, &format!("t{i}"));
        }
        assert_eq!(first, NamedTagIndex(0));
        assert_eq!(store.named_tag(first).map(NamedDataTag::name), Some("first"));
        assert_eq!(store.named_tags().len(), 1001);
    }

    #[test]
    fn pools_are_separate_per_type() {
        let mut store = DataStore::default();
        store.pool_mut::<i8>().push(1);
        store.pool_mut::<u8>().extend_from_slice(b"ab");
        store.pool_mut::<i32>().push(7);
        assert_eq!(store.pool::<i8>(), &vec![1]);
        assert_eq!(store.pool::<u8>(), &b"ab".to_vec());
        assert_eq!(store.pool::<i32>(), &vec![7]);
        assert!(store.pool::<i64>().is_empty());
    }

    #[test]
    fn pool_slice_bounds() {
        let mut store = DataStore::default();
        store.pool_mut::<i64>().extend_from_slice(&[1, 2, 3]);
        assert_eq!(store.pool_slice::<i64>(1, 2).unwrap(), &[2, 3]);
        assert!(store.pool_slice::<i64>(usize::MAX, 0).unwrap().is_empty());
        assert!(store.pool_slice::<i64>(2, 2).is_err());
        assert!(store.pool_slice::<i64>(0, -1).is_err());
    }

    #[test]
    fn payload_conversions() {
        assert_eq!(5i32.into_payload(), TagPayload::Int(5));
        assert_eq!(i32::from_payload(&TagPayload::Int(5)), Some(5));
        assert_eq!(i32::from_payload(&TagPayload::Long(5)), None);
        assert_eq!(<ListRef as TagValue>::TAG, Tag::List);
    }

    #[test]
    fn clear_empties_everything() {
        let mut store = DataStore::default();
        let compound = store.add_compound_storage();
        let idx = store.add_named_data_tag(Tag::Byte, "b");
        store.compound_storage[compound.storage_index].push(idx);
        store.pool_mut::<f64>().push(1.0);
        store.clear();
        assert!(store.is_empty());
        assert!(store.pool::<f64>().is_empty());
        assert!(store.members(compound).is_empty());
    }
}
