//! Write-side API: streams named and positional tags into a [`DataStore`].
//!
//! The builder keeps an explicit stack of open containers. Anonymous
//! containers nested directly inside a list are staged in a temporary buffer
//! until the owning list closes, then bulk-appended to the store so their
//! pool indices are final and contiguous.

use crate::config::Limits;
use crate::error::NbtError;
use crate::store::{DataStore, NamedTagIndex, Pooled, Pools, TagValue};
use crate::tag::{
    ByteArray, CompoundRef, IntArray, ListRef, LongArray, NamedDataTag, StringRef, Tag,
    TagPayload,
};

/// Lifecycle of a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    NotStarted,
    Building,
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ContainerKind {
    List(ListRef),
    Compound(CompoundRef),
}

/// Where an open container lives: as a named member of a compound, or as a
/// positional list element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Named(NamedTagIndex),
    Anonymous,
}

/// Bookkeeping for one open container. Not serialized.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContainerInfo {
    pub(crate) kind: ContainerKind,
    pub(crate) origin: Origin,
    /// Reader: next element to read. Builder: next staged slot to finalize.
    pub(crate) current_index: i32,
    /// Index into the builder's temporary container stack.
    staging: Option<usize>,
}

impl ContainerInfo {
    pub(crate) fn new(kind: ContainerKind, origin: Origin) -> Self {
        Self {
            kind,
            origin,
            current_index: 0,
            staging: None,
        }
    }

    pub(crate) fn count(&self, store: &DataStore) -> i32 {
        match self.kind {
            ContainerKind::List(list) => list.count,
            ContainerKind::Compound(compound) => {
                i32::try_from(store.members(compound).len()).unwrap_or(i32::MAX)
            }
        }
    }
}

#[derive(Debug)]
struct TemporaryContainer {
    tag: Tag,
    data: Pools,
}

/// Where a freshly written tag landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Named(NamedTagIndex),
    Element,
}

/// Builds a tag tree by streaming write calls.
#[derive(Debug, Default)]
pub struct Builder {
    pub(crate) store: DataStore,
    pub(crate) containers: Vec<ContainerInfo>,
    temporaries: Vec<TemporaryContainer>,
    limits: Limits,
    started: bool,
}

fn violation(msg: impl Into<String>) -> NbtError {
    let msg = msg.into();
    tracing::warn!(error = %msg, "tag tree structure violation");
    NbtError::InvalidStructure(msg)
}

fn check_name(name: &str) -> Result<(), NbtError> {
    if name.len() > usize::from(u16::MAX) {
        return Err(violation(format!(
            "name of {} bytes exceeds the 65535 byte limit",
            name.len()
        )));
    }
    Ok(())
}

fn array_count(len: usize) -> Result<i32, NbtError> {
    i32::try_from(len).map_err(|_| violation(format!("array of {len} elements is too long")))
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder that enforces `limits` instead of the defaults.
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// The limits this builder enforces.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Where the builder is in its lifecycle.
    pub fn state(&self) -> BuildState {
        if !self.started {
            BuildState::NotStarted
        } else if self.containers.is_empty() {
            BuildState::Finalized
        } else {
            BuildState::Building
        }
    }

    /// Opens the root compound. The root may be anonymous.
    pub fn begin(&mut self, root_name: &str) -> Result<(), NbtError> {
        if self.started {
            return Err(violation("begin called on a builder that already has a root"));
        }
        check_name(root_name)?;
        self.push_root(root_name);
        Ok(())
    }

    pub(crate) fn push_root(&mut self, root_name: &str) {
        self.started = true;
        let index = self.store.add_named_data_tag(Tag::Compound, root_name);
        let compound = self.store.add_compound_storage();
        self.store.named_tags[index.0].data_tag.payload = TagPayload::Compound(compound);
        self.containers.push(ContainerInfo::new(
            ContainerKind::Compound(compound),
            Origin::Named(index),
        ));
    }

    /// Closes every container that is still open.
    pub fn end(&mut self) -> Result<(), NbtError> {
        while let Some(top) = self.containers.last() {
            match top.kind {
                ContainerKind::List(_) => self.end_list()?,
                ContainerKind::Compound(_) => self.end_compound()?,
            }
        }
        Ok(())
    }

    /// True once every container, root included, has been closed.
    pub fn is_end(&self) -> bool {
        self.containers.is_empty()
    }

    /// Empties the store and resets to [`BuildState::NotStarted`].
    pub fn clear(&mut self) {
        self.store.clear();
        self.containers.clear();
        self.temporaries.clear();
        self.started = false;
    }

    /// The tree built so far.
    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// The root compound tag, once [`begin`](Self::begin) has been called.
    pub fn root(&self) -> Option<&NamedDataTag> {
        self.store.named_tags.first()
    }

    /// Opens a nested compound. Members written next go into it until
    /// [`end_compound`](Self::end_compound).
    pub fn begin_compound(&mut self, name: &str) -> Result<(), NbtError> {
        let placement = self.write_tag(name, |store| store.add_compound_storage())?;
        self.push_container(placement, Tag::Compound)
    }

    /// Closes the innermost compound, which must be the open container.
    pub fn end_compound(&mut self) -> Result<(), NbtError> {
        let compound = match self.containers.last() {
            Some(ContainerInfo {
                kind: ContainerKind::Compound(compound),
                ..
            }) => *compound,
            _ => return Err(violation("end_compound called while no compound is open")),
        };
        let Some(container) = self.containers.pop() else {
            return Err(violation("end_compound called while no compound is open"));
        };
        if container.origin == Origin::Anonymous {
            self.finalize_in_parent(compound)?;
        }
        Ok(())
    }

    /// Opens a list. Its element type is fixed by the first element written.
    pub fn begin_list(&mut self, name: &str) -> Result<(), NbtError> {
        let placement = self.write_tag(name, |_| ListRef::default())?;
        self.push_container(placement, Tag::List)
    }

    /// Closes the innermost list, which must be the open container.
    pub fn end_list(&mut self) -> Result<(), NbtError> {
        let mut list = match self.containers.last() {
            Some(ContainerInfo {
                kind: ContainerKind::List(list),
                ..
            }) => *list,
            _ => return Err(violation("end_list called while no list is open")),
        };
        let Some(container) = self.containers.pop() else {
            return Err(violation("end_list called while no list is open"));
        };

        if container.staging.is_some() {
            let Some(temporary) = self.temporaries.pop() else {
                return Err(violation("staging buffer missing for list"));
            };
            list.pool_index = match temporary.tag {
                Tag::List => append(&mut self.store, temporary.data.pool::<ListRef>()),
                _ => append(&mut self.store, temporary.data.pool::<CompoundRef>()),
            };
        }

        match container.origin {
            Origin::Named(index) => {
                self.store.named_tags[index.0].data_tag.payload = TagPayload::List(list);
                Ok(())
            }
            Origin::Anonymous => self.finalize_in_parent(list),
        }
    }

    /// Writes a Byte. `name` must be empty inside a list and non-empty in a compound.
    pub fn write_byte(&mut self, value: i8, name: &str) -> Result<(), NbtError> {
        self.write_tag(name, |_| value).map(drop)
    }

    /// Writes a Short.
    pub fn write_short(&mut self, value: i16, name: &str) -> Result<(), NbtError> {
        self.write_tag(name, |_| value).map(drop)
    }

    /// Writes an Int.
    pub fn write_int(&mut self, value: i32, name: &str) -> Result<(), NbtError> {
        self.write_tag(name, |_| value).map(drop)
    }

    /// Writes a Long.
    pub fn write_long(&mut self, value: i64, name: &str) -> Result<(), NbtError> {
        self.write_tag(name, |_| value).map(drop)
    }

    /// Writes a Float.
    pub fn write_float(&mut self, value: f32, name: &str) -> Result<(), NbtError> {
        self.write_tag(name, |_| value).map(drop)
    }

    /// Writes a Double.
    pub fn write_double(&mut self, value: f64, name: &str) -> Result<(), NbtError> {
        self.write_tag(name, |_| value).map(drop)
    }

    /// Writes a ByteArray holding a copy of `values`.
    pub fn write_byte_array(&mut self, values: &[i8], name: &str) -> Result<(), NbtError> {
        let count = array_count(values.len())?;
        self.write_tag(name, |store| ByteArray {
            count,
            pool_index: append(store, values),
        })
        .map(drop)
    }

    /// Writes an IntArray holding a copy of `values`.
    pub fn write_int_array(&mut self, values: &[i32], name: &str) -> Result<(), NbtError> {
        let count = array_count(values.len())?;
        self.write_tag(name, |store| IntArray {
            count,
            pool_index: append(store, values),
        })
        .map(drop)
    }

    /// Writes a LongArray holding a copy of `values`.
    pub fn write_long_array(&mut self, values: &[i64], name: &str) -> Result<(), NbtError> {
        let count = array_count(values.len())?;
        self.write_tag(name, |store| LongArray {
            count,
            pool_index: append(store, values),
        })
        .map(drop)
    }

    /// Copies the string's bytes into the char pool. At most 65535 bytes.
    pub fn write_string(&mut self, value: &str, name: &str) -> Result<(), NbtError> {
        self.write_string_bytes(value.as_bytes(), name)
    }

    /// Writes a String tag from raw bytes, stored and exported unchanged.
    /// The bytes need not be UTF-8. At most 65535 bytes.
    pub fn write_string_bytes(&mut self, value: &[u8], name: &str) -> Result<(), NbtError> {
        let Ok(length) = u16::try_from(value.len()) else {
            return Err(violation(format!(
                "string of {} bytes exceeds the 65535 byte limit",
                value.len()
            )));
        };
        self.write_tag(name, |store| StringRef {
            length,
            pool_index: append(store, value),
        })
        .map(drop)
    }

    /// Appends one tag to the innermost open container.
    ///
    /// All validation happens before `value` runs, so a rejected write never
    /// touches the pools.
    pub(crate) fn write_tag<T: TagValue>(
        &mut self,
        name: &str,
        value: impl FnOnce(&mut DataStore) -> T,
    ) -> Result<Placement, NbtError> {
        let depth = self.containers.len();
        let Some(container) = self.containers.last_mut() else {
            return Err(violation(
                "write after finalize: attempted to write tags with no open container",
            ));
        };
        if T::TAG.is_container() && depth >= self.limits.max_depth {
            return Err(violation(format!(
                "compound and list tags may not be nested beyond a depth of {}",
                self.limits.max_depth
            )));
        }
        check_name(name)?;

        match &mut container.kind {
            ContainerKind::Compound(compound) => {
                if name.is_empty() {
                    return Err(violation("attempted to add an unnamed tag to a compound"));
                }
                let storage_index = compound.storage_index;
                if storage_index >= self.store.compound_storage.len() {
                    return Err(violation("open compound has no member storage"));
                }
                let payload = value(&mut self.store).into_payload();
                let index = self.store.add_named_data_tag(T::TAG, name);
                self.store.named_tags[index.0].data_tag.payload = payload;
                self.store.compound_storage[storage_index].push(index);
                Ok(Placement::Named(index))
            }
            ContainerKind::List(list) => {
                if !name.is_empty() {
                    return Err(violation(format!(
                        "attempted to add named tag {name:?} to a list; lists cannot contain named tags"
                    )));
                }
                if list.element_type != T::TAG && list.count != 0 {
                    return Err(violation(format!(
                        "attempted to add a {} to a list of {}; all tags in a list must share one type",
                        T::TAG,
                        list.element_type
                    )));
                }
                if list.count == i32::MAX {
                    return Err(violation("list element count overflow"));
                }

                let element = value(&mut self.store);
                if T::TAG.is_container() {
                    if list.count == 0 {
                        self.temporaries.push(TemporaryContainer {
                            tag: T::TAG,
                            data: Pools::default(),
                        });
                        container.staging = Some(self.temporaries.len() - 1);
                    }
                    let Some(slot) = container.staging else {
                        return Err(violation("list of containers has no staging buffer"));
                    };
                    self.temporaries[slot].data.pool_mut::<T>().push(element);
                } else {
                    let pool_index = self.store.pool::<T>().len();
                    self.store.pool_mut::<T>().push(element);
                    if list.count == 0 {
                        list.pool_index = pool_index;
                    }
                }
                list.element_type = T::TAG;
                list.count += 1;
                Ok(Placement::Element)
            }
        }
    }

    fn push_container(&mut self, placement: Placement, tag: Tag) -> Result<(), NbtError> {
        let kind = match (placement, tag) {
            (Placement::Named(index), Tag::Compound) => {
                match self.store.named_tags[index.0].data_tag.payload {
                    TagPayload::Compound(compound) => ContainerKind::Compound(compound),
                    _ => return Err(violation("compound tag without compound payload")),
                }
            }
            (Placement::Named(_), _) => ContainerKind::List(ListRef::default()),
            (Placement::Element, Tag::Compound) => {
                let staged = self
                    .containers
                    .last()
                    .and_then(|parent| parent.staging)
                    .and_then(|slot| self.temporaries[slot].data.pool::<CompoundRef>().last());
                match staged {
                    Some(compound) => ContainerKind::Compound(*compound),
                    None => return Err(violation("staged compound missing")),
                }
            }
            (Placement::Element, _) => ContainerKind::List(ListRef::default()),
        };
        let origin = match placement {
            Placement::Named(index) => Origin::Named(index),
            Placement::Element => Origin::Anonymous,
        };
        self.containers.push(ContainerInfo::new(kind, origin));
        Ok(())
    }

    /// Records the final descriptor of a closed anonymous container in its
    /// parent list's staging buffer.
    fn finalize_in_parent<T: TagValue>(&mut self, descriptor: T) -> Result<(), NbtError> {
        let Some(parent) = self.containers.last_mut() else {
            return Err(violation("anonymous container closed without a parent"));
        };
        let slot = parent.staging.and_then(|slot| {
            let index = usize::try_from(parent.current_index).ok()?;
            self.temporaries
                .get_mut(slot)?
                .data
                .pool_mut::<T>()
                .get_mut(index)
        });
        match slot {
            Some(staged) => {
                *staged = descriptor;
                parent.current_index += 1;
                Ok(())
            }
            None => Err(violation("no staged slot for closed anonymous container")),
        }
    }
}

fn append<T: Pooled>(store: &mut DataStore, values: &[T]) -> usize {
    let pool = store.pool_mut::<T>();
    let start = pool.len();
    pool.extend_from_slice(values);
    start
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> Builder {
        let mut b = Builder::new();
        b.begin("").unwrap();
        b
    }

    fn root_members(b: &Builder) -> Vec<(String, Tag)> {
        let root = b.root().unwrap();
        let TagPayload::Compound(compound) = root.data_tag.payload else {
            panic!("root is not a compound");
        };
        b.store()
            .members(compound)
            .iter()
            .map(|i| {
                let t = b.store().named_tag(*i).unwrap();
                (t.name().to_owned(), t.tag())
            })
            .collect()
    }

    fn named_payload(b: &Builder, name: &str) -> TagPayload {
        b.store()
            .named_tags()
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.data_tag.payload)
            .unwrap()
    }

    #[test]
    fn lifecycle_states() {
        let mut b = Builder::new();
        assert_eq!(b.state(), BuildState::NotStarted);
        b.begin("root").unwrap();
        assert_eq!(b.state(), BuildState::Building);
        assert!(!b.is_end());
        b.end().unwrap();
        assert_eq!(b.state(), BuildState::Finalized);
        assert!(b.is_end());
        assert_eq!(b.root().unwrap().name(), "root");
    }

    #[test]
    fn begin_twice_fails() {
        let mut b = started();
        assert!(matches!(b.begin("again"), Err(NbtError::InvalidStructure(_))));
    }

    #[test]
    fn write_after_finalize_fails() {
        let mut b = started();
        b.end().unwrap();
        assert!(b.write_int(1, "late").is_err());
        assert!(b.begin_compound("late").is_err());
    }

    #[test]
    fn write_before_begin_fails() {
        let mut b = Builder::new();
        assert!(matches!(b.write_int(1, "x"), Err(NbtError::InvalidStructure(_))));
    }

    #[test]
    fn scalars_go_into_named_tags() {
        let mut b = started();
        b.write_byte(-1, "b").unwrap();
        b.write_short(300, "s").unwrap();
        b.write_int(70000, "i").unwrap();
        b.write_long(1 << 40, "l").unwrap();
        b.write_float(1.5, "f").unwrap();
        b.write_double(2.25, "d").unwrap();
        assert_eq!(
            root_members(&b),
            vec![
                ("b".into(), Tag::Byte),
                ("s".into(), Tag::Short),
                ("i".into(), Tag::Int),
                ("l".into(), Tag::Long),
                ("f".into(), Tag::Float),
                ("d".into(), Tag::Double),
            ]
        );
        assert_eq!(named_payload(&b, "s"), TagPayload::Short(300));
        assert_eq!(named_payload(&b, "d"), TagPayload::Double(2.25));
    }

    #[test]
    fn unnamed_tag_in_compound_fails() {
        let mut b = started();
        assert!(b.write_int(1, "").is_err());
        assert!(root_members(&b).is_empty());
    }

    #[test]
    fn arrays_and_strings_use_pools() {
        let mut b = started();
        b.write_byte_array(&[1, 2, 3], "bytes").unwrap();
        b.write_int_array(&[10, 20], "ints").unwrap();
        b.write_long_array(&[], "longs").unwrap();
        b.write_string("hello", "greeting").unwrap();
        assert_eq!(
            named_payload(&b, "bytes"),
            TagPayload::ByteArray(ByteArray { count: 3, pool_index: 0 })
        );
        assert_eq!(b.store().pool::<i32>(), &vec![10, 20]);
        assert_eq!(
            named_payload(&b, "longs"),
            TagPayload::LongArray(LongArray { count: 0, pool_index: 0 })
        );
        let TagPayload::String(s) = named_payload(&b, "greeting") else {
            panic!("not a string");
        };
        assert_eq!(b.store().string(s).unwrap(), "hello");
    }

    #[test]
    fn oversized_string_rejected() {
        let mut b = started();
        let long = "x".repeat(65536);
        assert!(b.write_string(&long, "s").is_err());
        assert!(b.store().pool::<u8>().is_empty());
        assert!(b.write_string(&long[..65535], "s").is_ok());
    }

    #[test]
    fn list_of_scalars() {
        let mut b = started();
        b.begin_list("nums").unwrap();
        for i in 0..4 {
            b.write_int(i, "").unwrap();
        }
        b.end_list().unwrap();
        assert_eq!(
            named_payload(&b, "nums"),
            TagPayload::List(ListRef {
                element_type: Tag::Int,
                count: 4,
                pool_index: 0
            })
        );
    }

    #[test]
    fn heterogeneous_list_rejected() {
        let mut b = started();
        b.begin_list("mixed").unwrap();
        b.write_int(1, "").unwrap();
        assert!(b.write_short(2, "").is_err());
        assert!(b.write_string("x", "").is_err());
        b.end_list().unwrap();
        let TagPayload::List(list) = named_payload(&b, "mixed") else {
            panic!("not a list");
        };
        assert_eq!(list.count, 1);
        assert_eq!(list.element_type, Tag::Int);
    }

    #[test]
    fn named_tag_in_list_rejected() {
        let mut b = started();
        b.begin_list("l").unwrap();
        assert!(b.write_int(1, "named").is_err());
        assert!(b.begin_compound("named").is_err());
    }

    #[test]
    fn empty_list_is_untyped() {
        let mut b = started();
        b.begin_list("items").unwrap();
        b.end_list().unwrap();
        assert_eq!(named_payload(&b, "items"), TagPayload::List(ListRef::default()));
    }

    #[test]
    fn list_of_compounds_is_staged_then_flushed() {
        let mut b = started();
        b.write_byte(0, "before").unwrap();
        b.begin_list("outer").unwrap();
        for x in 1..=2 {
            b.begin_compound("").unwrap();
            b.write_int(x, "x").unwrap();
            b.end_compound().unwrap();
        }
        assert!(b.store().pool::<CompoundRef>().is_empty());
        b.end_list().unwrap();

        let TagPayload::List(list) = named_payload(&b, "outer") else {
            panic!("not a list");
        };
        assert_eq!(list.element_type, Tag::Compound);
        assert_eq!(list.count, 2);
        let elements = b.store().pool_slice::<CompoundRef>(list.pool_index, 2).unwrap();
        for (element, expected) in elements.iter().zip(1..=2) {
            let member = b.store().members(*element)[0];
            let tag = b.store().named_tag(member).unwrap();
            assert_eq!(tag.name(), "x");
            assert_eq!(tag.data_tag.payload, TagPayload::Int(expected));
        }
    }

    #[test]
    fn list_of_lists_records_final_descriptors() {
        let mut b = started();
        b.begin_list("matrix").unwrap();
        for row in 0..3 {
            b.begin_list("").unwrap();
            for col in 0..=row {
                b.write_short(row * 10 + col, "").unwrap();
            }
            b.end_list().unwrap();
        }
        b.begin_list("").unwrap();
        b.end_list().unwrap();
        b.end_list().unwrap();

        let TagPayload::List(matrix) = named_payload(&b, "matrix") else {
            panic!("not a list");
        };
        assert_eq!(matrix.count, 4);
        let rows = b.store().pool_slice::<ListRef>(matrix.pool_index, 4).unwrap();
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[2].count, 3);
        assert_eq!(rows[3], ListRef::default());
        assert_eq!(
            b.store().pool_slice::<i16>(rows[2].pool_index, 3).unwrap(),
            &[20, 21, 22]
        );
    }

    #[test]
    fn deeply_nested_lists_stage_independently() {
        let mut b = started();
        b.begin_list("a").unwrap();
        b.begin_list("").unwrap();
        b.begin_list("").unwrap();
        b.write_long(7, "").unwrap();
        b.end_list().unwrap();
        b.end_list().unwrap();
        b.begin_list("").unwrap();
        b.end_list().unwrap();
        b.end().unwrap();

        let TagPayload::List(a) = named_payload(&b, "a") else {
            panic!("not a list");
        };
        assert_eq!(a.count, 2);
        let level1 = b.store().pool_slice::<ListRef>(a.pool_index, 2).unwrap();
        assert_eq!(level1[0].element_type, Tag::List);
        let level2 = b.store().pool_slice::<ListRef>(level1[0].pool_index, 1).unwrap();
        assert_eq!(b.store().pool_slice::<i64>(level2[0].pool_index, 1).unwrap(), &[7]);
    }

    #[test]
    fn end_closes_everything() {
        let mut b = started();
        b.begin_compound("c").unwrap();
        b.begin_list("l").unwrap();
        b.begin_compound("").unwrap();
        b.end().unwrap();
        assert!(b.is_end());
    }

    #[test]
    fn close_mismatch_rejected() {
        let mut b = started();
        b.begin_list("l").unwrap();
        assert!(b.end_compound().is_err());
        b.end_list().unwrap();
        assert!(b.end_list().is_err());
    }

    #[test]
    fn depth_bound() {
        let mut b = started();
        for _ in 1..512 {
            b.begin_compound("n").unwrap();
        }
        b.write_int(1, "leaf").unwrap();
        assert!(b.begin_compound("n").is_err());
        assert!(b.begin_list("n").is_err());
        b.write_int(2, "sibling").unwrap();
        b.end().unwrap();

        let mut buf = bytes::BytesMut::new();
        crate::writer::Writer::from_builder(b).export_bin(&mut buf).unwrap();
        let mut reader = crate::reader::Reader::new();
        reader.import_bin(&buf).unwrap();
        for _ in 1..512 {
            reader.open_compound("n").unwrap();
        }
        assert_eq!(reader.count().unwrap(), 2);
        assert_eq!(reader.read_int("leaf").unwrap(), 1);
        assert_eq!(reader.read_int("sibling").unwrap(), 2);
    }

    #[test]
    fn configurable_depth() {
        let mut b = Builder::with_limits(Limits::default().with_max_depth(2));
        b.begin("").unwrap();
        b.begin_list("l").unwrap();
        assert!(b.begin_list("").is_err());
    }

    #[test]
    fn clear_resets() {
        let mut b = started();
        b.write_int(1, "a").unwrap();
        b.end().unwrap();
        b.clear();
        assert_eq!(b.state(), BuildState::NotStarted);
        assert!(b.store().is_empty());
        b.begin("fresh").unwrap();
        assert_eq!(b.root().unwrap().name(), "fresh");
    }
}
