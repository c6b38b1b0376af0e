//! Tag kinds and tag payloads.

use std::fmt;

/// The closed set of tag kinds. Discriminants are the wire byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Tag {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
    #[default]
    Invalid = 0xCC,
}

impl Tag {
    /// Maps a wire byte to a tag kind; unknown bytes map to [`Tag::Invalid`].
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            0 => Self::End,
            1 => Self::Byte,
            2 => Self::Short,
            3 => Self::Int,
            4 => Self::Long,
            5 => Self::Float,
            6 => Self::Double,
            7 => Self::ByteArray,
            8 => Self::String,
            9 => Self::List,
            10 => Self::Compound,
            11 => Self::IntArray,
            12 => Self::LongArray,
            _ => Self::Invalid,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Lists and compounds are containers; everything else is a leaf.
    pub fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Compound)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::End => "End",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::ByteArray => "Byte_Array",
            Self::String => "String",
            Self::List => "List",
            Self::Compound => "Compound",
            Self::IntArray => "Int_Array",
            Self::LongArray => "Long_Array",
            Self::Invalid => "INVALID",
        };
        f.write_str(name)
    }
}

// -- Aggregate descriptors --
//
// Each descriptor points into a pool of the data store by start offset. The
// three array descriptors are distinct types so each gets its own pool.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteArray {
    pub count: i32,
    pub pool_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntArray {
    pub count: i32,
    pub pool_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LongArray {
    pub count: i32,
    pub pool_index: usize,
}

/// A run of bytes in the char pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringRef {
    pub length: u16,
    pub pool_index: usize,
}

/// A homogeneous sequence. `element_type == End` with `count == 0` is an
/// empty, untyped list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRef {
    pub element_type: Tag,
    pub count: i32,
    pub pool_index: usize,
}

impl Default for ListRef {
    fn default() -> Self {
        Self {
            element_type: Tag::End,
            count: 0,
            pool_index: usize::MAX,
        }
    }
}

/// Index into the store's compound storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundRef {
    pub storage_index: usize,
}

impl Default for CompoundRef {
    fn default() -> Self {
        Self {
            storage_index: usize::MAX,
        }
    }
}

/// The value held by a tag: a scalar or an aggregate descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TagPayload {
    #[default]
    Empty,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(ByteArray),
    IntArray(IntArray),
    LongArray(LongArray),
    String(StringRef),
    List(ListRef),
    Compound(CompoundRef),
}

/// An unnamed, typed value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DataTag {
    pub tag: Tag,
    pub payload: TagPayload,
}

impl DataTag {
    pub fn new(tag: Tag, payload: TagPayload) -> Self {
        Self { tag, payload }
    }
}

/// A name paired with a typed value; the unit of storage inside a compound.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedDataTag {
    name: String,
    pub data_tag: DataTag,
}

impl NamedDataTag {
    pub fn new(name: &str, tag: Tag) -> Self {
        Self {
            name: name.to_owned(),
            data_tag: DataTag::new(tag, TagPayload::Empty),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name.clear();
        self.name.push_str(name);
    }

    pub fn tag(&self) -> Tag {
        self.data_tag.tag
    }
}
