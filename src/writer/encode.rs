//! Binary encoding: stored tag tree → big-endian wire bytes.

use bytes::{BufMut, BytesMut};

use crate::error::NbtError;
use crate::store::{DataStore, TagValue};
use crate::tag::{
    ByteArray, CompoundRef, DataTag, IntArray, ListRef, LongArray, NamedDataTag, StringRef, Tag,
    TagPayload,
};

/// Encodes a named tag: type byte, name, payload.
pub(crate) fn output_bin_tag(
    buf: &mut BytesMut,
    store: &DataStore,
    tag: &NamedDataTag,
) -> Result<(), NbtError> {
    buf.put_u8(tag.tag().as_u8());
    output_bin_str(buf, tag.name().as_bytes())?;
    output_bin_payload(buf, store, &tag.data_tag)
}

/// Encodes a u16 length-prefixed string. The bytes are written as stored.
pub(crate) fn output_bin_str(buf: &mut BytesMut, value: &[u8]) -> Result<(), NbtError> {
    let len = u16::try_from(value.len()).map_err(|_| {
        NbtError::structure(format!("string of {} bytes is too long", value.len()))
    })?;
    buf.put_u16(len);
    buf.put_slice(value);
    Ok(())
}

pub(crate) fn output_bin_payload(
    buf: &mut BytesMut,
    store: &DataStore,
    tag: &DataTag,
) -> Result<(), NbtError> {
    match tag.payload {
        TagPayload::Byte(v) => buf.put_i8(v),
        TagPayload::Short(v) => buf.put_i16(v),
        TagPayload::Int(v) => buf.put_i32(v),
        TagPayload::Long(v) => buf.put_i64(v),
        TagPayload::Float(v) => buf.put_f32(v),
        TagPayload::Double(v) => buf.put_f64(v),
        TagPayload::ByteArray(array) => {
            buf.put_i32(array.count);
            for v in store.pool_slice::<i8>(array.pool_index, array.count)? {
                buf.put_i8(*v);
            }
        }
        TagPayload::IntArray(array) => {
            buf.put_i32(array.count);
            for v in store.pool_slice::<i32>(array.pool_index, array.count)? {
                buf.put_i32(*v);
            }
        }
        TagPayload::LongArray(array) => {
            buf.put_i32(array.count);
            for v in store.pool_slice::<i64>(array.pool_index, array.count)? {
                buf.put_i64(*v);
            }
        }
        TagPayload::String(string) => output_bin_str(buf, store.string_bytes(string)?)?,
        TagPayload::List(list) => output_bin_list(buf, store, list)?,
        TagPayload::Compound(compound) => {
            for &index in store.members(compound) {
                let member = store
                    .named_tag(index)
                    .ok_or_else(|| NbtError::structure("compound member out of bounds"))?;
                output_bin_tag(buf, store, member)?;
            }
            buf.put_u8(Tag::End.as_u8());
        }
        TagPayload::Empty => {
            return Err(NbtError::structure(format!("{} tag has no payload", tag.tag)));
        }
    }
    Ok(())
}

/// Empty lists are written with element type `End`.
fn output_bin_list(buf: &mut BytesMut, store: &DataStore, list: ListRef) -> Result<(), NbtError> {
    if list.count == 0 {
        buf.put_u8(Tag::End.as_u8());
        buf.put_i32(0);
        return Ok(());
    }
    buf.put_u8(list.element_type.as_u8());
    buf.put_i32(list.count);
    match list.element_type {
        Tag::Byte => output_bin_elements::<i8>(buf, store, list),
        Tag::Short => output_bin_elements::<i16>(buf, store, list),
        Tag::Int => output_bin_elements::<i32>(buf, store, list),
        Tag::Long => output_bin_elements::<i64>(buf, store, list),
        Tag::Float => output_bin_elements::<f32>(buf, store, list),
        Tag::Double => output_bin_elements::<f64>(buf, store, list),
        Tag::ByteArray => output_bin_elements::<ByteArray>(buf, store, list),
        Tag::IntArray => output_bin_elements::<IntArray>(buf, store, list),
        Tag::LongArray => output_bin_elements::<LongArray>(buf, store, list),
        Tag::String => output_bin_elements::<StringRef>(buf, store, list),
        Tag::List => output_bin_elements::<ListRef>(buf, store, list),
        Tag::Compound => output_bin_elements::<CompoundRef>(buf, store, list),
        Tag::End | Tag::Invalid => Err(NbtError::structure(format!(
            "list of {} elements has element type {}",
            list.count, list.element_type
        ))),
    }
}

/// Each element is wrapped in a transient [`DataTag`] and encoded like a
/// standalone payload.
fn output_bin_elements<T: TagValue>(
    buf: &mut BytesMut,
    store: &DataStore,
    list: ListRef,
) -> Result<(), NbtError> {
    for &element in store.pool_slice::<T>(list.pool_index, list.count)? {
        output_bin_payload(buf, store, &DataTag::new(T::TAG, element.into_payload()))?;
    }
    Ok(())
}
