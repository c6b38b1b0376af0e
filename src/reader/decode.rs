//! Binary decoding: big-endian wire bytes → builder calls.

use bytes::{Buf, Bytes};

use crate::builder::Builder;
use crate::error::NbtError;
use crate::tag::Tag;

/// Parses a whole binary tree: a root compound header followed by its
/// members up to the closing `End`. Bytes after the root are ignored.
///
/// The root is left open so traversal can start there.
pub(crate) fn parse_bin_stream(buf: &mut impl Buf, builder: &mut Builder) -> Result<(), NbtError> {
    let tag = retrieve_bin_tag(buf)?;
    if tag != Tag::Compound {
        return Err(NbtError::parse(format!(
            "root tag must be a Compound, found {tag}"
        )));
    }
    let name = retrieve_bin_str(buf)?;
    builder.begin(&name)?;
    while parse_bin_named_tag(buf, builder)? != Tag::End {}
    Ok(())
}

/// Parses one `tag, name, payload` triple. Returns `End` at a compound terminator.
pub(crate) fn parse_bin_named_tag(
    buf: &mut impl Buf,
    builder: &mut Builder,
) -> Result<Tag, NbtError> {
    let tag = retrieve_bin_tag(buf)?;
    if tag == Tag::End {
        return Ok(tag);
    }
    let name = retrieve_bin_str(buf)?;
    parse_bin_payload(buf, builder, tag, &name)?;
    Ok(tag)
}

pub(crate) fn parse_bin_payload(
    buf: &mut impl Buf,
    builder: &mut Builder,
    tag: Tag,
    name: &str,
) -> Result<(), NbtError> {
    match tag {
        Tag::Byte => {
            ensure_remaining(buf, 1)?;
            builder.write_byte(buf.get_i8(), name)
        }
        Tag::Short => {
            ensure_remaining(buf, 2)?;
            builder.write_short(buf.get_i16(), name)
        }
        Tag::Int => {
            ensure_remaining(buf, 4)?;
            builder.write_int(buf.get_i32(), name)
        }
        Tag::Long => {
            ensure_remaining(buf, 8)?;
            builder.write_long(buf.get_i64(), name)
        }
        Tag::Float => {
            ensure_remaining(buf, 4)?;
            builder.write_float(buf.get_f32(), name)
        }
        Tag::Double => {
            ensure_remaining(buf, 8)?;
            builder.write_double(buf.get_f64(), name)
        }
        Tag::ByteArray => {
            let count = retrieve_bin_array_len(buf)?;
            ensure_remaining(buf, count)?;
            let values: Vec<i8> = (0..count).map(|_| buf.get_i8()).collect();
            builder.write_byte_array(&values, name)
        }
        Tag::IntArray => {
            let count = retrieve_bin_array_len(buf)?;
            ensure_elements(buf, count, 4)?;
            let values: Vec<i32> = (0..count).map(|_| buf.get_i32()).collect();
            builder.write_int_array(&values, name)
        }
        Tag::LongArray => {
            let count = retrieve_bin_array_len(buf)?;
            ensure_elements(buf, count, 8)?;
            let values: Vec<i64> = (0..count).map(|_| buf.get_i64()).collect();
            builder.write_long_array(&values, name)
        }
        Tag::String => {
            let value = retrieve_bin_bytes(buf)?;
            builder.write_string_bytes(&value, name)
        }
        Tag::List => {
            let element_type = retrieve_bin_tag(buf)?;
            let count = retrieve_bin_array_len(buf)?;
            if element_type == Tag::End && count > 0 {
                return Err(NbtError::parse(format!(
                    "list of {count} elements declares element type End"
                )));
            }
            if let Some(size) = fixed_size(element_type) {
                ensure_elements(buf, count, size)?;
            }
            builder.begin_list(name)?;
            for _ in 0..count {
                parse_bin_payload(buf, builder, element_type, "")?;
            }
            builder.end_list()
        }
        Tag::Compound => {
            builder.begin_compound(name)?;
            while parse_bin_named_tag(buf, builder)? != Tag::End {}
            builder.end_compound()
        }
        Tag::End | Tag::Invalid => Err(NbtError::parse(format!("unexpected {tag} payload"))),
    }
}

/// Reads one tag byte; unknown values are rejected.
pub(crate) fn retrieve_bin_tag(buf: &mut impl Buf) -> Result<Tag, NbtError> {
    ensure_remaining(buf, 1)?;
    let byte = buf.get_u8();
    match Tag::from_u8(byte) {
        Tag::Invalid => Err(NbtError::parse(format!("unknown tag byte 0x{byte:02X}"))),
        tag => Ok(tag),
    }
}

/// Reads a u16 length-prefixed byte string without interpreting it.
pub(crate) fn retrieve_bin_bytes(buf: &mut impl Buf) -> Result<Bytes, NbtError> {
    ensure_remaining(buf, 2)?;
    let len = usize::from(buf.get_u16());
    ensure_remaining(buf, len)?;
    Ok(buf.copy_to_bytes(len))
}

/// Reads a tag name. Names are looked up as text, so invalid UTF-8
/// sequences are replaced with U+FFFD.
pub(crate) fn retrieve_bin_str(buf: &mut impl Buf) -> Result<String, NbtError> {
    let data = retrieve_bin_bytes(buf)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Reads an i32 element count. Negative counts are rejected.
pub(crate) fn retrieve_bin_array_len(buf: &mut impl Buf) -> Result<usize, NbtError> {
    ensure_remaining(buf, 4)?;
    let count = buf.get_i32();
    usize::try_from(count).map_err(|_| NbtError::parse(format!("negative element count {count}")))
}

fn fixed_size(tag: Tag) -> Option<usize> {
    match tag {
        Tag::Byte => Some(1),
        Tag::Short => Some(2),
        Tag::Int | Tag::Float => Some(4),
        Tag::Long | Tag::Double => Some(8),
        _ => None,
    }
}

fn ensure_elements(buf: &impl Buf, count: usize, size: usize) -> Result<(), NbtError> {
    ensure_remaining(buf, count.saturating_mul(size))
}

fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), NbtError> {
    if buf.remaining() < needed {
        Err(NbtError::UnexpectedEof {
            needed,
            remaining: buf.remaining(),
        })
    } else {
        Ok(())
    }
}
