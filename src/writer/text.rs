//! Text encoding: stored tag tree → SNBT-style text.

use crate::error::NbtError;
use crate::store::{DataStore, TagValue};
use crate::tag::{
    ByteArray, CompoundRef, DataTag, IntArray, ListRef, LongArray, NamedDataTag, StringRef, Tag,
    TagPayload,
};

use super::PrettyPrint;

/// Appends text output for one tree to a string buffer.
pub(crate) struct TextOutput<'a> {
    out: &'a mut String,
    store: &'a DataStore,
    pretty: PrettyPrint,
}

impl<'a> TextOutput<'a> {
    pub(crate) fn new(out: &'a mut String, store: &'a DataStore, pretty: PrettyPrint) -> Self {
        Self { out, store, pretty }
    }

    /// `name:payload`, or just the payload for an unnamed tag.
    pub(crate) fn output_text_tag(&mut self, tag: &NamedDataTag) -> Result<(), NbtError> {
        if !tag.name().is_empty() {
            self.output_text_str(tag.name());
            self.out.push(':');
        }
        self.output_text_payload(&tag.data_tag)
    }

    /// Writes a double-quoted string, escaping `\` and `"`.
    pub(crate) fn output_text_str(&mut self, value: &str) {
        self.out.reserve(value.len() + 2);
        self.out.push('"');
        for c in value.chars() {
            if matches!(c, '\\' | '"') {
                self.out.push('\\');
            }
            self.out.push(c);
        }
        self.out.push('"');
    }

    pub(crate) fn output_text_payload(&mut self, tag: &DataTag) -> Result<(), NbtError> {
        match tag.payload {
            TagPayload::Byte(v) => self.number(v, "b"),
            TagPayload::Short(v) => self.number(v, "s"),
            TagPayload::Int(v) => self.number(v, ""),
            TagPayload::Long(v) => self.number(v, "l"),
            TagPayload::Float(v) => self.real(v, v.is_finite(), "f")?,
            TagPayload::Double(v) => self.real(v, v.is_finite(), "")?,
            TagPayload::ByteArray(array) => {
                let values = self.store.pool_slice::<i8>(array.pool_index, array.count)?;
                self.packed("[B;", values, "b");
            }
            TagPayload::IntArray(array) => {
                let values = self.store.pool_slice::<i32>(array.pool_index, array.count)?;
                self.packed("[I;", values, "");
            }
            TagPayload::LongArray(array) => {
                let values = self.store.pool_slice::<i64>(array.pool_index, array.count)?;
                self.packed("[L;", values, "l");
            }
            TagPayload::String(string) => {
                let value = self.store.string(string)?;
                self.output_text_str(value);
            }
            TagPayload::List(list) => self.output_text_list(list)?,
            TagPayload::Compound(compound) => {
                let store = self.store;
                let members = store.members(compound);
                self.out.push('{');
                self.newline();
                for (i, &index) in members.iter().enumerate() {
                    let member = store
                        .named_tag(index)
                        .ok_or_else(|| NbtError::structure("compound member out of bounds"))?;
                    self.output_text_tag(member)?;
                    if i + 1 < members.len() {
                        self.out.push(',');
                    }
                    self.newline();
                }
                self.out.push('}');
            }
            TagPayload::Empty => {
                return Err(NbtError::structure(format!("{} tag has no payload", tag.tag)));
            }
        }
        Ok(())
    }

    fn output_text_list(&mut self, list: ListRef) -> Result<(), NbtError> {
        self.out.push('[');
        match list.element_type {
            _ if list.count == 0 => {}
            Tag::Byte => self.output_text_elements::<i8>(list)?,
            Tag::Short => self.output_text_elements::<i16>(list)?,
            Tag::Int => self.output_text_elements::<i32>(list)?,
            Tag::Long => self.output_text_elements::<i64>(list)?,
            Tag::Float => self.output_text_elements::<f32>(list)?,
            Tag::Double => self.output_text_elements::<f64>(list)?,
            Tag::ByteArray => self.output_text_elements::<ByteArray>(list)?,
            Tag::IntArray => self.output_text_elements::<IntArray>(list)?,
            Tag::LongArray => self.output_text_elements::<LongArray>(list)?,
            Tag::String => self.output_text_elements::<StringRef>(list)?,
            Tag::List => self.output_text_elements::<ListRef>(list)?,
            Tag::Compound => self.output_text_elements::<CompoundRef>(list)?,
            Tag::End | Tag::Invalid => {
                return Err(NbtError::structure(format!(
                    "list of {} elements has element type {}",
                    list.count, list.element_type
                )));
            }
        }
        self.out.push(']');
        Ok(())
    }

    /// Compound elements start on a new line when pretty printing.
    fn output_text_elements<T: TagValue>(&mut self, list: ListRef) -> Result<(), NbtError> {
        let store = self.store;
        let elements = store.pool_slice::<T>(list.pool_index, list.count)?;
        for (i, &element) in elements.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            if T::TAG == Tag::Compound {
                self.newline();
            }
            self.output_text_payload(&DataTag::new(T::TAG, element.into_payload()))?;
        }
        Ok(())
    }

    fn number(&mut self, value: impl ToString, suffix: &str) {
        self.out.push_str(&value.to_string());
        self.out.push_str(suffix);
    }

    /// NaN and infinities have no text form and are rejected.
    fn real(&mut self, value: impl ToString, finite: bool, suffix: &str) -> Result<(), NbtError> {
        let text = value.to_string();
        if !finite {
            return Err(NbtError::structure(format!(
                "real value {text} cannot be written as text"
            )));
        }
        self.out.push_str(&format_real(text));
        self.out.push_str(suffix);
        Ok(())
    }

    fn packed<T: std::fmt::Display>(&mut self, open: &str, values: &[T], suffix: &str) {
        self.out.push_str(open);
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.number(v, suffix);
        }
        self.out.push(']');
    }

    fn newline(&mut self) {
        if self.pretty == PrettyPrint::Enabled {
            self.out.push('\n');
        }
    }
}

/// Shortest round-trip form, always with a decimal point so the value reads
/// back as a real.
fn format_real(mut text: String) -> String {
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}
