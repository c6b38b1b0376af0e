//! Bounds-checked cursor over an imported byte buffer.

use bytes::Buf;

use crate::error::NbtError;

/// A forward cursor over borrowed input.
///
/// Binary parsing consumes it through [`Buf`]; the text tokenizer uses the
/// byte-level lookahead helpers. Every accessor checks the remaining length,
/// so truncated input surfaces as [`NbtError::UnexpectedEof`] rather than a
/// panic.
#[derive(Debug, Clone, Copy)]
pub struct MemoryStream<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> MemoryStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn has_contents(&self) -> bool {
        self.position < self.data.len()
    }

    pub fn current_byte(&self) -> Option<u8> {
        self.lookahead_byte(0)
    }

    pub fn lookahead_byte(&self, offset: usize) -> Option<u8> {
        self.data.get(self.position.checked_add(offset)?).copied()
    }

    /// Consumes the current byte if it is one of `set`, returning it.
    pub fn match_current_byte(&mut self, set: &[u8]) -> Option<u8> {
        let byte = self.current_byte().filter(|b| set.contains(b))?;
        self.position += 1;
        Some(byte)
    }

    pub fn skip_bytes(&mut self, set: &[u8]) {
        while self.current_byte().is_some_and(|b| set.contains(&b)) {
            self.position += 1;
        }
    }

    pub fn ensure_remaining(&self, needed: usize) -> Result<(), NbtError> {
        if self.remaining() < needed {
            Err(NbtError::UnexpectedEof {
                needed,
                remaining: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    /// Consumes `count` bytes and returns them without copying.
    pub fn retrieve_range(&mut self, count: usize) -> Result<&'a [u8], NbtError> {
        self.ensure_remaining(count)?;
        let range = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(range)
    }

    /// Consumes `count` bytes that must form valid UTF-8.
    pub fn retrieve_str(&mut self, count: usize) -> Result<&'a str, NbtError> {
        let bytes = self.retrieve_range(count)?;
        std::str::from_utf8(bytes).map_err(|e| NbtError::parse(format!("invalid UTF-8: {e}")))
    }
}

impl Buf for MemoryStream<'_> {
    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    fn chunk(&self) -> &[u8] {
        self.data.get(self.position..).unwrap_or(&[])
    }

    fn advance(&mut self, cnt: usize) {
        assert!(cnt <= self.remaining(), "cannot advance past the end of the stream");
        self.position += cnt;
    }
}
