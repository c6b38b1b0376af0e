//! Resource limits applied while building and importing.

/// Default maximum container nesting depth, root compound included.
pub const MAX_DEPTH: usize = 512;

/// Limits shared by [`Builder`](crate::Builder), [`Reader`](crate::Reader)
/// and [`Writer`](crate::Writer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of simultaneously open containers.
    pub max_depth: usize,
    /// Upper bound on the size of any imported buffer or file.
    pub max_input_len: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_input_len: None,
        }
    }
}

impl Limits {
    /// Sets the maximum container nesting depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the maximum accepted input size in bytes.
    pub fn with_max_input_len(mut self, len: usize) -> Self {
        self.max_input_len = Some(len);
        self
    }

    pub(crate) fn check_input_len(&self, len: usize) -> Result<(), crate::NbtError> {
        match self.max_input_len {
            Some(limit) if len > limit => Err(crate::NbtError::InputTooLarge { len, limit }),
            _ => Ok(()),
        }
    }
}
