//! Framebuffer view into linear memory
//!
//! The module renders RGBA8 pixels into its own memory and tells the host
//! where they are. A [`FramebufferView`] records that location together with
//! the memory generation it was derived under, so a view that outlives a
//! memory growth refuses to read instead of reading a moved buffer.

use std::ops::Range;

use thiserror::Error;

/// Bytes per RGBA8 pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Why a framebuffer view could not be built or read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramebufferError {
    #[error("framebuffer dimensions {width}x{height} overflow the address space")]
    Overflow { width: u32, height: u32 },

    #[error("framebuffer {offset:#x}+{byte_len} exceeds linear memory of {memory_size} bytes")]
    OutOfBounds {
        offset: u32,
        byte_len: usize,
        memory_size: usize,
    },

    #[error("framebuffer view from memory generation {view} used at generation {current}")]
    Stale { view: u64, current: u64 },

    #[error("published {published} pixels for a {width}x{height} surface")]
    SizeMismatch {
        published: u32,
        width: u32,
        height: u32,
    },

    #[error("module has no linear memory")]
    NoMemory,

    #[error("framebuffer location not known yet")]
    NoView,
}

/// Location and size of the image the module last produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferView {
    offset: u32,
    width: u32,
    height: u32,
    byte_len: usize,
    generation: u64,
}

impl FramebufferView {
    /// Build a view, checking it fits inside `memory_size` bytes
    pub fn new(
        offset: u32,
        width: u32,
        height: u32,
        generation: u64,
        memory_size: usize,
    ) -> Result<Self, FramebufferError> {
        let byte_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL))
            .ok_or(FramebufferError::Overflow { width, height })?;

        let end = (offset as usize).checked_add(byte_len);
        if end.is_none_or(|end| end > memory_size) {
            return Err(FramebufferError::OutOfBounds {
                offset,
                byte_len,
                memory_size,
            });
        }

        Ok(Self {
            offset,
            width,
            height,
            byte_len,
            generation,
        })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Always `4 * width * height`
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Memory generation the view was derived under
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Byte range of the image inside linear memory
    pub fn range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.byte_len
    }

    /// Whether the view was derived under the current memory generation
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Borrow the pixels from `memory`
    ///
    /// Fails if memory grew since the view was built or if the memory is
    /// smaller than the view (which cannot happen for wasm memories, but the
    /// slice may come from anywhere).
    pub fn bytes<'m>(&self, memory: &'m [u8], generation: u64) -> Result<&'m [u8], FramebufferError> {
        if !self.is_current(generation) {
            return Err(FramebufferError::Stale {
                view: self.generation,
                current: generation,
            });
        }
        memory
            .get(self.range())
            .ok_or(FramebufferError::OutOfBounds {
                offset: self.offset,
                byte_len: self.byte_len,
                memory_size: memory.len(),
            })
    }
}
