/*!
 * Typed Views
 *
 * Typed-array style windows over a shared block. A view pins an element
 * kind, a byte offset, and a length; geometry and alignment are validated
 * at construction so per-element accesses only bounds-check the index.
 *
 * Two views of different element widths that address the same byte
 * resolve to the same [`WaitLocation`] - only the byte address matters
 * for synchronization.
 */

use super::block::SharedBlock;
use crate::core::errors::WaitError;
use crate::core::types::{Size, WaitqResult};
use crate::sync::types::WaitLocation;
use serde::{Deserialize, Serialize};

/// Element type of a view
///
/// Mirrors the integer typed-array kinds of the host runtime; float views
/// are excluded because atomic element access is undefined for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    BigInt64,
    BigUint64,
}

impl ElementKind {
    /// Width of one element in bytes
    #[inline]
    pub fn byte_width(&self) -> Size {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 => 4,
            Self::BigInt64 | Self::BigUint64 => 8,
        }
    }

    /// Whether wait/notify is defined for this kind
    ///
    /// Only the signed 32- and 64-bit kinds can be waited on; everything
    /// else fails validation with a type error.
    #[inline]
    pub fn is_waitable(&self) -> bool {
        matches!(self, Self::Int32 | Self::BigInt64)
    }
}

/// Typed window over a shared block
#[derive(Debug, Clone)]
pub struct SharedView {
    block: SharedBlock,
    kind: ElementKind,
    byte_offset: Size,
    length: Size,
}

impl SharedView {
    /// Create a view covering `length` elements starting at `byte_offset`
    pub fn new(
        block: SharedBlock,
        kind: ElementKind,
        byte_offset: Size,
        length: Size,
    ) -> WaitqResult<Self> {
        let width = kind.byte_width();
        if byte_offset % width != 0 {
            return Err(WaitError::Misaligned {
                offset: byte_offset,
                width,
            });
        }

        let span = length
            .checked_mul(width)
            .and_then(|span| byte_offset.checked_add(span))
            .ok_or(WaitError::InvalidRange {
                offset: byte_offset,
                size: length,
                block_size: block.len(),
            })?;
        if span > block.len() {
            return Err(WaitError::InvalidRange {
                offset: byte_offset,
                size: length * width,
                block_size: block.len(),
            });
        }

        Ok(Self {
            block,
            kind,
            byte_offset,
            length,
        })
    }

    /// Create a view spanning the whole block
    pub fn full(block: SharedBlock, kind: ElementKind) -> WaitqResult<Self> {
        let length = block.len() / kind.byte_width();
        Self::new(block, kind, 0, length)
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> Size {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn byte_offset(&self) -> Size {
        self.byte_offset
    }

    #[inline]
    pub fn block(&self) -> &SharedBlock {
        &self.block
    }

    /// Bounds-check an element index
    #[inline]
    pub fn check_index(&self, index: usize) -> WaitqResult<()> {
        if index >= self.length {
            return Err(WaitError::OutOfBounds {
                index,
                length: self.length,
            });
        }
        Ok(())
    }

    /// Synchronization key of an element: block identity plus byte address
    pub fn location_of(&self, index: usize) -> WaitqResult<WaitLocation> {
        self.check_index(index)?;
        Ok(WaitLocation {
            block: self.block.id(),
            byte_offset: self.byte_offset + index * self.kind.byte_width(),
        })
    }

    /// Atomic element load, widened to i64 with the kind's signedness
    pub fn load(&self, index: usize) -> WaitqResult<i64> {
        self.check_index(index)?;
        Ok(self.atomic_load(index))
    }

    /// Atomic element store, truncating from i64
    pub fn store(&self, index: usize, value: i64) -> WaitqResult<()> {
        self.check_index(index)?;
        let offset = self.byte_offset + index * self.kind.byte_width();
        match self.kind {
            ElementKind::Int8 | ElementKind::Uint8 => self.block.store_u8(offset, value as u8),
            ElementKind::Int16 | ElementKind::Uint16 => self.block.store_u16(offset, value as u16),
            ElementKind::Int32 | ElementKind::Uint32 => self.block.store_u32(offset, value as u32),
            ElementKind::BigInt64 | ElementKind::BigUint64 => {
                self.block.store_u64(offset, value as u64)
            }
        }
        Ok(())
    }

    /// Unchecked atomic load; callers have already validated the index
    #[inline]
    pub(crate) fn atomic_load(&self, index: usize) -> i64 {
        debug_assert!(index < self.length);
        let offset = self.byte_offset + index * self.kind.byte_width();
        match self.kind {
            ElementKind::Int8 => self.block.load_u8(offset) as i8 as i64,
            ElementKind::Uint8 => self.block.load_u8(offset) as i64,
            ElementKind::Int16 => self.block.load_u16(offset) as i16 as i64,
            ElementKind::Uint16 => self.block.load_u16(offset) as i64,
            ElementKind::Int32 => self.block.load_u32(offset) as i32 as i64,
            ElementKind::Uint32 => self.block.load_u32(offset) as i64,
            ElementKind::BigInt64 | ElementKind::BigUint64 => self.block.load_u64(offset) as i64,
        }
    }
}
