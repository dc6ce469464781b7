/*!
 * Shared Memory Block
 *
 * An atomically addressable byte region with a process-unique identity.
 * Cloning a handle shares the storage; the block lives as long as any
 * holder keeps a clone. Identity is the `BlockId`, never the address, so
 * it stays stable no matter which agent holds a reference.
 */

use crate::core::errors::WaitError;
use crate::core::limits::{BLOCK_WORD_BYTES, MAX_BLOCK_SIZE};
use crate::core::types::{BlockId, Size, WaitqResult};
use log::debug;
use std::sync::atomic::{AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Process-wide block identity counter
static NEXT_BLOCK_ID: AtomicU64 = AtomicU64::new(1);

struct BlockData {
    id: BlockId,
    shared: bool,
    len: Size,
    /// 8-byte aligned backing store; element accessors cast into it at
    /// their natural alignment
    words: Box<[AtomicU64]>,
}

/// Shared memory block handle
pub struct SharedBlock {
    data: Arc<BlockData>,
}

impl SharedBlock {
    /// Create a block visible to every agent holding a clone
    pub fn new_shared(len: Size) -> WaitqResult<Self> {
        Self::new(len, true)
    }

    /// Create a non-shared block; wait calls against it are rejected
    pub fn new_local(len: Size) -> WaitqResult<Self> {
        Self::new(len, false)
    }

    fn new(len: Size, shared: bool) -> WaitqResult<Self> {
        if len == 0 {
            return Err(WaitError::InvalidSize("size cannot be zero".to_string()));
        }
        if len > MAX_BLOCK_SIZE {
            return Err(WaitError::InvalidSize(format!(
                "size {} exceeds maximum {}",
                len, MAX_BLOCK_SIZE
            )));
        }

        let word_count = len.div_ceil(BLOCK_WORD_BYTES);
        let words: Box<[AtomicU64]> = (0..word_count).map(|_| AtomicU64::new(0)).collect();
        let id = NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed);

        debug!(
            "Created {} block {} ({} bytes)",
            if shared { "shared" } else { "local" },
            id,
            len
        );

        Ok(Self {
            data: Arc::new(BlockData {
                id,
                shared,
                len,
                words,
            }),
        })
    }

    #[inline]
    pub fn id(&self) -> BlockId {
        self.data.id
    }

    #[inline]
    pub fn len(&self) -> Size {
        self.data.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.len == 0
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        self.data.shared
    }

    #[inline]
    fn byte_ptr(&self, offset: Size) -> *const u8 {
        (self.data.words.as_ptr() as *const u8).wrapping_add(offset)
    }

    /// Atomic 8-bit load
    #[inline]
    pub(crate) fn load_u8(&self, offset: Size) -> u8 {
        debug_assert!(offset < self.data.len);
        unsafe { (*(self.byte_ptr(offset) as *const AtomicU8)).load(Ordering::SeqCst) }
    }

    #[inline]
    pub(crate) fn store_u8(&self, offset: Size, value: u8) {
        debug_assert!(offset < self.data.len);
        unsafe { (*(self.byte_ptr(offset) as *const AtomicU8)).store(value, Ordering::SeqCst) }
    }

    /// Atomic 16-bit load at a 2-aligned offset
    #[inline]
    pub(crate) fn load_u16(&self, offset: Size) -> u16 {
        debug_assert!(offset % 2 == 0 && offset + 2 <= self.data.len);
        unsafe { (*(self.byte_ptr(offset) as *const AtomicU16)).load(Ordering::SeqCst) }
    }

    #[inline]
    pub(crate) fn store_u16(&self, offset: Size, value: u16) {
        debug_assert!(offset % 2 == 0 && offset + 2 <= self.data.len);
        unsafe { (*(self.byte_ptr(offset) as *const AtomicU16)).store(value, Ordering::SeqCst) }
    }

    /// Atomic 32-bit load at a 4-aligned offset
    #[inline]
    pub(crate) fn load_u32(&self, offset: Size) -> u32 {
        debug_assert!(offset % 4 == 0 && offset + 4 <= self.data.len);
        unsafe { (*(self.byte_ptr(offset) as *const AtomicU32)).load(Ordering::SeqCst) }
    }

    #[inline]
    pub(crate) fn store_u32(&self, offset: Size, value: u32) {
        debug_assert!(offset % 4 == 0 && offset + 4 <= self.data.len);
        unsafe { (*(self.byte_ptr(offset) as *const AtomicU32)).store(value, Ordering::SeqCst) }
    }

    /// Atomic 64-bit load at an 8-aligned offset
    #[inline]
    pub(crate) fn load_u64(&self, offset: Size) -> u64 {
        debug_assert!(offset % 8 == 0 && offset + 8 <= self.data.len);
        unsafe { (*(self.byte_ptr(offset) as *const AtomicU64)).load(Ordering::SeqCst) }
    }

    #[inline]
    pub(crate) fn store_u64(&self, offset: Size, value: u64) {
        debug_assert!(offset % 8 == 0 && offset + 8 <= self.data.len);
        unsafe { (*(self.byte_ptr(offset) as *const AtomicU64)).store(value, Ordering::SeqCst) }
    }

    /// Bulk byte write (per-byte atomicity only)
    pub fn write_bytes(&self, offset: Size, data: &[u8]) -> WaitqResult<()> {
        offset
            .checked_add(data.len())
            .filter(|end| *end <= self.data.len)
            .ok_or(WaitError::InvalidRange {
                offset,
                size: data.len(),
                block_size: self.data.len,
            })?;
        for (i, byte) in data.iter().enumerate() {
            self.store_u8(offset + i, *byte);
        }
        Ok(())
    }

    /// Bulk byte read (per-byte atomicity only)
    pub fn read_bytes(&self, offset: Size, size: Size) -> WaitqResult<Vec<u8>> {
        offset
            .checked_add(size)
            .filter(|end| *end <= self.data.len)
            .ok_or(WaitError::InvalidRange {
                offset,
                size,
                block_size: self.data.len,
            })?;
        Ok((0..size).map(|i| self.load_u8(offset + i)).collect())
    }
}

impl Clone for SharedBlock {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl std::fmt::Debug for SharedBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBlock")
            .field("id", &self.data.id)
            .field("len", &self.data.len)
            .field("shared", &self.data.shared)
            .finish()
    }
}
