//! Block bump allocator for the payloads of tape nodes.
//!
//! An [`Arena`] hands out contiguous runs of `T` carved from a list of
//! fixed-capacity blocks. Individual allocations are never freed: memory is
//! reclaimed only in bulk, either back to a [`ArenaMark`] (nested scopes) or
//! entirely ([`Arena::recover_all`]). Recovered blocks are retained, so
//! repeated gradient evaluations reuse the same memory instead of going back
//! to the system allocator.
//!
//! ```text
//! blocks[0]  [#########-----]   capacity 16
//! blocks[1]  [######--------------------]   capacity 32 (growth x2)
//!                  ^ cursor (current = 1)
//! ```
//!
//! Allocations are addressed by [`ArenaSlice`] handles (block, start, len)
//! rather than references, so the arena can be mutated while handles are
//! alive. A block is never grown in place; its address is stable until
//! [`Arena::free_all`].

use std::fmt;
use std::marker::PhantomData;

/// Block size policy for an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Number of elements in the first block.
    pub initial_block_size: usize,
    /// Each new block is this many times larger than the previous one.
    pub growth_factor: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_block_size: 1 << 16,
            growth_factor: 2,
        }
    }
}

/// Allocation cursor checkpoint, see [`Arena::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaMark {
    block: usize,
    offset: usize,
}

/// Handle to a contiguous run of elements inside an [`Arena`].
pub struct ArenaSlice<T> {
    block: usize,
    start: usize,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArenaSlice<T> {
    fn new(block: usize, start: usize, len: usize) -> Self {
        Self {
            block,
            start,
            len,
            _marker: PhantomData,
        }
    }

    /// The empty slice; valid in every arena.
    pub fn empty() -> Self {
        Self::new(0, 0, 0)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the slice is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// Manual impls: deriving would put bounds on `T`.
impl<T> Clone for ArenaSlice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaSlice<T> {}

impl<T> PartialEq for ArenaSlice<T> {
    fn eq(&self, other: &Self) -> bool {
        self.block == other.block && self.start == other.start && self.len == other.len
    }
}

impl<T> fmt::Debug for ArenaSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaSlice")
            .field("block", &self.block)
            .field("start", &self.start)
            .field("len", &self.len)
            .finish()
    }
}

/// Bump allocator over a growing list of fixed-capacity blocks.
///
/// Invariant: every block after `current` is empty.
pub struct Arena<T> {
    blocks: Vec<Vec<T>>,
    current: usize,
    config: ArenaConfig,
}

impl<T: Copy> Arena<T> {
    /// Create an arena with the default block policy.
    ///
    /// No memory is requested until the first allocation.
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    /// Create an arena with an explicit block policy.
    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            blocks: Vec::new(),
            current: 0,
            config: ArenaConfig {
                initial_block_size: config.initial_block_size.max(1),
                growth_factor: config.growth_factor.max(1),
            },
        }
    }

    /// Copy `items` into the arena and return a handle to the copy.
    pub fn alloc(&mut self, items: &[T]) -> ArenaSlice<T> {
        if items.is_empty() {
            return ArenaSlice::empty();
        }
        let block = self.reserve(items.len());
        let buf = &mut self.blocks[block];
        let start = buf.len();
        // Capacity was checked by `reserve`, so this never reallocates.
        buf.extend_from_slice(items);
        ArenaSlice::new(block, start, items.len())
    }

    /// Read the elements behind a handle.
    ///
    /// A handle that outlived a recovery of its memory reads as empty.
    pub fn get(&self, slice: ArenaSlice<T>) -> &[T] {
        if slice.is_empty() {
            return &[];
        }
        self.blocks
            .get(slice.block)
            .and_then(|buf| buf.get(slice.start..slice.start + slice.len))
            .unwrap_or(&[])
    }

    /// Record the current cursor position.
    pub fn mark(&self) -> ArenaMark {
        ArenaMark {
            block: self.current,
            offset: self.blocks.get(self.current).map_or(0, Vec::len),
        }
    }

    /// Roll the cursor back to `mark`, discarding everything allocated since.
    ///
    /// Marks must be recovered most-recent first.
    pub fn recover_to(&mut self, mark: ArenaMark) {
        if let Some(later) = self.blocks.get_mut(mark.block + 1..) {
            for buf in later {
                buf.clear();
            }
        }
        if let Some(buf) = self.blocks.get_mut(mark.block) {
            buf.truncate(mark.offset);
        }
        self.current = mark.block;
    }

    /// Reset the cursor to the start of the first block, keeping all blocks.
    pub fn recover_all(&mut self) {
        self.recover_to(ArenaMark::default());
    }

    /// Release every block back to the system allocator.
    pub fn free_all(&mut self) {
        self.blocks = Vec::new();
        self.current = 0;
    }

    /// Number of elements currently allocated.
    pub fn used(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    /// Number of elements the retained blocks can hold.
    pub fn capacity(&self) -> usize {
        self.blocks.iter().map(Vec::capacity).sum()
    }

    /// Number of retained blocks.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Block policy of this arena.
    pub fn config(&self) -> ArenaConfig {
        self.config
    }

    /// Make sure the block at `current` has room for `n` more elements and
    /// return its index.
    fn reserve(&mut self, n: usize) -> usize {
        if let Some(buf) = self.blocks.get(self.current) {
            if buf.capacity() - buf.len() >= n {
                return self.current;
            }
            if !buf.is_empty() {
                self.current += 1;
            }
        }

        let size = self.next_block_size(n);
        match self.blocks.get_mut(self.current) {
            Some(buf) if buf.capacity() >= n => {}
            // Retained but too small; it is empty, so replacing it loses nothing.
            Some(buf) => *buf = Vec::with_capacity(size),
            None => self.blocks.push(Vec::with_capacity(size)),
        }
        self.current
    }

    fn next_block_size(&self, n: usize) -> usize {
        let base = match self.blocks.last() {
            Some(last) => last.capacity().saturating_mul(self.config.growth_factor),
            None => self.config.initial_block_size,
        };
        base.max(n)
    }
}

impl<T: Copy> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("num_blocks", &self.blocks.len())
            .field("current", &self.current)
            .field("used", &self.blocks.iter().map(Vec::len).sum::<usize>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Arena<u64> {
        Arena::with_config(ArenaConfig {
            initial_block_size: 4,
            growth_factor: 2,
        })
    }

    #[test]
    fn test_alloc_and_get() {
        let mut arena = small();
        let a = arena.alloc(&[1, 2, 3]);
        let b = arena.alloc(&[4]);

        assert_eq!(arena.get(a), &[1, 2, 3]);
        assert_eq!(arena.get(b), &[4]);
        assert_eq!(arena.used(), 4);
        assert_eq!(arena.num_blocks(), 1);
    }

    #[test]
    fn test_empty_alloc_allocates_nothing() {
        let mut arena = small();
        let s = arena.alloc(&[]);
        assert!(s.is_empty());
        assert_eq!(arena.get(s), &[] as &[u64]);
        assert_eq!(arena.num_blocks(), 0);
    }

    #[test]
    fn test_growth_opens_new_block() {
        let mut arena = small();
        let a = arena.alloc(&[1, 2, 3]);
        // Does not fit in the remaining slot of block 0.
        let b = arena.alloc(&[4, 5]);

        assert_eq!(arena.num_blocks(), 2);
        assert!(arena.capacity() >= 4 + 8);
        assert_eq!(arena.get(a), &[1, 2, 3]);
        assert_eq!(arena.get(b), &[4, 5]);
    }

    #[test]
    fn test_oversized_alloc() {
        let mut arena = small();
        let big: Vec<u64> = (0..100).collect();
        let s = arena.alloc(&big);
        assert_eq!(arena.get(s), big.as_slice());
    }

    #[test]
    fn test_blocks_are_not_moved() {
        let mut arena = small();
        let a = arena.alloc(&[7, 8]);
        let ptr = arena.get(a).as_ptr();
        for i in 0..50 {
            arena.alloc(&[i, i + 1, i + 2]);
        }
        assert_eq!(arena.get(a).as_ptr(), ptr);
    }

    #[test]
    fn test_recover_all_retains_blocks() {
        let mut arena = small();
        for i in 0..20 {
            arena.alloc(&[i, i]);
        }
        let blocks = arena.num_blocks();
        let capacity = arena.capacity();

        arena.recover_all();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.num_blocks(), blocks);
        assert_eq!(arena.capacity(), capacity);

        // Same allocation pattern fits in the retained blocks.
        for i in 0..20 {
            arena.alloc(&[i, i]);
        }
        assert_eq!(arena.num_blocks(), blocks);
        assert_eq!(arena.capacity(), capacity);
    }

    #[test]
    fn test_mark_and_recover_to() {
        let mut arena = small();
        let outer = arena.alloc(&[1, 2]);
        let mark = arena.mark();

        let inner = arena.alloc(&[3, 4, 5, 6, 7]);
        assert_eq!(arena.get(inner), &[3, 4, 5, 6, 7]);

        arena.recover_to(mark);
        assert_eq!(arena.used(), 2);
        assert_eq!(arena.get(outer), &[1, 2]);

        let again = arena.alloc(&[9]);
        assert_eq!(arena.get(again), &[9]);
        assert_eq!(arena.get(outer), &[1, 2]);
    }

    #[test]
    fn test_stale_slice_reads_empty() {
        let mut arena = small();
        let s = arena.alloc(&[1, 2, 3]);
        arena.free_all();
        assert!(arena.get(s).is_empty());
        assert_eq!(arena.num_blocks(), 0);
    }
}
