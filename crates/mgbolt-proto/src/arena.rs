//! Bump allocator backing one inbound message's decoded values.
//!
//! Decoding a message allocates strings, list/map backing storage, and
//! struct fields out of a single [`Arena`] rather than the global allocator.
//! The arena is reset (not dropped and rebuilt) between messages, so steady
//! state traffic does not pay a per-object free.

use bumpalo::Bump;
use bumpalo::collections::Vec as ArenaVec;

/// Owns the bump-allocated backing storage for one decoded message.
///
/// `Arena` wraps [`bumpalo::Bump`] rather than a hand-rolled block list: both
/// give amortized O(1) allocation and whole-arena reset, but `Bump` does so
/// without any `unsafe` in this crate.
pub struct Arena {
    bump: Bump,
}

impl Default for Arena {
    /// Equivalent to [`Arena::new`]: a fresh `DEFAULT_BLOCK_SIZE` head
    /// block, not `bumpalo::Bump`'s own lazy, zero-capacity default.
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// Size of the head block a fresh or just-reset arena retains: large
    /// enough that a typical single result row decodes without the bump
    /// allocator reaching for a second block.
    pub const DEFAULT_BLOCK_SIZE: usize = 128 * 1024;

    /// Creates an arena with one `DEFAULT_BLOCK_SIZE` head block
    /// pre-allocated, matching the "typical result row causes zero
    /// allocator traffic" property `reset` is meant to preserve between
    /// messages.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_BLOCK_SIZE)
    }

    /// Creates an arena with an initial chunk sized to hold roughly
    /// `bytes` worth of allocations before growing.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Bump::with_capacity(bytes),
        }
    }

    /// Copies `s` into the arena and returns a reference with the arena's
    /// lifetime.
    pub fn alloc_str<'a>(&'a self, s: &str) -> &'a str {
        self.bump.alloc_str(s)
    }

    /// Allocates an arena-backed vector, used for list and struct field
    /// storage during decode.
    pub fn alloc_vec<'a, T>(&'a self, capacity: usize) -> ArenaVec<'a, T> {
        ArenaVec::with_capacity_in(capacity, &self.bump)
    }

    /// Copies raw bytes into the arena, used for uninterpreted byte arrays.
    pub fn alloc_bytes<'a>(&'a self, bytes: &[u8]) -> &'a [u8] {
        self.bump.alloc_slice_copy(bytes)
    }

    /// Total bytes currently reserved across all chunks, allocated or not.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Releases every allocation made since the arena was created or last
    /// reset, leaving a single empty `DEFAULT_BLOCK_SIZE` head block behind
    /// regardless of how large the arena grew in the meantime. Existing
    /// `&'a` references into the arena must not outlive this call; the
    /// borrow checker enforces this because `reset` takes `&mut self`.
    ///
    /// `bumpalo::Bump::reset` alone would instead retain whatever chunk was
    /// most recently allocated, which can be far larger than
    /// `DEFAULT_BLOCK_SIZE` after a single oversized message; rebuilding the
    /// allocator is what gives the "exactly one standard block after reset"
    /// property callers can rely on between messages.
    pub fn reset(&mut self) {
        self.bump = Bump::with_capacity(Self::DEFAULT_BLOCK_SIZE);
    }
}

#[cfg(test)]
mod tests {
    use super::Arena;

    #[test]
    fn alloc_str_round_trips() {
        let arena = Arena::new();
        let s = arena.alloc_str("hello");
        assert_eq!(s, "hello");
    }

    #[test]
    fn reset_reclaims_capacity_without_dangling_access() {
        let mut arena = Arena::new();
        {
            let s = arena.alloc_str("scoped");
            assert_eq!(s, "scoped");
        }
        arena.reset();
        let s2 = arena.alloc_str("after reset");
        assert_eq!(s2, "after reset");
    }

    #[test]
    fn alloc_vec_holds_requested_items() {
        let arena = Arena::new();
        let mut v = arena.alloc_vec::<i64>(4);
        v.push(1);
        v.push(2);
        assert_eq!(v.as_slice(), &[1, 2]);
    }

    #[test]
    fn reset_shrinks_footprint_back_to_one_standard_block() {
        let mut arena = Arena::new();
        let baseline = arena.allocated_bytes();

        // Force at least one extra chunk, then release it all.
        let big = arena.alloc_bytes(&vec![0_u8; Arena::DEFAULT_BLOCK_SIZE * 4]);
        assert_eq!(big.len(), Arena::DEFAULT_BLOCK_SIZE * 4);
        assert!(arena.allocated_bytes() > baseline);

        arena.reset();
        assert_eq!(arena.allocated_bytes(), baseline);

        // A subsequent allocation within one block's worth of space must
        // not grow the arena further.
        let s = arena.alloc_str("after reset, one block is enough");
        assert_eq!(arena.allocated_bytes(), baseline);
        assert_eq!(s, "after reset, one block is enough");
    }
}
