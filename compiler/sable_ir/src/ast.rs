//! Statement identifiers and blocks for the flat stylesheet AST.
//!
//! The parser owns the statement arena; everything downstream refers to
//! statements by `StmtId`. The evaluator's scoping core threads [`Block`]s
//! around opaquely (content captures, callable bodies) without interpreting
//! them.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Index into the statement arena.
///
/// - Memory: 4 bytes (vs 8 bytes for a box)
/// - Equality: O(1) integer compare
/// - Cache locality: indices into a contiguous array
#[derive(Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct StmtId(u32);

impl StmtId {
    /// Invalid statement ID (sentinel value).
    pub const INVALID: StmtId = StmtId(u32::MAX);

    /// Create a new `StmtId`.
    #[inline]
    pub const fn new(index: u32) -> Self {
        StmtId(index)
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if this is a valid ID.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Hash for StmtId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "StmtId({})", self.0)
        } else {
            write!(f, "StmtId(INVALID)")
        }
    }
}

/// A parsed block of statements.
///
/// The unit captured by `@content` and stored as a callable body. Wrapped
/// in `Rc` by the evaluator so captures share rather than copy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    /// Child statements, in source order.
    pub stmts: Vec<StmtId>,
}

impl Block {
    /// Create a block from its child statements.
    pub fn new(stmts: Vec<StmtId>) -> Self {
        Block { stmts }
    }

    /// Number of child statements.
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    /// Whether the block has no statements.
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stmt_id_roundtrips() {
        let id = StmtId::new(17);
        assert_eq!(id.index(), 17);
        assert!(id.is_valid());
        assert!(!StmtId::INVALID.is_valid());
    }

    #[test]
    fn block_len() {
        let block = Block::new(vec![StmtId::new(0), StmtId::new(1)]);
        assert_eq!(block.len(), 2);
        assert!(!block.is_empty());
        assert!(Block::default().is_empty());
    }
}
