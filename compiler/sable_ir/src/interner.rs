//! Sharded string interner for identifier storage.
//!
//! One interner lives for the whole compile pass; the lexer, the evaluator,
//! and the environment graph all hold the same [`SharedInterner`] handle, so
//! an identifier interned anywhere is comparable everywhere by `Name`.

// Arc is needed here for SharedInterner - one interner is shared by every
// compiler phase of a compile pass.
#![expect(
    clippy::disallowed_types,
    reason = "Arc required for SharedInterner sharing across phases"
)]

use super::Name;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-shard storage for interned strings.
struct InternShard {
    /// Map from string content to local index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents.
    strings: Vec<&'static str>,
}

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// Shard exceeded capacity.
    ShardOverflow { shard_idx: usize, count: usize },
}

impl std::fmt::Display for InternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternError::ShardOverflow { shard_idx, count } => write!(
                f,
                "interner shard {shard_idx} exceeded capacity: {count} strings, max is {}",
                Name::MAX_LOCAL
            ),
        }
    }
}

impl std::error::Error for InternError {}

impl InternShard {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        }
    }

    fn with_empty() -> Self {
        let mut shard = Self::new();
        // Pre-intern empty string at index 0
        let empty: &'static str = "";
        shard.map.insert(empty, 0);
        shard.strings.push(empty);
        shard
    }
}

/// Sharded string interner.
///
/// Provides O(1) lookup and equality comparison for interned strings.
/// Uses an `RwLock` per shard so a shared handle can be cloned into any
/// phase without further coordination.
pub struct StringInterner {
    shards: [RwLock<InternShard>; Name::NUM_SHARDS],
    /// Total count of interned strings across all shards (O(1) `len()`).
    total_count: AtomicUsize,
}

impl StringInterner {
    /// Create a new interner with pre-interned stylesheet identifiers.
    pub fn new() -> Self {
        let shards = std::array::from_fn(|i| {
            if i == 0 {
                RwLock::new(InternShard::with_empty())
            } else {
                RwLock::new(InternShard::new())
            }
        });

        // Start with 1 for the empty string pre-interned in shard 0
        let interner = Self {
            shards,
            total_count: AtomicUsize::new(1),
        };
        interner.pre_intern_identifiers();
        interner
    }

    /// Compute shard for a string based on its hash.
    #[inline]
    fn shard_for(s: &str) -> usize {
        let mut hash = 0u32;
        for byte in s.bytes().take(8) {
            hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
        }
        (hash as usize) % Name::NUM_SHARDS
    }

    /// Try to intern a string, returning its Name or an error on overflow.
    #[inline]
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        let shard_idx = Self::shard_for(s);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shard_idx is bounded by NUM_SHARDS (16)"
        )]
        let shard_idx_u32 = shard_idx as u32;
        let shard = &self.shards[shard_idx];

        // Fast path: check if already interned
        {
            let guard = shard.read();
            if let Some(&local) = guard.map.get(s) {
                return Ok(Name::new(shard_idx_u32, local));
            }
        }

        // Slow path: need to insert
        let mut guard = shard.write();

        // Double-check after acquiring write lock
        if let Some(&local) = guard.map.get(s) {
            return Ok(Name::new(shard_idx_u32, local));
        }

        // Leak the string to get 'static lifetime
        let owned: String = s.to_owned();
        let leaked: &'static str = Box::leak(owned.into_boxed_str());

        let local = u32::try_from(guard.strings.len()).map_err(|_| InternError::ShardOverflow {
            shard_idx,
            count: guard.strings.len(),
        })?;
        guard.strings.push(leaked);
        guard.map.insert(leaked, local);

        self.total_count.fetch_add(1, Ordering::Relaxed);

        Ok(Name::new(shard_idx_u32, local))
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if the interner exceeds capacity. Use `try_intern` for
    /// fallible interning.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Try to intern an owned String, avoiding the extra allocation that
    /// `try_intern(&s)` would perform.
    pub fn try_intern_owned(&self, s: String) -> Result<Name, InternError> {
        let shard_idx = Self::shard_for(&s);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shard_idx is bounded by NUM_SHARDS (16)"
        )]
        let shard_idx_u32 = shard_idx as u32;
        let shard = &self.shards[shard_idx];

        // Fast path: check if already interned
        {
            let guard = shard.read();
            if let Some(&local) = guard.map.get(s.as_str()) {
                return Ok(Name::new(shard_idx_u32, local));
            }
        }

        // Slow path: need to insert
        let mut guard = shard.write();

        // Double-check after acquiring write lock
        if let Some(&local) = guard.map.get(s.as_str()) {
            return Ok(Name::new(shard_idx_u32, local));
        }

        // Leak the owned string directly (no extra allocation)
        let leaked: &'static str = Box::leak(s.into_boxed_str());

        let local = u32::try_from(guard.strings.len()).map_err(|_| InternError::ShardOverflow {
            shard_idx,
            count: guard.strings.len(),
        })?;
        guard.strings.push(leaked);
        guard.map.insert(leaked, local);

        self.total_count.fetch_add(1, Ordering::Relaxed);

        Ok(Name::new(shard_idx_u32, local))
    }

    /// Intern an owned String, avoiding double allocation.
    ///
    /// Useful when the caller has already built a normalized spelling of an
    /// identifier and has no further use for the String.
    ///
    /// # Panics
    /// Panics if the interner exceeds capacity. Use `try_intern_owned` for
    /// fallible interning.
    pub fn intern_owned(&self, s: String) -> Name {
        self.try_intern_owned(s).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Look up the string for a Name.
    pub fn lookup(&self, name: Name) -> &str {
        let shard = &self.shards[name.shard()];
        let guard = shard.read();
        guard.strings[name.local()]
    }

    /// Look up the string for a Name, returning a `'static` reference.
    ///
    /// Safe because interned strings are leaked and never deallocated.
    pub fn lookup_static(&self, name: Name) -> &'static str {
        let shard = &self.shards[name.shard()];
        let guard = shard.read();
        guard.strings[name.local()]
    }

    /// Pre-intern SassScript keywords and common stylesheet identifiers.
    fn pre_intern_identifiers(&self) {
        const IDENTIFIERS: &[&str] = &[
            // Script keywords
            "and",
            "or",
            "not",
            "true",
            "false",
            "null",
            "if",
            "else",
            "each",
            "for",
            "from",
            "through",
            "to",
            "in",
            "while",
            "return",
            "default",
            "global",
            "important",
            // Common units
            "px",
            "em",
            "rem",
            "ex",
            "ch",
            "vw",
            "vh",
            "cm",
            "mm",
            "pt",
            "pc",
            "deg",
            "rad",
            "grad",
            "turn",
            "s",
            "ms",
            "%",
            // Common built-in function names
            "rgb",
            "rgba",
            "hsl",
            "hsla",
            "lighten",
            "darken",
            "mix",
            "nth",
            "length",
            "unit",
            "unitless",
            "quote",
            "unquote",
            "percentage",
            "type-of",
            "if-function",
        ];

        for ident in IDENTIFIERS {
            self.intern(ident);
        }
    }

    /// Get the number of interned strings (O(1)).
    pub fn len(&self) -> usize {
        self.total_count.load(Ordering::Relaxed)
    }

    /// Check if the interner is empty (only has the empty string).
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for looking up interned string names.
///
/// Lets higher-level crates accept any lookup implementor without depending
/// directly on `StringInterner`.
pub trait StringLookup {
    /// Look up the string for an interned name.
    fn lookup(&self, name: Name) -> &str;
}

impl StringLookup for StringInterner {
    fn lookup(&self, name: Name) -> &str {
        StringInterner::lookup(self, name)
    }
}

/// Shared interner handle for a compile pass.
///
/// This newtype enforces that all interner sharing goes through this type,
/// preventing accidental direct `Arc<StringInterner>` usage.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    /// Create a new shared interner.
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
