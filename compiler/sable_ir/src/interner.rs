//! Sharded, permanent string interner.
//!
//! Symbols are interned once per process and never freed: the interned
//! text is leaked so lookups hand out `&'static str`. Reserved symbols are
//! pre-interned and tagged with their [`Keyword`] group.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{Keyword, Name};

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
    /// Shard exceeded the local index space.
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
        let empty: &'static str = "";
        shard.map.insert(empty, 0);
        shard.strings.push(empty);
        shard
    }
}

/// Sharded string interner.
///
/// # Thread Safety
/// Uses `RwLock` per shard, so the process-wide instance returned by
/// [`interner`] can be shared freely.
pub struct StringInterner {
    shards: [RwLock<InternShard>; Name::NUM_SHARDS],
    /// Total count of interned strings across all shards (O(1) `len()`).
    total_count: AtomicUsize,
    /// Keyword tags, filled once at construction and read-only afterwards.
    keywords: FxHashMap<Name, Keyword>,
}

impl StringInterner {
    /// Create a new interner with the reserved symbols pre-interned.
    pub fn new() -> Self {
        let shards = std::array::from_fn(|i| {
            if i == 0 {
                RwLock::new(InternShard::with_empty())
            } else {
                RwLock::new(InternShard::new())
            }
        });

        let mut interner = Self {
            shards,
            total_count: AtomicUsize::new(1),
            keywords: FxHashMap::default(),
        };
        let keywords = Keyword::ALL
            .iter()
            .map(|&kw| (interner.intern(kw.as_str()), kw))
            .collect();
        interner.keywords = keywords;
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
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        let shard_idx = Self::shard_for(s);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "shard_idx is bounded by NUM_SHARDS (16)"
        )]
        let shard_idx_u32 = shard_idx as u32;
        let shard = &self.shards[shard_idx];

        // Fast path: already interned
        {
            let guard = shard.read();
            if let Some(&local) = guard.map.get(s) {
                return Ok(Name::new(shard_idx_u32, local));
            }
        }

        let mut guard = shard.write();

        // Double-check after acquiring write lock
        if let Some(&local) = guard.map.get(s) {
            return Ok(Name::new(shard_idx_u32, local));
        }

        let local = u32::try_from(guard.strings.len())
            .ok()
            .filter(|&local| local <= Name::MAX_LOCAL)
            .ok_or(InternError::ShardOverflow {
                shard_idx,
                count: guard.strings.len(),
            })?;

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        guard.strings.push(leaked);
        guard.map.insert(leaked, local);
        self.total_count.fetch_add(1, Ordering::Relaxed);

        Ok(Name::new(shard_idx_u32, local))
    }

    /// Intern a string, returning its Name.
    ///
    /// # Panics
    /// Panics if a shard exceeds its local index space.
    /// Use `try_intern` for fallible interning.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Look up the string for a Name produced by this interner.
    ///
    /// Unknown names resolve to the empty string.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.try_lookup(name).unwrap_or_default()
    }

    /// Look up the string for a Name, or `None` if this interner never produced it.
    pub fn try_lookup(&self, name: Name) -> Option<&'static str> {
        let guard = self.shards.get(name.shard())?.read();
        guard.strings.get(name.local()).copied()
    }

    /// The keyword group of a reserved symbol.
    #[inline]
    pub fn keyword(&self, name: Name) -> Option<Keyword> {
        self.keywords.get(&name).copied()
    }

    /// The pre-interned symbol for a keyword.
    pub fn keyword_name(&self, keyword: Keyword) -> Name {
        self.intern(keyword.as_str())
    }

    /// Number of interned strings (O(1)).
    pub fn len(&self) -> usize {
        self.total_count.load(Ordering::Relaxed)
    }

    /// Check if the interner holds only the empty string.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide interner.
///
/// Every `Name` that reaches the evaluator comes from here.
pub fn interner() -> &'static StringInterner {
    static GLOBAL: OnceLock<StringInterner> = OnceLock::new();
    GLOBAL.get_or_init(StringInterner::new)
}

/// Intern `s` in the process-wide interner.
#[inline]
pub fn intern(s: &str) -> Name {
    interner().intern(s)
}
