//! Shared transposition cache.
//!
//! The default implementation is lock-free: every slot is two `AtomicU64`
//! words, `key ^ data` followed by `data`. A reader recomputes the key from
//! both words and drops the entry on mismatch, so a torn write from a
//! concurrent store reads as a miss instead of a corrupt entry.
//!
//! Data word layout:
//!   bits  0-15: packed best move (0 = none)
//!   bits 16-47: score (i32)
//!   bits 48-55: depth (u8, `EXACT_DEPTH` for subtrees searched to the horizon)
//!   bits 56-57: bound (0 = exact, 1 = lower, 2 = upper)
//!   bit     63: always set, distinguishes a used slot from an empty one

use engine_core::Move;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stored depth for values that no deeper search can change.
pub const EXACT_DEPTH: u8 = u8::MAX;

const SENTINEL: u64 = 1 << 63;
const SLOTS_PER_BUCKET: usize = 2;
const WORDS_PER_SLOT: usize = 2;
const BUCKET_BYTES: usize = SLOTS_PER_BUCKET * WORDS_PER_SLOT * std::mem::size_of::<u64>();
const MIN_BUCKETS: usize = 1 << 10;

/// How a stored score relates to the true value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// True value is at least the score (fail high).
    Lower,
    /// True value is at most the score (fail low).
    Upper,
}

impl Bound {
    fn bits(self) -> u64 {
        match self {
            Bound::Exact => 0,
            Bound::Lower => 1,
            Bound::Upper => 2,
        }
    }

    fn from_bits(bits: u64) -> Option<Bound> {
        match bits {
            0 => Some(Bound::Exact),
            1 => Some(Bound::Lower),
            2 => Some(Bound::Upper),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    pub depth: u8,
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Move>,
}

/// Result of [`TranspositionCache::probe_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtHit {
    pub entry: TtEntry,
    /// Score usable as the node value without searching, if the entry is
    /// deep enough and its bound settles the window.
    pub cutoff: Option<i32>,
}

/// A cache of searched positions keyed by 64-bit hash.
///
/// Implementations must tolerate concurrent use from several searches.
/// Lost or overwritten entries are acceptable; returning an entry stored
/// under another key is not.
pub trait TranspositionCache: Send + Sync {
    fn probe(&self, key: u64) -> Option<TtEntry>;

    fn store(&self, key: u64, entry: TtEntry);

    fn clear(&self);

    /// Probe and decide whether the entry cuts off a search of `depth`
    /// plies in the window `(alpha, beta)`.
    fn probe_window(&self, key: u64, depth: u8, alpha: i32, beta: i32) -> Option<TtHit> {
        let entry = self.probe(key)?;
        let cutoff = if entry.depth >= depth {
            match entry.bound {
                Bound::Exact => Some(entry.score),
                Bound::Lower if entry.score >= beta => Some(entry.score),
                Bound::Upper if entry.score <= alpha => Some(entry.score),
                _ => None,
            }
        } else {
            None
        };
        Some(TtHit { entry, cutoff })
    }
}

/// Lock-free two-way bucketed table.
///
/// Slot 0 of a bucket keeps the deepest entry, slot 1 always takes the
/// newest entry that slot 0 refused.
pub struct TranspositionTable {
    words: Vec<AtomicU64>,
    mask: usize,
    size_mb: usize,
}

impl TranspositionTable {
    /// Table sized to at most `size_mb` megabytes, rounded down to a power of
    /// two number of buckets.
    pub fn new(size_mb: usize) -> Self {
        let bytes = size_mb.saturating_mul(1024 * 1024);
        let wanted = (bytes / BUCKET_BYTES).max(MIN_BUCKETS);
        let buckets = 1usize << (usize::BITS - 1 - wanted.leading_zeros());
        let words = (0..buckets * SLOTS_PER_BUCKET * WORDS_PER_SLOT)
            .map(|_| AtomicU64::new(0))
            .collect();
        Self {
            words,
            mask: buckets - 1,
            size_mb,
        }
    }

    /// The budget this table was built for.
    pub fn size_mb(&self) -> usize {
        self.size_mb
    }

    /// Number of entry slots.
    pub fn capacity(&self) -> usize {
        self.words.len() / WORDS_PER_SLOT
    }

    /// Occupied slots among the first thousand, in permille.
    pub fn hashfull(&self) -> usize {
        let sample = self.capacity().min(1000);
        let used = (0..sample)
            .filter(|&slot| self.words[slot * WORDS_PER_SLOT + 1].load(Ordering::Relaxed) != 0)
            .count();
        used * 1000 / sample.max(1)
    }

    #[inline]
    fn slot_base(&self, key: u64, slot: usize) -> usize {
        let bucket = (key as usize) & self.mask;
        (bucket * SLOTS_PER_BUCKET + slot) * WORDS_PER_SLOT
    }

    #[inline]
    fn load(&self, base: usize) -> (u64, u64) {
        let data = self.words[base + 1].load(Ordering::Relaxed);
        let check = self.words[base].load(Ordering::Relaxed);
        (check ^ data, data)
    }

    #[inline]
    fn write(&self, base: usize, key: u64, data: u64) {
        self.words[base].store(key ^ data, Ordering::Relaxed);
        self.words[base + 1].store(data, Ordering::Relaxed);
    }

    fn pack(entry: &TtEntry) -> u64 {
        let mv = entry.best_move.map_or(0, Move::pack) as u64;
        let score = entry.score as u32 as u64;
        SENTINEL
            | mv
            | (score << 16)
            | ((entry.depth as u64) << 48)
            | (entry.bound.bits() << 56)
    }

    fn unpack(data: u64) -> Option<TtEntry> {
        if data & SENTINEL == 0 {
            return None;
        }
        Some(TtEntry {
            best_move: Move::unpack((data & 0xFFFF) as u16),
            score: ((data >> 16) & 0xFFFF_FFFF) as u32 as i32,
            depth: ((data >> 48) & 0xFF) as u8,
            bound: Bound::from_bits((data >> 56) & 0x3)?,
        })
    }
}

impl TranspositionCache for TranspositionTable {
    fn probe(&self, key: u64) -> Option<TtEntry> {
        (0..SLOTS_PER_BUCKET).find_map(|slot| {
            let (stored_key, data) = self.load(self.slot_base(key, slot));
            if data != 0 && stored_key == key {
                Self::unpack(data)
            } else {
                None
            }
        })
    }

    fn store(&self, key: u64, entry: TtEntry) {
        let data = Self::pack(&entry);
        let deep = self.slot_base(key, 0);
        let (deep_key, deep_data) = self.load(deep);
        let replace_deep = deep_data == 0
            || deep_key == key
            || Self::unpack(deep_data).map_or(true, |old| entry.depth >= old.depth);
        if replace_deep {
            self.write(deep, key, data);
        } else {
            self.write(self.slot_base(key, 1), key, data);
        }
    }

    fn clear(&self) {
        for word in &self.words {
            word.store(0, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{Color, DraftSource, Placement};
    use std::sync::Arc;
    use std::thread;

    fn entry(depth: u8, score: i32, bound: Bound) -> TtEntry {
        TtEntry {
            depth,
            score,
            bound,
            best_move: Some(Move::new(DraftSource::Center, Color::Red, Placement::Row(2))),
        }
    }

    #[test]
    fn test_store_and_probe() {
        let tt = TranspositionTable::new(1);
        let stored = entry(4, -1234, Bound::Lower);
        tt.store(42, stored);
        assert_eq!(tt.probe(42), Some(stored));
        assert_eq!(tt.probe(43), None);
    }

    #[test]
    fn test_negative_scores_and_no_move_survive_packing() {
        let tt = TranspositionTable::new(1);
        let stored = TtEntry {
            depth: EXACT_DEPTH,
            score: i32::MIN + 1,
            bound: Bound::Upper,
            best_move: None,
        };
        tt.store(7, stored);
        assert_eq!(tt.probe(7), Some(stored));
    }

    #[test]
    fn test_colliding_keys_share_a_bucket() {
        let tt = TranspositionTable::new(1);
        let stride = (tt.mask as u64) + 1;
        tt.store(5, entry(6, 1, Bound::Exact));
        // Shallower entry for another key in the same bucket goes to slot 1.
        tt.store(5 + stride, entry(2, 2, Bound::Exact));
        assert_eq!(tt.probe(5).map(|e| e.score), Some(1));
        assert_eq!(tt.probe(5 + stride).map(|e| e.score), Some(2));

        // A deeper entry takes slot 0.
        tt.store(5 + 2 * stride, entry(8, 3, Bound::Exact));
        assert_eq!(tt.probe(5), None);
        assert_eq!(tt.probe(5 + 2 * stride).map(|e| e.score), Some(3));
    }

    #[test]
    fn test_probe_window_cutoffs() {
        let tt = TranspositionTable::new(1);
        tt.store(1, entry(3, 50, Bound::Lower));
        tt.store(2, entry(3, 50, Bound::Upper));
        tt.store(3, entry(3, 50, Bound::Exact));

        assert_eq!(tt.probe_window(1, 3, 0, 40).and_then(|h| h.cutoff), Some(50));
        assert_eq!(tt.probe_window(1, 3, 0, 60).and_then(|h| h.cutoff), None);
        assert_eq!(tt.probe_window(2, 3, 60, 100).and_then(|h| h.cutoff), Some(50));
        assert_eq!(tt.probe_window(2, 3, 0, 100).and_then(|h| h.cutoff), None);
        assert_eq!(tt.probe_window(3, 2, 0, 100).and_then(|h| h.cutoff), Some(50));

        // Too shallow: no cutoff but the move is still offered.
        let hit = tt.probe_window(3, 4, 0, 100).unwrap();
        assert_eq!(hit.cutoff, None);
        assert!(hit.entry.best_move.is_some());
    }

    #[test]
    fn test_clear() {
        let tt = TranspositionTable::new(1);
        tt.store(9, entry(1, 1, Bound::Exact));
        assert!(tt.hashfull() <= 1000);
        tt.clear();
        assert_eq!(tt.probe(9), None);
    }

    #[test]
    fn test_concurrent_stores_never_return_foreign_entries() {
        let tt = Arc::new(TranspositionTable::new(1));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let tt = Arc::clone(&tt);
                thread::spawn(move || {
                    for i in 0..20_000u64 {
                        let key = i.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ t;
                        tt.store(key, entry((i % 8) as u8, (key % 1000) as i32, Bound::Exact));
                        if let Some(found) = tt.probe(key) {
                            assert_eq!(found.score, (key % 1000) as i32);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
