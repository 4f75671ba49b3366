//! The shared transposition table: a bucketed hash map from Zobrist keys
//! to previously searched positions.
//!
//! Each bucket holds three compact entries plus padding, sized so a bucket
//! fills half a cache line. Entries are written without locks; torn reads
//! are tolerated because a reader validates the stored 16-bit key tag
//! before trusting the payload, and the search is statistically robust to
//! the rare mismatch that slips through.
//!
//! Replacement prefers the entry minimizing `depth - 2 * relative_age`, so
//! deep results survive while stale generations are recycled. The
//! generation counter advances by 8 on every new root search, leaving the
//! low three bits of the packed byte for the bound type and PV flag.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::cell::UnsafeCell;
use std::mem;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU8, Ordering};

use crossbeam_utils::thread as crossbeam_thread;

use sable::core::piece_move::Move;
use sable::core::score::{Value, MATE_BOUND, NONE};
use sable::tools::{prefetch_write, PreFetchable};

/// Value used to retrieve and store entries.
pub type Key = u64;

/// Number of entries per bucket.
pub const BUCKET_SIZE: usize = 3;

/// Bit mask of the bound type inside the packed generation byte.
pub const BOUND_MASK: u8 = 0b0000_0011;
/// Bit of the PV flag inside the packed generation byte.
pub const PV_MASK: u8 = 0b0000_0100;
/// Bit mask of the generation inside the packed byte.
pub const GEN_MASK: u8 = 0b1111_1000;
/// The step the generation advances by each new search.
pub const GEN_STEP: u8 = 8;

// Stored depths are offset so a raw depth of zero always means an
// unoccupied entry, while qsearch entries at depth zero remain storable.
const DEPTH_OFFSET: i16 = 8;

const BYTES_PER_MB: usize = 1_000_000;

/// The bound type of a stored value, relative to the search window that
/// produced it.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum NodeBound {
    NoBound = 0,
    LowerBound = 1,
    UpperBound = 2,
    Exact = 3,
}

impl NodeBound {
    #[inline(always)]
    fn from_bits(bits: u8) -> NodeBound {
        unsafe { mem::transmute(bits & BOUND_MASK) }
    }
}

/// A singular entry: the key tag, best move, value, static eval, depth and
/// the packed generation / bound / PV byte. Ten bytes.
#[derive(Copy, Clone)]
#[repr(C)]
pub struct Entry {
    key16: u16,
    best_move: Move,
    value: i16,
    eval: i16,
    depth8: u8,
    gen_bound: u8,
}

impl Entry {
    /// Returns if this entry holds data.
    #[inline(always)]
    pub fn is_occupied(&self) -> bool {
        self.depth8 != 0
    }

    #[inline(always)]
    fn depth(&self) -> i16 {
        i16::from(self.depth8) - DEPTH_OFFSET
    }

    #[inline(always)]
    fn relative_age(&self, generation: u8) -> u8 {
        // The generation wraps; adding a full cycle plus one step before
        // subtracting keeps the masked difference non-negative.
        ((255 + u16::from(GEN_STEP) + u16::from(generation) - u16::from(self.gen_bound))
            & u16::from(GEN_MASK)) as u8
    }

    #[inline(always)]
    fn replace_score(&self, generation: u8) -> i32 {
        i32::from(self.depth8) - 2 * i32::from(self.relative_age(generation))
    }
}

/// The decoded payload of a probe hit.
#[derive(Copy, Clone)]
pub struct TTData {
    pub best_move: Move,
    pub value: Value,
    pub eval: Value,
    pub depth: i16,
    pub bound: NodeBound,
    pub is_pv: bool,
}

impl TTData {
    fn blank() -> TTData {
        TTData {
            best_move: Move::none(),
            value: NONE,
            eval: NONE,
            depth: -DEPTH_OFFSET,
            bound: NodeBound::NoBound,
            is_pv: false,
        }
    }
}

/// Write access to the entry a probe selected, either the matching entry
/// or the chosen replacement victim.
pub struct TTWriter {
    entry: *mut Entry,
    generation: u8,
}

impl TTWriter {
    /// Writes search results into the bound entry.
    ///
    /// Shallow non-exact results never overwrite a deeper result for the
    /// same position, and a missing best move keeps the old one.
    pub fn save(
        &mut self,
        key: Key,
        value: Value,
        is_pv: bool,
        bound: NodeBound,
        depth: i16,
        best_move: Move,
        eval: Value,
    ) {
        let key16 = (key >> 48) as u16;
        let entry = unsafe { &mut *self.entry };

        if best_move != Move::none() || key16 != entry.key16 {
            entry.best_move = best_move;
        }

        if bound != NodeBound::Exact
            && key16 == entry.key16
            && depth < entry.depth() - 2
        {
            return;
        }

        entry.key16 = key16;
        entry.value = value as i16;
        entry.eval = eval as i16;
        entry.depth8 = (depth + DEPTH_OFFSET) as u8;
        entry.gen_bound = self.generation | (u8::from(is_pv) << 2) | bound as u8;
    }
}

/// A bucket of entries mapped to by the same key bits, padded to 32 bytes.
#[repr(C)]
pub struct Bucket {
    entries: [Entry; BUCKET_SIZE],
    padding: [u8; 2],
}

/// A shared-memory transposition table. Keys index into buckets with their
/// low bits and tag entries with their high 16 bits.
pub struct TranspositionTable {
    buckets: UnsafeCell<NonNull<Bucket>>,
    bucket_count: UnsafeCell<usize>,
    generation: AtomicU8,
}

// Mutation happens through raw pointers; coordination across workers is
// intentionally absent (see the module docs).
unsafe impl Send for TranspositionTable {}
unsafe impl Sync for TranspositionTable {}

impl TranspositionTable {
    /// Creates a table with the greatest power-of-two bucket count whose
    /// total size does not exceed `mb_size` megabytes.
    pub fn new(mb_size: usize) -> Self {
        assert!(mb_size > 0);
        TranspositionTable::with_buckets(Self::buckets_for_mb(mb_size))
    }

    fn buckets_for_mb(mb_size: usize) -> usize {
        let max = (mb_size * BYTES_PER_MB) / mem::size_of::<Bucket>();
        let mut count = 1;
        while count * 2 <= max {
            count *= 2;
        }
        count
    }

    fn with_buckets(bucket_count: usize) -> Self {
        assert!(bucket_count.is_power_of_two());
        TranspositionTable {
            buckets: UnsafeCell::new(alloc_buckets(bucket_count)),
            bucket_count: UnsafeCell::new(bucket_count),
            generation: AtomicU8::new(0),
        }
    }

    /// Returns the number of buckets.
    #[inline(always)]
    pub fn bucket_count(&self) -> usize {
        unsafe { *self.bucket_count.get() }
    }

    #[inline(always)]
    fn base_ptr(&self) -> *mut Bucket {
        unsafe { (*self.buckets.get()).as_ptr() }
    }

    /// Returns the number of entries.
    #[inline(always)]
    pub fn entry_count(&self) -> usize {
        self.bucket_count() * BUCKET_SIZE
    }

    /// Returns the allocated size in megabytes.
    pub fn size_megabytes(&self) -> usize {
        (self.bucket_count() * mem::size_of::<Bucket>()) / BYTES_PER_MB
    }

    /// Returns the current generation stamp.
    #[inline(always)]
    pub fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Ages every existing entry by one search: called once per root
    /// search, before the workers start.
    pub fn new_search(&self) {
        self.generation.fetch_add(GEN_STEP, Ordering::Relaxed);
    }

    /// Probes the table for a key.
    ///
    /// If an entry with the key's tag exists, returns whether it holds
    /// data, the decoded data, and a writer bound to that entry. Otherwise
    /// returns `(false, blank, writer)` where the writer is bound to the
    /// bucket's best replacement victim.
    pub fn probe(&self, key: Key) -> (bool, TTData, TTWriter) {
        let key16 = (key >> 48) as u16;
        let generation = self.generation();

        unsafe {
            let bucket: *mut Bucket = self.bucket_ptr(key);
            let first: *mut Entry = (*bucket).entries.as_mut_ptr();

            for i in 0..BUCKET_SIZE {
                let entry_ptr = first.add(i);
                let entry = &mut *entry_ptr;
                if entry.key16 == key16 {
                    let hit = entry.is_occupied();
                    let data = TTData {
                        best_move: entry.best_move,
                        value: Value::from(entry.value),
                        eval: Value::from(entry.eval),
                        depth: entry.depth(),
                        bound: NodeBound::from_bits(entry.gen_bound),
                        is_pv: entry.gen_bound & PV_MASK != 0,
                    };
                    return (
                        hit,
                        data,
                        TTWriter {
                            entry: entry_ptr,
                            generation,
                        },
                    );
                }
            }

            // No tag matched: pick the replacement victim with the worst
            // depth-for-age score.
            let mut victim = first;
            let mut victim_score = (*victim).replace_score(generation);
            for i in 1..BUCKET_SIZE {
                let entry_ptr = first.add(i);
                let score = (*entry_ptr).replace_score(generation);
                if score < victim_score {
                    victim = entry_ptr;
                    victim_score = score;
                }
            }

            (
                false,
                TTData::blank(),
                TTWriter {
                    entry: victim,
                    generation,
                },
            )
        }
    }

    /// Estimates the table's fullness, in permille, by sampling the first
    /// thousand buckets for occupied entries no older than `max_age`
    /// searches.
    pub fn hashfull(&self, max_age: u8) -> u32 {
        let sample = self.bucket_count().min(1000);
        let generation = self.generation();
        let mut used: u32 = 0;
        unsafe {
            for i in 0..sample {
                let bucket = self.base_ptr().add(i);
                for entry in (*bucket).entries.iter() {
                    if entry.is_occupied()
                        && u16::from(entry.relative_age(generation))
                            <= u16::from(max_age) * u16::from(GEN_STEP)
                    {
                        used += 1;
                    }
                }
            }
        }
        (used as u64 * 1000 / (sample as u64 * BUCKET_SIZE as u64)) as u32
    }

    /// Resizes the table to `mb_size` megabytes, dropping all entries.
    /// Returns the actual size allocated. Zero-filling is partitioned
    /// across `threads` helper threads.
    ///
    /// # Safety
    ///
    /// Must not be called while any search is probing the table.
    pub unsafe fn resize(&self, mb_size: usize, threads: usize) -> usize {
        let new_count = Self::buckets_for_mb(mb_size);
        // The new allocation happens first: if it fails, the table keeps
        // its previous size instead of being lost.
        let new_buckets = alloc_buckets(new_count);
        dealloc_buckets(*self.buckets.get(), self.bucket_count());
        *self.buckets.get() = new_buckets;
        *self.bucket_count.get() = new_count;
        self.clear(threads);
        self.size_megabytes()
    }

    /// Zeroes every bucket, partitioning the work across `threads` helper
    /// threads.
    ///
    /// # Safety
    ///
    /// Must not be called while any search is probing the table.
    pub unsafe fn clear(&self, threads: usize) {
        let threads = threads.max(1);
        let count = self.bucket_count();
        let chunk = (count + threads - 1) / threads;
        let base = self.base_ptr();

        crossbeam_thread::scope(|s| {
            for t in 0..threads {
                let start = t * chunk;
                let end = ((t + 1) * chunk).min(count);
                if start >= end {
                    continue;
                }
                let ptr = SendPtr(base);
                s.spawn(move |_| {
                    let ptr = ptr;
                    std::ptr::write_bytes(ptr.0.add(start), 0, end - start);
                });
            }
        })
        .unwrap();
    }

    #[inline(always)]
    fn bucket_ptr(&self, key: Key) -> *mut Bucket {
        let index = (key & (self.bucket_count() as u64 - 1)) as usize;
        unsafe { self.base_ptr().add(index) }
    }
}

impl PreFetchable for TranspositionTable {
    /// Prefetches the bucket a key hashes into.
    #[inline(always)]
    fn prefetch(&self, key: u64) {
        prefetch_write(self.bucket_ptr(key));
    }
}

impl Drop for TranspositionTable {
    fn drop(&mut self) {
        unsafe {
            dealloc_buckets(*self.buckets.get(), self.bucket_count());
        }
    }
}

#[derive(Copy, Clone)]
struct SendPtr(*mut Bucket);
unsafe impl Send for SendPtr {}

fn alloc_buckets(count: usize) -> NonNull<Bucket> {
    unsafe {
        let layout = Layout::array::<Bucket>(count).unwrap();
        let ptr = alloc_zeroed(layout);
        NonNull::new(ptr as *mut Bucket).expect("transposition table allocation failed")
    }
}

unsafe fn dealloc_buckets(buckets: NonNull<Bucket>, count: usize) {
    let layout = Layout::array::<Bucket>(count).unwrap();
    dealloc(buckets.as_ptr() as *mut u8, layout);
}

/// Canonicalizes a search value before storage: mate scores are expressed
/// relative to this node rather than the root, so a transposition found at
/// a different height still reports the correct distance.
#[inline]
pub fn value_to_tt(value: Value, ply: u16) -> Value {
    debug_assert_ne!(value, NONE);
    if value >= MATE_BOUND {
        value + Value::from(ply)
    } else if value <= -MATE_BOUND {
        value - Value::from(ply)
    } else {
        value
    }
}

/// Undoes [`value_to_tt`], and downgrades mate claims the fifty-move rule
/// would void before they could be executed.
///
/// [`value_to_tt`]: fn.value_to_tt.html
#[inline]
pub fn value_from_tt(value: Value, ply: u16, rule_50: i16) -> Value {
    if value == NONE {
        return NONE;
    }
    if value >= MATE_BOUND {
        // A mate further away than the fifty-move horizon allows cannot be
        // claimed from this position.
        if sable::core::score::MATE - value > 100 - Value::from(rule_50) {
            return MATE_BOUND - 1;
        }
        value - Value::from(ply)
    } else if value <= -MATE_BOUND {
        if sable::core::score::MATE + value > 100 - Value::from(rule_50) {
            return -MATE_BOUND + 1;
        }
        value + Value::from(ply)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable::core::sq::Square;

    fn make_key(key16: u16, index_bits: u64) -> u64 {
        (u64::from(key16) << 48) | (index_bits & 0x0000_FFFF_FFFF_FFFF)
    }

    #[test]
    fn sizes() {
        assert_eq!(mem::size_of::<Entry>(), 10);
        assert_eq!(mem::size_of::<Bucket>(), 32);
        let tt = TranspositionTable::new(1);
        assert!(tt.bucket_count().is_power_of_two());
        assert!(tt.bucket_count() * mem::size_of::<Bucket>() <= BYTES_PER_MB);
    }

    #[test]
    fn probe_store_probe() {
        let tt = TranspositionTable::new(1);
        let key = make_key(0xABCD, 77);
        let mv = Move::encode(Square::E2, Square::E4);

        let (hit, _, mut writer) = tt.probe(key);
        assert!(!hit);
        writer.save(key, 33, true, NodeBound::Exact, 6, mv, 12);

        let (hit, data, _) = tt.probe(key);
        assert!(hit);
        assert_eq!(data.best_move, mv);
        assert_eq!(data.value, 33);
        assert_eq!(data.eval, 12);
        assert_eq!(data.depth, 6);
        assert_eq!(data.bound, NodeBound::Exact);
        assert!(data.is_pv);
    }

    #[test]
    fn shallow_bound_never_clobbers_deeper() {
        let tt = TranspositionTable::new(1);
        let key = make_key(0x1234, 5);
        let mv = Move::encode(Square::D2, Square::D4);

        let (_, _, mut writer) = tt.probe(key);
        writer.save(key, 50, false, NodeBound::Exact, 10, mv, 0);

        let (_, _, mut writer) = tt.probe(key);
        writer.save(key, -20, false, NodeBound::UpperBound, 2, Move::none(), 0);

        let (hit, data, _) = tt.probe(key);
        assert!(hit);
        assert_eq!(data.depth, 10);
        assert_eq!(data.value, 50);
        assert_eq!(data.best_move, mv);
    }

    #[test]
    fn replacement_evicts_shallowest() {
        let tt = TranspositionTable::new(1);
        let index = 42;
        let keys = [
            make_key(100, index),
            make_key(200, index),
            make_key(300, index),
        ];
        for (i, k) in keys.iter().enumerate() {
            let (_, _, mut w) = tt.probe(*k);
            w.save(*k, 0, false, NodeBound::LowerBound, 3 + 2 * i as i16, Move::none(), 0);
        }

        // Bucket is full; a fourth key must evict the depth-3 entry.
        let fourth = make_key(400, index);
        let (hit, _, mut w) = tt.probe(fourth);
        assert!(!hit);
        w.save(fourth, 1, false, NodeBound::LowerBound, 12, Move::none(), 0);

        assert!(!tt.probe(keys[0]).0);
        assert!(tt.probe(keys[1]).0);
        assert!(tt.probe(keys[2]).0);
        assert!(tt.probe(fourth).0);
    }

    #[test]
    fn generation_aging_prefers_stale_victims() {
        let tt = TranspositionTable::new(1);
        let index = 9;
        let old_key = make_key(11, index);
        let (_, _, mut w) = tt.probe(old_key);
        w.save(old_key, 0, false, NodeBound::LowerBound, 12, Move::none(), 0);

        // Several searches pass; newer, shallower entries fill the bucket.
        for _ in 0..4 {
            tt.new_search();
        }
        let new_a = make_key(22, index);
        let (_, _, mut w) = tt.probe(new_a);
        w.save(new_a, 0, false, NodeBound::LowerBound, 5, Move::none(), 0);
        let new_b = make_key(33, index);
        let (_, _, mut w) = tt.probe(new_b);
        w.save(new_b, 0, false, NodeBound::LowerBound, 5, Move::none(), 0);

        // The deep-but-ancient entry is the replacement victim now.
        let fresh = make_key(44, index);
        let (_, _, mut w) = tt.probe(fresh);
        w.save(fresh, 0, false, NodeBound::LowerBound, 5, Move::none(), 0);
        assert!(!tt.probe(old_key).0);
        assert!(tt.probe(new_a).0);
        assert!(tt.probe(new_b).0);
    }

    #[test]
    fn mate_value_canonicalization() {
        use sable::core::score::{mate_in, mated_in};
        let v = mate_in(7);
        let stored = value_to_tt(v, 3);
        assert_eq!(value_from_tt(stored, 3, 0), v);

        let v = mated_in(9);
        let stored = value_to_tt(v, 4);
        assert_eq!(value_from_tt(stored, 4, 0), v);
    }

    #[test]
    fn clear_wipes_entries() {
        let tt = TranspositionTable::new(1);
        let key = make_key(77, 123);
        let (_, _, mut w) = tt.probe(key);
        w.save(key, 5, false, NodeBound::Exact, 4, Move::none(), 0);
        assert!(tt.probe(key).0);
        unsafe {
            tt.clear(4);
        }
        assert!(!tt.probe(key).0);
    }
}
