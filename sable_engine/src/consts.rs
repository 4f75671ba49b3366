//! Constant values and the global structures shared by every worker.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::time_manager::TimeManager;
use crate::tt::TranspositionTable;

pub use sable::core::score::MAX_PLY;

/// Number of frames in each worker's search stack; the first four are
/// padding so continuation-history lookups may reach behind the root.
pub const THREAD_STACK_SIZE: usize = MAX_PLY as usize + 8;

/// The maximum number of worker threads the pool will spawn.
pub const MAX_THREADS: usize = 256;

/// Default transposition table size, in megabytes.
pub const DEFAULT_TT_SIZE: usize = 256;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Whether searches report UCI `info` lines and `bestmove` to stdout.
pub static USE_STDOUT: AtomicBool = AtomicBool::new(true);

lazy_static! {
    /// The global transposition table, shared by every worker.
    pub static ref TT_TABLE: TranspositionTable = TranspositionTable::new(DEFAULT_TT_SIZE);

    /// The global time manager, owned logically by the main thread.
    pub static ref TIMER: TimeManager = TimeManager::uninitialized();
}

/// Returns the global transposition table.
#[inline(always)]
pub fn tt() -> &'static TranspositionTable {
    &TT_TABLE
}

/// Returns the global time manager.
#[inline(always)]
pub fn timer() -> &'static TimeManager {
    &TIMER
}

/// Initializes all global structures, once.
pub fn init_globals() {
    if !INITIALIZED.swap(true, Ordering::SeqCst) {
        sable::helper::prelude::init_statics();
        lazy_static::initialize(&TT_TABLE);
        lazy_static::initialize(&TIMER);
        crate::search::init();
    }
}

/// Trait to monomorphize the search over its node type.
pub trait PVNode {
    /// Is the node inside the principal variation?
    fn is_pv() -> bool;
}

/// A node inside the principal variation.
pub struct PV {}
/// A node outside the principal variation, searched with a zero window.
pub struct NonPV {}

impl PVNode for PV {
    #[inline(always)]
    fn is_pv() -> bool {
        true
    }
}

impl PVNode for NonPV {
    #[inline(always)]
    fn is_pv() -> bool {
        false
    }
}
