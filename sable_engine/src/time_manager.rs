//! Search limits and wall-clock budget allocation.
//!
//! The time manager turns a clock situation (remaining time, increment,
//! moves to the next time control) into two bounds: `optimum`, the time
//! worth spending on a normal move, and `maximum`, the hard ceiling. The
//! search stops when `maximum` is reached, or when `optimum` is reached
//! and the best move has been stable.

use std::cell::UnsafeCell;
use std::time::Instant;

use sable::core::masks::PLAYER_CNT;
use sable::Player;

/// The fifty-move horizon assumed when the GUI gives no `movestogo`.
const MOVE_HORIZON: i64 = 50;

/// Default milliseconds subtracted per move for I/O latency.
pub const DEFAULT_MOVE_OVERHEAD: i64 = 100;

/// The limits a `go` command puts on a search.
#[derive(Clone)]
pub struct Limits {
    /// Remaining clock time per player, in milliseconds.
    pub time: [i64; PLAYER_CNT],
    /// Increment per move per player, in milliseconds.
    pub inc: [i64; PLAYER_CNT],
    /// Moves until the next time control, zero when unspecified.
    pub moves_to_go: u32,
    /// Latency compensation, in milliseconds.
    pub move_overhead: i64,
    /// Search exactly this many milliseconds.
    pub movetime: Option<i64>,
    /// Search exactly this many plies deep.
    pub depth: Option<u16>,
    /// Stop after roughly this many nodes.
    pub nodes: Option<u64>,
    /// Search until told to stop.
    pub infinite: bool,
    /// When the `go` command arrived.
    pub start: Instant,
}

impl Limits {
    /// A blank set of limits: search forever.
    pub fn blank() -> Self {
        Limits {
            time: [0; PLAYER_CNT],
            inc: [0; PLAYER_CNT],
            moves_to_go: 0,
            move_overhead: DEFAULT_MOVE_OVERHEAD,
            movetime: None,
            depth: None,
            nodes: None,
            infinite: false,
            start: Instant::now(),
        }
    }

    /// Returns if clock-based time management applies: some clock time was
    /// given and no overriding mode is set.
    pub fn use_time_management(&self) -> bool {
        (self.time[0] != 0 || self.time[1] != 0)
            && self.movetime.is_none()
            && !self.infinite
    }

    /// Milliseconds since the `go` command.
    pub fn elapsed(&self) -> i64 {
        chrono::Duration::from_std(self.start.elapsed())
            .unwrap()
            .num_milliseconds()
    }
}

/// Allocates thinking time for the main thread. A single global instance
/// is re-initialized at every `go`.
pub struct TimeManager {
    optimum_time: UnsafeCell<i64>,
    maximum_time: UnsafeCell<i64>,
    start: UnsafeCell<Instant>,
}

// Written by the main thread at search start, read afterwards; the window
// of concurrent access carries no data worth synchronizing.
unsafe impl Sync for TimeManager {}

impl TimeManager {
    /// Creates an uninitialized time manager.
    pub fn uninitialized() -> TimeManager {
        TimeManager {
            optimum_time: UnsafeCell::new(0),
            maximum_time: UnsafeCell::new(0),
            start: UnsafeCell::new(Instant::now()),
        }
    }

    /// Starts the clock without budget bounds, for `movetime`, `infinite`
    /// and depth-limited searches.
    pub fn start_timer(&self, start: Instant) {
        unsafe {
            *self.start.get() = start;
            *self.optimum_time.get() = 0;
            *self.maximum_time.get() = 0;
        }
    }

    /// Computes the budget for the player to move.
    ///
    /// `optimum` is one and a half of an even share of the remaining time
    /// plus the increment; `maximum` twice that; both are capped by the
    /// time actually left on the clock.
    pub fn init(&self, start: Instant, limits: &Limits, turn: Player) {
        let my_time = limits.time[turn as usize];
        let my_inc = limits.inc[turn as usize];
        let mtg = if limits.moves_to_go == 0 {
            MOVE_HORIZON
        } else {
            i64::from(limits.moves_to_go).min(MOVE_HORIZON)
        };

        let usable = (my_time - limits.move_overhead).max(1);
        let mut optimum = 3 * usable / (2 * mtg) + my_inc;
        let mut maximum = 2 * optimum;

        optimum = optimum.min(usable);
        maximum = maximum.min(usable);

        unsafe {
            *self.start.get() = start;
            *self.optimum_time.get() = optimum;
            *self.maximum_time.get() = maximum;
        }
    }

    /// Milliseconds since the search started.
    pub fn elapsed(&self) -> i64 {
        let start = unsafe { *self.start.get() };
        chrono::Duration::from_std(start.elapsed())
            .unwrap()
            .num_milliseconds()
    }

    /// The time worth spending on a normal move.
    #[inline(always)]
    pub fn optimum(&self) -> i64 {
        unsafe { *self.optimum_time.get() }
    }

    /// The hard ceiling on the current move's thinking time.
    #[inline(always)]
    pub fn maximum(&self) -> i64 {
        unsafe { *self.maximum_time.get() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_shapes() {
        let tm = TimeManager::uninitialized();
        let mut limits = Limits::blank();
        limits.time = [60_000, 60_000];
        limits.inc = [1_000, 1_000];
        tm.init(Instant::now(), &limits, Player::White);

        assert!(tm.optimum() > 0);
        assert_eq!(tm.maximum(), 2 * tm.optimum());
        assert!(tm.maximum() <= 60_000 - limits.move_overhead);
    }

    #[test]
    fn short_clock_is_capped() {
        let tm = TimeManager::uninitialized();
        let mut limits = Limits::blank();
        limits.time = [150, 150];
        tm.init(Instant::now(), &limits, Player::Black);

        assert!(tm.maximum() <= 150);
        assert!(tm.optimum() >= 1);
    }

    #[test]
    fn moves_to_go_shares_time() {
        let tm = TimeManager::uninitialized();
        let mut limits = Limits::blank();
        limits.time = [10_000, 10_000];
        limits.moves_to_go = 1;
        tm.init(Instant::now(), &limits, Player::White);
        let single = tm.optimum();

        limits.moves_to_go = 40;
        tm.init(Instant::now(), &limits, Player::White);
        assert!(tm.optimum() < single);
    }
}
