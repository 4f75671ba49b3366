//! The main searching functions: iterative deepening with aspiration
//! windows around an alpha-beta search with transposition cutoffs, null
//! move, probcut, late move reductions and a capture-only quiescence tail.

use std::cell::UnsafeCell;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use sable::board::Board;
use sable::core::piece_move::Move;
use sable::core::score::*;
use sable::core::sq::Square;
use sable::tools::eval::Eval;
use sable::tools::PreFetchable;
use sable::Piece;

use crate::consts::*;
use crate::movepick::MovePicker;
use crate::root_moves::RootMoveList;
use crate::sync::{GuardedBool, LockLatch};
use crate::tables::*;
use crate::threadpool::threadpool;
use crate::time_manager::{Limits, TimeManager};
use crate::tt::{value_from_tt, value_to_tt, NodeBound};

/// How many distinct Lazy-SMP schedules exist before they repeat.
const THREAD_DIST: usize = 20;

// Depth-skipping patterns per worker: workers diverge by starting deeper
// or skipping iterations, filling the shared table at different horizons.
#[rustfmt::skip]
static SKIP_SIZE: [i16; THREAD_DIST] = [1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4];
#[rustfmt::skip]
static START_PLY: [i16; THREAD_DIST] = [0, 1, 0, 1, 2, 3, 0, 1, 2, 3, 4, 5, 0, 1, 2, 3, 4, 5, 6, 7];

// [pv][improving][depth][move number]
static mut REDUCTIONS: [[[[i16; 64]; 64]; 2]; 2] = [[[[0; 64]; 64]; 2]; 2];
// [improving][depth]
static mut FUTILITY_MOVE_COUNTS: [[u32; 16]; 2] = [[0; 16]; 2];

const FUTILITY_MARGIN: Value = 165;
const PROBCUT_MARGIN: Value = 180;

static CAPTURE_PRUNE_MARGIN: [Value; 7] = [0, 180, 360, 520, 700, 880, 1050];

/// Builds the reduction and move-count tables. Called once at startup.
#[cold]
pub fn init() {
    for imp in 0..2 {
        for d in 1..64 {
            for mc in 1..64 {
                let r: f64 = (d as f64).ln() * (mc as f64).ln() / 1.95;
                unsafe {
                    REDUCTIONS[0][imp][d][mc] = r as i16;
                    REDUCTIONS[1][imp][d][mc] = (REDUCTIONS[0][imp][d][mc] - 1).max(0);
                    if imp == 0 && r > 1.0 {
                        REDUCTIONS[0][imp][d][mc] += 1;
                    }
                }
            }
        }
    }
    for d in 0..16 {
        unsafe {
            FUTILITY_MOVE_COUNTS[0][d] = (2.4 + 0.74 * (d as f64).powf(1.78)) as u32;
            FUTILITY_MOVE_COUNTS[1][d] = (5.0 + 1.0 * (d as f64).powf(2.0)) as u32;
        }
    }
}

/// A job a worker can be woken up for.
pub enum Job {
    /// Nothing to do; go back to waiting.
    Idle,
    /// Run the search configured by the thread pool.
    Search,
    /// Run an arbitrary task.
    Custom(Box<dyn FnOnce() + Send>),
}

/// Per-ply search state, held in a contiguous stack so a frame can reach
/// its neighbors by pointer offset.
pub struct Stack {
    cont_history: *mut PieceToHistory,
    ply: u16,
    current_move: Move,
    excluded_move: Move,
    static_eval: Value,
    stat_score: i32,
    move_count: u32,
}

impl Stack {
    /// Gets the frame at a relative offset.
    ///
    /// # Safety
    ///
    /// The offset must stay within the owning `ThreadStack`.
    pub fn offset(&mut self, count: isize) -> &mut Stack {
        unsafe {
            let ptr: *mut Stack = self as *mut Stack;
            &mut *ptr.offset(count)
        }
    }

    /// Gets the next ply's frame.
    pub fn incr(&mut self) -> &mut Stack {
        self.offset(1)
    }
}

/// The full per-worker stack of frames.
pub struct ThreadStack {
    stack: [Stack; THREAD_STACK_SIZE],
}

impl ThreadStack {
    pub fn new() -> Self {
        unsafe { mem::zeroed() }
    }

    /// Gets a frame by absolute index.
    pub fn get(&mut self, frame: usize) -> &mut Stack {
        debug_assert!(frame < THREAD_STACK_SIZE);
        unsafe { self.stack.get_unchecked_mut(frame) }
    }

    /// The frame of ply zero. Frames before it are padding for the
    /// continuation-history back-pointers.
    pub fn ply_zero(&mut self) -> &mut Stack {
        self.get(4)
    }
}

impl Default for ThreadStack {
    fn default() -> Self {
        ThreadStack::new()
    }
}

/// One search worker. Worker zero is the main thread; it owns the time
/// manager and coordinates the rest.
pub struct Searcher {
    // Synchronization.
    pub id: usize,
    pub kill: AtomicBool,
    pub searching: Arc<GuardedBool>,
    pub cond: Arc<LockLatch>,
    pub job: UnsafeCell<Job>,

    // Search data.
    pub depth_completed: i16,
    pub limit: Limits,
    pub board: Board,
    pub time_man: &'static TimeManager,
    pub root_moves: RootMoveList,
    pub sel_depth: u16,
    pub nodes: AtomicU64,

    // Heuristic tables, private to this worker.
    pub killers: KillerTable,
    pub counter_moves: CounterMoveHistory,
    pub main_history: ButterflyHistory,
    pub capture_history: CaptureHistory,
    pub cont_history: ContinuationHistory,

    // Main-thread bookkeeping.
    pub previous_score: Value,
    pub best_move: Move,
    pub last_best_move: Move,
    pub last_best_move_depth: i16,
    pub failed_low: bool,
    pub best_move_changes: f64,
}

unsafe impl Send for Searcher {}
unsafe impl Sync for Searcher {}

impl Searcher {
    /// Creates a new `Searcher` with an ID and the latch it sleeps on.
    pub fn new(id: usize, cond: Arc<LockLatch>) -> Self {
        Searcher {
            id,
            kill: AtomicBool::new(false),
            searching: Arc::new(GuardedBool::new(true)),
            cond,
            job: UnsafeCell::new(Job::Idle),
            depth_completed: 0,
            limit: Limits::blank(),
            board: Board::start_pos(),
            time_man: timer(),
            root_moves: RootMoveList::new(),
            sel_depth: 0,
            nodes: AtomicU64::new(0),
            killers: KillerTable::new(),
            counter_moves: CounterMoveHistory::new(),
            main_history: ButterflyHistory::new(),
            capture_history: CaptureHistory::new(),
            cont_history: ContinuationHistory::new(),
            previous_score: INFINITE,
            best_move: Move::none(),
            last_best_move: Move::none(),
            last_best_move_depth: 0,
            failed_low: false,
            best_move_changes: 0.0,
        }
    }

    /// Resets the worker's heuristics for a new game.
    pub fn clear(&mut self) {
        self.killers.clear();
        self.counter_moves.clear();
        self.main_history.clear();
        self.capture_history.clear();
        self.cont_history.clear();
        self.previous_score = INFINITE;
    }

    /// Spins in the idle loop, waiting for the latch to release with a job.
    pub fn idle_loop(&mut self) {
        self.searching.set(false);
        loop {
            self.cond.wait();
            self.cond.lock();
            if self.kill.load(Ordering::SeqCst) {
                return;
            }
            let job = unsafe { mem::replace(&mut *self.job.get(), Job::Idle) };
            match job {
                Job::Idle => {}
                Job::Search => self.go(),
                Job::Custom(f) => f(),
            }
            self.searching.set(false);
        }
    }

    fn go(&mut self) {
        if self.main_thread() {
            self.main_thread_go();
        } else {
            self.search_root();
        }
    }

    /// The main thread's search: wake the helpers, search, stop everyone,
    /// then pick the best thread's result.
    fn main_thread_go(&mut self) {
        tt().new_search();

        threadpool().start_non_main_searches();

        self.search_root();

        // The time is up, or the limits were reached; everyone stops.
        threadpool().set_stop(true);
        threadpool().wait_for_non_main();

        let mut best_move = self.root_moves.first_move();
        let mut best_score = self.root_moves.first().score;

        if self.limit.depth.is_none() {
            // Pick the worker that reached the best (depth, score) pair,
            // with a preference for newly found mates.
            let mut best_thread: &Searcher = self;
            for th in threadpool().workers() {
                let depth_diff = th.depth_completed - best_thread.depth_completed;
                let score_diff = th.root_moves.first().score - best_thread.root_moves.first().score;
                if (score_diff > 0 && depth_diff >= 0)
                    || (th.root_moves.first().score >= MATE_BOUND && score_diff > 0)
                {
                    best_thread = th;
                }
            }
            if !best_thread.root_moves.is_empty() {
                best_move = best_thread.root_moves.first_move();
                best_score = best_thread.root_moves.first().score;
                if best_thread.id != self.id && self.use_stdout() {
                    best_thread.print_pv(best_thread.depth_completed);
                }
            }
        }

        self.previous_score = best_score;
        self.best_move = best_move;

        if self.use_stdout() {
            println!("bestmove {}", best_move);
        }
    }

    /// Iterative deepening for one worker.
    fn search_root(&mut self) {
        if self.stop() {
            return;
        }

        let mut stack = Box::<ThreadStack>::default();
        for i in 0..5 {
            stack.get(i).cont_history =
                &mut self.cont_history[(Piece::None, Square(0))] as *mut _;
        }
        stack.ply_zero().ply = 0;

        let max_depth: i16 = if self.main_thread() {
            self.limit.depth.map_or(MAX_PLY as i16, |d| d as i16)
        } else {
            MAX_PLY as i16
        };

        if self.main_thread() {
            self.best_move_changes = 0.0;
            self.failed_low = false;
        }

        let start_ply: i16 = START_PLY[self.id % THREAD_DIST];
        let skip_size: i16 = SKIP_SIZE[self.id % THREAD_DIST];
        let mut depth: i16 = start_ply + 1;

        let mut best_value: Value;
        let mut alpha: Value = NEG_INFINITE;
        let mut beta: Value = INFINITE;
        let mut delta: Value;

        'iterative_deepening: while !self.stop() && depth <= max_depth {
            if self.main_thread() {
                self.best_move_changes *= 0.5;
                self.failed_low = false;
            }

            self.sel_depth = 0;
            self.root_moves.rollback();

            // Aspiration: center the window on the previous score once
            // the search is deep enough to trust it.
            delta = 20;
            if depth >= 5 {
                let prev = self.root_moves.first().prev_score;
                alpha = (prev - delta).max(NEG_INFINITE);
                beta = (prev + delta).min(INFINITE);
            } else {
                alpha = NEG_INFINITE;
                beta = INFINITE;
            }

            'aspiration: loop {
                best_value =
                    self.search::<PV>(alpha, beta, stack.ply_zero(), depth, false);
                self.root_moves.sort();

                if self.stop() {
                    break 'aspiration;
                }

                if best_value <= alpha {
                    // Fail low: pull beta in, widen below.
                    beta = (alpha + beta) / 2;
                    alpha = (best_value - delta).max(NEG_INFINITE);
                    if self.main_thread() {
                        self.failed_low = true;
                    }
                } else if best_value >= beta {
                    beta = (best_value + delta).min(INFINITE);
                } else {
                    break 'aspiration;
                }
                delta += delta / 4 + 5;
            }

            if !self.stop() {
                self.depth_completed = depth;
            }

            if self.use_stdout() && self.main_thread() {
                self.print_pv(depth);
            }

            let curr_best = self.root_moves.first_move();
            if curr_best != self.last_best_move {
                self.last_best_move = curr_best;
                self.last_best_move_depth = depth;
            }

            // An unambiguous forced mate needs no deeper confirmation.
            if self.main_thread()
                && !self.stop()
                && self.root_moves.first().score >= MATE_BOUND
                && self.limit.depth.is_none()
                && !self.limit.infinite
            {
                threadpool().set_stop(true);
                break 'iterative_deepening;
            }

            depth += skip_size;

            if !self.main_thread() {
                continue;
            }

            // Time management: once the soft bound passes, stop early if
            // the best move has been stable across recent iterations.
            if self.limit.use_time_management() && !self.stop() {
                let mut stability: f64 = 1.0;
                for i in 3..6 {
                    if self.last_best_move_depth * i < self.depth_completed {
                        stability *= 0.9;
                    }
                }
                let instability = 1.0 + self.best_move_changes + 0.3 * self.failed_low as u8 as f64;
                let budget = self.time_man.optimum() as f64 * stability * instability;

                if self.root_moves.len() == 1
                    || self.time_man.elapsed() as f64 >= budget
                {
                    threadpool().set_stop(true);
                    break 'iterative_deepening;
                }
            }
        }
    }

    /// The recursive alpha-beta search.
    fn search<N: PVNode>(
        &mut self,
        mut alpha: Value,
        mut beta: Value,
        ss: &mut Stack,
        mut depth: i16,
        cut_node: bool,
    ) -> Value {
        if depth < 1 {
            return self.qsearch::<N>(alpha, beta, ss);
        }

        let is_pv: bool = N::is_pv();
        let ply: u16 = ss.ply;
        let at_root: bool = ply == 0;
        let in_check: bool = self.board.in_check();

        debug_assert!(depth < MAX_PLY as i16);
        debug_assert!(alpha < beta);

        if self.main_thread() && self.nodes.load(Ordering::Relaxed) & 4095 == 0 {
            self.check_time();
        }

        if !at_root {
            if self.stop() || ply >= MAX_PLY {
                return if !in_check && ply >= MAX_PLY {
                    self.eval()
                } else {
                    alpha
                };
            }

            if self.board.is_draw(ply) {
                return self.draw_value();
            }

            // Mate distance pruning: a shorter mate elsewhere bounds what
            // this subtree can achieve.
            alpha = alpha.max(mated_in(ply));
            beta = beta.min(mate_in(ply + 1));
            if alpha >= beta {
                return alpha;
            }
        }

        if is_pv && self.sel_depth < ply + 1 {
            self.sel_depth = ply + 1;
        }

        ss.incr().ply = ply + 1;
        ss.current_move = Move::none();
        ss.incr().excluded_move = Move::none();
        ss.cont_history = &mut self.cont_history[(Piece::None, Square(0))] as *mut _;
        ss.offset(-2).stat_score = 0;
        ss.move_count = 0;

        let prev_move: Move = ss.offset(-1).current_move;
        let prev_sq: Square = prev_move.to();

        // Probe the transposition table. An excluded move perturbs the key
        // so singular verification doesn't collide with the real node.
        let excluded_move = ss.excluded_move;
        let key = self.board.key() ^ (u64::from(excluded_move.raw()) << 16);
        let (tt_hit, tt_data, mut tt_writer) = tt().probe(key);
        let tt_value: Value = if tt_hit {
            value_from_tt(tt_data.value, ply, self.board.rule_50())
        } else {
            NONE
        };
        let tt_move: Move = if at_root {
            self.root_moves.first_move()
        } else if tt_hit {
            tt_data.best_move
        } else {
            Move::none()
        };

        // At non-PV nodes, a deep enough entry with a usable bound ends
        // the node immediately.
        if !is_pv
            && tt_hit
            && excluded_move.is_none()
            && tt_data.depth >= depth
            && tt_value != NONE
            && bound_allows_cutoff(tt_value, beta, tt_data.bound)
        {
            if tt_move.is_okay() && tt_value >= beta && !self.board.is_capture_or_promotion(tt_move)
            {
                let bonus = stat_bonus(depth);
                self.update_quiet_stats(tt_move, ss, prev_move, &[], bonus);
            }
            return tt_value;
        }

        // Static evaluation. A checked node goes straight to the move
        // loop; everything here would be noise.
        let pos_eval: Value;
        let improving: bool;
        if in_check {
            ss.static_eval = NONE;
            pos_eval = NONE;
            improving = false;
        } else {
            if tt_hit {
                let mut ev = if tt_data.eval == NONE {
                    self.eval()
                } else {
                    tt_data.eval
                };
                ss.static_eval = ev;
                if tt_value != NONE && bound_allows_cutoff(tt_value, ev, tt_data.bound) {
                    ev = tt_value;
                }
                pos_eval = ev;
            } else {
                pos_eval = self.eval();
                ss.static_eval = pos_eval;
                tt_writer.save(
                    key,
                    NONE,
                    is_pv,
                    NodeBound::NoBound,
                    -6,
                    Move::none(),
                    pos_eval,
                );
            }
            let two_ago = ss.offset(-2).static_eval;
            improving = two_ago == NONE || ss.static_eval >= two_ago;
        }

        if !in_check && excluded_move.is_none() && self.board.non_pawn_material_all() != 0 {
            // Reverse futility: a comfortable static margin over beta at
            // low depth is returned outright.
            if !is_pv && depth < 7 && pos_eval - FUTILITY_MARGIN * Value::from(depth) >= beta && pos_eval < MATE_BOUND
            {
                return pos_eval - FUTILITY_MARGIN * Value::from(depth);
            }

            // Null move: hand the opponent a free move; if the reduced
            // search still clears beta the real position surely does.
            // Skipped for pawn-only endgames, where zugzwang lies.
            if !is_pv
                && pos_eval >= beta
                && !prev_move.is_null()
                && self.board.non_pawn_material(self.board.turn()) != 0
            {
                let r: i16 = 3 + depth / 4;
                ss.current_move = Move::null();
                ss.cont_history = &mut self.cont_history[(Piece::None, Square(0))] as *mut _;

                self.board.make_null_move();
                let null_value =
                    -self.search::<NonPV>(-beta, -beta + 1, ss.incr(), depth - r, !cut_node);
                self.board.unmake_null_move();

                if self.stop() {
                    return alpha;
                }
                if null_value >= beta {
                    // Unproven mates from a passed move are not trusted.
                    return if null_value >= MATE_BOUND {
                        beta
                    } else {
                        null_value
                    };
                }
            }

            // Probcut: a capture that already beats a raised beta in a
            // shallow verification will almost surely beat it at full
            // depth.
            if !is_pv && depth >= 5 && beta.abs() < MATE_BOUND {
                let rbeta = (beta + PROBCUT_MARGIN).min(INFINITE - 1);
                let mut picker =
                    MovePicker::probcut(&self.board, &self.capture_history, rbeta - pos_eval);
                while let Some(m) = picker.next(true) {
                    if m == excluded_move {
                        continue;
                    }
                    ss.current_move = m;
                    ss.cont_history =
                        &mut self.cont_history[(self.board.moved_piece(m), m.to())] as *mut _;
                    self.apply_move(m);
                    let mut value = -self.qsearch::<NonPV>(-rbeta, -rbeta + 1, ss.incr());
                    if value >= rbeta {
                        value =
                            -self.search::<NonPV>(-rbeta, -rbeta + 1, ss.incr(), depth - 4, !cut_node);
                    }
                    self.board.unmake_move();
                    if self.stop() {
                        return alpha;
                    }
                    if value >= rbeta {
                        return value;
                    }
                }
            }
        }

        // Internal iterative reduction: a node this deep without a table
        // move is unlikely to be worth its nominal depth.
        if depth >= 7 && tt_move == Move::none() {
            depth -= 1;
        }

        let killers = self.killers.probe(ply);
        let counter: Move = if prev_move.is_okay() {
            let prev_piece = self.board.piece_on(prev_sq);
            if prev_piece != Piece::None {
                self.counter_moves[(prev_piece, prev_sq)]
            } else {
                Move::none()
            }
        } else {
            Move::none()
        };

        let cont_hists: [*const PieceToHistory; 4] = [
            ss.offset(-1).cont_history as *const _,
            ss.offset(-2).cont_history as *const _,
            ss.offset(-3).cont_history as *const _,
            ss.offset(-4).cont_history as *const _,
        ];

        let mut picker = MovePicker::main_search(
            &self.board,
            tt_move,
            killers,
            counter,
            &self.main_history,
            &self.capture_history,
            cont_hists,
        );

        let singular_candidate: bool = !at_root
            && depth >= 8
            && excluded_move.is_none()
            && tt_move.is_okay()
            && tt_hit
            && tt_value != NONE
            && tt_value.abs() < MATE_BOUND
            && (tt_data.bound as u8 & NodeBound::LowerBound as u8) != 0
            && tt_data.depth >= depth - 3;

        let mut best_value: Value = NEG_INFINITE;
        let mut best_move: Move = Move::none();
        let mut moves_played: u32 = 0;
        let mut skip_quiets: bool = false;

        let mut quiets_tried: [Move; 64] = [Move::none(); 64];
        let mut quiets_count: usize = 0;
        let mut captures_tried: [Move; 32] = [Move::none(); 32];
        let mut captures_count: usize = 0;

        while let Some(m) = picker.next(skip_quiets) {
            if m == excluded_move {
                continue;
            }
            if at_root && !self.root_moves.contains(m) {
                continue;
            }

            moves_played += 1;
            ss.move_count = moves_played;

            let capture_or_promotion = self.board.is_capture_or_promotion(m);
            let moved_piece = self.board.moved_piece(m);

            let move_count_pruning = depth < 16
                && moves_played > unsafe { FUTILITY_MOVE_COUNTS[improving as usize][depth as usize & 15] };

            // Shallow-depth pruning, once one sane line exists.
            if !at_root
                && best_value > -MATE_BOUND
                && self.board.non_pawn_material(self.board.turn()) != 0
            {
                if !capture_or_promotion {
                    if move_count_pruning {
                        skip_quiets = true;
                        continue;
                    }

                    let lmr_depth =
                        (depth - 1 - reduction::<N>(improving, depth, moves_played)).max(0);

                    // A quiet rejected by two continuation histories in a
                    // row is not worth a shallow search.
                    unsafe {
                        if lmr_depth < 3
                            && !cont_hists[0].is_null()
                            && !cont_hists[1].is_null()
                            && (&*cont_hists[0])[(moved_piece, m.to())] < 0
                            && (&*cont_hists[1])[(moved_piece, m.to())] < 0
                        {
                            continue;
                        }
                    }

                    if lmr_depth < 7
                        && !in_check
                        && ss.static_eval + 256 + 200 * Value::from(lmr_depth) <= alpha
                    {
                        continue;
                    }

                    if lmr_depth < 8
                        && !self
                            .board
                            .see_ge(m, -35 * Value::from(lmr_depth) * Value::from(lmr_depth))
                    {
                        continue;
                    }
                } else if depth < 7
                    && !self.board.see_ge(m, -CAPTURE_PRUNE_MARGIN[depth as usize])
                {
                    continue;
                }
            }

            // Singular-style extension of the table move: when every
            // alternative fails a lowered window the table move is forced
            // enough to deserve an extra ply.
            let mut extension: i16 = 0;
            if singular_candidate && m == tt_move {
                let rbeta = (tt_value - 2 * Value::from(depth)).max(-MATE);
                ss.excluded_move = m;
                let value =
                    self.search::<NonPV>(rbeta - 1, rbeta, ss, depth / 2, cut_node);
                ss.excluded_move = Move::none();
                if value < rbeta {
                    extension = 1;
                }
            }

            let new_depth = depth - 1 + extension;

            // The move's history reputation, read while the node's threat
            // map is still current; it feeds the reduction choice below.
            if !capture_or_promotion {
                let attacked = self.board.state().attacked;
                ss.stat_score = unsafe {
                    let mut s = i32::from(
                        self.main_history[(
                            self.board.turn(),
                            attacked.contains(m.from()),
                            attacked.contains(m.to()),
                            m.from(),
                            m.to(),
                        )],
                    );
                    for ch in [cont_hists[0], cont_hists[1], cont_hists[3]] {
                        if !ch.is_null() {
                            s += i32::from((&*ch)[(moved_piece, m.to())]);
                        }
                    }
                    s - 4000
                };
            }

            tt().prefetch(self.board.key_after(m));

            ss.current_move = m;
            ss.cont_history = &mut self.cont_history[(moved_piece, m.to())] as *mut _;

            self.apply_move(m);
            tt().prefetch(self.board.key());

            // Late move reductions: search late siblings shallower, and
            // re-search at full depth only when they surprise us.
            let mut value: Value;
            let do_full_depth: bool;
            if depth >= 3 && moves_played > 1 && (!capture_or_promotion || move_count_pruning) {
                let mut r = reduction::<N>(improving, depth, moves_played);

                if capture_or_promotion {
                    r = (r - 1).max(0);
                } else {
                    if cut_node {
                        r += 1;
                    }

                    if ss.stat_score >= 0 && ss.offset(-1).stat_score < 0 {
                        r -= 1;
                    } else if ss.offset(-1).stat_score >= 0 && ss.stat_score < 0 {
                        r += 1;
                    }
                    r = (r - (ss.stat_score / 20_000) as i16).max(0);
                }

                let d = (new_depth - r).max(1);
                value = -self.search::<NonPV>(-(alpha + 1), -alpha, ss.incr(), d, true);
                do_full_depth = value > alpha && d != new_depth;
            } else {
                value = ZERO;
                do_full_depth = !is_pv || moves_played > 1;
            }

            if do_full_depth {
                value =
                    -self.search::<NonPV>(-(alpha + 1), -alpha, ss.incr(), new_depth, !cut_node);
            }

            if is_pv && (moves_played == 1 || (value > alpha && (at_root || value < beta))) {
                value = -self.search::<PV>(-beta, -alpha, ss.incr(), new_depth, false);
            }

            self.board.unmake_move();

            debug_assert!(value > NEG_INFINITE && value < INFINITE || self.stop());

            if self.stop() {
                return alpha;
            }

            if at_root {
                let main_thread = self.main_thread();
                let mut new_best = false;
                if let Some(rm) = self.root_moves.find(m) {
                    if moves_played == 1 || value > alpha {
                        rm.score = value;
                        rm.depth_reached = depth;
                        new_best = moves_played > 1;
                    } else {
                        rm.score = NEG_INFINITE;
                    }
                }
                if new_best && main_thread && depth > 5 {
                    self.best_move_changes += 1.0;
                }
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    best_move = m;
                    if is_pv && value < beta {
                        alpha = value;
                    } else {
                        break;
                    }
                }
            }

            if m != best_move {
                if capture_or_promotion && captures_count < 32 {
                    captures_tried[captures_count] = m;
                    captures_count += 1;
                } else if !capture_or_promotion && quiets_count < 64 {
                    quiets_tried[quiets_count] = m;
                    quiets_count += 1;
                }
            }
        }

        if moves_played == 0 {
            // No legal moves: checkmate or stalemate, unless the move
            // loop was artificially restricted by an exclusion.
            return if excluded_move.is_okay() {
                alpha
            } else if in_check {
                mated_in(ply)
            } else {
                DRAW
            };
        } else if best_move.is_okay() {
            // Credit whatever caused the improvement and debit the moves
            // tried before it.
            let bonus = stat_bonus(depth);
            if !self.board.is_capture_or_promotion(best_move) {
                self.update_quiet_stats(
                    best_move,
                    ss,
                    prev_move,
                    &quiets_tried[..quiets_count],
                    bonus,
                );
            }
            self.update_capture_stats(best_move, &captures_tried[..captures_count], bonus);
        }

        let bound = if best_value >= beta {
            NodeBound::LowerBound
        } else if is_pv && best_move.is_okay() {
            NodeBound::Exact
        } else {
            NodeBound::UpperBound
        };

        if excluded_move.is_none() {
            tt_writer.save(
                key,
                value_to_tt(best_value, ply),
                is_pv || tt_data.is_pv,
                bound,
                depth,
                best_move,
                ss.static_eval,
            );
        }

        best_value
    }

    /// The quiescence tail: only forcing moves beyond the horizon, so the
    /// returned evaluation is tactically stable.
    fn qsearch<N: PVNode>(&mut self, mut alpha: Value, beta: Value, ss: &mut Stack) -> Value {
        let is_pv: bool = N::is_pv();
        let ply: u16 = ss.ply;
        let in_check: bool = self.board.in_check();

        debug_assert!(alpha < beta);
        debug_assert!(is_pv || alpha == beta - 1);

        if self.board.is_draw(ply) {
            return self.draw_value();
        }
        if ply >= MAX_PLY {
            return if in_check { ZERO } else { self.eval() };
        }

        let old_alpha = alpha;
        let key = self.board.key();
        let (tt_hit, tt_data, mut tt_writer) = tt().probe(key);
        let tt_value: Value = if tt_hit {
            value_from_tt(tt_data.value, ply, self.board.rule_50())
        } else {
            NONE
        };
        let tt_move: Move = if tt_hit { tt_data.best_move } else { Move::none() };

        if !is_pv
            && tt_hit
            && tt_data.depth >= 0
            && tt_value != NONE
            && bound_allows_cutoff(tt_value, beta, tt_data.bound)
        {
            return tt_value;
        }

        let mut best_value: Value;
        let futility_base: Value;
        if in_check {
            ss.static_eval = NONE;
            best_value = NEG_INFINITE;
            futility_base = NEG_INFINITE;
        } else {
            if tt_hit && tt_data.eval != NONE {
                best_value = tt_data.eval;
            } else {
                best_value = self.eval();
            }
            ss.static_eval = best_value;

            if tt_value != NONE && bound_allows_cutoff(tt_value, best_value, tt_data.bound) {
                best_value = tt_value;
            }

            // Stand pat: doing nothing is always an option when not in
            // check.
            if best_value >= beta {
                if !tt_hit {
                    tt_writer.save(
                        key,
                        value_to_tt(best_value, ply),
                        false,
                        NodeBound::LowerBound,
                        0,
                        Move::none(),
                        ss.static_eval,
                    );
                }
                return best_value;
            }

            if is_pv && best_value > alpha {
                alpha = best_value;
            }

            futility_base = best_value + 128;
        }

        ss.incr().ply = ply + 1;
        let mut best_move = Move::none();
        let mut moves_played = 0;

        let mut picker =
            MovePicker::qsearch(&self.board, tt_move, &self.main_history, &self.capture_history);

        while let Some(m) = picker.next(false) {
            // Futility: a capture whose victim cannot lift the stand-pat
            // score above alpha is not worth trying.
            if !in_check && futility_base > -MATE_BOUND && !m.is_promotion() {
                let captured = self.board.captured_piece(m);
                let futility_value = futility_base + PIECE_VALUE_EG[captured as usize];
                if futility_value <= alpha {
                    best_value = best_value.max(futility_value);
                    continue;
                }
                if futility_base <= alpha && !self.board.see_ge(m, 1) {
                    best_value = best_value.max(futility_base);
                    continue;
                }
            }

            let evasion_prunable =
                in_check && moves_played > 2 && best_value > -MATE_BOUND && !self.board.is_capture(m);

            if (!in_check || evasion_prunable) && !self.board.see_ge(m, 0) {
                continue;
            }

            tt().prefetch(self.board.key_after(m));

            moves_played += 1;
            ss.current_move = m;

            self.apply_move(m);
            let value = -self.qsearch::<N>(-beta, -alpha, ss.incr());
            self.board.unmake_move();

            if self.stop() {
                return alpha;
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    best_move = m;
                    if is_pv && value < beta {
                        alpha = value;
                    } else {
                        tt_writer.save(
                            key,
                            value_to_tt(best_value, ply),
                            is_pv,
                            NodeBound::LowerBound,
                            0,
                            m,
                            ss.static_eval,
                        );
                        return value;
                    }
                }
            }
        }

        if in_check && best_value == NEG_INFINITE {
            return mated_in(ply);
        }

        let bound = if is_pv && best_value > old_alpha {
            NodeBound::Exact
        } else {
            NodeBound::UpperBound
        };
        tt_writer.save(
            key,
            value_to_tt(best_value, ply),
            is_pv,
            bound,
            0,
            best_move,
            ss.static_eval,
        );

        best_value
    }

    /// Credits a quiet move that improved the node and penalizes the
    /// quiets tried before it; installs killer and counter slots.
    fn update_quiet_stats(
        &mut self,
        mv: Move,
        ss: &mut Stack,
        prev_move: Move,
        quiets_tried: &[Move],
        bonus: i32,
    ) {
        self.killers.update(ss.ply, mv);

        let us = self.board.turn();
        let attacked = self.board.state().attacked;
        let bonus16 = bonus.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;

        let idx = |m: Move| {
            (
                us,
                attacked.contains(m.from()),
                attacked.contains(m.to()),
                m.from(),
                m.to(),
            )
        };

        self.main_history.update(idx(mv), bonus16);
        update_continuation_histories(ss, self.board.moved_piece(mv), mv.to(), bonus16);

        if prev_move.is_okay() {
            let prev_piece = self.board.piece_on(prev_move.to());
            if prev_piece != Piece::None {
                self.counter_moves[(prev_piece, prev_move.to())] = mv;
            }
        }

        for &q in quiets_tried {
            self.main_history.update(idx(q), -bonus16);
            update_continuation_histories(ss, self.board.moved_piece(q), q.to(), -bonus16);
        }
    }

    /// Credits a capture that improved the node and penalizes the captures
    /// tried before it.
    fn update_capture_stats(&mut self, best: Move, captures_tried: &[Move], bonus: i32) {
        let attacked = self.board.state().attacked;
        let bonus16 = bonus.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        let best_is_capture = self.board.is_capture_or_promotion(best);

        let mut update = |m: Move, b: i16| {
            let piece = self.board.moved_piece(m);
            let captured = self.board.captured_piece(m);
            self.capture_history.update(
                (
                    piece,
                    attacked.contains(m.from()),
                    attacked.contains(m.to()),
                    m.to(),
                    captured,
                ),
                b,
            );
        };

        if best_is_capture {
            update(best, bonus16);
        }
        for &c in captures_tried {
            update(c, -bonus16);
        }
    }

    #[inline(always)]
    fn apply_move(&mut self, m: Move) {
        self.nodes.fetch_add(1, Ordering::Relaxed);
        self.board.make_move(m);
    }

    /// Runs the evaluator collaborator.
    #[inline(always)]
    pub fn eval(&self) -> Value {
        Eval::evaluate(&self.board)
    }

    /// A draw score with a tiny node-parity offset so repetitions don't
    /// oscillate around exact zero.
    #[inline(always)]
    fn draw_value(&self) -> Value {
        DRAW + 1 - (self.nodes.load(Ordering::Relaxed) as Value & 2)
    }

    #[inline(always)]
    pub fn main_thread(&self) -> bool {
        self.id == 0
    }

    #[inline(always)]
    fn stop(&self) -> bool {
        threadpool().stop.load(Ordering::Relaxed)
    }

    fn check_time(&mut self) {
        if self.limit.use_time_management() {
            if self.time_man.elapsed() >= self.time_man.maximum() {
                threadpool().set_stop(true);
            }
        } else if let Some(movetime) = self.limit.movetime {
            if self.limit.elapsed() >= movetime {
                threadpool().set_stop(true);
            }
        }
        if let Some(max_nodes) = self.limit.nodes {
            if threadpool().nodes() >= max_nodes {
                threadpool().set_stop(true);
            }
        }
    }

    #[inline(always)]
    pub fn use_stdout(&self) -> bool {
        USE_STDOUT.load(Ordering::Relaxed)
    }

    /// Prints a UCI `info` line for the current depth: depth, seldepth,
    /// score, nodes, nps, hashfull, time, pv.
    fn print_pv(&self, depth: i16) {
        let root_move = self.root_moves.first();
        let score = if root_move.score == NEG_INFINITE {
            root_move.prev_score
        } else {
            root_move.score
        };
        if score == NEG_INFINITE {
            return;
        }

        let elapsed = self.time_man.elapsed().max(1) as u64;
        let nodes = threadpool().nodes();

        let mut line = String::with_capacity(128);
        line.push_str(&format!("info depth {} seldepth {}", depth, self.sel_depth));
        if score.abs() >= MATE_BOUND {
            let mate_in = if score > 0 {
                (MATE - score + 1) / 2
            } else {
                (-MATE - score) / 2
            };
            line.push_str(&format!(" score mate {}", mate_in));
        } else {
            line.push_str(&format!(" score cp {}", score));
        }
        line.push_str(&format!(" nodes {}", nodes));
        line.push_str(&format!(" nps {}", nodes * 1000 / elapsed));
        line.push_str(&format!(" hashfull {}", tt().hashfull(0)));
        line.push_str(&format!(" time {}", elapsed));
        line.push_str(" pv");
        for m in self.extract_pv(depth).iter() {
            line.push_str(&format!(" {}", m));
        }
        println!("{}", line);
    }

    /// Reconstructs the principal variation by walking the transposition
    /// table from the root.
    fn extract_pv(&self, depth: i16) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut board = self.board.shallow_clone();
        let first = self.root_moves.first_move();
        if !first.is_okay() {
            return pv;
        }
        board.make_move(first);
        pv.push(first);

        while (pv.len() as i16) < depth {
            let (hit, data, _) = tt().probe(board.key());
            if !hit || !data.best_move.is_okay() || !board.is_legal(data.best_move) {
                break;
            }
            board.make_move(data.best_move);
            pv.push(data.best_move);
            if board.is_draw(pv.len() as u16) {
                break;
            }
        }
        pv
    }
}

impl Drop for Searcher {
    fn drop(&mut self) {
        self.searching.set(false);
    }
}

/// Applies the gravity bonus to the continuation histories planted in
/// the stack by the moves of one, two and four plies ago.
fn update_continuation_histories(ss: &mut Stack, piece: Piece, to: Square, bonus: i16) {
    use crate::tables::NumStatBoard;
    for i in [1_isize, 2, 4] {
        let frame = ss.offset(-i);
        if frame.current_move.is_okay() && !frame.cont_history.is_null() {
            unsafe {
                (*frame.cont_history).update((piece, to), bonus);
            }
        }
    }
}

/// Returns if a stored bound makes its value usable against `bound_on`.
fn bound_allows_cutoff(tt_value: Value, bound_on: Value, bound: NodeBound) -> bool {
    if tt_value >= bound_on {
        bound as u8 & NodeBound::LowerBound as u8 != 0
    } else {
        bound as u8 & NodeBound::UpperBound as u8 != 0
    }
}

fn reduction<N: PVNode>(improving: bool, depth: i16, move_number: u32) -> i16 {
    unsafe {
        REDUCTIONS[N::is_pv() as usize][improving as usize][(depth as usize).min(63)]
            [(move_number as usize).min(63)]
    }
}

fn stat_bonus(depth: i16) -> i32 {
    if depth > 17 {
        0
    } else {
        let d = i32::from(depth);
        d * d + 2 * d - 2
    }
}
