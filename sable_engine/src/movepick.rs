//! The staged move picker: lazily generates and hands out moves in an
//! order that maximizes the chance of an early beta cutoff.
//!
//! Stages for the main search:
//!
//! 1. the transposition-table move, validated for legality,
//! 2. captures, generated all at once and scored by victim value plus
//!    capture history,
//! 3. good captures: the best remaining capture, accepted when a static
//!    exchange against a score-scaled threshold does not lose material;
//!    rejected captures are deferred,
//! 4. quiets, scored by history, continuation history, killer and
//!    counter-move bonuses,
//! 5. the deferred bad captures.
//!
//! Quiescence uses the same machinery with quiets skipped unless in check;
//! probcut yields only captures beating its exchange threshold.
//!
//! Selection is a linear scan for the argmax of the remaining slice,
//! swapped to the front. The TT move is never yielded twice.
//!
//! # Safety
//!
//! The picker holds raw pointers to the board and the worker's heuristic
//! tables: the search makes and unmakes moves on the same board between
//! calls to [`next`], which is sound because the board is restored to the
//! picker's position before each call.
//!
//! [`next`]: struct.MovePicker.html#method.next

use sable::board::movegen::MoveGen;
use sable::board::Board;
use sable::core::mono_traits::{CapturesGenType, QuietsGenType};
use sable::core::move_list::ScoredMoveList;
use sable::core::piece_move::Move;
use sable::core::score::{Value, PIECE_VALUE_SEE};
use sable::PieceType;

use crate::tables::{ButterflyHistory, CaptureHistory, PieceToHistory};

const TT_MOVE_SCORE: i32 = 1_000_000;
const QUEEN_PROMO_BONUS: i32 = 64_000;
const COUNTER_BONUS: i32 = 32_000;
const KILLER_ONE_BONUS: i32 = 9_000;
const KILLER_TWO_BONUS: i32 = 8_000;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Stage {
    TTMove,
    CaptureInit,
    GoodCapture,
    QuietInit,
    GoodQuiet,
    BadCapture,
    ProbcutInit,
    Probcut,
    Done,
}

/// Per-node move picker. Constructed fresh at every node of the search.
pub struct MovePicker {
    board: *const Board,
    stage: Stage,
    tt_move: Move,
    killer1: Move,
    killer2: Move,
    counter: Move,
    threshold: Value,
    skip_quiets: bool,
    history: *const ButterflyHistory,
    capture_history: *const CaptureHistory,
    cont_hists: [*const PieceToHistory; 4],
    moves: ScoredMoveList,
    cur: usize,
    capture_end: usize,
    bad_end: usize,
    quiet_start: usize,
    quiets_generated: bool,
}

impl MovePicker {
    /// Creates a picker for a main-search node.
    #[allow(clippy::too_many_arguments)]
    pub fn main_search(
        board: &Board,
        tt_move: Move,
        killers: [Move; 2],
        counter: Move,
        history: &ButterflyHistory,
        capture_history: &CaptureHistory,
        cont_hists: [*const PieceToHistory; 4],
    ) -> Self {
        let tt_move = if tt_move.is_okay() && board.is_legal(tt_move) {
            tt_move
        } else {
            Move::none()
        };
        // Killer and counter slots only ever hold quiets.
        let keep_quiet = |m: Move| {
            if m.is_okay() && !board.is_capture(m) {
                m
            } else {
                Move::none()
            }
        };

        MovePicker {
            board: board as *const Board,
            stage: Stage::TTMove,
            tt_move,
            killer1: keep_quiet(killers[0]),
            killer2: keep_quiet(killers[1]),
            counter: keep_quiet(counter),
            threshold: 0,
            skip_quiets: false,
            history: history as *const ButterflyHistory,
            capture_history: capture_history as *const CaptureHistory,
            cont_hists,
            moves: ScoredMoveList::default(),
            cur: 0,
            capture_end: 0,
            bad_end: 0,
            quiet_start: 0,
            quiets_generated: false,
        }
    }

    /// Creates a picker for a quiescence node. Quiets are skipped unless
    /// the position is in check, in which case every evasion is
    /// considered.
    pub fn qsearch(
        board: &Board,
        tt_move: Move,
        history: &ButterflyHistory,
        capture_history: &CaptureHistory,
    ) -> Self {
        let in_check = board.in_check();
        let tt_move = if tt_move.is_okay()
            && board.is_legal(tt_move)
            && (in_check || board.is_capture_or_promotion(tt_move))
        {
            tt_move
        } else {
            Move::none()
        };

        MovePicker {
            board: board as *const Board,
            stage: Stage::TTMove,
            tt_move,
            killer1: Move::none(),
            killer2: Move::none(),
            counter: Move::none(),
            threshold: 0,
            skip_quiets: !in_check,
            history: history as *const ButterflyHistory,
            capture_history: capture_history as *const CaptureHistory,
            cont_hists: [std::ptr::null(); 4],
            moves: ScoredMoveList::default(),
            cur: 0,
            capture_end: 0,
            bad_end: 0,
            quiet_start: 0,
            quiets_generated: false,
        }
    }

    /// Creates a picker for a probcut node: captures whose static
    /// exchange beats `threshold`.
    pub fn probcut(board: &Board, capture_history: &CaptureHistory, threshold: Value) -> Self {
        MovePicker {
            board: board as *const Board,
            stage: Stage::ProbcutInit,
            tt_move: Move::none(),
            killer1: Move::none(),
            killer2: Move::none(),
            counter: Move::none(),
            threshold,
            skip_quiets: true,
            history: std::ptr::null(),
            capture_history: capture_history as *const CaptureHistory,
            cont_hists: [std::ptr::null(); 4],
            moves: ScoredMoveList::default(),
            cur: 0,
            capture_end: 0,
            bad_end: 0,
            quiet_start: 0,
            quiets_generated: false,
        }
    }

    #[inline(always)]
    fn board(&self) -> &Board {
        unsafe { &*self.board }
    }

    /// Yields the next move, best first, or `None` when exhausted.
    ///
    /// Raising `skip_quiets` mid-iteration abandons the remaining quiet
    /// moves (late move pruning); deferred bad captures still follow.
    pub fn next(&mut self, skip_quiets: bool) -> Option<Move> {
        self.skip_quiets |= skip_quiets;
        loop {
            match self.stage {
                Stage::TTMove => {
                    self.stage = Stage::CaptureInit;
                    if self.tt_move != Move::none() {
                        return Some(self.tt_move);
                    }
                }
                Stage::CaptureInit => {
                    MoveGen::extend::<CapturesGenType, _>(unsafe { &*self.board }, &mut self.moves);
                    self.capture_end = self.moves.len();
                    self.score_captures(0);
                    self.cur = 0;
                    self.bad_end = 0;
                    self.stage = Stage::GoodCapture;
                }
                Stage::GoodCapture => {
                    while self.cur < self.capture_end {
                        self.bring_best_forward(self.cur, self.capture_end);
                        let sm = self.moves[self.cur];
                        self.cur += 1;
                        if sm.mv == self.tt_move {
                            continue;
                        }
                        if self.board().see_ge(sm.mv, -sm.score / 20) {
                            return Some(sm.mv);
                        }
                        // Losing capture: shuffle into the deferred region
                        // at the consumed front of the list.
                        debug_assert!(self.bad_end < self.cur);
                        self.moves[self.bad_end] = sm;
                        self.bad_end += 1;
                    }
                    self.stage = Stage::QuietInit;
                }
                Stage::QuietInit => {
                    if !self.skip_quiets {
                        self.quiet_start = self.moves.len();
                        MoveGen::extend::<QuietsGenType, _>(unsafe { &*self.board }, &mut self.moves);
                        self.score_quiets(self.quiet_start);
                        self.cur = self.quiet_start;
                        self.quiets_generated = true;
                    }
                    self.stage = Stage::GoodQuiet;
                }
                Stage::GoodQuiet => {
                    if !self.skip_quiets && self.quiets_generated {
                        while self.cur < self.moves.len() {
                            self.bring_best_forward(self.cur, self.moves.len());
                            let sm = self.moves[self.cur];
                            self.cur += 1;
                            if sm.mv == self.tt_move {
                                continue;
                            }
                            return Some(sm.mv);
                        }
                    }
                    self.cur = 0;
                    self.stage = Stage::BadCapture;
                }
                Stage::BadCapture => {
                    while self.cur < self.bad_end {
                        self.bring_best_forward(self.cur, self.bad_end);
                        let sm = self.moves[self.cur];
                        self.cur += 1;
                        debug_assert_ne!(sm.mv, self.tt_move);
                        return Some(sm.mv);
                    }
                    self.stage = Stage::Done;
                }
                Stage::ProbcutInit => {
                    MoveGen::extend::<CapturesGenType, _>(unsafe { &*self.board }, &mut self.moves);
                    self.capture_end = self.moves.len();
                    self.score_captures(0);
                    self.cur = 0;
                    self.stage = Stage::Probcut;
                }
                Stage::Probcut => {
                    while self.cur < self.capture_end {
                        self.bring_best_forward(self.cur, self.capture_end);
                        let sm = self.moves[self.cur];
                        self.cur += 1;
                        if self.board().see_ge(sm.mv, self.threshold) {
                            return Some(sm.mv);
                        }
                    }
                    self.stage = Stage::Done;
                }
                Stage::Done => return None,
            }
        }
    }

    /// Swaps the highest-scored move of `[from, to)` into index `from`.
    fn bring_best_forward(&mut self, from: usize, to: usize) {
        debug_assert!(from < to);
        let mut best = from;
        for i in from + 1..to {
            if self.moves[i].score > self.moves[best].score {
                best = i;
            }
        }
        self.moves.as_mut_slice().swap(from, best);
    }

    fn score_captures(&mut self, from: usize) {
        let board: &Board = unsafe { &*self.board };
        let attacked = board.state().attacked;
        for i in from..self.moves.len() {
            let m = self.moves[i].mv;
            let score = if m == self.tt_move {
                TT_MOVE_SCORE
            } else {
                let captured = board.captured_piece(m);
                let piece = board.moved_piece(m);
                let threat_from = attacked.contains(m.from());
                let threat_to = attacked.contains(m.to());

                let mut score = i32::from(PIECE_VALUE_SEE[captured as usize]);
                if m.is_promotion() && m.promo() == PieceType::Queen {
                    score += QUEEN_PROMO_BONUS;
                }
                if !self.capture_history.is_null() {
                    let ch = unsafe { &*self.capture_history };
                    score += i32::from(ch[(piece, threat_from, threat_to, m.to(), captured)]);
                }
                score
            };
            self.moves[i].score = score;
        }
    }

    fn score_quiets(&mut self, from: usize) {
        let board: &Board = unsafe { &*self.board };
        let attacked = board.state().attacked;
        let us = board.turn();
        for i in from..self.moves.len() {
            let m = self.moves[i].mv;
            let score = if m == self.tt_move {
                TT_MOVE_SCORE
            } else {
                let piece = board.moved_piece(m);
                let threat_from = attacked.contains(m.from());
                let threat_to = attacked.contains(m.to());

                let mut score: i32 = 0;
                if !self.history.is_null() {
                    let h = unsafe { &*self.history };
                    score += i32::from(h[(us, threat_from, threat_to, m.from(), m.to())]);
                }
                for ch in self.cont_hists.iter() {
                    if !ch.is_null() {
                        score += i32::from(unsafe { &**ch }[(piece, m.to())]);
                    }
                }

                if m == self.counter {
                    score += COUNTER_BONUS;
                }
                if m == self.killer1 {
                    score += KILLER_ONE_BONUS;
                } else if m == self.killer2 {
                    score += KILLER_TWO_BONUS;
                }
                score
            };
            self.moves[i].score = score;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::StatBoard;

    fn drain(picker: &mut MovePicker) -> Vec<Move> {
        let mut out = Vec::new();
        while let Some(m) = picker.next(false) {
            out.push(m);
        }
        out
    }

    #[test]
    fn yields_every_legal_move_exactly_once() {
        let board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let history = ButterflyHistory::new();
        let capture_history = CaptureHistory::new();

        let mut picker = MovePicker::main_search(
            &board,
            Move::none(),
            [Move::none(); 2],
            Move::none(),
            &history,
            &capture_history,
            [std::ptr::null(); 4],
        );
        let mut picked = drain(&mut picker);
        picked.sort_by_key(|m| m.raw());
        assert!(picked.windows(2).all(|w| w[0] != w[1]));

        let mut all = board.generate_moves().vec();
        all.sort_by_key(|m| m.raw());
        assert_eq!(picked, all);
    }

    #[test]
    fn tt_move_comes_first_and_only_once() {
        let board = Board::start_pos();
        let history = ButterflyHistory::new();
        let capture_history = CaptureHistory::new();
        let ttm = board.to_move("e2e4").unwrap();

        let mut picker = MovePicker::main_search(
            &board,
            ttm,
            [Move::none(); 2],
            Move::none(),
            &history,
            &capture_history,
            [std::ptr::null(); 4],
        );
        let picked = drain(&mut picker);
        assert_eq!(picked[0], ttm);
        assert_eq!(picked.iter().filter(|&&m| m == ttm).count(), 1);
        assert_eq!(picked.len(), 20);
    }

    #[test]
    fn illegal_tt_move_is_dropped() {
        let board = Board::start_pos();
        let history = ButterflyHistory::new();
        let capture_history = CaptureHistory::new();
        // A move that is legal somewhere, just not here.
        let bogus = Move::encode(sable::core::sq::Square::E4, sable::core::sq::Square::E5);

        let mut picker = MovePicker::main_search(
            &board,
            bogus,
            [Move::none(); 2],
            Move::none(),
            &history,
            &capture_history,
            [std::ptr::null(); 4],
        );
        let picked = drain(&mut picker);
        assert_eq!(picked.len(), 20);
        assert!(!picked.contains(&bogus));
    }

    #[test]
    fn killers_rank_above_plain_quiets() {
        let board = Board::start_pos();
        let history = ButterflyHistory::new();
        let capture_history = CaptureHistory::new();
        let killer = board.to_move("g1f3").unwrap();

        let mut picker = MovePicker::main_search(
            &board,
            Move::none(),
            [killer, Move::none()],
            Move::none(),
            &history,
            &capture_history,
            [std::ptr::null(); 4],
        );
        let picked = drain(&mut picker);
        assert_eq!(picked[0], killer);
    }

    #[test]
    fn skip_quiets_only_leaves_captures() {
        let board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let history = ButterflyHistory::new();
        let capture_history = CaptureHistory::new();

        let mut picker = MovePicker::main_search(
            &board,
            Move::none(),
            [Move::none(); 2],
            Move::none(),
            &history,
            &capture_history,
            [std::ptr::null(); 4],
        );
        let mut picked = Vec::new();
        while let Some(m) = picker.next(true) {
            picked.push(m);
        }
        assert!(!picked.is_empty());
        for m in picked {
            assert!(board.is_capture_or_promotion(m));
        }
    }

    #[test]
    fn qsearch_in_check_yields_all_evasions() {
        let board =
            Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/5PPq/8/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert!(board.in_check());
        let history = ButterflyHistory::new();
        let capture_history = CaptureHistory::new();

        let mut picker = MovePicker::qsearch(&board, Move::none(), &history, &capture_history);
        let picked = drain(&mut picker);
        assert_eq!(picked.len(), board.generate_moves().len());
    }
}
