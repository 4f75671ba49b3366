//! A hand-crafted evaluation function.
//!
//! Returns a centipawn score from the side-to-move's perspective, built
//! from the incrementally maintained material + piece-square score, a pawn
//! structure term, a bishop-pair bonus, and a tempo bonus. The middle-game
//! and end-game components are blended by the board's game phase.
//!
//! Every number in here is a tunable parameter; nothing in the search
//! depends on these exact weights.

use crate::board::Board;
use crate::core::masks::*;
use crate::core::score::{Score, Value};
use crate::core::{PieceType, Player};
use crate::Bitboard;

/// Bonus for having the move.
const TEMPO: Value = 18;

/// Penalty per doubled pawn.
const DOUBLED: Score = Score(11, 35);

/// Penalty per isolated pawn.
const ISOLATED: Score = Score(8, 17);

/// Bonus for a passed pawn, by relative rank.
static PASSED: [Score; 8] = [
    Score(0, 0),
    Score(3, 9),
    Score(7, 14),
    Score(12, 32),
    Score(32, 57),
    Score(86, 120),
    Score(145, 195),
    Score(0, 0),
];

/// Bonus for owning both bishops.
const BISHOP_PAIR: Score = Score(34, 52);

/// Evaluates a board position.
pub struct Eval {}

impl Eval {
    /// Returns a score of the board from the perspective of the side to
    /// move. Pure: no state is kept between calls.
    pub fn evaluate(board: &Board) -> Value {
        let mut score = board.psq();
        score += pawn_structure(board, Player::White) - pawn_structure(board, Player::Black);

        if board.count_piece(Player::White, PieceType::Bishop) >= 2 {
            score += BISHOP_PAIR;
        }
        if board.count_piece(Player::Black, PieceType::Bishop) >= 2 {
            score -= BISHOP_PAIR;
        }

        let mut value = score.interpolate(board.game_phase());
        if board.turn() == Player::Black {
            value = -value;
        }
        value + TEMPO
    }
}

fn pawn_structure(board: &Board, player: Player) -> Score {
    let us_pawns = board.piece_bb(player, PieceType::Pawn);
    let them_pawns = board.piece_bb(!player, PieceType::Pawn);
    let mut score = Score::ZERO;

    let mut pawns = us_pawns;
    while let Some(sq) = pawns.pop_some_lsb() {
        let file = sq.file_idx() as usize;
        let ahead = forward_ranks(player, sq.rank_idx());

        if (Bitboard(FILE_BB[file]) & ahead & us_pawns).is_not_empty() {
            score -= DOUBLED;
        }
        if (adjacent_files(file) & us_pawns).is_empty() {
            score -= ISOLATED;
        }
        let passed_span = (Bitboard(FILE_BB[file]) | adjacent_files(file)) & ahead;
        if (passed_span & them_pawns).is_empty() {
            score += PASSED[player.relative_rank_of_sq(sq) as usize];
        }
    }
    score
}

#[inline]
fn forward_ranks(player: Player, rank: u8) -> Bitboard {
    match player {
        Player::White => Bitboard(!0_u64 << (8 * (rank as u64 + 1))),
        Player::Black => Bitboard(!0_u64 >> (8 * (8 - rank as u64))),
    }
}

#[inline]
fn adjacent_files(file: usize) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    if file > 0 {
        bb |= Bitboard(FILE_BB[file - 1]);
    }
    if file < 7 {
        bb |= Bitboard(FILE_BB[file + 1]);
    }
    bb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_is_balanced() {
        let board = Board::start_pos();
        let v = Eval::evaluate(&board);
        // Symmetric position: only the tempo bonus separates the sides.
        assert_eq!(v, TEMPO);
    }

    #[test]
    fn evaluation_flips_with_turn() {
        let board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let mut flipped = board.shallow_clone();
        flipped.make_null_move();
        let v = Eval::evaluate(&board);
        let v_flipped = Eval::evaluate(&flipped);
        assert_eq!(v - TEMPO, -(v_flipped - TEMPO));
    }

    #[test]
    fn extra_queen_wins_eval() {
        let up_queen = Board::from_fen("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1").unwrap();
        assert!(Eval::evaluate(&up_queen) > 500);
    }
}
