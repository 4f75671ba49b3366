//! The `BoardState` structure, which preserves everything about a position
//! that a move changes irreversibly, so that unmaking a move never needs to
//! recompute information.
//!
//! A new `BoardState` is created for every move made by the [`Board`]; the
//! states link backwards to form a persistent stack, and unmake simply
//! pops it.
//!
//! [`Board`]: ../struct.Board.html

use super::castle_rights::Castling;

use crate::core::masks::PLAYER_CNT;
use crate::core::piece_move::Move;
use crate::core::score::{Score, Value};
use crate::core::sq::{Square, NO_SQ};
use crate::core::Piece;
use crate::Bitboard;

use std::sync::Arc;

/// Holds the per-ply information of the board.
///
/// The first group of fields is copied forward from the previous state and
/// incrementally modified by make; the rest is recomputed from scratch by
/// the mask refresh after every make and unmake.
#[derive(Clone)]
pub struct BoardState {
    // Copied forward when making a move.
    /// The castling rights for the current position.
    pub castling: Castling,
    /// Half-moves since the last capture or pawn move, for the fifty-move
    /// rule.
    pub rule_50: i16,
    /// Plies played since this state chain was created.
    pub ply: u16,
    /// If the last move was a double pawn push, the square behind the push;
    /// `NO_SQ` otherwise, and also when no enemy pawn could capture onto it.
    pub ep_square: Square,
    /// The accumulated material + piece-square score of the position.
    pub psq: Score,
    /// The game phase, decreasing as non-pawn material leaves the board.
    pub game_phase: i32,
    /// The value of each player's non-pawn material.
    pub nonpawn_material: [Value; PLAYER_CNT],

    // Recomputed after a move.
    /// The Zobrist key of the position.
    pub key: u64,
    /// The Zobrist key of the pawn structure alone.
    pub pawn_key: u64,
    /// The piece captured by the last move, if any.
    pub captured: Piece,
    /// Repetition marker: zero if this position has not occurred earlier in
    /// the chain, otherwise the distance to the previous occurrence,
    /// negated if that occurrence was itself a repetition.
    pub repetition: i16,
    /// Full if the side to move is not in check; the block-or-capture
    /// squares under single check; empty under double check.
    pub check_mask: Bitboard,
    /// Squares the side-to-move king may never step onto: everything
    /// attacked by the enemy (sliders seeing through our king) plus the
    /// squares adjacent to the enemy king.
    pub king_ban: Bitboard,
    /// Precomputed legal king destinations.
    pub king_attacks: Bitboard,
    /// All squares attacked by the enemy with the current occupancy. Only
    /// valid when `king_attacks` was non-empty during refresh.
    pub attacked: Bitboard,
    /// `check_mask & !own_occupancy`: the destination filter for every
    /// non-king move.
    pub available: Bitboard,
    /// Full pin rays (king through pinned piece to pinner) for diagonal
    /// pinners.
    pub bishop_pin: Bitboard,
    /// Full pin rays for straight-line pinners.
    pub rook_pin: Bitboard,
    /// Set if capturing en-passant would discover a rook or queen check
    /// along the en-passant rank.
    pub ep_pin: bool,
    /// The move that produced this state; `Move::none()` for a root state.
    pub prev_move: Move,
    /// The previous state, one move ago.
    pub prev: Option<Arc<BoardState>>,
}

impl BoardState {
    /// Constructs a blank `BoardState`.
    pub fn blank() -> BoardState {
        BoardState {
            castling: Castling::empty(),
            rule_50: 0,
            ply: 0,
            ep_square: NO_SQ,
            psq: Score::ZERO,
            game_phase: 0,
            nonpawn_material: [0; PLAYER_CNT],
            key: 0,
            pawn_key: 0,
            captured: Piece::None,
            repetition: 0,
            check_mask: Bitboard::ALL,
            king_ban: Bitboard::EMPTY,
            king_attacks: Bitboard::EMPTY,
            attacked: Bitboard::EMPTY,
            available: Bitboard::EMPTY,
            bishop_pin: Bitboard::EMPTY,
            rook_pin: Bitboard::EMPTY,
            ep_pin: false,
            prev_move: Move::none(),
            prev: None,
        }
    }

    /// Constructs a partial clone: the copied-forward fields keep their
    /// values, the recomputed fields are reset for the next move.
    pub fn partial_clone(&self) -> BoardState {
        BoardState {
            castling: self.castling,
            rule_50: self.rule_50,
            ply: self.ply,
            ep_square: self.ep_square,
            psq: self.psq,
            game_phase: self.game_phase,
            nonpawn_material: self.nonpawn_material,
            key: self.key,
            pawn_key: self.pawn_key,
            captured: Piece::None,
            repetition: 0,
            check_mask: Bitboard::ALL,
            king_ban: Bitboard::EMPTY,
            king_attacks: Bitboard::EMPTY,
            attacked: Bitboard::EMPTY,
            available: Bitboard::EMPTY,
            bishop_pin: Bitboard::EMPTY,
            rook_pin: Bitboard::EMPTY,
            ep_pin: false,
            prev_move: Move::none(),
            prev: None,
        }
    }

    /// Returns the previous `BoardState` from one move ago.
    #[inline]
    pub fn get_prev(&self) -> Option<Arc<BoardState>> {
        self.prev.as_ref().cloned()
    }
}

impl PartialEq for BoardState {
    fn eq(&self, other: &BoardState) -> bool {
        self.castling == other.castling
            && self.rule_50 == other.rule_50
            && self.ep_square == other.ep_square
            && self.key == other.key
            && self.pawn_key == other.pawn_key
            && self.psq == other.psq
            && self.game_phase == other.game_phase
            && self.nonpawn_material == other.nonpawn_material
            && self.captured == other.captured
            && self.check_mask == other.check_mask
            && self.king_ban == other.king_ban
            && self.bishop_pin == other.bishop_pin
            && self.rook_pin == other.rook_pin
            && self.ep_pin == other.ep_pin
    }
}
