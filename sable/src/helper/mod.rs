//! Statically initialized lookup tables.
//!
//! Whenever a `Board` is created these tables are initialized as well.
//! Calling `Helper::new()` builds the tables the first time it's called;
//! successive calls don't waste time re-initializing.
//!
//! It is recommended to go through a `Helper` to access these tables, as
//! that guarantees initialization in the first place. For the same
//! functions without the guarantee, see [`helper::prelude`].
//!
//! [`helper::prelude`]: prelude/index.html

mod boards;
mod magic;
pub mod prelude;
mod psqt;
mod zobrist;

use crate::core::score::{Score, Value};
use crate::core::sq::Square;
use crate::core::{Piece, PieceType, Player};
use crate::Bitboard;

/// Helper structure for accessing the statically-initialized tables.
///
/// Constructing a `Helper` guarantees the tables are initialized.
#[derive(Copy, Clone, Default)]
pub struct Helper {}

unsafe impl Send for Helper {}
unsafe impl Sync for Helper {}

impl Helper {
    /// Creates a new `Helper`, initializing the needed tables if this is
    /// the first use anywhere in the process.
    pub fn new() -> Self {
        prelude::init_statics();
        Helper {}
    }

    /// Generates the bishop attack `Bitboard` from a square and total
    /// board occupancy.
    #[inline(always)]
    pub fn bishop_moves(self, occupied: Bitboard, sq: Square) -> Bitboard {
        prelude::bishop_moves(occupied, sq)
    }

    /// Generates the rook attack `Bitboard` from a square and total board
    /// occupancy.
    #[inline(always)]
    pub fn rook_moves(self, occupied: Bitboard, sq: Square) -> Bitboard {
        prelude::rook_moves(occupied, sq)
    }

    /// Generates the queen attack `Bitboard` from a square and total board
    /// occupancy.
    #[inline(always)]
    pub fn queen_moves(self, occupied: Bitboard, sq: Square) -> Bitboard {
        prelude::queen_moves(occupied, sq)
    }

    /// Generates the knight move `Bitboard` from a source square.
    #[inline(always)]
    pub fn knight_moves(self, sq: Square) -> Bitboard {
        prelude::knight_moves(sq)
    }

    /// Generates the king move `Bitboard` from a source square.
    #[inline(always)]
    pub fn king_moves(self, sq: Square) -> Bitboard {
        prelude::king_moves(sq)
    }

    /// Returns the pawn attack `Bitboard` from a square for a player.
    #[inline(always)]
    pub fn pawn_attacks_from(self, sq: Square, player: Player) -> Bitboard {
        prelude::pawn_attacks_from(sq, player)
    }

    /// Returns the distance of two squares.
    #[inline(always)]
    pub fn distance_of_sqs(self, sq_one: Square, sq_two: Square) -> u8 {
        prelude::distance_of_sqs(sq_one, sq_two)
    }

    /// Returns the line both squares share, if any.
    #[inline(always)]
    pub fn line_bb(self, sq_one: Square, sq_two: Square) -> Bitboard {
        prelude::line_bb(sq_one, sq_two)
    }

    /// Returns the squares strictly between two squares.
    #[inline(always)]
    pub fn between_bb(self, sq_one: Square, sq_two: Square) -> Bitboard {
        prelude::between_bb(sq_one, sq_two)
    }

    /// Returns the pin ray from a king through to a pinning slider.
    #[inline(always)]
    pub fn pin_bb(self, king_sq: Square, pinner_sq: Square) -> Bitboard {
        prelude::pin_bb(king_sq, pinner_sq)
    }

    /// Returns the check ray for a king checked from a square.
    #[inline(always)]
    pub fn check_bb(self, king_sq: Square, checker_sq: Square) -> Bitboard {
        prelude::check_bb(king_sq, checker_sq)
    }

    /// Returns if three squares share a diagonal, file, or rank.
    #[inline(always)]
    pub fn aligned(self, s1: Square, s2: Square, s3: Square) -> bool {
        prelude::aligned(s1, s2, s3)
    }

    /// Returns the zobrist hash of a piece at a square.
    #[inline(always)]
    pub fn z_square(self, sq: Square, piece: Piece) -> u64 {
        prelude::z_square(sq, piece)
    }

    /// Returns the zobrist hash of an en-passant file.
    #[inline(always)]
    pub fn z_ep(self, sq: Square) -> u64 {
        prelude::z_ep(sq)
    }

    /// Returns the zobrist hash of a set of castling rights.
    #[inline(always)]
    pub fn z_castle(self, castle: u8) -> u64 {
        prelude::z_castle(castle)
    }

    /// Returns the zobrist hash of flipping sides.
    #[inline(always)]
    pub fn z_side(self) -> u64 {
        prelude::z_side()
    }

    /// Returns the material + positional score of a piece at a square.
    #[inline(always)]
    pub fn psq(self, piece: Piece, sq: Square) -> Score {
        prelude::psq(piece, sq)
    }

    /// Returns the value of a piece type, end-game if `eg` is set.
    #[inline(always)]
    pub fn piecetype_value(self, piece_type: PieceType, eg: bool) -> Value {
        prelude::piecetype_value(piece_type, eg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_helper() {
        Helper::new();
    }

    #[test]
    fn slider_attacks_empty_board() {
        let h = Helper::new();
        let occ = Bitboard::EMPTY;
        assert_eq!(h.rook_moves(occ, Square::A1).count_bits(), 14);
        assert_eq!(h.bishop_moves(occ, Square::D4).count_bits(), 13);
        assert_eq!(
            h.queen_moves(occ, Square::D4),
            h.rook_moves(occ, Square::D4) | h.bishop_moves(occ, Square::D4)
        );
    }

    #[test]
    fn slider_attacks_with_blockers() {
        let h = Helper::new();
        let occ = Square::A3.to_bb() | Square::C1.to_bb();
        let rook = h.rook_moves(occ, Square::A1);
        // Stops at and includes the first blocker.
        assert!(rook.contains(Square::A2));
        assert!(rook.contains(Square::A3));
        assert!(!rook.contains(Square::A4));
        assert!(rook.contains(Square::B1));
        assert!(rook.contains(Square::C1));
        assert!(!rook.contains(Square::D1));
    }

    #[test]
    fn between_and_line() {
        let h = Helper::new();
        assert_eq!(
            h.between_bb(Square::A1, Square::D4),
            Square::B2.to_bb() | Square::C3.to_bb()
        );
        assert!(h.line_bb(Square::A1, Square::H8).contains(Square::E5));
        assert!(h.aligned(Square::A1, Square::C3, Square::E5));
        assert!(!h.aligned(Square::A1, Square::C3, Square::E4));
    }

    #[test]
    fn pin_and_check_rays() {
        let h = Helper::new();
        // Pin ray includes the pinner, not the king.
        let pin = h.pin_bb(Square::E1, Square::E8);
        assert!(pin.contains(Square::E8));
        assert!(pin.contains(Square::E4));
        assert!(!pin.contains(Square::E1));
        // Check ray includes the king and the square behind it.
        let check = h.check_bb(Square::E4, Square::E8);
        assert!(check.contains(Square::E4));
        assert!(check.contains(Square::E3));
        assert!(!check.contains(Square::E8));
    }

    #[test]
    fn distance_table() {
        let h = Helper::new();
        assert_eq!(h.distance_of_sqs(Square::A1, Square::H8), 7);
        assert_eq!(h.distance_of_sqs(Square::E4, Square::E5), 1);
        assert_eq!(h.distance_of_sqs(Square::E4, Square::E4), 0);
    }
}
