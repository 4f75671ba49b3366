//! Raw access to the statically computed tables.
//!
//! # Safety
//!
//! Using these functions requires that [`init_statics`] has run; going
//! through a [`Helper`] guarantees initialization.
//!
//! [`Helper`]: ../struct.Helper.html
//! [`init_statics`]: fn.init_statics.html

use super::boards;
use super::magic;
use super::psqt;
use super::zobrist;

use crate::core::score::{Score, Value};
use crate::core::sq::Square;
use crate::core::{Piece, PieceType, Player};
use crate::Bitboard;

use std::sync::atomic::{compiler_fence, fence, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the static lookup tables. Guaranteed to only run once.
#[cold]
pub fn init_statics() {
    INIT.call_once(|| {
        compiler_fence(Ordering::SeqCst);
        fence(Ordering::SeqCst);
        zobrist::init_zobrist();
        psqt::init_psqt();
        magic::init_magics();
        compiler_fence(Ordering::SeqCst);
        boards::init_boards();
        fence(Ordering::SeqCst);
    });
}

// MAGIC FUNCTIONS

/// Generates the bishop attack `Bitboard` from a square and the occupancy
/// of the whole board. The result includes squares occupied by either side;
/// AND with the inverse of the moving player's pieces for destinations.
#[inline(always)]
pub fn bishop_moves(occupied: Bitboard, sq: Square) -> Bitboard {
    debug_assert!(sq.is_okay());
    Bitboard(magic::bishop_attacks(occupied.0, sq.0))
}

/// Generates the rook attack `Bitboard` from a square and the occupancy of
/// the whole board.
#[inline(always)]
pub fn rook_moves(occupied: Bitboard, sq: Square) -> Bitboard {
    debug_assert!(sq.is_okay());
    Bitboard(magic::rook_attacks(occupied.0, sq.0))
}

/// Generates the queen attack `Bitboard` from a square and the occupancy of
/// the whole board: the union of the bishop and rook attacks.
#[inline(always)]
pub fn queen_moves(occupied: Bitboard, sq: Square) -> Bitboard {
    debug_assert!(sq.is_okay());
    Bitboard(magic::rook_attacks(occupied.0, sq.0) | magic::bishop_attacks(occupied.0, sq.0))
}

// BOARD GEOMETRY FUNCTIONS

/// Generates the knight move `Bitboard` from a source square.
#[inline(always)]
pub fn knight_moves(sq: Square) -> Bitboard {
    Bitboard(boards::knight_moves(sq))
}

/// Generates the king move `Bitboard` from a source square.
#[inline(always)]
pub fn king_moves(sq: Square) -> Bitboard {
    Bitboard(boards::king_moves(sq))
}

/// Returns the pawn attack `Bitboard` from a square for a player.
#[inline(always)]
pub fn pawn_attacks_from(sq: Square, player: Player) -> Bitboard {
    Bitboard(boards::pawn_attacks_from(sq, player))
}

/// Returns the distance between two squares, in king steps.
#[inline(always)]
pub fn distance_of_sqs(sq_one: Square, sq_two: Square) -> u8 {
    boards::distance_of_sqs(sq_one, sq_two)
}

/// Returns the line both squares lie on, if any, endpoints included.
#[inline(always)]
pub fn line_bb(sq_one: Square, sq_two: Square) -> Bitboard {
    Bitboard(boards::line_bb(sq_one, sq_two))
}

/// Returns the squares strictly between the two squares, if they share a
/// ray.
#[inline(always)]
pub fn between_bb(sq_one: Square, sq_two: Square) -> Bitboard {
    Bitboard(boards::between_bb(sq_one, sq_two))
}

/// Returns the pin ray from a king to a pinning slider, pinner included.
#[inline(always)]
pub fn pin_bb(king_sq: Square, pinner_sq: Square) -> Bitboard {
    Bitboard(boards::pin_bb(king_sq, pinner_sq))
}

/// Returns the check ray for a king checked from `checker_sq`, including
/// the square behind the king along the ray.
#[inline(always)]
pub fn check_bb(king_sq: Square, checker_sq: Square) -> Bitboard {
    Bitboard(boards::check_bb(king_sq, checker_sq))
}

/// Returns the castling rights bits surviving a move that touches `sq`.
#[inline(always)]
pub fn castling_on(sq: Square) -> u8 {
    boards::castling_on(sq)
}

/// Returns if three squares are in the same diagonal, file, or rank.
#[inline(always)]
pub fn aligned(s1: Square, s2: Square, s3: Square) -> bool {
    boards::aligned(s1, s2, s3)
}

// ZOBRIST FUNCTIONS

/// Returns the Zobrist hash for a given square and piece at that square.
#[inline(always)]
pub fn z_square(sq: Square, piece: Piece) -> u64 {
    zobrist::z_square(sq, piece)
}

/// Returns the Zobrist hash for the file of an en-passant square.
#[inline(always)]
pub fn z_ep(sq: Square) -> u64 {
    zobrist::z_ep(sq)
}

/// Returns the Zobrist hash for a set of castling rights.
#[inline(always)]
pub fn z_castle(castle: u8) -> u64 {
    zobrist::z_castle(castle)
}

/// Returns the Zobrist hash for having the black player's turn.
#[inline(always)]
pub fn z_side() -> u64 {
    zobrist::z_side()
}

// PSQT FUNCTIONS

/// Returns the material + positional score for a piece standing on a
/// square.
#[inline(always)]
pub fn psq(piece: Piece, sq: Square) -> Score {
    psqt::psq(piece, sq)
}

/// Returns the value of a piece type, end-game if `eg` is set.
#[inline(always)]
pub fn piecetype_value(piece_type: PieceType, eg: bool) -> Value {
    psqt::piecetype_value(piece_type, eg)
}
