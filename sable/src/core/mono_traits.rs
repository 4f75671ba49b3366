//! Traits and dummy types defined for compile-time monomorphization.
//!
//! These shouldn't be used in place of their enum representations; their
//! only use is to let the move generator and mask refresh instantiate one
//! specialized function per player / generation type / slider type, keeping
//! the hot path free of runtime branching on those enums.

use super::bitboard::Bitboard;
use super::sq::Square;
use super::{GenType, PieceType, Player};
use crate::helper::prelude;

/// Defines a player trait, allowing for compile-time specialization over
/// the side to move.
pub trait PlayerTrait {
    /// Returns the current `Player`.
    fn player() -> Player;

    /// Returns the opposing `Player`.
    fn opp_player() -> Player;

    /// Given a `Square`, returns the square one pawn-push down relative to
    /// the current player.
    fn down(sq: Square) -> Square;

    /// Given a `Square`, returns the square one pawn-push up relative to
    /// the current player.
    fn up(sq: Square) -> Square;

    /// Given a `Square`, returns the square down-left relative to the
    /// current player.
    fn down_left(sq: Square) -> Square;

    /// Given a `Square`, returns the square down-right relative to the
    /// current player.
    fn down_right(sq: Square) -> Square;

    /// Given a `Square`, returns the square up-left relative to the
    /// current player.
    fn up_left(sq: Square) -> Square;

    /// Given a `Square`, returns the square up-right relative to the
    /// current player.
    fn up_right(sq: Square) -> Square;

    /// Returns the `Bitboard` shifted "up" relative to the current player.
    fn shift_up(bb: Bitboard) -> Bitboard;

    /// Returns the `Bitboard` shifted "down" relative to the current player.
    fn shift_down(bb: Bitboard) -> Bitboard;

    /// Returns the `Bitboard` shifted "up-left" relative to the current
    /// player. The left-most file is excluded from the shift input.
    fn shift_up_left(bb: Bitboard) -> Bitboard;

    /// Returns the `Bitboard` shifted "up-right" relative to the current
    /// player. The right-most file is excluded from the shift input.
    fn shift_up_right(bb: Bitboard) -> Bitboard;

    /// The inverse of [`shift_up_left`]: maps up-left capture destinations
    /// back onto their source squares.
    ///
    /// [`shift_up_left`]: #tymethod.shift_up_left
    fn shift_down_right(bb: Bitboard) -> Bitboard;

    /// The inverse of [`shift_up_right`]: maps up-right capture
    /// destinations back onto their source squares.
    ///
    /// [`shift_up_right`]: #tymethod.shift_up_right
    fn shift_down_left(bb: Bitboard) -> Bitboard;
}

/// Dummy type to represent a `Player::White` which implements `PlayerTrait`.
pub struct WhiteType {}

/// Dummy type to represent a `Player::Black` which implements `PlayerTrait`.
pub struct BlackType {}

impl PlayerTrait for WhiteType {
    #[inline(always)]
    fn player() -> Player {
        Player::White
    }

    #[inline(always)]
    fn opp_player() -> Player {
        Player::Black
    }

    #[inline(always)]
    fn down(sq: Square) -> Square {
        sq - Square(8)
    }

    #[inline(always)]
    fn up(sq: Square) -> Square {
        sq + Square(8)
    }

    #[inline(always)]
    fn down_left(sq: Square) -> Square {
        sq - Square(9)
    }

    #[inline(always)]
    fn down_right(sq: Square) -> Square {
        sq - Square(7)
    }

    #[inline(always)]
    fn up_left(sq: Square) -> Square {
        sq + Square(7)
    }

    #[inline(always)]
    fn up_right(sq: Square) -> Square {
        sq + Square(9)
    }

    #[inline(always)]
    fn shift_up(bb: Bitboard) -> Bitboard {
        bb << 8
    }

    #[inline(always)]
    fn shift_down(bb: Bitboard) -> Bitboard {
        bb >> 8
    }

    #[inline(always)]
    fn shift_up_left(bb: Bitboard) -> Bitboard {
        (bb & !Bitboard::FILE_A) << 7
    }

    #[inline(always)]
    fn shift_up_right(bb: Bitboard) -> Bitboard {
        (bb & !Bitboard::FILE_H) << 9
    }

    #[inline(always)]
    fn shift_down_right(bb: Bitboard) -> Bitboard {
        (bb & !Bitboard::FILE_H) >> 7
    }

    #[inline(always)]
    fn shift_down_left(bb: Bitboard) -> Bitboard {
        (bb & !Bitboard::FILE_A) >> 9
    }
}

impl PlayerTrait for BlackType {
    #[inline(always)]
    fn player() -> Player {
        Player::Black
    }

    #[inline(always)]
    fn opp_player() -> Player {
        Player::White
    }

    #[inline(always)]
    fn down(sq: Square) -> Square {
        sq + Square(8)
    }

    #[inline(always)]
    fn up(sq: Square) -> Square {
        sq - Square(8)
    }

    #[inline(always)]
    fn down_left(sq: Square) -> Square {
        sq + Square(9)
    }

    #[inline(always)]
    fn down_right(sq: Square) -> Square {
        sq + Square(7)
    }

    #[inline(always)]
    fn up_left(sq: Square) -> Square {
        sq - Square(7)
    }

    #[inline(always)]
    fn up_right(sq: Square) -> Square {
        sq - Square(9)
    }

    #[inline(always)]
    fn shift_up(bb: Bitboard) -> Bitboard {
        bb >> 8
    }

    #[inline(always)]
    fn shift_down(bb: Bitboard) -> Bitboard {
        bb << 8
    }

    #[inline(always)]
    fn shift_up_left(bb: Bitboard) -> Bitboard {
        (bb & !Bitboard::FILE_H) >> 7
    }

    #[inline(always)]
    fn shift_up_right(bb: Bitboard) -> Bitboard {
        (bb & !Bitboard::FILE_A) >> 9
    }

    #[inline(always)]
    fn shift_down_right(bb: Bitboard) -> Bitboard {
        (bb & !Bitboard::FILE_A) << 7
    }

    #[inline(always)]
    fn shift_down_left(bb: Bitboard) -> Bitboard {
        (bb & !Bitboard::FILE_H) << 9
    }
}

/// Defines a generation-type trait for compile-time specialization over the
/// kinds of moves to generate.
pub trait GenTypeTrait {
    /// Returns the `GenType`.
    fn gen_type() -> GenType;
}

/// Dummy type to represent a `GenType::All` which implements `GenTypeTrait`.
pub struct AllGenType {}
/// Dummy type to represent a `GenType::Captures` which implements
/// `GenTypeTrait`.
pub struct CapturesGenType {}
/// Dummy type to represent a `GenType::Quiets` which implements
/// `GenTypeTrait`.
pub struct QuietsGenType {}

impl GenTypeTrait for AllGenType {
    #[inline(always)]
    fn gen_type() -> GenType {
        GenType::All
    }
}

impl GenTypeTrait for CapturesGenType {
    #[inline(always)]
    fn gen_type() -> GenType {
        GenType::Captures
    }
}

impl GenTypeTrait for QuietsGenType {
    #[inline(always)]
    fn gen_type() -> GenType {
        GenType::Quiets
    }
}

/// Defines a trait for compile-time specialization over the two sliding
/// piece types. The two instantiations share every algorithm that walks a
/// ray; only the attack lookup and the pin mask they consult differ.
pub trait SliderTrait {
    /// Returns the `PieceType` of the slider.
    fn piece_type() -> PieceType;

    /// Returns the attack `Bitboard` of this slider from `sq` with the
    /// given occupancy.
    fn attacks(occupied: Bitboard, sq: Square) -> Bitboard;
}

/// Dummy type to represent a bishop-like slider.
pub struct BishopType {}
/// Dummy type to represent a rook-like slider.
pub struct RookType {}

impl SliderTrait for BishopType {
    #[inline(always)]
    fn piece_type() -> PieceType {
        PieceType::Bishop
    }

    #[inline(always)]
    fn attacks(occupied: Bitboard, sq: Square) -> Bitboard {
        prelude::bishop_moves(occupied, sq)
    }
}

impl SliderTrait for RookType {
    #[inline(always)]
    fn piece_type() -> PieceType {
        PieceType::Rook
    }

    #[inline(always)]
    fn attacks(occupied: Bitboard, sq: Square) -> Bitboard {
        prelude::rook_moves(occupied, sq)
    }
}
