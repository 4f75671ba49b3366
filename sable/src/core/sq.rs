//! The representation of a chessboard's square.
//!
//! Internally, a `Square` is just a `u8`, mapping to the board file-major:
//!
//! ```md,ignore
//! 8 | 56 57 58 59 60 61 62 63
//! 7 | 48 49 50 51 52 53 54 55
//! 6 | 40 41 42 43 44 45 46 47
//! 5 | 32 33 34 35 36 37 38 39
//! 4 | 24 25 26 27 28 29 30 31
//! 3 | 16 17 18 19 20 21 22 23
//! 2 | 8  9  10 11 12 13 14 15
//! 1 | 0  1  2  3  4  5  6  7
//!   -------------------------
//!      a  b  c  d  e  f  g  h
//! ```
//!
//! `NO_SQ` signifies the lack of a legal square, a lazy version of
//! `Option<Square>` where the value is `None`. Used internally to represent
//! a missing en-passant square.

use super::bitboard::Bitboard;
use super::masks::*;
use super::*;

use std::fmt;
use std::ops::*;

/// Represents a singular square of a chessboard.
#[derive(Copy, Clone, Default, Hash, PartialEq, PartialOrd, Eq, Debug)]
#[repr(transparent)]
pub struct Square(pub u8);

impl_bit_ops!(Square, u8);

/// `Square` representing no square available.
pub const NO_SQ: Square = Square(64);

impl Square {
    /// A square that isn't on the board. Equivalent to `Option<Square>`
    /// with the value `None`.
    pub const NONE: Square = NO_SQ;

    /// Returns if a `Square` is within the legal bounds of a square,
    /// inclusively between 0 - 63.
    #[inline(always)]
    pub const fn is_okay(self) -> bool {
        self.0 < 64
    }

    /// Returns the distance between this square and another, measured in
    /// king steps rather than algebraic difference.
    #[inline]
    pub fn distance(self, other: Square) -> u8 {
        let x = bit_twiddles::diff(self.rank_idx(), other.rank_idx());
        let y = bit_twiddles::diff(self.file_idx(), other.file_idx());
        if x > y {
            x
        } else {
            y
        }
    }

    /// Converts a `Square` to its `Bitboard` equivalent.
    #[inline(always)]
    pub fn to_bb(self) -> Bitboard {
        debug_assert!(self.is_okay());
        Bitboard(1_u64.wrapping_shl(u32::from(self.0)))
    }

    /// Returns the `Rank` the square is on.
    #[inline(always)]
    pub fn rank(self) -> Rank {
        rank_of_sq(self.0)
    }

    /// Returns the rank index (0..=7) of the square.
    #[inline(always)]
    pub const fn rank_idx(self) -> u8 {
        self.0 >> 3
    }

    /// Returns the `Bitboard` of the rank the square is on.
    #[inline(always)]
    pub fn rank_bb(self) -> Bitboard {
        Bitboard(RANK_BB[self.rank_idx() as usize])
    }

    /// Returns the `File` the square is on.
    #[inline(always)]
    pub fn file(self) -> File {
        file_of_sq(self.0)
    }

    /// Returns the file index (0..=7) of the square.
    #[inline(always)]
    pub const fn file_idx(self) -> u8 {
        self.0 & 0b0111
    }

    /// Returns the `Bitboard` of the file the square is on.
    #[inline(always)]
    pub fn file_bb(self) -> Bitboard {
        Bitboard(FILE_BB[self.file_idx() as usize])
    }

    /// Creates a `Square` from a file and rank.
    #[inline]
    pub fn make(file: File, rank: Rank) -> Square {
        Square(((rank as u8) << 3) | file as u8)
    }

    /// Offsets the square by a signed direction, without bounds checks.
    ///
    /// # Safety
    ///
    /// The resulting square may wrap around the board edges or leave the
    /// board entirely; edge-wrap guarding is the caller's job.
    #[inline(always)]
    pub fn offset(self, dir: i8) -> Square {
        Square((self.0 as i8).wrapping_add(dir) as u8)
    }

    /// Returns the square flipped over the horizontal midline, A1 <-> A8.
    #[inline(always)]
    pub fn flip(self) -> Square {
        self ^ Square(56)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_okay() {
            write!(
                f,
                "{}{}",
                FILE_DISPLAYS[self.file_idx() as usize],
                RANK_DISPLAYS[self.rank_idx() as usize]
            )
        } else {
            write!(f, "--")
        }
    }
}

impl Square {
    pub const A1: Square = Square(0);
    pub const B1: Square = Square(1);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A2: Square = Square(8);
    pub const B2: Square = Square(9);
    pub const C2: Square = Square(10);
    pub const D2: Square = Square(11);
    pub const E2: Square = Square(12);
    pub const F2: Square = Square(13);
    pub const G2: Square = Square(14);
    pub const H2: Square = Square(15);
    pub const A3: Square = Square(16);
    pub const B3: Square = Square(17);
    pub const C3: Square = Square(18);
    pub const D3: Square = Square(19);
    pub const E3: Square = Square(20);
    pub const F3: Square = Square(21);
    pub const G3: Square = Square(22);
    pub const H3: Square = Square(23);
    pub const A4: Square = Square(24);
    pub const B4: Square = Square(25);
    pub const C4: Square = Square(26);
    pub const D4: Square = Square(27);
    pub const E4: Square = Square(28);
    pub const F4: Square = Square(29);
    pub const G4: Square = Square(30);
    pub const H4: Square = Square(31);
    pub const A5: Square = Square(32);
    pub const B5: Square = Square(33);
    pub const C5: Square = Square(34);
    pub const D5: Square = Square(35);
    pub const E5: Square = Square(36);
    pub const F5: Square = Square(37);
    pub const G5: Square = Square(38);
    pub const H5: Square = Square(39);
    pub const A6: Square = Square(40);
    pub const B6: Square = Square(41);
    pub const C6: Square = Square(42);
    pub const D6: Square = Square(43);
    pub const E6: Square = Square(44);
    pub const F6: Square = Square(45);
    pub const G6: Square = Square(46);
    pub const H6: Square = Square(47);
    pub const A7: Square = Square(48);
    pub const B7: Square = Square(49);
    pub const C7: Square = Square(50);
    pub const D7: Square = Square(51);
    pub const E7: Square = Square(52);
    pub const F7: Square = Square(53);
    pub const G7: Square = Square(54);
    pub const H7: Square = Square(55);
    pub const A8: Square = Square(56);
    pub const B8: Square = Square(57);
    pub const C8: Square = Square(58);
    pub const D8: Square = Square(59);
    pub const E8: Square = Square(60);
    pub const F8: Square = Square(61);
    pub const G8: Square = Square(62);
    pub const H8: Square = Square(63);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_basics() {
        assert_eq!(Square::A1.distance(Square::A1), 0);
        assert_eq!(Square::A1.distance(Square::B2), 1);
        assert_eq!(Square::A1.distance(Square::B3), 2);
        assert_eq!(Square::H8.file(), File::H);
        assert_eq!(Square::H8.rank(), Rank::R8);
        assert_eq!(Square::make(File::E, Rank::R4), Square::E4);
        assert!(!NO_SQ.is_okay());
    }

    #[test]
    fn square_flip() {
        assert_eq!(Square::A1.flip(), Square::A8);
        assert_eq!(Square::E2.flip(), Square::E7);
    }
}
