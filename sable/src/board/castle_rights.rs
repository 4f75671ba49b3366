//! Castling rights of a chess game, stored as a 4-bit mask.

use std::fmt;

bitflags! {
    /// Castling rights for both players, one bit per right.
    ///
    /// The bit layout matches the raw masks produced by
    /// `helper::prelude::castling_on`, so rights removal on a move is a
    /// pair of ANDs.
    pub struct Castling: u8 {
        const WHITE_K = 0b0001;
        const WHITE_Q = 0b0010;
        const BLACK_K = 0b0100;
        const BLACK_Q = 0b1000;
        const WHITE_ALL = Self::WHITE_K.bits | Self::WHITE_Q.bits;
        const BLACK_ALL = Self::BLACK_K.bits | Self::BLACK_Q.bits;
    }
}

impl Castling {
    /// Adds a right corresponding to its FEN character, ignoring anything
    /// unrecognized.
    pub fn add_castling_char(&mut self, c: char) {
        match c {
            'K' => *self |= Castling::WHITE_K,
            'Q' => *self |= Castling::WHITE_Q,
            'k' => *self |= Castling::BLACK_K,
            'q' => *self |= Castling::BLACK_Q,
            _ => {}
        }
    }

    /// Returns the FEN string of the current castling rights, "-" if none.
    pub fn pretty_string(self) -> String {
        if self.is_empty() {
            return "-".to_string();
        }
        let mut s = String::with_capacity(4);
        if self.contains(Castling::WHITE_K) {
            s.push('K');
        }
        if self.contains(Castling::WHITE_Q) {
            s.push('Q');
        }
        if self.contains(Castling::BLACK_K) {
            s.push('k');
        }
        if self.contains(Castling::BLACK_Q) {
            s.push('q');
        }
        s
    }
}

impl fmt::Display for Castling {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(&self.pretty_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn castling_chars() {
        let mut c = Castling::empty();
        for ch in "KQkq".chars() {
            c.add_castling_char(ch);
        }
        assert_eq!(c, Castling::all());
        assert_eq!(c.pretty_string(), "KQkq");
        assert_eq!(Castling::empty().pretty_string(), "-");
    }
}
