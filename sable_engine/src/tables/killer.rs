//! The killer table: two quiet moves per ply that recently caused a beta
//! cutoff in a sibling node.

use sable::core::piece_move::Move;
use sable::core::score::MAX_PLY;

/// Two killer slots for every ply of the search.
pub struct KillerTable {
    a: [[Move; 2]; MAX_PLY as usize + 1],
}

impl KillerTable {
    /// Creates a new, empty table.
    pub fn new() -> Self {
        KillerTable {
            a: [[Move::none(); 2]; MAX_PLY as usize + 1],
        }
    }

    /// Resets every slot.
    pub fn clear(&mut self) {
        self.a = [[Move::none(); 2]; MAX_PLY as usize + 1];
    }

    /// Returns the two killers stored for a ply.
    #[inline(always)]
    pub fn probe(&self, ply: u16) -> [Move; 2] {
        debug_assert!(ply <= MAX_PLY);
        unsafe { *self.a.get_unchecked(ply as usize) }
    }

    /// Installs a new primary killer for a ply, demoting the previous one
    /// to the second slot. Re-installing the current primary is a no-op.
    #[inline]
    pub fn update(&mut self, ply: u16, mv: Move) {
        debug_assert!(ply <= MAX_PLY);
        let slots = unsafe { self.a.get_unchecked_mut(ply as usize) };
        if slots[0] != mv {
            slots[1] = slots[0];
            slots[0] = mv;
        }
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        KillerTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable::core::sq::Square;

    #[test]
    fn killer_demotion() {
        let mut kt = KillerTable::new();
        let a = Move::encode(Square::E2, Square::E4);
        let b = Move::encode(Square::D2, Square::D4);

        kt.update(3, a);
        assert_eq!(kt.probe(3), [a, Move::none()]);

        kt.update(3, b);
        assert_eq!(kt.probe(3), [b, a]);

        // Repeated installation does not clobber the second slot.
        kt.update(3, b);
        assert_eq!(kt.probe(3), [b, a]);
    }
}
