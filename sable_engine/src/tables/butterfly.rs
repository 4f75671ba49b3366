//! The main quiet-move history, indexed by the side to move, whether the
//! origin and destination squares stand attacked by the enemy, and the
//! from/to squares of the move.

use std::ops::{Index, IndexMut};

use sable::core::masks::{PLAYER_CNT, SQ_CNT};
use sable::core::sq::Square;
use sable::Player;

use super::{NumStatBoard, StatBoard, HISTORY_BOUND};

/// Quiet-move history. The threat dimensions let a move's reputation
/// differ depending on whether it flees from or walks into an attack.
pub struct ButterflyHistory {
    a: [[[[[i16; SQ_CNT]; SQ_CNT]; 2]; 2]; PLAYER_CNT],
}

/// (side to move, from attacked, to attacked, from, to)
type ButterflyIdx = (Player, bool, bool, Square, Square);

impl Index<ButterflyIdx> for ButterflyHistory {
    type Output = i16;

    #[inline(always)]
    fn index(&self, idx: ButterflyIdx) -> &i16 {
        unsafe {
            self.a
                .get_unchecked(idx.0 as usize)
                .get_unchecked(idx.1 as usize)
                .get_unchecked(idx.2 as usize)
                .get_unchecked(idx.3 .0 as usize)
                .get_unchecked(idx.4 .0 as usize)
        }
    }
}

impl IndexMut<ButterflyIdx> for ButterflyHistory {
    #[inline(always)]
    fn index_mut(&mut self, idx: ButterflyIdx) -> &mut i16 {
        unsafe {
            self.a
                .get_unchecked_mut(idx.0 as usize)
                .get_unchecked_mut(idx.1 as usize)
                .get_unchecked_mut(idx.2 as usize)
                .get_unchecked_mut(idx.3 .0 as usize)
                .get_unchecked_mut(idx.4 .0 as usize)
        }
    }
}

impl StatBoard<i16, ButterflyIdx> for ButterflyHistory {
    const FILL: i16 = 0;

    fn fill(&mut self, value: i16) {
        for side in self.a.iter_mut() {
            for tf in side.iter_mut() {
                for tt in tf.iter_mut() {
                    for from in tt.iter_mut() {
                        from.fill(value);
                    }
                }
            }
        }
    }
}

impl NumStatBoard<ButterflyIdx> for ButterflyHistory {
    const D: i16 = HISTORY_BOUND;
}
