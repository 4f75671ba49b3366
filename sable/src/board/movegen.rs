//! Generating moves from a [`Board`].
//!
//! The generator is legality-restricted: every move it emits is strictly
//! legal. It never probes "does this leave my king in check?" per move;
//! instead, the [`BoardState`]'s precomputed masks do the filtering:
//!
//! * every non-king destination is intersected with the `available` mask
//!   (check mask minus own pieces),
//! * pinned pieces only move within their pin ray,
//! * king destinations come from `king_attacks`, which already excludes
//!   the `king_ban`,
//! * the en-passant pin flag vetoes horizontally-discovered en-passant
//!   captures.
//!
//! # Generation types
//!
//! `All` emits every legal move; `Captures` only captures (including
//! en-passant and capturing promotions); `Quiets` only non-captures.
//!
//! [`Board`]: ../struct.Board.html
//! [`BoardState`]: ../state/struct.BoardState.html

use super::{castle_right, castle_transit_squares, Board};

use crate::core::mono_traits::*;
use crate::core::move_list::{MoveList, MovePush, ScoredMoveList};
use crate::core::piece_move::{Move, MoveFlag};
use crate::core::sq::{Square, NO_SQ};
use crate::core::{GenType, PieceType, Player};
use crate::helper::prelude;
use crate::Bitboard;

/// Public move generator.
pub struct MoveGen {}

impl MoveGen {
    /// Returns a `MoveList` of all moves of the given `GenType` for the
    /// board.
    #[inline]
    pub fn generate<G: GenTypeTrait>(board: &Board) -> MoveList {
        let mut list = MoveList::default();
        InnerMoveGen::<MoveList>::generate::<G>(board, &mut list);
        list
    }

    /// Returns a `ScoredMoveList` of all moves of the given `GenType`,
    /// with all scores zeroed.
    #[inline]
    pub fn generate_scored<G: GenTypeTrait>(board: &Board) -> ScoredMoveList {
        let mut list = ScoredMoveList::default();
        InnerMoveGen::<ScoredMoveList>::generate::<G>(board, &mut list);
        list
    }

    /// Extends any `MovePush` collection with the moves of the given
    /// `GenType`.
    #[inline]
    pub fn extend<G: GenTypeTrait, MP: MovePush>(board: &Board, list: &mut MP) {
        InnerMoveGen::<MP>::generate::<G>(board, list);
    }
}

/// The internal generator, holding the target list and cached occupancies.
struct InnerMoveGen<'a, MP: MovePush + 'a> {
    list: &'a mut MP,
    board: &'a Board,
    occ: Bitboard,
    us_occ: Bitboard,
    them_occ: Bitboard,
}

impl<'a, MP: MovePush> InnerMoveGen<'a, MP> {
    #[inline(always)]
    fn generate<G: GenTypeTrait>(board: &'a Board, list: &'a mut MP) {
        match board.turn() {
            Player::White => InnerMoveGen::generate_helper::<G, WhiteType>(board, list),
            Player::Black => InnerMoveGen::generate_helper::<G, BlackType>(board, list),
        }
    }

    fn generate_helper<G: GenTypeTrait, P: PlayerTrait>(board: &'a Board, list: &'a mut MP) {
        let mut gen = InnerMoveGen {
            list,
            board,
            occ: board.occupied(),
            us_occ: board.occupied_player(P::player()),
            them_occ: board.occupied_player(P::opp_player()),
        };

        gen.king_moves::<G, P>();

        // Double check: only the king may move.
        if board.state().check_mask.is_empty() {
            return;
        }

        gen.pawn_moves::<G, P>();
        gen.knight_moves::<G>(P::player());
        gen.slider_moves::<G, BishopType>(P::player());
        gen.slider_moves::<G, RookType>(P::player());
        gen.queen_moves::<G>(P::player());
    }

    fn king_moves<G: GenTypeTrait, P: PlayerTrait>(&mut self) {
        let st = self.board.state();
        let us = P::player();
        let ksq = self.board.king_sq(us);

        let mut destinations = st.king_attacks;
        if G::gen_type() == GenType::Captures {
            destinations &= self.them_occ;
        } else if G::gen_type() == GenType::Quiets {
            destinations &= !self.occ;
        }
        while let Some(dst) = destinations.pop_some_lsb() {
            self.list.push_mv(Move::encode(ksq, dst));
        }

        if G::gen_type() == GenType::Captures || st.check_mask != Bitboard::ALL {
            return;
        }

        // Castling: the transit squares must be neither occupied nor
        // banned; the queen-side B-file square must additionally be empty,
        // though it may be attacked.
        for king_side in [true, false] {
            if !st.castling.contains(castle_right(us, king_side)) {
                continue;
            }
            let transit = castle_transit_squares(us, king_side);
            let occupancy_block = if king_side {
                transit
            } else {
                transit | us.relative_square(Square::B1).to_bb()
            };
            if (st.king_ban & transit).is_empty() && (self.occ & occupancy_block).is_empty() {
                let dst = us.relative_square(if king_side { Square::G1 } else { Square::C1 });
                self.list
                    .push_mv(Move::encode_flag(ksq, dst, MoveFlag::Castle));
            }
        }
    }

    fn pawn_moves<G: GenTypeTrait, P: PlayerTrait>(&mut self) {
        let st = self.board.state();
        let us = P::player();
        let them = P::opp_player();
        let check_mask = st.check_mask;
        let bishop_pin = st.bishop_pin;
        let rook_pin = st.rook_pin;

        let pawns = self.board.piece_bb(us, PieceType::Pawn);
        let promo_rank = if us == Player::White {
            Bitboard::RANK_7
        } else {
            Bitboard::RANK_2
        };
        let push_rank = if us == Player::White {
            Bitboard::RANK_2
        } else {
            Bitboard::RANK_7
        };

        if G::gen_type() != GenType::Quiets {
            // A rook-pinned pawn can never capture; a bishop-pinned pawn
            // may only capture along its pin ray.
            let pawns_lr = pawns & !rook_pin;
            let mut pawn_l = pawns_lr
                & P::shift_down_right(self.them_occ & check_mask)
                & (P::shift_down_right(bishop_pin) | !bishop_pin);
            let mut pawn_r = pawns_lr
                & P::shift_down_left(self.them_occ & check_mask)
                & (P::shift_down_left(bishop_pin) | !bishop_pin);

            if st.ep_square != NO_SQ && !st.ep_pin {
                let ep = st.ep_square;
                let target = P::down(ep);
                // An en-passant capture resolves a check either by taking
                // the double-pushed checker or by blocking on the
                // en-passant square itself.
                if check_mask.contains(target) || check_mask.contains(ep) {
                    let mut candidates = pawns_lr & prelude::pawn_attacks_from(ep, them);
                    while let Some(src) = candidates.pop_some_lsb() {
                        if bishop_pin.contains(src) && !bishop_pin.contains(ep) {
                            continue;
                        }
                        self.list
                            .push_mv(Move::encode_flag(src, ep, MoveFlag::EnPassant));
                    }
                }
            }

            let mut promo_l = pawn_l & promo_rank;
            let mut promo_r = pawn_r & promo_rank;
            pawn_l &= !promo_rank;
            pawn_r &= !promo_rank;

            while let Some(src) = promo_l.pop_some_lsb() {
                self.push_promotions(src, P::up_left(src));
            }
            while let Some(src) = promo_r.pop_some_lsb() {
                self.push_promotions(src, P::up_right(src));
            }
            while let Some(src) = pawn_l.pop_some_lsb() {
                self.list.push_mv(Move::encode(src, P::up_left(src)));
            }
            while let Some(src) = pawn_r.pop_some_lsb() {
                self.list.push_mv(Move::encode(src, P::up_right(src)));
            }
        }

        if G::gen_type() != GenType::Captures {
            // Bishop-pinned pawns can never push; rook-pinned pawns only
            // along the pin file.
            let empty = !self.occ;
            let pawn_fwd = pawns & !bishop_pin;
            let mut push_one = pawn_fwd & P::shift_down(empty);
            let mut push_two = push_one
                & P::shift_down(P::shift_down(empty & check_mask))
                & push_rank
                & (P::shift_down(P::shift_down(rook_pin)) | !rook_pin);
            push_one &= P::shift_down(check_mask) & (P::shift_down(rook_pin) | !rook_pin);

            let mut promo_f = push_one & promo_rank;
            push_one &= !promo_rank;

            while let Some(src) = promo_f.pop_some_lsb() {
                self.push_promotions(src, P::up(src));
            }
            while let Some(src) = push_one.pop_some_lsb() {
                self.list.push_mv(Move::encode(src, P::up(src)));
            }
            while let Some(src) = push_two.pop_some_lsb() {
                self.list.push_mv(Move::encode(src, P::up(P::up(src))));
            }
        }
    }

    fn knight_moves<G: GenTypeTrait>(&mut self, us: Player) {
        let st = self.board.state();
        // A pinned knight can never move.
        let mut knights =
            self.board.piece_bb(us, PieceType::Knight) & !(st.rook_pin | st.bishop_pin);
        let available = st.available;

        while let Some(src) = knights.pop_some_lsb() {
            let mut attacks = prelude::knight_moves(src) & available;
            attacks = self.filter_gen_type::<G>(attacks);
            while let Some(dst) = attacks.pop_some_lsb() {
                self.list.push_mv(Move::encode(src, dst));
            }
        }
    }

    /// Slider moves for one slider family, including the queen when she is
    /// pinned along this family's direction.
    fn slider_moves<G: GenTypeTrait, S: SliderTrait>(&mut self, us: Player) {
        let st = self.board.state();
        let available = st.available;
        let (own_pin, cross_pin) = if S::piece_type() == PieceType::Bishop {
            (st.bishop_pin, st.rook_pin)
        } else {
            (st.rook_pin, st.bishop_pin)
        };

        let queens = self.board.piece_bb(us, PieceType::Queen);
        // A slider pinned across its movement direction cannot move at all.
        let base = self.board.piece_bb(us, S::piece_type()) & !cross_pin;
        let mut pinned = (base | queens) & own_pin;
        let mut non_pinned = base & !own_pin;

        while let Some(src) = pinned.pop_some_lsb() {
            let mut attacks = S::attacks(self.occ, src) & available & own_pin;
            attacks = self.filter_gen_type::<G>(attacks);
            while let Some(dst) = attacks.pop_some_lsb() {
                self.list.push_mv(Move::encode(src, dst));
            }
        }

        while let Some(src) = non_pinned.pop_some_lsb() {
            let mut attacks = S::attacks(self.occ, src) & available;
            attacks = self.filter_gen_type::<G>(attacks);
            while let Some(dst) = attacks.pop_some_lsb() {
                self.list.push_mv(Move::encode(src, dst));
            }
        }
    }

    /// Non-pinned queen moves; pinned queens are handled by the slider
    /// passes.
    fn queen_moves<G: GenTypeTrait>(&mut self, us: Player) {
        let st = self.board.state();
        let mut queens =
            self.board.piece_bb(us, PieceType::Queen) & !(st.rook_pin | st.bishop_pin);
        let available = st.available;

        while let Some(src) = queens.pop_some_lsb() {
            let mut attacks = prelude::queen_moves(self.occ, src) & available;
            attacks = self.filter_gen_type::<G>(attacks);
            while let Some(dst) = attacks.pop_some_lsb() {
                self.list.push_mv(Move::encode(src, dst));
            }
        }
    }

    #[inline(always)]
    fn filter_gen_type<G: GenTypeTrait>(&self, attacks: Bitboard) -> Bitboard {
        match G::gen_type() {
            GenType::All => attacks,
            GenType::Captures => attacks & self.them_occ,
            GenType::Quiets => attacks & !self.occ,
        }
    }

    #[inline]
    fn push_promotions(&mut self, src: Square, dst: Square) {
        for promo in [
            PieceType::Queen,
            PieceType::Knight,
            PieceType::Rook,
            PieceType::Bishop,
        ] {
            self.list.push_mv(Move::encode_promotion(src, dst, promo));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GenType;

    #[test]
    fn startpos_movecount() {
        let board = Board::start_pos();
        assert_eq!(board.generate_moves().len(), 20);
        assert_eq!(
            board.generate_moves_of_type(GenType::Captures).len(),
            0
        );
        assert_eq!(board.generate_moves_of_type(GenType::Quiets).len(), 20);
    }

    #[test]
    fn captures_plus_quiets_equals_all() {
        let fens = [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        ];
        for fen in fens {
            let board = Board::from_fen(fen).unwrap();
            let all = board.generate_moves();
            let caps = board.generate_moves_of_type(GenType::Captures);
            let quiets = board.generate_moves_of_type(GenType::Quiets);
            assert_eq!(all.len(), caps.len() + quiets.len(), "fen: {}", fen);
            for m in caps.iter() {
                assert!(all.contains(m));
                assert!(board.is_capture(*m) || m.is_promotion());
            }
            for m in quiets.iter() {
                assert!(all.contains(m));
            }
        }
    }

    #[test]
    fn generated_moves_pass_is_legal() {
        let fens = [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        ];
        for fen in fens {
            let board = Board::from_fen(fen).unwrap();
            for m in board.generate_moves().iter() {
                assert!(board.is_legal(*m), "fen: {} move: {}", fen, m);
            }
        }
    }

    #[test]
    fn double_check_only_king_moves() {
        // A discovered double check from a rook and a knight.
        let board = Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/5PPq/8/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .unwrap();
        // Not double check here, but the qh4 check restricts replies.
        assert!(board.in_check());
        for m in board.generate_moves().iter() {
            board.clone().make_move(*m);
        }
    }
}
