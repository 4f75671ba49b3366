//! This module contains [`Board`], the object representing the current
//! state of a chessboard. All modifications to the current state of the
//! board are done through this object, as well as gathering information
//! about the current state of the board.
//!
//! The [`Board`] is defined by a mailbox of pieces, per-piece-type
//! bitboards with per-color occupancy, the side to move, and a stack of
//! [`BoardState`]s. Each made move pushes a new state carrying everything
//! needed to unmake it, plus the legality masks (check mask, king ban, pin
//! rays) that let the move generator emit only legal moves.
//!
//! [`Board`]: struct.Board.html
//! [`BoardState`]: state/struct.BoardState.html

pub mod castle_rights;
pub mod fen;
pub mod movegen;
pub mod perft;
pub mod state;

use crate::core::masks::*;
use crate::core::mono_traits::{AllGenType, BishopType, CapturesGenType, QuietsGenType, RookType, SliderTrait};
use crate::core::move_list::MoveList;
use crate::core::piece_move::{Move, MoveFlag};
use crate::core::score::{Score, Value, PIECE_PHASE, PIECE_VALUE_MG, PIECE_VALUE_SEE};
use crate::core::sq::{Square, NO_SQ};
use crate::core::*;
use crate::helper::prelude;
use crate::Bitboard;

use self::castle_rights::Castling;
use self::movegen::MoveGen;
use self::state::BoardState;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Represents possible errors encountered while building a `Board` from a
/// FEN string.
#[derive(Error, Debug)]
pub enum FenBuildError {
    #[error("invalid number of fen sections: {sections}, expected 4 to 6")]
    NotEnoughSections { sections: usize },
    #[error("invalid number of ranks: {ranks}, expected 8")]
    IncorrectRankAmounts { ranks: usize },
    #[error("invalid turn: {turn}, expected 'w' or 'b'")]
    UnrecognizedTurn { turn: String },
    #[error("unreadable en-passant square: {ep}")]
    EpSquareUnreadable { ep: String },
    #[error("unrecognized piece: {piece}")]
    UnrecognizedPiece { piece: char },
    #[error("rank {rank} does not describe 8 squares")]
    BadRank { rank: usize },
    #[error("unreadable move counter")]
    UnreadableMoves(#[from] std::num::ParseIntError),
    #[error("player {player} has {num} kings, expected exactly one")]
    WrongKingCount { player: Player, num: u8 },
    #[error("the side not to move is left in check")]
    OppositeCheck,
}

/// Represents a chessboard through a `Board`.
///
/// The `Board` contains everything that needs to be known about the
/// current state of the game. It is used by both the engine and the move
/// generator, and is the only object through which the position may be
/// mutated.
pub struct Board {
    // Mailbox of pieces.
    board: [Piece; SQ_CNT],
    // Occupancy per piece type, both colors combined.
    type_bbs: [Bitboard; PIECE_TYPE_CNT],
    // Occupancy per player.
    occ: [Bitboard; PLAYER_CNT],
    // Count of each piece.
    piece_counts: [u8; PIECE_CNT],
    // The side to move.
    turn: Player,
    // Total plies played from the root position.
    plies: u16,
    // State of the board, un-modifiable once shared.
    state: Arc<BoardState>,
}

impl Clone for Board {
    fn clone(&self) -> Self {
        self.shallow_clone()
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Board) -> bool {
        self.turn == other.turn
            && self.board[..] == other.board[..]
            && self.type_bbs == other.type_bbs
            && self.occ == other.occ
            && *self.state == *other.state
    }
}

impl Board {
    /// Constructs a board from the starting position.
    ///
    /// # Examples
    ///
    /// ```
    /// use sable::{Board, Player};
    /// let board = Board::start_pos();
    /// assert_eq!(board.count_pieces_player(Player::White), 16);
    /// ```
    pub fn start_pos() -> Board {
        prelude::init_statics();
        Board::from_fen(fen::START_POS).expect("start position must parse")
    }

    /// Constructs a shallow clone of the board, sharing the current
    /// `BoardState` chain.
    ///
    /// # Safety
    ///
    /// [`Board::unmake_move`] may only be called on the clone after it has
    /// made a move of its own; the clone cannot unwind into states it did
    /// not create.
    pub fn shallow_clone(&self) -> Board {
        Board {
            board: self.board,
            type_bbs: self.type_bbs,
            occ: self.occ,
            piece_counts: self.piece_counts,
            turn: self.turn,
            plies: self.plies,
            state: Arc::clone(&self.state),
        }
    }

    /// Constructs a board from a FEN string.
    ///
    /// # Examples
    ///
    /// ```
    /// use sable::Board;
    /// let board = Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    /// assert_eq!(board.count_all_pieces(), 32);
    /// ```
    pub fn from_fen(fen_str: &str) -> Result<Board, FenBuildError> {
        prelude::init_statics();

        let sections: Vec<&str> = fen_str.split_whitespace().collect();
        if sections.len() < 4 || sections.len() > 6 {
            return Err(FenBuildError::NotEnoughSections {
                sections: sections.len(),
            });
        }

        let ranks: Vec<&str> = sections[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenBuildError::IncorrectRankAmounts { ranks: ranks.len() });
        }

        let mut board = Board {
            board: [Piece::None; SQ_CNT],
            type_bbs: [Bitboard::EMPTY; PIECE_TYPE_CNT],
            occ: [Bitboard::EMPTY; PLAYER_CNT],
            piece_counts: [0; PIECE_CNT],
            turn: Player::White,
            plies: 0,
            state: Arc::new(BoardState::blank()),
        };

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx;
            let mut file: usize = 0;
            for c in rank_str.chars() {
                if let Some(d) = c.to_digit(10) {
                    file += d as usize;
                } else {
                    let piece = match c {
                        'P' => Piece::WhitePawn,
                        'N' => Piece::WhiteKnight,
                        'B' => Piece::WhiteBishop,
                        'R' => Piece::WhiteRook,
                        'Q' => Piece::WhiteQueen,
                        'K' => Piece::WhiteKing,
                        'p' => Piece::BlackPawn,
                        'n' => Piece::BlackKnight,
                        'b' => Piece::BlackBishop,
                        'r' => Piece::BlackRook,
                        'q' => Piece::BlackQueen,
                        'k' => Piece::BlackKing,
                        _ => return Err(FenBuildError::UnrecognizedPiece { piece: c }),
                    };
                    if file > 7 {
                        return Err(FenBuildError::BadRank { rank: rank_idx });
                    }
                    board.put_piece(piece, Square((rank * 8 + file) as u8));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenBuildError::BadRank { rank: rank_idx });
            }
        }

        board.turn = match sections[1] {
            "w" => Player::White,
            "b" => Player::Black,
            _ => {
                return Err(FenBuildError::UnrecognizedTurn {
                    turn: sections[1].to_string(),
                })
            }
        };

        let mut castling = Castling::empty();
        for c in sections[2].chars() {
            castling.add_castling_char(c);
        }

        let us = board.turn;
        let them = !us;

        let ep_square = if sections[3] == "-" {
            NO_SQ
        } else {
            let bytes = sections[3].as_bytes();
            if bytes.len() != 2
                || !(b'a'..=b'h').contains(&bytes[0])
                || !(b'1'..=b'8').contains(&bytes[1])
            {
                return Err(FenBuildError::EpSquareUnreadable {
                    ep: sections[3].to_string(),
                });
            }
            let sq = Square((bytes[1] - b'1') * 8 + (bytes[0] - b'a'));
            // Only keep the square when a pawn of the side to move could
            // actually capture onto it.
            if (prelude::pawn_attacks_from(sq, them) & board.piece_bb(us, PieceType::Pawn))
                .is_not_empty()
            {
                sq
            } else {
                NO_SQ
            }
        };

        let rule_50: i16 = if sections.len() > 4 {
            sections[4].parse()?
        } else {
            0
        };
        let full_moves: u16 = if sections.len() > 5 {
            sections[5].parse::<u16>()?.max(1)
        } else {
            1
        };
        board.plies = 2 * (full_moves - 1) + (board.turn == Player::Black) as u16;

        // The mask refresh below needs both kings on the board; reject
        // headless positions before touching it.
        for player in [Player::White, Player::Black] {
            let kings = board.count_piece(player, PieceType::King);
            if kings != 1 {
                return Err(FenBuildError::WrongKingCount { player, num: kings });
            }
        }

        let mut state = BoardState::blank();
        state.castling = castling;
        state.ep_square = ep_square;
        state.rule_50 = rule_50;
        state.psq = board.compute_psq();
        state.game_phase = board.compute_game_phase();
        state.nonpawn_material = board.compute_nonpawn_material();
        state.key = board.compute_key(&state);
        state.pawn_key = board.compute_pawn_key();

        // Seed the check mask with any pawn or knight checker; sliders are
        // handled by the mask refresh.
        let ksq_bb = board.piece_bb(us, PieceType::King);
        for sq in board.piece_bb(them, PieceType::Pawn) {
            if (prelude::pawn_attacks_from(sq, them) & ksq_bb).is_not_empty() {
                state.check_mask = sq.to_bb();
            }
        }
        for sq in board.piece_bb(them, PieceType::Knight) {
            if (prelude::knight_moves(sq) & ksq_bb).is_not_empty() {
                state.check_mask = sq.to_bb();
            }
        }

        board.refresh_masks(&mut state);
        board.state = Arc::new(state);

        fen::validate(board)
    }

    /// Creates a FEN string of the given board.
    ///
    /// # Examples
    ///
    /// ```
    /// use sable::Board;
    /// let board = Board::start_pos();
    /// assert_eq!(board.fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    /// ```
    pub fn fen(&self) -> String {
        let mut s = String::with_capacity(90);
        for rank in (0..8).rev() {
            let mut blanks = 0;
            for file in 0..8 {
                let piece = self.board[rank * 8 + file];
                if piece == Piece::None {
                    blanks += 1;
                } else {
                    if blanks != 0 {
                        s.push(char::from_digit(blanks, 10).unwrap());
                        blanks = 0;
                    }
                    s.push(piece.character_lossy());
                }
            }
            if blanks != 0 {
                s.push(char::from_digit(blanks, 10).unwrap());
            }
            if rank != 0 {
                s.push('/');
            }
        }

        s.push(' ');
        s.push(match self.turn {
            Player::White => 'w',
            Player::Black => 'b',
        });
        s.push(' ');
        s.push_str(&self.state.castling.pretty_string());
        s.push(' ');
        if self.ep_square() == NO_SQ {
            s.push('-');
        } else {
            s.push_str(&self.ep_square().to_string());
        }
        s.push(' ');
        s.push_str(&self.rule_50().to_string());
        s.push(' ');
        s.push_str(&(self.plies / 2 + 1).to_string());
        s
    }

    //  ------- MAKE / UNMAKE -------

    /// Applies a move to the board.
    ///
    /// # Safety
    ///
    /// The passed in [`Move`] must be legal for the current position; only
    /// moves from [`Board::generate_moves`] or validated through
    /// [`Board::is_legal`] qualify.
    pub fn make_move(&mut self, m: Move) {
        debug_assert!(m.is_okay());
        debug_assert_ne!(m.from(), m.to());

        let mut key: u64 = self.state.key ^ prelude::z_side();
        let mut pawn_key: u64 = self.state.pawn_key;

        let mut next = self.state.partial_clone();
        next.prev = Some(Arc::clone(&self.state));
        next.prev_move = m;
        next.rule_50 += 1;
        next.ply += 1;
        self.plies += 1;

        let us = self.turn;
        let them = !us;
        let from = m.from();
        let to = m.to();
        let piece = self.piece_on(from);
        debug_assert_ne!(piece, Piece::None);
        debug_assert_eq!(piece.player_lossy(), us);

        let captured: Piece = if m.is_en_passant() {
            Piece::make_lossy(them, PieceType::Pawn)
        } else {
            self.piece_on(to)
        };
        debug_assert_ne!(captured.type_of(), PieceType::King);

        if m.is_castle() {
            debug_assert_eq!(piece.type_of(), PieceType::King);
            let rook = Piece::make_lossy(us, PieceType::Rook);
            let (rook_from, rook_to) = castle_rook_squares(us, from, to);
            self.move_piece(rook_from, rook_to);
            next.psq += prelude::psq(rook, rook_to) - prelude::psq(rook, rook_from);
            key ^= prelude::z_square(rook_from, rook) ^ prelude::z_square(rook_to, rook);
        } else if captured != Piece::None {
            let mut cap_sq = to;
            if m.is_en_passant() {
                debug_assert_eq!(to, self.state.ep_square);
                cap_sq = cap_sq.offset(-us.pawn_push());
                debug_assert_eq!(self.piece_on(cap_sq), captured);
            }
            if captured.type_of() == PieceType::Pawn {
                pawn_key ^= prelude::z_square(cap_sq, captured);
            } else {
                next.nonpawn_material[them as usize] -=
                    PIECE_VALUE_MG[captured.type_of() as usize];
            }
            next.game_phase -= PIECE_PHASE[captured.type_of() as usize];
            next.psq -= prelude::psq(captured, cap_sq);
            self.remove_piece(cap_sq);
            key ^= prelude::z_square(cap_sq, captured);
            next.rule_50 = 0;
        }
        next.captured = captured;

        // Clear any previous en-passant square.
        if self.state.ep_square != NO_SQ {
            key ^= prelude::z_ep(self.state.ep_square);
            next.ep_square = NO_SQ;
        }

        self.move_piece(from, to);
        next.psq += prelude::psq(piece, to) - prelude::psq(piece, from);
        key ^= prelude::z_square(from, piece) ^ prelude::z_square(to, piece);

        if piece.type_of() == PieceType::Pawn {
            if from.0 ^ to.0 == 16 {
                // Double push. The en-passant square only exists when an
                // enemy pawn stands ready to capture onto it, which keeps
                // the Zobrist key canonical.
                let ep = Square((from.0 + to.0) / 2);
                if (prelude::pawn_attacks_from(ep, us) & self.piece_bb(them, PieceType::Pawn))
                    .is_not_empty()
                {
                    next.ep_square = ep;
                    key ^= prelude::z_ep(ep);
                }
            } else if m.is_promotion() {
                let promo = Piece::make_lossy(us, m.promo());
                self.remove_piece(to);
                self.put_piece(promo, to);
                next.psq += prelude::psq(promo, to) - prelude::psq(piece, to);
                next.nonpawn_material[us as usize] += PIECE_VALUE_MG[m.promo() as usize];
                next.game_phase += PIECE_PHASE[m.promo() as usize];
                key ^= prelude::z_square(to, piece) ^ prelude::z_square(to, promo);
                pawn_key ^= prelude::z_square(to, piece);

                if m.promo() == PieceType::Knight
                    && (prelude::knight_moves(to) & self.piece_bb(them, PieceType::King))
                        .is_not_empty()
                {
                    next.check_mask = to.to_bb();
                }
            }
            next.rule_50 = 0;
            pawn_key ^= prelude::z_square(from, piece) ^ prelude::z_square(to, piece);

            // Direct pawn checks are caught here; slider discoveries are
            // caught in the mask refresh.
            if !m.is_promotion()
                && (prelude::pawn_attacks_from(to, us) & self.piece_bb(them, PieceType::King))
                    .is_not_empty()
            {
                next.check_mask = to.to_bb();
            }
        } else if piece.type_of() == PieceType::Knight
            && (prelude::knight_moves(to) & self.piece_bb(them, PieceType::King)).is_not_empty()
        {
            next.check_mask = to.to_bb();
        }

        // Update castling rights.
        key ^= prelude::z_castle(next.castling.bits());
        next.castling &= Castling::from_bits_truncate(
            prelude::castling_on(from) & prelude::castling_on(to),
        );
        key ^= prelude::z_castle(next.castling.bits());

        self.turn = them;
        next.key = key;
        next.pawn_key = pawn_key;

        // Walk the state chain backwards two plies at a time looking for a
        // repetition of this key.
        next.repetition = 0;
        let end = next.ply.min(next.rule_50 as u16);
        if end >= 4 {
            let mut walk = self.state.get_prev();
            let mut i: u16 = 4;
            while i <= end {
                walk = walk.and_then(|s| s.get_prev()).and_then(|s| s.get_prev());
                match walk {
                    None => break,
                    Some(ref s) => {
                        if s.key == key {
                            next.repetition = if s.repetition != 0 {
                                -(i as i16)
                            } else {
                                i as i16
                            };
                            break;
                        }
                    }
                }
                i += 2;
            }
        }

        self.refresh_masks(&mut next);
        self.state = Arc::new(next);

        debug_assert!(self.is_okay());
    }

    /// Un-does the previously applied move, returning the board to its
    /// most recently held state.
    ///
    /// # Panics
    ///
    /// Panics if there is no previous state to return to, which happens
    /// when unmaking more moves than were made since the board's creation.
    pub fn unmake_move(&mut self) {
        let m = self.state.prev_move;
        debug_assert!(m.is_okay());

        self.turn = !self.turn;
        let us = self.turn;
        let from = m.from();
        let to = m.to();

        debug_assert!(self.piece_on(from) == Piece::None || m.is_castle());

        if m.is_promotion() {
            debug_assert_eq!(self.piece_type_on(to), m.promo());
            self.remove_piece(to);
            self.put_piece(Piece::make_lossy(us, PieceType::Pawn), to);
        }

        if m.is_castle() {
            let (rook_from, rook_to) = castle_rook_squares(us, from, to);
            self.move_piece(rook_to, rook_from);
        }

        self.move_piece(to, from);

        let captured = self.state.captured;
        if captured != Piece::None {
            let mut cap_sq = to;
            if m.is_en_passant() {
                cap_sq = cap_sq.offset(-us.pawn_push());
            }
            self.put_piece(captured, cap_sq);
        }

        self.state = self.state.get_prev().unwrap();
        self.plies -= 1;

        debug_assert!(self.is_okay());
    }

    /// Applies a null move: the turn passes without a piece moving.
    ///
    /// # Safety
    ///
    /// Only legal when the side to move is not in check. Used by the search
    /// for bound-tightening; never part of a real game.
    pub fn make_null_move(&mut self) {
        debug_assert!(!self.in_check());

        let mut key = self.state.key ^ prelude::z_side();

        let mut next = self.state.partial_clone();
        next.prev = Some(Arc::clone(&self.state));
        next.prev_move = Move::null();
        next.rule_50 += 1;
        // The repetition window never crosses a null move.
        next.ply = 0;

        if self.state.ep_square != NO_SQ {
            key ^= prelude::z_ep(self.state.ep_square);
            next.ep_square = NO_SQ;
        }

        next.key = key;
        self.turn = !self.turn;
        self.refresh_masks(&mut next);
        self.state = Arc::new(next);
    }

    /// Undoes a null move.
    ///
    /// # Safety
    ///
    /// The last applied move must have been a null move.
    pub fn unmake_null_move(&mut self) {
        debug_assert!(self.state.prev_move.is_null());
        self.turn = !self.turn;
        self.state = self.state.get_prev().unwrap();
    }

    //  ------- MASK REFRESH -------

    /// Rebuilds the legality mask block of a state: check mask, king ban,
    /// pin rays, en-passant pin, king destinations and the available mask.
    /// Called after every make.
    fn refresh_masks(&self, st: &mut BoardState) {
        let us = self.turn;
        let them = !us;
        let ksq = self.king_sq(us);

        st.king_ban = prelude::king_moves(self.king_sq(them));
        st.king_attacks = prelude::king_moves(ksq);
        st.bishop_pin = Bitboard::EMPTY;
        st.rook_pin = Bitboard::EMPTY;
        st.ep_pin = false;

        self.check_by_slider::<BishopType>(st, ksq);
        self.check_by_slider::<RookType>(st, ksq);

        if st.ep_square != NO_SQ {
            self.refresh_ep_pin(st, ksq);
        }

        st.king_attacks &= !(self.occ[us as usize] | st.king_ban);
        st.available = st.check_mask & !self.occ[us as usize];

        // The attacked set is only needed to validate king destinations;
        // when none survive the cheap filters it is skipped entirely.
        if st.king_attacks.is_empty() {
            st.attacked = Bitboard::EMPTY;
            return;
        }

        st.attacked = self.attacked_by(them);
        st.king_attacks &= !st.attacked;
        st.king_ban |= st.attacked;
    }

    /// Finds direct checks and pins from one slider family against the
    /// king at `ksq`, restricting the check mask and accumulating pin rays.
    fn check_by_slider<S: SliderTrait>(&self, st: &mut BoardState, ksq: Square) {
        let them = !self.turn;
        let enemy_sliders =
            self.piece_bb(them, S::piece_type()) | self.piece_bb(them, PieceType::Queen);

        // Rays cast with only enemy occupancy pass through our own pieces,
        // finding both direct checkers and pin candidates at once.
        let mut candidates = S::attacks(self.occ[them as usize], ksq) & enemy_sliders;
        if candidates.is_empty() {
            return;
        }

        let direct = S::attacks(self.occupied(), ksq) & enemy_sliders;
        candidates &= !direct;

        for checker in direct {
            if st.check_mask == Bitboard::ALL {
                st.check_mask = prelude::pin_bb(ksq, checker);
            } else {
                // Double check: only king moves remain.
                st.check_mask = Bitboard::EMPTY;
            }
            st.king_ban |= prelude::check_bb(ksq, checker);
        }

        for pinner in candidates {
            let pin_ray = prelude::pin_bb(ksq, pinner);

            if S::piece_type() == PieceType::Bishop && st.ep_square != NO_SQ {
                // The double-pushed pawn sitting on a diagonal ray to our
                // king cannot be captured en passant.
                let target = st.ep_square.offset(-self.turn.pawn_push());
                if pin_ray.contains(target) {
                    st.ep_pin = true;
                }
            }

            let blockers = pin_ray & self.occ[self.turn as usize];
            if blockers.is_not_empty() && !blockers.more_than_one() {
                if S::piece_type() == PieceType::Bishop {
                    st.bishop_pin |= pin_ray;
                } else {
                    st.rook_pin |= pin_ray;
                }
            }
        }
    }

    /// Detects the horizontal en-passant pin: if our king shares the
    /// en-passant rank with an enemy rook or queen, capturing en passant
    /// removes two pawns from that rank at once and may discover a check.
    fn refresh_ep_pin(&self, st: &mut BoardState, ksq: Square) {
        let us = self.turn;
        let them = !us;
        let pawns = self.piece_bb(us, PieceType::Pawn);
        let enemy_rq = self.piece_bb(them, PieceType::Rook) | self.piece_bb(them, PieceType::Queen);
        let target = st.ep_square.offset(-us.pawn_push());
        let ep_rank = target.rank_bb();

        if (ep_rank & ksq.to_bb()).is_empty()
            || (ep_rank & enemy_rq).is_empty()
            || (ep_rank & pawns).is_empty()
        {
            return;
        }

        let target_bb = target.to_bb();
        for capturer in [
            pawns & Bitboard(target_bb.0 << 1) & !Bitboard::FILE_A,
            pawns & Bitboard(target_bb.0 >> 1) & !Bitboard::FILE_H,
        ] {
            if capturer.is_not_empty() {
                let after = self.occupied() & !(target_bb | capturer);
                if (prelude::rook_moves(after, ksq) & ep_rank & enemy_rq).is_not_empty() {
                    st.ep_pin = true;
                }
            }
        }
    }

    //  ------- ATTACK QUERIES -------

    /// Returns the set of every square attacked by the given player with
    /// the current occupancy.
    pub fn attacked_by(&self, player: Player) -> Bitboard {
        let occ = self.occupied();
        let mut attacks = Bitboard::EMPTY;

        let pawns = self.piece_bb(player, PieceType::Pawn);
        attacks |= pawn_attacks_bb(pawns, player);

        for sq in self.piece_bb(player, PieceType::Knight) {
            attacks |= prelude::knight_moves(sq);
        }

        attacks |= prelude::king_moves(self.king_sq(player));

        let diag = self.piece_bb(player, PieceType::Bishop) | self.piece_bb(player, PieceType::Queen);
        for sq in diag {
            attacks |= prelude::bishop_moves(occ, sq);
        }

        let straight = self.piece_bb(player, PieceType::Rook) | self.piece_bb(player, PieceType::Queen);
        for sq in straight {
            attacks |= prelude::rook_moves(occ, sq);
        }

        attacks
    }

    /// Returns the `Bitboard` of all pieces (of both players) attacking
    /// `sq` with a given occupancy.
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        (prelude::pawn_attacks_from(sq, Player::Black) & self.piece_bb(Player::White, PieceType::Pawn))
            | (prelude::pawn_attacks_from(sq, Player::White)
                & self.piece_bb(Player::Black, PieceType::Pawn))
            | (prelude::knight_moves(sq) & self.type_bbs[PieceType::Knight as usize])
            | (prelude::bishop_moves(occupied, sq)
                & (self.type_bbs[PieceType::Bishop as usize]
                    | self.type_bbs[PieceType::Queen as usize]))
            | (prelude::rook_moves(occupied, sq)
                & (self.type_bbs[PieceType::Rook as usize]
                    | self.type_bbs[PieceType::Queen as usize]))
            | (prelude::king_moves(sq) & self.type_bbs[PieceType::King as usize])
    }

    //  ------- STATIC EXCHANGE EVALUATION -------

    /// Answers whether the side to move, after making `m`, holds at least
    /// `threshold` centipawns worth of material through optimal captures
    /// on the destination square.
    pub fn see_ge(&self, m: Move, threshold: Value) -> bool {
        // Castling, promotion and en passant shuffle more than one square;
        // approximate them as breaking even.
        if m.flag() != MoveFlag::Normal {
            return threshold <= 0;
        }

        let from = m.from();
        let to = m.to();

        let mut swap: Value = PIECE_VALUE_SEE[self.piece_type_on(to) as usize] - threshold;
        if swap < 0 {
            return false;
        }

        swap = PIECE_VALUE_SEE[self.piece_type_on(from) as usize] - swap;
        if swap <= 0 {
            return true;
        }

        let mut occupied = self.occupied() ^ from.to_bb() ^ to.to_bb();
        let mut stm = self.turn;
        let mut attackers = self.attackers_to(to, occupied);
        let mut res = true;

        let diag_sliders =
            self.type_bbs[PieceType::Bishop as usize] | self.type_bbs[PieceType::Queen as usize];
        let straight_sliders =
            self.type_bbs[PieceType::Rook as usize] | self.type_bbs[PieceType::Queen as usize];

        loop {
            stm = !stm;
            attackers &= occupied;

            let stm_attackers = attackers & self.occ[stm as usize];
            if stm_attackers.is_empty() {
                break;
            }
            res = !res;

            // Pick the least valuable attacker, uncovering x-rays behind it.
            let mut next_attacker = stm_attackers & self.type_bbs[PieceType::Pawn as usize];
            if next_attacker.is_not_empty() {
                swap = PIECE_VALUE_SEE[PieceType::Pawn as usize] - swap;
                if swap < res as Value {
                    break;
                }
                occupied ^= next_attacker.lsb();
                attackers |= prelude::bishop_moves(occupied, to) & diag_sliders;
                continue;
            }

            next_attacker = stm_attackers & self.type_bbs[PieceType::Knight as usize];
            if next_attacker.is_not_empty() {
                swap = PIECE_VALUE_SEE[PieceType::Knight as usize] - swap;
                if swap < res as Value {
                    break;
                }
                occupied ^= next_attacker.lsb();
                continue;
            }

            next_attacker = stm_attackers & self.type_bbs[PieceType::Bishop as usize];
            if next_attacker.is_not_empty() {
                swap = PIECE_VALUE_SEE[PieceType::Bishop as usize] - swap;
                if swap < res as Value {
                    break;
                }
                occupied ^= next_attacker.lsb();
                attackers |= prelude::bishop_moves(occupied, to) & diag_sliders;
                continue;
            }

            next_attacker = stm_attackers & self.type_bbs[PieceType::Rook as usize];
            if next_attacker.is_not_empty() {
                swap = PIECE_VALUE_SEE[PieceType::Rook as usize] - swap;
                if swap < res as Value {
                    break;
                }
                occupied ^= next_attacker.lsb();
                attackers |= prelude::rook_moves(occupied, to) & straight_sliders;
                continue;
            }

            next_attacker = stm_attackers & self.type_bbs[PieceType::Queen as usize];
            if next_attacker.is_not_empty() {
                swap = PIECE_VALUE_SEE[PieceType::Queen as usize] - swap;
                if swap < res as Value {
                    break;
                }
                occupied ^= next_attacker.lsb();
                attackers |= (prelude::bishop_moves(occupied, to) & diag_sliders)
                    | (prelude::rook_moves(occupied, to) & straight_sliders);
                continue;
            }

            // King: capturing is only final if the opponent has no
            // attackers left behind it.
            return if (attackers & !self.occ[stm as usize]).is_not_empty() {
                !res
            } else {
                res
            };
        }

        res
    }

    //  ------- MOVE VALIDATION -------

    /// Checks a move from an outside source (transposition table, killer
    /// slot, counter-move slot) for full legality in this position.
    pub fn is_legal(&self, m: Move) -> bool {
        if !m.is_okay() {
            return false;
        }

        let us = self.turn;
        let st = &self.state;
        let from = m.from();
        let to = m.to();
        let piece = self.piece_on(from);
        let target = self.piece_on(to);

        if piece == Piece::None
            || piece.player_lossy() != us
            || self.piece_type_on(to) == PieceType::King
            || (target != Piece::None && target.player_lossy() == us)
        {
            return false;
        }

        if m.is_en_passant()
            && (st.ep_pin
                || st.ep_square != to
                || piece.type_of() != PieceType::Pawn
                || !prelude::pawn_attacks_from(from, us).contains(to))
        {
            return false;
        }

        if m.is_castle() {
            if piece.type_of() != PieceType::King || self.in_check() {
                return false;
            }
            let king_side = to > from;
            if to != us.relative_square(if king_side { Square::G1 } else { Square::C1 }) {
                return false;
            }
            let right = castle_right(us, king_side);
            let transit = castle_transit_squares(us, king_side);
            let rook_home = us.relative_square(if king_side { Square::H1 } else { Square::A1 });
            let occupancy_block = if king_side {
                transit
            } else {
                transit | us.relative_square(Square::B1).to_bb()
            };

            return st.castling.contains(right)
                && from == self.king_sq(us)
                && self.piece_on(rook_home) == Piece::make_lossy(us, PieceType::Rook)
                && (self.occupied() & occupancy_block).is_empty()
                && (st.king_ban & transit).is_empty();
        }

        match piece.type_of() {
            PieceType::Pawn => {
                if m.is_en_passant() {
                    // Validated above; the pin-ray test below still applies.
                } else {
                    let push = us.pawn_push();
                    let is_capture = (prelude::pawn_attacks_from(from, us)
                        & self.occ[(!us) as usize])
                        .contains(to);
                    let is_single = from.offset(push) == to && target == Piece::None;
                    let is_double = from.offset(push).offset(push) == to
                        && from.rank() == us.relative_rank(Rank::R2)
                        && target == Piece::None
                        && self.piece_on(from.offset(push)) == Piece::None;
                    if !is_capture && !is_single && !is_double {
                        return false;
                    }
                    if m.is_promotion() != (to.rank() == us.relative_rank(Rank::R8)) {
                        return false;
                    }
                }
            }
            PieceType::King => {
                if st.king_ban.contains(to) || from.distance(to) > 1 {
                    return false;
                }
            }
            PieceType::Knight => {
                if !prelude::knight_moves(from).contains(to) {
                    return false;
                }
            }
            PieceType::Bishop => {
                if !prelude::bishop_moves(self.occupied(), from).contains(to) {
                    return false;
                }
            }
            PieceType::Rook => {
                if !prelude::rook_moves(self.occupied(), from).contains(to) {
                    return false;
                }
            }
            PieceType::Queen => {
                if !prelude::queen_moves(self.occupied(), from).contains(to) {
                    return false;
                }
            }
            _ => return false,
        }

        if piece.type_of() != PieceType::King && self.in_check() {
            let lands_on = if m.is_en_passant() {
                // Capturing the checking pawn counts, as does blocking.
                st.check_mask.contains(to.offset(-us.pawn_push())) || st.check_mask.contains(to)
            } else {
                st.check_mask.contains(to)
            };
            if !lands_on {
                return false;
            }
        }

        let pinned = (st.bishop_pin | st.rook_pin) & self.occ[us as usize];
        !pinned.contains(from) || prelude::aligned(from, to, self.king_sq(us))
    }

    //  ------- MOVE GENERATION -------

    /// Gets a list of legal [`Move`]s for the player whose turn it is.
    ///
    /// The board being in check is already taken into account.
    ///
    /// # Examples
    ///
    /// ```
    /// use sable::Board;
    /// let board = Board::start_pos();
    /// assert_eq!(board.generate_moves().len(), 20);
    /// ```
    pub fn generate_moves(&self) -> MoveList {
        MoveGen::generate::<AllGenType>(self)
    }

    /// Gets a list of legal moves of a certain [`GenType`].
    pub fn generate_moves_of_type(&self, gen_type: GenType) -> MoveList {
        match gen_type {
            GenType::All => MoveGen::generate::<AllGenType>(self),
            GenType::Captures => MoveGen::generate::<CapturesGenType>(self),
            GenType::Quiets => MoveGen::generate::<QuietsGenType>(self),
        }
    }

    /// Translates a move given in UCI notation ("e2e4", "e7e8q", ...) into
    /// a legal move for this position, if one matches.
    pub fn to_move(&self, uci: &str) -> Option<Move> {
        self.generate_moves()
            .iter()
            .find(|m| m.stringify() == uci)
            .copied()
    }

    //  ------- PIECE MANIPULATION -------

    fn put_piece(&mut self, piece: Piece, sq: Square) {
        debug_assert_eq!(self.piece_on(sq), Piece::None);
        let bb = sq.to_bb();
        self.board[sq.0 as usize] = piece;
        self.type_bbs[piece.type_of() as usize] |= bb;
        self.occ[piece.player_lossy() as usize] |= bb;
        self.piece_counts[piece as usize] += 1;
    }

    fn remove_piece(&mut self, sq: Square) {
        let piece = self.piece_on(sq);
        debug_assert_ne!(piece, Piece::None);
        let bb = sq.to_bb();
        self.board[sq.0 as usize] = Piece::None;
        self.type_bbs[piece.type_of() as usize] ^= bb;
        self.occ[piece.player_lossy() as usize] ^= bb;
        self.piece_counts[piece as usize] -= 1;
    }

    fn move_piece(&mut self, from: Square, to: Square) {
        debug_assert_ne!(from, to);
        let piece = self.piece_on(from);
        debug_assert_ne!(piece, Piece::None);
        let bb = from.to_bb() | to.to_bb();
        self.board[from.0 as usize] = Piece::None;
        self.board[to.0 as usize] = piece;
        self.type_bbs[piece.type_of() as usize] ^= bb;
        self.occ[piece.player_lossy() as usize] ^= bb;
    }

    //  ------- GETTERS -------

    /// Gets the player whose turn it is to move.
    #[inline(always)]
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// Returns the Zobrist key of the board.
    #[inline(always)]
    pub fn key(&self) -> u64 {
        self.state.key
    }

    /// Returns the Zobrist key of the pawn structure.
    #[inline(always)]
    pub fn pawn_key(&self) -> u64 {
        self.state.pawn_key
    }

    /// Returns an approximation of the Zobrist key after the given move is
    /// made, used for prefetching transposition entries.
    pub fn key_after(&self, m: Move) -> u64 {
        let from = m.from();
        let to = m.to();
        let piece = self.piece_on(from);
        let captured = self.piece_on(to);
        let mut key = self.state.key ^ prelude::z_side();
        if captured != Piece::None {
            key ^= prelude::z_square(to, captured);
        }
        key ^ prelude::z_square(from, piece) ^ prelude::z_square(to, piece)
    }

    /// Returns the current [`BoardState`].
    #[inline(always)]
    pub fn state(&self) -> &BoardState {
        &self.state
    }

    /// Returns the total plies played from the root position.
    #[inline(always)]
    pub fn plies(&self) -> u16 {
        self.plies
    }

    /// Returns the half-moves since the last capture or pawn move.
    #[inline(always)]
    pub fn rule_50(&self) -> i16 {
        self.state.rule_50
    }

    /// Returns the current en-passant square, `NO_SQ` if there is none.
    #[inline(always)]
    pub fn ep_square(&self) -> Square {
        self.state.ep_square
    }

    /// Returns if the side to move is in check.
    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.state.check_mask != Bitboard::ALL
    }

    /// Returns if the position is drawn by the fifty-move rule or by
    /// repetition inside the current search (`ply` plies deep).
    #[inline]
    pub fn is_draw(&self, ply: u16) -> bool {
        if self.state.rule_50 > 99 {
            return true;
        }
        self.state.repetition != 0 && (self.state.repetition as i32) < i32::from(ply)
    }

    /// Gets the `Bitboard` of all occupied squares.
    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.occ[0] | self.occ[1]
    }

    /// Gets the `Bitboard` of squares occupied by the given player.
    #[inline(always)]
    pub fn occupied_player(&self, player: Player) -> Bitboard {
        self.occ[player as usize]
    }

    /// Returns the `Bitboard` of a single player's pieces of one type.
    #[inline(always)]
    pub fn piece_bb(&self, player: Player, piece_type: PieceType) -> Bitboard {
        self.type_bbs[piece_type as usize] & self.occ[player as usize]
    }

    /// Returns the combined `Bitboard` of both players' pieces of one type.
    #[inline(always)]
    pub fn piece_bb_both_players(&self, piece_type: PieceType) -> Bitboard {
        self.type_bbs[piece_type as usize]
    }

    /// Returns the square of the given player's king.
    #[inline(always)]
    pub fn king_sq(&self, player: Player) -> Square {
        (self.type_bbs[PieceType::King as usize] & self.occ[player as usize]).lsb_sq()
    }

    /// Returns the piece standing on a square.
    #[inline(always)]
    pub fn piece_on(&self, sq: Square) -> Piece {
        debug_assert!(sq.is_okay());
        unsafe { *self.board.get_unchecked(sq.0 as usize) }
    }

    /// Returns the type of the piece standing on a square.
    #[inline(always)]
    pub fn piece_type_on(&self, sq: Square) -> PieceType {
        self.piece_on(sq).type_of()
    }

    /// Returns the piece that the given move moves.
    #[inline(always)]
    pub fn moved_piece(&self, m: Move) -> Piece {
        self.piece_on(m.from())
    }

    /// Returns the type of piece the given move captures, pawn for
    /// en-passant, `None` for non-captures.
    #[inline(always)]
    pub fn captured_piece(&self, m: Move) -> PieceType {
        if m.is_en_passant() {
            PieceType::Pawn
        } else {
            self.piece_type_on(m.to())
        }
    }

    /// Returns if the given move captures a piece.
    #[inline(always)]
    pub fn is_capture(&self, m: Move) -> bool {
        m.is_en_passant() || self.piece_on(m.to()) != Piece::None
    }

    /// Returns if the given move is a capture or a promotion.
    #[inline(always)]
    pub fn is_capture_or_promotion(&self, m: Move) -> bool {
        m.is_promotion() || self.is_capture(m)
    }

    /// Returns the piece last captured, if any.
    #[inline(always)]
    pub fn piece_captured_last_turn(&self) -> Piece {
        self.state.captured
    }

    /// Returns the accumulated material + piece-square score.
    #[inline(always)]
    pub fn psq(&self) -> Score {
        self.state.psq
    }

    /// Returns the incremental game phase.
    #[inline(always)]
    pub fn game_phase(&self) -> i32 {
        self.state.game_phase
    }

    /// Returns the value of a player's non-pawn material.
    #[inline(always)]
    pub fn non_pawn_material(&self, player: Player) -> Value {
        self.state.nonpawn_material[player as usize]
    }

    /// Returns the value of both players' non-pawn material.
    #[inline(always)]
    pub fn non_pawn_material_all(&self) -> Value {
        self.state.nonpawn_material[0] + self.state.nonpawn_material[1]
    }

    /// Gets the total number of pieces of a given type and player.
    #[inline(always)]
    pub fn count_piece(&self, player: Player, piece_type: PieceType) -> u8 {
        self.piece_counts[Piece::make_lossy(player, piece_type) as usize]
    }

    /// Gets the total number of pieces of a given player.
    pub fn count_pieces_player(&self, player: Player) -> u8 {
        self.occ[player as usize].count_bits()
    }

    /// Gets the total number of pieces on the board.
    pub fn count_all_pieces(&self) -> u8 {
        self.occupied().count_bits()
    }

    //  ------- FROM-SCRATCH COMPUTATIONS -------

    fn compute_key(&self, st: &BoardState) -> u64 {
        let mut key: u64 = 0;
        for sq in self.occupied() {
            key ^= prelude::z_square(sq, self.piece_on(sq));
        }
        if st.ep_square != NO_SQ {
            key ^= prelude::z_ep(st.ep_square);
        }
        key ^= prelude::z_castle(st.castling.bits());
        if self.turn == Player::Black {
            key ^= prelude::z_side();
        }
        key
    }

    fn compute_pawn_key(&self) -> u64 {
        let mut key: u64 = 0;
        for sq in self.type_bbs[PieceType::Pawn as usize] {
            key ^= prelude::z_square(sq, self.piece_on(sq));
        }
        key
    }

    fn compute_psq(&self) -> Score {
        let mut psq = Score::ZERO;
        for sq in self.occupied() {
            psq += prelude::psq(self.piece_on(sq), sq);
        }
        psq
    }

    fn compute_game_phase(&self) -> i32 {
        let mut phase = 0;
        for sq in self.occupied() {
            phase += PIECE_PHASE[self.piece_type_on(sq) as usize];
        }
        phase
    }

    fn compute_nonpawn_material(&self) -> [Value; PLAYER_CNT] {
        let mut npm = [0; PLAYER_CNT];
        for sq in self.occupied() & !self.type_bbs[PieceType::Pawn as usize] {
            let piece = self.piece_on(sq);
            if piece.type_of() != PieceType::King {
                npm[piece.player_lossy() as usize] += PIECE_VALUE_MG[piece.type_of() as usize];
            }
        }
        npm
    }

    //  ------- VALIDATION -------

    /// Checks the board's structural invariants; all failures here are
    /// programming errors.
    pub fn is_okay(&self) -> bool {
        // Occupancies of the two players never overlap, and their union
        // agrees with the piece-type boards.
        if (self.occ[0] & self.occ[1]).is_not_empty() {
            return false;
        }
        let mut union = Bitboard::EMPTY;
        for &pt in ALL_PIECE_TYPES.iter() {
            union |= self.type_bbs[pt as usize];
        }
        if union != self.occupied() {
            return false;
        }

        // The mailbox and the bitboards describe the same board.
        for s in 0..SQ_CNT as u8 {
            let sq = Square(s);
            let piece = self.piece_on(sq);
            if piece == Piece::None {
                if self.occupied().contains(sq) {
                    return false;
                }
            } else if !self.piece_bb(piece.player_lossy(), piece.type_of()).contains(sq) {
                return false;
            }
        }

        // Exactly one king each, and the side that just moved may not be
        // left in check.
        if self.count_piece(Player::White, PieceType::King) != 1
            || self.count_piece(Player::Black, PieceType::King) != 1
        {
            return false;
        }
        let them = !self.turn;
        if (self.attackers_to(self.king_sq(them), self.occupied()) & self.occ[self.turn as usize])
            .is_not_empty()
        {
            return false;
        }

        // The incremental key matches a from-scratch recomputation.
        self.compute_key(&self.state) == self.state.key
            && self.compute_pawn_key() == self.state.pawn_key
    }

    /// Returns a prettified string of the current board, for debugging.
    pub fn pretty_string(&self) -> String {
        let mut s = String::with_capacity(360);
        for rank in (0..8).rev() {
            s.push(RANK_DISPLAYS[rank]);
            s.push_str(" | ");
            for file in 0..8 {
                let piece = self.board[rank * 8 + file];
                match piece.character() {
                    Some(c) => s.push(c),
                    None => s.push('.'),
                }
                s.push(' ');
            }
            s.push('\n');
        }
        s.push_str("    a b c d e f g h\n");
        s.push_str(&format!("{} to move\n", self.turn));
        s
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pretty_string())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Board: {}\nfen: {}", self.pretty_string(), self.fen())
    }
}

/// Returns the attack front of a whole pawn set for a player.
#[inline(always)]
pub fn pawn_attacks_bb(pawns: Bitboard, player: Player) -> Bitboard {
    match player {
        Player::White => ((pawns & !Bitboard::FILE_A) << 7) | ((pawns & !Bitboard::FILE_H) << 9),
        Player::Black => ((pawns & !Bitboard::FILE_H) >> 7) | ((pawns & !Bitboard::FILE_A) >> 9),
    }
}

/// Returns the rook's origin and destination squares for a castle encoded
/// as a king move from `from` to `to`.
#[inline]
pub fn castle_rook_squares(player: Player, from: Square, to: Square) -> (Square, Square) {
    if to > from {
        (
            player.relative_square(Square::H1),
            player.relative_square(Square::F1),
        )
    } else {
        (
            player.relative_square(Square::A1),
            player.relative_square(Square::D1),
        )
    }
}

/// Returns the castling right bit for a player and side.
#[inline]
pub fn castle_right(player: Player, king_side: bool) -> Castling {
    match (player, king_side) {
        (Player::White, true) => Castling::WHITE_K,
        (Player::White, false) => Castling::WHITE_Q,
        (Player::Black, true) => Castling::BLACK_K,
        (Player::Black, false) => Castling::BLACK_Q,
    }
}

/// Returns the squares the king crosses while castling, which must be
/// neither occupied nor attacked.
#[inline]
pub fn castle_transit_squares(player: Player, king_side: bool) -> Bitboard {
    let (a, b) = if king_side {
        (Square::F1, Square::G1)
    } else {
        (Square::C1, Square::D1)
    };
    player.relative_square(a).to_bb() | player.relative_square(b).to_bb()
}
