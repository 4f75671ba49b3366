//! A chess board representation library, providing the foundations for the
//! `sable_engine` crate.
//!
//! This crate contains the board representation, the bitboard attack
//! infrastructure, and a legality-restricted move generator. The companion
//! crate, `sable_engine`, builds the actual searching AI on top of these
//! foundations.
//!
//! # Usage
//!
//! A [`Board`] with the starting position:
//!
//! ```
//! use sable::Board;
//! let board = Board::start_pos();
//! ```
//!
//! Generating a list of moves (contained inside a [`MoveList`]):
//!
//! ```
//! use sable::Board;
//! let board = Board::start_pos();
//! let list = board.generate_moves();
//! assert_eq!(list.len(), 20);
//! ```
//!
//! Applying and undoing moves is symmetric:
//!
//! ```
//! use sable::Board;
//! let mut board = Board::start_pos();
//! let list = board.generate_moves();
//!
//! for mv in list.iter() {
//!     board.make_move(*mv);
//!     board.unmake_move();
//! }
//! ```
//!
//! FEN strings are also supported:
//!
//! ```
//! use sable::Board;
//! let start_position = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
//! let board = Board::from_fen(start_position).unwrap();
//! ```
//!
//! # Safety
//!
//! The library leans on precomputed lookup tables and raw bit manipulation
//! for speed. Methods that may panic or invoke undefined behavior when
//! misused are documented as such; in particular, a [`Move`] is only
//! meaningful for the exact position that generated it.
//!
//! [`Board`]: board/struct.Board.html
//! [`MoveList`]: core/move_list/struct.MoveList.html
//! [`Move`]: core/piece_move/struct.Move.html

#[macro_use]
extern crate bitflags;

pub mod board;
pub mod core;
pub mod helper;
pub mod tools;

pub use crate::board::Board;
pub use crate::core::bitboard::Bitboard;
pub use crate::core::move_list::{MoveList, ScoredMoveList};
pub use crate::core::piece_move::{Move, ScoredMove};
pub use crate::core::sq::Square;
pub use crate::core::{File, GenType, Piece, PieceType, Player, Rank};
pub use crate::helper::Helper;
