//! A UCI chess engine built on the `sable` board library.
//!
//! This crate is mostly useful as a direct executable: the library surface
//! exists so the integration tests and benchmarks can drive the engine
//! without going through stdin.
//!
//! If you are interested in the chess foundations (the board, move
//! generation, etc.), see the `sable` crate instead.

#[macro_use]
extern crate lazy_static;

pub mod consts;
pub mod engine;
pub mod movepick;
pub mod root_moves;
pub mod search;
pub mod sync;
pub mod tables;
pub mod threadpool;
pub mod time_manager;
pub mod tt;
pub mod uci;

pub use consts::*;
