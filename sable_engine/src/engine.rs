//! The engine controller: the object the UCI layer drives.
//!
//! Owns the game position and translates controller commands into thread
//! pool and transposition table operations. It never makes an illegal
//! move and never loses the current position to a bad input.

use sable::board::Board;
use sable::board::perft::perft_parallel;

use crate::consts::*;
use crate::threadpool::{init_threadpool, threadpool};
use crate::time_manager::Limits;

/// The number of engine-defined UCI options.
pub static OPTION_NAMES: [&str; 4] = ["Hash", "Threads", "Clear Hash", "Move Overhead"];

/// The state driven by the UCI layer.
pub struct Engine {
    board: Board,
    threads: usize,
    move_overhead: i64,
}

impl Engine {
    /// Creates the engine: initializes the global tables, the thread pool,
    /// and the starting position.
    pub fn new() -> Self {
        init_globals();
        init_threadpool();
        Engine {
            board: Board::start_pos(),
            threads: 1,
            move_overhead: crate::time_manager::DEFAULT_MOVE_OVERHEAD,
        }
    }

    /// Returns the current position.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Clears the transposition table and every worker's heuristics.
    pub fn new_game(&mut self) {
        threadpool().wait_for_finish();
        unsafe {
            tt().clear(self.threads);
        }
        threadpool().clear_all();
        self.board = Board::start_pos();
    }

    /// Replaces the position from a FEN (or the start position) and a list
    /// of UCI moves. On any invalid input the previous position is
    /// retained and `false` is returned.
    pub fn set_position(&mut self, fen: Option<&str>, moves: &[&str]) -> bool {
        let mut board = match fen {
            None => Board::start_pos(),
            Some(f) => match Board::from_fen(f) {
                Ok(b) => b,
                Err(_) => return false,
            },
        };
        for mv_str in moves {
            match board.to_move(mv_str) {
                Some(m) => board.make_move(m),
                None => return false,
            }
        }
        self.board = board;
        true
    }

    /// Starts a search with the given limits. Returns immediately; the
    /// result arrives on stdout as `bestmove`.
    pub fn go(&mut self, mut limits: Limits) {
        limits.move_overhead = self.move_overhead;
        threadpool().start_thinking(&self.board, &limits);
    }

    /// Performs a blocking search and returns the best move found.
    pub fn search_sync(&mut self, mut limits: Limits) -> sable::Move {
        limits.move_overhead = self.move_overhead;
        threadpool().search(&self.board, &limits)
    }

    /// Stops the current search.
    pub fn stop(&mut self) {
        threadpool().set_stop(true);
    }

    /// Blocks until the current search has finished.
    pub fn wait(&mut self) {
        threadpool().wait_for_finish();
    }

    /// Runs a parallel perft on the current position, printing the count.
    pub fn perft(&self, depth: u16) {
        let nodes = perft_parallel(&self.board, depth);
        println!("perft {}: {}", depth, nodes);
    }

    /// Applies a `setoption` command. Unknown options are ignored; known
    /// options with bad values keep their previous setting.
    pub fn set_option(&mut self, name: &str, value: &str) {
        match name {
            "Hash" => {
                if let Ok(mb) = value.parse::<usize>() {
                    if (1..=65536).contains(&mb) {
                        threadpool().wait_for_finish();
                        let actual = unsafe { tt().resize(mb, self.threads) };
                        if self.use_stdout() {
                            println!("info string hash set to {} MB", actual);
                        }
                    }
                }
            }
            "Threads" => {
                if let Ok(n) = value.parse::<usize>() {
                    if (1..=MAX_THREADS).contains(&n) {
                        self.threads = n;
                        threadpool().set_thread_count(n);
                    }
                }
            }
            "Clear Hash" => {
                threadpool().wait_for_finish();
                unsafe {
                    tt().clear(self.threads);
                }
            }
            "Move Overhead" => {
                if let Ok(ms) = value.parse::<i64>() {
                    if (0..=10_000).contains(&ms) {
                        self.move_overhead = ms;
                    }
                }
            }
            _ => {}
        }
    }

    /// Prints the identification and option list of the `uci` handshake.
    pub fn print_uci(&self) {
        println!("id name Sable");
        println!("id author the sable authors");
        println!(
            "option name Hash type spin default {} min 1 max 65536",
            DEFAULT_TT_SIZE
        );
        println!(
            "option name Threads type spin default {} min 1 max {}",
            num_cpus::get().min(MAX_THREADS),
            MAX_THREADS
        );
        println!("option name Clear Hash type button");
        println!("option name Move Overhead type spin default 100 min 0 max 10000");
        println!("uciok");
    }

    fn use_stdout(&self) -> bool {
        USE_STDOUT.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}
