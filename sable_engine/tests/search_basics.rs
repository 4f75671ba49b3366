//! End-to-end engine tests: the pool must always return a legal move, a
//! positive node count, and must find forced mates.
//!
//! Everything that touches the global thread pool runs inside a single
//! test so the scenarios never race each other for it.

extern crate sable;
extern crate sable_engine;

use std::time::Instant;

use sable::core::score::MATE_BOUND;
use sable::Board;
use sable_engine::consts::init_globals;
use sable_engine::threadpool::{init_threadpool, threadpool};
use sable_engine::time_manager::Limits;

fn movetime_limits(ms: i64) -> Limits {
    let mut limits = Limits::blank();
    limits.movetime = Some(ms);
    limits.start = Instant::now();
    limits
}

fn depth_limits(d: u16) -> Limits {
    let mut limits = Limits::blank();
    limits.depth = Some(d);
    limits.start = Instant::now();
    limits
}

#[test]
fn engine_end_to_end() {
    std::thread::Builder::new()
        .stack_size(18_000 * 1000)
        .spawn(engine_end_to_end_body)
        .unwrap()
        .join()
        .unwrap();
}

fn engine_end_to_end_body() {
    init_globals();
    init_threadpool();
    threadpool().stdout(false);

    // One second on one thread from the start position: a legal move and
    // a positive node count.
    let board = Board::start_pos();
    let best = threadpool().search(&board, &movetime_limits(1000));
    assert!(board.generate_moves().contains(&best), "illegal: {}", best);
    assert!(threadpool().nodes() > 0);

    // Depth one always completes, no matter how short the budget.
    let best = threadpool().search(&board, &depth_limits(1));
    assert!(board.generate_moves().contains(&best));

    // A hanging mate in one must be scored as mate.
    let mating =
        Board::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 2 3")
            .unwrap();
    threadpool().search(&mating, &depth_limits(5));
    let score = threadpool().main().previous_score;
    assert!(score >= MATE_BOUND, "expected mate score, got {}", score);

    // Four threads on a sharp middlegame: still a legal move, never a
    // crash. Robustness, not determinism.
    threadpool().set_thread_count(4);
    let sharp =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let best = threadpool().search(&sharp, &movetime_limits(1000));
    assert!(sharp.generate_moves().contains(&best), "illegal: {}", best);

    threadpool().set_thread_count(1);
}

#[test]
fn checkmated_position_has_no_moves() {
    // The final position of the scholar's mate: the driver never calls
    // `go` here, it detects the finished game from the move list.
    let board =
        Board::from_fen("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4")
            .unwrap();
    assert!(board.in_check());
    assert!(board.generate_moves().is_empty());
}
