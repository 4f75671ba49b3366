//! Exact perft leaf counts. These verify the move generator, make/unmake
//! and the legality masks all at once: one missing or extra move anywhere
//! in the tree changes the totals.

extern crate sable;

use sable::board::perft::{perft, perft_parallel};
use sable::Board;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const POS_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const POS_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
const POS_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

#[test]
fn perft_startpos() {
    let board = Board::start_pos();
    assert_eq!(perft(&board, 1), 20);
    assert_eq!(perft(&board, 2), 400);
    assert_eq!(perft(&board, 3), 8_902);
    assert_eq!(perft(&board, 4), 197_281);
    assert_eq!(perft(&board, 5), 4_865_609);
}

#[test]
#[ignore] // long: over a hundred million leaves
fn perft_startpos_deep() {
    let board = Board::start_pos();
    assert_eq!(perft_parallel(&board, 6), 119_060_324);
}

#[test]
fn perft_kiwipete() {
    let board = Board::from_fen(KIWIPETE).unwrap();
    assert_eq!(perft(&board, 1), 48);
    assert_eq!(perft(&board, 2), 2_039);
    assert_eq!(perft(&board, 3), 97_862);
    assert_eq!(perft(&board, 4), 4_085_603);
}

#[test]
#[ignore] // long: over a hundred million leaves
fn perft_kiwipete_deep() {
    let board = Board::from_fen(KIWIPETE).unwrap();
    assert_eq!(perft_parallel(&board, 5), 193_690_690);
}

#[test]
fn perft_position_three() {
    let board = Board::from_fen(POS_3).unwrap();
    assert_eq!(perft(&board, 4), 43_238);
    assert_eq!(perft(&board, 5), 674_624);
    assert_eq!(perft_parallel(&board, 6), 11_030_083);
}

#[test]
fn perft_position_four() {
    let board = Board::from_fen(POS_4).unwrap();
    assert_eq!(perft(&board, 3), 9_467);
    assert_eq!(perft(&board, 4), 422_333);
    assert_eq!(perft_parallel(&board, 5), 15_833_292);
}

#[test]
fn perft_position_five() {
    let board = Board::from_fen(POS_5).unwrap();
    assert_eq!(perft(&board, 3), 62_379);
    assert_eq!(perft(&board, 4), 2_103_487);
}

#[test]
#[ignore] // long: nearly a hundred million leaves
fn perft_position_five_deep() {
    let board = Board::from_fen(POS_5).unwrap();
    assert_eq!(perft_parallel(&board, 5), 89_941_194);
}
