//! Make/unmake round trips: unmaking a move must restore the board
//! bit-for-bit, including both hash keys, the incremental scores and all
//! bitboards.

extern crate sable;

use sable::board::fen::ALL_FENS;
use sable::Board;

#[test]
fn make_unmake_round_trip() {
    for fen in ALL_FENS.iter() {
        let mut board = Board::from_fen(fen).unwrap();
        let before_fen = board.fen();
        let before_key = board.key();
        let before_pawn_key = board.pawn_key();
        let before_psq = board.psq();
        let before_phase = board.game_phase();

        for m in board.generate_moves().iter() {
            board.make_move(*m);
            assert!(board.is_okay(), "broken after {} in {}", m, fen);
            board.unmake_move();

            assert_eq!(board.fen(), before_fen, "fen changed by {} in {}", m, fen);
            assert_eq!(board.key(), before_key, "key changed by {} in {}", m, fen);
            assert_eq!(
                board.pawn_key(),
                before_pawn_key,
                "pawn key changed by {} in {}",
                m,
                fen
            );
            assert_eq!(board.psq(), before_psq);
            assert_eq!(board.game_phase(), before_phase);
        }
    }
}

#[test]
fn make_unmake_two_deep() {
    let mut board =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let reference = board.shallow_clone();

    let first_moves = board.generate_moves();
    for m1 in first_moves.iter() {
        board.make_move(*m1);
        let second_moves = board.generate_moves();
        for m2 in second_moves.iter() {
            board.make_move(*m2);
            board.unmake_move();
        }
        board.unmake_move();
        assert!(board == reference, "diverged after unwinding {}", m1);
    }
}

#[test]
fn null_move_round_trip() {
    let mut board = Board::start_pos();
    let fen = board.fen();
    let key = board.key();

    board.make_null_move();
    assert_ne!(board.key(), key);
    assert_ne!(board.turn(), Board::start_pos().turn());
    board.unmake_null_move();

    assert_eq!(board.fen(), fen);
    assert_eq!(board.key(), key);
}

#[test]
fn uci_move_round_trip() {
    for fen in ALL_FENS.iter() {
        let board = Board::from_fen(fen).unwrap();
        for m in board.generate_moves().iter() {
            let s = m.stringify();
            let back = board.to_move(&s);
            assert_eq!(back, Some(*m), "uci round trip failed for {} in {}", s, fen);
        }
    }
}
