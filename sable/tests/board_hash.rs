//! Zobrist key properties: incremental maintenance always matches a
//! from-scratch recomputation, and transpositions collide on purpose.

extern crate sable;

use sable::board::fen::ALL_FENS;
use sable::Board;

// `Board::is_okay` recomputes both keys from scratch and compares them to
// the incremental ones, among other structural checks.
#[test]
fn incremental_keys_match_recomputation() {
    for fen in ALL_FENS.iter() {
        let mut board = Board::from_fen(fen).unwrap();
        assert!(board.is_okay());

        // Walk a few plies down the first line available.
        for _ in 0..6 {
            let moves = board.generate_moves();
            match moves.iter().next() {
                Some(m) => board.make_move(*m),
                None => break,
            }
            assert!(board.is_okay(), "key diverged in {}", fen);
        }
    }
}

#[test]
fn transpositions_share_a_key() {
    // Knights out and back, via two different move orders.
    let mut a = Board::start_pos();
    for mv in ["g1f3", "g8f6", "b1c3", "b8c6"] {
        let m = a.to_move(mv).unwrap();
        a.make_move(m);
    }

    let mut b = Board::start_pos();
    for mv in ["b1c3", "b8c6", "g1f3", "g8f6"] {
        let m = b.to_move(mv).unwrap();
        b.make_move(m);
    }

    assert_eq!(a.key(), b.key());
    assert_eq!(a.fen(), b.fen());
}

#[test]
fn different_positions_have_different_keys() {
    let mut seen = std::collections::HashSet::new();
    for fen in ALL_FENS.iter() {
        let board = Board::from_fen(fen).unwrap();
        assert!(seen.insert(board.key()), "key collision for {}", fen);
    }
}

#[test]
fn ep_file_only_hashed_when_capturable() {
    // A double push with no adjacent enemy pawn leaves the key identical
    // to the same position reached without an en-passant right.
    let mut pushed = Board::start_pos();
    let m = pushed.to_move("e2e4").unwrap();
    pushed.make_move(m);

    let direct =
        Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
    assert_eq!(pushed.key(), direct.key());
}

#[test]
fn repetition_marker_detects_cycles() {
    let mut board = Board::start_pos();
    for mv in ["g1f3", "g8f6", "f3g1", "f6g8"] {
        let m = board.to_move(mv).unwrap();
        board.make_move(m);
    }
    // The start position has occurred again; a search one ply deep must
    // see the draw.
    assert!(board.is_draw(1));
}
