//! Soundness of the mask-driven move generator: every emitted move
//! survives a full make (no self-checks), known positions produce their
//! known move counts, and the tricky special cases all behave.

extern crate sable;

use sable::board::fen::ALL_FENS;
use sable::{Board, GenType};

#[test]
fn no_generated_move_leaves_king_in_check() {
    for fen in ALL_FENS.iter() {
        let mut board = Board::from_fen(fen).unwrap();
        for m in board.generate_moves().iter() {
            board.make_move(*m);
            // is_okay asserts the mover's king is not attacked, among
            // other invariants.
            assert!(board.is_okay(), "{} broke {}", m, fen);
            board.unmake_move();
        }
    }
}

#[test]
fn known_move_counts() {
    let cases: [(&str, usize); 5] = [
        ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 20),
        ("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1", 48),
        ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 14),
        ("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1", 6),
        ("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8", 44),
    ];
    for (fen, expected) in cases {
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(board.generate_moves().len(), expected, "fen: {}", fen);
    }
}

#[test]
fn pinned_knight_cannot_move() {
    // The d7 knight is pinned against the black king by the d1 rook.
    let board = Board::from_fen("3k4/3n4/8/8/8/8/8/3RK3 b - - 0 1").unwrap();
    for m in board.generate_moves().iter() {
        assert_ne!(m.from(), sable::Square::D7, "pinned knight moved: {}", m);
    }
}

#[test]
fn pinned_slider_stays_on_the_ray() {
    // The e4 bishop is pinned on the e-file; it has no legal move since
    // its pin ray is a file and it moves diagonally.
    let board = Board::from_fen("4k3/8/4r3/8/4B3/8/8/4K3 w - - 0 1").unwrap();
    for m in board.generate_moves().iter() {
        assert_ne!(m.from(), sable::Square::E4, "cross-pinned bishop moved: {}", m);
    }

    // A rook pinned on a file may slide along it, and only along it.
    let board = Board::from_fen("4k3/8/4r3/8/4R3/8/8/4K3 w - - 0 1").unwrap();
    let rook_moves: Vec<_> = board
        .generate_moves()
        .iter()
        .filter(|m| m.from() == sable::Square::E4)
        .copied()
        .collect();
    assert!(!rook_moves.is_empty());
    for m in rook_moves {
        assert_eq!(m.to().file(), sable::File::E);
    }
}

#[test]
fn en_passant_discovered_check_is_vetoed() {
    // Capturing en passant would clear the fifth rank and expose the
    // white king to the h5 queen.
    let pinned = Board::from_fen("8/8/8/K1pP3q/8/8/8/7k w - c6 0 1").unwrap();
    for m in pinned.generate_moves().iter() {
        assert!(!m.is_en_passant(), "pinned en passant generated: {}", m);
    }

    // Without the rank-pinning piece, the capture exists.
    let free = Board::from_fen("8/8/8/K1pP4/8/8/8/7k w - c6 0 1").unwrap();
    assert!(free.generate_moves().iter().any(|m| m.is_en_passant()));
}

#[test]
fn castling_through_attack_is_vetoed() {
    // A black rook eyes f1: white may not castle king side, but queen
    // side stays legal.
    let board = Board::from_fen("r3k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1").unwrap();
    let castles: Vec<_> = board
        .generate_moves()
        .iter()
        .filter(|m| m.is_castle())
        .copied()
        .collect();
    assert_eq!(castles.len(), 1);
    assert_eq!(castles[0].to(), sable::Square::C1);
}

#[test]
fn castling_with_attacked_b_file_is_allowed() {
    // The queen-side B-file square may be attacked; the king never
    // crosses it.
    let board = Board::from_fen("4k3/8/8/8/8/8/1r6/R3K3 w Q - 0 1").unwrap();
    assert!(board.generate_moves().iter().any(|m| m.is_castle()));
}

#[test]
fn capture_generation_matches_filter() {
    for fen in ALL_FENS.iter() {
        let board = Board::from_fen(fen).unwrap();
        let all = board.generate_moves();
        let caps = board.generate_moves_of_type(GenType::Captures);

        let filtered: Vec<_> = all
            .iter()
            .filter(|m| board.is_capture(**m))
            .copied()
            .collect();
        assert_eq!(caps.len(), filtered.len(), "fen: {}", fen);
        for m in filtered {
            assert!(caps.contains(&m));
        }
    }
}
