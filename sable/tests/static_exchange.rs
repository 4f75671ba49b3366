//! Static exchange evaluation sanity: the sign of a zero-threshold
//! exchange agrees with what careful counting says about the capture
//! sequence.

extern crate sable;

use sable::Board;

fn see_of(fen: &str, uci: &str, threshold: i32) -> bool {
    let board = Board::from_fen(fen).unwrap();
    let m = board.to_move(uci).expect("move must be legal");
    board.see_ge(m, threshold)
}

#[test]
fn free_capture_wins() {
    // A pawn takes an undefended pawn.
    assert!(see_of("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5", 0));
    // And clears a pawn's worth of threshold, but not a rook's.
    assert!(see_of("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5", 90));
    assert!(!see_of("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1", "e4d5", 450));
}

#[test]
fn defended_pawn_loses_the_queen() {
    // Queen takes a pawn defended by a pawn: loses queen for pawn.
    assert!(!see_of(
        "4k3/2p5/3p4/8/3Q4/8/8/4K3 w - - 0 1",
        "d4d6",
        0
    ));
}

#[test]
fn recapture_chain_balances() {
    // Rook takes rook; the defender declines the queen recapture, since
    // the white queen backs the exchange up. A clean rook of profit.
    let fen = "4k3/3q4/3r4/8/8/3R4/3Q4/4K3 w - - 0 1";
    assert!(see_of(fen, "d3d6", 0));
    assert!(see_of(fen, "d3d6", 450));
    assert!(!see_of(fen, "d3d6", 600));
}

#[test]
fn xray_attackers_join_in() {
    // Doubled rooks against a king-defended pawn: the king cannot
    // legally recapture into the second rook's fire, so the pawn falls.
    let fen = "8/3k4/3p4/8/8/3R4/3R4/3K4 w - - 0 1";
    assert!(see_of(fen, "d3d6", 0));
}

#[test]
fn quiet_move_into_attack_fails_threshold() {
    // A quiet rook move to a square guarded by a pawn loses the rook.
    let board = Board::from_fen("4k3/8/2p5/8/3R4/8/8/4K3 w - - 0 1").unwrap();
    let m = board.to_move("d4d5").unwrap();
    assert!(!board.see_ge(m, 0));
    // Staying home is safe.
    let safe = board.to_move("d4d1").unwrap();
    assert!(board.see_ge(safe, 0));
}
