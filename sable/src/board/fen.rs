//! FEN constants and post-parse validation of a [`Board`].
//!
//! [`Board`]: ../struct.Board.html

use super::{Board, FenBuildError};
use crate::core::{PieceType, Player};

/// FEN string of the standard chess starting position.
pub const START_POS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A collection of FEN strings of assorted positions, useful for testing.
pub static ALL_FENS: [&str; 10] = [
    START_POS,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
    "2r3k1/R7/8/1R6/8/8/P4KPP/8 w - - 0 40",
    "8/8/8/8/8/4k3/4p3/4K3 w - - 0 1",
    "5k2/8/8/8/8/8/4R3/4K2R w K - 0 1",
];

/// Validates that a freshly parsed board describes a playable chess
/// position, rejecting it otherwise.
pub fn validate(board: Board) -> Result<Board, FenBuildError> {
    for player in [Player::White, Player::Black] {
        let kings = board.count_piece(player, PieceType::King);
        if kings != 1 {
            return Err(FenBuildError::WrongKingCount { player, num: kings });
        }
    }

    // The side not to move must not be left in check.
    let them = !board.turn();
    let their_king = board.king_sq(them);
    if (board.attackers_to(their_king, board.occupied())
        & board.occupied_player(board.turn()))
    .is_not_empty()
    {
        return Err(FenBuildError::OppositeCheck);
    }

    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_fens_round_trip() {
        for fen in ALL_FENS.iter() {
            let board = Board::from_fen(fen).unwrap();
            assert_eq!(&board.fen(), fen, "fen round trip failed");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(Board::from_fen("not a fen").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8 w KQkq - 0 1").is_err());
        // Two white kings.
        assert!(Board::from_fen("4k3/8/8/8/8/8/8/KK6 w - - 0 1").is_err());
        // The side not to move is in check.
        assert!(Board::from_fen("4k3/4R3/8/8/8/8/8/4K3 b - - 0 1").is_ok());
        assert!(Board::from_fen("4k3/4R3/8/8/8/8/8/4K3 w - - 0 1").is_err());
    }

    #[test]
    fn ep_square_only_when_capturable() {
        use crate::core::sq::NO_SQ;

        // The en-passant square in the FEN has no capturer; the board
        // drops it so the Zobrist key stays canonical.
        let board =
            Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!(board.ep_square(), NO_SQ);

        // Here the black d-pawn stands beside c4, so the square stays.
        let with_capturer =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/8/2Pp4/8/PP1PPPPP/RNBQKBNR b KQkq c3 0 2")
                .unwrap();
        assert!(with_capturer.ep_square().is_okay());
    }
}
