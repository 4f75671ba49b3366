//! Perft (performance test) functions: counting the leaf nodes of the
//! legal move tree to a fixed depth. Exact counts verify the move
//! generator, make/unmake, and the legality masks all at once.

use super::Board;

use rayon::prelude::*;

/// Returns the number of leaf nodes from a board at a given depth.
pub fn perft(board: &Board, depth: u16) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut board = board.shallow_clone();
    inner_perft(&mut board, depth)
}

/// Like [`perft`], but the work below each root move is distributed over
/// the rayon thread pool.
///
/// [`perft`]: fn.perft.html
pub fn perft_parallel(board: &Board, depth: u16) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = board.generate_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .vec()
        .par_iter()
        .map(|m| {
            let mut child = board.shallow_clone();
            child.make_move(*m);
            inner_perft(&mut child, depth - 1)
        })
        .sum()
}

/// Prints the perft node count of each root move, then returns the total.
/// A debugging aid for divide-and-conquer comparison against a reference.
pub fn perft_divide(board: &Board, depth: u16) -> u64 {
    let mut total = 0;
    let mut board = board.shallow_clone();
    for m in board.generate_moves().iter() {
        board.make_move(*m);
        let nodes = if depth <= 1 {
            1
        } else {
            inner_perft(&mut board, depth - 1)
        };
        board.unmake_move();
        println!("{}: {}", m, nodes);
        total += nodes;
    }
    println!("total: {}", total);
    total
}

fn inner_perft(board: &mut Board, depth: u16) -> u64 {
    let moves = board.generate_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut count: u64 = 0;
    for m in moves.iter() {
        board.make_move(*m);
        count += inner_perft(board, depth - 1);
        board.unmake_move();
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perft_startpos_shallow() {
        let board = Board::start_pos();
        assert_eq!(perft(&board, 1), 20);
        assert_eq!(perft(&board, 2), 400);
        assert_eq!(perft(&board, 3), 8_902);
        assert_eq!(perft(&board, 4), 197_281);
    }

    #[test]
    fn perft_kiwipete_shallow() {
        let board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        assert_eq!(perft(&board, 1), 48);
        assert_eq!(perft(&board, 2), 2_039);
        assert_eq!(perft(&board, 3), 97_862);
    }

    #[test]
    fn perft_parallel_agrees() {
        let board = Board::start_pos();
        assert_eq!(perft_parallel(&board, 4), perft(&board, 4));
    }
}
