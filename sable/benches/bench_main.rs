use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sable::board::perft::perft;
use sable::Board;

fn bench_movegen(c: &mut Criterion) {
    let board =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    c.bench_function("movegen kiwipete", |b| {
        b.iter(|| black_box(&board).generate_moves())
    });
}

fn bench_make_unmake(c: &mut Criterion) {
    let board = Board::start_pos();
    let moves = board.generate_moves();
    c.bench_function("make unmake startpos", |b| {
        b.iter(|| {
            let mut board = board.shallow_clone();
            for m in moves.iter() {
                board.make_move(*m);
                board.unmake_move();
            }
        })
    });
}

fn bench_perft(c: &mut Criterion) {
    let board = Board::start_pos();
    c.bench_function("perft 4 startpos", |b| {
        b.iter(|| perft(black_box(&board), 4))
    });
}

criterion_group!(benches, bench_movegen, bench_make_unmake, bench_perft);
criterion_main!(benches);
