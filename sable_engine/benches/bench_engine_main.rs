use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion};

use sable::Board;
use sable_engine::consts::init_globals;
use sable_engine::threadpool::{init_threadpool, threadpool};
use sable_engine::time_manager::Limits;

fn bench_fixed_depth(c: &mut Criterion) {
    init_globals();
    init_threadpool();
    threadpool().stdout(false);

    let board = Board::start_pos();
    c.bench_function("search depth 6 startpos", |b| {
        b.iter(|| {
            let mut limits = Limits::blank();
            limits.depth = Some(6);
            limits.start = Instant::now();
            threadpool().search(&board, &limits)
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_fixed_depth
}
criterion_main!(benches);
