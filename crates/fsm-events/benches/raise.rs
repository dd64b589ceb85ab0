use std::cell::Cell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fsm_events::{Channel, Response, Selector};

fn bench_raise(c: &mut Criterion) {
    let hits = Rc::new(Cell::new(0u64));

    let broadcast = Channel::new("bench.broadcast");
    for _ in 0..32 {
        let hits = hits.clone();
        broadcast.subscribe(move || hits.set(hits.get() + 1));
    }
    c.bench_function("fsm-events/raise(subscribers=32)", |b| {
        b.iter(|| {
            broadcast.raise();
            black_box(hits.get());
        })
    });

    let shared = Channel::new("bench.selective");
    for owner in 0..256u64 {
        let hits = hits.clone();
        shared.subscribe_response(
            Some(Selector::new(owner)),
            Response::signal(move || hits.set(hits.get() + 1)),
        );
    }
    let mut owner = 0u64;
    c.bench_function("fsm-events/raise_for(owners=256)", |b| {
        b.iter(|| {
            shared.raise_for(Selector::new(owner));
            owner = (owner + 1) % 256;
            black_box(hits.get());
        })
    });
}

criterion_group!(benches, bench_raise);
criterion_main!(benches);
