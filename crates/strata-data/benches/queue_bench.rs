use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::thread;
use strata_core::gfx::Rgba8;
use strata_data::queue::{RenderQueue, SortKey};

fn bench_queue(c: &mut Criterion) {
    let mut queue = RenderQueue::default();
    let capacity = queue.capacity() as i32;

    let mut group = c.benchmark_group("RenderQueue");

    group.bench_function("Single producer (full frame)", |b| {
        b.iter(|| {
            queue.begin_frame();
            for i in 0..capacity {
                let _ = queue.put_pixel(i, i, Rgba8::WHITE, SortKey::new(0, 0, 0));
            }
            black_box(queue.size());
        });
    });

    group.bench_function("4 producers (full frame)", |b| {
        b.iter(|| {
            queue.begin_frame();
            let shared = &queue;
            thread::scope(|s| {
                for p in 0..4 {
                    s.spawn(move || {
                        for i in 0..capacity / 4 {
                            let _ = shared.fill_rect(i, p, 2, 2, Rgba8::RED, SortKey::new(1, p as u16, 0));
                        }
                    });
                }
            });
            black_box(queue.size());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_queue);
criterion_main!(benches);
