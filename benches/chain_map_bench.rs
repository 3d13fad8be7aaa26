use arena_dict::{CStrKey, ChainMap, Dictionary, MapConfig};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

const N: usize = 20_000;

type Wide = ChainMap<'static, CStrKey, 1024>;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn config() -> MapConfig {
    MapConfig::dictionary(8).with_capacity(N)
}

fn filled_wide(seed: u64) -> (Wide, Vec<String>) {
    let mut m = Wide::new(config()).unwrap();
    let keys: Vec<String> = lcg(seed).take(N).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.set(k, &(i as u64).to_le_bytes()).unwrap();
    }
    (m, keys)
}

fn bench_insert_fresh(c: &mut Criterion) {
    c.bench_function("chain::insert_fresh_20k_b1024", |b| {
        b.iter_batched(
            || Wide::new(config()).unwrap(),
            |mut m| {
                for (i, x) in lcg(1).take(N).enumerate() {
                    let _ = m.set(key(x), &(i as u64).to_le_bytes());
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });

    // Default eight buckets: long chains, so this tracks the walk cost.
    c.bench_function("chain::insert_fresh_2k_b8", |b| {
        b.iter_batched(
            || Dictionary::new(MapConfig::dictionary(8).with_capacity(2_000)).unwrap(),
            |mut m| {
                for (i, x) in lcg(2).take(2_000).enumerate() {
                    let _ = m.set(key(x), &(i as u64).to_le_bytes());
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_remove_random(c: &mut Criterion) {
    c.bench_function("chain::remove_random_2k_of_20k", |b| {
        b.iter_batched(
            || {
                let (m, keys) = filled_wide(5);
                // Precompute 2k unique victims via LCG
                let mut sel = std::collections::HashSet::with_capacity(2_000);
                let mut s = 0x9e3779b97f4a7c15u64;
                while sel.len() < 2_000 {
                    s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                    sel.insert((s as usize) % keys.len());
                }
                let victims: Vec<String> = sel.into_iter().map(|i| keys[i].clone()).collect();
                (m, victims)
            },
            |(mut m, victims)| {
                for k in victims {
                    black_box(m.remove(&k));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("chain::get_hit_10k_on_20k", |b| {
        let (m, keys) = filled_wide(7);
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<String> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % keys.len()].clone()
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(m.get(k));
            }
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("chain::get_miss_10k_on_20k", |b| {
        let (m, _) = filled_wide(11);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next().unwrap());
                black_box(m.get(&k));
            }
        })
    });
}

fn bench_iterate(c: &mut Criterion) {
    c.bench_function("chain::iter_all_20k", |b| {
        let (m, _) = filled_wide(999);
        b.iter(|| {
            let mut sum = 0u64;
            for e in m.iter() {
                sum = sum.wrapping_add(e.value()[0] as u64);
            }
            black_box(sum)
        })
    });

    c.bench_function("chain::iterate_all_cursor_20k", |b| {
        let (m, _) = filled_wide(1001);
        b.iter(|| {
            let mut n = 0usize;
            let mut cursor = None;
            while let Some((_, next)) = m.iterate_all(cursor) {
                n += 1;
                cursor = Some(next);
            }
            black_box(n)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_fresh
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_remove_random,
              bench_get_hit,
              bench_get_miss,
              bench_iterate
}
criterion_main!(benches_insert, benches_ops);
