use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};

use templatefs::storage::MemoryEntryStore;
use templatefs::tree::{build_tree, rename_entry, EffectiveConfig, Entry, Scope, TreeIndex};

/// Random template-like layout: up to 4 directory levels over a small alphabet of names.
fn gen_entries(n: usize, seed: u64) -> Vec<Entry> {
    let names = ["src", "lib", "cmd", "charts", "app", "internal", "docs", "api", "web", "deploy"];
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out: Vec<Entry> = names.iter().map(|d| Entry::dir(*d)).collect();
    let mut seen = std::collections::HashSet::new();
    while out.len() < n + names.len() {
        let depth = rng.gen_range(0..4);
        let mut segs: Vec<String> = (0..depth).map(|_| names[rng.gen_range(0..names.len())].to_string()).collect();
        segs.push(format!("f{}.txt", rng.gen::<u32>()));
        let path = segs.join("/");
        if seen.insert(path.clone()) {
            out.push(Entry::file(path, vec![b'x'; 64]));
        }
    }
    out
}

fn bench_tree(c: &mut Criterion) {
    let ns = [1_000usize, 10_000usize];
    let mut group = c.benchmark_group("tree");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(20);

    for &n in &ns {
        let entries = gen_entries(n, 0xBEEF_CAFE);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("build_tree", n.to_string()), &n, |b, _| {
            b.iter(|| criterion::black_box(build_tree(&entries)));
        });

        group.bench_with_input(BenchmarkId::new("index_new", n.to_string()), &n, |b, _| {
            b.iter(|| criterion::black_box(TreeIndex::new(entries.clone())));
        });

        // Cascade move of the largest top-level directory and back again
        let scope = Scope::new(1, 1);
        let store = MemoryEntryStore::with_entries(scope, entries.clone());
        let cfg = EffectiveConfig::default();
        group.bench_with_input(BenchmarkId::new("rename_cascade", n.to_string()), &n, |b, _| {
            b.iter(|| {
                rename_entry(&store, &scope, "src", "moved", None, &cfg).ok();
                rename_entry(&store, &scope, "moved", "src", None, &cfg).ok();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tree);
criterion_main!(benches);
