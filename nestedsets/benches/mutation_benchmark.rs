//! Mutation Benchmark

use criterion::{criterion_group, criterion_main, Criterion};
use nestedsets::{Forest, Position, Record, TreeSchema};
use storage::memory_store::MemoryStore;

const N_NODES: usize = 100;

fn category(name: String) -> Record {
    Record::new("categories").with("name", name)
}

fn make_forest() -> Forest<MemoryStore> {
    Forest::new(MemoryStore::new(), TreeSchema::new("categories"))
}

/// Benchmark function to append `N_NODES` children under a single root
pub fn wide_insertion_benchmark(c: &mut Criterion) {
    c.bench_function("wide insertion", |b| {
        b.iter(|| {
            let forest = make_forest();
            let root = forest
                .make_root(category(String::from("root")))
                .unwrap();
            for i in 0..N_NODES {
                forest.append_to(category(format!("n{}", i)), &root).unwrap();
            }
        })
    });
}

/// Benchmark function to build a chain `N_NODES` levels deep
pub fn deep_insertion_benchmark(c: &mut Criterion) {
    c.bench_function("deep insertion", |b| {
        b.iter(|| {
            let forest = make_forest();
            let mut parent = forest
                .make_root(category(String::from("root")))
                .unwrap();
            for i in 0..N_NODES {
                parent = forest.append_to(category(format!("n{}", i)), &parent).unwrap();
            }
        })
    });
}

/// Benchmark function to bounce a subtree between two parents
pub fn subtree_move_benchmark(c: &mut Criterion) {
    let forest = make_forest();
    let root = forest
        .make_root(category(String::from("root")))
        .unwrap();
    let left = forest.append_to(category(String::from("left")), &root).unwrap();
    let right = forest.append_to(category(String::from("right")), &root).unwrap();
    let mut mover = forest
        .append_to(category(String::from("mover")), &left)
        .unwrap();
    for i in 0..10 {
        forest
            .append_to(category(format!("m{}", i)), &mover)
            .unwrap();
    }

    c.bench_function("subtree move", |b| {
        b.iter(|| {
            mover = forest
                .place(mover.clone(), &right, Position::LastChild)
                .unwrap();
            mover = forest
                .place(mover.clone(), &left, Position::LastChild)
                .unwrap();
        })
    });
}

criterion_group!(
    benches,
    wide_insertion_benchmark,
    deep_insertion_benchmark,
    subtree_move_benchmark,
);
criterion_main!(benches);
