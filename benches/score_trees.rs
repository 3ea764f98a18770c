use criterion::{criterion_group, criterion_main, Criterion};
use tree_duo_matching::tree::{LabeledTree, TreeBuilder};
use tree_duo_matching::{similarity_approx, similarity_exact};

const LABELS: [&str; 4] = ["a", "b", "c", "d"];

/// Complete binary tree with labels assigned cyclically, shifted by `offset`.
fn binary_tree(depth: u32, offset: usize) -> LabeledTree<&'static str> {
    let n = (1usize << (depth + 1)) - 1;
    let mut builder = TreeBuilder::new();
    for v in 0..n {
        builder.add_node(v, LABELS[(v + offset) % LABELS.len()]).unwrap();
    }
    for v in 1..n {
        builder.add_edge((v - 1) / 2, v);
    }
    builder.build().unwrap()
}

fn bench_approx_identical(c: &mut Criterion) {
    let a = binary_tree(6, 0);
    let b = binary_tree(6, 0);
    c.bench_function("similarity_approx/binary_127/identical", move |bencher| {
        bencher.iter(|| similarity_approx(&a, &b))
    });
}

fn bench_approx_shifted(c: &mut Criterion) {
    let a = binary_tree(6, 0);
    let b = binary_tree(6, 1);
    c.bench_function("similarity_approx/binary_127/shifted", move |bencher| {
        bencher.iter(|| similarity_approx(&a, &b))
    });
}

fn bench_exact_small(c: &mut Criterion) {
    let a = binary_tree(3, 0);
    let b = binary_tree(3, 0);
    c.bench_function("similarity_exact/binary_15/identical", move |bencher| {
        bencher.iter(|| {
            let (score, timed_out) = similarity_exact(&a, &b, None);
            assert!(!timed_out);
            assert_eq!(14, score);
        })
    });
}

criterion_group!(
    benches,
    bench_approx_identical,
    bench_approx_shifted,
    bench_exact_small
);
criterion_main!(benches);
