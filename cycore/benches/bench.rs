use criterion::{Criterion, black_box, criterion_group, criterion_main};

use cycore::cyformal::prelude::*;
use cycore::prelude::*;
use cycore::trace::{TraceEdge, TraceGraph, check_graph};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn v(name: &str) -> Proposition {
    Proposition::atom(name)
}

fn nat(arg: &str) -> Proposition {
    let body = Proposition::or(
        Proposition::apply("Zero", [v("n")]),
        Proposition::exists(
            ["y"],
            Proposition::and(
                Proposition::apply("Nat", [v("y")]),
                Proposition::apply("Succ", [v("n"), v("y")]),
            ),
        )
        .unwrap(),
    );
    Proposition::inductive("Nat", ["n"], body, [v(arg)]).unwrap()
}

fn successor_goal() -> Sequent {
    let successors = Proposition::forall(["a", "b"], Proposition::apply("Succ", [v("a"), v("b")])).unwrap();
    Sequent::new(successors, nat("x"))
}

/// A random tree of `size` nodes with back-edges from some leaves to their ancestors.
/// Seeded for determinism.
fn random_trace_graph(size: u32) -> TraceGraph {
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    let mut graph = TraceGraph::new();
    let mut parents = vec![None];
    graph.add_node(NodeId(0));

    for id in 1..size {
        let parent = rng.random_range(0..id);
        let mark = match rng.random_range(0..=3) {
            0 => EdgeMark::Step,
            1 => EdgeMark::Guard,
            2 => EdgeMark::Progress {
                fixpoint: Atom::new("N"),
            },
            _ => EdgeMark::Unguarded {
                fixpoint: Atom::new("S"),
            },
        };
        graph.add_edge(NodeId(parent), NodeId(id), TraceEdge::Tree(mark));
        parents.push(Some(parent));
    }

    for id in 1..size {
        if graph.neighbors(NodeId(id)).next().is_none() && rng.random_bool(0.3) {
            // walk up a random number of steps
            let mut target = id;
            for _ in 0..rng.random_range(1..8) {
                match parents[target as usize] {
                    Some(parent) => target = parent,
                    None => break,
                }
            }
            if target != id {
                graph.add_edge(NodeId(id), NodeId(target), TraceEdge::Back);
            }
        }
    }
    graph
}

fn bench_trace(c: &mut Criterion) {
    let graph = random_trace_graph(4096);
    c.bench_function("trace_check_random_4096", |b| {
        b.iter(|| {
            let _ = black_box(check_graph(&graph, &UnfoldProgress));
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let goal = successor_goal();
    let config = SearchConfig {
        max_depth: 8,
        max_workers: 1,
        timeout_ms: 60_000,
    };

    c.bench_function("search_successor_cycle", |b| {
        b.iter(|| {
            black_box(search(&goal, &config).unwrap());
        })
    });

    let derivation = match search(&goal, &config).unwrap() {
        SearchOutcome::Proof(derivation) => derivation,
        SearchOutcome::Exhausted(reason) => panic!("no proof found: {reason}"),
    };
    c.bench_function("verify_successor_cycle", |b| {
        b.iter(|| {
            black_box(verify(&goal, &derivation));
        })
    });
}

criterion_group!(benches, bench_trace, bench_search);
criterion_main!(benches);
