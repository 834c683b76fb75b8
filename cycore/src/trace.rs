//! Global trace condition.
//!
//! A cyclic derivation is sound only if every cycle of its graph passes through at least one
//! progressing edge. The checker builds the graph of tree edges and back-edges, decomposes it
//! into strongly connected components and, inside each non-trivial component, looks for a
//! cycle made of stationary edges only. Such a cycle is returned as the witness of failure.
//!
//! Which edges progress is decided by a [`ProgressPolicy`]; [`UnfoldProgress`] is the policy
//! of the rule engine's edge marks.
use std::collections::{BTreeSet, HashMap};

use log::{debug, trace};
use petgraph::{algo::tarjan_scc, prelude::DiGraphMap};
use smallvec::SmallVec;

use crate::{
    derivation::{Derivation, DerivationNode, NodeId},
    rules::EdgeMark,
    utils::error::{CyError, CyResult},
};

/// Classification of edge marks.
pub trait ProgressPolicy {
    /// Whether a tree edge carrying `mark` progresses.
    fn progresses(&self, mark: &EdgeMark) -> bool;

    /// Whether a back-edge progresses. Back-edges only identify two sequents.
    fn back_edge_progresses(&self) -> bool {
        false
    }
}

/// Least-fixpoint unfolds and guarded greatest-fixpoint unfolds progress; instantiations,
/// connective steps and unguarded unfolds are stationary.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnfoldProgress;

impl ProgressPolicy for UnfoldProgress {
    fn progresses(&self, mark: &EdgeMark) -> bool {
        matches!(mark, EdgeMark::Progress { .. } | EdgeMark::Guarded { .. })
    }
}

/// Edge of the trace graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEdge {
    Tree(EdgeMark),
    Back,
}

impl TraceEdge {
    fn progresses<P: ProgressPolicy + ?Sized>(&self, policy: &P) -> bool {
        match self {
            TraceEdge::Tree(mark) => policy.progresses(mark),
            TraceEdge::Back => policy.back_edge_progresses(),
        }
    }
}

pub type TraceGraph = DiGraphMap<NodeId, TraceEdge>;

/// Summary of a successful check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceReport {
    /// Strongly connected components of the trace graph.
    pub components: usize,
    /// Components containing at least one cycle.
    pub cyclic_components: usize,
    pub back_edges: usize,
}

/// Graph of tree edges and back-edges over `nodes`. Open nodes contribute a vertex only.
pub fn trace_graph<'a, I>(nodes: I) -> TraceGraph
where
    I: IntoIterator<Item = &'a DerivationNode>,
{
    let mut graph = TraceGraph::new();
    for node in nodes {
        graph.add_node(node.id);
        if let Some(mark) = node.mark() {
            for child in node.children() {
                graph.add_edge(node.id, *child, TraceEdge::Tree(mark.clone()));
            }
        }
        if let Some(ancestor) = node.back_edge() {
            graph.add_edge(node.id, ancestor, TraceEdge::Back);
        }
    }
    graph
}

enum Visit {
    Descend(NodeId),
    Cycle(usize),
    Finish,
}

/// A cycle of `members` using only stationary edges, in traversal order.
fn stationary_cycle<P: ProgressPolicy + ?Sized>(
    graph: &TraceGraph,
    members: &BTreeSet<NodeId>,
    policy: &P,
) -> Option<Vec<NodeId>> {
    let successors = |node: NodeId| -> SmallVec<[NodeId; 4]> {
        graph
            .edges(node)
            .filter(|(_, target, edge)| members.contains(target) && !edge.progresses(policy))
            .map(|(_, target, _)| target)
            .collect()
    };

    // `true` while on the DFS stack, `false` once finished.
    let mut on_stack: HashMap<NodeId, bool> = HashMap::new();
    for &start in members {
        if on_stack.contains_key(&start) {
            continue;
        }

        let mut stack: Vec<(NodeId, SmallVec<[NodeId; 4]>, usize)> = vec![(start, successors(start), 0)];
        on_stack.insert(start, true);

        while !stack.is_empty() {
            let visit = match stack.last_mut() {
                Some((_, succ, cursor)) if *cursor < succ.len() => {
                    let next = succ[*cursor];
                    *cursor += 1;
                    match on_stack.get(&next) {
                        Some(true) => stack
                            .iter()
                            .position(|(n, _, _)| *n == next)
                            .map_or(Visit::Finish, Visit::Cycle),
                        Some(false) => continue,
                        None => Visit::Descend(next),
                    }
                }
                _ => Visit::Finish,
            };

            match visit {
                Visit::Descend(next) => {
                    on_stack.insert(next, true);
                    stack.push((next, successors(next), 0));
                }
                Visit::Cycle(position) => {
                    return Some(stack[position..].iter().map(|(n, _, _)| *n).collect());
                }
                Visit::Finish => {
                    if let Some((node, _, _)) = stack.pop() {
                        on_stack.insert(node, false);
                    }
                }
            }
        }
    }
    None
}

/// Check the trace condition on a graph under `policy`.
pub fn check_graph<P: ProgressPolicy + ?Sized>(graph: &TraceGraph, policy: &P) -> CyResult<TraceReport> {
    let back_edges = graph
        .all_edges()
        .filter(|(_, _, edge)| matches!(edge, TraceEdge::Back))
        .count();
    let mut report = TraceReport {
        back_edges,
        ..TraceReport::default()
    };

    for component in tarjan_scc(graph) {
        report.components += 1;
        let cyclic = component.len() > 1 || component.iter().any(|n| graph.contains_edge(*n, *n));
        if !cyclic {
            continue;
        }
        report.cyclic_components += 1;

        let members: BTreeSet<NodeId> = component.into_iter().collect();
        trace!("Checking cyclic component of {} node(s)", members.len());
        if let Some(cycle) = stationary_cycle(graph, &members, policy) {
            debug!("Stationary cycle found: {cycle:?}");
            return Err(CyError::TraceConditionFailed { cycle });
        }
    }

    Ok(report)
}

/// Check the trace condition of `derivation` under `policy`.
pub fn check_trace<P: ProgressPolicy + ?Sized>(derivation: &Derivation, policy: &P) -> CyResult<TraceReport> {
    check_graph(&trace_graph(derivation.nodes()), policy)
}

/// Check the trace condition of `derivation` under [`UnfoldProgress`].
pub fn check(derivation: &Derivation) -> CyResult<TraceReport> {
    check_trace(derivation, &UnfoldProgress)
}

#[cfg(test)]
mod tests {
    use cyformal::atom::Atom;

    use super::*;

    fn n(id: u32) -> NodeId {
        NodeId(id)
    }

    fn unfold(name: &str) -> TraceEdge {
        TraceEdge::Tree(EdgeMark::Unguarded {
            fixpoint: Atom::new(name),
        })
    }

    #[test]
    fn acyclic_graphs_are_accepted() {
        let mut graph = TraceGraph::new();
        graph.add_edge(n(0), n(1), TraceEdge::Tree(EdgeMark::Guard));
        graph.add_edge(n(0), n(2), TraceEdge::Tree(EdgeMark::Guard));
        let report = check_graph(&graph, &UnfoldProgress).unwrap();
        assert_eq!(report.components, 3);
        assert_eq!(report.cyclic_components, 0);
        assert_eq!(report.back_edges, 0);
    }

    #[test]
    fn stationary_two_node_cycle_is_rejected() {
        let mut graph = TraceGraph::new();
        graph.add_edge(n(0), n(1), unfold("S"));
        graph.add_edge(n(1), n(0), TraceEdge::Back);
        match check_graph(&graph, &UnfoldProgress) {
            Err(CyError::TraceConditionFailed { cycle }) => assert_eq!(cycle, vec![n(0), n(1)]),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn one_progressing_edge_is_enough() {
        let mut graph = TraceGraph::new();
        graph.add_edge(n(0), n(1), TraceEdge::Tree(EdgeMark::Progress { fixpoint: Atom::new("N") }));
        graph.add_edge(n(1), n(2), TraceEdge::Tree(EdgeMark::Step));
        graph.add_edge(n(2), n(0), TraceEdge::Back);
        let report = check_graph(&graph, &UnfoldProgress).unwrap();
        assert_eq!(report.cyclic_components, 1);
        assert_eq!(report.back_edges, 1);
    }

    #[test]
    fn nested_cycles_need_progress_on_every_cycle() {
        // 0 -P-> 1 -G-> 2 -> back to 0, and 2 -> back to 1 which skips the progress edge.
        let mut graph = TraceGraph::new();
        graph.add_edge(n(0), n(1), TraceEdge::Tree(EdgeMark::Progress { fixpoint: Atom::new("N") }));
        graph.add_edge(n(1), n(2), TraceEdge::Tree(EdgeMark::Guard));
        graph.add_edge(n(1), n(3), TraceEdge::Tree(EdgeMark::Guard));
        graph.add_edge(n(2), n(0), TraceEdge::Back);
        graph.add_edge(n(3), n(1), TraceEdge::Back);
        match check_graph(&graph, &UnfoldProgress) {
            Err(CyError::TraceConditionFailed { cycle }) => {
                assert_eq!(cycle, vec![n(1), n(3)]);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    struct Everything;

    impl ProgressPolicy for Everything {
        fn progresses(&self, _mark: &EdgeMark) -> bool {
            true
        }
    }

    #[test]
    fn policies_are_pluggable() {
        let mut graph = TraceGraph::new();
        graph.add_edge(n(0), n(1), unfold("S"));
        graph.add_edge(n(1), n(0), TraceEdge::Back);
        assert!(check_graph(&graph, &Everything).is_ok());
    }
}
