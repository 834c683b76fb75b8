//! Derivation graphs.
//!
//! A derivation is a tree of [`DerivationNode`]s stored in an arena keyed by [`NodeId`], plus
//! back-edges: a leaf may be closed by pointing at one of its strict ancestors whose sequent,
//! under a substitution, is the leaf's sequent. Back-edges are plain id references, so the
//! graph may be cyclic while the arena stays a flat map.
//!
//! ## Core types
//! * [`DerivationBuilder`] – incremental construction with checkpoint / rollback.
//! * [`Derivation`] – the finished (or deserialized) graph handed to the checker.
//! * [`TraceSegment`] – the tree path closed into a cycle by one back-edge.
//! * [`DerivationRecord`] – the flat serialization form.
use std::{collections::BTreeMap, fmt};

use cyformal::{sequent::Sequent, subst::Substitution};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::EnumIs;

use crate::{
    rules::{EdgeMark, Rule},
    trace::{ProgressPolicy, UnfoldProgress},
    utils::error::{CyError, CyResult},
};

pub mod arena;
pub mod builder;
pub mod record;

pub use arena::{IdRange, NodeArena};
pub use builder::{Checkpoint, DerivationBuilder};
pub use record::{DerivationRecord, NodeRecord, RecordStep};

/// Index of a node in a derivation arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a node is justified.
#[derive(Debug, Clone, PartialEq, Eq, EnumIs)]
pub enum NodeStatus {
    Open,
    ClosedAxiom,
    ClosedBackEdge {
        ancestor: NodeId,
        /// Sends the ancestor's sequent onto this node's sequent.
        substitution: Substitution,
    },
    ClosedByRule {
        rule: Rule,
        children: SmallVec<[NodeId; 2]>,
        /// Mark of every edge towards `children`.
        mark: EdgeMark,
    },
}

#[derive(Debug, Clone)]
pub struct DerivationNode {
    pub id: NodeId,
    pub sequent: Sequent,
    pub status: NodeStatus,
    /// Tree parent; `None` only for the root.
    pub parent: Option<NodeId>,
    /// Mark of the tree edge from the parent.
    pub incoming: Option<EdgeMark>,
}

impl DerivationNode {
    pub fn children(&self) -> &[NodeId] {
        match &self.status {
            NodeStatus::ClosedByRule { children, .. } => children,
            _ => &[],
        }
    }

    /// Mark of the outgoing tree edges, for nodes closed by a rule.
    pub fn mark(&self) -> Option<&EdgeMark> {
        match &self.status {
            NodeStatus::ClosedByRule { mark, .. } => Some(mark),
            _ => None,
        }
    }

    /// Target of the back-edge, for nodes closed by one.
    pub fn back_edge(&self) -> Option<NodeId> {
        match &self.status {
            NodeStatus::ClosedBackEdge { ancestor, .. } => Some(*ancestor),
            _ => None,
        }
    }
}

/// The tree path `ancestor → … → bud` that a back-edge from `bud` closes into a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSegment {
    pub ancestor: NodeId,
    pub bud: NodeId,
    /// Nodes from the ancestor down to the bud, both included.
    pub path: Vec<NodeId>,
    /// Mark of every tree edge of `path`, in order.
    pub marks: Vec<EdgeMark>,
    /// Whether one of `marks` progresses under [`UnfoldProgress`].
    pub progressing: bool,
}

pub(crate) type NodeMap = BTreeMap<NodeId, DerivationNode>;

pub(crate) fn lookup(nodes: &NodeMap, id: NodeId) -> CyResult<&DerivationNode> {
    nodes.get(&id).ok_or(CyError::UnknownNode(id))
}

fn back_edge_mismatch(node: NodeId, ancestor: NodeId, reason: impl Into<String>) -> CyError {
    CyError::BackEdgeMismatch {
        node,
        ancestor,
        reason: reason.into(),
    }
}

/// Validate the back-edge `bud → ancestor` under `sigma` and compute the segment it closes.
///
/// The ancestor must be a strict ancestor of the bud, `sigma` must send the ancestor's
/// sequent onto the bud's, and a guarded greatest-fixpoint unfold at the ancestor must be
/// re-entered through a guard.
pub(crate) fn back_edge_segment(
    nodes: &NodeMap,
    bud: NodeId,
    ancestor: NodeId,
    sigma: &Substitution,
) -> CyResult<TraceSegment> {
    let bud_node = lookup(nodes, bud)?;
    let ancestor_node = lookup(nodes, ancestor)?;

    let mut path = vec![bud];
    let mut cursor = bud_node.parent;
    loop {
        match cursor {
            Some(id) if path.len() <= nodes.len() => {
                path.push(id);
                if id == ancestor {
                    break;
                }
                cursor = lookup(nodes, id)?.parent;
            }
            _ => return Err(back_edge_mismatch(bud, ancestor, "the target is not a strict ancestor")),
        }
    }
    path.reverse();

    let expected = ancestor_node.sequent.substitute(sigma)?;
    if expected != bud_node.sequent {
        return Err(back_edge_mismatch(
            bud,
            ancestor,
            format!(
                "the substitution {sigma} sends `{}` to `{expected}`, not to `{}`",
                ancestor_node.sequent, bud_node.sequent
            ),
        ));
    }

    let marks = path[1..]
        .iter()
        .map(|id| {
            lookup(nodes, *id)?
                .incoming
                .clone()
                .ok_or_else(|| CyError::MalformedRecord(format!("node {id} has no incoming edge")))
        })
        .collect::<CyResult<Vec<_>>>()?;

    if marks.first().is_some_and(EdgeMark::is_guarded) && !bud_node.incoming.as_ref().is_some_and(EdgeMark::is_guard) {
        return Err(back_edge_mismatch(
            bud,
            ancestor,
            "the guarded unfold at the target would be re-entered without a guard",
        ));
    }

    let progressing = marks.iter().any(|m| UnfoldProgress.progresses(m));
    Ok(TraceSegment {
        ancestor,
        bud,
        path,
        marks,
        progressing,
    })
}

/// A derivation graph rooted at a single goal.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub(crate) nodes: NodeMap,
    pub(crate) root: NodeId,
    pub(crate) segments: Vec<TraceSegment>,
}

impl Derivation {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The sequent this derivation proves.
    pub fn conclusion(&self) -> CyResult<&Sequent> {
        self.node(self.root).map(|n| &n.sequent)
    }

    pub fn node(&self, id: NodeId) -> CyResult<&DerivationNode> {
        lookup(&self.nodes, id)
    }

    /// Nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &DerivationNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn open_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.status.is_open())
            .map(|n| n.id)
            .collect()
    }

    /// Whether no node is open.
    pub fn is_complete(&self) -> bool {
        self.nodes.values().all(|n| !n.status.is_open())
    }

    /// Every back-edge as `(bud, ancestor)`.
    pub fn back_edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes
            .values()
            .filter_map(|n| n.back_edge().map(|ancestor| (n.id, ancestor)))
    }

    /// Segments closed by the back-edges, in the order they were closed.
    pub fn segments(&self) -> &[TraceSegment] {
        &self.segments
    }

    /// Node identifiers reachable from the root through tree edges, breadth first.
    pub fn breadth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if !self.nodes.contains_key(&self.root) {
            return order;
        }
        order.push(self.root);
        let mut cursor = 0;
        while cursor < order.len() {
            if let Some(node) = self.nodes.get(&order[cursor]) {
                order.extend(node.children().iter().copied());
            }
            cursor += 1;
        }
        order
    }
}
