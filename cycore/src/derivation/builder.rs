use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use cyformal::{sequent::Sequent, subst::Substitution};
use log::{debug, trace};
use smallvec::SmallVec;

use super::{
    Derivation, DerivationNode, NodeId, NodeMap, NodeStatus, TraceSegment, arena::IdRange,
    arena::NodeArena, back_edge_segment, lookup,
};
use crate::{
    rules::{self, EdgeMark, Rule, is_axiom},
    utils::error::{CyError, CyResult},
};

#[derive(Debug, Clone)]
enum JournalEntry {
    Created(NodeId),
    Closed(NodeId),
}

/// Position in the builder's journal, see [`DerivationBuilder::rollback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    journal: usize,
    segments: usize,
}

/// Incremental construction of a [`Derivation`].
///
/// Every mutation is journaled so that search can undo a failed branch with
/// [`DerivationBuilder::rollback`]. Node ids come from a shared [`NodeArena`]; builders forked
/// with [`DerivationBuilder::fork`] share the arena and never hand out the same id twice.
#[derive(Debug, Clone)]
pub struct DerivationBuilder {
    arena: Arc<NodeArena>,
    ids: IdRange,
    nodes: NodeMap,
    root: Option<NodeId>,
    open: BTreeSet<NodeId>,
    segments: Vec<TraceSegment>,
    journal: Vec<JournalEntry>,
}

impl Default for DerivationBuilder {
    fn default() -> Self {
        Self::with_arena(Arc::new(NodeArena::new()))
    }
}

impl DerivationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder drawing its node ids from `arena`.
    pub fn with_arena(arena: Arc<NodeArena>) -> Self {
        Self {
            arena,
            ids: IdRange::default(),
            nodes: BTreeMap::new(),
            root: None,
            open: BTreeSet::new(),
            segments: Vec::new(),
            journal: Vec::new(),
        }
    }

    /// A copy of the current derivation that allocates from its own id range of the shared
    /// arena. The copy starts with an empty journal.
    pub fn fork(&self) -> Self {
        Self {
            arena: Arc::clone(&self.arena),
            ids: IdRange::default(),
            nodes: self.nodes.clone(),
            root: self.root,
            open: self.open.clone(),
            segments: self.segments.clone(),
            journal: Vec::new(),
        }
    }

    fn next_id(&mut self) -> CyResult<NodeId> {
        if let Some(id) = self.ids.next_id() {
            return Ok(id);
        }
        self.ids = self.arena.reserve()?;
        self.ids.next_id().ok_or(CyError::IdSpaceExhausted)
    }

    fn create(
        &mut self,
        sequent: Sequent,
        parent: Option<NodeId>,
        incoming: Option<EdgeMark>,
    ) -> CyResult<NodeId> {
        let id = self.next_id()?;
        self.nodes.insert(
            id,
            DerivationNode {
                id,
                sequent,
                status: NodeStatus::Open,
                parent,
                incoming,
            },
        );
        self.open.insert(id);
        self.journal.push(JournalEntry::Created(id));
        Ok(id)
    }

    fn open_node(&self, id: NodeId) -> CyResult<&DerivationNode> {
        let node = lookup(&self.nodes, id)?;
        if !self.open.contains(&id) {
            return Err(CyError::NodeAlreadyClosed(id));
        }
        Ok(node)
    }

    fn close(&mut self, id: NodeId, status: NodeStatus) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.status = status;
            self.open.remove(&id);
            self.journal.push(JournalEntry::Closed(id));
        }
    }

    /// Start a new derivation of `sequent`, discarding anything built so far.
    pub fn open_goal(&mut self, sequent: Sequent) -> CyResult<NodeId> {
        self.nodes.clear();
        self.open.clear();
        self.segments.clear();
        debug!("Opening goal {sequent}");
        let root = self.create(sequent, None, None)?;
        self.journal.clear();
        self.root = Some(root);
        Ok(root)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> CyResult<&DerivationNode> {
        lookup(&self.nodes, id)
    }

    pub fn sequent(&self, id: NodeId) -> CyResult<&Sequent> {
        self.node(id).map(|n| &n.sequent)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DerivationNode> {
        self.nodes.values()
    }

    /// Open nodes in identifier order.
    pub fn open_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.open.iter().copied()
    }

    pub fn is_complete(&self) -> bool {
        self.root.is_some() && self.open.is_empty()
    }

    pub fn segments(&self) -> &[TraceSegment] {
        &self.segments
    }

    /// Apply `rule` to the open node `node`, creating one open child per premise.
    pub fn apply_rule(&mut self, node: NodeId, rule: Rule) -> CyResult<SmallVec<[NodeId; 2]>> {
        let current = self.open_node(node)?;
        let application = rules::apply(&rule, &current.sequent, current.incoming.as_ref())?;
        trace!(
            "Applied {} to {node}: {} premise(s), mark {:?}",
            rule.kind(),
            application.children.len(),
            application.mark
        );

        let mut children = SmallVec::new();
        for child in application.children {
            children.push(self.create(child, Some(node), Some(application.mark.clone()))?);
        }
        self.close(
            node,
            NodeStatus::ClosedByRule {
                rule,
                children: children.clone(),
                mark: application.mark,
            },
        );
        Ok(children)
    }

    /// Close `node` as an axiom.
    pub fn close_as_axiom(&mut self, node: NodeId) -> CyResult<()> {
        let current = self.open_node(node)?;
        if !is_axiom(&current.sequent) {
            return Err(CyError::AxiomMismatch {
                node,
                sequent: current.sequent.clone(),
            });
        }
        self.close(node, NodeStatus::ClosedAxiom);
        Ok(())
    }

    /// Validate the back-edge `node → ancestor` without closing anything.
    pub fn check_back_edge(
        &self,
        node: NodeId,
        ancestor: NodeId,
        substitution: &Substitution,
    ) -> CyResult<TraceSegment> {
        self.open_node(node)?;
        back_edge_segment(&self.nodes, node, ancestor, substitution)
    }

    /// Close `node` by a back-edge to the strict ancestor `ancestor`, whose sequent is sent
    /// onto `node`'s by `substitution`.
    pub fn close_as_back_edge(
        &mut self,
        node: NodeId,
        ancestor: NodeId,
        substitution: Substitution,
    ) -> CyResult<()> {
        let segment = self.check_back_edge(node, ancestor, &substitution)?;
        debug!(
            "Closed {node} by a back-edge to {ancestor} ({} edge(s), progressing: {})",
            segment.marks.len(),
            segment.progressing
        );
        self.close(
            node,
            NodeStatus::ClosedBackEdge {
                ancestor,
                substitution,
            },
        );
        self.segments.push(segment);
        Ok(())
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            journal: self.journal.len(),
            segments: self.segments.len(),
        }
    }

    /// Undo every change made since `checkpoint` was taken.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.journal {
            match self.journal.pop() {
                Some(JournalEntry::Created(id)) => {
                    self.nodes.remove(&id);
                    self.open.remove(&id);
                }
                Some(JournalEntry::Closed(id)) => {
                    if let Some(node) = self.nodes.get_mut(&id) {
                        node.status = NodeStatus::Open;
                        self.open.insert(id);
                    }
                }
                None => break,
            }
        }
        self.segments.truncate(checkpoint.segments);
    }

    /// The derivation, provided no node is left open.
    pub fn finish(self) -> CyResult<Derivation> {
        let Some(root) = self.root else {
            return Err(CyError::IncompleteDerivation { open: Vec::new() });
        };
        if !self.open.is_empty() {
            return Err(CyError::IncompleteDerivation {
                open: self.open.into_iter().collect(),
            });
        }
        Ok(Derivation {
            nodes: self.nodes,
            root,
            segments: self.segments,
        })
    }
}
