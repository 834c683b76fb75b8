//! Flat serialization form of derivations.
//!
//! A record lists every node with its sequent and how it was closed. Parents and edge marks
//! are not stored: [`Derivation::from_record`] recomputes them from the rules, so a record
//! can be checked again without the session that produced it.
use std::collections::{BTreeMap, BTreeSet};

use cyformal::{sequent::Sequent, subst::Substitution};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::EnumIs;

use super::{Derivation, DerivationNode, NodeId, NodeMap, NodeStatus, back_edge_segment};
use crate::{
    rules::{self, Rule},
    utils::error::{CyError, CyResult},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIs)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordStep {
    Open,
    Axiom,
    BackEdge {
        target: NodeId,
        substitution: Substitution,
    },
    Rule {
        rule: Rule,
        children: Vec<NodeId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub sequent: Sequent,
    pub step: RecordStep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationRecord {
    pub root: NodeId,
    pub nodes: Vec<NodeRecord>,
}

impl DerivationRecord {
    pub fn to_json(&self) -> CyResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CyError::SerializationError(e.to_string()))
    }

    pub fn from_json(text: &str) -> CyResult<Self> {
        serde_json::from_str(text).map_err(|e| CyError::SerializationError(e.to_string()))
    }
}

fn malformed(reason: String) -> CyError {
    CyError::MalformedRecord(reason)
}

impl Derivation {
    /// Flatten into the serialization form.
    pub fn to_record(&self) -> DerivationRecord {
        let nodes = self
            .nodes
            .values()
            .map(|node| NodeRecord {
                id: node.id,
                sequent: node.sequent.clone(),
                step: match &node.status {
                    NodeStatus::Open => RecordStep::Open,
                    NodeStatus::ClosedAxiom => RecordStep::Axiom,
                    NodeStatus::ClosedBackEdge {
                        ancestor,
                        substitution,
                    } => RecordStep::BackEdge {
                        target: *ancestor,
                        substitution: substitution.clone(),
                    },
                    NodeStatus::ClosedByRule { rule, children, .. } => RecordStep::Rule {
                        rule: rule.clone(),
                        children: children.to_vec(),
                    },
                },
            })
            .collect();
        DerivationRecord {
            root: self.root,
            nodes,
        }
    }

    /// Rebuild a derivation from its record.
    ///
    /// The record must describe a tree rooted at `root` (every other node listed as the child
    /// of exactly one node). Edge marks are recomputed by re-applying each rule, so an
    /// inapplicable rule is reported as [`CyError::RuleMismatch`]. Whether the premises and
    /// back-edges match the recorded sequents is left to the checker.
    pub fn from_record(record: &DerivationRecord) -> CyResult<Self> {
        let mut steps: BTreeMap<NodeId, &NodeRecord> = BTreeMap::new();
        for node in &record.nodes {
            if steps.insert(node.id, node).is_some() {
                return Err(malformed(format!("node {} is listed twice", node.id)));
            }
        }
        if !steps.contains_key(&record.root) {
            return Err(malformed(format!("the root {} is not listed", record.root)));
        }

        let mut parents: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        for node in &record.nodes {
            if let RecordStep::Rule { children, .. } = &node.step {
                for child in children {
                    if !steps.contains_key(child) {
                        return Err(malformed(format!("node {} lists the unknown child {child}", node.id)));
                    }
                    if *child == record.root || parents.insert(*child, node.id).is_some() {
                        return Err(malformed(format!("node {child} has more than one parent")));
                    }
                }
            }
        }

        // Walk down from the root so that every incoming mark is known before it is needed.
        let mut nodes: NodeMap = BTreeMap::new();
        let mut pending = vec![(record.root, None)];
        let mut seen = BTreeSet::new();
        while let Some((id, incoming)) = pending.pop() {
            if !seen.insert(id) {
                return Err(malformed(format!("node {id} is reachable twice")));
            }
            let entry = *steps
                .get(&id)
                .ok_or_else(|| malformed(format!("node {id} is not listed")))?;
            if !entry.sequent.is_well_formed() {
                return Err(malformed(format!("the sequent of node {id} is ill-formed")));
            }
            let status = match &entry.step {
                RecordStep::Open => NodeStatus::Open,
                RecordStep::Axiom => NodeStatus::ClosedAxiom,
                RecordStep::BackEdge {
                    target,
                    substitution,
                } => NodeStatus::ClosedBackEdge {
                    ancestor: *target,
                    substitution: substitution.clone(),
                },
                RecordStep::Rule { rule, children } => {
                    let application = rules::apply(rule, &entry.sequent, incoming.as_ref())?;
                    for child in children.iter().rev() {
                        pending.push((*child, Some(application.mark.clone())));
                    }
                    NodeStatus::ClosedByRule {
                        rule: rule.clone(),
                        children: children.iter().copied().collect::<SmallVec<_>>(),
                        mark: application.mark,
                    }
                }
            };
            nodes.insert(
                id,
                DerivationNode {
                    id,
                    sequent: entry.sequent.clone(),
                    status,
                    parent: parents.get(&id).copied(),
                    incoming,
                },
            );
        }

        if nodes.len() != steps.len() {
            return Err(malformed(format!(
                "{} node(s) are not reachable from the root",
                steps.len() - nodes.len()
            )));
        }

        // Invalid back-edges are left for the checker to report.
        let segments = nodes
            .values()
            .filter_map(|node| match &node.status {
                NodeStatus::ClosedBackEdge {
                    ancestor,
                    substitution,
                } => back_edge_segment(&nodes, node.id, *ancestor, substitution).ok(),
                _ => None,
            })
            .collect();

        Ok(Derivation {
            nodes,
            root: record.root,
            segments,
        })
    }
}
