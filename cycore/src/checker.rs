//! Proof checking.
//!
//! [`verify`] re-derives everything a derivation claims instead of trusting it: every rule
//! application is recomputed, every leaf is validated and the trace condition is checked on
//! the whole graph. The first failure is reported.
use cyformal::sequent::Sequent;
use log::debug;
use strum::{EnumIs, EnumTryAs};

use crate::{
    derivation::{Derivation, NodeStatus, back_edge_segment, lookup},
    rules::{self, is_axiom, mismatch},
    trace::{ProgressPolicy, TraceReport, UnfoldProgress, check_trace},
    utils::error::{CyError, CyResult},
};

/// Outcome of [`verify`].
#[derive(Debug, EnumIs, EnumTryAs)]
pub enum Verdict {
    Valid,
    Invalid(CyError),
}

/// Check that `derivation` is a sound cyclic proof of `sequent`.
pub fn verify(sequent: &Sequent, derivation: &Derivation) -> Verdict {
    match verify_with(sequent, derivation, &UnfoldProgress) {
        Ok(_) => Verdict::Valid,
        Err(err) => Verdict::Invalid(err),
    }
}

/// [`verify`] under a custom progress policy, returning the trace report on success.
pub fn verify_with<P: ProgressPolicy + ?Sized>(
    sequent: &Sequent,
    derivation: &Derivation,
    policy: &P,
) -> CyResult<TraceReport> {
    let root = derivation.node(derivation.root())?;
    if root.sequent != *sequent {
        return Err(CyError::RootMismatch {
            expected: sequent.clone(),
            found: root.sequent.clone(),
        });
    }
    if root.parent.is_some() || root.incoming.is_some() {
        return Err(CyError::MalformedRecord(format!(
            "the root {} has a parent",
            derivation.root()
        )));
    }

    let open = derivation.open_nodes();
    if !open.is_empty() {
        return Err(CyError::IncompleteDerivation { open });
    }

    let order = derivation.breadth_first();
    if order.len() != derivation.len() {
        return Err(CyError::MalformedRecord(format!(
            "{} node(s) are not reachable from the root",
            derivation.len().saturating_sub(order.len())
        )));
    }

    for id in order {
        let node = derivation.node(id)?;
        match &node.status {
            NodeStatus::Open => return Err(CyError::IncompleteDerivation { open: vec![id] }),
            NodeStatus::ClosedAxiom => {
                if !is_axiom(&node.sequent) {
                    return Err(CyError::AxiomMismatch {
                        node: id,
                        sequent: node.sequent.clone(),
                    });
                }
            }
            NodeStatus::ClosedBackEdge {
                ancestor,
                substitution,
            } => {
                back_edge_segment(&derivation.nodes, id, *ancestor, substitution)?;
            }
            NodeStatus::ClosedByRule {
                rule,
                children,
                mark,
            } => {
                let expected = rules::apply(rule, &node.sequent, node.incoming.as_ref())?;
                if expected.mark != *mark {
                    return Err(mismatch(
                        rule.kind(),
                        &node.sequent,
                        format!("recorded mark {mark:?} but the rule yields {:?}", expected.mark),
                    ));
                }
                if expected.children.len() != children.len() {
                    return Err(mismatch(
                        rule.kind(),
                        &node.sequent,
                        format!(
                            "recorded {} premise(s) but the rule yields {}",
                            children.len(),
                            expected.children.len()
                        ),
                    ));
                }
                for (child_id, premise) in children.iter().zip(expected.children.iter()) {
                    let child = lookup(&derivation.nodes, *child_id)?;
                    if child.parent != Some(id) || child.incoming.as_ref() != Some(mark) {
                        return Err(CyError::MalformedRecord(format!(
                            "node {child_id} is not linked to its parent {id}"
                        )));
                    }
                    if child.sequent != *premise {
                        return Err(mismatch(
                            rule.kind(),
                            &node.sequent,
                            format!("premise {child_id} is `{}`, expected `{premise}`", child.sequent),
                        ));
                    }
                }
            }
        }
    }

    let report = check_trace(derivation, policy)?;
    debug!(
        "Verified a derivation of {} node(s): {} cyclic component(s), {} back-edge(s)",
        derivation.len(),
        report.cyclic_components,
        report.back_edges
    );
    Ok(report)
}
