use cyformal::{error::FormalError, sequent::Sequent};
use strum::{EnumIs, EnumTryAs};
use thiserror::Error;

use crate::{derivation::NodeId, rules::RuleKind};

#[derive(Debug, EnumIs, EnumTryAs, Error)]
pub enum CyError {
    /// The sequent does not have the shape the rule acts on.
    #[error("Rule `{rule}` does not apply to the sequent `{sequent}`: {reason}")]
    RuleMismatch {
        rule: RuleKind,
        sequent: Sequent,
        reason: String,
    },

    /// Propagated from the term model (fresh-name exhaustion or malformed fixpoints).
    #[error("Substitution failed: {0}")]
    SubstitutionCapture(#[from] FormalError),

    #[error("The sequent `{sequent}` of node {node} is not an axiom.")]
    AxiomMismatch { node: NodeId, sequent: Sequent },

    #[error(
        "Node {node} cannot be closed by a back-edge to node {ancestor}: {reason}"
    )]
    BackEdgeMismatch {
        node: NodeId,
        ancestor: NodeId,
        reason: String,
    },

    /// A strongly connected component contains a cycle made only of stationary edges.
    #[error(
        "Trace condition violated: the cycle {cycle:?} never passes through a progressing edge, so the cyclic proof is unsound."
    )]
    TraceConditionFailed { cycle: Vec<NodeId> },

    #[error("The derivation is incomplete: {} node(s) are still open (first: {:?}).", open.len(), open.first())]
    IncompleteDerivation { open: Vec<NodeId> },

    #[error("Node {0} does not exist in this derivation.")]
    UnknownNode(NodeId),

    #[error("Node {0} is already closed.")]
    NodeAlreadyClosed(NodeId),

    #[error("The derivation proves `{found}` but `{expected}` was requested.")]
    RootMismatch { expected: Sequent, found: Sequent },

    #[error("The node arena ran out of identifiers.")]
    IdSpaceExhausted,

    #[error("A search worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Malformed derivation record: {0}")]
    MalformedRecord(String),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CyError {
    /// Failures confined to one search branch; search backtracks past them.
    pub fn is_branch_local(&self) -> bool {
        matches!(
            self,
            CyError::RuleMismatch { .. }
                | CyError::AxiomMismatch { .. }
                | CyError::BackEdgeMismatch { .. }
        )
    }
}

pub type CyResult<T> = Result<T, CyError>;
