//! Rule engine, derivation graphs and proof checking for cyclic sequent proofs.
//!
//! A derivation is a finite tree of sequents in which some leaves are closed by a back-edge
//! to an ancestor instead of an axiom. Such a graph is a proof only if every cycle passes
//! through a progressing step (the unfolding of a least fixpoint, or a guarded unfolding of
//! a greatest fixpoint). The crate builds derivations rule by rule, checks them, and
//! searches for them.
//!
//! Most consumers will interact with [`derivation::DerivationBuilder`], [`checker::verify`]
//! and [`search::search`], all re-exported from [`prelude`].

pub mod checker;
pub mod derivation;
pub mod magic;
pub mod rules;
pub mod search;
pub mod trace;
pub mod utils;

pub extern crate cyformal;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::checker::{Verdict, verify, verify_with};
    pub use crate::derivation::{
        Derivation, DerivationBuilder, DerivationNode, DerivationRecord, NodeId, NodeStatus,
        TraceSegment,
    };
    pub use crate::rules::{EdgeMark, Rule, RuleApplication, RuleKind, apply, is_axiom};
    pub use crate::search::{ExhaustionReason, SearchConfig, SearchOutcome, search};
    pub use crate::trace::{ProgressPolicy, TraceReport, UnfoldProgress, check_trace};
    pub use crate::utils::error::{CyError, CyResult};
}
