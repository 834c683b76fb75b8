//! Sequent calculus rules.
//!
//! A [`Rule`] is applied backwards: from a goal sequent it computes the premises (children)
//! that together justify the goal, plus the [`EdgeMark`] annotating every edge from the goal
//! to its children. Marks are what the trace checker consumes to decide whether a cycle
//! makes progress.
//!
//! Right rules act on the conclusion, left rules on the (single) assumption:
//!
//! | Rule                 | Goal                 | Premises                         | Mark        |
//! |----------------------|----------------------|----------------------------------|-------------|
//! | `ConjunctionRight`   | `Γ ⊢ A1 ∧ … ∧ An`    | `Γ ⊢ Ai` for every `i`           | `Guard`     |
//! | `DisjunctionRight`   | `Γ ⊢ A1 ∨ … ∨ An`    | `Γ ⊢ Ak`                         | `Guard`     |
//! | `ImplicationRight`   | `Γ ⊢ A1 → … → B`     | `Γ ∧ A1 ∧ … ⊢ B`                 | `Guard`     |
//! | `CoimplicationLeft`  | `A − B1 − … ⊢ C`     | `A ⊢ B1 ∨ … ∨ C`                 | `Guard`     |
//! | `UniversalRight`     | `Γ ⊢ ∀x. B`          | `Γ ⊢ B[x := e]`, `e` fresh       | `Step`      |
//! | `ExistentialRight`   | `Γ ⊢ ∃x. B`          | `Γ ⊢ B[x := t]`                  | `Step`      |
//! | `InductiveRight`     | `Γ ⊢ μN(x). B (t)`   | `Γ ⊢ unfold`                     | `Progress`  |
//! | `IterativeRight`     | `Γ ⊢ νN(x). B (t)`   | `Γ ⊢ unfold`                     | `Guarded` / `Unguarded` |
//!
//! The left rules (`ConjunctionLeft`, `DisjunctionLeft`, `UniversalLeft`, `ExistentialLeft`,
//! `InductiveLeft`, `IterativeLeft`) are the mirror images.
//!
//! Dispatch is a static `match` over the closed [`Rule`] enum.
use cyformal::{atom::Atom, prop::Proposition, sequent::Sequent};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{Display, EnumDiscriminants, EnumIs, EnumIter};

use crate::utils::error::{CyError, CyResult};

pub mod axiom;
pub mod connective;
pub mod fixpoint;
pub mod quantifier;

pub use axiom::is_axiom;

/// A rule instance, with the choices needed to make it deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIs, EnumDiscriminants)]
#[strum_discriminants(name(RuleKind))]
#[strum_discriminants(derive(Display, EnumIter, Hash, PartialOrd, Ord, Serialize, Deserialize))]
pub enum Rule {
    ConjunctionRight,
    DisjunctionRight { choice: usize },
    ImplicationRight,
    CoimplicationLeft,
    /// Eigenvariables, one per bound variable.
    UniversalRight { witnesses: Vec<Atom> },
    ExistentialRight { witnesses: Vec<Proposition> },
    InductiveRight,
    IterativeRight,
    ConjunctionLeft { choice: usize },
    DisjunctionLeft,
    UniversalLeft { witnesses: Vec<Proposition> },
    /// Eigenvariables, one per bound variable.
    ExistentialLeft { witnesses: Vec<Atom> },
    InductiveLeft,
    IterativeLeft,
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        RuleKind::from(self)
    }
}

/// Annotation of the edges from a goal to its premises.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIs)]
pub enum EdgeMark {
    /// Quantifier instantiation.
    Step,
    /// Connective decomposition; guards a following greatest-fixpoint unfold.
    Guard,
    /// Least-fixpoint unfold, a candidate progress point.
    Progress { fixpoint: Atom },
    /// Greatest-fixpoint unfold directly behind a guard.
    Guarded { fixpoint: Atom },
    /// Greatest-fixpoint unfold with no guard in front of it.
    Unguarded { fixpoint: Atom },
}

impl EdgeMark {
    /// The fixpoint identifier unfolded across this edge, if any.
    pub fn fixpoint(&self) -> Option<&Atom> {
        match self {
            EdgeMark::Progress { fixpoint }
            | EdgeMark::Guarded { fixpoint }
            | EdgeMark::Unguarded { fixpoint } => Some(fixpoint),
            EdgeMark::Step | EdgeMark::Guard => None,
        }
    }
}

/// Outcome of a successful rule application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleApplication {
    pub children: SmallVec<[Sequent; 2]>,
    pub mark: EdgeMark,
}

impl RuleApplication {
    pub(crate) fn single(child: Sequent, mark: EdgeMark) -> Self {
        let mut children = SmallVec::new();
        children.push(child);
        Self { children, mark }
    }
}

pub(crate) fn mismatch(rule: RuleKind, sequent: &Sequent, reason: impl Into<String>) -> CyError {
    CyError::RuleMismatch {
        rule,
        sequent: sequent.clone(),
        reason: reason.into(),
    }
}

/// Apply `rule` backwards to `sequent`.
///
/// `incoming` is the mark of the edge that led to `sequent` (`None` at the root); only the
/// greatest-fixpoint rules look at it.
pub fn apply(rule: &Rule, sequent: &Sequent, incoming: Option<&EdgeMark>) -> CyResult<RuleApplication> {
    match rule {
        Rule::ConjunctionRight => connective::conjunction_right(sequent),
        Rule::DisjunctionRight { choice } => connective::disjunction_right(sequent, *choice),
        Rule::ImplicationRight => connective::implication_right(sequent),
        Rule::CoimplicationLeft => connective::coimplication_left(sequent),
        Rule::ConjunctionLeft { choice } => connective::conjunction_left(sequent, *choice),
        Rule::DisjunctionLeft => connective::disjunction_left(sequent),
        Rule::UniversalRight { witnesses } => quantifier::universal_right(sequent, witnesses),
        Rule::ExistentialRight { witnesses } => quantifier::existential_right(sequent, witnesses),
        Rule::UniversalLeft { witnesses } => quantifier::universal_left(sequent, witnesses),
        Rule::ExistentialLeft { witnesses } => quantifier::existential_left(sequent, witnesses),
        Rule::InductiveRight => fixpoint::inductive_right(sequent),
        Rule::IterativeRight => fixpoint::iterative_right(sequent, incoming),
        Rule::InductiveLeft => fixpoint::inductive_left(sequent),
        Rule::IterativeLeft => fixpoint::iterative_left(sequent, incoming),
    }
}
