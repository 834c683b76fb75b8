use strum::{EnumIs, EnumTryAs};
use thiserror::Error;

use crate::{
    atom::Atom,
    prop::{ConnectiveKind, QuantifierKind},
};

#[derive(Debug, Clone, PartialEq, Eq, EnumIs, EnumTryAs, Error)]
pub enum FormalError {
    /// A quantifier lists the same bound variable twice.
    #[error("The quantifier binds the variable `{name}` more than once.")]
    DuplicateBoundVariable { name: Atom },

    /// A quantifier without any bound variable.
    #[error("A {kind} quantifier must bind at least one variable.")]
    EmptyQuantifier { kind: QuantifierKind },

    /// A connective must have at least one operand.
    #[error("A {kind} connective must have at least one operand.")]
    EmptyConnective { kind: ConnectiveKind },

    /// Fixpoint information is missing, superfluous or has the wrong arity.
    #[error("Malformed fixpoint on a {kind} quantifier: {reason}")]
    MalformedFixpoint {
        kind: QuantifierKind,
        reason: String,
    },

    /// The fresh name supply could not produce a name disjoint from the inputs.
    #[error(
        "Unable to produce a fresh name for `{name}` while avoiding variable capture. The name supply is exhausted."
    )]
    SubstitutionCapture { name: Atom },
}
