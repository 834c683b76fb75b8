//! Cyformal: the term model of a cyclic sequent calculus.
//!
//! This crate provides immutable propositions over named atoms, alpha-equivalence,
//! capture-avoiding substitution and fixpoint unfolding. Proof rules, derivations and the
//! global soundness check live in `cycore`.
//!
//! Shape
//!  - A [`prop::Proposition`] is a quantifier, a connective or an atomic formula. Quantifiers
//!    are universal, existential, inductive (least fixpoint) or iterative (greatest fixpoint).
//!  - Nodes are reference counted; rewriting shares every untouched subtree.
//!  - Equality and hashing ignore the names of bound variables.
//!
//! Example
//! ```
//! use cyformal::prelude::*;
//!
//! let lhs = Proposition::forall(["x"], Proposition::apply("P", [Proposition::atom("x")])).unwrap();
//! let rhs = Proposition::forall(["y"], Proposition::apply("P", [Proposition::atom("y")])).unwrap();
//! assert_eq!(lhs, rhs);
//!
//! let goal = Sequent::goal(lhs);
//! assert_eq!(goal.to_string(), "Unit ⊢ ∀x. P(x)");
//! ```

/// Alpha-equivalence, free-name renaming and shape hashing.
pub mod alpha;
/// Named atoms and the two distinguished constants.
pub mod atom;
/// Errors raised while building or rewriting propositions.
pub mod error;
/// Display implementations.
pub mod fmt;
/// Propositions, quantifiers and connectives.
pub mod prop;
/// Sequents.
pub mod sequent;
/// Capture-avoiding substitution and fixpoint unfolding.
pub mod subst;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::alpha::{Renaming, alpha_equivalent, free_renaming, shape_hash};
    pub use crate::atom::Atom;
    pub use crate::error::FormalError;
    pub use crate::prop::{
        Atomic, Connective, ConnectiveKind, Fixpoint, Proposition, Quantifier, QuantifierKind,
    };
    pub use crate::sequent::Sequent;
    pub use crate::subst::{NameSupply, Substitution, substitute, unfold};
}
