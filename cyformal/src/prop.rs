//! Propositions: the closed sum type of the logic.
//!
//! Role
//! - [`Proposition`] is one of three shapes: a [`Quantifier`], a [`Connective`] or an
//!   [`Atomic`] formula. Each node lives behind an `Arc`, so cloning is O(1) and rewritten trees
//!   share every untouched subtree with their source.
//! - Propositions are immutable once built. Constructors validate the shape invariants (no
//!   duplicate bound variables, connective arity ≥ 1, fixpoint arity) and return a
//!   [`FormalError`] otherwise.
//!
//! Fixpoints
//! - `Inductive` and `Iterative` quantifiers carry a [`Fixpoint`]: the identifier of the
//!   fixpoint equation and the arguments it is taken at. `Inductive[N](x). B` applied to `t`
//!   reads "the least `N` such that `N(x) <=> B`, at `t`". Inside `B`, an [`Atomic`] whose atom
//!   is `N` is a recursive reference to the equation.
//!
//! Equality
//! - `PartialEq` and `Hash` are alpha-equivalence aware, see [`crate::alpha`].
//!
//! Example
//! ```
//! use cyformal::prop::Proposition;
//!
//! let zero = Proposition::atom("Zero");
//! let step = Proposition::exists(["y"], Proposition::apply("Nat", [Proposition::atom("y")])).unwrap();
//! let body = Proposition::or(zero, step);
//! let nat = Proposition::inductive("Nat", ["x"], body, [Proposition::atom("n")]).unwrap();
//! assert!(nat.as_quantifier().unwrap().kind().is_inductive());
//! ```
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{Display, EnumIs, EnumIter};

use crate::{atom::Atom, error::FormalError};

/// The four quantifier forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumIter, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QuantifierKind {
    Universal,
    Existential,
    /// Least fixpoint.
    Inductive,
    /// Greatest fixpoint.
    Iterative,
}

impl QuantifierKind {
    /// Whether the quantifier denotes a fixpoint and therefore carries a [`Fixpoint`].
    #[inline]
    pub fn is_fixpoint(self) -> bool {
        matches!(self, QuantifierKind::Inductive | QuantifierKind::Iterative)
    }
}

/// The four connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumIter, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConnectiveKind {
    Conjunction,
    Disjunction,
    Implication,
    Coimplication,
}

/// Identifier and arguments of a fixpoint quantifier.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fixpoint {
    pub name: Atom,
    pub args: Vec<Proposition>,
}

/// A quantifier node. Fields are private so the invariants checked by [`Quantifier::new`]
/// cannot be broken afterwards; deserialization goes through the same constructor.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawQuantifier"))]
pub struct Quantifier {
    kind: QuantifierKind,
    vars: SmallVec<[Atom; 2]>,
    body: Proposition,
    fixpoint: Option<Fixpoint>,
}

impl Quantifier {
    /// Build a quantifier, validating its shape.
    ///
    /// `fixpoint` must be `Some` exactly for `Inductive` / `Iterative`, with one argument per
    /// bound variable.
    pub fn new<I, A>(
        kind: QuantifierKind,
        vars: I,
        body: Proposition,
        fixpoint: Option<Fixpoint>,
    ) -> Result<Self, FormalError>
    where
        I: IntoIterator<Item = A>,
        A: Into<Atom>,
    {
        let vars: SmallVec<[Atom; 2]> = vars.into_iter().map(Into::into).collect();
        if vars.is_empty() {
            return Err(FormalError::EmptyQuantifier { kind });
        }

        for (i, var) in vars.iter().enumerate() {
            if vars[..i].contains(var) {
                return Err(FormalError::DuplicateBoundVariable { name: var.clone() });
            }
        }

        match (&fixpoint, kind.is_fixpoint()) {
            (None, true) => {
                return Err(FormalError::MalformedFixpoint {
                    kind,
                    reason: "missing fixpoint identifier".to_string(),
                });
            }
            (Some(_), false) => {
                return Err(FormalError::MalformedFixpoint {
                    kind,
                    reason: "only inductive and iterative quantifiers carry a fixpoint".to_string(),
                });
            }
            (Some(fixpoint), true) => {
                if fixpoint.args.len() != vars.len() {
                    return Err(FormalError::MalformedFixpoint {
                        kind,
                        reason: format!(
                            "`{}` binds {} parameter(s) but is applied to {} argument(s)",
                            fixpoint.name,
                            vars.len(),
                            fixpoint.args.len()
                        ),
                    });
                }
                if vars.contains(&fixpoint.name) {
                    return Err(FormalError::MalformedFixpoint {
                        kind,
                        reason: format!("`{}` is both the fixpoint and a parameter", fixpoint.name),
                    });
                }
            }
            (None, false) => {}
        }

        Ok(Self {
            kind,
            vars,
            body,
            fixpoint,
        })
    }

    /// Rebuild with new components and the same kind. The caller guarantees the invariants
    /// (used by renaming passes which preserve arity and distinctness).
    pub(crate) fn rebuild(
        &self,
        vars: SmallVec<[Atom; 2]>,
        body: Proposition,
        fixpoint: Option<Fixpoint>,
    ) -> Self {
        debug_assert_eq!(vars.len(), self.vars.len());
        debug_assert_eq!(fixpoint.is_some(), self.fixpoint.is_some());
        Self {
            kind: self.kind,
            vars,
            body,
            fixpoint,
        }
    }

    #[inline]
    pub fn kind(&self) -> QuantifierKind {
        self.kind
    }

    #[inline]
    pub fn vars(&self) -> &[Atom] {
        &self.vars
    }

    #[inline]
    pub fn body(&self) -> &Proposition {
        &self.body
    }

    #[inline]
    pub fn fixpoint(&self) -> Option<&Fixpoint> {
        self.fixpoint.as_ref()
    }
}

/// A connective node with at least one operand.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawConnective"))]
pub struct Connective {
    kind: ConnectiveKind,
    operands: Vec<Proposition>,
}

impl Connective {
    pub fn new<I>(kind: ConnectiveKind, operands: I) -> Result<Self, FormalError>
    where
        I: IntoIterator<Item = Proposition>,
    {
        let operands: Vec<Proposition> = operands.into_iter().collect();
        if operands.is_empty() {
            return Err(FormalError::EmptyConnective { kind });
        }
        Ok(Self { kind, operands })
    }

    #[inline]
    pub fn kind(&self) -> ConnectiveKind {
        self.kind
    }

    #[inline]
    pub fn operands(&self) -> &[Proposition] {
        &self.operands
    }
}

/// Unchecked wire form of [`Quantifier`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawQuantifier {
    kind: QuantifierKind,
    vars: SmallVec<[Atom; 2]>,
    body: Proposition,
    fixpoint: Option<Fixpoint>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawQuantifier> for Quantifier {
    type Error = FormalError;

    fn try_from(raw: RawQuantifier) -> Result<Self, Self::Error> {
        Quantifier::new(raw.kind, raw.vars, raw.body, raw.fixpoint)
    }
}

/// Unchecked wire form of [`Connective`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawConnective {
    kind: ConnectiveKind,
    operands: Vec<Proposition>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawConnective> for Connective {
    type Error = FormalError;

    fn try_from(raw: RawConnective) -> Result<Self, Self::Error> {
        Connective::new(raw.kind, raw.operands)
    }
}

/// An atom, optionally applied to argument propositions.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Atomic {
    atom: Atom,
    args: Vec<Proposition>,
}

impl Atomic {
    pub fn new<I>(atom: Atom, args: I) -> Self
    where
        I: IntoIterator<Item = Proposition>,
    {
        Self {
            atom,
            args: args.into_iter().collect(),
        }
    }

    #[inline]
    pub fn atom(&self) -> &Atom {
        &self.atom
    }

    #[inline]
    pub fn args(&self) -> &[Proposition] {
        &self.args
    }

    /// A nullary atomic formula: either a variable occurrence or a free name.
    #[inline]
    pub fn is_nullary(&self) -> bool {
        self.args.is_empty()
    }
}

/// A proposition of the logic.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Proposition {
    Quantifier(Arc<Quantifier>),
    Connective(Arc<Connective>),
    Atomic(Arc<Atomic>),
}

impl From<Quantifier> for Proposition {
    fn from(value: Quantifier) -> Self {
        Proposition::Quantifier(Arc::new(value))
    }
}

impl From<Connective> for Proposition {
    fn from(value: Connective) -> Self {
        Proposition::Connective(Arc::new(value))
    }
}

impl From<Atomic> for Proposition {
    fn from(value: Atomic) -> Self {
        Proposition::Atomic(Arc::new(value))
    }
}

impl From<Atom> for Proposition {
    fn from(value: Atom) -> Self {
        Atomic::new(value, []).into()
    }
}

impl Proposition {
    /// A nullary atomic formula (a constant, a free name or a variable occurrence).
    pub fn atom<A: Into<Atom>>(name: A) -> Self {
        Atomic::new(name.into(), []).into()
    }

    /// An atom applied to arguments, e.g. `Succ(x, y)`.
    pub fn apply<A, I>(head: A, args: I) -> Self
    where
        A: Into<Atom>,
        I: IntoIterator<Item = Proposition>,
    {
        Atomic::new(head.into(), args).into()
    }

    /// The trivially provable proposition.
    pub fn truth() -> Self {
        Self::atom(Atom::truth())
    }

    /// The trivially refutable proposition.
    pub fn falsity() -> Self {
        Self::atom(Atom::falsity())
    }

    pub fn connective<I>(kind: ConnectiveKind, operands: I) -> Result<Self, FormalError>
    where
        I: IntoIterator<Item = Proposition>,
    {
        Connective::new(kind, operands).map(Into::into)
    }

    /// Binary connective, infallible since the arity is two.
    fn binary(kind: ConnectiveKind, lhs: Proposition, rhs: Proposition) -> Self {
        Connective {
            kind,
            operands: vec![lhs, rhs],
        }
        .into()
    }

    pub fn and(lhs: Proposition, rhs: Proposition) -> Self {
        Self::binary(ConnectiveKind::Conjunction, lhs, rhs)
    }

    pub fn or(lhs: Proposition, rhs: Proposition) -> Self {
        Self::binary(ConnectiveKind::Disjunction, lhs, rhs)
    }

    pub fn implies(lhs: Proposition, rhs: Proposition) -> Self {
        Self::binary(ConnectiveKind::Implication, lhs, rhs)
    }

    /// `lhs - rhs`, the dual of implication.
    pub fn coimplies(lhs: Proposition, rhs: Proposition) -> Self {
        Self::binary(ConnectiveKind::Coimplication, lhs, rhs)
    }

    pub fn forall<I, A>(vars: I, body: Proposition) -> Result<Self, FormalError>
    where
        I: IntoIterator<Item = A>,
        A: Into<Atom>,
    {
        Quantifier::new(QuantifierKind::Universal, vars, body, None).map(Into::into)
    }

    pub fn exists<I, A>(vars: I, body: Proposition) -> Result<Self, FormalError>
    where
        I: IntoIterator<Item = A>,
        A: Into<Atom>,
    {
        Quantifier::new(QuantifierKind::Existential, vars, body, None).map(Into::into)
    }

    /// Least fixpoint `name` with parameters `vars` and defining `body`, taken at `args`.
    pub fn inductive<N, I, A, J>(
        name: N,
        vars: I,
        body: Proposition,
        args: J,
    ) -> Result<Self, FormalError>
    where
        N: Into<Atom>,
        I: IntoIterator<Item = A>,
        A: Into<Atom>,
        J: IntoIterator<Item = Proposition>,
    {
        Self::fixpoint(QuantifierKind::Inductive, name, vars, body, args)
    }

    /// Greatest fixpoint `name` with parameters `vars` and defining `body`, taken at `args`.
    pub fn iterative<N, I, A, J>(
        name: N,
        vars: I,
        body: Proposition,
        args: J,
    ) -> Result<Self, FormalError>
    where
        N: Into<Atom>,
        I: IntoIterator<Item = A>,
        A: Into<Atom>,
        J: IntoIterator<Item = Proposition>,
    {
        Self::fixpoint(QuantifierKind::Iterative, name, vars, body, args)
    }

    fn fixpoint<N, I, A, J>(
        kind: QuantifierKind,
        name: N,
        vars: I,
        body: Proposition,
        args: J,
    ) -> Result<Self, FormalError>
    where
        N: Into<Atom>,
        I: IntoIterator<Item = A>,
        A: Into<Atom>,
        J: IntoIterator<Item = Proposition>,
    {
        let fixpoint = Fixpoint {
            name: name.into(),
            args: args.into_iter().collect(),
        };
        Quantifier::new(kind, vars, body, Some(fixpoint)).map(Into::into)
    }

    #[inline]
    pub fn as_quantifier(&self) -> Option<&Quantifier> {
        match self {
            Proposition::Quantifier(q) => Some(q),
            _ => None,
        }
    }

    /// The quantifier node as a shared pointer, when this is a quantifier.
    #[inline]
    pub fn as_quantifier_arc(&self) -> Option<&Arc<Quantifier>> {
        match self {
            Proposition::Quantifier(q) => Some(q),
            _ => None,
        }
    }

    #[inline]
    pub fn as_connective(&self) -> Option<&Connective> {
        match self {
            Proposition::Connective(c) => Some(c),
            _ => None,
        }
    }

    #[inline]
    pub fn as_atomic(&self) -> Option<&Atomic> {
        match self {
            Proposition::Atomic(a) => Some(a),
            _ => None,
        }
    }

    /// The quantifier node when it has the requested kind.
    pub fn quantifier_of(&self, kind: QuantifierKind) -> Option<&Quantifier> {
        self.as_quantifier().filter(|q| q.kind() == kind)
    }

    /// The connective node when it has the requested kind.
    pub fn connective_of(&self, kind: ConnectiveKind) -> Option<&Connective> {
        self.as_connective().filter(|c| c.kind() == kind)
    }

    /// The atom of a nullary atomic formula.
    #[inline]
    pub fn as_name(&self) -> Option<&Atom> {
        self.as_atomic()
            .filter(|a| a.is_nullary())
            .map(|a| a.atom())
    }

    pub fn is_truth(&self) -> bool {
        self.as_name().is_some_and(Atom::is_truth)
    }

    pub fn is_falsity(&self) -> bool {
        self.as_name().is_some_and(Atom::is_falsity)
    }

    /// Operands of a conjunction, flattened recursively. Any other proposition is its own
    /// single conjunct.
    pub fn conjuncts(&self) -> Vec<&Proposition> {
        let mut out = Vec::new();
        let mut stack: SmallVec<[&Proposition; 8]> = SmallVec::new();
        stack.push(self);
        while let Some(p) = stack.pop() {
            match p.connective_of(ConnectiveKind::Conjunction) {
                Some(c) => stack.extend(c.operands().iter().rev()),
                None => out.push(p),
            }
        }
        out
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Proposition::Quantifier(q) => {
                1 + q.body().size()
                    + q.fixpoint()
                        .map(|f| f.args.iter().map(Proposition::size).sum::<usize>())
                        .unwrap_or(0)
            }
            Proposition::Connective(c) => 1 + c.operands().iter().map(Proposition::size).sum::<usize>(),
            Proposition::Atomic(a) => 1 + a.args().iter().map(Proposition::size).sum::<usize>(),
        }
    }

    /// Whether two handles point to the very same node.
    pub fn ptr_eq(&self, other: &Proposition) -> bool {
        match (self, other) {
            (Proposition::Quantifier(a), Proposition::Quantifier(b)) => Arc::ptr_eq(a, b),
            (Proposition::Connective(a), Proposition::Connective(b)) => Arc::ptr_eq(a, b),
            (Proposition::Atomic(a), Proposition::Atomic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
