//! Human readable rendering.
//!
//! - atoms print by name, applied atoms as `P(a, b)`;
//! - connectives as `a ∧ b`, `a ∨ b`, `a → b` and `a − b`, compound operands parenthesized;
//! - quantifiers as `∀x y. B`, `∃x. B`, `(μN(x). B)(t)` and `(νN(x). B)(t)`;
//! - sequents as `A ⊢ B`.
use std::fmt::{self, Display, Formatter};

use crate::{
    prop::{Atomic, Connective, ConnectiveKind, Proposition, Quantifier, QuantifierKind},
    sequent::Sequent,
    subst::Substitution,
};

fn symbol(kind: ConnectiveKind) -> &'static str {
    match kind {
        ConnectiveKind::Conjunction => "∧",
        ConnectiveKind::Disjunction => "∨",
        ConnectiveKind::Implication => "→",
        ConnectiveKind::Coimplication => "−",
    }
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Operand of a connective: atoms print bare, anything else between parentheses.
struct Operand<'a>(&'a Proposition);

impl Display for Operand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Proposition::Atomic(_) => write!(f, "{}", self.0),
            _ => write!(f, "({})", self.0),
        }
    }
}

impl Display for Atomic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.atom())?;
        if !self.is_nullary() {
            f.write_str("(")?;
            write_list(f, self.args(), ", ")?;
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl Display for Connective {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let operands: Vec<Operand<'_>> = self.operands().iter().map(Operand).collect();
        write_list(f, &operands, &format!(" {} ", symbol(self.kind())))
    }
}

impl Display for Quantifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind() {
            QuantifierKind::Universal => "∀",
            QuantifierKind::Existential => "∃",
            QuantifierKind::Inductive => "μ",
            QuantifierKind::Iterative => "ν",
        };

        match self.fixpoint() {
            None => {
                write!(f, "{prefix}")?;
                write_list(f, self.vars(), " ")?;
                write!(f, ". {}", self.body())
            }
            Some(fixpoint) => {
                write!(f, "({prefix}{}(", fixpoint.name)?;
                write_list(f, self.vars(), ", ")?;
                write!(f, "). {})(", self.body())?;
                write_list(f, &fixpoint.args, ", ")?;
                f.write_str(")")
            }
        }
    }
}

impl Display for Proposition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Proposition::Quantifier(q) => q.fmt(f),
            Proposition::Connective(c) => c.fmt(f),
            Proposition::Atomic(a) => a.fmt(f),
        }
    }
}

impl Display for Sequent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ⊢ {}", self.assumption, self.conclusion)
    }
}

impl Display for Substitution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} ↦ {value}")?;
        }
        f.write_str("}")
    }
}
