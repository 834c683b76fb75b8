//! Enumeration of the rule instances applicable to a goal.
//!
//! Invertible rules come first, then fixpoint unfolds, then the rules that commit to a
//! choice (a disjunct, a conjunct or witnesses).
use std::collections::BTreeSet;

use cyformal::{
    atom::Atom,
    prop::{ConnectiveKind, Proposition, Quantifier, QuantifierKind},
    sequent::Sequent,
    subst::NameSupply,
};

use crate::{
    magic::MAX_WITNESS_TUPLES,
    rules::{EdgeMark, Rule},
    utils::error::CyResult,
};

/// Eigenvariables for the variables of `q`: the variable's own name when it is not free in
/// the goal, a fresh name otherwise.
fn eigenvariables(q: &Quantifier, sequent: &Sequent) -> CyResult<Vec<Atom>> {
    let free = sequent.free_names();
    let mut supply = NameSupply::new(sequent.names());
    let mut chosen: Vec<Atom> = Vec::with_capacity(q.vars().len());
    for var in q.vars() {
        let name = if free.contains(var) || chosen.contains(var) {
            supply.fresh(var)?
        } else {
            var.clone()
        };
        chosen.push(name);
    }
    Ok(chosen)
}

/// Witness tuples for the variables of `q`, drawn from the free variables of the goal and
/// the bound names themselves.
fn witness_tuples(q: &Quantifier, sequent: &Sequent) -> Vec<Vec<Proposition>> {
    let mut pool: Vec<Atom> = sequent.free_variables().into_iter().collect();
    let known: BTreeSet<Atom> = pool.iter().cloned().collect();
    pool.extend(q.vars().iter().filter(|v| !known.contains(*v)).cloned());
    let pool: Vec<Proposition> = pool.into_iter().map(Proposition::atom).collect();

    let arity = q.vars().len();
    let mut tuples = Vec::new();
    let mut digits = vec![0usize; arity];
    while tuples.len() < MAX_WITNESS_TUPLES {
        tuples.push(digits.iter().map(|i| pool[*i].clone()).collect());

        // Odometer increment, least significant digit last.
        let mut position = arity;
        loop {
            if position == 0 {
                return tuples;
            }
            position -= 1;
            digits[position] += 1;
            if digits[position] < pool.len() {
                break;
            }
            digits[position] = 0;
        }
    }
    tuples
}

fn may_unfold_iterative(incoming: Option<&EdgeMark>) -> bool {
    !incoming.is_some_and(EdgeMark::is_unguarded)
}

/// Rule instances worth trying on `sequent`, in the order they should be tried.
pub(crate) fn alternatives(sequent: &Sequent, incoming: Option<&EdgeMark>) -> CyResult<Vec<Rule>> {
    let mut invertible = Vec::new();
    let mut unfolds = Vec::new();
    let mut choices = Vec::new();

    match &sequent.conclusion {
        Proposition::Connective(c) => match c.kind() {
            ConnectiveKind::Conjunction => invertible.push(Rule::ConjunctionRight),
            ConnectiveKind::Implication => invertible.push(Rule::ImplicationRight),
            ConnectiveKind::Disjunction => {
                choices.extend((0..c.operands().len()).map(|choice| Rule::DisjunctionRight { choice }))
            }
            ConnectiveKind::Coimplication => {}
        },
        Proposition::Quantifier(q) => match q.kind() {
            QuantifierKind::Universal => invertible.push(Rule::UniversalRight {
                witnesses: eigenvariables(q, sequent)?,
            }),
            QuantifierKind::Existential => choices.extend(
                witness_tuples(q, sequent)
                    .into_iter()
                    .map(|witnesses| Rule::ExistentialRight { witnesses }),
            ),
            QuantifierKind::Inductive => unfolds.push(Rule::InductiveRight),
            QuantifierKind::Iterative if may_unfold_iterative(incoming) => unfolds.push(Rule::IterativeRight),
            QuantifierKind::Iterative => {}
        },
        Proposition::Atomic(_) => {}
    }

    match &sequent.assumption {
        Proposition::Connective(c) => match c.kind() {
            ConnectiveKind::Disjunction => invertible.push(Rule::DisjunctionLeft),
            ConnectiveKind::Coimplication => invertible.push(Rule::CoimplicationLeft),
            ConnectiveKind::Conjunction => {
                choices.extend((0..c.operands().len()).map(|choice| Rule::ConjunctionLeft { choice }))
            }
            ConnectiveKind::Implication => {}
        },
        Proposition::Quantifier(q) => match q.kind() {
            QuantifierKind::Existential => invertible.push(Rule::ExistentialLeft {
                witnesses: eigenvariables(q, sequent)?,
            }),
            QuantifierKind::Universal => choices.extend(
                witness_tuples(q, sequent)
                    .into_iter()
                    .map(|witnesses| Rule::UniversalLeft { witnesses }),
            ),
            QuantifierKind::Inductive => unfolds.push(Rule::InductiveLeft),
            QuantifierKind::Iterative if may_unfold_iterative(incoming) => unfolds.push(Rule::IterativeLeft),
            QuantifierKind::Iterative => {}
        },
        Proposition::Atomic(_) => {}
    }

    invertible.extend(unfolds);
    invertible.extend(choices);
    Ok(invertible)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str) -> Proposition {
        Proposition::atom(name)
    }

    #[test]
    fn witnesses_cover_free_variables_and_bound_names() {
        let body = Proposition::apply("R", [v("a"), v("b")]);
        let all = Proposition::forall(["a", "b"], body).unwrap();
        let s = Sequent::new(all, Proposition::apply("R", [v("x"), v("x")]));

        let rules = alternatives(&s, None).unwrap();
        // pool {x, a, b}: 3^2 tuples, all universal-left instances
        assert_eq!(rules.len(), 9);
        assert!(rules.contains(&Rule::UniversalLeft {
            witnesses: vec![v("x"), v("x")]
        }));
    }

    #[test]
    fn eigenvariables_avoid_free_names() {
        let s = Sequent::new(
            Proposition::apply("P", [v("x")]),
            Proposition::forall(["x"], Proposition::apply("P", [v("x")])).unwrap(),
        );
        let rules = alternatives(&s, None).unwrap();
        match &rules[0] {
            Rule::UniversalRight { witnesses } => assert_ne!(witnesses[0], Atom::new("x")),
            other => panic!("unexpected rule {other:?}"),
        }
    }

    #[test]
    fn unguarded_iterative_goals_are_not_unfolded_twice() {
        let spin = Proposition::iterative("S", ["x"], Proposition::apply("S", [v("x")]), [v("t")]).unwrap();
        let s = Sequent::goal(spin);
        assert_eq!(alternatives(&s, None).unwrap(), vec![Rule::IterativeRight]);
        let incoming = EdgeMark::Unguarded {
            fixpoint: Atom::new("S"),
        };
        assert!(alternatives(&s, Some(&incoming)).unwrap().is_empty());
    }
}
