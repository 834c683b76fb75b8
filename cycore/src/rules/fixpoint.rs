//! Fixpoint unfolding.
//!
//! Least fixpoints (`Inductive`) mark their unfold as a progress candidate. Greatest
//! fixpoints (`Iterative`) are productive only behind a guard: an unfold whose incoming edge
//! is a connective step is `Guarded`, any other unfold is `Unguarded`, and two unguarded
//! unfolds in a row are rejected.
use std::sync::Arc;

use cyformal::{
    atom::Atom,
    error::FormalError,
    prop::{Proposition, Quantifier, QuantifierKind},
    sequent::Sequent,
    subst::unfold,
};

use super::{EdgeMark, RuleApplication, RuleKind, mismatch};
use crate::utils::error::CyResult;

fn fixpoint<'a>(
    prop: &'a Proposition,
    kind: QuantifierKind,
    rule: RuleKind,
    sequent: &Sequent,
) -> CyResult<&'a Arc<Quantifier>> {
    prop.as_quantifier_arc()
        .filter(|q| q.kind() == kind)
        .ok_or_else(|| mismatch(rule, sequent, format!("expected an {kind} quantifier")))
}

fn name_of(q: &Quantifier) -> CyResult<Atom> {
    let fixpoint = q.fixpoint().ok_or_else(|| FormalError::MalformedFixpoint {
        kind: q.kind(),
        reason: "missing fixpoint identifier".to_string(),
    })?;
    Ok(fixpoint.name.clone())
}

/// Mark of a greatest-fixpoint unfold given the edge that reached the goal.
fn guardedness(
    q: &Quantifier,
    incoming: Option<&EdgeMark>,
    rule: RuleKind,
    sequent: &Sequent,
) -> CyResult<EdgeMark> {
    let fixpoint = name_of(q)?;
    match incoming {
        Some(EdgeMark::Unguarded { fixpoint: previous }) => Err(mismatch(
            rule,
            sequent,
            format!("unguarded unfold of `{fixpoint}` directly after the unguarded unfold of `{previous}`"),
        )),
        Some(EdgeMark::Guard) => Ok(EdgeMark::Guarded { fixpoint }),
        _ => Ok(EdgeMark::Unguarded { fixpoint }),
    }
}

pub(crate) fn inductive_right(sequent: &Sequent) -> CyResult<RuleApplication> {
    let q = fixpoint(&sequent.conclusion, QuantifierKind::Inductive, RuleKind::InductiveRight, sequent)?;
    let unfolded = unfold(q)?;
    Ok(RuleApplication::single(
        sequent.with_conclusion(unfolded),
        EdgeMark::Progress { fixpoint: name_of(q)? },
    ))
}

pub(crate) fn iterative_right(sequent: &Sequent, incoming: Option<&EdgeMark>) -> CyResult<RuleApplication> {
    let rule = RuleKind::IterativeRight;
    let q = fixpoint(&sequent.conclusion, QuantifierKind::Iterative, rule, sequent)?;
    let mark = guardedness(q, incoming, rule, sequent)?;
    let unfolded = unfold(q)?;
    Ok(RuleApplication::single(sequent.with_conclusion(unfolded), mark))
}

pub(crate) fn inductive_left(sequent: &Sequent) -> CyResult<RuleApplication> {
    let q = fixpoint(&sequent.assumption, QuantifierKind::Inductive, RuleKind::InductiveLeft, sequent)?;
    let unfolded = unfold(q)?;
    Ok(RuleApplication::single(
        sequent.with_assumption(unfolded),
        EdgeMark::Progress { fixpoint: name_of(q)? },
    ))
}

pub(crate) fn iterative_left(sequent: &Sequent, incoming: Option<&EdgeMark>) -> CyResult<RuleApplication> {
    let rule = RuleKind::IterativeLeft;
    let q = fixpoint(&sequent.assumption, QuantifierKind::Iterative, rule, sequent)?;
    let mark = guardedness(q, incoming, rule, sequent)?;
    let unfolded = unfold(q)?;
    Ok(RuleApplication::single(sequent.with_assumption(unfolded), mark))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str) -> Proposition {
        Proposition::atom(name)
    }

    /// `νS(x). S(x)` taken at `t`: unfolds to itself.
    fn spin() -> Proposition {
        Proposition::iterative("S", ["x"], Proposition::apply("S", [v("x")]), [v("t")]).unwrap()
    }

    #[test]
    fn iterative_guardedness_follows_the_incoming_edge() {
        let s = Sequent::goal(spin());
        let root = iterative_right(&s, None).unwrap();
        assert!(root.mark.is_unguarded());
        assert_eq!(root.children[0], s);

        let guarded = iterative_right(&s, Some(&EdgeMark::Guard)).unwrap();
        assert!(guarded.mark.is_guarded());

        let err = iterative_right(&s, Some(&root.mark)).unwrap_err();
        assert!(err.is_rule_mismatch());
    }

    #[test]
    fn inductive_unfold_is_a_progress_candidate() {
        let nat = Proposition::inductive(
            "Nat",
            ["n"],
            Proposition::or(Proposition::apply("Zero", [v("n")]), Proposition::apply("Nat", [v("n")])),
            [v("a")],
        )
        .unwrap();
        let app = inductive_right(&Sequent::goal(nat)).unwrap();
        assert_eq!(app.mark, EdgeMark::Progress { fixpoint: Atom::new("Nat") });
        assert!(app.children[0].conclusion.connective_of(cyformal::prop::ConnectiveKind::Disjunction).is_some());
    }
}
