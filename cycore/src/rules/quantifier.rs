//! Universal and existential instantiation.
use cyformal::{
    atom::Atom,
    prop::{Proposition, Quantifier, QuantifierKind},
    sequent::Sequent,
    subst::{Substitution, substitute},
};

use super::{EdgeMark, RuleApplication, RuleKind, mismatch};
use crate::utils::error::CyResult;

fn quantifier<'a>(
    prop: &'a Proposition,
    kind: QuantifierKind,
    rule: RuleKind,
    sequent: &Sequent,
) -> CyResult<&'a Quantifier> {
    prop.quantifier_of(kind)
        .ok_or_else(|| mismatch(rule, sequent, format!("expected a {kind} quantifier")))
}

/// Body of `q` with its variables replaced by `witnesses`, one per variable.
fn instantiate(
    q: &Quantifier,
    witnesses: &[Proposition],
    rule: RuleKind,
    sequent: &Sequent,
) -> CyResult<Proposition> {
    if witnesses.len() != q.vars().len() {
        return Err(mismatch(
            rule,
            sequent,
            format!(
                "{} witness(es) given for {} bound variable(s)",
                witnesses.len(),
                q.vars().len()
            ),
        ));
    }
    let sigma: Substitution = q.vars().iter().cloned().zip(witnesses.iter().cloned()).collect();
    Ok(substitute(q.body(), &sigma)?)
}

/// Eigenvariables must be pairwise distinct ordinary names that are not free in the goal.
fn check_eigenvariables(witnesses: &[Atom], rule: RuleKind, sequent: &Sequent) -> CyResult<()> {
    let free = sequent.free_names();
    for (i, w) in witnesses.iter().enumerate() {
        if w.is_constant() {
            return Err(mismatch(rule, sequent, format!("`{w}` cannot be an eigenvariable")));
        }
        if witnesses[..i].contains(w) {
            return Err(mismatch(rule, sequent, format!("eigenvariable `{w}` is used twice")));
        }
        if free.contains(w) {
            return Err(mismatch(
                rule,
                sequent,
                format!("eigenvariable `{w}` already occurs free in the goal"),
            ));
        }
    }
    Ok(())
}

fn as_terms(witnesses: &[Atom]) -> Vec<Proposition> {
    witnesses.iter().cloned().map(Proposition::atom).collect()
}

pub(crate) fn universal_right(sequent: &Sequent, witnesses: &[Atom]) -> CyResult<RuleApplication> {
    let rule = RuleKind::UniversalRight;
    let q = quantifier(&sequent.conclusion, QuantifierKind::Universal, rule, sequent)?;
    check_eigenvariables(witnesses, rule, sequent)?;
    let body = instantiate(q, &as_terms(witnesses), rule, sequent)?;
    Ok(RuleApplication::single(sequent.with_conclusion(body), EdgeMark::Step))
}

pub(crate) fn existential_right(sequent: &Sequent, witnesses: &[Proposition]) -> CyResult<RuleApplication> {
    let rule = RuleKind::ExistentialRight;
    let q = quantifier(&sequent.conclusion, QuantifierKind::Existential, rule, sequent)?;
    let body = instantiate(q, witnesses, rule, sequent)?;
    Ok(RuleApplication::single(sequent.with_conclusion(body), EdgeMark::Step))
}

pub(crate) fn universal_left(sequent: &Sequent, witnesses: &[Proposition]) -> CyResult<RuleApplication> {
    let rule = RuleKind::UniversalLeft;
    let q = quantifier(&sequent.assumption, QuantifierKind::Universal, rule, sequent)?;
    let body = instantiate(q, witnesses, rule, sequent)?;
    Ok(RuleApplication::single(sequent.with_assumption(body), EdgeMark::Step))
}

pub(crate) fn existential_left(sequent: &Sequent, witnesses: &[Atom]) -> CyResult<RuleApplication> {
    let rule = RuleKind::ExistentialLeft;
    let q = quantifier(&sequent.assumption, QuantifierKind::Existential, rule, sequent)?;
    check_eigenvariables(witnesses, rule, sequent)?;
    let body = instantiate(q, &as_terms(witnesses), rule, sequent)?;
    Ok(RuleApplication::single(sequent.with_assumption(body), EdgeMark::Step))
}
