//! Connective rules. All of them are guarding steps.
use cyformal::{
    prop::{ConnectiveKind, Proposition},
    sequent::Sequent,
};
use smallvec::SmallVec;

use super::{EdgeMark, RuleApplication, RuleKind, mismatch};
use crate::utils::error::CyResult;

fn operands<'a>(
    prop: &'a Proposition,
    kind: ConnectiveKind,
    rule: RuleKind,
    sequent: &Sequent,
) -> CyResult<&'a [Proposition]> {
    prop.connective_of(kind)
        .map(|c| c.operands())
        .ok_or_else(|| mismatch(rule, sequent, format!("expected a {kind}")))
}

fn pick<'a>(
    operands: &'a [Proposition],
    choice: usize,
    rule: RuleKind,
    sequent: &Sequent,
) -> CyResult<&'a Proposition> {
    operands.get(choice).ok_or_else(|| {
        mismatch(
            rule,
            sequent,
            format!("choice {choice} is out of range for {} operand(s)", operands.len()),
        )
    })
}

/// `n`-ary connective over `operands`, collapsing the unary case.
fn fold(kind: ConnectiveKind, mut operands: Vec<Proposition>) -> CyResult<Proposition> {
    if operands.len() == 1 {
        if let Some(only) = operands.pop() {
            return Ok(only);
        }
    }
    Ok(Proposition::connective(kind, operands)?)
}

pub(crate) fn conjunction_right(sequent: &Sequent) -> CyResult<RuleApplication> {
    let ops = operands(
        &sequent.conclusion,
        ConnectiveKind::Conjunction,
        RuleKind::ConjunctionRight,
        sequent,
    )?;
    let children: SmallVec<[Sequent; 2]> = ops.iter().map(|a| sequent.with_conclusion(a.clone())).collect();
    Ok(RuleApplication {
        children,
        mark: EdgeMark::Guard,
    })
}

pub(crate) fn disjunction_right(sequent: &Sequent, choice: usize) -> CyResult<RuleApplication> {
    let ops = operands(
        &sequent.conclusion,
        ConnectiveKind::Disjunction,
        RuleKind::DisjunctionRight,
        sequent,
    )?;
    let chosen = pick(ops, choice, RuleKind::DisjunctionRight, sequent)?;
    Ok(RuleApplication::single(
        sequent.with_conclusion(chosen.clone()),
        EdgeMark::Guard,
    ))
}

/// `Γ ⊢ A1 → … → An → B` becomes `Γ ∧ A1 ∧ … ∧ An ⊢ B`. A trivial `True` hypothesis is
/// dropped instead of conjoined.
pub(crate) fn implication_right(sequent: &Sequent) -> CyResult<RuleApplication> {
    let ops = operands(
        &sequent.conclusion,
        ConnectiveKind::Implication,
        RuleKind::ImplicationRight,
        sequent,
    )?;
    let Some((target, premises)) = ops.split_last() else {
        return Err(mismatch(RuleKind::ImplicationRight, sequent, "empty implication"));
    };

    let mut hypotheses = Vec::with_capacity(premises.len() + 1);
    if !sequent.assumption.is_truth() {
        hypotheses.push(sequent.assumption.clone());
    }
    hypotheses.extend(premises.iter().cloned());

    let assumption = if hypotheses.is_empty() {
        sequent.assumption.clone()
    } else {
        fold(ConnectiveKind::Conjunction, hypotheses)?
    };
    Ok(RuleApplication::single(
        Sequent::new(assumption, target.clone()),
        EdgeMark::Guard,
    ))
}

/// `A − B1 − … − Bn ⊢ C` becomes `A ⊢ B1 ∨ … ∨ Bn ∨ C`.
pub(crate) fn coimplication_left(sequent: &Sequent) -> CyResult<RuleApplication> {
    let ops = operands(
        &sequent.assumption,
        ConnectiveKind::Coimplication,
        RuleKind::CoimplicationLeft,
        sequent,
    )?;
    let Some((source, subtracted)) = ops.split_first() else {
        return Err(mismatch(RuleKind::CoimplicationLeft, sequent, "empty coimplication"));
    };

    let mut alternatives: Vec<Proposition> = subtracted.to_vec();
    alternatives.push(sequent.conclusion.clone());
    let conclusion = fold(ConnectiveKind::Disjunction, alternatives)?;
    Ok(RuleApplication::single(
        Sequent::new(source.clone(), conclusion),
        EdgeMark::Guard,
    ))
}

pub(crate) fn conjunction_left(sequent: &Sequent, choice: usize) -> CyResult<RuleApplication> {
    let ops = operands(
        &sequent.assumption,
        ConnectiveKind::Conjunction,
        RuleKind::ConjunctionLeft,
        sequent,
    )?;
    let chosen = pick(ops, choice, RuleKind::ConjunctionLeft, sequent)?;
    Ok(RuleApplication::single(
        sequent.with_assumption(chosen.clone()),
        EdgeMark::Guard,
    ))
}

pub(crate) fn disjunction_left(sequent: &Sequent) -> CyResult<RuleApplication> {
    let ops = operands(
        &sequent.assumption,
        ConnectiveKind::Disjunction,
        RuleKind::DisjunctionLeft,
        sequent,
    )?;
    let children: SmallVec<[Sequent; 2]> = ops.iter().map(|a| sequent.with_assumption(a.clone())).collect();
    Ok(RuleApplication {
        children,
        mark: EdgeMark::Guard,
    })
}
