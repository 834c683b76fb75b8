mod common;

use common::*;
use cycore::cyformal::prelude::*;
use cycore::prelude::*;

#[test]
fn equal_sides_close_as_an_axiom() {
    let goal = Sequent::new(Proposition::apply("Nat", [v("x")]), Proposition::apply("Nat", [v("x")]));
    let mut builder = DerivationBuilder::new();
    let root = builder.open_goal(goal.clone()).unwrap();
    builder.close_as_axiom(root).unwrap();
    let derivation = builder.finish().unwrap();

    assert_eq!(derivation.len(), 1);
    assert!(verify(&goal, &derivation).is_valid());
}

#[test]
fn back_edge_through_an_inductive_unfold_is_valid() {
    let (goal, derivation) = successor_proof();
    assert_eq!(derivation.back_edges().count(), 1);

    let segment = &derivation.segments()[0];
    assert_eq!(segment.ancestor, derivation.root());
    assert!(segment.progressing);
    assert!(segment.marks[0].is_progress());

    let report = verify_with(&goal, &derivation, &UnfoldProgress).unwrap();
    assert_eq!(report.back_edges, 1);
    assert_eq!(report.cyclic_components, 1);
}

/// A cycle that never passes a progressing unfold, witnessed by its two nodes.
#[test]
fn non_progressing_cycle_is_rejected_with_its_two_nodes() {
    let (goal, derivation, root, child) = spinning_derivation();
    match verify(&goal, &derivation) {
        Verdict::Invalid(CyError::TraceConditionFailed { cycle }) => assert_eq!(cycle, vec![root, child]),
        other => panic!("unexpected verdict {other:?}"),
    }
}

#[test]
fn verification_is_repeatable() {
    let (goal, derivation) = successor_proof();
    assert!(verify(&goal, &derivation).is_valid());
    assert!(verify(&goal, &derivation).is_valid());

    let (goal, derivation, _, _) = spinning_derivation();
    assert!(verify(&goal, &derivation).is_invalid());
    assert!(verify(&goal, &derivation).is_invalid());
}

#[test]
fn derivations_without_back_edges_are_checked_locally_only() {
    // P ∧ Q ⊢ Q ∧ P
    let p = Proposition::apply("P", [v("a")]);
    let q = Proposition::apply("Q", [v("a")]);
    let goal = Sequent::new(Proposition::and(p.clone(), q.clone()), Proposition::and(q, p));

    let mut builder = DerivationBuilder::new();
    let root = builder.open_goal(goal.clone()).unwrap();
    let premises = builder.apply_rule(root, Rule::ConjunctionRight).unwrap();
    for premise in premises {
        // both premises are closed by the flattened-conjunct axiom
        builder.close_as_axiom(premise).unwrap();
    }
    let derivation = builder.finish().unwrap();

    let report = verify_with(&goal, &derivation, &UnfoldProgress).unwrap();
    assert_eq!(report.back_edges, 0);
    assert_eq!(report.cyclic_components, 0);
}

#[test]
fn guarded_coinduction_is_valid() {
    let goal = Sequent::goal(stream());
    let mut builder = DerivationBuilder::new();
    let root = builder.open_goal(goal.clone()).unwrap();

    // root -(unguarded)-> Unit ⊢ Unit ∧ S -(guard)-> Unit ⊢ S -(guarded)-> Unit ⊢ Unit ∧ S
    let step = one(builder.apply_rule(root, Rule::IterativeRight).unwrap());
    let halves = builder.apply_rule(step, Rule::ConjunctionRight).unwrap();
    builder.close_as_axiom(halves[0]).unwrap();
    let again = one(builder.apply_rule(halves[1], Rule::IterativeRight).unwrap());
    assert!(builder.node(again).unwrap().incoming.as_ref().unwrap().is_guarded());
    builder.close_as_back_edge(again, step, Substitution::new()).unwrap();

    let derivation = builder.finish().unwrap();
    assert!(verify(&goal, &derivation).is_valid());
}

#[test]
fn back_edges_must_reach_an_equal_ancestor() {
    let goal = Sequent::new(successors(), nat("x"));
    let mut builder = DerivationBuilder::new();
    let root = builder.open_goal(goal).unwrap();
    let unfolded = one(builder.apply_rule(root, Rule::InductiveRight).unwrap());

    let err = builder.close_as_back_edge(unfolded, root, Substitution::new()).unwrap_err();
    assert!(err.is_back_edge_mismatch());
    // the failed attempt leaves the node open
    assert_eq!(builder.open_nodes().collect::<Vec<_>>(), vec![unfolded]);
}

#[test]
fn verification_rejects_the_wrong_goal_and_open_leaves() {
    let (_, derivation) = successor_proof();
    let other = Sequent::new(successors(), nat("z"));
    assert!(matches!(
        verify(&other, &derivation),
        Verdict::Invalid(CyError::RootMismatch { .. })
    ));

    let goal = Sequent::goal(Proposition::apply("P", [v("a")]));
    let mut builder = DerivationBuilder::new();
    builder.open_goal(goal).unwrap();
    assert!(builder.finish().unwrap_err().is_incomplete_derivation());
}

#[test]
fn forked_builders_never_share_node_ids() {
    let goal = Sequent::new(successors(), nat("x"));
    let mut base = DerivationBuilder::new();
    let root = base.open_goal(goal).unwrap();

    let mut left = base.fork();
    let mut right = base.fork();
    let a = one(left.apply_rule(root, Rule::InductiveRight).unwrap());
    let b = one(right.apply_rule(root, Rule::InductiveRight).unwrap());
    assert_ne!(a, b);
    assert_eq!(left.sequent(a).unwrap(), right.sequent(b).unwrap());
}
