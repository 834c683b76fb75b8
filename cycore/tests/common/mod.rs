#![allow(dead_code)]

use cycore::cyformal::prelude::*;
use cycore::prelude::*;

pub fn v(name: &str) -> Proposition {
    Proposition::atom(name)
}

/// `μNat(n). Zero(n) ∨ ∃y. Nat(y) ∧ Succ(n, y)`, taken at `arg`.
pub fn nat(arg: &str) -> Proposition {
    let body = Proposition::or(
        Proposition::apply("Zero", [v("n")]),
        Proposition::exists(
            ["y"],
            Proposition::and(
                Proposition::apply("Nat", [v("y")]),
                Proposition::apply("Succ", [v("n"), v("y")]),
            ),
        )
        .unwrap(),
    );
    Proposition::inductive("Nat", ["n"], body, [v(arg)]).unwrap()
}

/// `∀a b. Succ(a, b)`
pub fn successors() -> Proposition {
    Proposition::forall(["a", "b"], Proposition::apply("Succ", [v("a"), v("b")])).unwrap()
}

/// `νS(x). S(x)` taken at `t`: unfolds to itself.
pub fn spin() -> Proposition {
    Proposition::iterative("S", ["x"], Proposition::apply("S", [v("x")]), [v("t")]).unwrap()
}

/// `νS(x). Unit ∧ S(x)` taken at `t`: every unfold is followed by a guard.
pub fn stream() -> Proposition {
    let body = Proposition::and(Proposition::truth(), Proposition::apply("S", [v("x")]));
    Proposition::iterative("S", ["x"], body, [v("t")]).unwrap()
}

pub fn one(children: impl IntoIterator<Item = NodeId>) -> NodeId {
    let children: Vec<NodeId> = children.into_iter().collect();
    assert_eq!(children.len(), 1, "expected a single premise");
    children[0]
}

/// `∀a b. Succ(a, b) ⊢ Nat(x)` proven by unfolding, picking the successor case with witness
/// `y` and closing `Nat(y)` by a back-edge to the root.
pub fn successor_proof() -> (Sequent, Derivation) {
    let goal = Sequent::new(successors(), nat("x"));
    let mut builder = DerivationBuilder::new();
    let root = builder.open_goal(goal.clone()).unwrap();

    let unfolded = one(builder.apply_rule(root, Rule::InductiveRight).unwrap());
    let successor = one(builder.apply_rule(unfolded, Rule::DisjunctionRight { choice: 1 }).unwrap());
    let pair = one(
        builder
            .apply_rule(successor, Rule::ExistentialRight { witnesses: vec![v("y")] })
            .unwrap(),
    );
    let premises = builder.apply_rule(pair, Rule::ConjunctionRight).unwrap();
    assert_eq!(premises.len(), 2);

    let sigma: Substitution = [(Atom::new("x"), v("y"))].into_iter().collect();
    builder.close_as_back_edge(premises[0], root, sigma).unwrap();

    let instance = one(
        builder
            .apply_rule(premises[1], Rule::UniversalLeft { witnesses: vec![v("x"), v("y")] })
            .unwrap(),
    );
    builder.close_as_axiom(instance).unwrap();

    (goal, builder.finish().unwrap())
}

/// `Unit ⊢ νS(x). S(x)` closed by a back-edge right after an unguarded unfold.
pub fn spinning_derivation() -> (Sequent, Derivation, NodeId, NodeId) {
    let goal = Sequent::goal(spin());
    let mut builder = DerivationBuilder::new();
    let root = builder.open_goal(goal.clone()).unwrap();
    let child = one(builder.apply_rule(root, Rule::IterativeRight).unwrap());
    builder.close_as_back_edge(child, root, Substitution::new()).unwrap();
    (goal, builder.finish().unwrap(), root, child)
}
