use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use cyformal::prelude::*;

fn v(name: &str) -> Proposition {
    Proposition::atom(name)
}

fn hash_of(p: &Proposition) -> u64 {
    let mut state = DefaultHasher::new();
    p.hash(&mut state);
    state.finish()
}

/// `Nat(x) := Zero(x) | exists y. Nat(y) & Succ(x, y)`, taken at `arg`.
fn nat(param: &str, witness: &str, arg: Proposition) -> Proposition {
    let body = Proposition::or(
        Proposition::apply("Zero", [v(param)]),
        Proposition::exists(
            [witness],
            Proposition::and(
                Proposition::apply("Nat", [v(witness)]),
                Proposition::apply("Succ", [v(param), v(witness)]),
            ),
        )
        .unwrap(),
    );
    Proposition::inductive("Nat", [param], body, [arg]).unwrap()
}

#[test]
fn bound_names_do_not_matter() {
    let a = nat("x", "y", v("n"));
    let b = nat("u", "w", v("n"));
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn free_names_matter() {
    let a = nat("x", "y", v("n"));
    let b = nat("x", "y", v("m"));
    assert_ne!(a, b);

    let renaming = free_renaming(&a, &b).unwrap();
    assert_eq!(renaming.get(&Atom::new("n")), Some(&Atom::new("m")));
    assert_eq!(shape_hash([&a]), shape_hash([&b]));
}

#[test]
fn fixpoint_identifiers_are_bound() {
    let body_n = Proposition::apply("N", [v("x")]);
    let body_m = Proposition::apply("M", [v("x")]);
    let a = Proposition::iterative("N", ["x"], body_n, [v("t")]).unwrap();
    let b = Proposition::iterative("M", ["x"], body_m, [v("t")]).unwrap();
    assert_eq!(a, b);

    // Same shape but least instead of greatest fixpoint.
    let c = Proposition::inductive("N", ["x"], Proposition::apply("N", [v("x")]), [v("t")]).unwrap();
    assert_ne!(a, c);
}

#[test]
fn shadowing_is_respected() {
    // forall x. exists x. P(x)  vs  forall y. exists x. P(x)  vs  forall x. exists y. P(x)
    let inner = |outer: &str, inner: &str, used: &str| {
        Proposition::forall(
            [outer],
            Proposition::exists([inner], Proposition::apply("P", [v(used)])).unwrap(),
        )
        .unwrap()
    };
    assert_eq!(inner("x", "x", "x"), inner("y", "x", "x"));
    assert_ne!(inner("x", "x", "x"), inner("x", "y", "x"));
}

#[test]
fn connective_arity_and_order_matter() {
    let ab = Proposition::and(v("a"), v("b"));
    let ba = Proposition::and(v("b"), v("a"));
    let abc = Proposition::connective(ConnectiveKind::Conjunction, [v("a"), v("b"), v("c")]).unwrap();
    assert_ne!(ab, ba);
    assert_ne!(ab, abc);
    assert_ne!(ab, Proposition::or(v("a"), v("b")));
}

#[test]
fn renaming_must_be_a_bijection() {
    let a = Proposition::apply("R", [v("x"), v("y")]);
    let b = Proposition::apply("R", [v("z"), v("z")]);
    assert!(free_renaming(&a, &b).is_none());
    assert!(free_renaming(&b, &a).is_none());
}
