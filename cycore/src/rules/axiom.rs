use cyformal::sequent::Sequent;

/// Whether `sequent` holds without premises.
///
/// That is the case when the conclusion is `True`, the assumption is `False`, both sides are
/// alpha-equivalent, or one of the flattened conjuncts of the assumption is `False` or
/// alpha-equivalent to the conclusion.
pub fn is_axiom(sequent: &Sequent) -> bool {
    sequent.conclusion.is_truth()
        || sequent.assumption.is_falsity()
        || sequent.assumption == sequent.conclusion
        || sequent
            .assumption
            .conjuncts()
            .into_iter()
            .any(|h| h.is_falsity() || *h == sequent.conclusion)
}

#[cfg(test)]
mod tests {
    use cyformal::prop::Proposition;

    use super::*;

    fn nat(x: &str) -> Proposition {
        Proposition::apply("Nat", [Proposition::atom(x)])
    }

    #[test]
    fn axioms() {
        assert!(is_axiom(&Sequent::new(nat("x"), nat("x"))));
        assert!(is_axiom(&Sequent::goal(Proposition::truth())));
        assert!(is_axiom(&Sequent::new(Proposition::falsity(), nat("x"))));
        assert!(is_axiom(&Sequent::new(
            Proposition::and(nat("y"), Proposition::and(nat("z"), nat("x"))),
            nat("x")
        )));
        assert!(is_axiom(&Sequent::new(
            Proposition::and(nat("y"), Proposition::falsity()),
            nat("x")
        )));

        assert!(!is_axiom(&Sequent::new(nat("x"), nat("y"))));
        assert!(!is_axiom(&Sequent::new(Proposition::or(nat("x"), nat("y")), nat("x"))));
    }
}
