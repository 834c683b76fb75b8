//! Search for a proof that every name with a successor relation is a natural number, then
//! print the derivation record.
//!
//! The search budgets are read from `$CY_SEARCH_CONFIG` (or the platform configuration
//! directory) when the file exists.
use cycore::cyformal::prelude::*;
use cycore::prelude::*;

fn v(name: &str) -> Proposition {
    Proposition::atom(name)
}

fn main() -> CyResult<()> {
    let body = Proposition::or(
        Proposition::apply("Zero", [v("n")]),
        Proposition::exists(
            ["y"],
            Proposition::and(
                Proposition::apply("Nat", [v("y")]),
                Proposition::apply("Succ", [v("n"), v("y")]),
            ),
        )?,
    );
    let nat = Proposition::inductive("Nat", ["n"], body, [v("x")])?;
    let successors = Proposition::forall(["a", "b"], Proposition::apply("Succ", [v("a"), v("b")]))?;
    let goal = Sequent::new(successors, nat);

    let config = SearchConfig::load_or_default()?;
    println!("goal: {goal}");
    match search(&goal, &config)? {
        SearchOutcome::Proof(derivation) => {
            for segment in derivation.segments() {
                println!(
                    "cycle {} -> {} over {} edge(s)",
                    segment.bud,
                    segment.ancestor,
                    segment.marks.len()
                );
            }
            println!("{}", derivation.to_record().to_json()?);
        }
        SearchOutcome::Exhausted(reason) => println!("no proof: {reason}"),
    }
    Ok(())
}
