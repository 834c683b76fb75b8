//! Capture-avoiding substitution and fixpoint unfolding.
//!
//! Role
//! - [`substitute`] replaces free occurrences of names by propositions, all bindings at once.
//!   Any binder of the input that would capture a free name of a replacement is renamed to a
//!   fresh name drawn from a [`NameSupply`].
//! - [`unfold`] performs one fixpoint unfolding step: the body of the fixpoint with its
//!   parameters instantiated by the arguments and each recursive reference replaced by the
//!   fixpoint itself, in a single capture-avoiding pass.
//!
//! Untouched subtrees are shared with the input, so substitution allocates proportionally to
//! the rewritten spine only.
//!
//! Example
//! ```
//! use cyformal::prelude::*;
//!
//! // (exists y. R(x, y))[x := y] renames the bound y
//! let body = Proposition::apply("R", [Proposition::atom("x"), Proposition::atom("y")]);
//! let p = Proposition::exists(["y"], body).unwrap();
//! let sigma = Substitution::from_iter([(Atom::new("x"), Proposition::atom("y"))]);
//! let out = substitute(&p, &sigma).unwrap();
//! assert!(out.has_free(&Atom::new("y")));
//! assert_eq!(out.as_quantifier().unwrap().vars().len(), 1);
//! ```
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    alpha::Renaming,
    atom::Atom,
    error::FormalError,
    prop::{Atomic, Connective, Fixpoint, Proposition, Quantifier},
};

/// Simultaneous substitution of free names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Substitution(BTreeMap<Atom, Proposition>);

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, returning the previous binding.
    pub fn insert<A: Into<Atom>>(&mut self, name: A, value: Proposition) -> Option<Proposition> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &Atom) -> Option<&Proposition> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Atom, &Proposition)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every binding maps a name to itself.
    pub fn is_identity(&self) -> bool {
        self.0
            .iter()
            .all(|(k, v)| v.as_name().is_some_and(|n| n == k))
    }

    /// Apply this substitution to `prop`.
    pub fn apply(&self, prop: &Proposition) -> Result<Proposition, FormalError> {
        substitute(prop, self)
    }
}

impl FromIterator<(Atom, Proposition)> for Substitution {
    fn from_iter<T: IntoIterator<Item = (Atom, Proposition)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&Renaming> for Substitution {
    fn from(value: &Renaming) -> Self {
        value
            .iter()
            .map(|(from, to)| (from.clone(), Proposition::atom(to.clone())))
            .collect()
    }
}

/// Counter-driven source of names disjoint from a reserved set.
#[derive(Debug, Clone, Default)]
pub struct NameSupply {
    used: BTreeSet<Atom>,
    counter: u32,
}

impl NameSupply {
    /// A supply avoiding every name in `reserved`.
    pub fn new<I: IntoIterator<Item = Atom>>(reserved: I) -> Self {
        Self {
            used: reserved.into_iter().collect(),
            counter: 0,
        }
    }

    /// Reserve additional names.
    pub fn reserve<I: IntoIterator<Item = Atom>>(&mut self, names: I) {
        self.used.extend(names);
    }

    /// Produce a name derived from `base` that was never reserved nor produced before.
    pub fn fresh(&mut self, base: &Atom) -> Result<Atom, FormalError> {
        let stem = match base.name().rsplit_once('_') {
            Some((stem, suffix))
                if !stem.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
            {
                stem
            }
            _ => base.name(),
        };

        loop {
            self.counter = self
                .counter
                .checked_add(1)
                .ok_or_else(|| FormalError::SubstitutionCapture { name: base.clone() })?;
            let candidate = Atom::new(format!("{stem}_{}", self.counter));
            if !candidate.is_constant() && self.used.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }
    }
}

/// What a bound name is replaced by.
#[derive(Clone)]
enum Replacement {
    Term(Proposition),
    /// Recursive reference to a fixpoint: rebuilt as the fixpoint taken at the reference's
    /// arguments.
    Fixpoint(Arc<Quantifier>),
}

struct Substituter {
    supply: NameSupply,
    /// Free names of every replacement; binders with one of these names are renamed.
    avoid: BTreeSet<Atom>,
}

impl Substituter {
    fn run_all(
        &mut self,
        props: &[Proposition],
        map: &BTreeMap<Atom, Replacement>,
    ) -> Result<(Vec<Proposition>, bool), FormalError> {
        let mut changed = false;
        let mut out = Vec::with_capacity(props.len());
        for p in props {
            let q = self.run(p, map)?;
            changed |= !q.ptr_eq(p);
            out.push(q);
        }
        Ok((out, changed))
    }

    fn run(
        &mut self,
        prop: &Proposition,
        map: &BTreeMap<Atom, Replacement>,
    ) -> Result<Proposition, FormalError> {
        if map.is_empty() {
            return Ok(prop.clone());
        }

        match prop {
            Proposition::Atomic(a) => {
                let (args, changed) = self.run_all(a.args(), map)?;
                match map.get(a.atom()) {
                    None if !changed => Ok(prop.clone()),
                    None => Ok(Atomic::new(a.atom().clone(), args).into()),
                    Some(Replacement::Term(term)) if a.is_nullary() => Ok(term.clone()),
                    Some(Replacement::Term(term)) => {
                        // Applied bound name: only a renaming can move the head.
                        let head = term.as_name().unwrap_or(a.atom()).clone();
                        Ok(Atomic::new(head, args).into())
                    }
                    Some(Replacement::Fixpoint(q)) => {
                        if args.len() != q.vars().len() {
                            return Err(FormalError::MalformedFixpoint {
                                kind: q.kind(),
                                reason: format!(
                                    "recursive reference `{}` has {} argument(s), expected {}",
                                    a.atom(),
                                    args.len(),
                                    q.vars().len()
                                ),
                            });
                        }
                        let name = a.atom().clone();
                        Ok(q.rebuild(q.vars().iter().cloned().collect(), q.body().clone(), Some(Fixpoint { name, args }))
                            .into())
                    }
                }
            }
            Proposition::Connective(c) => {
                let (operands, changed) = self.run_all(c.operands(), map)?;
                if !changed {
                    return Ok(prop.clone());
                }
                Connective::new(c.kind(), operands).map(Into::into)
            }
            Proposition::Quantifier(q) => {
                let (args, args_changed) = match q.fixpoint() {
                    Some(f) => self.run_all(&f.args, map)?,
                    None => (Vec::new(), false),
                };
                let fixpoint_name = q.fixpoint().map(|f| &f.name);

                let mut inner: BTreeMap<Atom, Replacement> = map
                    .iter()
                    .filter(|(name, _)| !q.vars().contains(name) && fixpoint_name != Some(*name))
                    .map(|(name, replacement)| (name.clone(), replacement.clone()))
                    .collect();

                let mut name = fixpoint_name.cloned();
                let mut vars: SmallVec<[Atom; 2]> = q.vars().iter().cloned().collect();
                let mut renamed = false;
                if !inner.is_empty() {
                    for binder in name.iter_mut().chain(vars.iter_mut()) {
                        if self.avoid.contains(&*binder) {
                            let fresh = self.supply.fresh(binder)?;
                            inner.insert(binder.clone(), Replacement::Term(Proposition::atom(fresh.clone())));
                            *binder = fresh;
                            renamed = true;
                        }
                    }
                }

                let body = self.run(q.body(), &inner)?;
                if !renamed && !args_changed && body.ptr_eq(q.body()) {
                    return Ok(prop.clone());
                }

                let fixpoint = name.map(|name| Fixpoint { name, args });
                Ok(q.rebuild(vars, body, fixpoint).into())
            }
        }
    }
}

/// Replace the free occurrences of every name bound by `bindings`, simultaneously and without
/// capturing the free names of the replacements.
///
/// Bindings of the distinguished constants are ignored.
pub fn substitute(prop: &Proposition, bindings: &Substitution) -> Result<Proposition, FormalError> {
    let map: BTreeMap<Atom, Replacement> = bindings
        .iter()
        .filter(|(name, _)| !name.is_constant())
        .map(|(name, value)| (name.clone(), Replacement::Term(value.clone())))
        .collect();
    if map.is_empty() {
        return Ok(prop.clone());
    }

    let mut avoid = BTreeSet::new();
    let mut supply = NameSupply::new(prop.names());
    for (name, value) in bindings.iter() {
        avoid.extend(value.free_names());
        supply.reserve(value.names());
        supply.reserve([name.clone()]);
    }

    Substituter { supply, avoid }.run(prop, &map)
}

/// Unfold a fixpoint quantifier by one step.
///
/// For `Q[N](x1..xn). B` taken at `(t1..tn)` the result is `B` with every `xi` replaced by
/// `ti` and every recursive reference `N(s1..sn)` replaced by `Q[N](x1..xn). B` taken at
/// `(s1..sn)`.
pub fn unfold(q: &Arc<Quantifier>) -> Result<Proposition, FormalError> {
    let fixpoint = q.fixpoint().ok_or_else(|| FormalError::MalformedFixpoint {
        kind: q.kind(),
        reason: "only inductive and iterative quantifiers can be unfolded".to_string(),
    })?;

    let mut map: BTreeMap<Atom, Replacement> = q
        .vars()
        .iter()
        .cloned()
        .zip(fixpoint.args.iter().cloned().map(Replacement::Term))
        .collect();
    map.insert(fixpoint.name.clone(), Replacement::Fixpoint(Arc::clone(q)));

    // Free names of the definition itself, as inserted at recursive references.
    let mut avoid = q.body().free_names();
    avoid.remove(&fixpoint.name);
    for var in q.vars() {
        avoid.remove(var);
    }
    let mut supply = NameSupply::new(q.body().names());
    supply.reserve([fixpoint.name.clone()]);
    supply.reserve(q.vars().iter().cloned());
    for arg in &fixpoint.args {
        avoid.extend(arg.free_names());
        supply.reserve(arg.names());
    }

    Substituter { supply, avoid }.run(q.body(), &map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alpha::alpha_equivalent;

    fn var(name: &str) -> Proposition {
        Proposition::atom(name)
    }

    #[test]
    fn substitution_is_simultaneous() {
        let p = Proposition::apply("R", [var("x"), var("y")]);
        let sigma = Substitution::from_iter([(Atom::new("x"), var("y")), (Atom::new("y"), var("x"))]);
        let out = substitute(&p, &sigma).unwrap();
        assert_eq!(out, Proposition::apply("R", [var("y"), var("x")]));
    }

    #[test]
    fn bound_occurrences_are_untouched() {
        let p = Proposition::forall(["x"], Proposition::apply("P", [var("x")])).unwrap();
        let sigma = Substitution::from_iter([(Atom::new("x"), var("c"))]);
        let out = substitute(&p, &sigma).unwrap();
        assert!(out.ptr_eq(&p));
    }

    #[test]
    fn binders_are_renamed_to_avoid_capture() {
        let p = Proposition::exists(["y"], Proposition::apply("R", [var("x"), var("y")])).unwrap();
        let sigma = Substitution::from_iter([(Atom::new("x"), var("y"))]);
        let out = substitute(&p, &sigma).unwrap();

        let q = out.as_quantifier().unwrap();
        assert_ne!(q.vars()[0], Atom::new("y"));
        let expected = Proposition::exists(["z"], Proposition::apply("R", [var("y"), var("z")])).unwrap();
        assert!(alpha_equivalent(&out, &expected));
    }

    #[test]
    fn fresh_names_strip_numeric_suffixes() {
        let mut supply = NameSupply::new([Atom::new("x_1")]);
        assert_eq!(supply.fresh(&Atom::new("x_7")).unwrap(), Atom::new("x_2"));
        assert_eq!(supply.fresh(&Atom::new("x")).unwrap(), Atom::new("x_3"));
    }

    #[test]
    fn unfold_replaces_parameters_and_recursive_references() {
        // Nat(n) := Zero(n) | exists y. Nat(y) & Succ(n, y), taken at `a`
        let body = Proposition::or(
            Proposition::apply("Zero", [var("n")]),
            Proposition::exists(
                ["y"],
                Proposition::and(
                    Proposition::apply("Nat", [var("y")]),
                    Proposition::apply("Succ", [var("n"), var("y")]),
                ),
            )
            .unwrap(),
        );
        let nat = Proposition::inductive("Nat", ["n"], body.clone(), [var("a")]).unwrap();
        let unfolded = unfold(nat.as_quantifier_arc().unwrap()).unwrap();

        let nat_y = Proposition::inductive("Nat", ["n"], body, [var("y")]).unwrap();
        let expected = Proposition::or(
            Proposition::apply("Zero", [var("a")]),
            Proposition::exists(
                ["y"],
                Proposition::and(nat_y, Proposition::apply("Succ", [var("a"), var("y")])),
            )
            .unwrap(),
        );
        assert_eq!(unfolded, expected);
    }

    #[test]
    fn unfold_avoids_capturing_definition_free_names() {
        // S(n) := exists k. S(k) & Q(n), taken at `k`
        let body = Proposition::exists(
            ["k"],
            Proposition::and(Proposition::apply("S", [var("k")]), Proposition::apply("Q", [var("n")])),
        )
        .unwrap();
        let s = Proposition::iterative("S", ["n"], body, [var("k")]).unwrap();
        let unfolded = unfold(s.as_quantifier_arc().unwrap()).unwrap();

        // The argument `k` must stay free after unfolding.
        assert!(unfolded.has_free(&Atom::new("k")));
    }
}
