//! Alpha-equivalence, alpha-aware hashing and free-name analysis.
//!
//! Binding discipline
//! - A quantifier binds its variables in its body. A fixpoint quantifier additionally binds its
//!   fixpoint identifier in its body; the fixpoint arguments live in the enclosing scope.
//! - An atom occurrence (nullary or applied) refers to the innermost binder carrying the same
//!   name. Occurrences with no binder are *free names*; the distinguished `Unit` / `Void` atoms
//!   are constants and never count as free.
//!
//! Two propositions are alpha-equivalent when they have the same shape, bound occurrences point
//! to binders at the same position, and free occurrences carry the same name.
//! [`free_renaming`] relaxes the last condition: free nullary names may differ as long as a
//! consistent bijection relates them; the bijection is returned.
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, hash_map::DefaultHasher},
    hash::{Hash, Hasher},
};

use smallvec::SmallVec;

use crate::{
    atom::Atom,
    prop::{Proposition, Quantifier},
};

/// Bijection between the free names of two propositions, from left to right.
pub type Renaming = BTreeMap<Atom, Atom>;

/// Lexical scope: a stack of binder names. The position of a binder is its level.
#[derive(Default)]
pub(crate) struct Scope<'a> {
    frames: SmallVec<[&'a Atom; 16]>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Level of the innermost binder named `atom`.
    #[inline]
    pub(crate) fn lookup(&self, atom: &Atom) -> Option<usize> {
        self.frames.iter().rposition(|b| *b == atom)
    }

    /// Push the binders of `q` (fixpoint identifier first, then the variables).
    pub(crate) fn enter(&mut self, q: &'a Quantifier) {
        if let Some(fixpoint) = q.fixpoint() {
            self.frames.push(&fixpoint.name);
        }
        self.frames.extend(q.vars().iter());
    }

    pub(crate) fn leave(&mut self, q: &Quantifier) {
        let count = q.vars().len() + usize::from(q.fixpoint().is_some());
        self.frames.truncate(self.frames.len() - count);
    }
}

/// Policy used to compare free occurrences during a parallel traversal.
trait FreeMatcher {
    fn matches(&mut self, a: &Atom, b: &Atom, nullary: bool) -> bool;
}

/// Free names must coincide.
struct Exact;

impl FreeMatcher for Exact {
    #[inline]
    fn matches(&mut self, a: &Atom, b: &Atom, _nullary: bool) -> bool {
        a == b
    }
}

/// Free nullary names are related by a consistent bijection; applied heads and constants must
/// coincide.
#[derive(Default)]
struct Bijection {
    forward: Renaming,
    backward: BTreeMap<Atom, Atom>,
}

impl FreeMatcher for Bijection {
    fn matches(&mut self, a: &Atom, b: &Atom, nullary: bool) -> bool {
        if !nullary || a.is_constant() || b.is_constant() {
            return a == b;
        }

        match (self.forward.get(a), self.backward.get(b)) {
            (Some(fa), Some(bb)) => fa == b && bb == a,
            (None, None) => {
                self.forward.insert(a.clone(), b.clone());
                self.backward.insert(b.clone(), a.clone());
                true
            }
            _ => false,
        }
    }
}

fn equivalent<'a, M: FreeMatcher>(
    a: &'a Proposition,
    b: &'a Proposition,
    sa: &mut Scope<'a>,
    sb: &mut Scope<'a>,
    matcher: &mut M,
) -> bool {
    match (a, b) {
        (Proposition::Quantifier(qa), Proposition::Quantifier(qb)) => {
            if qa.kind() != qb.kind() || qa.vars().len() != qb.vars().len() {
                return false;
            }
            match (qa.fixpoint(), qb.fixpoint()) {
                (Some(fa), Some(fb)) => {
                    if fa.args.len() != fb.args.len()
                        || !fa
                            .args
                            .iter()
                            .zip(fb.args.iter())
                            .all(|(x, y)| equivalent(x, y, sa, sb, matcher))
                    {
                        return false;
                    }
                }
                (None, None) => {}
                _ => return false,
            }

            sa.enter(qa);
            sb.enter(qb);
            let result = equivalent(qa.body(), qb.body(), sa, sb, matcher);
            sa.leave(qa);
            sb.leave(qb);
            result
        }
        (Proposition::Connective(ca), Proposition::Connective(cb)) => {
            ca.kind() == cb.kind()
                && ca.operands().len() == cb.operands().len()
                && ca
                    .operands()
                    .iter()
                    .zip(cb.operands().iter())
                    .all(|(x, y)| equivalent(x, y, sa, sb, matcher))
        }
        (Proposition::Atomic(aa), Proposition::Atomic(ab)) => {
            if aa.args().len() != ab.args().len() {
                return false;
            }
            let heads = match (sa.lookup(aa.atom()), sb.lookup(ab.atom())) {
                (Some(la), Some(lb)) => la == lb,
                (None, None) => matcher.matches(aa.atom(), ab.atom(), aa.is_nullary()),
                _ => false,
            };
            heads
                && aa
                    .args()
                    .iter()
                    .zip(ab.args().iter())
                    .all(|(x, y)| equivalent(x, y, sa, sb, matcher))
        }
        _ => false,
    }
}

/// Structural equality up to a consistent renaming of bound names.
pub fn alpha_equivalent(a: &Proposition, b: &Proposition) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    equivalent(a, b, &mut Scope::new(), &mut Scope::new(), &mut Exact)
}

/// Like [`alpha_equivalent`], but free nullary names of `a` may be renamed into those of `b`
/// through a consistent bijection, which is returned.
pub fn free_renaming(a: &Proposition, b: &Proposition) -> Option<Renaming> {
    free_renaming_all([(a, b)])
}

/// [`free_renaming`] over several pairs sharing one bijection (e.g. both sides of a sequent).
pub fn free_renaming_all<'a, I>(pairs: I) -> Option<Renaming>
where
    I: IntoIterator<Item = (&'a Proposition, &'a Proposition)>,
{
    let mut matcher = Bijection::default();
    for (a, b) in pairs {
        if !equivalent(a, b, &mut Scope::new(), &mut Scope::new(), &mut matcher) {
            return None;
        }
    }
    Some(matcher.forward)
}

/// How free nullary names contribute to a hash.
enum FreeHashing {
    /// By name; consistent with [`alpha_equivalent`].
    ByName,
    /// By first-occurrence index; consistent with [`free_renaming`].
    ByOccurrence(HashMap<Atom, usize>),
}

fn hash_rec<'a, H: Hasher>(
    p: &'a Proposition,
    scope: &mut Scope<'a>,
    free: &mut FreeHashing,
    state: &mut H,
) {
    match p {
        Proposition::Quantifier(q) => {
            0u8.hash(state);
            q.kind().hash(state);
            q.vars().len().hash(state);
            match q.fixpoint() {
                Some(f) => {
                    1u8.hash(state);
                    f.args.len().hash(state);
                    for arg in &f.args {
                        hash_rec(arg, scope, free, state);
                    }
                }
                None => 0u8.hash(state),
            }
            scope.enter(q);
            hash_rec(q.body(), scope, free, state);
            scope.leave(q);
        }
        Proposition::Connective(c) => {
            1u8.hash(state);
            c.kind().hash(state);
            c.operands().len().hash(state);
            for op in c.operands() {
                hash_rec(op, scope, free, state);
            }
        }
        Proposition::Atomic(a) => {
            2u8.hash(state);
            a.args().len().hash(state);
            match scope.lookup(a.atom()) {
                Some(level) => {
                    0u8.hash(state);
                    level.hash(state);
                }
                None => match free {
                    FreeHashing::ByOccurrence(seen)
                        if a.is_nullary() && !a.atom().is_constant() =>
                    {
                        1u8.hash(state);
                        let next = seen.len();
                        seen.entry(a.atom().clone()).or_insert(next).hash(state);
                    }
                    _ => {
                        2u8.hash(state);
                        a.atom().hash(state);
                    }
                },
            }
            for arg in a.args() {
                hash_rec(arg, scope, free, state);
            }
        }
    }
}

impl PartialEq for Proposition {
    fn eq(&self, other: &Self) -> bool {
        alpha_equivalent(self, other)
    }
}

impl Eq for Proposition {}

impl Hash for Proposition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_rec(self, &mut Scope::new(), &mut FreeHashing::ByName, state);
    }
}

/// Hash of a sequence of propositions that is invariant under consistent renaming of free
/// names. Equal [`free_renaming_all`] inputs always have equal shape hashes.
pub fn shape_hash<'a, I>(props: I) -> u64
where
    I: IntoIterator<Item = &'a Proposition>,
{
    let mut state = DefaultHasher::new();
    let mut free = FreeHashing::ByOccurrence(HashMap::new());
    for p in props {
        hash_rec(p, &mut Scope::new(), &mut free, &mut state);
    }
    state.finish()
}

fn collect_free<'a>(
    p: &'a Proposition,
    scope: &mut Scope<'a>,
    nullary_only: bool,
    out: &mut BTreeSet<Atom>,
) {
    match p {
        Proposition::Quantifier(q) => {
            if let Some(f) = q.fixpoint() {
                for arg in &f.args {
                    collect_free(arg, scope, nullary_only, out);
                }
            }
            scope.enter(q);
            collect_free(q.body(), scope, nullary_only, out);
            scope.leave(q);
        }
        Proposition::Connective(c) => {
            for op in c.operands() {
                collect_free(op, scope, nullary_only, out);
            }
        }
        Proposition::Atomic(a) => {
            if scope.lookup(a.atom()).is_none()
                && !a.atom().is_constant()
                && (a.is_nullary() || !nullary_only)
            {
                out.insert(a.atom().clone());
            }
            for arg in a.args() {
                collect_free(arg, scope, nullary_only, out);
            }
        }
    }
}

fn collect_names(p: &Proposition, out: &mut BTreeSet<Atom>) {
    match p {
        Proposition::Quantifier(q) => {
            out.extend(q.vars().iter().cloned());
            if let Some(f) = q.fixpoint() {
                out.insert(f.name.clone());
                for arg in &f.args {
                    collect_names(arg, out);
                }
            }
            collect_names(q.body(), out);
        }
        Proposition::Connective(c) => {
            for op in c.operands() {
                collect_names(op, out);
            }
        }
        Proposition::Atomic(a) => {
            out.insert(a.atom().clone());
            for arg in a.args() {
                collect_names(arg, out);
            }
        }
    }
}

/// Binder kinds tracked by the well-formedness check: fixpoints remember their arity.
fn check_well_formed<'a>(p: &'a Proposition, binders: &mut Vec<(&'a Atom, Option<usize>)>) -> bool {
    match p {
        Proposition::Quantifier(q) => {
            if let Some(f) = q.fixpoint() {
                if !f.args.iter().all(|a| check_well_formed(a, binders)) {
                    return false;
                }
                binders.push((&f.name, Some(q.vars().len())));
            }
            binders.extend(q.vars().iter().map(|v| (v, None)));
            let ok = check_well_formed(q.body(), binders);
            let count = q.vars().len() + usize::from(q.fixpoint().is_some());
            binders.truncate(binders.len() - count);
            ok
        }
        Proposition::Connective(c) => c.operands().iter().all(|op| check_well_formed(op, binders)),
        Proposition::Atomic(a) => {
            let binder_ok = match binders.iter().rev().find(|(name, _)| *name == a.atom()) {
                Some((_, Some(arity))) => *arity == a.args().len(),
                Some((_, None)) => a.is_nullary(),
                None => true,
            };
            binder_ok && a.args().iter().all(|arg| check_well_formed(arg, binders))
        }
    }
}

impl Proposition {
    /// Free names (nullary names and applied heads without a binder), constants excluded.
    pub fn free_names(&self) -> BTreeSet<Atom> {
        let mut out = BTreeSet::new();
        collect_free(self, &mut Scope::new(), false, &mut out);
        out
    }

    /// Free nullary names only: the individuals a witness can be drawn from.
    pub fn free_variables(&self) -> BTreeSet<Atom> {
        let mut out = BTreeSet::new();
        collect_free(self, &mut Scope::new(), true, &mut out);
        out
    }

    /// Every name occurring anywhere in the tree, binders included.
    pub fn names(&self) -> BTreeSet<Atom> {
        let mut out = BTreeSet::new();
        collect_names(self, &mut out);
        out
    }

    /// Whether every bound variable occurs nullary and every recursive reference to a fixpoint
    /// identifier is applied to as many arguments as the fixpoint has parameters.
    pub fn is_well_formed(&self) -> bool {
        check_well_formed(self, &mut Vec::new())
    }

    /// Whether `name` occurs free.
    pub fn has_free(&self, name: &Atom) -> bool {
        self.free_names().contains(name)
    }
}
