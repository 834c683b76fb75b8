//! Single-assumption sequents `A ⊢ B`.
//!
//! Several hypotheses are encoded as a conjunction on the left, and several alternatives as a
//! disjunction on the right. Equality and hashing are lifted from [`Proposition`], so two
//! sequents are equal exactly when both sides are alpha-equivalent.
use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    alpha::{self, Renaming},
    atom::Atom,
    error::FormalError,
    prop::Proposition,
    subst::{Substitution, substitute},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sequent {
    pub assumption: Proposition,
    pub conclusion: Proposition,
}

impl Sequent {
    pub fn new(assumption: Proposition, conclusion: Proposition) -> Self {
        Self {
            assumption,
            conclusion,
        }
    }

    /// `True ⊢ conclusion`, a goal without hypotheses.
    pub fn goal(conclusion: Proposition) -> Self {
        Self::new(Proposition::truth(), conclusion)
    }

    /// Same assumption, another conclusion.
    pub fn with_conclusion(&self, conclusion: Proposition) -> Self {
        Self::new(self.assumption.clone(), conclusion)
    }

    /// Same conclusion, another assumption.
    pub fn with_assumption(&self, assumption: Proposition) -> Self {
        Self::new(assumption, self.conclusion.clone())
    }

    /// Free names occurring on either side.
    pub fn free_names(&self) -> BTreeSet<Atom> {
        let mut names = self.assumption.free_names();
        names.extend(self.conclusion.free_names());
        names
    }

    /// Free nullary names occurring on either side.
    pub fn free_variables(&self) -> BTreeSet<Atom> {
        let mut names = self.assumption.free_variables();
        names.extend(self.conclusion.free_variables());
        names
    }

    /// Every name occurring on either side, bound or free.
    pub fn names(&self) -> BTreeSet<Atom> {
        let mut names = self.assumption.names();
        names.extend(self.conclusion.names());
        names
    }

    pub fn is_well_formed(&self) -> bool {
        self.assumption.is_well_formed() && self.conclusion.is_well_formed()
    }

    /// Apply `sigma` to both sides.
    pub fn substitute(&self, sigma: &Substitution) -> Result<Self, FormalError> {
        Ok(Self::new(
            substitute(&self.assumption, sigma)?,
            substitute(&self.conclusion, sigma)?,
        ))
    }

    /// A bijective renaming of free nullary names sending `self` onto `other`, consistent
    /// across both sides.
    pub fn free_renaming(&self, other: &Sequent) -> Option<Renaming> {
        alpha::free_renaming_all([
            (&self.assumption, &other.assumption),
            (&self.conclusion, &other.conclusion),
        ])
    }

    /// Hash invariant under alpha-equivalence and under bijective renaming of free nullary
    /// names.
    pub fn shape_hash(&self) -> u64 {
        alpha::shape_hash([&self.assumption, &self.conclusion])
    }
}
