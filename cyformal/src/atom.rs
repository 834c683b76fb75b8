//! Named atoms.
//!
//! Role
//! - An [`Atom`] is the only leaf of the term model: predicate symbols, constants, bound
//!   variables and fixpoint identifiers are all atoms.
//! - Atoms are content-addressed: equality, ordering and hashing only look at the name, and
//!   cloning an atom only bumps a reference count.
//!
//! Two atoms are distinguished: [`Atom::truth`] (named `Unit`) is trivially provable and
//! [`Atom::falsity`] (named `Void`) is trivially refutable.
use std::{fmt, sync::Arc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name of the trivially provable atom.
pub const TRUE_NAME: &str = "Unit";

/// Name of the trivially refutable atom.
pub const FALSE_NAME: &str = "Void";

/// A named, immutable and cheaply clonable symbol.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Atom(Arc<str>);

impl Atom {
    /// Create an atom from any string-like name.
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The distinguished `True` atom.
    pub fn truth() -> Self {
        Self::new(TRUE_NAME)
    }

    /// The distinguished `False` atom.
    pub fn falsity() -> Self {
        Self::new(FALSE_NAME)
    }

    /// Name of the atom.
    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_truth(&self) -> bool {
        &*self.0 == TRUE_NAME
    }

    #[inline]
    pub fn is_falsity(&self) -> bool {
        &*self.0 == FALSE_NAME
    }

    /// Whether this atom is one of the two distinguished constants. Those are never renamed
    /// nor substituted.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.is_truth() || self.is_falsity()
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::new(value)
    }
}

impl From<String> for Atom {
    fn from(value: String) -> Self {
        Atom(Arc::from(value))
    }
}

impl From<&Atom> for Atom {
    fn from(value: &Atom) -> Self {
        value.clone()
    }
}

impl AsRef<str> for Atom {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({})", &*self.0)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_name() {
        assert_eq!(Atom::new("Nat"), Atom::from(String::from("Nat")));
        assert_ne!(Atom::new("Nat"), Atom::new("nat"));
        assert!(Atom::truth().is_truth());
        assert!(Atom::falsity().is_constant());
        assert!(!Atom::new("Zero").is_constant());
    }
}
