use std::collections::HashMap;

use smallvec::SmallVec;

use crate::derivation::NodeId;

/// Nodes of the current branch indexed by the shape hash of their sequent.
///
/// Two sequents equal up to a renaming of free names share a shape hash, so the candidates
/// for a back-edge from a new goal are found without scanning the whole branch. Entries
/// are pushed when a node is expanded and popped when the search leaves it.
#[derive(Debug, Default, Clone)]
pub(crate) struct BranchCache {
    entries: HashMap<u64, SmallVec<[NodeId; 2]>>,
}

impl BranchCache {
    pub(crate) fn enter(&mut self, key: u64, node: NodeId) {
        self.entries.entry(key).or_default().push(node);
    }

    pub(crate) fn leave(&mut self, key: u64, node: NodeId) {
        if let Some(stack) = self.entries.get_mut(&key) {
            if let Some(position) = stack.iter().rposition(|n| *n == node) {
                stack.remove(position);
            }
            if stack.is_empty() {
                self.entries.remove(&key);
            }
        }
    }

    /// Branch nodes sharing `key`, innermost first.
    pub(crate) fn candidates(&self, key: u64) -> SmallVec<[NodeId; 4]> {
        self.entries
            .get(&key)
            .map(|stack| stack.iter().rev().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_follow_the_branch() {
        let mut cache = BranchCache::default();
        cache.enter(7, NodeId(0));
        cache.enter(7, NodeId(3));
        cache.enter(9, NodeId(4));
        assert_eq!(cache.candidates(7).as_slice(), &[NodeId(3), NodeId(0)]);

        cache.leave(7, NodeId(3));
        cache.leave(9, NodeId(4));
        assert_eq!(cache.candidates(7).as_slice(), &[NodeId(0)]);
        assert!(cache.candidates(9).is_empty());
    }
}
