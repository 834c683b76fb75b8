//! Node identifier allocation.
//!
//! A single [`NodeArena`] is shared by every builder taking part in one search session.
//! Builders reserve disjoint [`IdRange`]s from it and hand out identifiers locally, so
//! concurrent workers never produce clashing node ids and never contend on a lock.
use std::sync::atomic::{AtomicU32, Ordering};

use super::NodeId;
use crate::{
    magic::NODE_ID_CHUNK,
    utils::error::{CyError, CyResult},
};

/// Shared source of node identifier ranges.
#[derive(Debug)]
pub struct NodeArena {
    next: AtomicU32,
    chunk: u32,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::with_chunk(NODE_ID_CHUNK)
    }
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// An arena handing out ranges of `chunk` identifiers (at least one).
    pub fn with_chunk(chunk: u32) -> Self {
        Self {
            next: AtomicU32::new(0),
            chunk: chunk.max(1),
        }
    }

    /// Reserve the next range of identifiers.
    pub fn reserve(&self) -> CyResult<IdRange> {
        let chunk = self.chunk;
        let start = self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |next| next.checked_add(chunk))
            .map_err(|_| CyError::IdSpaceExhausted)?;
        Ok(IdRange {
            next: start,
            end: start + chunk,
        })
    }
}

/// A half-open range of identifiers owned by a single builder.
#[derive(Debug, Clone, Default)]
pub struct IdRange {
    next: u32,
    end: u32,
}

impl IdRange {
    /// Next identifier of the range, or `None` once it is used up.
    pub fn next_id(&mut self) -> Option<NodeId> {
        (self.next < self.end).then(|| {
            let id = NodeId(self.next);
            self.next += 1;
            id
        })
    }

    pub fn remaining(&self) -> u32 {
        self.end - self.next
    }
}
