use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use cyformal::{sequent::Sequent, subst::Substitution};
use log::trace;

use super::{alternatives::alternatives, cache::BranchCache};
use crate::{
    derivation::{DerivationBuilder, NodeId},
    rules::{Rule, is_axiom},
    trace::{UnfoldProgress, check_graph, trace_graph},
    utils::{
        conf::SearchConfig,
        error::{CyError, CyResult},
    },
};

/// Why a worker stopped before exhausting its alternatives.
#[derive(Debug)]
pub(crate) enum Halt {
    Timeout,
    Cancelled,
    Fatal(CyError),
}

impl From<CyError> for Halt {
    fn from(value: CyError) -> Self {
        Halt::Fatal(value)
    }
}

/// Depth-first prover over one builder.
pub(crate) struct Worker<'a> {
    pub(crate) builder: DerivationBuilder,
    config: &'a SearchConfig,
    deadline: Instant,
    cancel: &'a AtomicBool,
    cache: BranchCache,
    pub(crate) depth_limited: bool,
}

impl<'a> Worker<'a> {
    pub(crate) fn new(
        builder: DerivationBuilder,
        config: &'a SearchConfig,
        deadline: Instant,
        cancel: &'a AtomicBool,
    ) -> Self {
        Self {
            builder,
            config,
            deadline,
            cancel,
            cache: BranchCache::default(),
            depth_limited: false,
        }
    }

    fn poll(&self) -> Result<(), Halt> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(Halt::Cancelled);
        }
        if Instant::now() >= self.deadline {
            return Err(Halt::Timeout);
        }
        Ok(())
    }

    /// Mark `node` as an ancestor of everything proven below it.
    pub(crate) fn enter(&mut self, node: NodeId) -> CyResult<()> {
        let key = self.builder.sequent(node)?.shape_hash();
        self.cache.enter(key, node);
        Ok(())
    }

    /// Close the open node `node` at branch depth `depth`, or leave the builder as it was.
    pub(crate) fn prove(&mut self, node: NodeId, depth: usize) -> Result<bool, Halt> {
        self.poll()?;
        let sequent = self.builder.sequent(node)?.clone();

        if is_axiom(&sequent) {
            self.builder.close_as_axiom(node)?;
            return Ok(true);
        }

        let key = sequent.shape_hash();
        if self.close_by_back_edge(node, &sequent, key)? {
            return Ok(true);
        }

        if depth >= self.config.max_depth {
            self.depth_limited = true;
            return Ok(false);
        }

        let incoming = self.builder.node(node)?.incoming.clone();
        let rules = alternatives(&sequent, incoming.as_ref())?;

        self.cache.enter(key, node);
        let mut result = Ok(false);
        for rule in rules {
            result = self.try_rule(node, rule, depth);
            if !matches!(result, Ok(false)) {
                break;
            }
        }
        self.cache.leave(key, node);
        result
    }

    /// Apply `rule` at `node` and prove every premise, rolling back on failure.
    pub(crate) fn try_rule(&mut self, node: NodeId, rule: Rule, depth: usize) -> Result<bool, Halt> {
        let checkpoint = self.builder.checkpoint();
        let children = match self.builder.apply_rule(node, rule) {
            Ok(children) => children,
            Err(err) if err.is_branch_local() => return Ok(false),
            Err(err) => return Err(err.into()),
        };

        for child in children {
            if !self.prove(child, depth + 1)? {
                self.builder.rollback(checkpoint);
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn close_by_back_edge(&mut self, node: NodeId, sequent: &Sequent, key: u64) -> Result<bool, Halt> {
        for ancestor in self.cache.candidates(key) {
            let Some(renaming) = self.builder.sequent(ancestor)?.free_renaming(sequent) else {
                continue;
            };
            let substitution = Substitution::from(&renaming);

            match self.builder.check_back_edge(node, ancestor, &substitution) {
                Ok(segment) if segment.progressing => {}
                Ok(_) => continue,
                Err(err) if err.is_branch_local() => continue,
                Err(err) => return Err(err.into()),
            }

            // A progressing segment can still close a stationary cycle through older
            // back-edges, so the whole partial graph is checked.
            let checkpoint = self.builder.checkpoint();
            self.builder.close_as_back_edge(node, ancestor, substitution)?;
            match check_graph(&trace_graph(self.builder.nodes()), &UnfoldProgress) {
                Ok(_) => return Ok(true),
                Err(CyError::TraceConditionFailed { cycle }) => {
                    trace!("Back-edge {node} -> {ancestor} rejected, cycle {cycle:?}");
                    self.builder.rollback(checkpoint);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(false)
    }
}
