//! Bounded proof search.
//!
//! [`search`] grows a derivation depth-first. At each goal it tries, in order, to close the
//! goal as an axiom, to close it by a progressing back-edge to a branch ancestor whose
//! sequent is equal up to a renaming of free names, and finally every applicable rule
//! instance. A failed branch is undone through the builder's journal.
//!
//! The alternatives at the root are distributed to a pool of worker threads. Each worker
//! forks the root builder, so node ids stay disjoint, and the first worker to close its
//! derivation cancels the others. The result is always re-checked by
//! [`verify`](crate::checker::verify) before it is returned.
//!
//! # Example
//! ```
//! use cyformal::prelude::*;
//! use cycore::search::{search, SearchConfig, SearchOutcome};
//!
//! let p = Proposition::atom("p");
//! let goal = Sequent::new(p.clone(), Proposition::or(Proposition::atom("q"), p));
//! let outcome = search(&goal, &SearchConfig::default()).unwrap();
//! assert!(outcome.is_proof());
//! ```
mod alternatives;
mod cache;
mod worker;

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use cyformal::sequent::Sequent;
use crossbeam::channel;
use log::{debug, info, warn};
use parking_lot::Mutex;
use strum::{Display, EnumIs, EnumTryAs};

pub use crate::utils::conf::SearchConfig;
use crate::{
    checker::{Verdict, verify},
    derivation::{Derivation, DerivationBuilder, NodeId},
    rules::{Rule, is_axiom},
    utils::error::{CyError, CyResult},
};
use worker::{Halt, Worker};

/// Why a search session ended without a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIs)]
pub enum ExhaustionReason {
    /// Some branch was cut at the depth bound.
    DepthLimit,
    /// The wall-clock budget ran out.
    Timeout,
    /// Every alternative failed within the bounds.
    SearchSpace,
}

#[derive(Debug, EnumIs, EnumTryAs)]
pub enum SearchOutcome {
    Proof(Derivation),
    Exhausted(ExhaustionReason),
}

#[derive(Debug, Default)]
struct SessionStatus {
    timed_out: bool,
    depth_limited: bool,
    error: Option<CyError>,
}

/// State shared by the workers of one session.
struct Session {
    cancel: AtomicBool,
    winner: Mutex<Option<DerivationBuilder>>,
    status: Mutex<SessionStatus>,
}

impl Session {
    fn new() -> Self {
        Self {
            cancel: AtomicBool::new(false),
            winner: Mutex::new(None),
            status: Mutex::new(SessionStatus::default()),
        }
    }

    /// Drain root alternatives from `next` until one succeeds or the session stops.
    fn run(&self, worker: &mut Worker<'_>, root: NodeId, mut next: impl FnMut() -> Option<Rule>) {
        if let Err(err) = worker.enter(root) {
            self.fail(err);
            return;
        }

        while let Some(rule) = next() {
            let kind = rule.kind();
            match worker.try_rule(root, rule, 0) {
                Ok(true) => {
                    if self.offer(std::mem::take(&mut worker.builder)) {
                        debug!("Proof found starting with {kind}");
                    }
                    break;
                }
                Ok(false) => debug!("Root alternative {kind} failed"),
                Err(Halt::Cancelled) => break,
                Err(Halt::Timeout) => {
                    self.status.lock().timed_out = true;
                    break;
                }
                Err(Halt::Fatal(err)) => {
                    self.fail(err);
                    break;
                }
            }
        }

        self.status.lock().depth_limited |= worker.depth_limited;
    }

    /// Keep `builder` unless another worker already won, then stop the session.
    ///
    /// A proof completed after a sibling failed is still kept: it takes precedence over the
    /// recorded error.
    fn offer(&self, builder: DerivationBuilder) -> bool {
        let mut winner = self.winner.lock();
        let won = winner.is_none();
        if won {
            *winner = Some(builder);
        }
        self.cancel.store(true, Ordering::Release);
        won
    }

    fn fail(&self, err: CyError) {
        self.status.lock().error.get_or_insert(err);
        self.cancel.store(true, Ordering::Release);
    }
}

/// Search for a cyclic proof of `sequent` within the budgets of `config`.
///
/// Running out of budget is not an error: it yields [`SearchOutcome::Exhausted`]. Errors are
/// reserved for internal failures, such as a worker panic or a found derivation that does not
/// verify.
pub fn search(sequent: &Sequent, config: &SearchConfig) -> CyResult<SearchOutcome> {
    let started = Instant::now();
    let deadline = started + config.timeout();

    let mut base = DerivationBuilder::new();
    let root = base.open_goal(sequent.clone())?;

    if is_axiom(sequent) {
        base.close_as_axiom(root)?;
        return conclude(sequent, base);
    }
    if config.max_depth == 0 {
        info!("Search for {sequent} exhausted: depth bound is zero");
        return Ok(SearchOutcome::Exhausted(ExhaustionReason::DepthLimit));
    }

    let rules = alternatives::alternatives(sequent, None)?;
    let workers = config.max_workers.clamp(1, rules.len().max(1));
    info!(
        "Searching for {sequent} with {} root alternative(s) on {workers} worker(s)",
        rules.len()
    );

    let session = Session::new();
    if workers == 1 {
        let mut worker = Worker::new(base, config, deadline, &session.cancel);
        let mut queue = rules.into_iter();
        session.run(&mut worker, root, || queue.next());
    } else {
        let (sender, receiver) = channel::unbounded();
        for rule in rules {
            sender
                .send(rule)
                .map_err(|err| CyError::WorkerPanicked(format!("work queue closed: {err}")))?;
        }
        drop(sender);

        let session = &session;
        let base = &base;
        crossbeam::thread::scope(|scope| {
            for _ in 0..workers {
                let receiver = receiver.clone();
                scope.spawn(move |_| {
                    let mut worker = Worker::new(base.fork(), config, deadline, &session.cancel);
                    session.run(&mut worker, root, || receiver.recv().ok());
                });
            }
        })
        .map_err(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            CyError::WorkerPanicked(message)
        })?;
    }

    let Session { winner, status, .. } = session;
    if let Some(builder) = winner.into_inner() {
        info!("Proof of {sequent} found in {:?}", started.elapsed());
        return conclude(sequent, builder);
    }

    let status = status.into_inner();
    if let Some(err) = status.error {
        return Err(err);
    }
    let reason = if status.timed_out {
        ExhaustionReason::Timeout
    } else if status.depth_limited {
        ExhaustionReason::DepthLimit
    } else {
        ExhaustionReason::SearchSpace
    };
    info!("Search for {sequent} exhausted after {:?}: {reason}", started.elapsed());
    Ok(SearchOutcome::Exhausted(reason))
}

fn conclude(sequent: &Sequent, builder: DerivationBuilder) -> CyResult<SearchOutcome> {
    let derivation = builder.finish()?;
    match verify(sequent, &derivation) {
        Verdict::Valid => Ok(SearchOutcome::Proof(derivation)),
        Verdict::Invalid(err) => {
            warn!("Search produced a derivation that does not verify: {err}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proofs_found_after_a_failure_are_kept() {
        let session = Session::new();
        session.fail(CyError::UnknownNode(NodeId(7)));
        assert!(session.cancel.load(Ordering::Acquire));

        assert!(session.offer(DerivationBuilder::new()));
        assert!(!session.offer(DerivationBuilder::new()));
        assert!(session.winner.lock().is_some());
        assert!(session.status.lock().error.is_some());
    }

    #[test]
    fn first_proof_wins() {
        let session = Session::new();
        assert!(session.offer(DerivationBuilder::new()));
        assert!(session.cancel.load(Ordering::Acquire));
        assert!(!session.offer(DerivationBuilder::new()));
    }
}
