use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
    time::{Duration, Instant},
};

use crate::precinct::PrecinctGeometry;
use crate::predicate::{Closeness, PredicateError};

use super::{
    candidates::{Candidates, EnvelopeIndex},
    AdjacencyMap, CancelReason, CancelToken, GraphError, Progress, ProgressObserver,
};

/// How a scan ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanStatus {
    /// Every row was scanned.
    Complete,
    /// The scan stopped early; the map holds only the pairs found in finished rows.
    Partial {
        reason: CancelReason,
        /// Highest row index `k` such that rows `0..=k` all finished.
        last_completed: Option<usize>,
        /// Number of finished rows, in any order.
        rows_completed: usize,
    },
}

/// Result of a scan: the adjacency map plus how much of it is trustworthy.
#[derive(Debug)]
pub struct ScanReport {
    pub map: AdjacencyMap,
    pub status: ScanStatus,
    /// Number of predicate evaluations performed.
    pub evaluations: u64,
    /// Number of pairs whose predicate failed and were treated as not adjacent.
    pub predicate_failures: usize,
    pub elapsed: Duration,
}

impl ScanReport {
    #[inline] pub fn is_complete(&self) -> bool { self.status == ScanStatus::Complete }
}

/// Drives the upper-triangular all-pairs scan over a worker pool.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyBuilder {
    closeness: Closeness,
    workers: Option<NonZeroUsize>,
    timeout: Option<Duration>,
    candidates: Candidates,
    max_predicate_failures: Option<usize>,
}

impl AdjacencyBuilder {
    pub fn new(closeness: Closeness) -> Self {
        Self { closeness, ..Self::default() }
    }

    /// Number of worker threads. Zero means the available hardware parallelism.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = NonZeroUsize::new(workers);
        self
    }

    /// Stop the scan once `timeout` has elapsed, keeping finished rows.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn candidates(mut self, candidates: Candidates) -> Self {
        self.candidates = candidates;
        self
    }

    /// Stop the scan once more than `max` pairs have failed to evaluate.
    pub fn max_predicate_failures(mut self, max: Option<usize>) -> Self {
        self.max_predicate_failures = max;
        self
    }

    #[inline] pub fn closeness(&self) -> Closeness { self.closeness }

    /// Resolved worker count.
    pub fn worker_count(&self) -> usize {
        self.workers
            .or_else(|| std::thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get)
    }

    /// Scan every unordered pair of `precincts` once and collect the adjacent ones.
    ///
    /// Row `i` tests precinct `i` against every later precinct. Rows are dealt to
    /// workers in a stride (worker `w` owns rows `w`, `w + k`, ...), which keeps the
    /// triangular workload balanced. Each worker merges a finished row's pairs into
    /// the shared map under a lock held only for the merge, then reports progress.
    /// `cancel` is polled before each row; a cancelled scan returns what it found so far.
    pub fn build(
        &self,
        precincts: &[PrecinctGeometry],
        observer: &dyn ProgressObserver,
        cancel: &CancelToken,
    ) -> Result<ScanReport, GraphError> {
        let started = Instant::now();
        let deadline = self.timeout.map(|timeout| started + timeout);

        let n = precincts.len();
        let rows = n.saturating_sub(1);
        let workers = self.worker_count().min(rows.max(1));

        let mut map = AdjacencyMap::new(precincts.iter().map(|precinct| precinct.id().clone()))?;

        let index = match self.candidates {
            Candidates::AllPairs => None,
            Candidates::Envelope => Some(EnvelopeIndex::new(precincts, self.closeness.reach())),
        };

        tracing::info!(
            precincts = n,
            closeness = %self.closeness,
            candidates = ?self.candidates,
            workers,
            "starting adjacency scan"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("adjacency-{i}"))
            .build()?;

        let finished: Vec<AtomicBool> = (0..rows).map(|_| AtomicBool::new(false)).collect();
        let evaluations = AtomicU64::new(0);
        let failures = AtomicUsize::new(0);

        {
            let shared = Mutex::new(&mut map);
            let scan = RowScan {
                builder: self,
                precincts,
                index: index.as_ref(),
                failures: &failures,
                cancel,
            };

            pool.scope(|scope| {
                for worker in 0..workers {
                    let (scan, shared, finished, evaluations) = (&scan, &shared, &finished, &evaluations);
                    scope.spawn(move |_| {
                        let mut pairs: Vec<(u32, u32)> = Vec::new();
                        for i in (worker..rows).step_by(workers) {
                            if should_stop(cancel, deadline) { break }

                            evaluations.fetch_add(scan.row(i, &mut pairs), Ordering::Relaxed);

                            if !pairs.is_empty() {
                                let mut map = shared.lock().unwrap_or_else(PoisonError::into_inner);
                                for (a, b) in pairs.drain(..) { map.link(a, b); }
                            }

                            finished[i].store(true, Ordering::Release);
                            observer.observe(Progress::new(i, n));
                        }
                    });
                }
            });
        }

        let rows_completed = finished.iter().filter(|done| done.load(Ordering::Acquire)).count();
        let status = match cancel.reason() {
            Some(reason) if rows_completed < rows => ScanStatus::Partial {
                reason,
                last_completed: finished.iter()
                    .take_while(|done| done.load(Ordering::Acquire))
                    .count()
                    .checked_sub(1),
                rows_completed,
            },
            _ => ScanStatus::Complete,
        };

        let report = ScanReport {
            map,
            status,
            evaluations: evaluations.into_inner(),
            predicate_failures: failures.into_inner(),
            elapsed: started.elapsed(),
        };

        match report.status {
            ScanStatus::Complete => tracing::info!(
                edges = report.map.edge_count(),
                evaluations = report.evaluations,
                predicate_failures = report.predicate_failures,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "adjacency scan complete"
            ),
            ScanStatus::Partial { reason, last_completed, rows_completed } => tracing::warn!(
                %reason,
                last_completed = ?last_completed,
                rows_completed,
                rows,
                edges = report.map.edge_count(),
                "adjacency scan interrupted; result is partial"
            ),
        }

        Ok(report)
    }
}

/// Check the cancellation flag, tripping it first if the deadline has passed.
fn should_stop(cancel: &CancelToken, deadline: Option<Instant>) -> bool {
    if cancel.is_cancelled() {
        return true;
    }
    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
        cancel.cancel_with(CancelReason::Timeout);
        return true;
    }
    false
}

/// Read-only state shared by all workers for evaluating one row at a time.
struct RowScan<'a> {
    builder: &'a AdjacencyBuilder,
    precincts: &'a [PrecinctGeometry],
    index: Option<&'a EnvelopeIndex>,
    failures: &'a AtomicUsize,
    cancel: &'a CancelToken,
}

impl RowScan<'_> {
    /// Test precinct `i` against every later candidate, pushing adjacent index pairs
    /// onto `pairs`. Returns the number of predicate evaluations.
    fn row(&self, i: usize, pairs: &mut Vec<(u32, u32)>) -> u64 {
        let a = &self.precincts[i];
        let mut evaluated = 0u64;

        let mut test = |j: usize| {
            evaluated += 1;
            let b = &self.precincts[j];
            match self.builder.closeness.try_is_adjacent(a, b) {
                Ok(true) => pairs.push((i as u32, j as u32)),
                Ok(false) => {}
                Err(error) => self.record_failure(a, b, &error),
            }
        };

        match self.index {
            None => (i + 1..self.precincts.len()).for_each(&mut test),
            Some(index) => index.candidates(i).filter(|&j| j > i).for_each(&mut test),
        }

        evaluated
    }

    /// Fail open: log the pair, count it, and trip the cancellation flag past the limit.
    fn record_failure(&self, a: &PrecinctGeometry, b: &PrecinctGeometry, error: &PredicateError) {
        tracing::warn!(a = %a.id(), b = %b.id(), %error, "predicate failed; treating pair as not adjacent");

        let count = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
        if self.builder.max_predicate_failures.is_some_and(|max| count > max) {
            self.cancel.cancel_with(CancelReason::PredicateFailures);
        }
    }
}
