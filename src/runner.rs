//! Cooperative driving of a single search.
//!
//! A [SearchRun] advances its search one expansion per [step](SearchRun::step), so the host
//! decides when work happens. Pausing simply stops stepping; cancelling drops the working
//! set at once and reports [NotFoundReason::Cancelled].
use std::time::{Duration, Instant};

use log::debug;

use crate::config::Algorithm;
use crate::solver::{NotFoundReason, PathSearch, Progress, SearchEvent, SearchOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
    Finished,
}

/// Summary statistics of a finished run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistics {
    /// Time spent inside [SearchRun::step], pauses excluded.
    pub elapsed: Duration,
    pub nodes_analyzed: usize,
    pub nodes_allocated: usize,
    pub memory_estimate_bytes: usize,
    pub path_length: Option<f64>,
    pub path_nodes: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchReport {
    pub algorithm: Algorithm,
    pub outcome: SearchOutcome,
    pub stats: Statistics,
}

impl SearchReport {
    pub fn is_found(&self) -> bool {
        self.outcome.is_found()
    }
}

pub struct SearchRun<'a> {
    algorithm: Algorithm,
    search: Option<Box<dyn PathSearch + 'a>>,
    state: RunState,
    elapsed: Duration,
    steps: usize,
    report: Option<SearchReport>,
}

impl<'a> SearchRun<'a> {
    pub fn new(algorithm: Algorithm, search: Box<dyn PathSearch + 'a>) -> SearchRun<'a> {
        SearchRun {
            algorithm,
            search: Some(search),
            state: RunState::Running,
            elapsed: Duration::ZERO,
            steps: 0,
            report: None,
        }
    }

    /// A run that is over before it started, e.g. because the goal is known to be unreachable.
    pub fn finished(algorithm: Algorithm, outcome: SearchOutcome) -> SearchRun<'a> {
        let mut run = SearchRun {
            algorithm,
            search: None,
            state: RunState::Running,
            elapsed: Duration::ZERO,
            steps: 0,
            report: None,
        };
        run.complete(outcome);
        run
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == RunState::Finished
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Performs one expansion and returns the events it produced. Returns [None] while the
    /// run is paused or after it finished.
    pub fn step(&mut self) -> Option<Vec<SearchEvent>> {
        if self.state != RunState::Running {
            return None;
        }
        let search = self.search.as_mut()?;
        let mut events = Vec::new();
        let started = Instant::now();
        let progress = search.step(&mut events);
        self.elapsed += started.elapsed();
        self.steps += 1;
        if let Progress::Done(outcome) = progress {
            self.complete(outcome);
        }
        Some(events)
    }

    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.state = RunState::Running;
        }
    }

    /// Abandons the run. Has no effect on a finished run.
    pub fn cancel(&mut self) {
        if self.state != RunState::Finished {
            self.complete(SearchOutcome::PathNotFound(NotFoundReason::Cancelled));
        }
    }

    /// Steps until the search finishes, resuming it first if it was paused.
    pub fn run_to_end(mut self) -> SearchReport {
        self.resume();
        while self.step().is_some() {}
        self.into_report()
    }

    pub fn report(&self) -> Option<&SearchReport> {
        self.report.as_ref()
    }

    /// The final report; an unfinished run is cancelled.
    pub fn into_report(mut self) -> SearchReport {
        self.cancel();
        match self.report {
            Some(report) => report,
            None => unreachable!("a cancelled run always carries a report"),
        }
    }

    fn complete(&mut self, outcome: SearchOutcome) {
        let (nodes_analyzed, nodes_allocated, memory_estimate_bytes) =
            self.search.as_ref().map_or((0, 0, 0), |search| {
                (
                    search.nodes_analyzed(),
                    search.nodes_allocated(),
                    search.memory_estimate(),
                )
            });
        let stats = Statistics {
            elapsed: self.elapsed,
            nodes_analyzed,
            nodes_allocated,
            memory_estimate_bytes,
            path_length: outcome.path().map(|path| path.length),
            path_nodes: outcome.path().map_or(0, |path| path.len()),
        };
        debug!(
            "{} search finished after {} steps in {:?}: {}",
            self.algorithm, self.steps, self.elapsed, outcome
        );
        self.search = None;
        self.state = RunState::Finished;
        self.report = Some(SearchReport {
            algorithm: self.algorithm,
            outcome,
            stats,
        });
    }
}

/// Yields the events of each step until the run pauses or finishes.
impl Iterator for SearchRun<'_> {
    type Item = Vec<SearchEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.step()
    }
}
