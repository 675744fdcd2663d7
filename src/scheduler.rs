use crate::enumerator::ResizeJob;
use crate::error::Result;
use crate::job::ResizeOutcome;
use crossbeam_channel::{unbounded, RecvTimeoutError};
use rayon::ThreadPoolBuilder;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub workers: usize,
    /// Measured from the start of [`Scheduler::run`]
    pub deadline: Duration,
    /// How long to keep collecting in-flight jobs once the deadline passes
    pub grace: Duration,
}

impl SchedulerOptions {
    pub fn new(deadline: Duration) -> Self {
        Self {
            workers: num_cpus::get(),
            deadline,
            grace: Duration::ZERO,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

#[derive(Debug)]
pub struct ScheduleResult {
    /// In completion order
    pub completed: Vec<(ResizeJob, ResizeOutcome)>,
    /// Jobs never started, or still running when collection stopped
    pub abandoned: Vec<ResizeJob>,
    pub deadline_exceeded: bool,
    pub elapsed: Duration,
}

/// Fixed-size worker pool with a wall-clock deadline.
///
/// Workers pull job indices from a shared queue and push outcomes back
/// through a second channel; the calling thread is the only consumer of
/// outcomes, so nothing outside the channels is shared mutably. Once the
/// deadline passes no worker draws another job. Jobs still running after
/// the grace period are left to finish in the background and their
/// outcomes are dropped.
pub struct Scheduler {
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Runs `executor` over every job, calling `on_outcome` on the current
    /// thread as each job completes.
    ///
    /// # Errors
    /// Only if the worker pool cannot be built. Per-job failures travel as
    /// [`ResizeOutcome::Failed`] and a missed deadline is reported through
    /// [`ScheduleResult::deadline_exceeded`].
    pub fn run<F, C>(&self, jobs: Vec<ResizeJob>, executor: F, mut on_outcome: C) -> Result<ScheduleResult>
    where
        F: Fn(&ResizeJob) -> ResizeOutcome + Send + Sync + 'static,
        C: FnMut(&ResizeJob, &ResizeOutcome),
    {
        let start = Instant::now();
        let deadline = start.checked_add(self.options.deadline);
        let total = jobs.len();

        if total == 0 {
            return Ok(ScheduleResult {
                completed: Vec::new(),
                abandoned: Vec::new(),
                deadline_exceeded: false,
                elapsed: start.elapsed(),
            });
        }

        let jobs = Arc::new(jobs);
        let executor = Arc::new(executor);
        let stop = Arc::new(AtomicBool::new(false));

        let (queue_tx, queue_rx) = unbounded::<usize>();
        for index in 0..total {
            // The receiver is alive, so this cannot fail.
            let _ = queue_tx.send(index);
        }
        drop(queue_tx);

        let (outcome_tx, outcome_rx) = unbounded::<(usize, ResizeOutcome)>();

        let workers = self.options.workers.clamp(1, total);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("resize-worker-{}", i))
            .build()?;

        debug!("Dispatching {} jobs across {} workers", total, workers);

        for _ in 0..workers {
            let jobs = Arc::clone(&jobs);
            let executor = Arc::clone(&executor);
            let stop = Arc::clone(&stop);
            let queue_rx = queue_rx.clone();
            let outcome_tx = outcome_tx.clone();

            pool.spawn(move || loop {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    stop.store(true, Ordering::Relaxed);
                    break;
                }
                // The queue is filled up front, so empty means drained.
                let Ok(index) = queue_rx.try_recv() else {
                    break;
                };
                let outcome = (*executor)(&jobs[index]);
                if outcome_tx.send((index, outcome)).is_err() {
                    break;
                }
            });
        }
        drop(outcome_tx);
        drop(queue_rx);

        let mut done = vec![false; total];
        let mut completed = Vec::with_capacity(total);
        let mut record = |index: usize, outcome: ResizeOutcome| {
            done[index] = true;
            on_outcome(&jobs[index], &outcome);
            completed.push((jobs[index].clone(), outcome));
        };

        let mut timed_out = false;
        loop {
            let received = match deadline {
                Some(d) => outcome_rx.recv_deadline(d),
                None => outcome_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok((index, outcome)) => record(index, outcome),
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    timed_out = true;
                    break;
                }
            }
        }

        if timed_out {
            stop.store(true, Ordering::Relaxed);
            if !self.options.grace.is_zero() {
                let grace_end = Instant::now() + self.options.grace;
                while let Ok((index, outcome)) = outcome_rx.recv_deadline(grace_end) {
                    record(index, outcome);
                }
            }
        }

        let deadline_exceeded = timed_out || stop.load(Ordering::Relaxed);
        let abandoned: Vec<ResizeJob> = jobs
            .iter()
            .zip(&done)
            .filter(|(_, finished)| !**finished)
            .map(|(job, _)| job.clone())
            .collect();

        if deadline_exceeded {
            warn!(
                "Timeout of {:?} exceeded: {} of {} jobs completed, {} abandoned",
                self.options.deadline,
                completed.len(),
                total,
                abandoned.len()
            );
        } else {
            info!("All {} jobs completed", total);
        }

        // Dropping the pool does not wait for abandoned jobs.
        drop(pool);

        Ok(ScheduleResult {
            completed,
            abandoned,
            deadline_exceeded,
            elapsed: start.elapsed(),
        })
    }
}
