//! Concurrent bulk loader with a bounded worker pool
//!
//! Used when the sum of all discovered file sizes fits under the memory
//! ceiling. A fixed pool of worker threads drains a bounded work queue
//! and pushes outcomes to a bounded result queue; the bounded queues
//! provide backpressure (producers block once full). Workers never touch
//! the record collection: each outcome carries its pre-assigned index
//! and the collecting thread, which exclusively borrows the slice,
//! writes payloads back into fixed slots. Completion order is
//! unspecified; final collection order is unaffected.
//!
//! Running out of budget mid-batch is not an error: the record is left
//! non-resident and the batch continues, so later smaller files may
//! still fit.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use lightbox_cache::MemoryBudget;

use crate::io::read_validated;
use crate::ImageRecord;

/// Configuration for the bulk loader worker pool.
#[derive(Debug, Clone)]
pub struct BulkLoadConfig {
    /// Number of worker threads.
    /// Default: available parallelism clamped to [2, 16].
    pub num_workers: usize,

    /// Capacity of the work and result queues.
    /// Default: 100. Submitters block once a queue is full.
    pub queue_capacity: usize,
}

impl Default for BulkLoadConfig {
    fn default() -> Self {
        Self {
            num_workers: default_worker_count(),
            queue_capacity: 100,
        }
    }
}

impl BulkLoadConfig {
    /// Create a configuration with an explicit worker count.
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
            ..Default::default()
        }
    }

    /// Set the work/result queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

/// Summary of one bulk load batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkLoadReport {
    /// Records whose payload was committed
    pub loaded: usize,
    /// Records left non-resident (budget exhausted or per-file failure)
    pub skipped: usize,
}

impl BulkLoadReport {
    /// Total records processed in the batch.
    pub fn total(&self) -> usize {
        self.loaded + self.skipped
    }
}

/// A unit of work handed to the pool: one record's identity, not the
/// record itself.
struct Job {
    index: usize,
    path: PathBuf,
    file_size: u64,
}

/// One result per submitted job, routed back to its fixed slot.
struct Outcome {
    index: usize,
    payload: Option<Arc<Vec<u8>>>,
}

/// Concurrent loader that fills a whole record collection up front.
pub struct BulkLoader {
    budget: Arc<MemoryBudget>,
    config: BulkLoadConfig,
}

impl BulkLoader {
    /// Create a bulk loader drawing on the given budget.
    pub fn new(budget: Arc<MemoryBudget>) -> Self {
        Self {
            budget,
            config: BulkLoadConfig::default(),
        }
    }

    /// Create a bulk loader with an explicit pool configuration.
    pub fn with_config(budget: Arc<MemoryBudget>, config: BulkLoadConfig) -> Self {
        Self { budget, config }
    }

    /// Number of worker threads the pool will spawn.
    pub fn num_workers(&self) -> usize {
        self.config.num_workers
    }

    /// Load every record in the batch concurrently.
    ///
    /// Blocks until each submitted record has produced exactly one
    /// outcome and all workers have exited. `progress` is invoked on the
    /// calling thread with a 0..1 fraction after every outcome.
    pub fn load_all(
        &self,
        records: &mut [ImageRecord],
        mut progress: impl FnMut(f64),
    ) -> BulkLoadReport {
        let total = records.len();
        let mut report = BulkLoadReport::default();
        if total == 0 {
            return report;
        }

        let jobs: Vec<Job> = records
            .iter()
            .enumerate()
            .map(|(index, record)| Job {
                index,
                path: record.path().to_path_buf(),
                file_size: record.file_size(),
            })
            .collect();

        thread::scope(|scope| {
            let (job_tx, job_rx) = bounded::<Job>(self.config.queue_capacity);
            let (result_tx, result_rx) = bounded::<Outcome>(self.config.queue_capacity);

            for _ in 0..self.config.num_workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                let budget = Arc::clone(&self.budget);
                scope.spawn(move || worker(jobs, results, &budget));
            }
            // Workers hold the only remaining clones; dropping these lets
            // the channels disconnect once the batch drains.
            drop(job_rx);
            drop(result_tx);

            // Feed from a separate thread so a full work queue blocks the
            // feeder, not the result collection below.
            scope.spawn(move || {
                for job in jobs {
                    if job_tx.send(job).is_err() {
                        break;
                    }
                }
            });

            let mut completed = 0;
            while completed < total {
                let Ok(outcome) = result_rx.recv() else {
                    break;
                };
                completed += 1;

                match outcome.payload {
                    Some(payload) => {
                        records[outcome.index].make_resident(payload);
                        report.loaded += 1;
                    }
                    None => report.skipped += 1,
                }
                progress(completed as f64 / total as f64);
            }
        });

        log::info!(
            "bulk load complete: {} loaded, {} skipped, {} bytes resident",
            report.loaded,
            report.skipped,
            self.budget.current()
        );
        report
    }
}

/// Worker loop: reserve, read, validate, commit or roll back.
fn worker(jobs: Receiver<Job>, results: Sender<Outcome>, budget: &MemoryBudget) {
    for job in jobs.iter() {
        let payload = if !budget.reserve(job.file_size) {
            log::warn!(
                "budget exhausted, leaving {} non-resident ({} bytes)",
                job.path.display(),
                job.file_size
            );
            None
        } else {
            match read_validated(&job.path) {
                Ok(payload) => Some(payload),
                Err(error) => {
                    log::warn!("error loading {}: {error}", job.path.display());
                    budget.release(job.file_size);
                    None
                }
            }
        };

        if results
            .send(Outcome {
                index: job.index,
                payload,
            })
            .is_err()
        {
            break;
        }
    }
}

/// Worker count derived from the host: available parallelism clamped to
/// [2, 16].
fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(2, 16)
}
