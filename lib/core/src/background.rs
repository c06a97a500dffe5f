// Background job system inspired by Redis's BIO (Background I/O).
// Fits run on a dedicated worker thread so they never block a request.

use crate::model::{FitGuard, ModelConfig, ModelSink, SimilarityModel};
use crate::profile::UserProfile;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

/// Background job trait
pub trait BackgroundJob: Send + 'static {
    fn execute(self: Box<Self>);
}

struct WorkerQueue {
    jobs: Mutex<VecDeque<Box<dyn BackgroundJob>>>,
    condvar: Condvar,
    running: AtomicBool,
}

/// Single-worker FIFO job queue.
pub struct BackgroundJobSystem {
    queue: Arc<WorkerQueue>,
    submitted: AtomicU64,
    completed: Arc<AtomicU64>,
}

impl BackgroundJobSystem {
    pub fn new() -> std::io::Result<Self> {
        let queue = Arc::new(WorkerQueue {
            jobs: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            running: AtomicBool::new(true),
        });
        let completed = Arc::new(AtomicU64::new(0));

        let worker_queue = queue.clone();
        let worker_completed = completed.clone();
        thread::Builder::new()
            .name("bg-worker-refit".to_string())
            .spawn(move || loop {
                let job = {
                    let mut jobs = worker_queue.jobs.lock();
                    while jobs.is_empty() && worker_queue.running.load(Ordering::Acquire) {
                        worker_queue.condvar.wait(&mut jobs);
                    }
                    match jobs.pop_front() {
                        Some(job) => job,
                        // Shut down and drained
                        None => break,
                    }
                };
                job.execute();
                worker_completed.fetch_add(1, Ordering::Release);
            })?;

        Ok(Self {
            queue,
            submitted: AtomicU64::new(0),
            completed,
        })
    }

    /// Submit a background job
    pub fn submit(&self, job: Box<dyn BackgroundJob>) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.queue.jobs.lock().push_back(job);
        self.queue.condvar.notify_one();
    }

    pub fn jobs_submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn jobs_completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Stop the worker once the queue is drained.
    pub fn shutdown(&self) {
        self.queue.running.store(false, Ordering::Release);
        self.queue.condvar.notify_all();
    }
}

impl Drop for BackgroundJobSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Fits a fresh snapshot, persists it, and swaps it in.
pub struct RefitJob {
    profiles: Vec<UserProfile>,
    config: ModelConfig,
    sink: Option<Arc<dyn ModelSink>>,
    guard: FitGuard,
}

impl RefitJob {
    pub fn new(
        profiles: Vec<UserProfile>,
        config: ModelConfig,
        sink: Option<Arc<dyn ModelSink>>,
        guard: FitGuard,
    ) -> Self {
        Self {
            profiles,
            config,
            sink,
            guard,
        }
    }
}

impl BackgroundJob for RefitJob {
    fn execute(self: Box<Self>) {
        let model = match SimilarityModel::fit(&self.profiles, &self.config) {
            Ok(model) => model,
            Err(e) => {
                warn!(error = %e, "background refit failed, keeping previous model");
                return;
            }
        };

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.persist(&model) {
                error!(error = %e, model = %model.id(), "failed to persist refitted model");
                return;
            }
        }

        let installed = self.guard.handle().install(model);
        info!(model = %installed.id(), "background refit complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelHandle, ModelState};
    use std::time::{Duration, Instant};

    fn corpus(n: usize) -> Vec<UserProfile> {
        (0..n)
            .map(|i| UserProfile::new(format!("u{}", i)).with_batch(format!("{}", 2019 + i)))
            .collect()
    }

    fn wait_for(system: &BackgroundJobSystem, completed: u64) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while system.jobs_completed() < completed && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_refit_job_installs_model() {
        let system = BackgroundJobSystem::new().unwrap();
        let handle = Arc::new(ModelHandle::new(Duration::from_secs(60)));
        let guard = handle.try_begin_fit().unwrap();

        system.submit(Box::new(RefitJob::new(corpus(7), ModelConfig::default(), None, guard)));
        wait_for(&system, 1);

        assert_eq!(handle.state(), ModelState::Fitted);
        assert_eq!(handle.current().unwrap().corpus_size(), 7);
        assert_eq!(system.jobs_submitted(), 1);
    }

    #[test]
    fn test_failed_refit_keeps_previous_model() {
        let system = BackgroundJobSystem::new().unwrap();
        let handle = Arc::new(ModelHandle::with_model(
            SimilarityModel::fit(&corpus(6), &ModelConfig::default()).unwrap(),
            Duration::from_secs(60),
        ));
        let before = handle.current().unwrap().id();

        let guard = handle.try_begin_fit().unwrap();
        system.submit(Box::new(RefitJob::new(corpus(2), ModelConfig::default(), None, guard)));
        wait_for(&system, 1);

        assert_eq!(handle.current().unwrap().id(), before);
        // fit slot released by the dropped guard
        assert!(handle.try_begin_fit().is_some());
    }
}
