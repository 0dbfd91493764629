//! Job scheduler for periodic tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Job frequency for scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFrequency {
    /// Run every N milliseconds.
    Millis(u64),
    /// Run every hour.
    Hourly,
}

impl JobFrequency {
    /// Get the duration between job executions.
    pub fn duration(&self) -> Duration {
        match self {
            JobFrequency::Millis(ms) => Duration::from_millis(*ms),
            JobFrequency::Hourly => Duration::from_secs(3600),
        }
    }
}

/// Trait for implementing background jobs.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// The name of this job (used for logging).
    fn name(&self) -> &'static str;

    /// The frequency at which this job should run.
    fn frequency(&self) -> JobFrequency;

    /// Execute the job. Returns Ok(()) on success, Err with message on failure.
    async fn execute(&self) -> Result<(), String>;

    /// Execute the run scheduled for `tick`. Defaults to [`execute`](Job::execute).
    async fn execute_at(&self, tick: Instant) -> Result<(), String> {
        let _ = tick;
        self.execute().await
    }
}

/// Runs registered jobs on their own intervals until stopped.
///
/// A stop never interrupts a running execution; it takes effect between
/// executions. A stopped scheduler may be started again.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    /// Register a job with the scheduler.
    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Start all registered jobs. Does nothing if already running.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("Job scheduler already running");
            return;
        }
        self.shutdown_tx.send_replace(false);
        info!("Starting job scheduler with {} jobs", self.jobs.len());

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            let handle = tokio::spawn(async move {
                let name = job.name();
                let frequency = job.frequency();
                let mut interval = tokio::time::interval(frequency.duration());
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                // Skip the first immediate tick
                interval.tick().await;

                info!(job = name, frequency = ?frequency, "Job scheduled");

                loop {
                    tokio::select! {
                        biased;
                        changed = shutdown_rx.changed() => {
                            // A dropped scheduler also stops its jobs.
                            if changed.is_err() || *shutdown_rx.borrow() {
                                info!(job = name, "Job shutting down");
                                break;
                            }
                        }
                        tick = interval.tick() => {
                            let start = std::time::Instant::now();

                            match job.execute_at(tick).await {
                                Ok(()) => {
                                    info!(
                                        job = name,
                                        elapsed_ms = start.elapsed().as_millis() as u64,
                                        "Job completed successfully"
                                    );
                                }
                                Err(e) => {
                                    error!(
                                        job = name,
                                        elapsed_ms = start.elapsed().as_millis() as u64,
                                        error = %e,
                                        "Job failed"
                                    );
                                }
                            }
                        }
                    }
                }
            });

            self.handles.push(handle);
        }
    }

    /// Signals every job to stop after its current execution.
    pub fn shutdown(&self) {
        info!("Initiating job scheduler shutdown");
        self.shutdown_tx.send_replace(true);
    }

    /// Waits for every job to stop.
    ///
    /// Returns after `timeout` even if some job is still executing; that
    /// execution is detached and runs to completion, never interrupted.
    pub async fn wait_for_shutdown(&mut self, timeout: Duration) {
        info!("Waiting for jobs to complete (timeout: {:?})", timeout);

        let handles = std::mem::take(&mut self.handles);
        let drain = async move {
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("Job task panicked: {}", e);
                }
            }
        };

        match tokio::time::timeout(timeout, drain).await {
            Ok(()) => info!("All jobs completed gracefully"),
            Err(_) => warn!(
                "Job shutdown timed out after {:?}, leaving running executions detached",
                timeout
            ),
        }
    }

    /// [`shutdown`](Self::shutdown) followed by [`wait_for_shutdown`](Self::wait_for_shutdown).
    pub async fn stop(&mut self, timeout: Duration) {
        self.shutdown();
        self.wait_for_shutdown(timeout).await;
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}
