use std::sync::Arc;

use mxtls_common::{Signal, internal};
use mxtls_tracing::traced;
use tokio::{sync::broadcast, task::JoinSet, time::MissedTickBehavior};

use crate::{
    CertificateCache, PendingTest, ProcessorConfig, Result, TargetTester, TestRun,
    transport::{PendingTestSource, ResultPublisher},
};

/// What became of each target in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub received: usize,
    pub published: Vec<String>,
    /// Completed, but the chain could not reach a verdict.
    pub inconclusive: Vec<String>,
    /// The run errored, panicked or could not be published.
    pub failed: Vec<String>,
    /// Still running when the batch timeout fired.
    pub timed_out: Vec<String>,
}

/// Pulls batches of pending tests, runs every target concurrently and
/// publishes the conclusive results.
pub struct Processor {
    config: ProcessorConfig,
    source: Arc<dyn PendingTestSource>,
    publisher: Arc<dyn ResultPublisher>,
    tester: Arc<dyn TargetTester>,
}

impl Processor {
    pub fn new(
        config: ProcessorConfig,
        source: Arc<dyn PendingTestSource>,
        publisher: Arc<dyn ResultPublisher>,
        tester: Arc<dyn TargetTester>,
    ) -> Self {
        Self {
            config,
            source,
            publisher,
            tester,
        }
    }

    /// Runs one batch to completion or until the batch timeout, then
    /// acknowledges all of it. Targets that did not finish are dropped with
    /// the batch and are not redelivered.
    ///
    /// # Errors
    ///
    /// Only when the batch cannot be acknowledged. Failures of individual
    /// targets are logged and reported.
    #[traced(instrument(level = tracing::Level::INFO, skip_all, fields(size = batch.len())), timing(precision = "s"))]
    pub async fn process_batch(&self, batch: &[PendingTest]) -> Result<BatchReport> {
        let cache = Arc::new(CertificateCache::new());
        let mut tasks = JoinSet::new();

        for pending in batch {
            let tester = Arc::clone(&self.tester);
            let cache = Arc::clone(&cache);
            let target = pending.id.clone();

            tasks.spawn(async move {
                let run = tester.run(&target, &cache).await;
                (target, run)
            });
        }

        let mut report = BatchReport {
            received: batch.len(),
            ..BatchReport::default()
        };
        let mut running: Vec<&str> = batch.iter().map(|pending| pending.id.as_str()).collect();
        let mut completed: Vec<TestRun> = Vec::with_capacity(batch.len());

        let deadline = tokio::time::sleep(self.config.batch_timeout());
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((target, run))) => {
                        if let Some(index) = running.iter().position(|id| *id == target) {
                            running.remove(index);
                        }

                        match run {
                            Ok(run) => completed.push(run),
                            Err(err) => {
                                internal!(level = ERROR, "Test run for {target} failed: {err}");
                                report.failed.push(target);
                            }
                        }
                    }
                    Some(Err(err)) => {
                        internal!(level = ERROR, "Test run task did not complete: {err}");
                    }
                },
                () = &mut deadline => {
                    report.timed_out = running.drain(..).map(ToOwned::to_owned).collect();
                    internal!(
                        level = WARN,
                        "Batch timed out after {}s, abandoning {:?}",
                        self.config.batch_timeout_secs,
                        report.timed_out
                    );
                    tasks.detach_all();
                    break;
                }
            }
        }

        // Whatever is left never returned, so its task panicked.
        report.failed.extend(running.drain(..).map(ToOwned::to_owned));

        for run in completed {
            if run.is_inconclusive() {
                internal!(level = WARN, "Test run for {} was inconclusive, not publishing", run.target);
                report.inconclusive.push(run.target);
                continue;
            }

            let message = run.to_message(&cache);
            match self.publisher.publish(&message).await {
                Ok(()) => report.published.push(run.target),
                Err(err) => {
                    internal!(level = ERROR, "Failed to publish result for {}: {err}", run.target);
                    report.failed.push(run.target);
                }
            }
        }

        self.source.delete(batch).await?;

        internal!(
            level = INFO,
            "Batch of {} done: {} published, {} inconclusive, {} failed, {} timed out",
            report.received,
            report.published.len(),
            report.inconclusive.len(),
            report.failed.len(),
            report.timed_out.len()
        );

        Ok(report)
    }

    const fn batch_size(&self) -> usize {
        if self.config.max_batch_size == 0 { 1 } else { self.config.max_batch_size }
    }

    /// Receives and processes a single batch. `None` when nothing was waiting.
    ///
    /// # Errors
    ///
    /// When the source cannot be read or acknowledged.
    pub async fn run_once(&self) -> Result<Option<BatchReport>> {
        let batch = self.source.receive(self.batch_size()).await?;
        if batch.is_empty() {
            return Ok(None);
        }

        self.process_batch(&batch).await.map(Some)
    }

    /// Keeps taking batches while the source hands out full ones.
    async fn drain(&self) -> Result<usize> {
        let mut processed = 0;

        while let Some(report) = self.run_once().await? {
            processed += report.received;
            if report.received < self.batch_size() {
                break;
            }
        }

        Ok(processed)
    }

    /// Polls the source until shutdown is signalled or the source is
    /// exhausted. A batch in progress always runs to its end.
    ///
    /// # Errors
    ///
    /// Currently none; source errors are logged and retried on the next poll.
    pub async fn serve(&self, mut shutdown: broadcast::Receiver<Signal>) -> Result<()> {
        internal!(level = INFO, "Processor starting");

        let mut poll = tokio::time::interval(self.config.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    match self.drain().await {
                        Ok(0) => internal!(level = DEBUG, "No pending tests"),
                        Ok(count) => internal!(level = DEBUG, "Processed {count} pending tests"),
                        Err(err) => internal!(level = ERROR, "Error processing pending tests: {err}"),
                    }

                    if self.source.is_exhausted() {
                        internal!(level = INFO, "Pending test source exhausted");
                        break;
                    }
                }
                sig = shutdown.recv() => {
                    match sig {
                        Ok(Signal::Shutdown) => {
                            internal!(level = INFO, "Processor received shutdown signal");
                        }
                        Err(err) => {
                            internal!(level = ERROR, "Processor shutdown channel error: {err}");
                        }
                    }
                    break;
                }
            }
        }

        internal!(level = INFO, "Processor stopped");
        Ok(())
    }
}
