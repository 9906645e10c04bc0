use std::{
    io::Write,
    sync::{Arc, LazyLock},
};

use mxtls_common::{Signal, internal, logging, tracing};
use mxtls_evaluator::Grade;
use mxtls_processor::{
    CertificateCache, Processor, SecurityTester, TargetTester, TestRun,
    transport::{JsonLinesPublisher, JsonLinesSource},
};
use mxtls_tracing::traced;
use tokio::{io::BufReader, sync::broadcast};

use crate::Config;

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

#[traced(instrument(level = tracing::Level::TRACE))]
async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            internal!("CTRL+C entered -- Enter it again to force shutdown");
        }
        _ = terminate.recv() => {
            internal!("Terminate Signal received, shutting down");
        }
    };

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()))?;

    tokio::signal::ctrl_c().await?;
    internal!(level = WARN, "Forced shutdown, the current batch is abandoned");

    Ok(())
}

pub struct Mxtls {
    config: Config,
}

impl Mxtls {
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    fn tester(&self) -> SecurityTester {
        SecurityTester::new(self.config.smtp.clone(), self.config.timeouts.clone())
    }

    /// Tests the targets read from stdin, one JSON pending test per line,
    /// and writes each published result to stdout until stdin closes or a
    /// shutdown is signalled.
    ///
    /// # Errors
    ///
    /// When the signal handlers cannot be installed.
    #[traced(instrument(level = tracing::Level::TRACE, skip_all, err), timing(precision = "s"))]
    pub async fn serve(self) -> anyhow::Result<()> {
        logging::init(self.config.log_format);
        internal!(level = INFO, "Controller running");

        let processor = Processor::new(
            self.config.processor.clone(),
            Arc::new(JsonLinesSource::new(
                BufReader::new(tokio::io::stdin()),
                self.config.linger(),
            )),
            Arc::new(JsonLinesPublisher::new(tokio::io::stdout())),
            Arc::new(self.tester()),
        );

        let ret = tokio::select! {
            r = processor.serve(SHUTDOWN_BROADCAST.subscribe()) => {
                r.map_err(anyhow::Error::from)
            }
            r = shutdown() => {
                r
            }
        };

        internal!(level = INFO, "Shutting down...");

        ret
    }

    /// Tests a single server and writes its result message to `out`.
    ///
    /// # Errors
    ///
    /// When the run or writing the result fails.
    pub async fn probe(&self, target: &str, out: &mut impl Write) -> anyhow::Result<TestRun> {
        logging::init(self.config.log_format);

        let cache = CertificateCache::new();
        let run = self.tester().run(target, &cache).await?;

        serde_json::to_writer_pretty(&mut *out, &run.to_message(&cache))?;
        writeln!(out)?;

        Ok(run)
    }
}

/// One line per judgment, worst grade last.
pub fn report(run: &TestRun) -> String {
    let mut judgments: Vec<_> = run.evaluation.judgments().iter().collect();
    judgments.sort_by_key(|judgment| judgment.grade);

    let mut lines: Vec<String> = judgments
        .into_iter()
        .map(|judgment| {
            format!(
                "{:<13} {:<58} {}",
                judgment.grade.as_str(),
                judgment.test_type.as_str(),
                judgment.description
            )
        })
        .collect();

    let verdict = if run.is_inconclusive() {
        Grade::Inconclusive
    } else {
        run.evaluation.worst().unwrap_or(Grade::Pass)
    };
    lines.push(format!("{}: {verdict}", run.target));

    lines.join("\n")
}
