use std::{collections::BTreeSet, sync::Arc};

use anyhow::Result;
use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::json;
use shared_logging::LogLevel;
use tracing::info;

use crate::{
    classifier::ClassifierRoster,
    config::EnsembleConfig,
    engine::{EnsembleEngine, RunParameters},
    error::{EnsembleError, EnsembleResult},
    prediction::FinalPrediction,
    report::{self, ReportHeader},
    telemetry::EnsembleTelemetry,
};

/// Counts over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Sequences evaluated.
    pub total: usize,
    /// Sequences resolved to NA.
    pub na: usize,
    /// Sequences called with more than one label.
    pub multi_function: usize,
}

/// Final calls for a batch, in sequence ID order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    parameters: RunParameters,
    predictions: IndexMap<String, FinalPrediction>,
    summary: BatchSummary,
}

impl BatchOutcome {
    fn new(parameters: RunParameters, predictions: IndexMap<String, FinalPrediction>) -> Self {
        let summary = BatchSummary {
            total: predictions.len(),
            na: predictions.values().filter(|p| p.is_na()).count(),
            multi_function: predictions.values().filter(|p| p.is_multi_function()).count(),
        };
        Self {
            parameters,
            predictions,
            summary,
        }
    }

    /// Prediction for one sequence.
    #[must_use]
    pub fn get(&self, sequence_id: &str) -> Option<&FinalPrediction> {
        self.predictions.get(sequence_id)
    }

    /// All predictions keyed by sequence ID.
    #[must_use]
    pub const fn predictions(&self) -> &IndexMap<String, FinalPrediction> {
        &self.predictions
    }

    /// Predictions in sequence ID order.
    pub fn iter(&self) -> impl Iterator<Item = &FinalPrediction> + '_ {
        self.predictions.values()
    }

    /// Batch counts.
    #[must_use]
    pub const fn summary(&self) -> BatchSummary {
        self.summary
    }

    /// Parameters the batch ran with.
    #[must_use]
    pub const fn parameters(&self) -> RunParameters {
        self.parameters
    }

    /// Short-form report stamped with the current time.
    #[must_use]
    pub fn render_short(&self) -> String {
        report::render_short(&ReportHeader::new(&self.parameters), self.iter())
    }

    /// Long-form report stamped with the current time.
    #[must_use]
    pub fn render_long(&self) -> String {
        report::render_long(&ReportHeader::new(&self.parameters), self.iter())
    }
}

/// Evaluates batches of sequences across the blocking pool.
#[derive(Debug, Clone)]
pub struct EnsembleRuntime {
    engine: Arc<EnsembleEngine>,
    workers: usize,
    telemetry: Option<EnsembleTelemetry>,
}

impl EnsembleRuntime {
    /// Single-worker runtime without telemetry.
    #[must_use]
    pub fn new(engine: EnsembleEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            workers: 1,
            telemetry: None,
        }
    }

    /// Sets how many chunks a batch is split into.
    pub fn with_workers(mut self, workers: usize) -> EnsembleResult<Self> {
        if workers == 0 {
            return Err(EnsembleError::InvalidWorkerCount);
        }
        self.workers = workers;
        Ok(self)
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: EnsembleTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Builds a runtime from configuration, opening the configured log file.
    pub fn from_config(config: &EnsembleConfig, roster: ClassifierRoster) -> Result<Self> {
        config.validate()?;
        let engine = EnsembleEngine::new(roster, config.run_parameters()?);
        let mut builder = EnsembleTelemetry::builder(config.telemetry.module.clone());
        if let Some(path) = &config.telemetry.log_path {
            builder = builder.log_path(path);
        }
        Ok(Self::new(engine)
            .with_workers(config.workers)?
            .with_telemetry(builder.build()?))
    }

    /// Engine shared by every worker.
    #[must_use]
    pub fn engine(&self) -> &EnsembleEngine {
        &self.engine
    }

    /// Configured worker count.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Evaluates every sequence any classifier listed.
    pub async fn run_roster(&self) -> Result<BatchOutcome> {
        let universe = self.engine.roster().sequence_ids();
        self.run(universe).await
    }

    /// Evaluates a batch. Duplicate IDs collapse; the outcome does not
    /// depend on input order or worker count.
    #[tracing::instrument(skip_all, fields(workers = self.workers))]
    pub async fn run<I, S>(&self, sequence_ids: I) -> Result<BatchOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ordered: Vec<String> = sequence_ids
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.log(
            "ensemble.batch.started",
            json!({ "sequences": ordered.len(), "workers": self.workers }),
        );

        let chunk_size = ordered.len().div_ceil(self.workers).max(1);
        let tasks = ordered.chunks(chunk_size).map(|chunk| {
            let engine = Arc::clone(&self.engine);
            let chunk = chunk.to_vec();
            tokio::task::spawn_blocking(move || {
                chunk
                    .into_iter()
                    .map(|sequence_id| {
                        let prediction = engine.predict(&sequence_id);
                        (sequence_id, prediction)
                    })
                    .collect::<Vec<_>>()
            })
        });

        // Chunks are contiguous slices of the sorted IDs and join_all keeps
        // task order, so concatenation stays sorted.
        let mut predictions = IndexMap::with_capacity(ordered.len());
        for chunk in join_all(tasks).await {
            predictions.extend(chunk?);
        }

        let outcome = BatchOutcome::new(self.engine.parameters(), predictions);
        let summary = outcome.summary();
        info!(
            total = summary.total,
            na = summary.na,
            multi_function = summary.multi_function,
            "ensemble.batch.completed"
        );
        self.log("ensemble.batch.completed", json!(summary));
        if let Some(tel) = &self.telemetry {
            tel.emit(
                "ensemble.batch.completed",
                json!({
                    "method": self.engine.parameters().describe(),
                    "summary": summary,
                }),
            )
            .await?;
        }
        Ok(outcome)
    }

    fn log(&self, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            if let Err(err) = tel.log(LogLevel::Info, message, metadata) {
                tracing::warn!(error = ?err, "ensemble log write failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classifier::Classifier,
        decision::{Threshold, ThresholdMode, VotingScheme},
    };
    use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};
    use shared_event_bus::MemoryEventBus;
    use shared_logging::MemoryLogSink;

    fn roster() -> ClassifierRoster {
        let mut blast = Classifier::new("BLAST")
            .with_weight("EF1", 0.9)
            .unwrap()
            .with_weight("EF2", 0.6)
            .unwrap();
        let mut priam = Classifier::new("Priam").with_weight("EF3", 0.4).unwrap();
        for n in 0..40 {
            let id = format!("Q{n:02}");
            match n % 4 {
                0 => blast.record(id, ["EF1", "EF2"]),
                1 => priam.record(id, ["EF3"]),
                2 => {
                    blast.record(id.clone(), ["EF2"]);
                    priam.record(id, ["EF3"]);
                }
                _ => priam.record(id, Vec::<String>::new()),
            }
        }
        ClassifierRoster::from_classifiers([blast, priam]).unwrap()
    }

    fn engine() -> EnsembleEngine {
        let threshold = Threshold::new(ThresholdMode::AbsoluteFloor, 0.5).unwrap();
        EnsembleEngine::new(roster(), RunParameters::new(VotingScheme::MaxWeight, threshold))
    }

    #[tokio::test]
    async fn outcome_is_independent_of_order_and_workers() {
        let baseline = EnsembleRuntime::new(engine()).run_roster().await.unwrap();
        let mut ids: Vec<String> = baseline.predictions().keys().cloned().collect();
        ids.push("Q00".into());
        let mut rng = SmallRng::seed_from_u64(7);
        for workers in [1, 3, 8, 64] {
            ids.shuffle(&mut rng);
            let runtime = EnsembleRuntime::new(engine()).with_workers(workers).unwrap();
            let outcome = runtime.run(ids.clone()).await.unwrap();
            let keys: Vec<&String> = outcome.predictions().keys().collect();
            let expected: Vec<&String> = baseline.predictions().keys().collect();
            assert_eq!(keys, expected, "workers={workers}");
            for (id, prediction) in outcome.predictions() {
                assert_eq!(prediction.entries(), baseline.predictions()[id].entries());
            }
        }
    }

    #[tokio::test]
    async fn summary_counts_na_and_multi_function() {
        let outcome = EnsembleRuntime::new(engine())
            .with_workers(4)
            .unwrap()
            .run_roster()
            .await
            .unwrap();
        assert_eq!(
            outcome.summary(),
            BatchSummary {
                total: 40,
                na: 10,
                multi_function: 20,
            }
        );
        assert_eq!(outcome.get("Q00").unwrap().labels(), vec!["EF1", "EF2"]);
        // EF2 0.6 against EF3 0.4 with a 0.5 floor: cutoff 0.1 keeps both.
        assert_eq!(outcome.get("Q02").unwrap().labels(), vec!["EF2", "EF3"]);
        assert!(outcome.get("Q03").unwrap().is_na());
    }

    #[tokio::test]
    async fn batch_reports_through_telemetry() {
        let sink = Arc::new(MemoryLogSink::new());
        let bus = Arc::new(MemoryEventBus::new(8));
        let telemetry = EnsembleTelemetry::builder("ensemble")
            .log_sink(sink.clone())
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        let runtime = EnsembleRuntime::new(engine()).with_telemetry(telemetry);
        let outcome = runtime.run(["Q00", "Q01", "Q99"]).await.unwrap();
        assert_eq!(outcome.summary().na, 1);
        assert_eq!(sink.with_message("ensemble.batch.started").len(), 1);
        assert_eq!(sink.with_message("ensemble.batch.completed").len(), 1);
        let events = bus.events_of_type("ensemble.batch.completed");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload["summary"]["total"], 3);
    }

    #[tokio::test]
    async fn empty_batch_and_reports() {
        let runtime = EnsembleRuntime::new(engine()).with_workers(2).unwrap();
        let outcome = runtime.run(Vec::<String>::new()).await.unwrap();
        assert_eq!(outcome.summary(), BatchSummary::default());
        assert_eq!(outcome.render_short().lines().count(), 2);

        let outcome = runtime.run(["Q01"]).await.unwrap();
        assert!(outcome.render_short().ends_with("Q01\tEF3\n"));
        assert!(outcome.render_long().contains(">Q01\tEF3 (0.4)\nPriam\tEF3 (0.400)\n"));
    }

    #[test]
    fn rejects_zero_workers_and_reads_config() {
        assert!(matches!(
            EnsembleRuntime::new(engine()).with_workers(0),
            Err(EnsembleError::InvalidWorkerCount)
        ));
        let config = EnsembleConfig::from_toml_str("scheme = \"plurality\"\nworkers = 2").unwrap();
        let runtime = EnsembleRuntime::from_config(&config, roster()).unwrap();
        assert_eq!(runtime.workers(), 2);
        assert_eq!(runtime.engine().parameters().scheme, VotingScheme::Plurality);
    }
}
