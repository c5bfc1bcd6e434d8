//! Batch evaluation of frame records.

use crate::metrics::{FrameEvaluator, FrameResult};
use crate::{Error, EvaluationConfig, FailurePolicy, FrameRecord, Result};
use rayon::prelude::*;

/// Output of an evaluation run.
#[derive(Debug, Clone, Default)]
pub struct EvaluationRun {
    /// Metrics of every successfully evaluated frame, in record order.
    pub results: Vec<FrameResult>,
    /// Frames left out under [`FailurePolicy::Skip`], with the reason.
    pub failures: Vec<(FrameRecord, String)>,
}

/// Evaluates frame records with a [`FrameEvaluator`] in parallel.
///
/// Frames are independent, so they are evaluated on a rayon pool; the
/// failure policy is applied once every frame has finished.
pub struct Evaluator {
    config: EvaluationConfig,
    frame_evaluator: FrameEvaluator,
    pool: Option<rayon::ThreadPool>,
}

impl Evaluator {
    /// Create an evaluator, validating the configuration.
    pub fn new(config: EvaluationConfig) -> Result<Self> {
        config.validate()?;

        let pool = match config.threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| {
                        Error::InvalidConfig(format!("failed to configure thread pool: {}", e))
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            frame_evaluator: FrameEvaluator::from_config(&config),
            config,
            pool,
        })
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Evaluate every record.
    pub fn evaluate(&self, records: &[FrameRecord]) -> Result<EvaluationRun> {
        self.evaluate_with_progress(records, |_| {})
    }

    /// Evaluate every record, calling `on_frame_done` (from worker threads)
    /// with the record after each frame finishes.
    pub fn evaluate_with_progress<F>(
        &self,
        records: &[FrameRecord],
        on_frame_done: F,
    ) -> Result<EvaluationRun>
    where
        F: Fn(&FrameRecord) + Sync,
    {
        log::info!(
            "evaluating {} frame pairs ({:?} on failure)",
            records.len(),
            self.config.failure_policy
        );

        let evaluate_all = || -> Vec<Result<FrameResult>> {
            records
                .par_iter()
                .map(|record| {
                    let metrics = self.frame_evaluator.evaluate_record(record);
                    on_frame_done(record);
                    metrics.map(|metrics| FrameResult {
                        record: record.clone(),
                        metrics,
                    })
                })
                .collect()
        };

        let outcomes = match &self.pool {
            Some(pool) => pool.install(evaluate_all),
            None => evaluate_all(),
        };

        self.apply_failure_policy(records, outcomes)
    }

    fn apply_failure_policy(
        &self,
        records: &[FrameRecord],
        outcomes: Vec<Result<FrameResult>>,
    ) -> Result<EvaluationRun> {
        let mut run = EvaluationRun::default();

        for (record, outcome) in records.iter().zip(outcomes) {
            match outcome {
                Ok(result) => run.results.push(result),
                Err(e) if e.is_frame_local() && self.config.failure_policy == FailurePolicy::Skip => {
                    log::warn!(
                        "skipping {}/{} ({}): {}",
                        record.sequence,
                        record.filename,
                        record.method,
                        e
                    );
                    run.failures.push((record.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        log::info!(
            "evaluated {} frame pairs, skipped {}",
            run.results.len(),
            run.failures.len()
        );
        Ok(run)
    }
}
