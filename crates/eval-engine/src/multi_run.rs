// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Folding per-run outcomes into multi-run statistics.

use crate::metrics::{MultiRunStatistics, RunMetrics};
use crate::report::{ModelFailure, ModelOutcome, ModelReport};
use serde::Serialize;

/// Statistics for one model across runs, plus the per-run metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiRunSummary {
    #[serde(flatten)]
    pub statistics: MultiRunStatistics,
    pub per_run: Vec<RunMetrics>,
}

/// Collects each run's outcomes, per model, in run order.
///
/// A model that fails in any run is reported as failed with that run's
/// index and is not evaluated again. Runs in which a model had no data do
/// not contribute samples.
#[derive(Debug)]
pub struct MultiRunAggregator {
    names: Vec<String>,
    states: Vec<Result<Vec<RunMetrics>, ModelFailure>>,
}

impl MultiRunAggregator {
    pub fn new<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let states = names.iter().map(|_| Ok(Vec::new())).collect();
        Self { names, states }
    }

    /// Which models are still being evaluated, in model order.
    pub fn active(&self) -> Vec<bool> {
        self.states.iter().map(Result::is_ok).collect()
    }

    /// Records run `run`. `outcomes` are in model order; entries for
    /// models that already failed are ignored.
    pub fn record(&mut self, run: usize, outcomes: Vec<ModelOutcome<RunMetrics>>) {
        for (state, outcome) in self.states.iter_mut().zip(outcomes) {
            let failure = match (&mut *state, outcome) {
                (Ok(runs), ModelOutcome::Completed(metrics)) => {
                    runs.push(metrics);
                    continue;
                }
                (Ok(_), ModelOutcome::Failed(failure)) => failure,
                _ => continue,
            };
            *state = Err(failure.in_run(run));
        }
    }

    pub fn finish(self) -> Vec<ModelReport<MultiRunSummary>> {
        self.names
            .into_iter()
            .zip(self.states)
            .map(|(name, state)| {
                let outcome = match state {
                    Ok(per_run) => match MultiRunStatistics::from_runs(&per_run) {
                        Some(statistics) => ModelOutcome::Completed(MultiRunSummary {
                            statistics,
                            per_run,
                        }),
                        None => ModelOutcome::NoData,
                    },
                    Err(failure) => ModelOutcome::Failed(failure),
                };
                ModelReport { name, outcome }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metric;
    use crate::report::FailureStage;
    use approx::assert_relative_eq;

    fn completed(confidence: f64) -> ModelOutcome<RunMetrics> {
        ModelOutcome::Completed(RunMetrics::new([0.1, confidence, 0.3, 0.4], 1, 8))
    }

    fn failed() -> ModelOutcome<RunMetrics> {
        ModelOutcome::Failed(ModelFailure::new(FailureStage::NumericInstability, "NaN", 0))
    }

    #[test]
    fn test_statistics_across_runs() {
        let mut agg = MultiRunAggregator::new(["a"]);
        for (run, c) in [80.0, 90.0, 100.0].into_iter().enumerate() {
            agg.record(run, vec![completed(c)]);
        }
        let reports = agg.finish();
        let summary = reports[0].outcome.completed().unwrap();
        let stat = summary.statistics.get(Metric::Confidence);
        assert_relative_eq!(stat.mean, 90.0);
        assert_relative_eq!(stat.std, (200.0f64 / 3.0).sqrt());
        assert_eq!(summary.per_run.len(), 3);
    }

    #[test]
    fn test_failure_in_any_run_is_reported_with_run_index() {
        let mut agg = MultiRunAggregator::new(["a", "b"]);
        agg.record(0, vec![completed(90.0), completed(90.0)]);
        agg.record(1, vec![completed(91.0), failed()]);
        assert_eq!(agg.active(), vec![true, false]);
        agg.record(2, vec![completed(92.0), ModelOutcome::NoData]);

        let reports = agg.finish();
        assert!(reports[0].outcome.completed().is_some());
        let failure = reports[1].outcome.failure().unwrap();
        assert_eq!(failure.run, Some(1));
        assert_eq!(reports[1].name, "b");
    }

    #[test]
    fn test_no_data_everywhere() {
        let mut agg = MultiRunAggregator::new(["a"]);
        agg.record(0, vec![ModelOutcome::NoData]);
        assert!(agg.finish()[0].outcome.is_no_data());
    }

    #[test]
    fn test_summary_json_flattens_statistics() {
        let mut agg = MultiRunAggregator::new(["a"]);
        agg.record(0, vec![completed(90.0)]);
        let reports = agg.finish();
        let json = serde_json::to_value(&reports[0].outcome).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["confidence_percent_mean"], 90.0);
        assert_eq!(json["confidence_percent_std"], 0.0);
        assert_eq!(json["per_run"].as_array().unwrap().len(), 1);
    }
}
