//! Result rows and their aggregation.

use serde::Serialize;

use crate::{
    driver::{BatchOutcome, BatchStatus},
    operations::Module,
};

/// One recorded batch. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationResult {
    /// Target module.
    pub module: Module,
    /// Operation label, e.g. `Register`.
    pub operation: String,
    /// Attempts requested for the batch.
    pub requested_count: usize,
    /// Attempts actually issued.
    pub attempted: usize,
    /// Successful attempts.
    pub successful_count: usize,
    /// Successful operations per second.
    pub tps: f64,
    /// Wall-clock duration of the timed section.
    pub elapsed_secs: f64,
    /// Elapsed time per successful operation, in milliseconds.
    pub mean_latency_ms: f64,
    /// Median latency of successful attempts, in milliseconds.
    pub p50_latency_ms: f64,
    /// 95th percentile latency of successful attempts, in milliseconds.
    pub p95_latency_ms: f64,
    /// `successful_count / requested_count`, in `[0, 1]`.
    pub success_rate: f64,
    /// How the batch ended.
    pub status: BatchStatus,
}

impl OperationResult {
    /// `Module_Operation` label.
    pub fn label(&self) -> String {
        format!("{}_{}", self.module, self.operation)
    }
}

/// Mean and sample standard deviation of one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stat {
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (`n - 1`), zero for a single value.
    pub std_dev: f64,
}

impl Stat {
    /// Computes the statistic over `values`.
    pub fn of(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self::default();
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        if n == 1 {
            return Self { mean, std_dev: 0.0 };
        }
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        Self { mean, std_dev: variance.sqrt() }
    }
}

/// Statistics of every batch of one `(module, operation)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSummary {
    /// Target module.
    pub module: Module,
    /// Operation label.
    pub operation: String,
    /// Number of batches summarized.
    pub batches: usize,
    /// Throughput.
    pub tps: Stat,
    /// Mean latency in milliseconds.
    pub mean_latency_ms: Stat,
    /// Success rate in `[0, 1]`.
    pub success_rate: Stat,
}

/// Average throughput and latency of a module at one requested count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleLoadAverage {
    /// Target module.
    pub module: Module,
    /// Requested batch size.
    pub requested_count: usize,
    /// Batches averaged.
    pub batches: usize,
    /// Mean TPS across the module's operations.
    pub avg_tps: f64,
    /// Mean latency across the module's operations, in milliseconds.
    pub avg_latency_ms: f64,
}

/// Append-only table of batch results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultTable {
    rows: Vec<OperationResult>,
}

impl ResultTable {
    /// Creates an empty table.
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Appends the outcome of a batch and returns the new row.
    pub fn record(
        &mut self,
        module: Module,
        operation: impl Into<String>,
        requested: usize,
        outcome: &BatchOutcome,
    ) -> &OperationResult {
        let success_rate =
            if requested == 0 { 0.0 } else { outcome.successes as f64 / requested as f64 };

        self.rows.push(OperationResult {
            module,
            operation: operation.into(),
            requested_count: requested,
            attempted: outcome.attempted,
            successful_count: outcome.successes,
            tps: outcome.tps,
            elapsed_secs: outcome.elapsed_secs,
            mean_latency_ms: outcome.mean_latency_ms,
            p50_latency_ms: outcome.p50_latency_ms,
            p95_latency_ms: outcome.p95_latency_ms,
            success_rate,
            status: outcome.status,
        });
        &self.rows[self.rows.len() - 1]
    }

    /// All rows in recording order.
    pub fn rows(&self) -> &[OperationResult] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Groups rows by `(module, operation)` in order of first appearance.
    pub fn summarize(&self) -> Vec<OperationSummary> {
        let mut keys: Vec<(Module, &str)> = Vec::new();
        for row in &self.rows {
            let key = (row.module, row.operation.as_str());
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        keys.into_iter()
            .map(|(module, operation)| {
                let group: Vec<&OperationResult> = self
                    .rows
                    .iter()
                    .filter(|r| r.module == module && r.operation == operation)
                    .collect();
                let metric = |f: fn(&OperationResult) -> f64| {
                    Stat::of(&group.iter().map(|r| f(r)).collect::<Vec<_>>())
                };

                OperationSummary {
                    module,
                    operation: operation.to_string(),
                    batches: group.len(),
                    tps: metric(|r| r.tps),
                    mean_latency_ms: metric(|r| r.mean_latency_ms),
                    success_rate: metric(|r| r.success_rate),
                }
            })
            .collect()
    }

    /// Averages TPS and latency per `(module, requested count)`, in order of
    /// first appearance.
    pub fn module_averages_by_count(&self) -> Vec<ModuleLoadAverage> {
        let mut averages: Vec<ModuleLoadAverage> = Vec::new();
        for row in &self.rows {
            match averages
                .iter_mut()
                .find(|a| a.module == row.module && a.requested_count == row.requested_count)
            {
                Some(avg) => {
                    avg.batches += 1;
                    avg.avg_tps += row.tps;
                    avg.avg_latency_ms += row.mean_latency_ms;
                }
                None => averages.push(ModuleLoadAverage {
                    module: row.module,
                    requested_count: row.requested_count,
                    batches: 1,
                    avg_tps: row.tps,
                    avg_latency_ms: row.mean_latency_ms,
                }),
            }
        }

        for avg in &mut averages {
            avg.avg_tps /= avg.batches as f64;
            avg.avg_latency_ms /= avg.batches as f64;
        }
        averages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(successes: usize, tps: f64, latency: f64) -> BatchOutcome {
        BatchOutcome {
            attempted: successes,
            successes,
            elapsed_secs: 1.0,
            tps,
            mean_latency_ms: latency,
            ..Default::default()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_record_appends_rows_in_order() {
        let mut table = ResultTable::new();
        let row = table.record(Module::Ownership, "Register", 10, &outcome(8, 8.0, 125.0));
        assert!(close(row.success_rate, 0.8));
        assert_eq!(row.label(), "Ownership_Register");

        table.record(Module::Trading, "GetHistory", 20, &outcome(20, 40.0, 25.0));
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].operation, "GetHistory");
        assert_eq!(table.rows()[0].requested_count, 10);
    }

    #[test]
    fn test_zero_requested_has_zero_rate() {
        let mut table = ResultTable::new();
        let row = table.record(Module::Processing, "Revoke", 0, &BatchOutcome::default());
        assert_eq!(row.success_rate, 0.0);
        assert_eq!(row.tps, 0.0);
    }

    #[test]
    fn test_stat_sample_std() {
        let stat = Stat::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!(close(stat.mean, 5.0));
        assert!(close(stat.std_dev, (32.0_f64 / 7.0).sqrt()));

        assert_eq!(Stat::of(&[3.5]), Stat { mean: 3.5, std_dev: 0.0 });
        assert_eq!(Stat::of(&[]), Stat::default());
    }

    #[test]
    fn test_summarize_groups_by_operation() {
        let mut table = ResultTable::new();
        table.record(Module::Ownership, "Verify", 10, &outcome(10, 10.0, 100.0));
        table.record(Module::Processing, "Verify", 10, &outcome(5, 5.0, 200.0));
        table.record(Module::Ownership, "Verify", 20, &outcome(10, 20.0, 50.0));

        let summary = table.summarize();
        assert_eq!(summary.len(), 2);

        let ownership = &summary[0];
        assert_eq!((ownership.module, ownership.operation.as_str()), (Module::Ownership, "Verify"));
        assert_eq!(ownership.batches, 2);
        assert!(close(ownership.tps.mean, 15.0));
        assert!(close(ownership.tps.std_dev, 50.0_f64.sqrt()));
        assert!(close(ownership.mean_latency_ms.mean, 75.0));
        assert!(close(ownership.success_rate.mean, 0.75));

        let processing = &summary[1];
        assert_eq!(processing.batches, 1);
        assert_eq!(processing.tps.std_dev, 0.0);
        assert!(close(processing.success_rate.mean, 0.5));
    }

    #[test]
    fn test_module_averages_by_count() {
        let mut table = ResultTable::new();
        table.record(Module::Trading, "CreateProduct", 10, &outcome(10, 4.0, 250.0));
        table.record(Module::Trading, "GetHistory", 10, &outcome(10, 100.0, 10.0));
        table.record(Module::Trading, "CreateProduct", 20, &outcome(20, 5.0, 200.0));

        let averages = table.module_averages_by_count();
        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].requested_count, 10);
        assert_eq!(averages[0].batches, 2);
        assert!(close(averages[0].avg_tps, 52.0));
        assert!(close(averages[0].avg_latency_ms, 130.0));
        assert!(close(averages[1].avg_tps, 5.0));
    }

    #[test]
    fn test_summary_leaves_rows_untouched() {
        let mut table = ResultTable::new();
        table.record(Module::Ownership, "Transfer", 10, &outcome(3, 3.0, 333.0));
        let before = table.clone();
        let _ = table.summarize();
        let _ = table.module_averages_by_count();
        assert_eq!(table, before);
    }
}
