//! Summary printing and the JSON results file.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{
    cli::OutputFormat,
    error::{BenchError, BenchResult},
    operations::Module,
    suite::SuiteReport,
};

/// Prints the run summary on stdout.
pub fn print_summary(report: &SuiteReport, format: OutputFormat) -> BenchResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, report, format).map_err(|e| BenchError::Output(e.to_string()))
}

/// Writes the run summary to `out`.
pub fn write_summary<W: Write>(
    out: &mut W,
    report: &SuiteReport,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)
        }
        OutputFormat::Text => write_text(out, report),
    }
}

fn write_text<W: Write>(out: &mut W, report: &SuiteReport) -> io::Result<()> {
    let setup = &report.setup;
    writeln!(out, "Setup")?;
    for (phase, r) in [
        ("registration", &setup.registration),
        ("authorization", &setup.authorization),
        ("products", &setup.products),
    ] {
        if r.skipped {
            writeln!(out, "  {phase:<14} skipped")?;
        } else {
            writeln!(
                out,
                "  {phase:<14} {:>5}/{:<5} ok  {:>4} failed  {:>4} mismatched  {:>8.2}s",
                r.succeeded, r.target, r.failed, r.id_mismatches, r.elapsed_secs
            )?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "{:<28} {:>6} {:>6} {:>9} {:>11} {:>9} {:>9} {:>8}  status",
        "operation", "count", "ok", "tps", "latency_ms", "p50_ms", "p95_ms", "success"
    )?;
    for row in report.results.rows() {
        writeln!(
            out,
            "{:<28} {:>6} {:>6} {:>9.2} {:>11.2} {:>9.2} {:>9.2} {:>7.1}%  {:?}",
            row.label(),
            row.requested_count,
            row.successful_count,
            row.tps,
            row.mean_latency_ms,
            row.p50_latency_ms,
            row.p95_latency_ms,
            row.success_rate * 100.0,
            row.status,
        )?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{:<28} {:>7} {:>18} {:>22} {:>16}",
        "summary", "batches", "tps (mean±std)", "latency_ms (mean±std)", "success (mean)"
    )?;
    for summary in &report.summary {
        writeln!(
            out,
            "{:<28} {:>7} {:>9.2} ± {:<6.2} {:>11.2} ± {:<8.2} {:>15.1}%",
            format!("{}_{}", summary.module, summary.operation),
            summary.batches,
            summary.tps.mean,
            summary.tps.std_dev,
            summary.mean_latency_ms.mean,
            summary.mean_latency_ms.std_dev,
            summary.success_rate.mean * 100.0,
        )?;
    }

    for module in Module::ALL {
        let averages: Vec<_> =
            report.module_averages.iter().filter(|a| a.module == module).collect();
        if averages.is_empty() {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "{module}: average by count")?;
        for avg in averages {
            writeln!(
                out,
                "  {:>6} ops  {:>9.2} tps  {:>9.2} ms",
                avg.requested_count, avg.avg_tps, avg.avg_latency_ms
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Total time: {:.2}s", report.elapsed_secs)
}

/// Writes the full report as pretty-printed JSON to `path`.
pub fn save_results(path: &Path, report: &SuiteReport) -> BenchResult<()> {
    let file = File::create(path)
        .map_err(|e| BenchError::Output(format!("failed to create {}: {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| BenchError::Output(format!("failed to serialize results: {e}")))?;
    writer
        .flush()
        .map_err(|e| BenchError::Output(format!("failed to write {}: {e}", path.display())))?;

    tracing::info!(path = %path.display(), "Results saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dataset::{PhaseReport, SetupReport},
        driver::BatchOutcome,
        gateway::BlockContext,
        metrics::ResultTable,
        suite::PreflightReport,
    };

    fn report() -> SuiteReport {
        let mut results = ResultTable::new();
        let outcome = BatchOutcome {
            attempted: 10,
            successes: 9,
            elapsed_secs: 1.5,
            tps: 6.0,
            mean_latency_ms: 166.7,
            ..Default::default()
        };
        results.record(Module::Ownership, "Register", 10, &outcome);
        results.record(Module::Ownership, "Register", 20, &outcome);

        SuiteReport {
            preflight: PreflightReport {
                chain_id: 1337,
                latest_block: BlockContext { number: 1, timestamp: 2 },
                accounts: Vec::new(),
                canaries: Vec::new(),
            },
            setup: SetupReport {
                registration: PhaseReport { target: 5, attempted: 5, succeeded: 5, ..Default::default() },
                authorization: PhaseReport { skipped: true, ..Default::default() },
                products: PhaseReport::default(),
            },
            summary: results.summarize(),
            module_averages: results.module_averages_by_count(),
            results,
            elapsed_secs: 3.0,
        }
    }

    #[test]
    fn test_text_summary() {
        let mut buf = Vec::new();
        write_summary(&mut buf, &report(), OutputFormat::Text).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Ownership_Register"));
        assert!(text.contains("skipped"));
        assert!(text.contains("90.0%"));
        assert!(text.contains("Ownership: average by count"));
        assert!(!text.contains("Trading: average by count"));
    }

    #[test]
    fn test_json_summary() {
        let mut buf = Vec::new();
        write_summary(&mut buf, &report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["results"].as_array().unwrap().len(), 2);
        assert_eq!(value["results"][0]["module"], "Ownership");
        assert_eq!(value["results"][0]["status"], "completed");
        assert_eq!(value["summary"][0]["batches"], 2);
        assert_eq!(value["setup"]["authorization"]["skipped"], true);
    }

    #[test]
    fn test_save_results_to_missing_directory_fails() {
        let path = std::env::temp_dir().join("datamarket-bench-missing-dir").join("out.json");
        let err = save_results(&path, &report()).unwrap_err();
        assert!(matches!(err, BenchError::Output(_)));
    }

    #[test]
    fn test_save_results_round_trips() {
        let path = std::env::temp_dir()
            .join(format!("datamarket-bench-results-{}.json", std::process::id()));
        save_results(&path, &report()).unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["preflight"]["chain_id"], 1337);
        std::fs::remove_file(&path).unwrap();
    }
}
