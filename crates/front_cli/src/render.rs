//! Text and JSON rendering of run results.
//!
//! Text tables round for display only (distance to whole metres, daily
//! delta to 0.1 m, scores and probabilities to 3 decimals). JSON output
//! carries full precision.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use front_core::{BatchSummary, OutcomeCounts, RunOutcome, RunResult, SimConfig};
use serde::Serialize;

/// One trajectory as a day-by-day table.
pub fn render_trajectory(result: &RunResult) -> String {
    let report = &result.report;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} ({}) | scenario {}",
        report.city_name, report.city_id, report.scenario
    );
    if !report.snapshots.is_empty() {
        let _ = writeln!(
            out,
            "{:>4} {:>10} {:>9} {:>13} {:>10}  {}",
            "day", "dist_m", "delta_m", "encirclement", "p_capture", "status"
        );
    }
    for s in &report.snapshots {
        let _ = writeln!(
            out,
            "{:>4} {:>10.0} {:>9.1} {:>13.3} {:>10.3}  {}",
            s.day, s.dist_to_front, s.delta_real, s.encirclement, s.prob_capture, s.status
        );
    }
    let _ = writeln!(out, "=> {}", describe_outcome(&result.outcome));
    out
}

pub fn describe_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Occupied { fall_day } => format!("OCCUPIED on day {}", fall_day),
        RunOutcome::Exhausted { horizon } => format!("holds through day {}", horizon),
        RunOutcome::AlreadyOccupied => "already occupied, not simulated".to_string(),
        RunOutcome::Errored { error } => format!("ERRORED: {}", error),
        RunOutcome::Cancelled => "cancelled".to_string(),
    }
}

/// One line per (city, scenario) plus outcome totals.
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:<13} {:<17} {:>8} {:>5} {:>10}",
        "city", "scenario", "outcome", "fall_day", "days", "p_capture"
    );
    for r in &summary.results {
        let fall_day = r
            .outcome
            .fall_day()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let prob = r
            .report
            .final_prob_capture()
            .map(|p| format!("{:.3}", p))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<20} {:<13} {:<17} {:>8} {:>5} {:>10}",
            r.city_id(),
            r.scenario().to_string(),
            r.outcome.label(),
            fall_day,
            r.report.days_simulated(),
            prob
        );
    }
    let _ = writeln!(out, "{}", render_counts(&summary.counts()));
    out
}

fn render_counts(counts: &OutcomeCounts) -> String {
    format!(
        "{} runs: {} occupied, {} exhausted, {} already occupied, {} errored, {} cancelled",
        counts.total(),
        counts.occupied,
        counts.exhausted,
        counts.already_occupied,
        counts.errored,
        counts.cancelled
    )
}

/// Batch output document.
#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub schema_version: u8,
    pub engine_version: &'static str,
    pub generated_at: DateTime<Utc>,
    /// Latest observation date in the feature table.
    pub seed_date: Option<NaiveDate>,
    pub config: &'a SimConfig,
    pub counts: OutcomeCounts,
    pub results: &'a [RunResult],
}

impl<'a> BatchReport<'a> {
    pub fn new(
        summary: &'a BatchSummary,
        config: &'a SimConfig,
        seed_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            schema_version: front_core::SCHEMA_VERSION,
            engine_version: front_core::VERSION,
            generated_at: Utc::now(),
            seed_date,
            config,
            counts: summary.counts(),
            results: &summary.results,
        }
    }
}

pub fn write_json<W: Write, T: Serialize>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}
