use std::fmt::{Display, Write};

use anyhow::Result;
use chrono::{DateTime, TimeZone};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};

use crate::coordinator::Report;
use crate::prober::ProbeOutcome;
use crate::stats::percentage;

/// Render the block printed for one attempt.
///
/// Returns `None` for a success when only errors are wanted.
pub fn render_outcome<Tz>(
	nameserver: &str,
	outcome: &ProbeOutcome,
	only_errors: bool,
	at: DateTime<Tz>,
) -> Option<String>
where
	Tz: TimeZone,
	Tz::Offset: Display,
{
	if only_errors && !outcome.is_error() {
		return None;
	}

	let mut block = String::new();
	let _ = writeln!(block, "{}", at.format("%Y-%m-%d %H:%M:%S%.6f %z"));
	let _ = writeln!(block, "Nameserver: {}", nameserver);
	match outcome {
		ProbeOutcome::TransportError { reason, elapsed } => {
			let _ = writeln!(block, "Exchange failed: {} (rtt: {:?})", reason, elapsed);
		}
		ProbeOutcome::ProtocolError { response_code, elapsed } => {
			let _ = writeln!(block, "Bad RCODE: {} (rtt: {:?})", response_code, elapsed);
		}
		ProbeOutcome::Success { answers, .. } => {
			for answer in answers {
				let _ = writeln!(block, "{}", answer);
			}
		}
	}
	Some(block)
}

/// Render the final statistics block.
pub fn render_summary(report: &Report) -> String {
	let total = report.error_count + report.success_count;
	// 0 errors, 1 error, 2 errors...
	let plural = if report.error_count == 1 { "" } else { "s" };

	let mut out = String::new();
	let _ = writeln!(out, "--- {} dns check statistics ---", report.name);
	let _ = writeln!(
		out,
		"{} error{} ({:.2}%) and {} success ({:.2}%) for {} nameservers.",
		report.error_count,
		plural,
		percentage(report.error_count, total),
		report.success_count,
		percentage(report.success_count, total),
		report.nameserver_count,
	);
	let _ = writeln!(
		out,
		"round-trip min/avg/max = {:.3}/{:.3}/{:.3} ms",
		report.latency.min_ms, report.latency.avg_ms, report.latency.max_ms,
	);
	let _ = write!(
		out,
		"round-trip p50/p90/p99 = {:.3}/{:.3}/{:.3} ms",
		report.p50_ms, report.p90_ms, report.p99_ms,
	);
	out
}

pub fn print_summary(report: &Report) {
	println!("{}", render_summary(report));
}

/// Build the per-nameserver results table.
pub fn breakdown_table(report: &Report) -> Table {
	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(vec![
		"Nameserver", "Attempts", "Success", "Errors",
		"Success %", "Min", "Avg", "Max",
	]);

	for w in &report.workers {
		table.add_row(vec![
			w.nameserver.clone(),
			w.attempts.to_string(),
			w.successes.to_string(),
			w.errors.to_string(),
			format!("{:.1}%", percentage(w.successes, w.attempts)),
			format!("{:.3} ms", w.latency.min_ms),
			format!("{:.3} ms", w.latency.avg_ms),
			format!("{:.3} ms", w.latency.max_ms),
		]);
	}
	table
}

pub fn print_breakdown(report: &Report) {
	println!("\nPer-nameserver results");
	println!("======================\n");
	println!("{}", breakdown_table(report));
}

/// Write per-nameserver results to a CSV file.
pub fn write_csv(path: &str, report: &Report) -> Result<()> {
	let mut writer = csv::Writer::from_path(path)?;

	writer.write_record([
		"nameserver", "attempts", "successes", "errors",
		"success_rate", "min_ms", "avg_ms", "max_ms", "stddev_ms",
	])?;

	for w in &report.workers {
		writer.write_record([
			w.nameserver.clone(),
			w.attempts.to_string(),
			w.successes.to_string(),
			w.errors.to_string(),
			format!("{:.2}", percentage(w.successes, w.attempts)),
			format!("{:.3}", w.latency.min_ms),
			format!("{:.3}", w.latency.avg_ms),
			format!("{:.3}", w.latency.max_ms),
			format!("{:.3}", w.latency.stddev_ms),
		])?;
	}

	writer.flush()?;
	tracing::info!("results written to {}", path);
	Ok(())
}
