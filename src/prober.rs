use std::sync::Arc;
use std::time::Duration;

use hickory_proto::op::ResponseCode;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dns::{rcode_name, QueryDescriptor};
use crate::output::render_outcome;
use crate::stats::{LatencyHistogram, LatencySummary, ProbeStats};
use crate::transport::{ExchangeFailure, Exchanged, Exchanger, NameserverTarget};

/// Classified result of one query attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
	Success {
		latency_ms: f64,
		answers: Vec<String>,
	},
	TransportError {
		reason: String,
		elapsed: Duration,
	},
	ProtocolError {
		response_code: String,
		elapsed: Duration,
	},
}

impl ProbeOutcome {
	pub fn classify(result: Result<Exchanged, ExchangeFailure>) -> Self {
		match result {
			Err(failure) => ProbeOutcome::TransportError {
				reason: failure.error.to_string(),
				elapsed: failure.elapsed,
			},
			Ok(exchanged) if exchanged.response.response_code() != ResponseCode::NoError => {
				ProbeOutcome::ProtocolError {
					response_code: rcode_name(exchanged.response.response_code()),
					elapsed: exchanged.rtt,
				}
			}
			Ok(exchanged) => ProbeOutcome::Success {
				latency_ms: exchanged.rtt.as_secs_f64() * 1000.0,
				answers: exchanged
					.response
					.answers()
					.iter()
					.map(|record| record.to_string())
					.collect(),
			},
		}
	}

	pub fn is_error(&self) -> bool {
		!matches!(self, ProbeOutcome::Success { .. })
	}
}

/// Loop parameters shared by every prober of a session.
#[derive(Debug, Clone, Copy)]
pub struct ProberSettings {
	pub interval: Duration,
	pub timeout: Duration,
	/// Attempts before stopping, 0 = until shutdown
	pub count: u64,
	pub only_errors: bool,
}

/// What one prober did, for the per-nameserver breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
	pub nameserver: String,
	pub attempts: u64,
	pub successes: u64,
	pub errors: u64,
	pub latency: LatencySummary,
}

/// Polling loop against a single nameserver.
pub struct Prober<E> {
	pub target: NameserverTarget,
	pub exchanger: Arc<E>,
	pub query: Arc<QueryDescriptor>,
	pub stats: Arc<ProbeStats>,
	pub settings: ProberSettings,
	pub shutdown: CancellationToken,
}

impl<E: Exchanger> Prober<E> {
	/// Probe until shutdown or until the attempt budget is spent.
	///
	/// Every failure, including a failed lookup of the nameserver, is
	/// counted and printed as an error of that attempt.
	pub async fn run(self) -> WorkerReport {
		let address = self.target.address.clone();
		let mut report = WorkerReport {
			nameserver: address.clone(),
			attempts: 0,
			successes: 0,
			errors: 0,
			latency: LatencySummary::default(),
		};

		info!(nameserver = %address, "prober started");

		let local_latency = LatencyHistogram::new();
		let interval = self.settings.interval;
		let mut ticker = interval_at(Instant::now() + interval, interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

		while self.settings.count == 0 || report.attempts < self.settings.count {
			if self.shutdown.is_cancelled() {
				break;
			}
			tokio::select! {
				biased;
				_ = self.shutdown.cancelled() => break,
				_ = ticker.tick() => {}
			}

			// An in-flight exchange is bounded by its own timeout, not by shutdown
			let result = self
				.exchanger
				.exchange(&self.target, &self.query, self.settings.timeout)
				.await;
			report.attempts += 1;

			let outcome = ProbeOutcome::classify(result);
			match &outcome {
				ProbeOutcome::Success { latency_ms, .. } => {
					self.stats.record_success(*latency_ms);
					local_latency.record(*latency_ms);
					report.successes += 1;
				}
				_ => {
					self.stats.record_error();
					report.errors += 1;
				}
			}
			debug!(nameserver = %address, attempt = report.attempts, ?outcome, "attempt finished");

			if let Some(block) =
				render_outcome(&address, &outcome, self.settings.only_errors, chrono::Local::now())
			{
				println!("{}", block);
			}
		}

		report.latency = local_latency.export();
		info!(
			nameserver = %address,
			attempts = report.attempts,
			errors = report.errors,
			"prober stopped"
		);
		report
	}
}
