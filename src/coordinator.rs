use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ProbeConfig;
use crate::dns::QueryDescriptor;
use crate::error::ProbeError;
use crate::prober::{Prober, ProberSettings, WorkerReport};
use crate::stats::{LatencySummary, ProbeStats};
use crate::transport::Exchanger;

/// Final statistics of a probing session.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
	pub name: String,
	pub nameserver_count: usize,
	pub success_count: u64,
	pub error_count: u64,
	pub latency: LatencySummary,
	pub p50_ms: f64,
	pub p90_ms: f64,
	pub p99_ms: f64,
	/// In configuration order
	pub workers: Vec<WorkerReport>,
}

/// Run one prober per nameserver until shutdown or until every budget is spent.
///
/// Configuration problems are reported before any prober starts. Failed
/// attempts, unresolvable nameservers included, are only counted. A prober
/// task that dies stops the whole session; its error is returned once all
/// other probers have been joined.
pub async fn run<E: Exchanger>(
	config: &ProbeConfig,
	exchanger: Arc<E>,
	shutdown: CancellationToken,
) -> Result<Report, ProbeError> {
	config.validate()?;
	let query = Arc::new(QueryDescriptor::new(
		&config.name,
		&config.query_type,
		config.recursion_desired,
	)?);

	let stats = Arc::new(ProbeStats::new());
	let settings = ProberSettings {
		interval: config.interval,
		timeout: config.timeout,
		count: config.count,
		only_errors: config.only_errors,
	};
	// Cancelled on operator interrupt through the parent, or by us on a fault
	let session = shutdown.child_token();

	info!(
		name = %query.name(),
		record_type = %query.record_type(),
		recursion = query.recursion_desired(),
		nameservers = config.nameservers.len(),
		"starting probers"
	);

	let mut workers = JoinSet::new();
	let mut positions = HashMap::new();
	for (idx, target) in config.nameservers.iter().enumerate() {
		let prober = Prober {
			target: target.clone(),
			exchanger: Arc::clone(&exchanger),
			query: Arc::clone(&query),
			stats: Arc::clone(&stats),
			settings,
			shutdown: session.clone(),
		};
		let handle = workers.spawn(prober.run());
		positions.insert(handle.id(), idx);
	}

	let mut reports: Vec<Option<WorkerReport>> = vec![None; config.nameservers.len()];
	let mut fault: Option<ProbeError> = None;
	while let Some(joined) = workers.join_next_with_id().await {
		let join_error = match joined {
			Ok((id, report)) => {
				if let Some(&idx) = positions.get(&id) {
					reports[idx] = Some(report);
				}
				continue;
			}
			Err(join_error) => join_error,
		};
		let nameserver = positions
			.get(&join_error.id())
			.map(|&idx| config.nameservers[idx].address.clone())
			.unwrap_or_default();
		let error = ProbeError::Worker {
			nameserver,
			reason: join_error.to_string(),
		};
		warn!("{}; stopping all probers", error);
		session.cancel();
		fault.get_or_insert(error);
	}

	if let Some(error) = fault {
		return Err(error);
	}

	let latency = stats.latency();
	let report = Report {
		name: config.name.clone(),
		nameserver_count: config.nameservers.len(),
		success_count: stats.success_count(),
		error_count: stats.error_count(),
		latency: latency.export(),
		p50_ms: latency.percentile(50.0),
		p90_ms: latency.percentile(90.0),
		p99_ms: latency.percentile(99.0),
		workers: reports.into_iter().flatten().collect(),
	};
	info!(
		successes = report.success_count,
		errors = report.error_count,
		"all probers finished"
	);
	Ok(report)
}
