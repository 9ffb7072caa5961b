use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Upper bucket edges in milliseconds; one extra bucket catches everything above.
const BUCKET_EDGES_MS: [f64; 47] = [
	0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0,
	1.2, 1.4, 1.6, 1.8, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5,
	5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 20.0, 30.0, 40.0, 50.0,
	60.0, 70.0, 80.0, 90.0, 100.0, 200.0, 300.0, 400.0, 500.0, 750.0,
	1000.0, 2000.0, 3000.0, 4000.0, 5000.0, 7500.0, 10000.0,
];

/// Exported view of the latency distribution.
///
/// All fields are zero when no sample was recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencySummary {
	pub count: u64,
	pub min_ms: f64,
	pub avg_ms: f64,
	pub max_ms: f64,
	pub stddev_ms: f64,
}

#[derive(Debug)]
struct HistogramState {
	count: u64,
	sum: f64,
	sum_sq: f64,
	min: f64,
	max: f64,
	buckets: [u64; BUCKET_EDGES_MS.len() + 1],
}

impl Default for HistogramState {
	fn default() -> Self {
		HistogramState {
			count: 0,
			sum: 0.0,
			sum_sq: 0.0,
			min: f64::MAX,
			max: f64::MIN,
			buckets: [0; BUCKET_EDGES_MS.len() + 1],
		}
	}
}

/// Streaming latency histogram shared by all probers.
#[derive(Debug, Default)]
pub struct LatencyHistogram {
	state: Mutex<HistogramState>,
}

impl LatencyHistogram {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, HistogramState> {
		// A panicking recorder cannot leave the state half-written
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Record one latency sample in milliseconds. Negative or NaN values are ignored.
	pub fn record(&self, value_ms: f64) {
		if value_ms.is_nan() || value_ms < 0.0 {
			return;
		}
		let idx = bucket_index(value_ms);
		let mut state = self.lock();
		state.count += 1;
		state.sum += value_ms;
		state.sum_sq += value_ms * value_ms;
		state.min = state.min.min(value_ms);
		state.max = state.max.max(value_ms);
		state.buckets[idx] += 1;
	}

	pub fn export(&self) -> LatencySummary {
		let state = self.lock();
		if state.count == 0 {
			return LatencySummary::default();
		}
		let n = state.count as f64;
		let avg = state.sum / n;
		let variance = (state.sum_sq / n - avg * avg).max(0.0);
		LatencySummary {
			count: state.count,
			min_ms: state.min,
			avg_ms: avg,
			max_ms: state.max,
			stddev_ms: variance.sqrt(),
		}
	}

	/// Estimate the p-th percentile from the bucket counts.
	///
	/// Args:
	///   p: Percentile between 0.0 and 100.0 (e.g. 50.0 for median).
	///
	/// Returns:
	///   0.0 when nothing was recorded, otherwise a value interpolated
	///   linearly inside the matching bucket and clamped to [min, max].
	pub fn percentile(&self, p: f64) -> f64 {
		let state = self.lock();
		if state.count == 0 {
			return 0.0;
		}
		let target = (p.clamp(0.0, 100.0) / 100.0) * state.count as f64;
		let mut cumulative = 0u64;
		for (i, &n) in state.buckets.iter().enumerate() {
			if n == 0 {
				continue;
			}
			let before = cumulative;
			cumulative += n;
			if (cumulative as f64) < target {
				continue;
			}
			let low = if i == 0 { 0.0 } else { BUCKET_EDGES_MS[i - 1] };
			let high = BUCKET_EDGES_MS.get(i).copied().unwrap_or(state.max);
			let low = low.max(state.min);
			let high = high.min(state.max);
			let fraction = (target - before as f64) / n as f64;
			let value = low + (high - low) * fraction.clamp(0.0, 1.0);
			return value.clamp(state.min, state.max);
		}
		state.max
	}
}

fn bucket_index(value_ms: f64) -> usize {
	BUCKET_EDGES_MS
		.iter()
		.position(|&edge| value_ms < edge)
		.unwrap_or(BUCKET_EDGES_MS.len())
}

/// Session-wide tally: success/error counters plus the latency histogram.
///
/// Owned by one probing session and shared with every prober by `Arc`.
#[derive(Debug, Default)]
pub struct ProbeStats {
	successes: AtomicU64,
	errors: AtomicU64,
	latency: LatencyHistogram,
}

impl ProbeStats {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record_success(&self, latency_ms: f64) {
		self.latency.record(latency_ms);
		self.successes.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_error(&self) {
		self.errors.fetch_add(1, Ordering::Relaxed);
	}

	pub fn success_count(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	pub fn error_count(&self) -> u64 {
		self.errors.load(Ordering::Relaxed)
	}

	pub fn latency(&self) -> &LatencyHistogram {
		&self.latency
	}
}

/// Percentage of `part` in `total`, 0.0 when `total` is zero.
pub fn percentage(part: u64, total: u64) -> f64 {
	if total == 0 {
		return 0.0;
	}
	100.0 * part as f64 / total as f64
}
