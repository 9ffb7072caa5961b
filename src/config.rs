use std::time::Duration;

use crate::error::ConfigError;
use crate::transport::NameserverTarget;

/// Everything a probing session needs, as handed over by the CLI layer.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
	pub name: String,
	pub query_type: String,
	pub nameservers: Vec<NameserverTarget>,
	pub recursion_desired: bool,
	/// Suppress the outcome lines of successful attempts
	pub only_errors: bool,
	pub timeout: Duration,
	pub interval: Duration,
	/// Attempts per nameserver, 0 = until interrupted
	pub count: u64,
}

impl Default for ProbeConfig {
	fn default() -> Self {
		ProbeConfig {
			name: String::new(),
			query_type: "A".to_string(),
			nameservers: Vec::new(),
			recursion_desired: true,
			only_errors: false,
			timeout: Duration::from_secs(2),
			interval: Duration::from_millis(100),
			count: 0,
		}
	}
}

impl ProbeConfig {
	/// Check the values that would otherwise only fail once workers are running.
	///
	/// The query type and name are checked when the query is built.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.name.trim().is_empty() {
			return Err(ConfigError::MissingName);
		}
		if self.nameservers.is_empty() {
			return Err(ConfigError::NoNameservers);
		}
		if self.interval.is_zero() {
			return Err(ConfigError::ZeroInterval);
		}
		if self.timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}
		Ok(())
	}
}
