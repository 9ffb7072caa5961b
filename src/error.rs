use std::time::Duration;

use thiserror::Error;

/// Problems with the probe configuration, detected before any worker starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
	#[error("missing resource record name")]
	MissingName,

	#[error("no nameservers configured")]
	NoNameservers,

	#[error("Invalid query type {0:?}")]
	InvalidQueryType(String),

	#[error("invalid record name '{name}': {reason}")]
	InvalidName { name: String, reason: String },

	#[error("invalid nameserver address '{address}': {reason}")]
	InvalidNameserver { address: String, reason: String },

	#[error("interval must be greater than zero")]
	ZeroInterval,

	#[error("timeout must be greater than zero")]
	ZeroTimeout,

	#[error("failed to read nameserver file '{path}': {reason}")]
	NameserverFile { path: String, reason: String },
}

/// Terminal errors of a probing session.
#[derive(Error, Debug)]
pub enum ProbeError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// A worker could not run at all; per-attempt DNS errors never end up here.
	#[error("prober for {nameserver} failed: {reason}")]
	Worker { nameserver: String, reason: String },
}

/// Why a single exchange produced no usable response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
	#[error("i/o timeout after {0:?}")]
	Timeout(Duration),

	#[error("lookup {address}: {reason}")]
	Lookup { address: String, reason: String },

	#[error("{0}")]
	Io(String),

	#[error("malformed query: {0}")]
	Malformed(String),
}

impl From<std::io::Error> for ExchangeError {
	fn from(e: std::io::Error) -> Self {
		ExchangeError::Io(e.to_string())
	}
}
