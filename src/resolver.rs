use std::net::{IpAddr, SocketAddr};

use crate::error::ConfigError;
use crate::transport::NameserverTarget;

const DEFAULT_PORT: u16 = 53;

fn invalid(address: &str, reason: &str) -> ConfigError {
	ConfigError::InvalidNameserver {
		address: address.to_string(),
		reason: reason.to_string(),
	}
}

/// Parse a nameserver address string into a `host:port` target.
///
/// Supports formats:
///   "1.1.1.1"              -- IPv4, default port 53
///   "1.1.1.1:53"           -- IPv4 with explicit port
///   "2606:4700::1111"      -- bare IPv6, default port 53
///   "[2606:4700::1111]:53" -- bracketed IPv6 with port
///   "ns1.example.net"      -- host name, default port 53, looked up on every attempt
///   "ns1.example.net:5353" -- host name with explicit port
pub fn parse_nameserver(input: &str) -> Result<NameserverTarget, ConfigError> {
	let trimmed = input.trim();
	if trimmed.is_empty() {
		return Err(invalid(input, "empty nameserver address"));
	}

	let address = if trimmed.starts_with('[') {
		// Bracketed IPv6 with port: [::1]:53
		let addr: SocketAddr = trimmed.parse().map_err(|e| invalid(trimmed, &format!("{}", e)))?;
		addr.to_string()
	} else if let Ok(addr) = trimmed.parse::<SocketAddr>() {
		addr.to_string()
	} else if let Ok(ip) = trimmed.parse::<IpAddr>() {
		SocketAddr::new(ip, DEFAULT_PORT).to_string()
	} else if trimmed.matches(':').count() > 1 {
		return Err(invalid(trimmed, "invalid IPv6 address"));
	} else {
		let (host, port) = match trimmed.rsplit_once(':') {
			Some((host, port)) => {
				let port: u16 = port.parse().map_err(|_| invalid(trimmed, "invalid port"))?;
				(host, port)
			}
			None => (trimmed, DEFAULT_PORT),
		};
		if !is_valid_host(host) {
			return Err(invalid(trimmed, "invalid host name"));
		}
		format!("{}:{}", host, port)
	};

	Ok(NameserverTarget { address })
}

/// Every label must be non-empty; only a single trailing dot is allowed.
fn is_valid_host(host: &str) -> bool {
	let host = host.strip_suffix('.').unwrap_or(host);
	!host.is_empty()
		&& host.len() <= 253
		&& host.split('.').all(|label| {
			!label.is_empty()
				&& label.len() <= 63
				&& label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
		})
}

/// Read nameserver addresses from a file, one per line.
///
/// Blank lines and lines starting with '#' are skipped.
pub fn read_nameserver_file(path: &str) -> Result<Vec<NameserverTarget>, ConfigError> {
	let content = std::fs::read_to_string(path).map_err(|e| ConfigError::NameserverFile {
		path: path.to_string(),
		reason: e.to_string(),
	})?;
	content
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.map(parse_nameserver)
		.collect()
}

/// Read system nameservers from /etc/resolv.conf (Unix only).
///
/// Returns an empty vec on non-Unix platforms or if the file cannot be read.
pub fn system_nameservers() -> Vec<NameserverTarget> {
	match std::fs::read_to_string("/etc/resolv.conf") {
		Ok(content) => parse_resolv_conf(&content),
		Err(_) => Vec::new(),
	}
}

fn parse_resolv_conf(content: &str) -> Vec<NameserverTarget> {
	content
		.lines()
		.filter_map(|line| {
			let mut parts = line.split_whitespace();
			match (parts.next(), parts.next()) {
				(Some("nameserver"), Some(addr)) => parse_nameserver(addr).ok(),
				_ => None,
			}
		})
		.collect()
}

/// Nameserver used when none is configured anywhere.
pub fn default_nameservers() -> Vec<NameserverTarget> {
	vec![NameserverTarget {
		address: "10.0.0.1:53".to_string(),
	}]
}
