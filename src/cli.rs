use std::time::Duration;

use clap::Parser;

/// Continuous DNS nameserver prober
#[derive(Parser, Debug)]
#[command(name = "dns-prober")]
#[command(about = "Repeatedly query DNS nameservers in parallel and report latency and error rates")]
pub struct Cli {
	/// Resource record name
	#[arg(short = 'n', long = "name")]
	pub name: Option<String>,

	/// Comma separated nameservers with port (repeatable, e.g. 10.0.0.1:53)
	#[arg(short = 's', long = "nameservers", value_delimiter = ',')]
	pub nameservers: Vec<String>,

	/// File containing nameserver addresses (one per line)
	#[arg(short = 'f', long = "nameserver-file")]
	pub nameserver_file: Option<String>,

	/// Include system nameservers from /etc/resolv.conf
	#[arg(long = "system-nameservers")]
	pub system_nameservers: bool,

	/// Query type to use (A, AAAA, SOA, CNAME...)
	#[arg(short = 'q', long = "query-type", default_value = "A")]
	pub query_type: String,

	/// Disable recursion desired flag
	#[arg(short = 'r', long = "no-recursion")]
	pub no_recursion: bool,

	/// Show only errors
	#[arg(short = 'e', long = "only-errors")]
	pub only_errors: bool,

	/// Query timeout
	#[arg(short = 't', long = "timeout", default_value = "2s", value_parser = humantime::parse_duration)]
	pub timeout: Duration,

	/// Interval between requests
	#[arg(short = 'i', long = "interval", default_value = "100ms", value_parser = humantime::parse_duration)]
	pub interval: Duration,

	/// Number of requests to send per nameserver, 0 runs until interrupted
	#[arg(short = 'c', long = "count", default_value = "0")]
	pub count: u64,

	/// Print a per-nameserver results table after the summary
	#[arg(long = "breakdown")]
	pub breakdown: bool,

	/// Output CSV file path for per-nameserver results
	#[arg(short = 'o', long = "output")]
	pub output: Option<String>,

	/// Increase log verbosity (repeatable)
	#[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
	pub verbose: u8,
}
