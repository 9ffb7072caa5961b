mod cli;
mod config;
mod coordinator;
mod dns;
mod error;
#[cfg(test)]
mod fake_transport;
mod logging;
mod output;
mod prober;
mod resolver;
mod shutdown;
mod stats;
mod transport;

use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::config::ProbeConfig;
use crate::error::{ConfigError, ProbeError};
use crate::transport::UdpExchanger;

/// Turn parsed flags into a probe configuration.
fn build_config(cli: &Cli) -> Result<ProbeConfig, ConfigError> {
	// Collect nameservers from all sources
	let mut nameservers = Vec::new();
	for ns in cli.nameservers.iter().filter(|ns| !ns.trim().is_empty()) {
		nameservers.push(resolver::parse_nameserver(ns)?);
	}
	if let Some(path) = &cli.nameserver_file {
		nameservers.extend(resolver::read_nameserver_file(path)?);
	}
	if cli.system_nameservers {
		nameservers.extend(resolver::system_nameservers());
	}
	if nameservers.is_empty() && cli.nameserver_file.is_none() && !cli.system_nameservers {
		nameservers = resolver::default_nameservers();
	}

	Ok(ProbeConfig {
		name: cli.name.clone().unwrap_or_default(),
		query_type: cli.query_type.clone(),
		nameservers,
		recursion_desired: !cli.no_recursion,
		only_errors: cli.only_errors,
		timeout: cli.timeout,
		interval: cli.interval,
		count: cli.count,
	})
}

fn usage_error(e: &ConfigError) -> ! {
	eprintln!("{}\n", e);
	eprintln!("{}", Cli::command().render_help());
	std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose)?;

	let config = match build_config(&cli) {
		Ok(config) => config,
		Err(e) => usage_error(&e),
	};

	let shutdown = CancellationToken::new();
	let listener = shutdown::listen_for_interrupt(shutdown.clone())
		.map_err(|e| tracing::warn!("cannot listen for interrupts: {}", e))
		.ok();
	let result = coordinator::run(&config, Arc::new(UdpExchanger), shutdown).await;
	if let Some(listener) = listener {
		listener.abort();
	}

	let report = match result {
		Ok(report) => report,
		Err(ProbeError::Config(e @ (ConfigError::MissingName | ConfigError::NoNameservers))) => {
			usage_error(&e)
		}
		Err(e) => {
			eprintln!("{}", e);
			std::process::exit(1);
		}
	};

	output::print_summary(&report);
	if cli.breakdown {
		output::print_breakdown(&report);
	}
	if let Some(path) = &cli.output {
		output::write_csv(path, &report)?;
	}

	Ok(())
}
