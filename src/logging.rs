use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn log_level(verbosity: u8) -> LevelFilter {
	match verbosity {
		0 => LevelFilter::WARN,
		1 => LevelFilter::INFO,
		2 => LevelFilter::DEBUG,
		_ => LevelFilter::TRACE,
	}
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` flags raise the level for this crate.
pub fn init_logging(verbosity: u8) -> Result<()> {
	let filter = match std::env::var_os("RUST_LOG") {
		Some(_) => EnvFilter::from_default_env(),
		None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), log_level(verbosity))),
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.with_thread_ids(false)
		.with_level(true)
		.try_init()
		.map_err(|e| anyhow!("failed to initialize logging: {}", e))
}
