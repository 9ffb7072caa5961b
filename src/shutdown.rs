//! Operator interrupt handling.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Request shutdown of every prober.
///
/// Returns true only for the call that actually initiated the shutdown;
/// later calls are no-ops.
pub fn interrupt(shutdown: &CancellationToken) -> bool {
	if shutdown.is_cancelled() {
		debug!("shutdown already in progress");
		return false;
	}
	shutdown.cancel();
	true
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
///
/// The signal streams are registered before this returns and live as long
/// as the listener, so no signal falls between two waits. The listener
/// keeps running after the first signal so repeated interrupts are absorbed
/// instead of killing the process before the summary is printed.
pub fn listen_for_interrupt(shutdown: CancellationToken) -> std::io::Result<JoinHandle<()>> {
	let mut signals = Signals::new()?;
	Ok(tokio::spawn(async move {
		loop {
			if let Err(e) = signals.recv().await {
				warn!("cannot listen for interrupts: {}", e);
				return;
			}
			if interrupt(&shutdown) {
				info!("interrupt received, stopping probers");
			}
		}
	}))
}

#[cfg(unix)]
struct Signals {
	interrupt: tokio::signal::unix::Signal,
	terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
	fn new() -> std::io::Result<Self> {
		use tokio::signal::unix::{signal, SignalKind};

		Ok(Signals {
			interrupt: signal(SignalKind::interrupt())?,
			terminate: signal(SignalKind::terminate())?,
		})
	}

	async fn recv(&mut self) -> std::io::Result<()> {
		let received = tokio::select! {
			r = self.interrupt.recv() => r,
			r = self.terminate.recv() => r,
		};
		received.ok_or_else(|| std::io::Error::other("signal stream closed"))
	}
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
	fn new() -> std::io::Result<Self> {
		Ok(Signals)
	}

	async fn recv(&mut self) -> std::io::Result<()> {
		tokio::signal::ctrl_c().await
	}
}
