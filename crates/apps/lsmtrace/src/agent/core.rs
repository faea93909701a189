use std::time::Duration;

use lib_event::TracedEvent;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::Result;
use crate::probe::{KernelSession, KernelStats};
use crate::trx::EventRx;

/// Prints events until every sender is gone.
pub async fn run_agent_sink(rx: EventRx) -> Result<()> {
	let mut printed = 0u64;
	while let Ok(evt) = rx.recv().await {
		print_event(&evt);
		printed += 1;
	}
	info!("event sink closed after {printed} events");

	Ok(())
}

fn print_event(e: &TracedEvent) {
	info!("{e}");
}

/// Blocks until Ctrl-C, the run time elapses or a worker fails, reporting kernel
/// counters every `stats_interval`.
pub async fn run_until_stopped(
	session: &KernelSession,
	stats_interval: Duration,
	run_time: Option<Duration>,
	shutdown: CancellationToken,
) -> Result<()> {
	let deadline = async {
		match run_time {
			Some(d) => tokio::time::sleep(d).await,
			None => std::future::pending().await,
		}
	};
	tokio::pin!(deadline);

	let mut ticker = tokio::time::interval(stats_interval);
	ticker.tick().await;
	let mut watch = DropWatch::default();

	loop {
		tokio::select! {
			_ = tokio::signal::ctrl_c() => {
				info!("Ctrl-C received, stopping");
				break;
			}

			_ = &mut deadline => {
				info!("run time elapsed, stopping");
				break;
			}

			_ = shutdown.cancelled() => break,

			_ = ticker.tick() => {
				let stats = session.stats()?;
				if let Some(rise) = watch.observe(stats) {
					warn!("channel full: {rise} events dropped since last check ({} total)", stats.dropped);
				}
			}
		}
	}

	Ok(())
}

/// Remembers the last drop count seen.
#[derive(Debug, Default)]
pub struct DropWatch {
	last_dropped: u64,
}

impl DropWatch {
	/// Returns how many drops happened since the previous call, if any.
	pub fn observe(&mut self, stats: KernelStats) -> Option<u64> {
		let rise = stats.dropped.saturating_sub(self.last_dropped);
		self.last_dropped = self.last_dropped.max(stats.dropped);
		(rise > 0).then_some(rise)
	}
}

// region:    --- Tests


// endregion: --- Tests
