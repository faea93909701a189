use aya::maps::{MapData, RingBuf};
use lib_event::TracedEvent;
use tokio::io::unix::AsyncFd;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::Result;
use crate::trx::EventTx;

pub struct RingBufWorker {
	pub ringbuf_fd: AsyncFd<RingBuf<MapData>>,
	pub tx: EventTx,
	pub shutdown: CancellationToken,
}

impl RingBufWorker {
	pub fn start(ringbuf_fd: AsyncFd<RingBuf<MapData>>, tx: EventTx, shutdown: CancellationToken) -> Result<Self> {
		Ok(RingBufWorker {
			ringbuf_fd,
			tx,
			shutdown,
		})
	}

	/// Forwards events until shutdown, then drains whatever is left in the ring.
	pub async fn run(mut self) -> Result<()> {
		loop {
			tokio::select! {
				_ = self.shutdown.cancelled() => break,

				guard = self.ringbuf_fd.readable_mut() => {
					let mut guard = match guard {
						Ok(g) => g,
						Err(_) => break,
					};

					let ring_buf = guard.get_inner_mut();
					while let Some(evt) = next_event(ring_buf) {
						self.tx.send(evt).await?;
					}

					guard.clear_ready();
				}
			}
		}

		let mut drained = 0usize;
		let ring_buf = self.ringbuf_fd.get_mut();
		while let Some(evt) = next_event(ring_buf) {
			self.tx.send(evt).await?;
			drained += 1;
		}
		info!("ring buffer drained, {drained} events after stop");

		Ok(())
	}
}

/// Next decodable event. Malformed records are skipped.
fn next_event(ring_buf: &mut RingBuf<MapData>) -> Option<TracedEvent> {
	loop {
		let item = ring_buf.next()?;
		match TracedEvent::try_from(&*item) {
			Ok(evt) => return Some(evt),
			Err(e) => debug!("skipping ring buffer record: {e}"),
		}
	}
}
