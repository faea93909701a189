use flume::{Receiver, Sender};
use lib_event::TracedEvent;

use crate::Result;

#[derive(Clone)]
pub struct EventTx {
	tx: Sender<TracedEvent>,
}

impl EventTx {
	pub async fn send(&self, item: TracedEvent) -> Result<()> {
		match self.tx.send_async(item).await {
			Ok(_) => Ok(()),
			Err(ex) => Err(ex.into()),
		}
	}
}

pub struct EventRx {
	rx: Receiver<TracedEvent>,
}

impl EventRx {
	pub async fn recv(&self) -> Result<TracedEvent> {
		let res = self.rx.recv_async().await?;
		Ok(res)
	}
}

/// Bounded so a slow printer pushes back onto the kernel ring, where drops are counted.
pub fn new_trx_pair(bound: usize) -> (EventTx, EventRx) {
	let (tx, rx) = flume::bounded::<TracedEvent>(bound);

	let evt_tx = EventTx { tx };

	let evt_rx = EventRx { rx };

	(evt_tx, evt_rx)
}

// region:    --- Tests


// endregion: --- Tests
