use std::sync::atomic::{AtomicBool, Ordering};

use lib_ebpf_common::{fire, Decision, HookId, Payload, TaskContext, EVENT_SIZE};
use tracing::{debug, info};

use crate::channel::{ChannelStats, EventChannel, OverflowPolicy, Poll, DEFAULT_CAPACITY_BYTES};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
	pub capacity_bytes: usize,
	pub overflow: OverflowPolicy,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			capacity_bytes: DEFAULT_CAPACITY_BYTES,
			overflow: OverflowPolicy::default(),
		}
	}
}

impl SessionConfig {
	pub fn with_event_capacity(events: usize) -> Self {
		Self {
			capacity_bytes: events.saturating_mul(EVENT_SIZE),
			..Self::default()
		}
	}

	pub fn overflow(mut self, overflow: OverflowPolicy) -> Self {
		self.overflow = overflow;
		self
	}
}

/// In-process host: callers invoke hook bodies directly and drain the channel.
pub struct Session {
	channel: EventChannel,
	active: AtomicBool,
}

impl Session {
	pub fn start(config: SessionConfig) -> Result<Self> {
		let channel = EventChannel::with_capacity(config.capacity_bytes, config.overflow)?;
		info!(
			"session started: {} events, overflow {}",
			channel.capacity(),
			channel.policy()
		);

		Ok(Self {
			channel,
			active: AtomicBool::new(true),
		})
	}

	/// Hook body entry point. Always allows; after `stop` nothing is recorded.
	pub fn fire<T: TaskContext + ?Sized>(&self, id: HookId, task: &T, payload: &Payload) -> Decision {
		if !self.active.load(Ordering::Acquire) {
			return Decision::Allow;
		}
		fire(id, task, payload, &self.channel)
	}

	pub fn poll(&self) -> Poll<'_> {
		self.channel.poll()
	}

	/// Deactivates every hook. Events committed before the call stay available to `poll`.
	pub fn stop(&self) -> ChannelStats {
		if self.active.swap(false, Ordering::AcqRel) {
			debug!("session stopped");
		}
		self.channel.stats()
	}

	pub fn is_active(&self) -> bool {
		self.active.load(Ordering::Acquire)
	}

	pub fn stats(&self) -> ChannelStats {
		self.channel.stats()
	}

	pub fn channel(&self) -> &EventChannel {
		&self.channel
	}
}

// region:    --- Tests


// endregion: --- Tests
