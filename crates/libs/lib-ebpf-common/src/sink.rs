use derive_more::Display;

use crate::encoder::{encode, TaskContext};
use crate::event::{Event, Payload};
use crate::hook::HookId;

/// Returned by a sink with no room left. The event is gone; the sink has already counted it.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display("event channel full")]
pub struct Overflow;

impl core::error::Error for Overflow {}

/// The only verdict a hook body gives. Tracing never changes the kernel's decision.
#[repr(i32)]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	#[display("allow")]
	Allow = 0,
}

impl Decision {
	pub const fn as_retval(self) -> i32 {
		self as i32
	}
}

pub trait EventSink {
	fn publish(&self, event: &Event) -> Result<(), Overflow>;

	/// Called when a hook fired without a current task.
	fn record_skip(&self) {}
}

/// Shared hook body: encode, publish and allow, whatever happened in between.
#[inline(always)]
pub fn fire<T, S>(id: HookId, task: &T, payload: &Payload, sink: &S) -> Decision
where
	T: TaskContext + ?Sized,
	S: EventSink + ?Sized,
{
	match encode(id, task, payload) {
		Ok(event) => {
			let _ = sink.publish(&event);
		}
		Err(_) => sink.record_skip(),
	}
	Decision::Allow
}

// region:    --- Tests


// endregion: --- Tests
