use derive_more::Display;

use crate::event::{copy_cstr, Event, EventHeader, Payload, COMM_LEN, SCHEMA_VERSION};
use crate::hook::HookId;

/// Read side of the task that triggered a hook.
pub trait TaskContext {
	/// Raw `pid_tgid` pair, thread id in the low 32 bits. `None` when there is no current task.
	fn pid_tgid(&self) -> Option<u64>;

	/// Thread group id of the parent, if it could be read.
	fn parent_tgid(&self) -> Option<u32>;

	fn comm(&self) -> &[u8];

	fn timestamp_ns(&self) -> u64;
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display("no current task")]
pub struct EncodeSkipped;

impl core::error::Error for EncodeSkipped {}

pub fn split_pid_tgid(pid_tgid: u64) -> (u32, u32) {
	(pid_tgid as u32, (pid_tgid >> 32) as u32)
}

#[inline(always)]
pub fn encode<T: TaskContext + ?Sized>(id: HookId, task: &T, payload: &Payload) -> Result<Event, EncodeSkipped> {
	let (pid, tgid) = split_pid_tgid(task.pid_tgid().ok_or(EncodeSkipped)?);

	let mut comm = [0u8; COMM_LEN];
	copy_cstr(&mut comm, task.comm());

	Ok(Event {
		header: EventHeader {
			hook_id: id as u16,
			category: id.category() as u8,
			version: SCHEMA_VERSION,
			_pad0: [0u8; 4],
			timestamp_ns: task.timestamp_ns(),
		},
		pid,
		tgid,
		ppid: task.parent_tgid().unwrap_or(0),
		_pad0: 0,
		comm,
		payload: *payload,
	})
}

// region:    --- Tests


// endregion: --- Tests
