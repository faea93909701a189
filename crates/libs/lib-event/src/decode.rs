use core::fmt;
use std::sync::Arc;

use lib_ebpf_common::{cstr, Event, HookCategory, HookId, HookSite, EVENT_SIZE, SCHEMA_VERSION};
use zerocopy::FromBytes;

use crate::{Error, Result};

/// Reads one event off the wire and checks it against the hook table.
pub fn decode_event(data: &[u8]) -> Result<Event> {
	if data.len() < EVENT_SIZE {
		return Err(Error::InvalidEventSize);
	}
	let (event, _) = Event::read_from_prefix(data).map_err(|_| Error::InvalidEventSize)?;

	if event.header.version != SCHEMA_VERSION {
		return Err(Error::UnsupportedSchema(event.header.version));
	}
	let id = event.hook_id().ok_or(Error::UnknownHook(event.header.hook_id))?;
	if id.category() as u8 != event.header.category {
		return Err(Error::CategoryMismatch(event.header.category));
	}

	Ok(event)
}

/// Owned, printable view of an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracedEvent {
	pub hook: &'static HookSite,
	pub timestamp_ns: u64,
	pub pid: u32,
	pub tgid: u32,
	pub ppid: u32,
	pub comm: Arc<str>,
	pub name: Option<Arc<str>>,
	pub mode: Option<u32>,
	pub aux: Option<u64>,
}

impl TracedEvent {
	pub fn category(&self) -> HookCategory {
		self.hook.category
	}

	pub fn hook_id(&self) -> HookId {
		self.hook.id
	}
}

impl TryFrom<&Event> for TracedEvent {
	type Error = Error;

	fn try_from(event: &Event) -> Result<Self> {
		let hook = event.hook_id().ok_or(Error::UnknownHook(event.header.hook_id))?.site();

		Ok(Self {
			hook,
			timestamp_ns: event.header.timestamp_ns,
			pid: event.pid,
			tgid: event.tgid,
			ppid: event.ppid,
			comm: Arc::from(String::from_utf8_lossy(cstr(&event.comm))),
			name: event.payload.name().map(|n| Arc::from(String::from_utf8_lossy(n))),
			mode: event.payload.mode(),
			aux: event.payload.aux(),
		})
	}
}

impl TryFrom<&[u8]> for TracedEvent {
	type Error = Error;

	fn try_from(data: &[u8]) -> Result<Self> {
		TracedEvent::try_from(&decode_event(data)?)
	}
}

impl fmt::Display for TracedEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"[{}] {} pid={} tgid={} ppid={} comm={}",
			self.hook.category, self.hook.name, self.pid, self.tgid, self.ppid, self.comm
		)?;
		if let Some(name) = &self.name {
			write!(f, " name={name}")?;
		}
		if let Some(mode) = self.mode {
			write!(f, " mode={mode:o}")?;
		}
		if let Some(aux) = self.aux {
			write!(f, " aux={aux:#x}")?;
		}
		Ok(())
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use lib_ebpf_common::{EventHeader, Payload, COMM_LEN};
	use zerocopy::IntoBytes;

	use super::*;

	fn fx_event(hook: HookId) -> Event {
		let mut comm = [0u8; COMM_LEN];
		comm[..5].copy_from_slice(b"mount");
		let mut payload = Payload::EMPTY;
		payload.set_name(b"mnt");
		payload.set_aux(0x20);
		Event {
			header: EventHeader {
				hook_id: hook as u16,
				category: hook.category() as u8,
				version: SCHEMA_VERSION,
				_pad0: [0u8; 4],
				timestamp_ns: 10,
			},
			pid: 300,
			tgid: 300,
			ppid: 299,
			_pad0: 0,
			comm,
			payload,
		}
	}

	#[test]
	fn decode_accepts_well_formed_event() -> Result<()> {
		// -- Setup & Fixtures
		let fx_event = fx_event(HookId::SbMount);

		// -- Exec
		let decoded = decode_event(fx_event.as_bytes())?;
		let traced = TracedEvent::try_from(fx_event.as_bytes())?;

		// -- Check
		assert_eq!(decoded, fx_event);
		assert_eq!(traced.hook_id(), HookId::SbMount);
		assert_eq!(traced.category(), HookCategory::Superblock);
		assert_eq!(traced.comm.as_ref(), "mount");
		assert_eq!(traced.name.as_deref(), Some("mnt"));
		assert_eq!(traced.mode, None);
		assert_eq!(
			traced.to_string(),
			"[superblock] sb_mount pid=300 tgid=300 ppid=299 comm=mount name=mnt aux=0x20"
		);

		Ok(())
	}

	#[test]
	fn decode_rejects_short_buffer() -> Result<()> {
		// -- Setup & Fixtures
		let fx_event = fx_event(HookId::SbMount);

		// -- Exec
		let res = decode_event(&fx_event.as_bytes()[..EVENT_SIZE - 1]);

		// -- Check
		assert!(matches!(res, Err(Error::InvalidEventSize)));

		Ok(())
	}

	#[test]
	fn decode_rejects_unknown_hook() -> Result<()> {
		// -- Setup & Fixtures
		let mut fx_event = fx_event(HookId::SbMount);
		fx_event.header.hook_id = 500;

		// -- Exec
		let res = decode_event(fx_event.as_bytes());

		// -- Check
		assert!(matches!(res, Err(Error::UnknownHook(500))));

		Ok(())
	}

	#[test]
	fn decode_rejects_foreign_schema() -> Result<()> {
		// -- Setup & Fixtures
		let mut fx_event = fx_event(HookId::SbMount);
		fx_event.header.version = SCHEMA_VERSION + 1;

		// -- Exec
		let res = decode_event(fx_event.as_bytes());

		// -- Check
		assert!(matches!(res, Err(Error::UnsupportedSchema(v)) if v == SCHEMA_VERSION + 1));

		Ok(())
	}

	#[test]
	fn decode_rejects_mismatched_category() -> Result<()> {
		// -- Setup & Fixtures
		let mut fx_event = fx_event(HookId::SbMount);
		fx_event.header.category = HookCategory::File as u8;

		// -- Exec
		let res = decode_event(fx_event.as_bytes());

		// -- Check
		assert!(matches!(res, Err(Error::CategoryMismatch(4))));

		Ok(())
	}
}

// endregion: --- Tests
