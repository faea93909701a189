use zerocopy_derive::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::hook::{HookCategory, HookId};

pub const SCHEMA_VERSION: u8 = 1;

pub const COMM_LEN: usize = 16;
pub const NAME_LEN: usize = 64;

pub const EVENT_SIZE: usize = core::mem::size_of::<Event>();

/// Bits of [`Payload::present`].
pub mod present {
	pub const NAME: u8 = 1 << 0;
	pub const MODE: u8 = 1 << 1;
	pub const AUX: u8 = 1 << 2;
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct EventHeader {
	pub hook_id: u16,
	pub category: u8,
	pub version: u8,
	pub _pad0: [u8; 4],
	pub timestamp_ns: u64,
}

/// Hook specific data. Only the fields flagged in `present` carry meaning.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct Payload {
	pub present: u8,
	pub _pad0: [u8; 3],
	pub mode: u32,
	pub aux: u64, // mask, flags, ioctl/fcntl cmd or address depending on the hook
	pub name: [u8; NAME_LEN],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct Event {
	pub header: EventHeader,
	pub pid: u32,
	pub tgid: u32,
	pub ppid: u32,
	pub _pad0: u32,
	pub comm: [u8; COMM_LEN],
	pub payload: Payload,
}

const _: () = assert!(EVENT_SIZE == 128);

impl Payload {
	pub const EMPTY: Payload = Payload {
		present: 0,
		_pad0: [0u8; 3],
		mode: 0,
		aux: 0,
		name: [0u8; NAME_LEN],
	};

	pub fn set_name(&mut self, src: &[u8]) {
		copy_cstr(&mut self.name, src);
		self.present |= present::NAME;
	}

	/// Raw buffer for callers that fill the name in place (probe reads).
	/// Call [`Payload::mark_name`] once the buffer holds a valid string.
	pub fn name_buf(&mut self) -> &mut [u8; NAME_LEN] {
		&mut self.name
	}

	pub fn mark_name(&mut self) {
		if let Some(last) = self.name.last_mut() {
			*last = 0;
		}
		self.present |= present::NAME;
	}

	pub fn set_mode(&mut self, mode: u32) {
		self.mode = mode;
		self.present |= present::MODE;
	}

	pub fn set_aux(&mut self, aux: u64) {
		self.aux = aux;
		self.present |= present::AUX;
	}

	pub fn name(&self) -> Option<&[u8]> {
		(self.present & present::NAME != 0).then(|| cstr(&self.name))
	}

	pub fn mode(&self) -> Option<u32> {
		(self.present & present::MODE != 0).then_some(self.mode)
	}

	pub fn aux(&self) -> Option<u64> {
		(self.present & present::AUX != 0).then_some(self.aux)
	}

	pub fn is_empty(&self) -> bool {
		self.present == 0
	}
}

impl Default for Payload {
	fn default() -> Self {
		Self::EMPTY
	}
}

impl Event {
	pub fn hook_id(&self) -> Option<HookId> {
		HookId::from_raw(self.header.hook_id)
	}

	pub fn category(&self) -> Option<HookCategory> {
		HookCategory::from_raw(self.header.category)
	}

	pub fn comm(&self) -> &[u8] {
		cstr(&self.comm)
	}
}

/// Copies `src` up to its first nul into `dst`, truncating so that `dst` always ends
/// with at least one nul. Returns the number of bytes copied.
pub fn copy_cstr<const N: usize>(dst: &mut [u8; N], src: &[u8]) -> usize {
	let len = cstr(src).len().min(N.saturating_sub(1));
	dst[..len].copy_from_slice(&src[..len]);
	dst[len..].fill(0);
	len
}

/// The bytes of `buf` before the first nul.
pub fn cstr(buf: &[u8]) -> &[u8] {
	let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
	&buf[..end]
}

// region:    --- Tests


// endregion: --- Tests
