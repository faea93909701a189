use lib_ebpf_common::EVENT_SIZE;

use crate::{Error, Result};

/// Kernel ring buffers must be a power of two and a multiple of the page size.
pub fn ring_byte_size(capacity_bytes: usize, page_size: usize) -> Result<u32> {
	if capacity_bytes < EVENT_SIZE {
		return Err(lib_event::Error::CapacityTooSmall(capacity_bytes).into());
	}

	let size = capacity_bytes
		.max(page_size)
		.checked_next_power_of_two()
		.ok_or(Error::RingTooLarge(capacity_bytes))?;

	u32::try_from(size).map_err(|_| Error::RingTooLarge(capacity_bytes))
}

pub fn page_size() -> usize {
	// SAFETY: sysconf has no preconditions.
	let ret = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
	if ret > 0 {
		ret as usize
	} else {
		4096
	}
}

// region:    --- Tests


// endregion: --- Tests
