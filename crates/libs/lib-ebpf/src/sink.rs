use lib_ebpf_common::{Event, EventSink, Overflow};

use crate::{COUNTERS, DROPPED_IDX, EVENTS, SKIPPED_IDX};

pub struct RingBufSink;

impl EventSink for RingBufSink {
	#[inline(always)]
	fn publish(&self, event: &Event) -> Result<(), Overflow> {
		match EVENTS.reserve::<Event>(0) {
			Some(mut entry) => {
				entry.write(*event);
				entry.submit(0);
				Ok(())
			}
			None => {
				bump(DROPPED_IDX);
				Err(Overflow)
			}
		}
	}

	#[inline(always)]
	fn record_skip(&self) {
		bump(SKIPPED_IDX);
	}
}

#[inline(always)]
fn bump(index: u32) {
	if let Some(counter) = COUNTERS.get_ptr_mut(index) {
		// per-CPU slot, no other writer while this program runs
		unsafe { *counter += 1 };
	}
}
