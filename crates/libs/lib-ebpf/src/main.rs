#![no_std]
#![no_main]

use aya_ebpf::{
	macros::map,
	maps::{PerCpuArray, RingBuf},
	programs::LsmContext,
};
use aya_log_ebpf::debug;
use lib_ebpf_common::{fire, Decision, HookId};

mod args;
mod context;
mod hooks;
mod sink;
mod vmlinux;

use crate::{context::BpfTask, sink::RingBufSink};

/// Resized by the loader to the configured channel capacity.
#[map]
static EVENTS: RingBuf = RingBuf::with_byte_size(1 << 24, 0);

/// Index 0 counts dropped events, index 1 hooks that fired without a task.
#[map]
static COUNTERS: PerCpuArray<u64> = PerCpuArray::with_max_entries(2, 0);

pub const DROPPED_IDX: u32 = 0;
pub const SKIPPED_IDX: u32 = 1;

// Set by the loader before the programs are verified.
#[no_mangle]
static TRACER_TGID: u32 = 0;
#[no_mangle]
static LOG_HOOKS: u8 = 0;

#[inline(always)]
fn tracer_tgid() -> u32 {
	unsafe { core::ptr::read_volatile(&TRACER_TGID) }
}

#[inline(always)]
fn log_hooks() -> bool {
	unsafe { core::ptr::read_volatile(&LOG_HOOKS) != 0 }
}

#[inline(always)]
pub fn hook_body(ctx: &LsmContext, id: HookId) -> i32 {
	let task = BpfTask::current();
	if task.tgid() == tracer_tgid() {
		return Decision::Allow.as_retval();
	}

	if log_hooks() {
		debug!(ctx, "lsm_hook: {}: {}", id.category().as_str(), id.name());
	}

	let payload = args::capture(ctx, id);
	fire(id, &task, &payload, &RingBufSink).as_retval()
}

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
	loop {}
}

#[link_section = "license"]
#[no_mangle]
static LICENSE: [u8; 13] = *b"Dual MIT/GPL\0";
