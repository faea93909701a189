use aya_ebpf::helpers::{
	bpf_get_current_comm, bpf_get_current_pid_tgid, bpf_probe_read_kernel,
	r#gen::{bpf_get_current_task, bpf_ktime_get_ns},
};
use lib_ebpf_common::{split_pid_tgid, TaskContext, COMM_LEN};

use crate::vmlinux::task_struct;

/// `bpf_get_current_pid_tgid` returns `-EINVAL` when there is no current task.
const NO_TASK: u64 = -22i64 as u64;

pub struct BpfTask {
	pid_tgid: u64,
	comm: [u8; COMM_LEN],
}

impl BpfTask {
	#[inline(always)]
	pub fn current() -> Self {
		Self {
			pid_tgid: bpf_get_current_pid_tgid(),
			comm: bpf_get_current_comm().unwrap_or([0u8; COMM_LEN]),
		}
	}

	#[inline(always)]
	pub fn tgid(&self) -> u32 {
		split_pid_tgid(self.pid_tgid).1
	}
}

impl TaskContext for BpfTask {
	#[inline(always)]
	fn pid_tgid(&self) -> Option<u64> {
		(self.pid_tgid != NO_TASK).then_some(self.pid_tgid)
	}

	#[inline(always)]
	fn parent_tgid(&self) -> Option<u32> {
		unsafe {
			let task = bpf_get_current_task() as *const task_struct;
			if task.is_null() {
				return None;
			}

			let parent = bpf_probe_read_kernel(&(*task).real_parent).ok()?;
			if parent.is_null() {
				return None;
			}

			// parent process id (tgid), not the parent thread's pid
			bpf_probe_read_kernel(&(*parent).tgid).ok().map(|tgid| tgid as u32)
		}
	}

	#[inline(always)]
	fn comm(&self) -> &[u8] {
		&self.comm
	}

	#[inline(always)]
	fn timestamp_ns(&self) -> u64 {
		unsafe { bpf_ktime_get_ns() }
	}
}
