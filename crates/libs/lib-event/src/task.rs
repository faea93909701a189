use lib_ebpf_common::{copy_cstr, TaskContext, COMM_LEN};

/// Snapshot of the calling thread, for hosts that fire hooks from user space.
#[derive(Debug, Clone)]
pub struct ProcessTask {
	pid_tgid: u64,
	ppid: u32,
	comm: [u8; COMM_LEN],
}

impl ProcessTask {
	pub fn current() -> Self {
		// SAFETY: these calls have no preconditions and cannot fail.
		let (tid, pid, ppid) = unsafe { (libc::gettid(), libc::getpid(), libc::getppid()) };

		let mut comm = [0u8; COMM_LEN];
		match std::thread::current().name() {
			Some(name) => {
				copy_cstr(&mut comm, name.as_bytes());
			}
			None => copy_exe_name(&mut comm),
		}

		Self {
			pid_tgid: ((pid as u32 as u64) << 32) | tid as u32 as u64,
			ppid: ppid as u32,
			comm,
		}
	}
}

impl TaskContext for ProcessTask {
	fn pid_tgid(&self) -> Option<u64> {
		Some(self.pid_tgid)
	}

	fn parent_tgid(&self) -> Option<u32> {
		Some(self.ppid)
	}

	fn comm(&self) -> &[u8] {
		&self.comm
	}

	fn timestamp_ns(&self) -> u64 {
		monotonic_ns()
	}
}

/// Unnamed threads report the executable's file name, like the kernel `comm`.
fn copy_exe_name(comm: &mut [u8; COMM_LEN]) {
	if let Ok(exe) = std::env::current_exe() {
		if let Some(name) = exe.file_name() {
			copy_cstr(comm, name.as_encoded_bytes());
		}
	}
}

/// Same clock as `bpf_ktime_get_ns`.
pub fn monotonic_ns() -> u64 {
	let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
	// SAFETY: `ts` is a valid out pointer.
	let ret = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
	if ret != 0 {
		return 0;
	}
	(ts.tv_sec as u64).saturating_mul(1_000_000_000).saturating_add(ts.tv_nsec as u64)
}

// region:    --- Tests


// endregion: --- Tests
