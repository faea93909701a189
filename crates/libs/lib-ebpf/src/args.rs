use aya_ebpf::{
	helpers::{bpf_probe_read_kernel, bpf_probe_read_kernel_str_bytes},
	programs::LsmContext,
};
use lib_ebpf_common::{HookId, NameArg, Payload};

use crate::vmlinux::{dentry, file, linux_binprm, path, qstr};

/// Fills the payload from the hook's native arguments as its table entry describes.
#[inline(always)]
pub fn capture(ctx: &LsmContext, id: HookId) -> Payload {
	let args = id.args();
	let mut payload = Payload::EMPTY;

	unsafe {
		match args.name {
			NameArg::None => {}
			NameArg::Dentry(i) => read_dentry_name(&mut payload, ctx.arg(i)),
			NameArg::Path(i) => {
				let path: *const path = ctx.arg(i);
				if !path.is_null() {
					if let Ok(dentry) = bpf_probe_read_kernel(&(*path).dentry) {
						read_dentry_name(&mut payload, dentry);
					}
				}
			}
			NameArg::File(i) => {
				let file: *const file = ctx.arg(i);
				if !file.is_null() {
					if let Ok(dentry) = bpf_probe_read_kernel(&(*file).__bindgen_anon_1.f_path.dentry) {
						read_dentry_name(&mut payload, dentry);
					}
				}
			}
			NameArg::Bprm(i) => {
				let bprm: *const linux_binprm = ctx.arg(i);
				if !bprm.is_null() {
					if let Ok(filename) = bpf_probe_read_kernel(&(*bprm).filename) {
						read_str(&mut payload, filename as *const u8);
					}
				}
			}
			NameArg::Qstr(i) => {
				let name: *const qstr = ctx.arg(i);
				read_qstr(&mut payload, name);
			}
			NameArg::Str(i) => {
				let s: *const u8 = ctx.arg(i);
				read_str(&mut payload, s);
			}
		}

		if let Some(i) = args.mode {
			// umode_t
			let raw: u64 = ctx.arg(i);
			payload.set_mode(raw as u16 as u32);
		}

		if let Some(i) = args.aux {
			let raw: u64 = ctx.arg(i);
			payload.set_aux(raw);
		}
	}

	payload
}

#[inline(always)]
unsafe fn read_dentry_name(payload: &mut Payload, dentry: *const dentry) {
	if dentry.is_null() {
		return;
	}
	read_qstr(payload, &(*dentry).__bindgen_anon_1.d_name);
}

#[inline(always)]
unsafe fn read_qstr(payload: &mut Payload, name: *const qstr) {
	if name.is_null() {
		return;
	}
	if let Ok(s) = bpf_probe_read_kernel(&(*name).name) {
		read_str(payload, s);
	}
}

#[inline(always)]
unsafe fn read_str(payload: &mut Payload, src: *const u8) {
	if src.is_null() {
		return;
	}
	if bpf_probe_read_kernel_str_bytes(src, payload.name_buf()).is_ok() {
		payload.mark_name();
	}
}
