/// One LSM program per hook site. The program is named after the kernel hook so the
/// loader can attach it by that name.
macro_rules! lsm_hooks {
	($( $name:ident => $id:ident ),* $(,)?) => {
		$(
			#[::aya_ebpf::macros::lsm]
			pub fn $name(ctx: ::aya_ebpf::programs::LsmContext) -> i32 {
				$crate::hook_body(&ctx, ::lib_ebpf_common::HookId::$id)
			}
		)*
	};
}

mod exec;
mod file;
mod fs_context;
mod inode;
mod kernfs;
mod superblock;
