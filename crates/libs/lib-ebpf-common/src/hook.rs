use core::str::FromStr;

use derive_more::Display;

// region:    --- Category

#[repr(u8)]
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookCategory {
	#[display("exec")]
	Exec = 0,
	#[display("fs_context")]
	FsContext = 1,
	#[display("superblock")]
	Superblock = 2,
	#[display("inode")]
	Inode = 3,
	#[display("file")]
	File = 4,
	#[display("kernfs")]
	Kernfs = 5,
}

impl HookCategory {
	pub const ALL: [HookCategory; 6] = [
		HookCategory::Exec,
		HookCategory::FsContext,
		HookCategory::Superblock,
		HookCategory::Inode,
		HookCategory::File,
		HookCategory::Kernfs,
	];

	pub const fn as_str(self) -> &'static str {
		match self {
			HookCategory::Exec => "exec",
			HookCategory::FsContext => "fs_context",
			HookCategory::Superblock => "superblock",
			HookCategory::Inode => "inode",
			HookCategory::File => "file",
			HookCategory::Kernfs => "kernfs",
		}
	}

	pub fn from_raw(raw: u8) -> Option<Self> {
		Self::ALL.into_iter().find(|c| *c as u8 == raw)
	}
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display("unknown hook category")]
pub struct UnknownCategory;

impl core::error::Error for UnknownCategory {}

impl FromStr for HookCategory {
	type Err = UnknownCategory;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL.into_iter().find(|c| c.as_str() == s).ok_or(UnknownCategory)
	}
}

// endregion: --- Category

// region:    --- Arguments

/// Which hook argument, if any, yields the event name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameArg {
	None,
	/// `struct dentry *` at the given index, name taken from `d_name`.
	Dentry(usize),
	/// `const struct path *`, name taken from `path->dentry`.
	Path(usize),
	/// `struct file *`, name taken from `f_path.dentry`.
	File(usize),
	/// `struct linux_binprm *`, name taken from `bprm->filename`.
	Bprm(usize),
	/// `const struct qstr *`.
	Qstr(usize),
	/// Plain `const char *`.
	Str(usize),
}

/// Where a hook's payload comes from. `mode` keeps the low 16 bits of its argument (`umode_t`),
/// `aux` is taken whole as a 64 bit value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HookArgs {
	pub name: NameArg,
	pub mode: Option<usize>,
	pub aux: Option<usize>,
}

impl HookArgs {
	const fn new(name: NameArg) -> Self {
		Self {
			name,
			mode: None,
			aux: None,
		}
	}

	const fn none() -> Self {
		Self::new(NameArg::None)
	}

	const fn dentry(i: usize) -> Self {
		Self::new(NameArg::Dentry(i))
	}

	const fn path(i: usize) -> Self {
		Self::new(NameArg::Path(i))
	}

	const fn file(i: usize) -> Self {
		Self::new(NameArg::File(i))
	}

	const fn bprm(i: usize) -> Self {
		Self::new(NameArg::Bprm(i))
	}

	const fn qstr(i: usize) -> Self {
		Self::new(NameArg::Qstr(i))
	}

	const fn string(i: usize) -> Self {
		Self::new(NameArg::Str(i))
	}

	const fn aux_at(i: usize) -> Self {
		Self::none().with_aux(i)
	}

	const fn with_mode(mut self, i: usize) -> Self {
		self.mode = Some(i);
		self
	}

	const fn with_aux(mut self, i: usize) -> Self {
		self.aux = Some(i);
		self
	}

	pub const fn is_empty(&self) -> bool {
		matches!(self.name, NameArg::None) && self.mode.is_none() && self.aux.is_none()
	}
}

// endregion: --- Arguments

// region:    --- Hook Table

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HookSite {
	pub id: HookId,
	pub category: HookCategory,
	pub name: &'static str,
	pub args: HookArgs,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display("unknown hook")]
pub struct UnknownHook;

impl core::error::Error for UnknownHook {}

impl HookSite {
	pub fn lookup(name: &str) -> Result<&'static HookSite, UnknownHook> {
		HOOK_SITES.iter().find(|site| site.name == name).ok_or(UnknownHook)
	}

	pub fn in_category(category: HookCategory) -> impl Iterator<Item = &'static HookSite> {
		HOOK_SITES.iter().filter(move |site| site.category == category)
	}
}

/// Declares the hook enum, the static table and const accessors from one list.
/// The accessors are plain matches so the BPF side never indexes the static table.
macro_rules! hook_sites {
	($( $variant:ident => $name:literal, $cat:ident, $args:expr; )*) => {
		#[repr(u16)]
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
		pub enum HookId {
			$( $variant, )*
		}

		pub const HOOK_COUNT: usize = [$( HookId::$variant ),*].len();

		pub static HOOK_SITES: [HookSite; HOOK_COUNT] = [
			$(
				HookSite {
					id: HookId::$variant,
					category: HookCategory::$cat,
					name: $name,
					args: $args,
				},
			)*
		];

		impl HookId {
			pub const fn name(self) -> &'static str {
				match self {
					$( HookId::$variant => $name, )*
				}
			}

			pub const fn category(self) -> HookCategory {
				match self {
					$( HookId::$variant => HookCategory::$cat, )*
				}
			}

			pub const fn args(self) -> HookArgs {
				match self {
					$( HookId::$variant => $args, )*
				}
			}
		}
	};
}

hook_sites! {
	// -- exec
	BprmCredsForExec => "bprm_creds_for_exec", Exec, HookArgs::bprm(0);
	BprmCredsFromFile => "bprm_creds_from_file", Exec, HookArgs::file(1);
	BprmCheckSecurity => "bprm_check_security", Exec, HookArgs::bprm(0);
	BprmCommittingCreds => "bprm_committing_creds", Exec, HookArgs::bprm(0);
	BprmCommittedCreds => "bprm_committed_creds", Exec, HookArgs::bprm(0);

	// -- fs_context
	FsContextDup => "fs_context_dup", FsContext, HookArgs::none();
	FsContextParseParam => "fs_context_parse_param", FsContext, HookArgs::none();

	// -- superblock
	SbAllocSecurity => "sb_alloc_security", Superblock, HookArgs::none();
	SbFreeSecurity => "sb_free_security", Superblock, HookArgs::none();
	SbFreeMntOpts => "sb_free_mnt_opts", Superblock, HookArgs::none();
	SbEatLsmOpts => "sb_eat_lsm_opts", Superblock, HookArgs::none();
	SbRemount => "sb_remount", Superblock, HookArgs::none();
	SbKernMount => "sb_kern_mount", Superblock, HookArgs::none();
	SbShowOptions => "sb_show_options", Superblock, HookArgs::none();
	SbStatfs => "sb_statfs", Superblock, HookArgs::dentry(0);
	SbMount => "sb_mount", Superblock, HookArgs::path(1).with_aux(3);
	SbUmount => "sb_umount", Superblock, HookArgs::aux_at(1);
	SbPivotroot => "sb_pivotroot", Superblock, HookArgs::path(1);
	SbSetMntOpts => "sb_set_mnt_opts", Superblock, HookArgs::aux_at(2);
	SbCloneMntOpts => "sb_clone_mnt_opts", Superblock, HookArgs::aux_at(2);
	SbAddMntOpt => "sb_add_mnt_opt", Superblock, HookArgs::string(0);
	MoveMount => "move_mount", Superblock, HookArgs::path(1);
	DentryCreateFilesAs => "dentry_create_files_as", Superblock, HookArgs::dentry(0).with_mode(1);

	// -- inode
	InodeAllocSecurity => "inode_alloc_security", Inode, HookArgs::none();
	InodeFreeSecurity => "inode_free_security", Inode, HookArgs::none();
	InodeInitSecurity => "inode_init_security", Inode, HookArgs::qstr(2);
	PathUnlink => "path_unlink", Inode, HookArgs::dentry(1);
	PathMkdir => "path_mkdir", Inode, HookArgs::dentry(1).with_mode(2);
	PathRmdir => "path_rmdir", Inode, HookArgs::dentry(1);
	PathSymlink => "path_symlink", Inode, HookArgs::dentry(1);
	PathLink => "path_link", Inode, HookArgs::dentry(2);
	PathRename => "path_rename", Inode, HookArgs::dentry(1);
	PathTruncate => "path_truncate", Inode, HookArgs::path(0);
	PathChmod => "path_chmod", Inode, HookArgs::path(0).with_mode(1);
	PathChown => "path_chown", Inode, HookArgs::path(0).with_aux(1);
	PathChroot => "path_chroot", Inode, HookArgs::path(0);
	PathNotify => "path_notify", Inode, HookArgs::path(0).with_aux(1);
	InodeCreate => "inode_create", Inode, HookArgs::dentry(1).with_mode(2);
	InodeLink => "inode_link", Inode, HookArgs::dentry(2);
	InodeUnlink => "inode_unlink", Inode, HookArgs::dentry(1);
	InodeSymlink => "inode_symlink", Inode, HookArgs::dentry(1);
	InodeMkdir => "inode_mkdir", Inode, HookArgs::dentry(1).with_mode(2);
	InodeRmdir => "inode_rmdir", Inode, HookArgs::dentry(1);
	InodeMknod => "inode_mknod", Inode, HookArgs::dentry(1).with_mode(2).with_aux(3);
	InodeRename => "inode_rename", Inode, HookArgs::dentry(1);
	InodeReadlink => "inode_readlink", Inode, HookArgs::dentry(0);
	InodeFollowLink => "inode_follow_link", Inode, HookArgs::dentry(0);
	InodePermission => "inode_permission", Inode, HookArgs::aux_at(1);
	InodeSetattr => "inode_setattr", Inode, HookArgs::none();
	InodeGetattr => "inode_getattr", Inode, HookArgs::path(0);
	InodeSetxattr => "inode_setxattr", Inode, HookArgs::none();
	InodePostSetxattr => "inode_post_setxattr", Inode, HookArgs::dentry(0);
	InodeGetxattr => "inode_getxattr", Inode, HookArgs::dentry(0);
	InodeListxattr => "inode_listxattr", Inode, HookArgs::dentry(0);
	InodeRemovexattr => "inode_removexattr", Inode, HookArgs::none();
	InodeNeedKillpriv => "inode_need_killpriv", Inode, HookArgs::dentry(0);
	InodeKillpriv => "inode_killpriv", Inode, HookArgs::none();
	InodeGetsecurity => "inode_getsecurity", Inode, HookArgs::none();
	InodeSetsecurity => "inode_setsecurity", Inode, HookArgs::string(1);
	InodeListsecurity => "inode_listsecurity", Inode, HookArgs::none();
	InodeGetsecid => "inode_getsecid", Inode, HookArgs::none();
	InodeCopyUp => "inode_copy_up", Inode, HookArgs::dentry(0);
	InodeCopyUpXattr => "inode_copy_up_xattr", Inode, HookArgs::none();
	DInstantiate => "d_instantiate", Inode, HookArgs::dentry(0);
	Getprocattr => "getprocattr", Inode, HookArgs::string(1);
	Setprocattr => "setprocattr", Inode, HookArgs::string(0);

	// -- kernfs
	KernfsInitSecurity => "kernfs_init_security", Kernfs, HookArgs::none();

	// -- file
	FilePermission => "file_permission", File, HookArgs::file(0).with_aux(1);
	FileAllocSecurity => "file_alloc_security", File, HookArgs::none();
	FileFreeSecurity => "file_free_security", File, HookArgs::none();
	FileIoctl => "file_ioctl", File, HookArgs::file(0).with_aux(1);
	MmapAddr => "mmap_addr", File, HookArgs::aux_at(0);
	MmapFile => "mmap_file", File, HookArgs::file(0).with_aux(2);
	FileMprotect => "file_mprotect", File, HookArgs::aux_at(2);
	FileLock => "file_lock", File, HookArgs::file(0).with_aux(1);
	FileFcntl => "file_fcntl", File, HookArgs::file(0).with_aux(1);
}

impl HookId {
	pub fn from_raw(raw: u16) -> Option<Self> {
		HOOK_SITES.get(raw as usize).map(|site| site.id)
	}

	pub fn site(self) -> &'static HookSite {
		&HOOK_SITES[self as usize]
	}
}

impl core::fmt::Display for HookId {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(self.name())
	}
}

// endregion: --- Hook Table

// region:    --- Tests


// endregion: --- Tests
