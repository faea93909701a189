lsm_hooks! {
	inode_alloc_security => InodeAllocSecurity,
	inode_free_security => InodeFreeSecurity,
	inode_init_security => InodeInitSecurity,
	path_unlink => PathUnlink,
	path_mkdir => PathMkdir,
	path_rmdir => PathRmdir,
	path_symlink => PathSymlink,
	path_link => PathLink,
	path_rename => PathRename,
	path_truncate => PathTruncate,
	path_chmod => PathChmod,
	path_chown => PathChown,
	path_chroot => PathChroot,
	path_notify => PathNotify,
	inode_create => InodeCreate,
	inode_link => InodeLink,
	inode_unlink => InodeUnlink,
	inode_symlink => InodeSymlink,
	inode_mkdir => InodeMkdir,
	inode_rmdir => InodeRmdir,
	inode_mknod => InodeMknod,
	inode_rename => InodeRename,
	inode_readlink => InodeReadlink,
	inode_follow_link => InodeFollowLink,
	inode_permission => InodePermission,
	inode_setattr => InodeSetattr,
	inode_getattr => InodeGetattr,
	inode_setxattr => InodeSetxattr,
	inode_post_setxattr => InodePostSetxattr,
	inode_getxattr => InodeGetxattr,
	inode_listxattr => InodeListxattr,
	inode_removexattr => InodeRemovexattr,
	inode_need_killpriv => InodeNeedKillpriv,
	inode_killpriv => InodeKillpriv,
	inode_getsecurity => InodeGetsecurity,
	inode_setsecurity => InodeSetsecurity,
	inode_listsecurity => InodeListsecurity,
	inode_getsecid => InodeGetsecid,
	inode_copy_up => InodeCopyUp,
	inode_copy_up_xattr => InodeCopyUpXattr,
	d_instantiate => DInstantiate,
	getprocattr => Getprocattr,
	setprocattr => Setprocattr,
}
