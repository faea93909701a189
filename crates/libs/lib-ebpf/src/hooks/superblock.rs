lsm_hooks! {
	sb_alloc_security => SbAllocSecurity,
	sb_free_security => SbFreeSecurity,
	sb_free_mnt_opts => SbFreeMntOpts,
	sb_eat_lsm_opts => SbEatLsmOpts,
	sb_remount => SbRemount,
	sb_kern_mount => SbKernMount,
	sb_show_options => SbShowOptions,
	sb_statfs => SbStatfs,
	sb_mount => SbMount,
	sb_umount => SbUmount,
	sb_pivotroot => SbPivotroot,
	sb_set_mnt_opts => SbSetMntOpts,
	sb_clone_mnt_opts => SbCloneMntOpts,
	sb_add_mnt_opt => SbAddMntOpt,
	move_mount => MoveMount,
	dentry_create_files_as => DentryCreateFilesAs,
}
