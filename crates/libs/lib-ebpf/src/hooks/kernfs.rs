lsm_hooks! {
	kernfs_init_security => KernfsInitSecurity,
}
