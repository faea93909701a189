lsm_hooks! {
	file_permission => FilePermission,
	file_alloc_security => FileAllocSecurity,
	file_free_security => FileFreeSecurity,
	file_ioctl => FileIoctl,
	mmap_addr => MmapAddr,
	mmap_file => MmapFile,
	file_mprotect => FileMprotect,
	file_lock => FileLock,
	file_fcntl => FileFcntl,
}
