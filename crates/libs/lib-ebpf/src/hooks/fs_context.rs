lsm_hooks! {
	fs_context_dup => FsContextDup,
	fs_context_parse_param => FsContextParseParam,
}
