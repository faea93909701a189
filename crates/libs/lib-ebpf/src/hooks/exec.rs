lsm_hooks! {
	bprm_creds_for_exec => BprmCredsForExec,
	bprm_creds_from_file => BprmCredsFromFile,
	bprm_check_security => BprmCheckSecurity,
	bprm_committing_creds => BprmCommittingCreds,
	bprm_committed_creds => BprmCommittedCreds,
}
