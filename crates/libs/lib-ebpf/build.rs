use std::path::PathBuf;
use std::process::Command;

use derive_more::{Display, From};
use which::which;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),
	NoOutDir,
	ExecFail,
	#[display("aya-tool exited with {_0}")]
	GenerateFail(i32),

	#[from]
	Which(which::Error),
	#[from]
	Io(std::io::Error),
}

/// Kernel types the hook bodies dereference.
const VMLINUX_TYPES: &[&str] = &["task_struct", "linux_binprm", "file", "path", "dentry", "qstr"];

fn main() -> Result<()> {
	let bpf_linker = which("bpf-linker")?;
	println!("cargo:rerun-if-changed={}", bpf_linker.display());
	println!("cargo:rerun-if-changed=/sys/kernel/btf/vmlinux");

	let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").ok_or(Error::NoOutDir)?);
	let aya_tool = which("aya-tool")?;

	let output = Command::new(aya_tool)
		.arg("generate")
		.args(VMLINUX_TYPES)
		.output()
		.map_err(|_| Error::ExecFail)?;
	if !output.status.success() {
		return Err(Error::GenerateFail(output.status.code().unwrap_or(-1)));
	}

	std::fs::write(out_dir.join("vmlinux.rs"), output.stdout)?;
	Ok(())
}
