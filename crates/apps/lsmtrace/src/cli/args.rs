use std::path::PathBuf;

use clap::Parser;
use humantime::Duration;
use lib_ebpf_common::HookCategory;
use lib_event::OverflowPolicy;

#[derive(Parser, Debug, Default)]
#[command(name = "lsmtrace", about = "Trace LSM hook activity through BPF")]
pub struct Cli {
	#[arg(long, help = "TOML settings file")]
	pub config: Option<PathBuf>,

	#[arg(long, help = "Compiled hook programs (required unless built with 'embed-ebpf')")]
	pub bpf_object: Option<PathBuf>,

	#[arg(long, help = "Event channel capacity in bytes")]
	pub capacity: Option<usize>,

	#[arg(long, help = "Overflow policy: drop-newest or drop-oldest")]
	pub overflow: Option<OverflowPolicy>,

	#[arg(long = "category", help = "Only attach hooks of this category (repeatable)")]
	pub categories: Vec<HookCategory>,

	#[arg(long = "exclude", help = "Do not attach this hook (repeatable)")]
	pub exclude: Vec<String>,

	#[arg(long, help = "Log every hook invocation from the kernel side")]
	pub log_hooks: bool,

	#[arg(long, help = "Time duration (e.g., 20s, 5m, 1h). Runs until Ctrl-C when absent")]
	pub time: Option<Duration>,
}
