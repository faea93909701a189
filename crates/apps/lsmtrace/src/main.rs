// region:    --- Modules
mod agent;
mod cli;
mod error;
mod probe;
mod settings;
mod supervisor;
mod trx;
mod workers;
// endregion: --- Modules

use crate::{
	agent::{run_agent_sink, run_until_stopped},
	cli::args::Cli,
	probe::KernelSession,
	settings::Settings,
	supervisor::Supervisor,
	trx::new_trx_pair,
	workers::RingBufWorker,
};

pub use self::error::{Error, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
#[rustfmt::skip]
use tracing::{debug, info};

const EVENT_QUEUE_BOUND: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
	let args = Cli::parse();
	tracing_subscriber::fmt()
		.with_target(false)
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let settings = Settings::load(&args)?;
	let hooks = settings.enabled_hooks()?;

	// Bump the memlock rlimit. This is needed for older kernels that don't use the
	// new memcg based accounting, see https://lwn.net/Articles/837122/
	let rlim = libc::rlimit {
		rlim_cur: libc::RLIM_INFINITY,
		rlim_max: libc::RLIM_INFINITY,
	};
	let ret = unsafe { libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlim) };
	if ret != 0 {
		debug!("remove limit on locked memory failed, ret is: {ret}");
	}

	let (session, ringbuf_fd) = KernelSession::start(&settings, args.bpf_object.as_deref(), &hooks)?;
	for site in session.attached() {
		debug!("tracing {} [{}]", site.name, site.category);
	}

	let (event_tx, event_rx) = new_trx_pair(EVENT_QUEUE_BOUND);

	let mut supervisor = Supervisor::new();
	let ringbuf_worker = RingBufWorker::start(ringbuf_fd, event_tx, supervisor.token())?;
	supervisor.spawn(ringbuf_worker.run());
	supervisor.spawn(run_agent_sink(event_rx));

	let run_time = args.time.map(Into::into);
	run_until_stopped(&session, settings.stats_interval(), run_time, supervisor.token()).await?;

	// Detach first so the worker's final drain sees everything committed before stop.
	let stats = session.stop()?;
	supervisor.shutdown().await?;

	info!("session stopped: {} dropped, {} skipped", stats.dropped, stats.skipped);

	Ok(())
}
