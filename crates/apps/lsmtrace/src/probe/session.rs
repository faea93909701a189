use std::path::Path;

use aya::{
	maps::{MapData, PerCpuArray, RingBuf},
	programs::{lsm::LsmLinkId, Lsm},
	Btf, Ebpf, EbpfLoader,
};
use lib_ebpf_common::HookSite;
use lib_event::OverflowPolicy;
use tokio::io::unix::AsyncFd;
use tracing::{debug, info, warn};

use super::{page_size, ring_byte_size};
use crate::settings::Settings;
use crate::{Error, Result};

const EVENTS_MAP: &str = "EVENTS";
const COUNTERS_MAP: &str = "COUNTERS";
const DROPPED_IDX: u32 = 0;
const SKIPPED_IDX: u32 = 1;

#[cfg(feature = "embed-ebpf")]
static EMBEDDED_OBJECT: &[u8] = aya::include_bytes_aligned!(concat!(env!("OUT_DIR"), "/lsmtrace-hooks"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelStats {
	pub dropped: u64,
	pub skipped: u64,
}

/// Kernel host: the hook programs loaded, attached and feeding one BPF ring buffer.
pub struct KernelSession {
	ebpf: Ebpf,
	links: Vec<(&'static HookSite, LsmLinkId)>,
	counters: PerCpuArray<MapData, u64>,
}

impl KernelSession {
	/// Loads the object, attaches every hook in `hooks` the kernel provides and hands
	/// back the ring buffer for the consumer.
	pub fn start(
		settings: &Settings,
		bpf_object: Option<&Path>,
		hooks: &[&'static HookSite],
	) -> Result<(Self, AsyncFd<RingBuf<MapData>>)> {
		if settings.channel.overflow != OverflowPolicy::DropNewest {
			return Err(Error::UnsupportedOverflow(settings.channel.overflow));
		}

		let ring_size = ring_byte_size(settings.channel.capacity_bytes, page_size())?;
		let tracer_tgid = std::process::id();
		let log_hooks = settings.hooks.log_hooks as u8;

		let mut loader = EbpfLoader::new();
		loader
			.set_max_entries(EVENTS_MAP, ring_size)
			.set_global("TRACER_TGID", &tracer_tgid, true)
			.set_global("LOG_HOOKS", &log_hooks, true);
		let mut ebpf = load_object(&mut loader, bpf_object)?;

		if let Err(e) = aya_log::EbpfLogger::init(&mut ebpf) {
			// No log statements survive when the hook trace is compiled out.
			warn!("failed to initialize eBPF logger: {e}");
		}

		let links = attach_hooks(&mut ebpf, hooks)?;
		info!("attached {} of {} hooks, ring buffer {ring_size} bytes", links.len(), hooks.len());

		let ring_buf = RingBuf::try_from(ebpf.take_map(EVENTS_MAP).ok_or(Error::EbpfMapNotFound(EVENTS_MAP))?)?;
		let counters = PerCpuArray::try_from(ebpf.take_map(COUNTERS_MAP).ok_or(Error::EbpfMapNotFound(COUNTERS_MAP))?)?;
		let fd = AsyncFd::new(ring_buf)?;

		Ok((Self { ebpf, links, counters }, fd))
	}

	pub fn attached(&self) -> impl Iterator<Item = &'static HookSite> + '_ {
		self.links.iter().map(|(site, _)| *site)
	}

	/// Sums the per-CPU counters.
	pub fn stats(&self) -> Result<KernelStats> {
		Ok(KernelStats {
			dropped: self.counter(DROPPED_IDX)?,
			skipped: self.counter(SKIPPED_IDX)?,
		})
	}

	fn counter(&self, index: u32) -> Result<u64> {
		let values = self.counters.get(&index, 0)?;
		Ok(values.iter().sum())
	}

	/// Detaches every hook. Events already in the ring buffer stay readable.
	pub fn stop(mut self) -> Result<KernelStats> {
		let stats = self.stats()?;

		for (site, link) in self.links.drain(..) {
			let program: &mut Lsm = self
				.ebpf
				.program_mut(site.name)
				.ok_or(Error::EbpfProgNotFound(site.name))?
				.try_into()?;
			if let Err(e) = program.detach(link) {
				warn!("failed to detach {}: {e}", site.name);
			}
		}
		debug!("all hooks detached");

		Ok(stats)
	}
}

fn load_object(loader: &mut EbpfLoader, bpf_object: Option<&Path>) -> Result<Ebpf> {
	match bpf_object {
		Some(path) => {
			debug!("loading hook programs from {}", path.display());
			Ok(loader.load_file(path)?)
		}
		None => load_embedded(loader),
	}
}

#[cfg(feature = "embed-ebpf")]
fn load_embedded(loader: &mut EbpfLoader) -> Result<Ebpf> {
	Ok(loader.load(EMBEDDED_OBJECT)?)
}

#[cfg(not(feature = "embed-ebpf"))]
fn load_embedded(_loader: &mut EbpfLoader) -> Result<Ebpf> {
	Err(Error::NoBpfObject)
}

/// Loads and attaches each hook against kernel BTF. Hooks the running kernel does not
/// have are skipped with a warning.
fn attach_hooks(ebpf: &mut Ebpf, hooks: &[&'static HookSite]) -> Result<Vec<(&'static HookSite, LsmLinkId)>> {
	let btf = Btf::from_sys_fs()?;
	let mut links = Vec::with_capacity(hooks.len());

	for site in hooks {
		let program: &mut Lsm = ebpf
			.program_mut(site.name)
			.ok_or(Error::EbpfProgNotFound(site.name))?
			.try_into()?;

		if let Err(e) = program.load(site.name, &btf) {
			warn!("LSM hook {} not available; skipping ({e})", site.name);
			continue;
		}

		match program.attach() {
			Ok(link) => {
				debug!("attached {} [{}]", site.name, site.category);
				links.push((*site, link));
			}
			Err(e) => warn!("failed to attach {}; skipping ({e})", site.name),
		}
	}

	if links.is_empty() {
		return Err(Error::NoHooksAttached);
	}
	Ok(links)
}
