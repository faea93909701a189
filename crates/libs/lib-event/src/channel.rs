//! Bounded multi-producer, multi-consumer event ring.
//!
//! Cursors and slot stamps pack a lap counter above the slot index (`one_lap` is the
//! smallest power of two above the capacity). A producer owns a slot once it has moved
//! the write cursor past a stamp equal to the slot's own. Publishing stores `stamp + 1`
//! with release ordering, consuming stores `stamp + one_lap`. Nothing in the hot path
//! blocks or allocates.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam::utils::{Backoff, CachePadded};
use derive_more::Display;
use lib_ebpf_common::{Event, EventSink, Overflow, EVENT_SIZE};
use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

pub const DEFAULT_CAPACITY_BYTES: usize = 16 * 1024 * 1024;

/// Upper bound on evictions a single `drop-oldest` reservation may perform.
const MAX_EVICTIONS: usize = 4;

// region:    --- Overflow Policy

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
	#[default]
	#[display("drop-newest")]
	DropNewest,
	#[display("drop-oldest")]
	DropOldest,
}

impl FromStr for OverflowPolicy {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"drop-newest" => Ok(Self::DropNewest),
			"drop-oldest" => Ok(Self::DropOldest),
			other => Err(Error::UnknownOverflowPolicy(other.to_string())),
		}
	}
}

// endregion: --- Overflow Policy

// region:    --- Stats

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
	pub committed: u64,
	pub dropped: u64,
	/// Hooks that fired without a current task.
	pub skipped: u64,
}

// endregion: --- Stats

struct SlotData {
	live: bool,
	event: MaybeUninit<Event>,
}

struct Slot {
	stamp: AtomicUsize,
	data: UnsafeCell<SlotData>,
}

// Access to `data` is serialized by `stamp`.
unsafe impl Sync for Slot {}

enum Take {
	Empty,
	Discarded,
	Event(Event),
}

pub struct EventChannel {
	slots: Box<[Slot]>,
	one_lap: usize,
	policy: OverflowPolicy,
	head: CachePadded<AtomicUsize>,
	tail: CachePadded<AtomicUsize>,
	committed: AtomicU64,
	dropped: AtomicU64,
	skipped: AtomicU64,
}

impl EventChannel {
	/// Sizes the ring to as many whole events as fit in `capacity_bytes`.
	pub fn with_capacity(capacity_bytes: usize, policy: OverflowPolicy) -> Result<Self> {
		let slots = capacity_bytes / EVENT_SIZE;
		if slots == 0 {
			return Err(Error::CapacityTooSmall(capacity_bytes));
		}
		Self::with_slots(slots, policy)
	}

	pub fn with_slots(slots: usize, policy: OverflowPolicy) -> Result<Self> {
		if slots == 0 {
			return Err(Error::CapacityTooSmall(0));
		}

		let mut buf: Vec<Slot> = Vec::new();
		buf.try_reserve_exact(slots).map_err(|_| Error::ChannelAlloc(slots))?;
		buf.extend((0..slots).map(|i| Slot {
			stamp: AtomicUsize::new(i),
			data: UnsafeCell::new(SlotData {
				live: false,
				event: MaybeUninit::uninit(),
			}),
		}));

		debug!("event channel ready: {slots} slots, {policy}");

		Ok(Self {
			slots: buf.into_boxed_slice(),
			one_lap: (slots + 1).next_power_of_two(),
			policy,
			head: CachePadded::new(AtomicUsize::new(0)),
			tail: CachePadded::new(AtomicUsize::new(0)),
			committed: AtomicU64::new(0),
			dropped: AtomicU64::new(0),
			skipped: AtomicU64::new(0),
		})
	}

	pub fn capacity(&self) -> usize {
		self.slots.len()
	}

	pub fn policy(&self) -> OverflowPolicy {
		self.policy
	}

	/// Claims one slot, applying the overflow policy when the ring is full.
	/// A failed reservation has already been counted as a drop.
	pub fn reserve(&self) -> core::result::Result<SlotHandle<'_>, Overflow> {
		let mut evictions = 0;
		loop {
			if let Some(handle) = self.try_reserve() {
				return Ok(handle);
			}
			if self.policy != OverflowPolicy::DropOldest || evictions == MAX_EVICTIONS || !self.evict_oldest() {
				break;
			}
			evictions += 1;
		}

		self.dropped.fetch_add(1, Ordering::Relaxed);
		Err(Overflow)
	}

	/// Committed events in commit order. Stops at the first slot that is free or
	/// still being written; calling again later picks up from there.
	pub fn poll(&self) -> Poll<'_> {
		Poll { channel: self }
	}

	pub fn stats(&self) -> ChannelStats {
		ChannelStats {
			committed: self.committed.load(Ordering::Relaxed),
			dropped: self.dropped.load(Ordering::Relaxed),
			skipped: self.skipped.load(Ordering::Relaxed),
		}
	}

	/// Reserved or committed slots not yet consumed. Approximate under contention.
	pub fn len(&self) -> usize {
		let tail = self.tail.load(Ordering::Acquire);
		let head = self.head.load(Ordering::Acquire);
		let hix = head & (self.one_lap - 1);
		let tix = tail & (self.one_lap - 1);

		if hix < tix {
			tix - hix
		} else if hix > tix {
			self.capacity() - hix + tix
		} else if tail == head {
			0
		} else {
			self.capacity()
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn slot(&self, stamp: usize) -> &Slot {
		&self.slots[stamp & (self.one_lap - 1)]
	}

	/// Cursor value following `stamp`, wrapping to the next lap after the last slot.
	fn advance(&self, stamp: usize) -> usize {
		let index = stamp & (self.one_lap - 1);
		let lap = stamp & !(self.one_lap - 1);
		if index + 1 < self.capacity() {
			stamp + 1
		} else {
			lap.wrapping_add(self.one_lap)
		}
	}

	fn try_reserve(&self) -> Option<SlotHandle<'_>> {
		let backoff = Backoff::new();
		let mut tail = self.tail.load(Ordering::Relaxed);
		loop {
			let stamp = self.slot(tail).stamp.load(Ordering::Acquire);

			if stamp == tail {
				match self
					.tail
					.compare_exchange_weak(tail, self.advance(tail), Ordering::SeqCst, Ordering::Relaxed)
				{
					Ok(_) => {
						return Some(SlotHandle {
							channel: self,
							stamp: tail,
							written: false,
							published: false,
						})
					}
					Err(current) => {
						tail = current;
						backoff.spin();
					}
				}
			} else if (stamp.wrapping_sub(tail) as isize) < 0 {
				// slot still held by the previous lap, reserved or unconsumed
				let current = self.tail.load(Ordering::Relaxed);
				if current == tail {
					return None;
				}
				tail = current;
			} else {
				backoff.snooze();
				tail = self.tail.load(Ordering::Relaxed);
			}
		}
	}

	fn take(&self) -> Take {
		let backoff = Backoff::new();
		let mut head = self.head.load(Ordering::Relaxed);
		loop {
			let slot = self.slot(head);
			let stamp = slot.stamp.load(Ordering::Acquire);

			if stamp == head.wrapping_add(1) {
				match self
					.head
					.compare_exchange_weak(head, self.advance(head), Ordering::SeqCst, Ordering::Relaxed)
				{
					Ok(_) => {
						// SAFETY: the acquire load above observed the producer's release of `head + 1`
						// and the successful CAS makes this consumer the slot's only reader.
						let taken = unsafe {
							let data = &*slot.data.get();
							if data.live {
								Take::Event(data.event.assume_init_read())
							} else {
								Take::Discarded
							}
						};
						slot.stamp.store(head.wrapping_add(self.one_lap), Ordering::Release);
						return taken;
					}
					Err(current) => {
						head = current;
						backoff.spin();
					}
				}
			} else if stamp == head {
				// free, or reserved and not yet published
				return Take::Empty;
			} else {
				backoff.snooze();
				head = self.head.load(Ordering::Relaxed);
			}
		}
	}

	fn next_event(&self) -> Option<Event> {
		loop {
			match self.take() {
				Take::Event(event) => return Some(event),
				Take::Discarded => continue,
				Take::Empty => return None,
			}
		}
	}

	/// Frees the oldest slot. Returns false when the head is free or still reserved.
	fn evict_oldest(&self) -> bool {
		match self.take() {
			Take::Event(_) => {
				self.dropped.fetch_add(1, Ordering::Relaxed);
				true
			}
			Take::Discarded => true,
			Take::Empty => false,
		}
	}
}

impl EventSink for EventChannel {
	fn publish(&self, event: &Event) -> core::result::Result<(), Overflow> {
		let mut slot = self.reserve()?;
		slot.write(event);
		slot.commit();
		Ok(())
	}

	fn record_skip(&self) {
		self.skipped.fetch_add(1, Ordering::Relaxed);
	}
}

// region:    --- Slot Handle

/// Exclusive ownership of one reserved slot. Dropping it without [`SlotHandle::commit`]
/// publishes the slot as discarded so consumers step over it.
pub struct SlotHandle<'a> {
	channel: &'a EventChannel,
	stamp: usize,
	written: bool,
	published: bool,
}

impl SlotHandle<'_> {
	pub fn write(&mut self, event: &Event) {
		let slot = self.channel.slot(self.stamp);
		// SAFETY: the slot is reserved by this handle until it is published.
		unsafe {
			(*slot.data.get()).event.write(*event);
		}
		self.written = true;
	}

	/// Publishes the written event. A handle that was never written is discarded instead.
	pub fn commit(mut self) {
		self.publish(true);
	}

	fn publish(&mut self, commit: bool) {
		let live = commit && self.written;
		let slot = self.channel.slot(self.stamp);
		// SAFETY: as in `write`, the stamp store below hands the slot over.
		unsafe {
			(*slot.data.get()).live = live;
		}
		slot.stamp.store(self.stamp.wrapping_add(1), Ordering::Release);
		self.published = true;

		if live {
			self.channel.committed.fetch_add(1, Ordering::Relaxed);
		}
	}
}

impl Drop for SlotHandle<'_> {
	fn drop(&mut self) {
		if !self.published {
			self.publish(false);
		}
	}
}

// endregion: --- Slot Handle

// region:    --- Poll

pub struct Poll<'a> {
	channel: &'a EventChannel,
}

impl Iterator for Poll<'_> {
	type Item = Event;

	fn next(&mut self) -> Option<Event> {
		self.channel.next_event()
	}
}

// endregion: --- Poll

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use std::collections::HashSet;
	use std::sync::atomic::AtomicBool;

	use lib_ebpf_common::{EventHeader, HookId, Payload, COMM_LEN, SCHEMA_VERSION};

	use super::*;

	fn fx_event(hook: HookId, pid: u32) -> Event {
		Event {
			header: EventHeader {
				hook_id: hook as u16,
				category: hook.category() as u8,
				version: SCHEMA_VERSION,
				_pad0: [0u8; 4],
				timestamp_ns: pid as u64,
			},
			pid,
			tgid: pid,
			ppid: 1,
			_pad0: 0,
			comm: [b'a'; COMM_LEN],
			payload: Payload::EMPTY,
		}
	}

	#[test]
	fn capacity_below_one_event_is_rejected() -> Result<()> {
		// -- Exec
		let res = EventChannel::with_capacity(EVENT_SIZE - 1, OverflowPolicy::DropNewest);

		// -- Check
		assert!(matches!(res, Err(Error::CapacityTooSmall(n)) if n == EVENT_SIZE - 1));

		Ok(())
	}

	#[test]
	fn capacity_counts_whole_events() -> Result<()> {
		// -- Exec
		let channel = EventChannel::with_capacity(EVENT_SIZE * 3 + 5, OverflowPolicy::DropNewest)?;

		// -- Check
		assert_eq!(channel.capacity(), 3);
		assert!(channel.is_empty());

		Ok(())
	}

	#[test]
	fn committed_event_reads_back_identical() -> Result<()> {
		// -- Setup & Fixtures
		let channel = EventChannel::with_slots(4, OverflowPolicy::DropNewest)?;
		let mut event = fx_event(HookId::InodeRename, 77);
		event.payload.set_name(b"old-name");
		event.payload.set_aux(3);

		// -- Exec
		let mut slot = channel.reserve()?;
		slot.write(&event);
		slot.commit();
		let read: Vec<Event> = channel.poll().collect();

		// -- Check
		assert_eq!(read, vec![event]);
		assert_eq!(channel.stats().committed, 1);

		Ok(())
	}

	#[test]
	fn single_producer_order_is_preserved() -> Result<()> {
		// -- Setup & Fixtures
		let channel = EventChannel::with_slots(8, OverflowPolicy::DropNewest)?;

		// -- Exec
		channel.publish(&fx_event(HookId::InodeCreate, 1))?;
		channel.publish(&fx_event(HookId::InodeCreate, 2))?;
		let pids: Vec<u32> = channel.poll().map(|e| e.pid).collect();

		// -- Check
		assert_eq!(pids, vec![1, 2]);

		Ok(())
	}

	#[test]
	fn full_channel_drops_newest_without_blocking() -> Result<()> {
		// -- Setup & Fixtures
		let channel = EventChannel::with_slots(10, OverflowPolicy::DropNewest)?;

		// -- Exec
		let mut last_dropped = 0;
		for pid in 0..15 {
			let res = channel.publish(&fx_event(HookId::FilePermission, pid));
			if pid >= 10 {
				assert_eq!(res, Err(Overflow));
				let dropped = channel.stats().dropped;
				assert!(dropped > last_dropped);
				last_dropped = dropped;
			}
		}

		// -- Check
		let stats = channel.stats();
		assert_eq!(stats.committed, 10);
		assert_eq!(stats.dropped, 5);
		let pids: Vec<u32> = channel.poll().map(|e| e.pid).collect();
		assert_eq!(pids, (0..10).collect::<Vec<_>>());

		Ok(())
	}

	#[test]
	fn drained_channel_accepts_again() -> Result<()> {
		// -- Setup & Fixtures
		let channel = EventChannel::with_slots(2, OverflowPolicy::DropNewest)?;
		channel.publish(&fx_event(HookId::MmapFile, 1))?;
		channel.publish(&fx_event(HookId::MmapFile, 2))?;
		assert!(channel.publish(&fx_event(HookId::MmapFile, 3)).is_err());

		// -- Exec
		assert_eq!(channel.poll().count(), 2);
		let res = channel.publish(&fx_event(HookId::MmapFile, 4));

		// -- Check
		assert!(res.is_ok());
		assert_eq!(channel.poll().map(|e| e.pid).collect::<Vec<_>>(), vec![4]);

		Ok(())
	}

	#[test]
	fn drop_oldest_keeps_newest_events() -> Result<()> {
		// -- Setup & Fixtures
		let channel = EventChannel::with_slots(10, OverflowPolicy::DropOldest)?;

		// -- Exec
		for pid in 0..15 {
			channel.publish(&fx_event(HookId::InodeGetattr, pid))?;
		}

		// -- Check
		let stats = channel.stats();
		assert_eq!(stats.committed, 15);
		assert_eq!(stats.dropped, 5);
		let pids: Vec<u32> = channel.poll().map(|e| e.pid).collect();
		assert_eq!(pids, (5..15).collect::<Vec<_>>());

		Ok(())
	}

	#[test]
	fn drop_oldest_cannot_evict_reserved_head() -> Result<()> {
		// -- Setup & Fixtures
		let channel = EventChannel::with_slots(1, OverflowPolicy::DropOldest)?;
		let held = channel.reserve()?;

		// -- Exec
		let res = channel.publish(&fx_event(HookId::InodeLink, 9));

		// -- Check
		assert_eq!(res, Err(Overflow));
		assert_eq!(channel.stats().dropped, 1);
		drop(held);
		assert_eq!(channel.poll().count(), 0);

		Ok(())
	}

	#[test]
	fn uncommitted_reservation_is_skipped() -> Result<()> {
		// -- Setup & Fixtures
		let channel = EventChannel::with_slots(4, OverflowPolicy::DropNewest)?;

		// -- Exec
		{
			let mut abandoned = channel.reserve()?;
			abandoned.write(&fx_event(HookId::PathUnlink, 1));
		}
		channel.publish(&fx_event(HookId::PathUnlink, 2))?;

		// -- Check
		let pids: Vec<u32> = channel.poll().map(|e| e.pid).collect();
		assert_eq!(pids, vec![2]);
		assert_eq!(channel.stats().committed, 1);

		Ok(())
	}

	#[test]
	fn poll_stops_at_slot_still_being_written() -> Result<()> {
		// -- Setup & Fixtures
		let channel = EventChannel::with_slots(4, OverflowPolicy::DropNewest)?;
		let mut pending = channel.reserve()?;
		channel.publish(&fx_event(HookId::FileLock, 2))?;

		// -- Exec
		let before: Vec<u32> = channel.poll().map(|e| e.pid).collect();
		pending.write(&fx_event(HookId::FileLock, 1));
		pending.commit();
		let after: Vec<u32> = channel.poll().map(|e| e.pid).collect();

		// -- Check
		assert!(before.is_empty());
		assert_eq!(after, vec![1, 2]);

		Ok(())
	}

	#[test]
	fn concurrent_producers_lose_nothing_within_capacity() -> Result<()> {
		// -- Setup & Fixtures
		let channel = EventChannel::with_slots(4096, OverflowPolicy::DropNewest)?;

		// -- Exec
		std::thread::scope(|s| {
			for t in 0..4u32 {
				let channel = &channel;
				s.spawn(move || {
					for i in 0..500u32 {
						let _ = channel.publish(&fx_event(HookId::InodePermission, t * 1000 + i));
					}
				});
			}
		});

		// -- Check
		let events: Vec<Event> = channel.poll().collect();
		assert_eq!(events.len(), 2000);
		for t in 0..4u32 {
			let mine: Vec<u32> = events.iter().map(|e| e.pid).filter(|pid| pid / 1000 == t).collect();
			assert!(mine.windows(2).all(|w| w[0] < w[1]), "producer {t} reordered");
		}

		Ok(())
	}

	#[test]
	fn cursors_live_on_separate_cache_lines() -> Result<()> {
		// -- Setup & Fixtures
		let channel = EventChannel::with_slots(8, OverflowPolicy::DropNewest)?;

		// -- Exec
		let head = &*channel.head as *const AtomicUsize as usize;
		let tail = &*channel.tail as *const AtomicUsize as usize;

		// -- Check
		assert!(head.abs_diff(tail) >= 64);

		Ok(())
	}

	#[test]
	fn overlapping_consumers_see_whole_events_drop_newest() -> Result<()> {
		run_overlapping(OverflowPolicy::DropNewest)
	}

	#[test]
	fn overlapping_consumers_see_whole_events_drop_oldest() -> Result<()> {
		run_overlapping(OverflowPolicy::DropOldest)
	}

	/// Four producers and two consumers share an 8 slot ring for many laps.
	fn run_overlapping(policy: OverflowPolicy) -> Result<()> {
		// -- Setup & Fixtures
		const PRODUCERS: u32 = 4;
		const PER_PRODUCER: u32 = 20_000;
		let channel = EventChannel::with_slots(8, policy)?;
		let done = AtomicBool::new(false);

		// -- Exec
		let seen: Vec<Vec<Event>> = std::thread::scope(|s| {
			let consumers: Vec<_> = (0..2)
				.map(|_| {
					let (channel, done) = (&channel, &done);
					s.spawn(move || {
						let mut seen = Vec::new();
						loop {
							let finished = done.load(Ordering::Acquire);
							seen.extend(channel.poll());
							if finished {
								return seen;
							}
							std::hint::spin_loop();
						}
					})
				})
				.collect();

			let producers: Vec<_> = (0..PRODUCERS)
				.map(|t| {
					let channel = &channel;
					s.spawn(move || {
						for i in 0..PER_PRODUCER {
							let mut event = fx_event(HookId::InodePermission, (t << 24) | i);
							event.payload.set_aux(event.pid as u64);
							let _ = channel.publish(&event);
						}
					})
				})
				.collect();
			for producer in producers {
				let _ = producer.join();
			}
			done.store(true, Ordering::Release);

			consumers.into_iter().map(|c| c.join().unwrap_or_default()).collect()
		});

		// -- Check
		let stats = channel.stats();
		let mut ids = HashSet::new();
		for events in &seen {
			let mut last: [Option<u32>; PRODUCERS as usize] = [None; PRODUCERS as usize];
			for event in events {
				assert!(ids.insert(event.pid), "event {:#x} seen twice", event.pid);
				assert_eq!(event.header.timestamp_ns, event.pid as u64);
				assert_eq!(event.payload.aux(), Some(event.pid as u64));
				assert_eq!(event.comm, [b'a'; COMM_LEN]);

				let producer = (event.pid >> 24) as usize;
				let seq = event.pid & 0x00ff_ffff;
				assert!(last[producer].map_or(true, |prev| prev < seq), "producer {producer} reordered");
				last[producer] = Some(seq);
			}
		}

		let consumed = ids.len() as u64;
		assert_eq!(consumed + stats.dropped, (PRODUCERS * PER_PRODUCER) as u64);
		assert!(consumed <= stats.committed);
		if policy == OverflowPolicy::DropNewest {
			assert_eq!(consumed, stats.committed);
		}
		assert!(channel.is_empty());

		Ok(())
	}

	#[test]
	fn overflow_policy_parse() -> Result<()> {
		// -- Check
		assert_eq!("drop-newest".parse::<OverflowPolicy>()?, OverflowPolicy::DropNewest);
		assert_eq!("drop-oldest".parse::<OverflowPolicy>()?, OverflowPolicy::DropOldest);
		assert!("block".parse::<OverflowPolicy>().is_err());
		assert_eq!(OverflowPolicy::default().to_string(), "drop-newest");

		Ok(())
	}
}

// endregion: --- Tests
