use derive_more::{Display, From};
use flume::{RecvError, SendError};
use tokio::task::JoinError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),
	EventSend(String),
	EventRecv(RecvError),
	#[display("eBPF program '{_0}' not found in object")]
	EbpfProgNotFound(&'static str),
	#[display("eBPF map '{_0}' not found in object")]
	EbpfMapNotFound(&'static str),
	#[display("No eBPF object: pass --bpf-object or build with the 'embed-ebpf' feature")]
	NoBpfObject,
	#[display("Unknown hook '{_0}' in settings")]
	UnknownHook(String),
	#[display("Unknown hook category '{_0}' in settings")]
	UnknownCategory(String),
	#[display("Ring buffer of {_0} bytes does not fit the kernel map size")]
	RingTooLarge(usize),
	#[display("The kernel ring buffer only supports the '{_0}' overflow policy")]
	UnsupportedOverflow(lib_event::OverflowPolicy),
	#[display("No hook enabled after applying categories and exclusions")]
	NoHooksEnabled,
	#[display("Every available hook failed to attach")]
	NoHooksAttached,

	// -- Externals
	#[from]
	JoinError(JoinError),
	#[from]
	AyaEbpf(aya::EbpfError),
	#[from]
	AyaBtf(aya::BtfError),
	#[from]
	AyaMaps(aya::maps::MapError),
	#[from]
	AyaProgram(aya::programs::ProgramError),
	#[from]
	Event(lib_event::Error),
	#[display("Settings error: {_0}")]
	#[from]
	Toml(toml::de::Error),
	#[from]
	Io(std::io::Error),
}

impl<T> From<SendError<T>> for Error {
	fn from(value: SendError<T>) -> Self {
		Self::EventSend(value.to_string())
	}
}

impl From<RecvError> for Error {
	fn from(err: RecvError) -> Self {
		Self::EventRecv(err)
	}
}

// region:    --- Custom

impl Error {
	pub fn custom(val: impl Into<String>) -> Self {
		Self::Custom(val.into())
	}
}

// endregion: --- Custom

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
