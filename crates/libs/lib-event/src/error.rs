use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),
	#[display("Channel capacity of {_0} bytes cannot hold a single event")]
	CapacityTooSmall(usize),
	#[display("Could not allocate {_0} event slots")]
	ChannelAlloc(usize),
	#[display("Unknown overflow policy '{_0}'")]
	UnknownOverflowPolicy(String),
	InvalidEventSize,
	UnsupportedSchema(u8),
	UnknownHook(u16),
	CategoryMismatch(u8),
}

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate

// region:    --- Tests


// endregion: --- Tests
