#![cfg_attr(not(test), no_std)]

//! Types shared by the LSM programs and the user-space consumers: the wire layout of an
//! event, the static hook table, the encoder and the generic hook body.

mod encoder;
mod event;
mod hook;
mod sink;

pub use encoder::*;
pub use event::*;
pub use hook::*;
pub use sink::*;

// region:    --- Tests


// endregion: --- Tests
