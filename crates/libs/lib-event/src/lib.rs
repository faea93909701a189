// region:    --- Modules

mod channel;
mod decode;
mod error;
mod session;
mod task;

pub use channel::*;
pub use decode::*;
pub use error::{Error, Result};
pub use session::*;
pub use task::*;

// endregion: --- Modules
