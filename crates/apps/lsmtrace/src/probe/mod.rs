mod session;
mod sizing;

pub use session::*;
pub use sizing::*;
