mod ringbuf;

pub use ringbuf::*;
