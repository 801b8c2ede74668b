//! Core traits defined in `looped-core` and implemented by other crates.

pub mod clock;

pub use clock::{Clock, SystemClock};
