//! Pipeline entry points for watcher operations.
//!
//! - `detect`: Compare extracted links against the previous baseline
//! - `Poller`: Run fetch → extract → detect → notify cycles forever

pub mod detect;
pub mod poll;

pub use detect::{Detection, detect};
pub use poll::{CycleOutcome, CycleState, Poller};
