//! File watching for the callback chain.
//!
//! # Architecture
//!
//! ```text
//! EventSource (notify::RecommendedWatcher)
//!   - coalesces raw events over the latency window
//!   - yields batches of changed directories
//!         |
//!     Debouncer
//!   - lists the directories
//!   - keeps entries newer than the watermark
//!         |
//!   CallbackChain (process, then post_process)
//! ```
//!
//! [`Kicker`] owns the loop and the watermark.

mod debouncer;
mod error;
mod orchestrator;
mod source;

pub use debouncer::Debouncer;
pub use error::{StartError, WatchError};
pub use orchestrator::{Kicker, KickerBuilder};
pub use source::EventSource;
