//! # tickbus-core
//!
//! Foundation layer shared by the producer and consumer loops.
//!
//! ### Key Submodules:
//! - `message`: the immutable, timestamped `Message` value
//! - `buffer`: `SharedBuffer`, a single-lock ordered message store with atomic drain
//! - `shutdown`: `Deadline`, the shared cooperative stop signal for both loops

pub mod buffer;
pub mod message;
pub mod shutdown;

pub use buffer::{capacity_hint, BufferStats, SharedBuffer, MAX_CAPACITY_HINT};
pub use message::Message;
pub use shutdown::{instant_after, Deadline};
