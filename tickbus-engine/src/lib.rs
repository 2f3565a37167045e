//! # tickbus-engine
//!
//! Runs the producer and consumer loops against one shared buffer until a
//! shared deadline.

pub mod consumer;
pub mod error;
pub mod producer;
pub mod runtime;

pub use consumer::{Consumer, MessageSink, StdoutSink};
pub use error::RuntimeError;
pub use producer::Producer;
pub use runtime::{LoopReport, LoopState, RunSummary, Runtime};
