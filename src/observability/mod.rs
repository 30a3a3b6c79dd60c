//! Observability: log assembly and emission
//!
//! The assembler renders request/response blocks; sinks decide where the
//! rendered text goes.

pub mod assembler;
pub mod sink;

pub use assembler::{request_block, response_block, LogBlock};
pub use sink::{LogSink, TracingSink};
