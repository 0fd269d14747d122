//! Whole-file text input and output, and data formats for configuration.

mod source;
mod sink;
mod format;

pub use source::*;
pub use sink::*;
pub use format::*;
