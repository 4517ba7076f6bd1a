//! Semantic diagnostics.
//!
//! Resolution and lowering report failures as [`SemaError`] values carrying
//! the offending nodes and a source position. Turning those positions into
//! text is delegated to a [`LocationFormatter`], supplied by whoever owns the
//! source files; [`TerminalEmitter`] prints a batch of errors with a summary.

mod emitter;
mod error;

pub use emitter::{FileTable, LocationFormatter, TerminalEmitter};
pub use error::SemaError;
