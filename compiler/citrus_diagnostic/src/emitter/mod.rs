//! Rendering errors for humans.

use std::io::Write;

use citrus_ast::{FileId, SourceLoc};
use rustc_hash::FxHashMap;

use crate::SemaError;

/// Turns a source position into display text.
pub trait LocationFormatter {
    fn format_loc(&self, loc: SourceLoc) -> String;
}

/// Maps file ids to paths and formats `path:line:column`.
#[derive(Clone, Debug, Default)]
pub struct FileTable {
    files: FxHashMap<FileId, String>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: FileId, path: impl Into<String>) {
        self.files.insert(id, path.into());
    }
}

impl LocationFormatter for FileTable {
    fn format_loc(&self, loc: SourceLoc) -> String {
        if loc.is_synthesized() {
            return "<synthesized>".to_owned();
        }
        let path = self.files.get(&loc.file).map_or("<unknown>", String::as_str);
        format!("{path}:{}:{}", loc.line, loc.column)
    }
}

/// Plain-text emitter.
pub struct TerminalEmitter<'a, W: Write> {
    writer: W,
    locations: &'a dyn LocationFormatter,
    emitted: usize,
}

impl<'a, W: Write> TerminalEmitter<'a, W> {
    pub fn new(writer: W, locations: &'a dyn LocationFormatter) -> Self {
        Self {
            writer,
            locations,
            emitted: 0,
        }
    }

    /// `error[CODE]: message` followed by the location line.
    pub fn emit(&mut self, error: &SemaError) {
        let _ = writeln!(self.writer, "error[{}]: {error}", error.error_code());
        if let Some(loc) = error.loc() {
            let _ = writeln!(self.writer, "  --> {}", self.locations.format_loc(loc));
        }
        self.emitted += 1;
    }

    pub fn emit_all(&mut self, errors: &[SemaError]) {
        for error in errors {
            self.emit(error);
        }
    }

    /// "aborting due to N previous error(s)"; silent when nothing was emitted.
    pub fn emit_summary(&mut self) {
        match self.emitted {
            0 => {}
            1 => {
                let _ = writeln!(self.writer, "error: aborting due to previous error");
            }
            n => {
                let _ = writeln!(self.writer, "error: aborting due to {n} previous errors");
            }
        }
    }

    pub fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests;
