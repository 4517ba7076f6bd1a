#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use citrus_ast::NodeId;
use pretty_assertions::assert_eq;

use super::*;

fn files() -> FileTable {
    let mut table = FileTable::new();
    table.add(FileId(1), "src/main.cit");
    table
}

#[test]
fn file_table_formats_positions() {
    let table = files();
    assert_eq!(
        table.format_loc(SourceLoc::new(FileId(1), 3, 7)),
        "src/main.cit:3:7"
    );
    assert_eq!(
        table.format_loc(SourceLoc::new(FileId(9), 1, 1)),
        "<unknown>:1:1"
    );
    assert_eq!(table.format_loc(SourceLoc::SYNTHESIZED), "<synthesized>");
}

#[test]
fn emitter_writes_code_message_and_location() {
    let table = files();
    let mut output = Vec::new();
    let mut emitter = TerminalEmitter::new(&mut output, &table);

    emitter.emit(&SemaError::code(
        NodeId::from_raw(0),
        SourceLoc::new(FileId(1), 2, 5),
        "can not dereference non-pointer type",
    ));
    emitter.flush();
    drop(emitter);

    let text = String::from_utf8(output).unwrap();
    assert_eq!(
        text,
        "error[E3001]: can not dereference non-pointer type\n  --> src/main.cit:2:5\n"
    );
}

#[test]
fn summary_counts_errors() {
    let table = files();
    let mut output = Vec::new();
    let mut emitter = TerminalEmitter::new(&mut output, &table);

    emitter.emit_all(&[SemaError::fatal("a"), SemaError::fatal("b")]);
    emitter.emit_summary();
    drop(emitter);

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("internal compiler error: a"));
    assert!(text.ends_with("error: aborting due to 2 previous errors\n"));
}

#[test]
fn summary_silent_without_errors() {
    let table = files();
    let mut output = Vec::new();
    let mut emitter = TerminalEmitter::new(&mut output, &table);
    emitter.emit_summary();
    drop(emitter);
    assert!(output.is_empty());
}
