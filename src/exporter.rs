use crate::tree::TaskNode;
use std::io::Write;

const INDENT: &str = "  ";

/// Write the task forest of one list as pretty-printed JSON.
pub fn write_json<W: Write>(writer: &mut W, tasks: &[TaskNode]) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, tasks).map_err(std::io::Error::from)?;
    writeln!(writer)
}

/// Read back what [`write_json`] produced.
pub fn parse_json(bytes: &[u8]) -> serde_json::Result<Vec<TaskNode>> {
    serde_json::from_slice(bytes)
}

/// Write one list as a Markdown checklist.
///
/// Top-level tasks that carry a status are finished and left out. Nested
/// tasks are always written; finished ones get a ticked box.
pub fn write_markdown<W: Write>(
    writer: &mut W,
    title: &str,
    tasks: &[TaskNode],
) -> std::io::Result<()> {
    writeln!(writer, "# {}", title)?;
    writeln!(writer)?;

    for node in tasks.iter().filter(|n| !n.task.is_done()) {
        write_item(writer, node, 0)?;
    }
    Ok(())
}

fn write_item<W: Write>(writer: &mut W, node: &TaskNode, depth: usize) -> std::io::Result<()> {
    let bullet_indent = INDENT.repeat(depth);
    let body_indent = INDENT.repeat(depth + 1);
    let mark = if depth > 0 && node.task.is_done() {
        'x'
    } else {
        ' '
    };

    let mut lines = node.task.title.lines();
    writeln!(
        writer,
        "{}- [{}] {}",
        bullet_indent,
        mark,
        lines.next().unwrap_or_default()
    )?;
    for line in lines {
        write_indented(writer, &body_indent, line)?;
    }

    if let Some(notes) = node.task.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let fence = fence_for(notes);
        writeln!(writer)?;
        writeln!(writer, "{}{}", body_indent, fence)?;
        for line in notes.lines() {
            write_indented(writer, &body_indent, line)?;
        }
        writeln!(writer, "{}{}", body_indent, fence)?;
        writeln!(writer)?;
    }

    for child in node.children() {
        write_item(writer, child, depth + 1)?;
    }
    Ok(())
}

fn write_indented<W: Write>(writer: &mut W, indent: &str, line: &str) -> std::io::Result<()> {
    if line.is_empty() {
        writeln!(writer)
    } else {
        writeln!(writer, "{}{}", indent, line)
    }
}

/// A backtick fence longer than any backtick run inside `text`.
fn fence_for(text: &str) -> String {
    let longest = text
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}
