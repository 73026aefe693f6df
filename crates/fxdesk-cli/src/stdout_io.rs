use std::io::{self, Write};

/// Writes `text` as-is. A closed pipe (`fxdesk template sample x | head`) is not an error.
pub fn write_stdout_text(text: &str) -> io::Result<()> {
    write_to(&mut io::stdout().lock(), text, false)
}

pub fn write_stdout_line(text: &str) -> io::Result<()> {
    write_to(&mut io::stdout().lock(), text, true)
}

fn write_to<W: Write>(writer: &mut W, text: &str, newline: bool) -> io::Result<()> {
    let written = writer
        .write_all(text.as_bytes())
        .and_then(|()| if newline { writer.write_all(b"\n") } else { Ok(()) })
        .and_then(|()| writer.flush());
    ignore_broken_pipe(written)
}

fn ignore_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
