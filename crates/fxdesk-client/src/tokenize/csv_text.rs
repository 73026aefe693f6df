use crate::dates::normalize_cell;
use crate::tokenize::Grid;

/// Splits CSV text into a grid of cells.
///
/// Lines that are blank after trimming are dropped, so grid indices are
/// logical rows rather than physical line numbers. Every line is scanned on
/// its own; a quote left open never swallows the following lines.
pub fn parse(text: &str) -> Grid {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

/// Character scan with a quoted flag: every `"` flips it and commas split
/// fields only outside quotes. Inside quotes a doubled `""` is one literal quote.
fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => {
                quoted = !quoted;
                current.push(ch);
            }
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);

    fields
        .iter()
        .map(|field| normalize_cell(&clean_field(field)))
        .collect()
}

fn clean_field(field: &str) -> String {
    let trimmed = field.trim();
    match trimmed
        .strip_prefix('"')
        .and_then(|value| value.strip_suffix('"'))
    {
        Some(inner) => inner.to_string(),
        None => trimmed.to_string(),
    }
}
