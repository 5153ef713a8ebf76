const LINE_COMMENT_MARKER: &str = "--";
const STATEMENT_TERMINATOR: char = ';';

/// Splits a schema script into single-line statements.
///
/// Line comments and tab characters are removed and every statement is
/// collapsed onto one line. The splitter does not track string literals, so a
/// `;` or `--` inside a quoted value splits or truncates that statement.
#[must_use]
pub fn split_statements(script: &str) -> Vec<String> {
    let collapsed = script
        .lines()
        .map(strip_line_comment)
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\t', "");

    collapsed
        .split(STATEMENT_TERMINATOR)
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_line_comment(line: &str) -> &str {
    match line.find(LINE_COMMENT_MARKER) {
        Some(index) => &line[..index],
        None => line,
    }
}
