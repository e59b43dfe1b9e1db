//! Pure text helpers for the output pane: truncation, wrapping and line numbers.

use unicode_width::UnicodeWidthChar;

const TAB_SIZE: usize = 4;

/// Width of the line-number gutter: "{:>6} " = 7 columns.
pub const LINE_NUMBER_WIDTH: usize = 7;

/// Display settings that decide how one raw line becomes screen rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub width: usize,
    pub wrap: bool,
    pub line_numbers: bool,
}

/// Expand tabs to spaces for proper rendering
pub fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }

    let mut result = String::with_capacity(line.len());
    let mut column = 0;

    for ch in line.chars() {
        if ch == '\t' {
            let spaces = TAB_SIZE - (column % TAB_SIZE);
            result.extend(std::iter::repeat(' ').take(spaces));
            column += spaces;
        } else {
            result.push(ch);
            column += 1;
        }
    }

    result
}

/// Cut `line` to at most `width` display columns.
pub fn truncate(line: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::with_capacity(line.len().min(width * 4));
    for ch in line.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}

/// Split `line` into rows of at most `width` display columns.
///
/// An empty line still yields one (empty) row so that blank records keep
/// their place on screen.
pub fn wrap(line: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }

    let mut rows = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for ch in line.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width && !current.is_empty() {
            rows.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(ch);
        used += w;
    }
    rows.push(current);
    rows
}

/// Format one raw line (1-based `number`) into screen rows.
pub fn format_line(raw: &str, number: usize, opts: FormatOptions) -> Vec<String> {
    let text = expand_tabs(raw);
    let gutter = if opts.line_numbers && opts.width > LINE_NUMBER_WIDTH {
        LINE_NUMBER_WIDTH
    } else {
        0
    };
    let body_width = opts.width.saturating_sub(gutter);

    let bodies = if opts.wrap {
        wrap(&text, body_width)
    } else {
        vec![truncate(&text, body_width)]
    };

    if gutter == 0 {
        return bodies;
    }

    bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| {
            if i == 0 {
                format!("{:>6} {}", number, body)
            } else {
                format!("{:6} {}", "", body)
            }
        })
        .collect()
}
