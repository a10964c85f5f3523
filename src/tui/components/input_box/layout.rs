//! Row layout for the InputBox draft.
//!
//! Each hard line is wrapped with `textwrap` and the wrapped pieces are
//! mapped back to byte ranges of the draft, so drawing and cursor arithmetic
//! share one layout. Hard newlines belong to no row. The spaces textwrap
//! drops at a soft break sit between two rows and count toward the first.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Border (2) + padding (2) consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible rows before the box scrolls internally
pub(super) const MAX_VISIBLE_LINES: u16 = 5;
/// Offset from the area edge to the first text column (border + padding)
pub(super) const TEXT_OFFSET_X: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Row {
    pub start: usize,
    pub end: usize,
}

pub(super) fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Build textwrap options configured for the input box inner width.
pub(super) fn wrap_options(width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(usize::from(width.max(1)))
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

/// Break `text` into rows no wider than `width` columns. Always returns at
/// least one row.
pub(super) fn rows(text: &str, width: u16) -> Vec<Row> {
    let options = wrap_options(width);
    let mut rows = Vec::new();
    let mut line_start = 0;
    for line in text.split('\n') {
        let mut offset = 0;
        for piece in textwrap::wrap(line, &options) {
            // Pieces come back in order; only dropped spaces lie between them
            let start = if piece.is_empty() {
                offset
            } else {
                line[offset..].find(piece.as_ref()).map_or(offset, |i| offset + i)
            };
            let end = start + piece.len();
            rows.push(Row {
                start: line_start + start,
                end: line_start + end,
            });
            offset = end;
        }
        // Trailing spaces are trimmed by textwrap but the cursor can sit on them
        if let Some(last) = rows.last_mut()
            && last.start >= line_start
        {
            last.end = line_start + line.len();
        }
        if line.is_empty() && rows.last().is_none_or(|r| r.start < line_start) {
            rows.push(Row {
                start: line_start,
                end: line_start,
            });
        }
        line_start += line.len() + 1;
    }
    rows
}

/// Row holding byte offset `pos`. At a soft wrap the cursor belongs to the
/// row that starts there.
pub(super) fn row_of(rows: &[Row], pos: usize) -> usize {
    rows.iter().rposition(|r| r.start <= pos).unwrap_or(0)
}

/// (row, display column) of byte offset `pos`.
pub(super) fn cursor_position(text: &str, rows: &[Row], pos: usize) -> (usize, u16) {
    let row = row_of(rows, pos);
    let start = rows.get(row).map_or(0, |r| r.start);
    let col = text[start..pos].width();
    (row, u16::try_from(col).unwrap_or(u16::MAX))
}

/// Byte offset in `row` at display column `col`, or as close as the row allows.
fn offset_at_column(text: &str, rows: &[Row], row: usize, col: usize) -> usize {
    let Row { start, end } = rows[row];
    let mut used = 0;
    for (i, c) in text[start..end].char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > col {
            return start + i;
        }
        used += w;
    }
    // The end of a soft-wrapped row is the start of the next one; stay on
    // this row by stopping before its last character.
    let soft_wrapped = rows.get(row + 1).is_some_and(|next| next.start == end);
    if soft_wrapped && end > start {
        prev_char_boundary(text, end)
    } else {
        end
    }
}

/// Move `pos` one row up (`-1`) or down (`1`) keeping the display column.
/// Returns `None` at the first/last row.
pub(super) fn move_vertically(text: &str, pos: usize, direction: i8, width: u16) -> Option<usize> {
    let rows = rows(text, width);
    let (row, col) = cursor_position(text, &rows, pos);
    let target = if direction < 0 {
        row.checked_sub(1)?
    } else {
        Some(row + 1).filter(|&r| r < rows.len())?
    };
    Some(offset_at_column(text, &rows, target, usize::from(col)))
}

pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(text.len())
}
