use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_display_width).sum()
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 1 {
        return "\u{2026}".to_string();
    }
    let budget = max_cells - 1; // reserve 1 cell for '…'
    let mut width = 0;
    let mut result = String::new();
    for grapheme in s.graphemes(true) {
        let gw = grapheme_display_width(grapheme);
        if width + gw > budget {
            break;
        }
        width += gw;
        result.push_str(grapheme);
    }
    result.push('\u{2026}');
    result
}

/// Pad with spaces on the right to `cells` terminal cells.
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let width = display_width(s);
    if width >= cells {
        return s.to_string();
    }
    format!("{}{}", s, " ".repeat(cells - width))
}

/// Largest char boundary at or before `byte_offset`, clamped to the string.
pub fn floor_char_boundary(s: &str, byte_offset: usize) -> usize {
    if byte_offset >= s.len() {
        return s.len();
    }
    let mut i = byte_offset;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Start of the whitespace-delimited word that ends at `byte_offset`.
/// Returns `byte_offset` itself when the preceding char is whitespace.
pub fn word_start(s: &str, byte_offset: usize) -> usize {
    let end = floor_char_boundary(s, byte_offset);
    s[..end]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0)
}

fn grapheme_display_width(g: &str) -> usize {
    if g == "\t" {
        return 4;
    }
    UnicodeWidthStr::width(g)
}
