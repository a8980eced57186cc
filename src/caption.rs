//! Caption layout for the encoder's drawtext filter.
//!
//! drawtext does not wrap text on its own, so captions are pre-wrapped to
//! roughly 90% of the frame width using a conservative estimate of the
//! average glyph advance.

/// Fraction of the frame width a caption line may occupy.
const LINE_WIDTH_FRACTION: f64 = 0.9;

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE_FRACTION: f64 = 0.55;

/// Greedy word wrap: each line holds as many whitespace-separated words as
/// fit the column budget for `frame_width`/`font_size`. A word longer than a
/// full line stays intact on its own line.
pub fn wrap_caption(text: &str, frame_width: u32, font_size: u32) -> String {
    let budget = max_chars_per_line(frame_width, font_size);

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;
    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_chars = word_chars;
        } else if current_chars + 1 + word_chars <= budget {
            current.push(' ');
            current.push_str(word);
            current_chars += 1 + word_chars;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_chars = word_chars;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

pub(crate) fn max_chars_per_line(frame_width: u32, font_size: u32) -> usize {
    let line_px = f64::from(frame_width) * LINE_WIDTH_FRACTION;
    let advance = f64::from(font_size) * GLYPH_ADVANCE_FRACTION;
    ((line_px / advance) as usize).max(8)
}

/// Escape text for use inside a single-quoted drawtext `text=` value.
pub(crate) fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            // Close the quoted run, emit an escaped quote, reopen it.
            '\'' => out.push_str("'\\''"),
            ':' => out.push_str("\\:"),
            ',' => out.push_str("\\,"),
            '%' => out.push_str("\\%"),
            _ => out.push(c),
        }
    }
    out
}
