//! Text helpers shared by the composer: blank-aware field access, bullet splitting,
//! and greedy word wrap.

use crate::layout::font_metrics::FontMetricTable;

/// Returns the trimmed value when it has visible content. Every optional field the
/// renderer reads goes through here, so blank values are omitted rather than drawn.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Splits a description into bullet points at `'\n'`, trimming each segment and
/// dropping blank ones. Text without a newline yields a single bullet.
pub fn bullet_points(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(str::trim)
        .filter(|point| !point.is_empty())
        .collect()
}

/// Greedy word wrap at `max_width` points. Returns one string per printed line.
///
/// Whitespace runs collapse to single spaces. A word wider than the line is broken
/// at character boundaries so no line ever overflows. An empty string returns no lines.
pub fn wrap_text(text: &str, metrics: &FontMetricTable, size: f32, max_width: f32) -> Vec<String> {
    let space_w = metrics.space_width * size;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in text.split_whitespace() {
        let word_w = metrics.width_pt(word, size);

        if word_w > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut pieces = break_word(word, metrics, size, max_width);
            // The last piece stays open so the next word can join it.
            if let Some(last) = pieces.pop() {
                lines.extend(pieces);
                current_width = metrics.width_pt(&last, size);
                current = last;
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_width = word_w;
        } else if current_width + space_w + word_w <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space_w + word_w;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_w;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Splits one over-long word into pieces that each fit `max_width`
/// (at least one character per piece).
fn break_word(word: &str, metrics: &FontMetricTable, size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0_f32;

    for c in word.chars() {
        let w = metrics.char_width(c) * size;
        if !piece.is_empty() && width + w > max_width {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}
