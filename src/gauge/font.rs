//! Minimal 5×7 bitmap font for gauge labels.
//!
//! Covers the characters the gauges ever print: digits, sign, dollar and
//! decimal point. Anything else renders as a blank cell of the same width.

/// Glyph width in cells.
pub const GLYPH_COLS: usize = 5;

/// Glyph height in cells.
pub const GLYPH_ROWS: usize = 7;

/// Blank cells between adjacent glyphs.
const SPACING_COLS: usize = 1;

/// Fraction of the point size covered by a glyph's height.
const CAP_HEIGHT: f64 = 0.72;

type Glyph = [u8; GLYPH_ROWS];

const BLANK: Glyph = [0; GLYPH_ROWS];

// Each row is 5 bits, most significant bit on the left.
fn glyph(c: char) -> Glyph {
    match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '$' => [0x04, 0x0F, 0x14, 0x0E, 0x05, 0x1E, 0x04],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        _ => BLANK,
    }
}

/// Side length of one font cell at `size` points.
pub fn cell_size(size: f64) -> f64 {
    size * CAP_HEIGHT / GLYPH_ROWS as f64
}

/// Rendered width of `text` at `size` points.
pub fn text_width(text: &str, size: f64) -> f64 {
    let n = text.chars().count();
    if n == 0 {
        return 0.0;
    }
    let cols = n * GLYPH_COLS + (n - 1) * SPACING_COLS;
    cols as f64 * cell_size(size)
}

/// Rendered height of any non-empty text at `size` points.
pub fn text_height(size: f64) -> f64 {
    GLYPH_ROWS as f64 * cell_size(size)
}

/// Whether the point `(x, y)`, relative to the top-left corner of the text
/// box, falls on a lit cell of `text` rendered at `size`.
pub fn covers(text: &str, size: f64, x: f64, y: f64) -> bool {
    let cell = cell_size(size);
    if cell <= 0.0 || x < 0.0 || y < 0.0 {
        return false;
    }
    let col = (x / cell) as usize;
    let row = (y / cell) as usize;
    if row >= GLYPH_ROWS {
        return false;
    }

    let stride = GLYPH_COLS + SPACING_COLS;
    let index = col / stride;
    let col_in_glyph = col % stride;
    if col_in_glyph >= GLYPH_COLS {
        return false;
    }

    match text.chars().nth(index) {
        Some(c) => glyph(c)[row] & (0x10 >> col_in_glyph) != 0,
        None => false,
    }
}
