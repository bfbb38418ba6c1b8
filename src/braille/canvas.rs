/// First code point of the Unicode Braille Patterns block (no dots)
const BLANK: char = '\u{2800}';

/// Dot bit for pixel `(x, y)` within its cell:
/// ```text
/// (0,0) (1,0)   bits: 0x01 0x08
/// (0,1) (1,1)   bits: 0x02 0x10
/// (0,2) (1,2)   bits: 0x04 0x20
/// (0,3) (1,3)   bits: 0x40 0x80
/// ```
#[inline(always)]
fn dot_bit(x: usize, y: usize) -> u8 {
    const BITS: [[u8; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];
    BITS[y % 4][x % 2]
}

#[inline(always)]
fn glyph(bits: u8) -> char {
    char::from_u32(BLANK as u32 + bits as u32).unwrap_or(' ')
}

/// Monochrome Braille raster. Each character cell holds a 2x4 block of
/// pixels, so a `cols × rows` canvas is `2·cols × 4·rows` pixels.
pub struct BrailleCanvas {
    cols: usize,
    rows: usize,
    /// Dot bits per cell, row-major
    cells: Vec<u8>,
}

impl BrailleCanvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![0; cols * rows],
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> Option<usize> {
        let (cx, cy) = (x / 2, y / 4);
        (cx < self.cols && cy < self.rows).then(|| cy * self.cols + cx)
    }

    /// Set a pixel; anything off the canvas is ignored.
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] |= dot_bit(x, y);
        }
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.index(x, y)
            .is_some_and(|i| self.cells[i] & dot_bit(x, y) != 0)
    }

    /// Whether no dot is set anywhere
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&bits| bits == 0)
    }

    /// Characters of one row; empty past the last row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = char> + '_ {
        let cells: &[u8] = if row < self.rows {
            &self.cells[row * self.cols..(row + 1) * self.cols]
        } else {
            &[]
        };
        cells.iter().map(|&bits| glyph(bits))
    }

    /// Non-blank cells as `(col, row, glyph)`
    pub fn glyphs(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, bits)| **bits != 0)
            .map(|(i, &bits)| (i % self.cols, i / self.cols, glyph(bits)))
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.rows)
            .map(|r| self.row(r).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
