//! Synthetic RGBA test pattern with a bitmap text overlay.

/// 3x5 glyphs, one row per 3 bits, top row in the high bits.
fn glyph(c: char) -> u16 {
    match c.to_ascii_uppercase() {
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_111_001_111,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,
        '7' => 0b111_001_010_010_010,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,
        'A' => 0b010_101_111_101_101,
        'B' => 0b110_101_110_101_110,
        'C' => 0b011_100_100_100_011,
        'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_110_100_111,
        'F' => 0b111_100_110_100_100,
        'G' => 0b011_100_101_101_011,
        'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111,
        'J' => 0b001_001_001_101_010,
        'K' => 0b101_101_110_101_101,
        'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_111_101_101,
        'N' => 0b110_101_101_101_101,
        'O' => 0b010_101_101_101_010,
        'P' => 0b110_101_110_100_100,
        'Q' => 0b010_101_101_110_011,
        'R' => 0b110_101_110_101_101,
        'S' => 0b011_100_010_001_110,
        'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111,
        'V' => 0b101_101_101_101_010,
        'W' => 0b101_101_111_111_101,
        'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_010_010_010,
        'Z' => 0b111_001_010_100_111,
        '@' => 0b010_101_111_100_011,
        '(' => 0b001_010_010_010_001,
        ')' => 0b100_010_010_010_100,
        ',' => 0b000_000_000_010_100,
        '.' => 0b000_000_000_000_010,
        ':' => 0b000_010_000_010_000,
        '-' => 0b000_000_111_000_000,
        _ => 0,
    }
}

const GLYPH_W: usize = 3;
const GLYPH_H: usize = 5;
const SCALE: usize = 2;
const ADVANCE_X: usize = (GLYPH_W + 1) * SCALE;
const ADVANCE_Y: usize = (GLYPH_H + 2) * SCALE;
const MARGIN: usize = 4;

/// Generates a moving RGBA gradient and stamps overlay text on top.
///
/// `generate` renders from scratch every call, so overlay changes are always
/// reflected in the next frame.
pub struct ColorGenerator {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    overlay_text: String,
    overlay_color: [u8; 4],
    frame_index: u64,
}

impl ColorGenerator {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height * 4],
            overlay_text: String::new(),
            overlay_color: [255, 255, 255, 255],
            frame_index: 0,
        }
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.pixels = vec![0u8; width * height * 4];
        }
    }

    pub fn set_overlay_text(&mut self, text: impl Into<String>) {
        self.overlay_text = text.into();
    }

    pub fn set_overlay_color(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.overlay_color = [r, g, b, a];
    }

    pub fn overlay_text(&self) -> &str {
        &self.overlay_text
    }

    pub fn generate(&mut self) {
        let shift = self.frame_index as usize;
        let (w, h) = (self.width.max(1), self.height.max(1));
        for (i, px) in self.pixels.chunks_exact_mut(4).enumerate() {
            let (x, y) = (i % w, i / w);
            px[0] = ((x + shift) * 255 / w) as u8;
            px[1] = (y * 255 / h) as u8;
            px[2] = ((x + y + shift) % 256) as u8;
            px[3] = 255;
        }
        self.draw_overlay();
        self.frame_index += 1;
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn draw_overlay(&mut self) {
        let color = self.overlay_color;
        let lines: Vec<String> = self.overlay_text.lines().map(str::to_string).collect();
        for (row, line) in lines.iter().enumerate() {
            let origin_y = MARGIN + row * ADVANCE_Y;
            for (col, c) in line.chars().enumerate() {
                self.draw_glyph(MARGIN + col * ADVANCE_X, origin_y, glyph(c), color);
            }
        }
    }

    fn draw_glyph(&mut self, origin_x: usize, origin_y: usize, bits: u16, color: [u8; 4]) {
        for gy in 0..GLYPH_H {
            for gx in 0..GLYPH_W {
                let bit = (GLYPH_H - 1 - gy) * GLYPH_W + (GLYPH_W - 1 - gx);
                if bits >> bit & 1 == 0 {
                    continue;
                }
                for sy in 0..SCALE {
                    for sx in 0..SCALE {
                        let x = origin_x + gx * SCALE + sx;
                        let y = origin_y + gy * SCALE + sy;
                        if x < self.width && y < self.height {
                            let offset = (y * self.width + x) * 4;
                            self.pixels[offset..offset + 4].copy_from_slice(&color);
                        }
                    }
                }
            }
        }
    }
}
