use font8x8::{ UnicodeFonts, BASIC_FONTS, LATIN_FONTS };

use crate::models::chat::{ Message, Sender };

pub const TYPING_INDICATOR: &str = "KIN-Bot está escribiendo...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

const PANE_BACKGROUND: Rgb = Rgb(0xf9, 0xfa, 0xfb);
const USER_BUBBLE: Rgb = Rgb(0x3b, 0x82, 0xf6);
const USER_TEXT: Rgb = Rgb(0xff, 0xff, 0xff);
const BOT_BUBBLE: Rgb = Rgb(0xdb, 0xea, 0xfe);
const BOT_TEXT: Rgb = Rgb(0x1e, 0x3a, 0x8a);
const TYPING_TEXT: Rgb = Rgb(0x6b, 0x72, 0x80);

const GLYPH_SIZE: u32 = 8;

/// 8-bit RGB raster, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[background.0, background.1, background.2]);
        }
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 3) as usize;
        Some(Rgb(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]))
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 3;
        self.pixels[i] = color.0;
        self.pixels[i + 1] = color.1;
        self.pixels[i + 2] = color.2;
    }

    fn fill_rounded_rect(&mut self, x: u32, y: u32, w: u32, h: u32, radius: u32, color: Rgb) {
        let r = radius.min(w / 2).min(h / 2) as f32;
        for dy in 0..h {
            let from_edge = dy.min(h - 1 - dy) as f32;
            let inset = if from_edge < r {
                let d = r - from_edge - 0.5;
                (r - (r * r - d * d).max(0.0).sqrt()).round() as u32
            } else {
                0
            };
            for dx in inset..w.saturating_sub(inset) {
                self.put((x + dx) as i64, (y + dy) as i64, color);
            }
        }
    }

    fn draw_glyph(&mut self, x: u32, y: u32, ch: char, color: Rgb, scale: u32, style: TextStyle) {
        let rows = glyph(ch);
        for (row, bits) in rows.iter().enumerate() {
            // Shear the upper rows right for the italic indicator line.
            let slant = if style.italic { ((GLYPH_SIZE - 1 - row as u32) * scale / 4) as i64 } else { 0 };
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let px = (x + col * scale + sx) as i64 + slant;
                        let py = (y + row as u32 * scale + sy) as i64;
                        self.put(px, py, color);
                        if style.bold {
                            self.put(px + 1, py, color);
                        }
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TextStyle {
    bold: bool,
    italic: bool,
}

fn normalize(ch: char) -> char {
    match ch {
        '“' | '”' | '«' | '»' => '"',
        '‘' | '’' => '\'',
        '–' | '—' => '-',
        '\t' => ' ',
        other => other,
    }
}

fn glyph(ch: char) -> [u8; 8] {
    let ch = normalize(ch);
    BASIC_FONTS.get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Greedy word wrap to `columns` characters. Words longer than a line are
/// split; explicit newlines are kept.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > columns {
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                let rest = word.split_off(columns);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if line_len == 0 { word.len() } else { line_len + 1 + word.len() };
            if needed > columns {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line_len += word.len();
            line.extend(word);
        }
        lines.push(line);
    }

    lines
}

#[derive(Debug, Clone, Copy)]
pub struct PaneStyle {
    pub width: u32,
    pub padding: u32,
    pub scale: u32,
    pub line_spacing: u32,
    pub bubble_padding_x: u32,
    pub bubble_padding_y: u32,
    pub bubble_gap: u32,
    pub corner_radius: u32,
    /// Share of the inner pane width a bubble may take, in percent.
    pub max_bubble_percent: u32,
}

impl Default for PaneStyle {
    fn default() -> Self {
        Self {
            width: 672,
            padding: 16,
            scale: 2,
            line_spacing: 4,
            bubble_padding_x: 16,
            bubble_padding_y: 8,
            bubble_gap: 8,
            corner_radius: 8,
            max_bubble_percent: 90,
        }
    }
}

struct Bubble {
    sender: Sender,
    lines: Vec<String>,
    width: u32,
    height: u32,
}

/// Draws the conversation pane: bot bubbles on the left, the student's on
/// the right, optional typing line at the bottom.
#[derive(Debug, Clone, Default)]
pub struct TranscriptRenderer {
    style: PaneStyle,
}

impl TranscriptRenderer {
    pub fn new(style: PaneStyle) -> Self {
        Self { style }
    }

    fn cell(&self) -> u32 {
        GLYPH_SIZE * self.style.scale
    }

    fn line_height(&self) -> u32 {
        self.cell() + self.style.line_spacing
    }

    fn columns(&self) -> usize {
        let s = &self.style;
        let inner = s.width.saturating_sub(2 * s.padding);
        let bubble = inner * s.max_bubble_percent / 100;
        (bubble.saturating_sub(2 * s.bubble_padding_x) / self.cell()).max(1) as usize
    }

    fn layout(&self, message: &Message) -> Bubble {
        let s = &self.style;
        let labelled = format!("{}: {}", message.sender().display_name(), message.text());
        let lines = wrap_text(&labelled, self.columns());
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
        Bubble {
            sender: message.sender(),
            width: longest * self.cell() + 2 * s.bubble_padding_x,
            height: lines.len() as u32 * self.line_height() - s.line_spacing + 2 * s.bubble_padding_y,
            lines,
        }
    }

    pub fn render(&self, messages: &[Message], typing: bool) -> RasterImage {
        let s = self.style;
        let bubbles: Vec<Bubble> = messages.iter().map(|m| self.layout(m)).collect();

        let mut height = 2 * s.padding;
        height += bubbles.iter().map(|b| b.height + s.bubble_gap).sum::<u32>();
        if typing {
            height += self.line_height();
        }

        let mut image = RasterImage::new(s.width, height, PANE_BACKGROUND);
        let mut y = s.padding;

        for bubble in &bubbles {
            let (x, fill, ink) = match bubble.sender {
                Sender::User => (s.width - s.padding - bubble.width, USER_BUBBLE, USER_TEXT),
                Sender::Bot => (s.padding, BOT_BUBBLE, BOT_TEXT),
            };
            image.fill_rounded_rect(x, y, bubble.width, bubble.height, s.corner_radius, fill);

            let label_len = bubble.sender.display_name().chars().count() + 1;
            let mut ty = y + s.bubble_padding_y;
            for (i, line) in bubble.lines.iter().enumerate() {
                let mut tx = x + s.bubble_padding_x;
                for (col, ch) in line.chars().enumerate() {
                    let style = TextStyle { bold: i == 0 && col < label_len, italic: false };
                    image.draw_glyph(tx, ty, ch, ink, s.scale, style);
                    tx += self.cell();
                }
                ty += self.line_height();
            }
            y += bubble.height + s.bubble_gap;
        }

        if typing {
            let mut tx = s.padding;
            for ch in TYPING_INDICATOR.chars() {
                let style = TextStyle { bold: false, italic: true };
                image.draw_glyph(tx, y, ch, TYPING_TEXT, s.scale, style);
                tx += self.cell();
            }
        }

        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_respects_columns_and_keeps_words() {
        let lines = wrap_text("Me duele la rodilla cuando subo escaleras", 12);
        assert_eq!(lines, vec!["Me duele la", "rodilla", "cuando subo", "escaleras"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 12));
    }

    #[test]
    fn wrap_splits_long_words_and_keeps_newlines() {
        let lines = wrap_text("abcdefghij\nok", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "ok"]);
    }

    #[test]
    fn spanish_characters_have_glyphs() {
        for ch in ['á', 'é', 'í', 'ó', 'ú', 'ñ', '¿', '¡'] {
            assert_ne!(glyph(ch), [0; 8], "no glyph for {}", ch);
        }
    }

    #[test]
    fn bubbles_sit_on_their_side() {
        let renderer = TranscriptRenderer::default();
        let style = PaneStyle::default();
        let messages = vec![Message::bot("Hola."), Message::user("Hola.")];

        let image = renderer.render(&messages, false);

        assert_eq!(image.width(), style.width);
        let bot_row = style.padding + style.bubble_padding_y / 2;
        assert_eq!(image.pixel(style.padding + style.corner_radius, bot_row), Some(BOT_BUBBLE));
        assert_eq!(image.pixel(style.width - style.padding - style.corner_radius, bot_row), Some(PANE_BACKGROUND));

        let bot_height = renderer.layout(&messages[0]).height;
        let user_row = style.padding + bot_height + style.bubble_gap + style.bubble_padding_y / 2;
        assert_eq!(image.pixel(style.width - style.padding - style.corner_radius, user_row), Some(USER_BUBBLE));
        assert_eq!(image.pixel(style.padding + style.corner_radius, user_row), Some(PANE_BACKGROUND));
    }

    #[test]
    fn typing_line_adds_height() {
        let renderer = TranscriptRenderer::default();
        let messages = vec![Message::bot("Hola.")];
        let idle = renderer.render(&messages, false);
        let busy = renderer.render(&messages, true);
        assert_eq!(busy.height(), idle.height() + renderer.line_height());
    }

    #[test]
    fn empty_pane_still_has_size() {
        let image = TranscriptRenderer::default().render(&[], false);
        assert!(image.width() > 0 && image.height() > 0);
        assert_eq!(image.pixels().len(), (image.width() * image.height() * 3) as usize);
    }
}
