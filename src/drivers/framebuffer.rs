//! RGB565 framebuffer and text console.
//!
//! [`Framebuffer`] is an in-memory `DrawTarget` in landscape orientation.
//! [`TextConsole`] layers a cursor and ProFont text on top of it and
//! implements [`DisplayPort`]; `flush()` pushes the whole frame to a
//! [`Panel`] (the SPI TFT on hardware, a recorder in tests).

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Dimensions, OriginDimensions, Point, Size},
    mono_font::{MonoTextStyle, MonoTextStyleBuilder},
    pixelcolor::{raw::{RawData, RawU16}, Rgb565, RgbColor},
    primitives::Rectangle,
    text::{Baseline, Text},
    Drawable, Pixel,
};
use log::warn;

use crate::app::ports::DisplayPort;

/// Something that can show a full RGB565 frame.
pub trait Panel {
    /// `pixels` is row-major, `width * height` long, native-endian RGB565.
    fn draw(&mut self, width: u16, height: u16, pixels: &[u16]);
}

// ───────────────────────────────────────────────────────────────
// Framebuffer
// ───────────────────────────────────────────────────────────────

pub struct Framebuffer {
    buf: Vec<u16>,
    width: u32,
    height: u32,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buf: vec![0; (width * height) as usize],
            width,
            height,
        }
    }

    pub fn clear_color(&mut self, color: Rgb565) {
        let raw = RawU16::from(color).into_inner();
        self.buf.fill(raw);
    }

    pub fn pixels(&self) -> &[u16] {
        &self.buf
    }

    /// Raw pixel at (x, y); `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u16> {
        (x < self.width && y < self.height).then(|| self.buf[(y * self.width + x) as usize])
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (w, h) = (self.width, self.height);
        for Pixel(point, color) in pixels {
            let (x, y) = (point.x, point.y);
            if x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h {
                self.buf[(y as u32 * w + x as u32) as usize] = RawU16::from(color).into_inner();
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let raw = RawU16::from(color).into_inner();
        let area = area.intersection(&self.bounding_box());
        let w = self.width;
        for y in area.rows() {
            let row_start = (y as u32 * w) as usize;
            for x in area.columns() {
                self.buf[row_start + x as usize] = raw;
            }
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Text console
// ───────────────────────────────────────────────────────────────

/// Cursor-addressed text on a framebuffer, flushed to a [`Panel`].
pub struct TextConsole<P: Panel> {
    fb: Framebuffer,
    panel: P,
    cursor: Point,
    style: MonoTextStyle<'static, Rgb565>,
}

impl<P: Panel> TextConsole<P> {
    pub fn new(panel: P, width: u16, height: u16) -> Self {
        let style = MonoTextStyleBuilder::new()
            .font(&profont::PROFONT_12_POINT)
            .text_color(Rgb565::WHITE)
            .background_color(Rgb565::BLACK)
            .build();
        Self {
            fb: Framebuffer::new(u32::from(width), u32::from(height)),
            panel,
            cursor: Point::zero(),
            style,
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.fb
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }
}

impl<P: Panel> DisplayPort for TextConsole<P> {
    fn clear(&mut self, color: Rgb565) {
        self.fb.clear_color(color);
        // Text background follows the screen so glyph cells do not show.
        self.style.background_color = Some(color);
        self.cursor = Point::zero();
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = Point::new(x, y);
    }

    fn print(&mut self, text: &str) {
        match Text::with_baseline(text, self.cursor, self.style, Baseline::Top).draw(&mut self.fb) {
            Ok(next) => self.cursor = next,
            Err(e) => match e {},
        }
    }

    fn flush(&mut self) {
        let size = self.fb.size();
        let (Ok(w), Ok(h)) = (u16::try_from(size.width), u16::try_from(size.height)) else {
            warn!("framebuffer: {}x{} exceeds panel range", size.width, size.height);
            return;
        };
        self.panel.draw(w, h, self.fb.pixels());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        frames: usize,
        last_len: usize,
    }

    impl Panel for Recorder {
        fn draw(&mut self, width: u16, height: u16, pixels: &[u16]) {
            assert_eq!(pixels.len(), usize::from(width) * usize::from(height));
            self.frames += 1;
            self.last_len = pixels.len();
        }
    }

    #[test]
    fn clear_fills_every_pixel() {
        let mut c = TextConsole::new(Recorder::default(), 32, 16);
        c.clear(Rgb565::RED);
        let red = RawU16::from(Rgb565::RED).into_inner();
        assert!(c.framebuffer().pixels().iter().all(|&p| p == red));
    }

    #[test]
    fn print_draws_white_glyphs_and_advances_cursor() {
        let mut c = TextConsole::new(Recorder::default(), 64, 32);
        c.clear(Rgb565::BLACK);
        c.set_cursor(2, 2);
        c.print("H");
        let white = RawU16::from(Rgb565::WHITE).into_inner();
        assert!(c.framebuffer().pixels().iter().any(|&p| p == white));
        assert!(c.cursor().x > 2);
    }

    #[test]
    fn flush_sends_full_frame() {
        let mut c = TextConsole::new(Recorder::default(), 20, 10);
        c.flush();
        assert_eq!(c.panel().frames, 1);
        assert_eq!(c.panel().last_len, 200);
    }

    #[test]
    fn out_of_bounds_pixels_are_dropped() {
        let mut fb = Framebuffer::new(4, 4);
        let _ = fb.draw_iter([Pixel(Point::new(-1, 0), Rgb565::WHITE), Pixel(Point::new(9, 9), Rgb565::WHITE)]);
        assert!(fb.pixels().iter().all(|&p| p == 0));
        assert_eq!(fb.pixel(4, 0), None);
    }
}
