//! Text measurement and rasterization.

use std::path::Path;

use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};

use crate::error::{MediaError, MediaResult};

/// Measures and draws single lines of text.
pub trait TextRenderer: Send + Sync {
    /// Advance width of `text` at `size` pixels.
    fn measure(&self, text: &str, size: f32) -> f32;

    /// Draw `text` with its left edge at `x` and its vertical middle at `center_y`.
    fn draw(&self, canvas: &mut RgbaImage, text: &str, size: f32, x: f32, center_y: f32, color: [u8; 4]);
}

/// [`TextRenderer`] backed by a TrueType/OpenType font.
pub struct FontdueText {
    font: Font,
}

impl std::fmt::Debug for FontdueText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontdueText")
            .field("name", &self.font.name())
            .finish()
    }
}

impl FontdueText {
    pub fn from_bytes(bytes: &[u8]) -> MediaResult<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| MediaError::FontLoad(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_file(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MediaError::AssetMissing(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl TextRenderer for FontdueText {
    fn measure(&self, text: &str, size: f32) -> f32 {
        let mut width = 0.0;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            if let Some(p) = prev {
                width += self.font.horizontal_kern(p, ch, size).unwrap_or(0.0);
            }
            width += self.font.metrics(ch, size).advance_width;
            prev = Some(ch);
        }
        width
    }

    fn draw(&self, canvas: &mut RgbaImage, text: &str, size: f32, x: f32, center_y: f32, color: [u8; 4]) {
        let (ascent, descent) = self
            .font
            .horizontal_line_metrics(size)
            .map(|m| (m.ascent, m.descent))
            .unwrap_or((size * 0.8, -size * 0.2));
        let baseline = center_y + (ascent + descent) / 2.0;

        let (cw, ch_) = (canvas.width() as i64, canvas.height() as i64);
        let mut pen = x;
        let mut prev: Option<char> = None;

        for ch in text.chars() {
            if let Some(p) = prev {
                pen += self.font.horizontal_kern(p, ch, size).unwrap_or(0.0);
            }
            let (metrics, bitmap) = self.font.rasterize(ch, size);
            let gx = (pen + metrics.xmin as f32).round() as i64;
            let gy = (baseline - metrics.ymin as f32 - metrics.height as f32).round() as i64;

            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let coverage = bitmap[row * metrics.width + col];
                    if coverage == 0 {
                        continue;
                    }
                    let (px, py) = (gx + col as i64, gy + row as i64);
                    if px < 0 || py < 0 || px >= cw || py >= ch_ {
                        continue;
                    }
                    blend_pixel(canvas.get_pixel_mut(px as u32, py as u32), color, coverage);
                }
            }

            pen += metrics.advance_width;
            prev = Some(ch);
        }
    }
}

/// Source-over blend of `color`, scaled by `coverage`, onto an opaque pixel.
pub fn blend_pixel(dst: &mut Rgba<u8>, color: [u8; 4], coverage: u8) {
    let alpha = color[3] as u32 * coverage as u32 / 255;
    if alpha == 0 {
        return;
    }
    for c in 0..3 {
        let src = color[c] as u32;
        let bg = dst.0[c] as u32;
        dst.0[c] = ((src * alpha + bg * (255 - alpha)) / 255) as u8;
    }
    dst.0[3] = 255;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_pixel() {
        let mut px = Rgba([0, 0, 0, 255]);
        blend_pixel(&mut px, [255, 255, 255, 255], 255);
        assert_eq!(px, Rgba([255, 255, 255, 255]));

        let mut px = Rgba([0, 0, 0, 255]);
        blend_pixel(&mut px, [200, 100, 0, 255], 0);
        assert_eq!(px, Rgba([0, 0, 0, 255]));

        let mut px = Rgba([0, 0, 0, 255]);
        blend_pixel(&mut px, [255, 255, 255, 128], 255);
        assert_eq!(px.0[0], 128);
    }

    #[test]
    fn test_invalid_font_bytes() {
        assert!(matches!(
            FontdueText::from_bytes(b"not a font"),
            Err(MediaError::FontLoad(_))
        ));
    }

    #[test]
    fn test_missing_font_file() {
        assert!(matches!(
            FontdueText::from_file("/nonexistent/font.ttf"),
            Err(MediaError::AssetMissing(_))
        ));
    }
}
