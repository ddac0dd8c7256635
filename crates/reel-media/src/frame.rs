//! Still-frame composition.
//!
//! A [`FrameComposer`] is built once per job (layout, font and banner artwork
//! loaded up front) and then renders one PNG per composed segment. Rendering
//! is CPU-bound and synchronous; async callers should run it on the blocking
//! pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use reel_models::encoding::BRAND_COLOR_RGB;
use reel_models::Orientation;

use crate::assets::AssetCatalog;
use crate::error::MediaResult;
use crate::layout::{
    contain_fit, line_centers, wrap_words, BannerSlot, FrameLayout, ImageFit, PortraitStyle, Rect,
    TextBlock, WrappedText,
};
use crate::text::{blend_pixel, TextRenderer};

/// Inputs for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameSpec<'a> {
    /// Picture for the image region; `None` leaves brand background
    pub image: Option<&'a Path>,
    pub caption: Option<&'a str>,
}

/// A rendered frame on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedFrame {
    pub path: PathBuf,
    /// Caption words cut by the line cap
    pub dropped_words: Vec<String>,
}

/// Renders captioned frames for one layout.
pub struct FrameComposer {
    layout: FrameLayout,
    text: Arc<dyn TextRenderer>,
    banner: Option<RgbaImage>,
    watermark_text: Option<String>,
}

impl std::fmt::Debug for FrameComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameComposer")
            .field("layout", &self.layout)
            .field("has_banner", &self.banner.is_some())
            .field("watermark_text", &self.watermark_text)
            .finish()
    }
}

impl FrameComposer {
    pub fn new(layout: FrameLayout, text: Arc<dyn TextRenderer>) -> Self {
        Self {
            layout,
            text,
            banner: None,
            watermark_text: None,
        }
    }

    /// Build the composer for a job's orientation, loading artwork from `assets`.
    pub fn for_orientation(
        orientation: Orientation,
        portrait: PortraitStyle,
        assets: &AssetCatalog,
        text: Arc<dyn TextRenderer>,
        watermark_text: Option<String>,
    ) -> MediaResult<Self> {
        let layout = FrameLayout::for_orientation(orientation, portrait);

        let banner_path = match layout.banner {
            Some((BannerSlot::Bottom, _)) => assets.bottom_banner(),
            Some((BannerSlot::Side, _)) => assets.side_banner(),
            Some((BannerSlot::Logo, _)) => assets.logo(),
            None => None,
        };
        let banner = banner_path
            .map(|path| image::open(&path).map(|img| img.to_rgba8()))
            .transpose()?;

        // The logo box keeps the source aspect ratio.
        let layout = match (&banner, layout.banner) {
            (Some(img), Some((BannerSlot::Logo, _))) => {
                FrameLayout::portrait_full_bleed(layout.canvas, Some(img.dimensions()))
            }
            _ => layout,
        };

        let mut composer = Self::new(layout, text);
        composer.banner = banner;
        if composer.layout.watermark.is_some() {
            composer.watermark_text = watermark_text.filter(|t| !t.trim().is_empty());
        }
        Ok(composer)
    }

    /// Use in-memory artwork for the banner slot.
    pub fn with_banner_image(mut self, banner: RgbaImage) -> Self {
        self.banner = Some(banner);
        self
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Render a frame into memory.
    pub fn render(&self, spec: &FrameSpec<'_>) -> MediaResult<(RgbaImage, WrappedText)> {
        let canvas_size = self.layout.canvas;
        let [r, g, b] = BRAND_COLOR_RGB;
        let mut canvas = RgbaImage::from_pixel(canvas_size.width, canvas_size.height, Rgba([r, g, b, 255]));

        if let Some(path) = spec.image {
            let picture = image::open(path)?.to_rgba8();
            self.place_picture(&mut canvas, &picture);
        }

        if let (Some(banner), Some((_, rect))) = (&self.banner, self.layout.banner) {
            let scaled = imageops::resize(banner, rect.width, rect.height, FilterType::Triangle);
            imageops::overlay(&mut canvas, &scaled, rect.x as i64, rect.y as i64);
        }

        let wrapped = match self.layout.caption {
            Some(block) => self.draw_caption(&mut canvas, &block, spec.caption.unwrap_or("")),
            None => WrappedText::default(),
        };

        if let (Some(line), Some(text)) = (self.layout.watermark, &self.watermark_text) {
            self.text
                .draw(&mut canvas, text, line.font_size, line.x, line.center_y, line.color);
        }

        Ok((canvas, wrapped))
    }

    /// Render a frame and write it as PNG.
    pub fn compose(&self, spec: &FrameSpec<'_>, output: &Path) -> MediaResult<ComposedFrame> {
        let (canvas, wrapped) = self.render(spec)?;

        if !wrapped.dropped.is_empty() {
            warn!(
                output = %output.display(),
                dropped = wrapped.dropped_count(),
                "Caption exceeds line limit, dropping words"
            );
        }

        canvas.save(output)?;
        debug!("Composed frame {}", output.display());

        Ok(ComposedFrame {
            path: output.to_path_buf(),
            dropped_words: wrapped.dropped,
        })
    }

    fn place_picture(&self, canvas: &mut RgbaImage, picture: &RgbaImage) {
        let region = self.layout.image_region;
        let target = match self.layout.image_fit {
            ImageFit::Stretch => region,
            ImageFit::Contain => contain_fit(picture.width(), picture.height(), region),
        };
        let scaled = imageops::resize(picture, target.width, target.height, FilterType::Triangle);
        imageops::overlay(canvas, &scaled, target.x as i64, target.y as i64);
    }

    fn draw_caption(&self, canvas: &mut RgbaImage, block: &TextBlock, caption: &str) -> WrappedText {
        if let Some(fill) = block.fill {
            fill_rect(canvas, block.region, fill);
        }

        let size = block.font_size;
        let wrapped = wrap_words(caption, block.max_line_width, block.max_lines, |s| {
            self.text.measure(s, size)
        });

        let centers = line_centers(block.region, wrapped.lines.len(), block.line_pitch);
        for (line, center_y) in wrapped.lines.iter().zip(centers) {
            let width = self.text.measure(line, size);
            let x = block.region.center_x() - width / 2.0;
            self.text.draw(canvas, line, size, x, center_y, block.color);
        }

        wrapped
    }
}

/// Blend a translucent fill over a rectangle.
pub fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: [u8; 4]) {
    let x_end = (rect.x + rect.width).min(canvas.width());
    let y_end = (rect.y + rect.height).min(canvas.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            blend_pixel(canvas.get_pixel_mut(x, y), color, 255);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::CAPTION_BAND_RGBA;
    use reel_models::Resolution;
    use tempfile::TempDir;

    /// Fixed-advance renderer that paints a solid box per line.
    struct BoxText;

    impl TextRenderer for BoxText {
        fn measure(&self, text: &str, size: f32) -> f32 {
            text.chars().count() as f32 * size * 0.5
        }

        fn draw(&self, canvas: &mut RgbaImage, text: &str, size: f32, x: f32, center_y: f32, color: [u8; 4]) {
            let rect = Rect::new(
                x.max(0.0) as u32,
                (center_y - size / 4.0).max(0.0) as u32,
                self.measure(text, size) as u32,
                (size / 2.0) as u32,
            );
            fill_rect(canvas, rect, color);
        }
    }

    fn solid_png(dir: &Path, name: &str, w: u32, h: u32, rgb: [u8; 3]) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255]))
            .save(&path)
            .unwrap();
        path
    }

    fn brand() -> Rgba<u8> {
        Rgba([BRAND_COLOR_RGB[0], BRAND_COLOR_RGB[1], BRAND_COLOR_RGB[2], 255])
    }

    #[test]
    fn test_portrait_three_band_regions() {
        let dir = TempDir::new().unwrap();
        let picture = solid_png(dir.path(), "red.png", 400, 400, [255, 0, 0]);
        let composer = FrameComposer::new(
            FrameLayout::portrait_three_band(Resolution::PORTRAIT),
            Arc::new(BoxText),
        )
        .with_banner_image(RgbaImage::from_pixel(10, 10, Rgba([0, 255, 0, 255])));

        let spec = FrameSpec {
            image: Some(&picture),
            caption: Some("breaking news from the city"),
        };
        let (canvas, wrapped) = composer.render(&spec).unwrap();

        assert_eq!(canvas.dimensions(), (1080, 1920));
        // Square picture contain-fits to 640x640 centered in the middle band.
        assert_eq!(*canvas.get_pixel(540, 960), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(100, 960), brand());
        // Bottom band is the banner.
        assert_eq!(*canvas.get_pixel(540, 1600), Rgba([0, 255, 0, 255]));
        // Caption band is tinted, text is white in the band's middle.
        assert_ne!(*canvas.get_pixel(5, 5), brand());
        assert_eq!(*canvas.get_pixel(540, 320), Rgba([255, 255, 255, 255]));
        assert_eq!(wrapped.lines.len(), 1);
        assert!(wrapped.dropped.is_empty());
    }

    #[test]
    fn test_caption_only_frame_keeps_background() {
        let composer = FrameComposer::new(
            FrameLayout::portrait_three_band(Resolution::PORTRAIT),
            Arc::new(BoxText),
        );
        let (canvas, _) = composer
            .render(&FrameSpec {
                image: None,
                caption: Some("words only"),
            })
            .unwrap();

        assert_eq!(*canvas.get_pixel(540, 960), brand());
        // No banner artwork: bottom band stays brand colour.
        assert_eq!(*canvas.get_pixel(540, 1600), brand());
        let mut band = brand();
        blend_pixel(&mut band, CAPTION_BAND_RGBA, 255);
        assert_eq!(*canvas.get_pixel(5, 5), band);
    }

    #[test]
    fn test_landscape_split_regions() {
        let dir = TempDir::new().unwrap();
        let picture = solid_png(dir.path(), "blue.png", 100, 300, [0, 0, 255]);
        let composer = FrameComposer::new(
            FrameLayout::landscape_split(Resolution::LANDSCAPE),
            Arc::new(BoxText),
        )
        .with_banner_image(RgbaImage::from_pixel(4, 4, Rgba([255, 255, 0, 255])));

        let (canvas, _) = composer
            .render(&FrameSpec {
                image: Some(&picture),
                caption: None,
            })
            .unwrap();

        // Stretched over the whole 1536x864 region regardless of aspect.
        assert_eq!(*canvas.get_pixel(10, 10), Rgba([0, 0, 255, 255]));
        assert_eq!(*canvas.get_pixel(1500, 850), Rgba([0, 0, 255, 255]));
        assert_eq!(*canvas.get_pixel(1800, 540), Rgba([255, 255, 0, 255]));
        assert_eq!(*canvas.get_pixel(700, 1000), brand());
    }

    #[test]
    fn test_long_caption_reports_dropped_words() {
        let composer = FrameComposer::new(
            FrameLayout::landscape_split(Resolution::LANDSCAPE),
            Arc::new(BoxText),
        );
        // 27 px per char at 54 px: five ten-letter words per line.
        let caption = vec!["abcdefghij"; 40].join(" ");
        let (_, wrapped) = composer
            .render(&FrameSpec {
                image: None,
                caption: Some(&caption),
            })
            .unwrap();

        assert_eq!(wrapped.lines.len(), 3);
        assert!(!wrapped.dropped.is_empty());
        let kept: usize = wrapped.lines.iter().map(|l| l.split(' ').count()).sum();
        assert_eq!(kept + wrapped.dropped.len(), 40);
    }

    #[test]
    fn test_compose_writes_png() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("frame_000.png");
        let mut composer = FrameComposer::new(
            FrameLayout::portrait_full_bleed(Resolution::PORTRAIT, None),
            Arc::new(BoxText),
        );
        composer.watermark_text = Some("CITY NEWS".to_string());

        let frame = composer.compose(&FrameSpec::default(), &out).unwrap();

        assert_eq!(frame.path, out);
        let written = image::open(&out).unwrap();
        assert_eq!((written.width(), written.height()), (1080, 1920));
    }
}
