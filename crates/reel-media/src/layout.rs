//! Frame layout geometry and caption word-wrap.
//!
//! Everything here is pure arithmetic so the placement rules can be tested
//! without fonts or image files.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use reel_models::{Orientation, Resolution};

/// Caption band colour of the portrait layout, `rgba(43,84,111,0.92)`.
pub const CAPTION_BAND_RGBA: [u8; 4] = [43, 84, 111, 235];
/// Caption text colour.
pub const CAPTION_TEXT_RGBA: [u8; 4] = [255, 255, 255, 255];
/// Watermark text colour, `rgba(255,255,255,0.7)`.
pub const WATERMARK_TEXT_RGBA: [u8; 4] = [255, 255, 255, 179];
/// Share of the band width a caption line may use.
pub const TEXT_WIDTH_RATIO: f32 = 0.95;
/// Logo margin from the top-right corner of the full-bleed layout.
pub const LOGO_MARGIN: u32 = 10;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.width as f32 / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y as f32 + self.height as f32 / 2.0
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// How a picture fills its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFit {
    /// Scale to fit inside, keep aspect ratio, center
    Contain,
    /// Scale to exactly the region size
    Stretch,
}

/// Which fixed artwork sits in a banner slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BannerSlot {
    /// Bottom third of the portrait layout
    Bottom,
    /// Right column of the landscape layout
    Side,
    /// Top-right logo of the full-bleed layout
    Logo,
}

/// Portrait layout variant, selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortraitStyle {
    /// Caption band, picture, bottom banner
    #[default]
    ThreeBand,
    /// Full-frame picture with a watermark line and logo
    FullBleed,
}

impl FromStr for PortraitStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "three_band" | "three-band" => Ok(PortraitStyle::ThreeBand),
            "full_bleed" | "full-bleed" => Ok(PortraitStyle::FullBleed),
            other => Err(format!("Unknown portrait layout: {other}")),
        }
    }
}

/// Where text goes and how it is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Region the text is centered in
    pub region: Rect,
    /// Optional translucent fill drawn under the text
    pub fill: Option<[u8; 4]>,
    pub font_size: f32,
    /// Distance between successive line centers
    pub line_pitch: f32,
    pub max_lines: usize,
    pub max_line_width: f32,
    pub color: [u8; 4],
}

/// Watermark line of the full-bleed layout, left aligned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatermarkLine {
    pub x: f32,
    pub center_y: f32,
    pub font_size: f32,
    pub color: [u8; 4],
}

/// Complete geometry of one composed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameLayout {
    pub canvas: Resolution,
    pub image_region: Rect,
    pub image_fit: ImageFit,
    pub caption: Option<TextBlock>,
    pub banner: Option<(BannerSlot, Rect)>,
    pub watermark: Option<WatermarkLine>,
}

impl FrameLayout {
    /// Pick the layout for an orientation.
    pub fn for_orientation(orientation: Orientation, portrait: PortraitStyle) -> Self {
        match (orientation, portrait) {
            (Orientation::Portrait, PortraitStyle::ThreeBand) => {
                Self::portrait_three_band(Resolution::PORTRAIT)
            }
            (Orientation::Portrait, PortraitStyle::FullBleed) => {
                Self::portrait_full_bleed(Resolution::PORTRAIT, None)
            }
            (Orientation::Landscape, _) => Self::landscape_split(Resolution::LANDSCAPE),
        }
    }

    /// Caption band on top, picture in the middle, banner at the bottom.
    pub fn portrait_three_band(canvas: Resolution) -> Self {
        let band = canvas.height / 3;
        let middle = canvas.height / 3;
        let bottom_y = band + middle;
        let font_size = (band as f32 / 4.2 * 0.7 * 0.7).floor();

        Self {
            canvas,
            image_region: Rect::new(0, band, canvas.width, middle),
            image_fit: ImageFit::Contain,
            caption: Some(TextBlock {
                region: Rect::new(0, 0, canvas.width, band),
                fill: Some(CAPTION_BAND_RGBA),
                font_size,
                line_pitch: font_size * 1.1,
                max_lines: 7,
                max_line_width: canvas.width as f32 * TEXT_WIDTH_RATIO,
                color: CAPTION_TEXT_RGBA,
            }),
            banner: Some((
                BannerSlot::Bottom,
                Rect::new(0, bottom_y, canvas.width, canvas.height - bottom_y),
            )),
            watermark: None,
        }
    }

    /// Picture top-left, caption strip below it, banner column on the right.
    pub fn landscape_split(canvas: Resolution) -> Self {
        let main_w = (canvas.width as f32 * 0.8).floor() as u32;
        let main_h = (canvas.height as f32 * 0.8).floor() as u32;
        let strip = Rect::new(0, main_h, main_w, canvas.height - main_h);
        let font_size = (canvas.height as f32 / 20.0).floor();

        Self {
            canvas,
            image_region: Rect::new(0, 0, main_w, main_h),
            image_fit: ImageFit::Stretch,
            caption: Some(TextBlock {
                region: strip,
                fill: None,
                font_size,
                line_pitch: font_size * 1.2,
                max_lines: 3,
                max_line_width: strip.width as f32 * TEXT_WIDTH_RATIO,
                color: CAPTION_TEXT_RGBA,
            }),
            banner: Some((
                BannerSlot::Side,
                Rect::new(main_w, 0, canvas.width - main_w, canvas.height),
            )),
            watermark: None,
        }
    }

    /// Full-frame picture, watermark line and top-right logo; no caption.
    ///
    /// `logo_size` is the source logo's pixel size, used to keep its aspect
    /// ratio; without it the logo box is square.
    pub fn portrait_full_bleed(canvas: Resolution, logo_size: Option<(u32, u32)>) -> Self {
        let logo_w = canvas.width / 6;
        let logo_h = match logo_size {
            Some((w, h)) if w > 0 => (logo_w as f32 * h as f32 / w as f32).round() as u32,
            _ => logo_w,
        };

        Self {
            canvas,
            image_region: Rect::new(0, 0, canvas.width, canvas.height),
            image_fit: ImageFit::Stretch,
            caption: None,
            banner: Some((
                BannerSlot::Logo,
                Rect::new(canvas.width - logo_w - LOGO_MARGIN, LOGO_MARGIN, logo_w, logo_h),
            )),
            watermark: Some(WatermarkLine {
                x: canvas.width as f32 * 0.05,
                center_y: canvas.height as f32 / 2.0,
                font_size: (canvas.height as f32 / 28.0).floor(),
                color: WATERMARK_TEXT_RGBA,
            }),
        }
    }
}

/// Vertical center of each line in a block centered in `region`.
pub fn line_centers(region: Rect, line_count: usize, pitch: f32) -> Vec<f32> {
    let mid = region.center_y();
    let offset = (line_count as f32 - 1.0) / 2.0;
    (0..line_count)
        .map(|l| mid + (l as f32 - offset) * pitch)
        .collect()
}

/// Largest rectangle with the source aspect ratio that fits in `region`,
/// centered in it.
pub fn contain_fit(src_width: u32, src_height: u32, region: Rect) -> Rect {
    if src_width == 0 || src_height == 0 {
        return region;
    }
    let scale = (region.width as f64 / src_width as f64).min(region.height as f64 / src_height as f64);
    let w = ((src_width as f64 * scale).round() as u32).clamp(1, region.width.max(1));
    let h = ((src_height as f64 * scale).round() as u32).clamp(1, region.height.max(1));
    Rect::new(
        region.x + (region.width - w) / 2,
        region.y + (region.height - h) / 2,
        w,
        h,
    )
}

/// Result of wrapping a caption into a bounded number of lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WrappedText {
    pub lines: Vec<String>,
    /// Words that did not fit under the line cap
    pub dropped: Vec<String>,
}

impl WrappedText {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Greedy word-wrap.
///
/// Words are appended while the measured line stays within `max_width`. A
/// single word wider than the limit gets a line of its own. Once `max_lines`
/// lines are full the remaining words are reported as dropped.
pub fn wrap_words<F>(text: &str, max_width: f32, max_lines: usize, measure: F) -> WrappedText
where
    F: Fn(&str) -> f32,
{
    let mut result = WrappedText::default();
    let mut current = String::new();
    let words: Vec<&str> = text.split_whitespace().collect();

    if max_lines == 0 {
        result.dropped = words.iter().map(|w| w.to_string()).collect();
        return result;
    }

    for (i, word) in words.iter().enumerate() {
        let candidate = if current.is_empty() {
            (*word).to_string()
        } else {
            format!("{current} {word}")
        };

        if current.is_empty() || measure(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        result.lines.push(std::mem::take(&mut current));
        if result.lines.len() == max_lines {
            result.dropped = words[i..].iter().map(|w| w.to_string()).collect();
            return result;
        }
        current = (*word).to_string();
    }

    if !current.is_empty() {
        result.lines.push(current);
    }

    result
}
