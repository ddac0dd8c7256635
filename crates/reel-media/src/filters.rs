//! FFmpeg filter graph construction.
//!
//! Graphs are built as [`FilterGraphSpec`] values and rendered to the string
//! FFmpeg expects only when a command is assembled.

use std::fmt;

use reel_models::encoding::{BRAND_COLOR_HEX, FADE_SECONDS};
use reel_models::Resolution;

/// Label of the final video stream produced by the clip transform graph.
pub const TRANSFORM_OUTPUT: &str = "finalv";
/// Labels produced by the pairwise concat graph.
pub const CONCAT_VIDEO_OUTPUT: &str = "outv";
pub const CONCAT_AUDIO_OUTPUT: &str = "outa";

/// One `[in]filter,filter[out]` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChain {
    pub inputs: Vec<String>,
    pub filters: Vec<String>,
    pub outputs: Vec<String>,
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            write!(f, "[{}]", input)?;
        }
        write!(f, "{}", self.filters.join(","))?;
        for output in &self.outputs {
            write!(f, "[{}]", output)?;
        }
        Ok(())
    }
}

/// Immutable description of a filter graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterGraphSpec {
    chains: Vec<FilterChain>,
}

impl FilterGraphSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a labelled chain.
    pub fn chain<I, F, O>(mut self, inputs: I, filters: F, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        self.chains.push(FilterChain {
            inputs: inputs.into_iter().map(Into::into).collect(),
            filters: filters.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// A single unlabelled chain, suitable for `-vf`.
    pub fn simple<F>(filters: F) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self::new().chain(Vec::<String>::new(), filters, Vec::<String>::new())
    }

    pub fn chains(&self) -> &[FilterChain] {
        &self.chains
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FilterGraphSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.chains.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join(";"))
    }
}

/// Scale a still frame and fade it in and out.
pub fn frame_clip_graph(res: Resolution, duration: f64) -> FilterGraphSpec {
    let fade_out_start = (duration - FADE_SECONDS).max(0.0);
    FilterGraphSpec::simple([
        format!("scale={}:{}", res.width, res.height),
        "format=yuv420p".to_string(),
        format!("fade=t=in:st=0:d={}", FADE_SECONDS),
        format!("fade=t=out:st={}:d={}", trim_float(fade_out_start), FADE_SECONDS),
    ])
}

/// Input indexes of the optional banner images in a transform command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BannerInputs {
    pub bottom: Option<usize>,
    pub top: Option<usize>,
}

/// Fit a clip inside the frame on brand background and overlay banners.
///
/// Each banner is scaled to the full width and one third of the height; the
/// bottom banner sits on the lower edge, the top banner on the upper edge.
pub fn transform_graph(res: Resolution, banners: BannerInputs) -> FilterGraphSpec {
    let (w, h) = (res.width, res.height);
    let band = res.third_height();

    let fit = vec![
        format!("scale={w}:{h}:force_original_aspect_ratio=decrease"),
        format!("pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color={BRAND_COLOR_HEX}"),
        "setsar=1".to_string(),
    ];

    let mut current = if banners.bottom.is_none() && banners.top.is_none() {
        TRANSFORM_OUTPUT
    } else {
        "base"
    };
    let mut graph = FilterGraphSpec::new().chain(["0:v"], fit, [current]);

    if let Some(index) = banners.bottom {
        graph = graph.chain(
            [format!("{index}:v")],
            [format!("scale={w}:{band}")],
            ["bottombanner"],
        );
    }
    if let Some(index) = banners.top {
        graph = graph.chain([format!("{index}:v")], [format!("scale={w}:{band}")], ["topbanner"]);
    }

    if banners.bottom.is_some() {
        let next = if banners.top.is_some() {
            "withbottom"
        } else {
            TRANSFORM_OUTPUT
        };
        graph = graph.chain(
            [current, "bottombanner"],
            [format!("overlay=0:{}", h - band)],
            [next],
        );
        current = next;
    }
    if banners.top.is_some() {
        graph = graph.chain([current, "topbanner"], ["overlay=0:0"], [TRANSFORM_OUTPUT]);
    }

    graph
}

/// Audio source for each side of a pairwise concat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairAudio {
    /// Both clips carry audio
    Both,
    /// Missing tracks are replaced by silent inputs at these indexes
    Substituted {
        first: Option<usize>,
        second: Option<usize>,
    },
    /// Neither clip has audio; concat video only
    None,
}

/// Join two inputs end to end.
pub fn concat_pair_graph(audio: PairAudio) -> FilterGraphSpec {
    let (inputs, a): (Vec<String>, u8) = match audio {
        PairAudio::Both => (
            vec!["0:v:0".into(), "0:a:0".into(), "1:v:0".into(), "1:a:0".into()],
            1,
        ),
        PairAudio::Substituted { first, second } => {
            let first_audio = first.map(|i| format!("{i}:a:0")).unwrap_or_else(|| "0:a:0".into());
            let second_audio = second.map(|i| format!("{i}:a:0")).unwrap_or_else(|| "1:a:0".into());
            (
                vec!["0:v:0".into(), first_audio, "1:v:0".into(), second_audio],
                1,
            )
        }
        PairAudio::None => (vec!["0:v:0".into(), "1:v:0".into()], 0),
    };

    let outputs: Vec<&str> = if a == 1 {
        vec![CONCAT_VIDEO_OUTPUT, CONCAT_AUDIO_OUTPUT]
    } else {
        vec![CONCAT_VIDEO_OUTPUT]
    };

    FilterGraphSpec::new().chain(inputs, [format!("concat=n=2:v=1:a={a}")], outputs)
}

/// Re-scale a clip that already has the requested orientation.
pub fn normalize_graph(res: Resolution) -> FilterGraphSpec {
    FilterGraphSpec::simple([format!("scale={}:{}", res.width, res.height), "setsar=1".to_string()])
}

/// Gain applied to attached audio.
pub fn volume_filter(volume: f64) -> String {
    format!("volume={}", trim_float(volume))
}

/// Format seconds without trailing zeros (`5.75`, `6`).
fn trim_float(value: f64) -> String {
    let s = format!("{:.3}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clip_graph() {
        let graph = frame_clip_graph(Resolution::PORTRAIT, 6.0);
        assert_eq!(
            graph.render(),
            "scale=1080:1920,format=yuv420p,fade=t=in:st=0:d=0.25,fade=t=out:st=5.75:d=0.25"
        );
    }

    #[test]
    fn test_transform_graph_with_both_banners() {
        let graph = transform_graph(
            Resolution::PORTRAIT,
            BannerInputs {
                bottom: Some(1),
                top: Some(2),
            },
        );
        assert_eq!(
            graph.render(),
            "[0:v]scale=1080:1920:force_original_aspect_ratio=decrease,\
             pad=1080:1920:(ow-iw)/2:(oh-ih)/2:color=#2d5072,setsar=1[base];\
             [1:v]scale=1080:640[bottombanner];\
             [2:v]scale=1080:640[topbanner];\
             [base][bottombanner]overlay=0:1280[withbottom];\
             [withbottom][topbanner]overlay=0:0[finalv]"
        );
    }

    #[test]
    fn test_transform_graph_without_banners() {
        let graph = transform_graph(Resolution::LANDSCAPE, BannerInputs::default());
        assert_eq!(graph.chains().len(), 1);
        assert!(graph.render().ends_with("setsar=1[finalv]"));
        assert!(!graph.render().contains("overlay"));
    }

    #[test]
    fn test_transform_graph_top_only() {
        let graph = transform_graph(
            Resolution::PORTRAIT,
            BannerInputs {
                bottom: None,
                top: Some(1),
            },
        );
        let rendered = graph.render();
        assert!(rendered.contains("[1:v]scale=1080:640[topbanner]"));
        assert!(rendered.ends_with("[base][topbanner]overlay=0:0[finalv]"));
    }

    #[test]
    fn test_concat_pair_graph() {
        assert_eq!(
            concat_pair_graph(PairAudio::Both).render(),
            "[0:v:0][0:a:0][1:v:0][1:a:0]concat=n=2:v=1:a=1[outv][outa]"
        );
        assert_eq!(
            concat_pair_graph(PairAudio::Substituted {
                first: None,
                second: Some(2)
            })
            .render(),
            "[0:v:0][0:a:0][1:v:0][2:a:0]concat=n=2:v=1:a=1[outv][outa]"
        );
        assert_eq!(
            concat_pair_graph(PairAudio::None).render(),
            "[0:v:0][1:v:0]concat=n=2:v=1:a=0[outv]"
        );
    }

    #[test]
    fn test_volume_filter() {
        assert_eq!(volume_filter(0.5), "volume=0.5");
        assert_eq!(volume_filter(1.0), "volume=1");
    }
}
