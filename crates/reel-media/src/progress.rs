//! FFmpeg `-progress` stream parsing.

use serde::{Deserialize, Serialize};

/// Progress snapshot reported by FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    pub frame: u64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (1.5 = 1.5x realtime)
    pub speed: f64,
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Progress percentage for an expected output length in seconds.
    pub fn percentage(&self, expected_secs: f64) -> f64 {
        if expected_secs <= 0.0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / 1000.0 / expected_secs) * 100.0).clamp(0.0, 100.0)
    }

    /// Fold one stderr line into this snapshot and classify it.
    pub fn apply_line(&mut self, line: &str) -> LineKind {
        let Some((key, value)) = line.trim().split_once('=') else {
            return LineKind::Other;
        };

        match key {
            "out_time_us" | "out_time_ms" => {
                // Both keys carry microseconds in current FFmpeg builds.
                if let Ok(us) = value.parse::<i64>() {
                    self.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.frame = frame;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.speed = speed;
                }
            }
            "progress" => {
                self.is_complete = value == "end";
                return LineKind::BlockEnd;
            }
            "fps" | "bitrate" | "total_size" | "out_time" | "dup_frames" | "drop_frames"
            | "stream_0_0_q" => {}
            _ => return LineKind::Other,
        }

        LineKind::Progress
    }
}

/// Classification of one stderr line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Field inside a progress block
    Progress,
    /// `progress=continue|end`
    BlockEnd,
    /// Diagnostic output, kept for error reports
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_block() {
        let mut progress = FfmpegProgress::default();

        assert_eq!(progress.apply_line("frame=90"), LineKind::Progress);
        assert_eq!(progress.apply_line("out_time_us=3000000"), LineKind::Progress);
        assert_eq!(progress.apply_line("speed=2.5x"), LineKind::Progress);
        assert_eq!(progress.apply_line("progress=end"), LineKind::BlockEnd);

        assert_eq!(progress.frame, 90);
        assert_eq!(progress.out_time_ms, 3000);
        assert!((progress.speed - 2.5).abs() < 0.01);
        assert!(progress.is_complete);
        assert!((progress.percentage(6.0) - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_diagnostic_lines() {
        let mut progress = FfmpegProgress::default();
        assert_eq!(
            progress.apply_line("[concat @ 0x55] Unsafe file name 'a.mp4'"),
            LineKind::Other
        );
        assert_eq!(progress.apply_line("speed=N/A"), LineKind::Progress);
        assert_eq!(progress.speed, 0.0);
    }
}
