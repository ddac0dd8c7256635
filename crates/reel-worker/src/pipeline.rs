//! The render orchestrator.
//!
//! A job is prechecked without touching its files, then turned into a
//! [`RenderPlan`] (the only step allowed to probe inputs), then executed as a
//! fixed sequence of awaited stages for that plan. The finished file is written inside the job workspace and moved
//! into the output directory only once every stage has succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use metrics::counter;
use tracing::Instrument;

use reel_media::audio::AudioBinding;
use reel_media::caption::{chunk_caption, ChunkPolicy};
use reel_media::concat::DemuxMode;
use reel_media::frame::{FrameComposer, FrameSpec};
use reel_media::narration::sanitize_narration_text;
use reel_media::timeline::{plan_timeline, TimelineTarget};
use reel_media::{
    move_file, AssetCatalog, AudioBinder, ClipSynthesizer, ConcatEngine, FontdueText,
    NarrationSynthesizer, TextRenderer, Transcoder,
};
use reel_models::{CaptionChunk, MediaItem, Orientation, RenderJob, RenderMode, Resolution, Timeline};

use crate::config::RenderConfig;
use crate::error::{ValidationError, WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::workspace::JobWorkspace;

/// External collaborators of the pipeline.
#[derive(Clone)]
pub struct RenderServices {
    pub transcoder: Arc<dyn Transcoder>,
    pub narrator: Arc<dyn NarrationSynthesizer>,
    /// Caption renderer; loaded from the asset font per job when unset
    pub text: Option<Arc<dyn TextRenderer>>,
    pub assets: AssetCatalog,
}

/// What a job will do, decided before any encoding starts.
///
/// Media lists are fixed at planning time and keep upload order.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPlan {
    /// Captioned images over looped background music
    Slideshow {
        images: Vec<MediaItem>,
        caption: String,
    },
    /// Captioned images timed to generated narration
    Narrated {
        images: Vec<MediaItem>,
        caption: String,
        narration_text: String,
    },
    /// Clips of one orientation, normalized and joined with their own audio
    MergeOnly {
        clips: Vec<MediaItem>,
        orientation: Orientation,
    },
    /// Clips transformed with banners and joined with their own audio
    TransformMerge { clips: Vec<MediaItem> },
    /// Clips transformed, joined silently, then laid over background music
    TransformAddMusic { clips: Vec<MediaItem> },
}

impl RenderPlan {
    pub fn mode(&self) -> RenderMode {
        match self {
            RenderPlan::Slideshow { .. } => RenderMode::Default,
            RenderPlan::Narrated { .. } => RenderMode::Ai,
            RenderPlan::MergeOnly { .. } => RenderMode::MergeOnly,
            RenderPlan::TransformMerge { .. } => RenderMode::TransformMerge,
            RenderPlan::TransformAddMusic { .. } => RenderMode::TransformAddMusic,
        }
    }
}

/// Result of a successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub output_path: PathBuf,
    /// File name under the output directory
    pub basename: String,
    pub mode: RenderMode,
    /// Expected length in seconds when the pipeline decides it
    pub duration_hint: Option<f64>,
    /// Frames or clips that went into the video
    pub segment_count: usize,
}

/// Checks that need nothing but the request itself.
///
/// Runs before a job slot is taken and before any file is probed, so a bad
/// request is rejected even while every slot is busy.
pub fn precheck(job: &RenderJob) -> Result<(), ValidationError> {
    if job.title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }

    let caption = job.caption.trim();
    match job.mode {
        RenderMode::Default => {
            if job.media.is_empty() {
                return Err(ValidationError::NoFiles);
            }
            if caption.is_empty() && !job.media.iter().any(MediaItem::is_image) {
                return Err(ValidationError::CaptionOrImagesRequired);
            }
        }
        RenderMode::Ai => {
            if !job.media.iter().any(MediaItem::is_image) {
                return Err(ValidationError::AiImageRequired);
            }
            if sanitize_narration_text(caption).trim().is_empty() {
                return Err(ValidationError::AiCaptionRequired);
            }
        }
        RenderMode::MergeOnly => {
            if job.media.iter().filter(|m| m.is_video()).count() < 2 {
                return Err(ValidationError::NeedTwoClips);
            }
        }
        RenderMode::TransformMerge | RenderMode::TransformAddMusic => {
            if !job.media.iter().any(MediaItem::is_video) {
                return Err(ValidationError::NoValidClips);
            }
        }
    }

    Ok(())
}

/// Validate a job and choose its plan.
///
/// `videos` are the job's clips with probed orientations attached; they are
/// ignored by the image modes. Only the orientation rule depends on them.
pub fn plan(job: &RenderJob, videos: &[MediaItem]) -> Result<RenderPlan, ValidationError> {
    precheck(job)?;

    let caption = job.caption.trim().to_string();

    match job.mode {
        RenderMode::Default => Ok(RenderPlan::Slideshow {
            images: job.images(),
            caption,
        }),
        RenderMode::Ai => {
            let narration_text = sanitize_narration_text(&caption).trim().to_string();
            Ok(RenderPlan::Narrated {
                images: job.images(),
                caption,
                narration_text,
            })
        }
        RenderMode::MergeOnly => {
            if videos.len() < 2 {
                return Err(ValidationError::NeedTwoClips);
            }
            let orientation = videos[0]
                .detected_orientation
                .unwrap_or(Orientation::Landscape);
            if videos
                .iter()
                .any(|v| v.detected_orientation.unwrap_or(Orientation::Landscape) != orientation)
            {
                return Err(ValidationError::MixedOrientation);
            }
            Ok(RenderPlan::MergeOnly {
                clips: videos.to_vec(),
                orientation,
            })
        }
        RenderMode::TransformMerge | RenderMode::TransformAddMusic => {
            if videos.is_empty() {
                return Err(ValidationError::NoValidClips);
            }
            let clips = videos.to_vec();
            Ok(if job.mode == RenderMode::TransformMerge {
                RenderPlan::TransformMerge { clips }
            } else {
                RenderPlan::TransformAddMusic { clips }
            })
        }
    }
}

/// Probe each clip's orientation, assuming landscape when probing fails.
pub async fn detect_orientations(
    transcoder: &dyn Transcoder,
    videos: Vec<MediaItem>,
    logger: &JobLogger,
) -> Vec<MediaItem> {
    let mut detected = Vec::with_capacity(videos.len());

    for item in videos {
        let orientation = match transcoder.probe(&item.path).await.and_then(|info| info.orientation()) {
            Ok(orientation) => orientation,
            Err(e) => {
                logger.log_warning(&format!(
                    "Could not detect orientation of {} ({}), assuming landscape",
                    item.path.display(),
                    e
                ));
                counter!("reel_probe_fallback_total").increment(1);
                Orientation::Landscape
            }
        };
        detected.push(item.with_orientation(orientation));
    }

    detected
}

/// Audio laid under a captioned slideshow.
enum SlideshowAudio {
    Music(PathBuf),
    Narration { path: PathBuf, duration_secs: f64 },
}

/// Runs one job's stages.
pub struct RenderPipeline {
    services: RenderServices,
    config: RenderConfig,
    clips: ClipSynthesizer,
    concat: ConcatEngine,
    audio: AudioBinder,
}

impl RenderPipeline {
    pub fn new(services: RenderServices, config: RenderConfig) -> Self {
        let clips = ClipSynthesizer::new(services.transcoder.clone(), config.encoding.clone());
        let concat = ConcatEngine::new(services.transcoder.clone(), config.encoding.clone());
        let audio = AudioBinder::new(services.transcoder.clone(), config.encoding.clone());

        Self {
            services,
            config,
            clips,
            concat,
            audio,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `job` using `workspace` for every intermediate.
    ///
    /// The workspace is dropped (and deleted) when this returns.
    pub async fn run(&self, job: RenderJob, workspace: JobWorkspace) -> WorkerResult<RenderOutcome> {
        let logger = JobLogger::new(&job.id, job.mode);
        let span = logger.create_span();

        async move {
            logger.log_start(&format!("\"{}\" with {} media items", job.title, job.media.len()));

            precheck(&job).inspect_err(|e| logger.log_warning(&e.english()))?;

            let videos = if job.mode.uses_videos() {
                detect_orientations(self.services.transcoder.as_ref(), job.videos(), &logger).await
            } else {
                Vec::new()
            };

            let plan = plan(&job, &videos).inspect_err(|e| logger.log_warning(&e.english()))?;
            let final_path = workspace.file("final.mp4");

            let (duration_hint, segment_count) = match &plan {
                RenderPlan::Slideshow { images, caption } => {
                    let music = self.services.assets.background_music()?;
                    let chunks = chunk_caption(
                        caption,
                        ChunkPolicy::ImageAware {
                            image_count: images.len(),
                        },
                    );
                    let timeline = plan_timeline(images, &chunks, TimelineTarget::Segments);
                    self.render_slideshow(
                        &job,
                        &timeline,
                        SlideshowAudio::Music(music),
                        &workspace,
                        &final_path,
                        &logger,
                    )
                    .await?
                }
                RenderPlan::Narrated {
                    images,
                    caption,
                    narration_text,
                } => {
                    let (path, duration_secs) =
                        self.narrate(narration_text, &workspace, &logger).await?;
                    let chunks: Vec<CaptionChunk> = chunk_caption(
                        caption,
                        ChunkPolicy::NarrationDriven {
                            audio_duration_secs: duration_secs,
                        },
                    );
                    let timeline = plan_timeline(
                        images,
                        &chunks,
                        TimelineTarget::Narration {
                            audio_duration_secs: duration_secs,
                        },
                    );
                    self.render_slideshow(
                        &job,
                        &timeline,
                        SlideshowAudio::Narration { path, duration_secs },
                        &workspace,
                        &final_path,
                        &logger,
                    )
                    .await?
                }
                RenderPlan::MergeOnly { clips, orientation } => {
                    let res = orientation.resolution();
                    let stage = logger.stage("normalize");
                    let mut normalized = Vec::with_capacity(clips.len());
                    for (i, clip) in clips.iter().enumerate() {
                        let out = workspace.file(&format!("normalized_{i:03}.mp4"));
                        self.clips.normalize_clip(&clip.path, &out, res).await?;
                        normalized.push(out);
                    }
                    stage.finish();

                    let stage = logger.stage("merge");
                    self.concat
                        .merge(&normalized, &final_path, workspace.path())
                        .await?;
                    stage.finish();
                    (None, clips.len())
                }
                RenderPlan::TransformMerge { clips } => {
                    let prepared = self.prepare_clips(&job, clips, &workspace, &logger).await?;

                    let stage = logger.stage("merge");
                    self.concat
                        .merge(&prepared, &final_path, workspace.path())
                        .await?;
                    stage.finish();
                    (None, clips.len())
                }
                RenderPlan::TransformAddMusic { clips } => {
                    let music = self.services.assets.background_music()?;
                    let prepared = self.prepare_clips(&job, clips, &workspace, &logger).await?;

                    let stage = logger.stage("concat");
                    let joined = workspace.file("joined.mp4");
                    self.concat
                        .concat_demuxer(
                            &prepared,
                            &joined,
                            &workspace.file("concat.txt"),
                            DemuxMode::ReencodeVideo,
                        )
                        .await?;
                    stage.finish();

                    let stage = logger.stage("audio");
                    self.audio.bind_exact(&joined, &music, &final_path).await?;
                    stage.finish();
                    (None, clips.len())
                }
            };

            let output_path = self.config.output_dir.join(&job.output_name);
            move_file(&final_path, &output_path).await?;

            logger.log_completion(&format!("{} ({} segments)", job.output_name, segment_count));

            Ok(RenderOutcome {
                output_path,
                basename: job.output_name.clone(),
                mode: plan.mode(),
                duration_hint,
                segment_count,
            })
        }
        .instrument(span)
        .await
    }

    async fn narrate(
        &self,
        text: &str,
        workspace: &JobWorkspace,
        logger: &JobLogger,
    ) -> WorkerResult<(PathBuf, f64)> {
        let stage = logger.stage("narration");
        let path = workspace.file("narration.mp3");
        self.services.narrator.synthesize(text, &path).await?;
        let duration = self
            .services
            .transcoder
            .probe(&path)
            .await?
            .audio_duration()?;
        stage.finish();

        logger.log_progress(&format!("Narration is {:.2}s", duration));
        Ok((path, duration))
    }

    async fn render_slideshow(
        &self,
        job: &RenderJob,
        timeline: &Timeline,
        audio: SlideshowAudio,
        workspace: &JobWorkspace,
        final_path: &Path,
        logger: &JobLogger,
    ) -> WorkerResult<(Option<f64>, usize)> {
        if timeline.is_empty() {
            return Err(WorkerError::internal("Timeline has no segments"));
        }
        logger.log_progress(&format!(
            "Timeline: {} segments, {:.2}s",
            timeline.len(),
            timeline.total_duration
        ));

        let stage = logger.stage("frames");
        let composer = Arc::new(self.build_composer(job.orientation).await?);
        let clips = self
            .render_segments(timeline, composer, job.resolution(), workspace, logger)
            .await?;
        stage.finish();

        let stage = logger.stage("concat");
        let joined = workspace.file("joined.mp4");
        self.concat
            .concat_demuxer(&clips, &joined, &workspace.file("concat.txt"), DemuxMode::StreamCopy)
            .await?;
        stage.finish();

        let stage = logger.stage("audio");
        let (audio_path, binding) = match audio {
            SlideshowAudio::Music(path) => (
                path,
                AudioBinding::LoopUnbounded {
                    duration_secs: timeline.total_duration,
                },
            ),
            SlideshowAudio::Narration {
                path,
                duration_secs,
            } => (path, AudioBinding::Narration { duration_secs }),
        };
        self.audio
            .bind(&joined, &audio_path, final_path, binding)
            .await?;
        stage.finish();

        Ok((Some(timeline.total_duration), timeline.len()))
    }

    /// Compose each frame and encode it, keeping timeline order.
    async fn render_segments(
        &self,
        timeline: &Timeline,
        composer: Arc<FrameComposer>,
        res: Resolution,
        workspace: &JobWorkspace,
        logger: &JobLogger,
    ) -> WorkerResult<Vec<PathBuf>> {
        // Futures are built up front so the stream owns everything it polls.
        let tasks: Vec<_> = timeline
            .segments
            .iter()
            .map(|segment| {
                let composer = Arc::clone(&composer);
                let synth = self.clips.clone();
                let frame = workspace.frame_path(segment.index);
                let clip = workspace.clip_path(segment.index);
                let image = segment.source_media.as_ref().map(|m| m.path.clone());
                let caption = segment.caption.as_ref().map(|c| c.text.clone());
                let duration = segment.duration_secs;

                async move {
                    let frame_out = frame.clone();
                    let composed = tokio::task::spawn_blocking(move || {
                        composer.compose(
                            &FrameSpec {
                                image: image.as_deref(),
                                caption: caption.as_deref(),
                            },
                            &frame_out,
                        )
                    })
                    .await
                    .map_err(|e| WorkerError::internal(format!("Frame task join error: {}", e)))??;

                    synth.frame_to_clip(&frame, &clip, res, duration).await?;
                    Ok::<_, WorkerError>((clip, composed.dropped_words.len()))
                }
            })
            .collect();

        let results: Vec<(PathBuf, usize)> = stream::iter(tasks)
            .buffered(self.config.frame_parallelism.max(1))
            .try_collect()
            .await?;

        let dropped: usize = results.iter().map(|(_, d)| d).sum();
        if dropped > 0 {
            logger.log_warning(&format!("{} caption words did not fit and were dropped", dropped));
        }

        Ok(results.into_iter().map(|(clip, _)| clip).collect())
    }

    async fn build_composer(&self, orientation: Orientation) -> WorkerResult<FrameComposer> {
        let text = self.text_renderer().await?;
        let assets = self.services.assets.clone();
        let style = self.config.portrait_layout;
        let watermark = self.config.watermark_text.clone();

        let composer = tokio::task::spawn_blocking(move || {
            FrameComposer::for_orientation(orientation, style, &assets, text, watermark)
        })
        .await
        .map_err(|e| WorkerError::internal(format!("Composer task join error: {}", e)))??;

        Ok(composer)
    }

    async fn text_renderer(&self) -> WorkerResult<Arc<dyn TextRenderer>> {
        if let Some(text) = &self.services.text {
            return Ok(Arc::clone(text));
        }
        let font = self.services.assets.caption_font()?;
        let text = tokio::task::spawn_blocking(move || FontdueText::from_file(font))
            .await
            .map_err(|e| WorkerError::internal(format!("Font task join error: {}", e)))??;
        Ok(Arc::new(text))
    }

    /// Transform clips onto the job canvas, or just re-encode portrait clips
    /// for a portrait job.
    async fn prepare_clips(
        &self,
        job: &RenderJob,
        clips: &[MediaItem],
        workspace: &JobWorkspace,
        logger: &JobLogger,
    ) -> WorkerResult<Vec<PathBuf>> {
        let stage = logger.stage("transform");
        let res = job.resolution();
        let bottom = self.services.assets.bottom_banner();
        let top = self.services.assets.top_banner();

        let mut prepared = Vec::with_capacity(clips.len());
        for (i, clip) in clips.iter().enumerate() {
            let out = workspace.file(&format!("prepared_{i:03}.mp4"));
            let passthrough = job.orientation == Orientation::Portrait
                && clip.detected_orientation == Some(Orientation::Portrait);

            if passthrough {
                self.clips.normalize_clip(&clip.path, &out, res).await?;
            } else {
                self.clips
                    .transform_clip(&clip.path, &out, res, bottom.as_deref(), top.as_deref())
                    .await?;
            }
            prepared.push(out);
        }
        stage.finish();

        Ok(prepared)
    }
}
