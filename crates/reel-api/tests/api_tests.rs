//! API integration tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use reel_api::{create_router, ApiConfig, AppState};
use reel_media::{
    AssetCatalog, FfmpegCommand, MediaInfo, MediaResult, NarrationSynthesizer, Transcoder,
};
use reel_worker::{JobExecutor, RenderConfig, RenderPipeline, RenderServices};

const BOUNDARY: &str = "reelforge-test-boundary";

/// Writes a placeholder file for every command; every input probes as a
/// portrait clip with audio.
#[derive(Default)]
struct FakeTranscoder {
    probed: Mutex<Vec<PathBuf>>,
    executed: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn probe(&self, path: &Path) -> MediaResult<MediaInfo> {
        self.probed.lock().unwrap().push(path.to_path_buf());
        Ok(MediaInfo {
            duration: 6.0,
            width: 1080,
            height: 1920,
            codec: Some("h264".to_string()),
            has_video: true,
            has_audio: true,
        })
    }

    async fn execute(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.executed.lock().unwrap().push(cmd.output().to_path_buf());
        std::fs::write(cmd.output(), b"media")?;
        Ok(())
    }
}

struct NoNarration;

#[async_trait]
impl NarrationSynthesizer for NoNarration {
    async fn synthesize(&self, _text: &str, output: &Path) -> MediaResult<()> {
        std::fs::write(output, b"mp3")?;
        Ok(())
    }
}

struct TestApp {
    root: TempDir,
    transcoder: Arc<FakeTranscoder>,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let assets = root.path().join("assets");
        std::fs::create_dir_all(&assets).unwrap();
        std::fs::create_dir_all(root.path().join("outputs")).unwrap();

        let render = RenderConfig {
            output_dir: root.path().join("outputs"),
            temp_dir: root.path().join("temp"),
            assets_dir: Some(assets.clone()),
            max_files: 3,
            ..RenderConfig::default()
        };
        let transcoder = Arc::new(FakeTranscoder::default());
        let services = RenderServices {
            transcoder: transcoder.clone(),
            narrator: Arc::new(NoNarration),
            text: None,
            assets: AssetCatalog::new(assets),
        };
        let executor = JobExecutor::new(RenderPipeline::new(services, render));
        let state = AppState::with_executor(ApiConfig::default(), executor);

        Self {
            root,
            transcoder,
            router: create_router(state, None),
        }
    }

    fn outputs(&self) -> PathBuf {
        self.root.path().join("outputs")
    }

    async fn get(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn upload(&self, fields: &[(&str, &str)], files: &[&str]) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    )
                    .body(Body::from(multipart_body(fields, files)))
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

fn multipart_body(fields: &[(&str, &str)], files: &[&str]) -> Vec<u8> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    for file in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"media\"; filename=\"{file}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\nfake-bytes\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body.into_bytes()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Test health endpoint.
#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("healthy"));
}

#[tokio::test]
async fn test_index_serves_form_with_security_headers() {
    let app = TestApp::new();

    let response = app.get("/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));
    let page = body_text(response).await;
    assert!(page.contains("name=\"music_option\""));
    assert!(page.contains("value=\"transform_add_music\""));
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let app = TestApp::new();
    assert_eq!(app.get("/metrics").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_video_not_found() {
    let app = TestApp::new();
    assert_eq!(app.get("/video/missing.mp4").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_video_rejects_traversal() {
    let app = TestApp::new();
    assert_eq!(app.get("/video/..%2Fsecret.mp4").await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_video_streams_artifact() {
    let app = TestApp::new();
    std::fs::write(app.outputs().join("clip.mp4"), b"mp4-bytes").unwrap();

    let response = app.get("/video/clip.mp4").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(body_text(response).await, "mp4-bytes");
}

#[tokio::test]
async fn test_upload_merge_only_renders_artifact() {
    let app = TestApp::new();

    let response = app
        .upload(
            &[("title", "Evening News"), ("music_option", "merge_only")],
            &["one.mp4", "two.MP4", "notes.txt"],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("/video/Evening_News_output_"));

    let artifacts: Vec<_> = std::fs::read_dir(app.outputs()).unwrap().collect();
    assert_eq!(artifacts.len(), 1);
    // Two normalizes and one pair merge; the text file never reaches the pipeline.
    assert_eq!(app.transcoder.executed.lock().unwrap().len(), 3);
    // The job workspace is gone once the response is sent.
    assert_eq!(std::fs::read_dir(app.root.path().join("temp")).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_without_title_is_bilingual_400() {
    let app = TestApp::new();

    let response = app
        .upload(&[("title", "   "), ("music_option", "merge_only")], &["a.mp4", "b.mp4"])
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let page = body_text(response).await;
    assert!(page.contains("Video Title is required."));
    assert!(page.contains("వీడియో శీర్షిక తప్పనిసరిగా ఇవ్వాలి."));
    assert!(app.transcoder.probed.lock().unwrap().is_empty());
    assert!(app.transcoder.executed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_merge_only_needs_two_clips() {
    let app = TestApp::new();

    let response = app
        .upload(&[("title", "Solo"), ("music_option", "merge_only")], &["a.mp4"])
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("At least two video clips"));
}

#[tokio::test]
async fn test_upload_too_many_files() {
    let app = TestApp::new();

    let response = app
        .upload(
            &[("title", "Many"), ("music_option", "merge_only")],
            &["1.mp4", "2.mp4", "3.mp4", "4.mp4"],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("At most 3 files"));
}

#[tokio::test]
async fn test_upload_unknown_music_option() {
    let app = TestApp::new();

    let response = app
        .upload(&[("title", "Odd"), ("music_option", "karaoke")], &["a.mp4", "b.mp4"])
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Unknown music option: karaoke"));
}

#[tokio::test]
async fn test_upload_default_mode_without_files_is_400() {
    let app = TestApp::new();

    let response = app
        .upload(&[("title", "No files"), ("caption", "hello world")], &[])
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let page = body_text(response).await;
    assert!(page.contains("At least one file must be selected."));
    assert!(page.contains("కనీసం ఒక ఫైల్ ఎంపిక చేయాలి."));
}

#[tokio::test]
async fn test_upload_image_without_music_is_500() {
    let app = TestApp::new();

    let response = app
        .upload(&[("title", "No music"), ("caption", "hello world")], &["photo.jpg"])
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let page = body_text(response).await;
    assert!(page.contains("Video processing failed."));
    assert!(page.contains("వీడియో ప్రాసెసింగ్ విఫలమైంది."));
    assert!(app.transcoder.executed.lock().unwrap().is_empty());
    assert_eq!(std::fs::read_dir(app.outputs()).unwrap().count(), 0);
}
