//! Upload handler.

use std::io;
use std::path::Path;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::response::Html;
use futures::TryStreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

use reel_models::{JobId, MediaItem, MediaKind, Orientation, RenderJob, RenderMode};
use reel_worker::{JobWorkspace, ValidationError};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::pages;
use crate::state::AppState;

/// Fields of the upload form, with files already saved to the workspace.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub title: String,
    pub caption: String,
    pub orientation: String,
    pub music_option: String,
    pub media: Vec<MediaItem>,
}

/// Accept an upload, render it and show the result page.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Html<String>> {
    let render = state.render_config();
    let job_id = JobId::new();
    let workspace = JobWorkspace::create(&render.temp_dir, &job_id)
        .map_err(|e| ApiError::internal(format!("Failed to create job workspace: {}", e)))?;

    let form = read_form(&mut multipart, &workspace, render.max_files).await?;
    let orientation = parse_orientation(&form.orientation)?;
    let mode = parse_mode(&form.music_option)?;

    let job = RenderJob::with_id(
        job_id,
        form.title.trim(),
        form.caption,
        orientation,
        mode,
        form.media,
    );
    metrics::record_upload(mode.as_str(), job.media.len());
    info!(
        job_id = %job.id,
        mode = %mode,
        orientation = orientation.as_str(),
        files = job.media.len(),
        "Upload received"
    );

    let outcome = state.executor.submit(job, workspace).await?;
    Ok(Html(pages::result_page(&outcome.basename)))
}

/// Read every form field, streaming allow-listed files into the workspace.
///
/// Files with other extensions are skipped.
async fn read_form(
    multipart: &mut Multipart,
    workspace: &JobWorkspace,
    max_files: usize,
) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = field_text(field).await?,
            "caption" => form.caption = field_text(field).await?,
            "orientation" => form.orientation = field_text(field).await?,
            "music_option" => form.music_option = field_text(field).await?,
            "media" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if file_name.is_empty() {
                    continue;
                }
                let Some(kind) = MediaKind::from_file_name(&file_name) else {
                    warn!(file_name = %file_name, "Skipping file with unsupported extension");
                    metrics::record_skipped_file();
                    continue;
                };
                if form.media.len() >= max_files {
                    return Err(ValidationError::TooManyFiles { max: max_files }.into());
                }

                let extension = Path::new(&file_name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_lowercase)
                    .unwrap_or_default();
                let path = workspace.upload_path(form.media.len(), &extension);
                let bytes = stream_to_file(&path, field).await?;
                debug!(file_name = %file_name, bytes, "Saved upload");

                form.media.push(MediaItem::new(path, kind, file_name));
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

async fn field_text(field: Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid form field: {}", e)))
}

// Save a multipart field to a file
async fn stream_to_file(path: &Path, field: Field<'_>) -> ApiResult<u64> {
    async {
        let body_with_io_error = field.map_err(io::Error::other);
        let body_reader = StreamReader::new(body_with_io_error);
        futures::pin_mut!(body_reader);

        let mut file = BufWriter::new(File::create(path).await?);
        let written = tokio::io::copy(&mut body_reader, &mut file).await?;
        file.flush().await?;

        Ok::<_, io::Error>(written)
    }
    .await
    .map_err(|e| ApiError::bad_request(format!("Failed to receive upload: {}", e)))
}

/// Blank means portrait.
pub fn parse_orientation(value: &str) -> Result<Orientation, ValidationError> {
    if value.trim().is_empty() {
        return Ok(Orientation::Portrait);
    }
    value.parse().map_err(|_| ValidationError::UnknownOrientation {
        value: value.to_string(),
    })
}

/// Blank means the default mode.
pub fn parse_mode(value: &str) -> Result<RenderMode, ValidationError> {
    value.parse().map_err(|_| ValidationError::UnknownMode {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_orientation() {
        assert_eq!(parse_orientation(""), Ok(Orientation::Portrait));
        assert_eq!(parse_orientation("Landscape"), Ok(Orientation::Landscape));
        assert_eq!(
            parse_orientation("square"),
            Err(ValidationError::UnknownOrientation {
                value: "square".to_string()
            })
        );
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode(""), Ok(RenderMode::Default));
        assert_eq!(parse_mode("transform_add_music"), Ok(RenderMode::TransformAddMusic));
        assert!(matches!(parse_mode("karaoke"), Err(ValidationError::UnknownMode { .. })));
    }
}
