//! Worker error types.

use thiserror::Error;

use reel_media::MediaError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Request problems detected before any media is processed.
///
/// Every variant has an English message (its `Display`) and a Telugu one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Video Title is required.")]
    TitleRequired,

    #[error("At least one file must be selected.")]
    NoFiles,

    #[error("Caption text or at least one image is required.")]
    CaptionOrImagesRequired,

    #[error("At least one image file must be selected for AI audio.")]
    AiImageRequired,

    #[error("Caption text is required for AI audio.")]
    AiCaptionRequired,

    #[error("At least two video clips (.mp4) are required to merge.")]
    NeedTwoClips,

    #[error("All input videos must have the same orientation (all portrait or all landscape).")]
    MixedOrientation,

    #[error("No valid video clips (.mp4) found for merging and adding music.")]
    NoValidClips,

    #[error("At most {max} files can be uploaded at once.")]
    TooManyFiles { max: usize },

    #[error("Unknown orientation: {value}")]
    UnknownOrientation { value: String },

    #[error("Unknown music option: {value}")]
    UnknownMode { value: String },
}

impl ValidationError {
    pub fn english(&self) -> String {
        self.to_string()
    }

    pub fn telugu(&self) -> String {
        match self {
            Self::TitleRequired => "వీడియో శీర్షిక తప్పనిసరిగా ఇవ్వాలి.".to_string(),
            Self::NoFiles => "కనీసం ఒక ఫైల్ ఎంపిక చేయాలి.".to_string(),
            Self::CaptionOrImagesRequired => "క్యాప్షన్ లేదా కనీసం ఒక చిత్రం అవసరం.".to_string(),
            Self::AiImageRequired => "AI ఆడియో కోసం కనీసం ఒక చిత్రం ఫైల్ ఎంపిక చేయాలి.".to_string(),
            Self::AiCaptionRequired => "AI ఆడియో కోసం క్యాప్షన్ టెక్స్ట్ తప్పనిసరి.".to_string(),
            Self::NeedTwoClips => {
                "మిళితం చేయడానికి కనీసం రెండు వీడియో క్లిప్స్ (.mp4) అవసరం.".to_string()
            }
            Self::MixedOrientation => {
                "అన్ని వీడియోలు ఒకే రకమైన దిశలో ఉండాలి (అన్నీ portrait లేదా అన్నీ landscape)."
                    .to_string()
            }
            Self::NoValidClips => {
                "మ్యూజిక్ జోడించడానికి మరియు మిళితం చేయడానికి సరైన వీడియో క్లిప్స్ (.mp4) కనుగొనబడలేదు."
                    .to_string()
            }
            Self::TooManyFiles { max } => {
                format!("ఒకేసారి గరిష్టంగా {max} ఫైళ్లు మాత్రమే అప్‌లోడ్ చేయవచ్చు.")
            }
            Self::UnknownOrientation { value } => format!("తెలియని దిశ: {value}"),
            Self::UnknownMode { value } => format!("తెలియని మ్యూజిక్ ఎంపిక: {value}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Media processing failed: {0}")]
    Media(MediaError),

    #[error("Media inspection failed: {0}")]
    Probe(MediaError),

    #[error("Render capacity exhausted: {0}")]
    Busy(String),

    #[error("Job cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<MediaError> for WorkerError {
    fn from(e: MediaError) -> Self {
        match e {
            e if e.is_probe_error() => Self::Probe(e),
            e => Self::Media(e),
        }
    }
}

impl WorkerError {
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The validation failure, if this is one.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }

    /// Captured stderr of the failing external process.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Media(e) | Self::Probe(e) => e.stderr(),
            _ => None,
        }
    }

    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Media(_) => "media",
            Self::Probe(_) => "probe",
            Self::Busy(_) => "busy",
            Self::Cancelled => "cancelled",
            Self::Io(_) => "io",
            Self::Internal(_) => "internal",
        }
    }
}
