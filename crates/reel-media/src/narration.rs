//! Text-to-speech narration through an external program.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Default narration command line.
pub const DEFAULT_NARRATION_COMMAND: &str = "python3 generate_audio.py";

/// Default limit for one narration run.
pub const DEFAULT_NARRATION_TIMEOUT_SECS: u64 = 300;

/// Characters stripped before text reaches the synthesizer.
const STRIPPED_CHARS: &[char] = &['*', '_', '-', '"'];

/// Produce a narration audio file for a piece of text.
#[async_trait]
pub trait NarrationSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, output: &Path) -> MediaResult<()>;
}

/// Remove markup characters that speech engines read aloud.
pub fn sanitize_narration_text(text: &str) -> String {
    text.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect()
}

/// Runs `program [args..] <text> <output>` without a shell.
#[derive(Debug, Clone)]
pub struct CommandNarrator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandNarrator {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Split a whitespace-separated command line into program and arguments.
    pub fn from_command_line(command: &str, timeout: Duration) -> MediaResult<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| MediaError::narration_failed("Narration command is empty", None))?;
        Ok(Self::new(program, parts.collect(), timeout))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl NarrationSynthesizer for CommandNarrator {
    async fn synthesize(&self, text: &str, output: &Path) -> MediaResult<()> {
        info!(
            program = %self.program,
            output = %output.display(),
            chars = text.chars().count(),
            "Generating narration"
        );

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                MediaError::narration_failed(format!("Failed to start {}: {}", self.program, e), None)
            })?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| MediaError::Timeout(self.timeout.as_secs()))??;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(MediaError::narration_failed(
                format!("{} exited with {}", self.program, result.status),
                (!stderr.is_empty()).then_some(stderr),
            ));
        }

        if !output.is_file() {
            return Err(MediaError::narration_failed(
                format!("{} produced no file at {}", self.program, output.display()),
                None,
            ));
        }

        debug!("Narration written to {}", output.display());
        Ok(())
    }
}
