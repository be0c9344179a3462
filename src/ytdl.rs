//! Video title/thumbnail lookup through yt-dlp.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum MetadataError {
  #[error("{0} executable not found")]
  NotFound(String),
  #[error("Failed to run {0}: {1}")]
  Spawn(String, #[source] std::io::Error),
  #[error("{0} exited with {1}")]
  Failed(String, std::process::ExitStatus),
  #[error("Can't parse output")]
  Parse,
}

/// Title and thumbnail of a video.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoInfo {
  pub title: String,
  pub thumbnail: String,
}

/// Something that can describe a URL.
#[async_trait]
pub trait MetadataSource: Send + Sync {
  async fn fetch(&self, url: &str) -> Result<VideoInfo, MetadataError>;
}

/// Runs `yt-dlp --get-title --get-thumbnail`.
#[derive(Debug, Clone)]
pub struct YtDlp {
  program: String,
}

impl YtDlp {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
    }
  }
}

#[async_trait]
impl MetadataSource for YtDlp {
  async fn fetch(&self, url: &str) -> Result<VideoInfo, MetadataError> {
    let exe = which::which(&self.program).map_err(|_| MetadataError::NotFound(self.program.clone()))?;

    let output = Command::new(exe)
      .args([
        "--ignore-errors",
        "--get-title",
        "--get-thumbnail",
        "--no-warnings",
        url,
      ])
      .kill_on_drop(true)
      .output()
      .await
      .map_err(|e| MetadataError::Spawn(self.program.clone(), e))?;

    if !output.status.success() {
      return Err(MetadataError::Failed(self.program.clone(), output.status));
    }

    parse_video(&String::from_utf8_lossy(&output.stdout))
  }
}

/// First line is the title, second the thumbnail URL.
/// Title and thumbnail are the first two newline-separated fields. A title
/// followed by a bare newline yields an empty thumbnail.
fn parse_video(output: &str) -> Result<VideoInfo, MetadataError> {
  let mut lines = output.split('\n');
  match (lines.next(), lines.next()) {
    (Some(title), Some(thumbnail)) => Ok(VideoInfo {
      title: title.to_string(),
      thumbnail: thumbnail.to_string(),
    }),
    _ => Err(MetadataError::Parse),
  }
}
