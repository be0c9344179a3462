//! Fake MPV control socket for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mpv_remote::mpv::{ClientOptions, MpvClient};
use mpv_remote::ytdl::{MetadataError, MetadataSource, VideoInfo};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::task::JoinHandle;

type Handler = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Accepts connections, reads one command per connection and answers with
/// whatever the handler returns. `None` means never answer.
pub struct FakePlayer {
  _dir: TempDir,
  pub path: PathBuf,
  received: Arc<Mutex<Vec<String>>>,
  task: JoinHandle<()>,
}

impl FakePlayer {
  pub fn start<F>(handler: F) -> Self
  where
    F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
  {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mpv.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let handler: Handler = Arc::new(handler);

    let log = received.clone();
    let task = tokio::spawn(async move {
      while let Ok((stream, _)) = listener.accept().await {
        let handler = handler.clone();
        let log = log.clone();
        tokio::spawn(async move {
          let mut reader = BufReader::new(stream);
          let mut line = String::new();
          if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
            return;
          }
          log.lock().push(line.trim_end().to_string());
          let request: Value = serde_json::from_str(&line).unwrap();
          match handler(&request) {
            Some(reply) => {
              let _ = reader
                .get_mut()
                .write_all(format!("{}\n", reply).as_bytes())
                .await;
              tokio::time::sleep(Duration::from_millis(200)).await;
            }
            None => tokio::time::sleep(Duration::from_secs(10)).await,
          }
        });
      }
    });

    Self {
      _dir: dir,
      path,
      received,
      task,
    }
  }

  /// Answers like MPV: loadfile gets increasing entry ids, the playlist
  /// query gets `playlist`, everything else plain success.
  pub fn mpv_like(playlist: Value) -> Self {
    let next_id = AtomicI64::new(1);
    Self::start(move |request| {
      let name = request["command"][0].as_str().unwrap_or_default();
      let reply = match name {
        "loadfile" => {
          let id = next_id.fetch_add(1, Ordering::SeqCst);
          json!({"data": {"playlist_entry_id": id}, "request_id": 0, "error": "success"})
        }
        "get_property" => json!({"data": playlist, "request_id": 0, "error": "success"}),
        _ => json!({"data": null, "request_id": 0, "error": "success"}),
      };
      Some(reply.to_string())
    })
  }

  /// Command lines received so far.
  pub fn received(&self) -> Vec<String> {
    self.received.lock().clone()
  }

  pub fn client(&self) -> MpvClient {
    self.client_with_timeout(Duration::from_secs(2))
  }

  pub fn client_with_timeout(&self, timeout: Duration) -> MpvClient {
    let options = ClientOptions {
      socket_path: self.path.clone(),
      response_timeout: timeout,
      ..Default::default()
    };
    MpvClient::new(options, Arc::new(StaticMetadata))
  }

  pub fn client_with_metadata(
    &self,
    metadata: Arc<dyn MetadataSource>,
    metadata_timeout: Duration,
  ) -> MpvClient {
    let options = ClientOptions {
      socket_path: self.path.clone(),
      response_timeout: Duration::from_secs(2),
      metadata_timeout,
      ..Default::default()
    };
    MpvClient::new(options, metadata)
  }
}

impl Drop for FakePlayer {
  fn drop(&mut self) {
    self.task.abort();
  }
}

/// Metadata source that derives the title from the URL.
pub struct StaticMetadata;

#[async_trait]
impl MetadataSource for StaticMetadata {
  async fn fetch(&self, url: &str) -> Result<VideoInfo, MetadataError> {
    Ok(VideoInfo {
      title: format!("Title of {}", url),
      thumbnail: format!("{}/thumb.jpg", url),
    })
  }
}

/// Like [`StaticMetadata`], but answers slowly for URLs ending in `slow_suffix`.
pub struct SlowMetadata {
  pub slow_suffix: &'static str,
  pub delay: Duration,
}

#[async_trait]
impl MetadataSource for SlowMetadata {
  async fn fetch(&self, url: &str) -> Result<VideoInfo, MetadataError> {
    if url.ends_with(self.slow_suffix) {
      tokio::time::sleep(self.delay).await;
    }
    StaticMetadata.fetch(url).await
  }
}

/// Metadata source that never answers.
pub struct StalledMetadata;

#[async_trait]
impl MetadataSource for StalledMetadata {
  async fn fetch(&self, _url: &str) -> Result<VideoInfo, MetadataError> {
    std::future::pending().await
  }
}
