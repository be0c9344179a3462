//! Application configuration.
//!
//! Read from `<config dir>/mpv-remote/config.json` (or the file given with
//! `-c`), then overridden by command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mpv::{ipc_path, ClientOptions};

const CONFIG_DIR: &str = "mpv-remote";
const CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Can't read {0}: {1}")]
  Read(PathBuf, #[source] std::io::Error),
  #[error("Can't parse {0}: {1}")]
  Parse(PathBuf, #[source] serde_json::Error),
  #[error("Invalid argument: {0}")]
  Argument(String),
  #[error("{0}")]
  Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
  /// HTTP listen port.
  #[serde(default = "default_port")]
  pub port: u16,

  /// Send a desktop notification for every appended video.
  #[serde(default)]
  pub notify: bool,

  /// Custom MPV executable path (None = auto-detect).
  #[serde(default)]
  pub mpv_path: Option<String>,

  /// Additional MPV command-line arguments.
  #[serde(default)]
  pub mpv_args: Vec<String>,

  /// MPV control socket.
  #[serde(default = "ipc_path")]
  pub socket_path: PathBuf,

  /// How long to wait for one MPV response.
  #[serde(default = "default_response_timeout_ms")]
  pub response_timeout_ms: u64,

  /// Pause after writing a command before the request continues.
  #[serde(default)]
  pub courtesy_delay_ms: u64,

  /// Upper bound on the title/thumbnail lookup after an append.
  #[serde(default = "default_metadata_timeout_ms")]
  pub metadata_timeout_ms: u64,

  /// How long to wait for MPV to create its socket at startup.
  #[serde(default = "default_socket_wait_ms")]
  pub socket_wait_ms: u64,

  /// Video info tool used for titles and thumbnails.
  #[serde(default = "default_metadata_program")]
  pub metadata_program: String,

  /// Desktop notification program.
  #[serde(default = "default_notify_program")]
  pub notify_program: String,

  /// User-Agent allowed on the launcher endpoint.
  #[serde(default = "default_launcher_agent")]
  pub launcher_agent: String,
}

fn default_port() -> u16 {
  5000
}

fn default_response_timeout_ms() -> u64 {
  5000
}

fn default_metadata_timeout_ms() -> u64 {
  30_000
}

fn default_socket_wait_ms() -> u64 {
  3000
}

fn default_metadata_program() -> String {
  "yt-dlp".to_string()
}

fn default_notify_program() -> String {
  "notify-send".to_string()
}

fn default_launcher_agent() -> String {
  "rofi".to_string()
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      port: default_port(),
      notify: false,
      mpv_path: None,
      mpv_args: Vec::new(),
      socket_path: ipc_path(),
      response_timeout_ms: default_response_timeout_ms(),
      courtesy_delay_ms: 0,
      metadata_timeout_ms: default_metadata_timeout_ms(),
      socket_wait_ms: default_socket_wait_ms(),
      metadata_program: default_metadata_program(),
      notify_program: default_notify_program(),
      launcher_agent: default_launcher_agent(),
    }
  }
}

impl AppConfig {
  /// Default config file location.
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
  }

  /// Load a config file. A missing file yields the defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    match std::fs::read_to_string(path) {
      Ok(text) => serde_json::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        log::debug!("No config at {}, using defaults", path.display());
        Ok(Self::default())
      }
      Err(e) => Err(ConfigError::Read(path.to_path_buf(), e)),
    }
  }

  /// Build the configuration from process arguments (without argv[0]).
  ///
  /// Flags: `-c <file>` config file, `-p <port>` listen port, `-n` enable
  /// notifications.
  pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
  where
    I: IntoIterator<Item = String>,
  {
    let args: Vec<String> = args.into_iter().collect();

    let mut config_path = Self::default_path();
    let mut port = None;
    let mut notify = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
      match arg.as_str() {
        "-c" => config_path = Some(PathBuf::from(required(&mut iter, "-c")?)),
        "-p" => {
          let value = required(&mut iter, "-p")?;
          let parsed = value
            .parse::<u16>()
            .map_err(|_| ConfigError::Argument(format!("invalid port: {}", value)))?;
          port = Some(parsed);
        }
        "-n" => notify = true,
        other => return Err(ConfigError::Argument(format!("unknown flag: {}", other))),
      }
    }

    let mut config = match config_path {
      Some(path) => Self::load(&path)?,
      None => Self::default(),
    };
    if let Some(port) = port {
      config.port = port;
    }
    config.notify |= notify;
    config.validate()?;
    Ok(config)
  }

  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.port == 0 {
      return Err(ConfigError::Invalid("Port cannot be 0".to_string()));
    }
    if self.response_timeout_ms == 0 {
      return Err(ConfigError::Invalid(
        "Response timeout must be at least 1ms".to_string(),
      ));
    }
    if self.socket_path.as_os_str().is_empty() {
      return Err(ConfigError::Invalid("Socket path cannot be empty".to_string()));
    }
    if self.metadata_program.trim().is_empty() {
      return Err(ConfigError::Invalid(
        "Metadata program cannot be empty".to_string(),
      ));
    }
    Ok(())
  }

  /// MPV executable override, ignoring blank values.
  pub fn mpv_path(&self) -> Option<PathBuf> {
    self
      .mpv_path
      .as_ref()
      .filter(|s| !s.is_empty())
      .map(PathBuf::from)
  }

  pub fn client_options(&self) -> ClientOptions {
    ClientOptions {
      socket_path: self.socket_path.clone(),
      response_timeout: Duration::from_millis(self.response_timeout_ms),
      courtesy_delay: Duration::from_millis(self.courtesy_delay_ms),
      metadata_timeout: Duration::from_millis(self.metadata_timeout_ms),
    }
  }

  pub fn socket_wait(&self) -> Duration {
    Duration::from_millis(self.socket_wait_ms)
  }
}

fn required(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, ConfigError> {
  iter
    .next()
    .ok_or_else(|| ConfigError::Argument(format!("{} needs a value", flag)))
}
