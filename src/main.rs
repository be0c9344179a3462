use mpv_remote::{AppConfig, StartupError};

#[tokio::main]
async fn main() {
  let mut clog = colog::default_builder();
  clog.filter_level(log::LevelFilter::Info);
  clog.parse_default_env();
  clog.init();

  let result = match AppConfig::from_args(std::env::args().skip(1)) {
    Ok(config) => mpv_remote::run(config).await,
    Err(e) => Err(StartupError::from(e)),
  };

  if let Err(e) = result {
    log::error!("{}", e);
    std::process::exit(1);
  }
}
