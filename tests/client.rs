mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakePlayer, SlowMetadata, StalledMetadata};
use mpv_remote::mpv::{ControlError, DecodeError, Direction, IpcError, Response};
use mpv_remote::notify::Notifier;
use serde_json::json;

const URL: &str = "https://example.com/v/1";

fn current_count(client: &mpv_remote::mpv::MpvClient) -> usize {
  client.playlist().iter().filter(|e| e.current).count()
}

#[tokio::test]
async fn append_success_adds_entry() {
  let player = FakePlayer::start(|_| {
    Some(r#"{"data":{"playlist_entry_id":4},"request_id":0,"error":"success"}"#.to_string())
  });
  let (notifier, notifications) = Notifier::channel();
  let client = player.client().with_notifier(notifier);

  let response = client.append(URL).await.unwrap().settled().await.unwrap();
  match response {
    Response::CommandResult(r) => assert_eq!(r.entry_id(), Some(4)),
    other => panic!("Expected command result, got {:?}", other),
  }

  let playlist = client.playlist();
  assert_eq!(playlist.len(), 1);
  assert_eq!(playlist[0].filename, URL);
  assert_eq!(playlist[0].id, 4);
  assert_eq!(playlist[0].title, format!("Title of {}", URL));
  assert_eq!(notifications.try_recv().unwrap(), "vid #4 just added");

  assert_eq!(
    player.received(),
    vec![format!(
      "{{\"async\":true,\"command\":[\"loadfile\",\"{}\",\"append-play\"]}}",
      URL
    )]
  );
}

#[tokio::test]
async fn append_failure_leaves_playlist_unchanged() {
  let player = FakePlayer::start(|_| {
    Some(r#"{"request_id":0,"error":"loading failed"}"#.to_string())
  });
  let (notifier, notifications) = Notifier::channel();
  let client = player.client().with_notifier(notifier);

  let response = client.append(URL).await.unwrap().settled().await.unwrap();
  assert!(!response.is_success());
  assert_eq!(client.playlist_len(), 0);
  assert!(notifications.try_recv().is_err());
}

/// Answers loadfile for `.../v/<n>` with entry id `n + 1`, as MPV would for
/// URLs appended in that order, and reports the first entry as current.
fn numbered_player() -> FakePlayer {
  FakePlayer::start(|request| {
    let reply = match request["command"][0].as_str().unwrap_or_default() {
      "loadfile" => {
        let url = request["command"][1].as_str().unwrap_or_default();
        let n: i64 = url.rsplit('/').next().unwrap().parse().unwrap();
        json!({"data": {"playlist_entry_id": n + 1}, "request_id": 0, "error": "success"})
      }
      "get_property" => json!({
        "data": [{"id": 1, "current": true, "playing": true}, {"id": 2}, {"id": 3}],
        "request_id": 0,
        "error": "success"
      }),
      _ => json!({"data": null, "request_id": 0, "error": "success"}),
    };
    Some(reply.to_string())
  })
}

#[tokio::test]
async fn concurrent_appends_all_land() {
  let player = numbered_player();
  let client = player.client();

  let mut pending = Vec::new();
  for i in 0..5 {
    pending.push(
      client
        .append(&format!("https://example.com/v/{}", i))
        .await
        .unwrap(),
    );
  }
  for reply in pending {
    assert!(reply.settled().await.unwrap().is_success());
  }

  let filenames: Vec<_> = client.playlist().into_iter().map(|e| e.filename).collect();
  let expected: Vec<_> = (0..5).map(|i| format!("https://example.com/v/{}", i)).collect();
  assert_eq!(filenames, expected);
}

#[tokio::test]
async fn slow_metadata_keeps_append_order() {
  let player = numbered_player();
  let metadata = Arc::new(SlowMetadata {
    slow_suffix: "/v/0",
    delay: Duration::from_millis(300),
  });
  let client = player.client_with_metadata(metadata, Duration::from_secs(2));

  let mut pending = Vec::new();
  for i in 0..3 {
    let url = format!("https://example.com/v/{}", i);
    pending.push(client.append(&url).await.unwrap());
  }
  for reply in pending {
    reply.settled().await.unwrap();
  }

  let entries = client.refresh_playlist().await.unwrap();
  let filenames: Vec<_> = entries.iter().map(|e| e.filename.as_str()).collect();
  assert_eq!(
    filenames,
    [
      "https://example.com/v/0",
      "https://example.com/v/1",
      "https://example.com/v/2"
    ]
  );
  assert!(entries[0].current);
  assert_eq!(entries[0].title, "Title of https://example.com/v/0");
  assert_eq!(current_count(&client), 1);
}

#[tokio::test]
async fn entry_is_listed_before_metadata_arrives() {
  let player = numbered_player();
  let client = player.client_with_metadata(Arc::new(StalledMetadata), Duration::from_secs(5));

  let url = "https://example.com/v/0";
  let response = client.append(url).await.unwrap().wait().await.unwrap();
  assert!(response.is_success());
  let playlist = client.playlist();
  assert_eq!(playlist.len(), 1);
  assert_eq!(playlist[0].filename, url);
  assert_eq!(playlist[0].id, 1);
}

#[tokio::test]
async fn metadata_lookup_times_out() {
  let player = numbered_player();
  let client = player.client_with_metadata(Arc::new(StalledMetadata), Duration::from_millis(100));

  let url = "https://example.com/v/0";
  let settled = tokio::time::timeout(
    Duration::from_secs(2),
    client.append(url).await.unwrap().settled(),
  )
  .await
  .expect("append should settle once the lookup times out");
  assert!(settled.unwrap().is_success());

  let playlist = client.playlist();
  assert_eq!(playlist.len(), 1);
  assert_eq!(playlist[0].filename, url);
  assert_eq!(playlist[0].title, "");
}

#[tokio::test]
async fn playlist_query_moves_current_marker() {
  let player = FakePlayer::mpv_like(json!([
    {"id": 0, "current": false},
    {"id": 1, "current": true, "playing": true}
  ]));
  let client = player.client();
  for i in 0..2 {
    let url = format!("https://example.com/v/{}", i);
    client.append(&url).await.unwrap().settled().await.unwrap();
  }

  let entries = client.refresh_playlist().await.unwrap();
  assert_eq!(entries.len(), 2);
  assert!(!entries[0].current);
  assert!(entries[1].current);
  assert!(entries[1].playing);
  assert_eq!(current_count(&client), 1);
}

#[tokio::test]
async fn playlist_query_with_longer_remote_playlist() {
  let player = FakePlayer::mpv_like(json!([
    {"id": 0, "current": false},
    {"id": 1, "current": false},
    {"id": 2, "current": true}
  ]));
  let client = player.client();
  client.append(URL).await.unwrap().settled().await.unwrap();

  client.refresh_playlist().await.unwrap();
  assert_eq!(client.playlist_len(), 1);
  assert_eq!(current_count(&client), 0);
}

#[tokio::test]
async fn play_index_out_of_range_never_writes() {
  let player = FakePlayer::mpv_like(json!([]));
  let client = player.client();

  let result = client.play_index(0).await;
  assert!(matches!(result, Err(ControlError::Validation(_))));
  tokio::time::sleep(Duration::from_millis(50)).await;
  assert!(player.received().is_empty());
}

#[tokio::test]
async fn play_index_in_range_is_sent() {
  let player = FakePlayer::mpv_like(json!([]));
  let client = player.client();
  client.append(URL).await.unwrap().settled().await.unwrap();

  let response = client.play_index(0).await.unwrap().wait().await.unwrap();
  assert!(response.is_success());
  assert_eq!(
    player.received().last().unwrap(),
    "{\"command\":[\"playlist-play-index\",\"0\"]}"
  );
}

#[tokio::test]
async fn controls_send_expected_commands() {
  let player = FakePlayer::mpv_like(json!([]));
  let client = player.client();

  client.toggle_pause().await.unwrap().wait().await.unwrap();
  client.step(Direction::Next).await.unwrap().wait().await.unwrap();
  client.step(Direction::Previous).await.unwrap().wait().await.unwrap();

  assert_eq!(
    player.received(),
    vec![
      "{\"command\":[\"cycle\",\"pause\"]}",
      "{\"command\":[\"playlist-next\"]}",
      "{\"command\":[\"playlist-prev\"]}",
    ]
  );
}

#[tokio::test]
async fn response_timeout_reports_and_does_not_mutate() {
  let player = FakePlayer::start(|_| None);
  let client = player.client_with_timeout(Duration::from_millis(100));

  let result = client.append(URL).await.unwrap().settled().await;
  assert!(matches!(result, Err(ControlError::Ipc(IpcError::Timeout))));
  assert_eq!(client.playlist_len(), 0);

  let result = client.refresh_playlist().await;
  assert!(matches!(result, Err(ControlError::Ipc(IpcError::Timeout))));
}

#[tokio::test]
async fn event_instead_of_response_is_a_decode_error() {
  let player = FakePlayer::start(|_| Some(r#"{"event":"start-file","playlist_entry_id":1}"#.to_string()));
  let client = player.client();

  let result = client.append(URL).await.unwrap().settled().await;
  assert!(matches!(
    result,
    Err(ControlError::Ipc(IpcError::Decode(DecodeError::UnexpectedEvent(_))))
  ));
  assert_eq!(client.playlist_len(), 0);
}

#[tokio::test]
async fn missing_socket_is_a_connect_error() {
  let player = FakePlayer::mpv_like(json!([]));
  let client = player.client();
  std::fs::remove_file(&player.path).unwrap();

  let result = client.append(URL).await;
  assert!(matches!(result, Err(ControlError::Ipc(IpcError::Connect(_)))));
  assert_eq!(client.playlist_len(), 0);
}
