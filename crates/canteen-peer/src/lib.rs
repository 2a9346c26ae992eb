//! HTTP transport to the sibling canteen service.
//!
//! [`HttpPeer`] implements [`canteen_core::sync::Peer`] against the peer's
//! JSON endpoints:
//!
//! | Call | Request |
//! |------|---------|
//! | `push_counts` | `POST {base}/meal-counts/{date}` with the snapshot |
//! | `push_menu`   | `POST {base}/menu/sync` with the menu |
//! | `fetch_menu`  | `GET {base}/menu/{date}`; 404 means not published |
//!
//! Every request carries the shared peer token in the `x-peer-token` header
//! (empty when none is configured).

use std::time::Duration;

use canteen_core::{
  clock::DATE_FORMAT,
  counts::MealCountSnapshot,
  menu::MenuSnapshot,
  sync::{DEFAULT_PEER_TIMEOUT, PEER_TOKEN_HEADER, Peer, PeerError},
};
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::debug;

/// Connection settings for the peer service.
#[derive(Debug, Clone)]
pub struct PeerConfig {
  /// Base URL of the peer, e.g. `http://admin.internal:5001`. `None`
  /// disables the peer: every call fails with [`PeerError::NotConfigured`].
  pub base_url: Option<String>,
  pub token:    Option<String>,
  pub timeout:  Duration,
}

impl Default for PeerConfig {
  fn default() -> Self { Self { base_url: None, token: None, timeout: DEFAULT_PEER_TIMEOUT } }
}

/// Async HTTP client for the peer service.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpPeer {
  client: Client,
  config: PeerConfig,
}

impl HttpPeer {
  pub fn new(config: PeerConfig) -> Result<Self, PeerError> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| PeerError::Transport(format!("failed to build HTTP client: {e}")))?;
    Ok(Self { client, config })
  }

  pub fn is_configured(&self) -> bool { self.config.base_url.is_some() }

  fn url(&self, path: &str) -> Result<String, PeerError> {
    let base = self.config.base_url.as_deref().ok_or(PeerError::NotConfigured)?;
    Ok(format!("{}{}", base.trim_end_matches('/'), path))
  }

  /// The header is sent even without a token so the peer can tell service
  /// calls from anonymous ones.
  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    req.header(PEER_TOKEN_HEADER, self.config.token.as_deref().unwrap_or_default())
  }

  async fn send(&self, req: RequestBuilder) -> Result<Response, PeerError> {
    self.auth(req).send().await.map_err(|e| self.transport_error(e))
  }

  fn transport_error(&self, e: reqwest::Error) -> PeerError {
    if e.is_timeout() {
      PeerError::Timeout(self.config.timeout)
    } else {
      PeerError::Transport(e.to_string())
    }
  }
}

fn ensure_success(resp: &Response) -> Result<(), PeerError> {
  let status = resp.status();
  if status.is_success() { Ok(()) } else { Err(PeerError::Status(status.as_u16())) }
}

fn date_segment(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

impl Peer for HttpPeer {
  async fn push_counts<'a>(&'a self, snapshot: &'a MealCountSnapshot) -> Result<(), PeerError> {
    let url = self.url(&format!("/meal-counts/{}", date_segment(snapshot.date)))?;
    let resp = self.send(self.client.post(&url).json(snapshot)).await?;
    ensure_success(&resp)?;
    debug!(%url, "peer accepted meal counts");
    Ok(())
  }

  async fn push_menu<'a>(&'a self, menu: &'a MenuSnapshot) -> Result<(), PeerError> {
    let url = self.url("/menu/sync")?;
    let resp = self.send(self.client.post(&url).json(menu)).await?;
    ensure_success(&resp)?;
    debug!(%url, date = %menu.date, "peer accepted menu");
    Ok(())
  }

  async fn fetch_menu(&self, date: NaiveDate) -> Result<Option<MenuSnapshot>, PeerError> {
    let url = self.url(&format!("/menu/{}", date_segment(date)))?;
    let resp = self.send(self.client.get(&url)).await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    ensure_success(&resp)?;
    let menu = resp
      .json::<MenuSnapshot>()
      .await
      .map_err(|e| PeerError::Decode(e.to_string()))?;
    Ok(Some(menu))
  }
}

#[cfg(test)]
mod tests {
  use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
  };

  use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
  };
  use chrono::DateTime;

  use super::*;

  #[derive(Clone, Default)]
  struct Seen {
    counts: Arc<Mutex<Vec<(String, MealCountSnapshot)>>>,
    menus:  Arc<Mutex<Vec<MenuSnapshot>>>,
    tokens: Arc<Mutex<Vec<Option<String>>>>,
  }

  impl Seen {
    fn token(&self, headers: &HeaderMap) {
      let token = headers
        .get(PEER_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
      self.tokens.lock().unwrap().push(token);
    }
  }

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 6, 10).unwrap() }

  fn menu() -> MenuSnapshot {
    MenuSnapshot {
      date:       date(),
      day:        "Tuesday".into(),
      breakfast:  vec!["Poha".into()],
      lunch:      vec!["Rice".into(), "Dal".into()],
      snacks:     vec![],
      updated_at: DateTime::parse_from_rfc3339("2025-06-09T18:00:00+05:30").unwrap(),
      updated_by: Some("admin-1".into()),
    }
  }

  async fn serve(seen: Seen) -> SocketAddr {
    let app = Router::new()
      .route(
        "/meal-counts/{date}",
        post(
          |State(seen): State<Seen>,
           Path(date): Path<String>,
           headers: HeaderMap,
           Json(snapshot): Json<MealCountSnapshot>| async move {
            seen.token(&headers);
            seen.counts.lock().unwrap().push((date, snapshot));
            Json(serde_json::json!({ "success": true }))
          },
        ),
      )
      .route(
        "/menu/sync",
        post(
          |State(seen): State<Seen>, headers: HeaderMap, Json(menu): Json<MenuSnapshot>| async move {
            seen.token(&headers);
            seen.menus.lock().unwrap().push(menu);
            StatusCode::OK
          },
        ),
      )
      .route(
        "/menu/{date}",
        get(|Path(date): Path<String>| async move {
          match date.as_str() {
            "2025-06-10" => Ok(Json(menu())),
            "2025-06-11" => Err(StatusCode::INTERNAL_SERVER_ERROR),
            _ => Err(StatusCode::NOT_FOUND),
          }
        }),
      )
      .route(
        "/slow/meal-counts/{date}",
        post(|| async {
          tokio::time::sleep(Duration::from_secs(5)).await;
          StatusCode::OK
        }),
      )
      .with_state(seen);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
  }

  fn peer(base: String, timeout: Duration) -> HttpPeer {
    HttpPeer::new(PeerConfig {
      base_url: Some(base),
      token: Some("s3cret".into()),
      timeout,
    })
    .unwrap()
  }

  #[tokio::test]
  async fn push_counts_posts_snapshot_with_token() {
    let seen = Seen::default();
    let addr = serve(seen.clone()).await;
    let peer = peer(format!("http://{addr}/"), DEFAULT_PEER_TIMEOUT);

    let mut snapshot = MealCountSnapshot::zero(date());
    snapshot.lunch_count = 4;
    snapshot.total_employees = 5;
    peer.push_counts(&snapshot).await.unwrap();

    let counts = seen.counts.lock().unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].0, "2025-06-10");
    assert_eq!(counts[0].1, snapshot);
    assert_eq!(seen.tokens.lock().unwrap()[0].as_deref(), Some("s3cret"));
  }

  #[tokio::test]
  async fn push_menu_posts_to_sync_endpoint() {
    let seen = Seen::default();
    let addr = serve(seen.clone()).await;
    let peer = peer(format!("http://{addr}"), DEFAULT_PEER_TIMEOUT);

    peer.push_menu(&menu()).await.unwrap();
    assert_eq!(seen.menus.lock().unwrap().as_slice(), &[menu()]);
  }

  #[tokio::test]
  async fn fetch_menu_decodes_found_and_maps_404_to_none() {
    let addr = serve(Seen::default()).await;
    let peer = peer(format!("http://{addr}"), DEFAULT_PEER_TIMEOUT);

    assert_eq!(peer.fetch_menu(date()).await.unwrap(), Some(menu()));

    let missing = NaiveDate::from_ymd_opt(2025, 6, 12).unwrap();
    assert_eq!(peer.fetch_menu(missing).await.unwrap(), None);
  }

  #[tokio::test]
  async fn server_error_is_status() {
    let addr = serve(Seen::default()).await;
    let peer = peer(format!("http://{addr}"), DEFAULT_PEER_TIMEOUT);

    let failing = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
    let err = peer.fetch_menu(failing).await.unwrap_err();
    assert!(matches!(err, PeerError::Status(500)));
  }

  #[tokio::test]
  async fn slow_peer_times_out() {
    let addr = serve(Seen::default()).await;
    let peer = peer(format!("http://{addr}/slow"), Duration::from_millis(100));

    let err = peer.push_counts(&MealCountSnapshot::zero(date())).await.unwrap_err();
    assert!(matches!(err, PeerError::Timeout(_)));
  }

  #[tokio::test]
  async fn unreachable_peer_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let peer = peer(format!("http://{addr}"), DEFAULT_PEER_TIMEOUT);
    let err = peer.push_menu(&menu()).await.unwrap_err();
    assert!(matches!(err, PeerError::Transport(_)));
  }

  #[tokio::test]
  async fn unconfigured_peer_fails_fast() {
    let peer = HttpPeer::new(PeerConfig::default()).unwrap();
    assert!(!peer.is_configured());
    let err = peer.fetch_menu(date()).await.unwrap_err();
    assert!(matches!(err, PeerError::NotConfigured));
  }
}
