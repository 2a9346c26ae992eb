//! Request authentication.
//!
//! Staff requests carry `Authorization: Bearer <token>`, resolved through the
//! configured [`IdentityDirectory`](canteen_core::identity::IdentityDirectory).
//! Service-to-service requests carry the shared secret in `x-peer-token`.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use canteen_core::{identity::Identity, store::CanteenStore, sync::{PEER_TOKEN_HEADER, Peer}};

use crate::{AppState, error::ApiError};

/// The authenticated staff member making the request.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

/// Marker: the request came from the sibling service.
#[derive(Debug, Clone, Copy)]
pub struct PeerAuthenticated;

/// Either a staff member or the sibling service, for read routes the peer
/// also calls.
#[derive(Debug, Clone)]
pub enum Reader {
  Staff(Identity),
  Peer,
}

/// An admin-flagged staff member or the sibling service, for routes that
/// expose other people's records.
#[derive(Debug, Clone)]
pub enum Supervisor {
  Admin(Identity),
  Peer,
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// Resolve the bearer token in `headers` to an identity.
pub fn verify_caller<S, P>(headers: &HeaderMap, state: &AppState<S, P>) -> Result<Identity, ApiError> {
  let token = bearer(headers).ok_or(ApiError::Unauthorized)?;
  state.identities.resolve(token).ok_or(ApiError::Unauthorized)
}

/// Check the peer token. With no `peer_token` configured every peer request
/// is refused.
pub fn verify_peer<S, P>(headers: &HeaderMap, state: &AppState<S, P>) -> Result<(), ApiError> {
  let Some(expected) = state.config.peer_token.as_deref().filter(|t| !t.is_empty()) else {
    return Err(ApiError::Forbidden);
  };
  match headers.get(PEER_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
    Some(given) if given == expected => Ok(()),
    _ => Err(ApiError::Forbidden),
  }
}

impl<S, P> FromRequestParts<AppState<S, P>> for Caller
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    verify_caller(&parts.headers, state).map(Caller)
  }
}

impl<S, P> FromRequestParts<AppState<S, P>> for PeerAuthenticated
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    verify_peer(&parts.headers, state)?;
    Ok(PeerAuthenticated)
  }
}

impl<S, P> FromRequestParts<AppState<S, P>> for Reader
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  type Rejection = ApiError;

  /// A bearer token takes precedence; otherwise the request must present
  /// the peer header.
  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    if bearer(&parts.headers).is_some() {
      return verify_caller(&parts.headers, state).map(Reader::Staff);
    }
    if parts.headers.contains_key(PEER_TOKEN_HEADER) {
      verify_peer(&parts.headers, state)?;
      return Ok(Reader::Peer);
    }
    Err(ApiError::Unauthorized)
  }
}

impl<S, P> FromRequestParts<AppState<S, P>> for Supervisor
where
  S: CanteenStore + 'static,
  P: Peer + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    if bearer(&parts.headers).is_some() {
      let identity = verify_caller(&parts.headers, state)?;
      return if state.admins.contains(&identity.identity_id) {
        Ok(Supervisor::Admin(identity))
      } else {
        Err(ApiError::Forbidden)
      };
    }
    if parts.headers.contains_key(PEER_TOKEN_HEADER) {
      verify_peer(&parts.headers, state)?;
      return Ok(Supervisor::Peer);
    }
    Err(ApiError::Unauthorized)
  }
}
