//! HTTP surface for Dossier.
//!
//! Exposes an axum [`Router`] backed by any [`RecordStore`]: a liveness
//! endpoint, record listing, record retrieval and multipart record upload.

pub mod error;
pub mod form;
pub mod records;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use dossier_core::store::RecordStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration. Missing keys fall back to [`Default`].
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  /// Directory holding one subdirectory per record.
  pub storage_root:     PathBuf,
  /// Upper bound on a `POST /save` request body.
  pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "0.0.0.0".to_owned(),
      port:             3000,
      storage_root:     PathBuf::from("data"),
      max_upload_bytes: 16 * 1024 * 1024,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: RecordStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + Clone + 'static,
{
  let body_limit = state.config.max_upload_bytes;

  Router::new()
    .route("/",             get(root))
    .route("/view-all",     get(records::list::<S>))
    .route("/view",         get(records::view_without_name))
    .route("/view/",        get(records::view_without_name))
    .route("/view/{name}",  get(records::view_one::<S>))
    .route("/save",         post(records::save::<S>))
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::very_permissive())
    .with_state(state)
}

/// `GET /`
async fn root() -> &'static str { "Server Running ok" }

// ─── Integration tests ────────────────────────────────────────────────────────
