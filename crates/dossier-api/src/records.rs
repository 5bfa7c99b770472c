//! Handlers for the record endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/view-all` | Names of all stored records |
//! | `GET`  | `/view/{name}` | Record JSON plus images as data URIs; 404 if incomplete |
//! | `POST` | `/save` | Multipart: `data` (JSON object), optional `profile`, `cover` |

use axum::{
  Json,
  extract::{
    Path, State,
    multipart::{Multipart, MultipartRejection},
  },
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::Utc;
use dossier_core::{
  record::{Image, ImageSlot, RecordName, StoredRecord},
  store::{RecordStore, SaveOutcome},
};
use serde::Serialize;
use serde_json::Value;

use crate::{AppState, error::ApiError, form::SaveForm};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ListResponse {
  pub message: &'static str,
  pub data:    Vec<String>,
}

/// `GET /view-all`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<ListResponse>, ApiError>
where
  S: RecordStore,
{
  let names = state.store.list().await.map_err(ApiError::store)?;
  Ok(Json(ListResponse { message: "view-all", data: names }))
}

// ─── View ─────────────────────────────────────────────────────────────────────

/// A stored record prepared for transport.
///
/// Missing images are serialised as `""`, never `null`.
#[derive(Debug, Serialize)]
pub struct RecordView {
  pub profile: String,
  pub cover:   String,
  pub data:    Value,
}

impl From<StoredRecord> for RecordView {
  fn from(record: StoredRecord) -> Self {
    let uri = |slot: ImageSlot| record.image(slot).map(data_uri).unwrap_or_default();
    RecordView {
      profile: uri(ImageSlot::Profile),
      cover:   uri(ImageSlot::Cover),
      data:    record.data,
    }
  }
}

/// `data:image/{subtype};base64,{bytes}`
pub fn data_uri(image: &Image) -> String {
  format!("data:{};base64,{}", image.mime_type(), B64.encode(&image.bytes))
}

/// `GET /view/{name}`
pub async fn view_one<S>(
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
) -> Result<Json<RecordView>, ApiError>
where
  S: RecordStore,
{
  let name = RecordName::parse(name)
    .map_err(|_| ApiError::BadRequest("invalid name".to_owned()))?;

  let record = state
    .store
    .get(&name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("record {name} not found")))?;
  Ok(Json(RecordView::from(record)))
}

/// `GET /view` and `GET /view/` — a request without a name.
pub async fn view_without_name() -> ApiError {
  ApiError::BadRequest("invalid name".to_owned())
}

// ─── Save ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SaveResponse {
  pub message: &'static str,
  pub name:    RecordName,
}

/// `POST /save` — multipart form; returns the name the record was stored
/// under.
pub async fn save<S>(
  State(state): State<AppState<S>>,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SaveResponse>, ApiError>
where
  S: RecordStore,
{
  let multipart = multipart
    .map_err(|_| ApiError::BadRequest("form data required".to_owned()))?;
  let record = SaveForm::read(multipart).await?.into_new_record(Utc::now())?;

  match state.store.save(record).await.map_err(ApiError::store)? {
    SaveOutcome::Saved(name) => {
      tracing::info!(%name, "record saved");
      Ok(Json(SaveResponse { message: "save success", name }))
    }
    SaveOutcome::AlreadyExists(name) => {
      Err(ApiError::Conflict(format!("record {name} already exists")))
    }
  }
}
