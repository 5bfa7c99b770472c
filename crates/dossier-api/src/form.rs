//! Decoding of the `POST /save` multipart form.
//!
//! The whole form is buffered and validated before anything touches the
//! store, so a rejected submission never leaves files behind.

use axum::{
  extract::multipart::{Multipart, MultipartError},
  http::StatusCode,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dossier_core::record::{Image, ImageSlot, NewRecord, Record};
use serde_json::Value;

use crate::error::ApiError;

/// Form field carrying the record as a JSON object.
pub const DATA_FIELD: &str = "data";

/// A file part as received, before any validation.
#[derive(Debug, Clone)]
pub struct Upload {
  pub file_name:    Option<String>,
  pub content_type: Option<String>,
  pub bytes:        Bytes,
}

impl Upload {
  /// Browsers submit an empty file input as a nameless, empty part.
  fn is_blank(&self) -> bool {
    self.bytes.is_empty() && self.file_name.as_deref().unwrap_or_default().is_empty()
  }

  fn into_image(self, slot: ImageSlot) -> dossier_core::Result<Image> {
    Image::from_upload(slot, self.content_type.as_deref(), self.bytes.to_vec())
  }
}

/// The buffered contents of a save form.
#[derive(Debug, Default)]
pub struct SaveForm {
  pub data:    Option<String>,
  pub profile: Option<Upload>,
  pub cover:   Option<Upload>,
}

impl SaveForm {
  /// Drain `multipart`. Unknown fields are skipped; repeated fields keep the
  /// last occurrence.
  pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
    let mut form = Self::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
      let Some(name) = field.name().map(str::to_owned) else { continue };

      if name == DATA_FIELD {
        form.data = Some(field.text().await.map_err(multipart_error)?);
        continue;
      }

      let Some(slot) = ImageSlot::from_field(&name) else {
        tracing::debug!(field = %name, "ignoring unknown form field");
        continue;
      };

      let upload = Upload {
        file_name:    field.file_name().map(str::to_owned),
        content_type: field.content_type().map(str::to_owned),
        bytes:        field.bytes().await.map_err(multipart_error)?,
      };
      if !upload.is_blank() {
        *form.upload_mut(slot) = Some(upload);
      }
    }

    Ok(form)
  }

  fn upload_mut(&mut self, slot: ImageSlot) -> &mut Option<Upload> {
    match slot {
      ImageSlot::Profile => &mut self.profile,
      ImageSlot::Cover => &mut self.cover,
    }
  }

  /// Validate the form and turn it into a record stamped with `now`.
  pub fn into_new_record(self, now: DateTime<Utc>) -> Result<NewRecord, ApiError> {
    let data = self
      .data
      .ok_or_else(|| ApiError::BadRequest("form missing data".to_owned()))?;
    let record = parse_record(&data)?;

    let profile = self
      .profile
      .map(|u| u.into_image(ImageSlot::Profile))
      .transpose()?;
    let cover = self
      .cover
      .map(|u| u.into_image(ImageSlot::Cover))
      .transpose()?;

    Ok(NewRecord::prepare(record, profile, cover, now)?)
  }
}

fn parse_record(data: &str) -> Result<Record, ApiError> {
  match serde_json::from_str::<Value>(data) {
    Ok(Value::Object(record)) => Ok(record),
    Ok(_) => Err(ApiError::BadRequest(
      "data must be a JSON object".to_owned(),
    )),
    Err(e) => Err(ApiError::BadRequest(format!("data is not valid JSON: {e}"))),
  }
}

fn multipart_error(e: MultipartError) -> ApiError {
  if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
    ApiError::PayloadTooLarge(e.body_text())
  } else {
    ApiError::BadRequest(format!("malformed form data: {}", e.body_text()))
  }
}
