//! Records, record names and attached images.
//!
//! A record is an arbitrary JSON object. Only `firstname` and `lastname` are
//! interpreted: together with the save instant they form the [`RecordName`]
//! under which the record is stored.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// The JSON object submitted by a client.
pub type Record = Map<String, Value>;

/// Field stamped onto every record at save time.
pub const CREATE_DATE_FIELD: &str = "create_date";

// ─── Record name ─────────────────────────────────────────────────────────────

/// The directory name of a stored record.
///
/// Always a single path segment: non-empty, free of separators and NUL, and
/// not starting with `.` (dot-names are reserved for store internals).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordName(String);

impl RecordName {
  /// Validate an externally supplied name, e.g. a URL path segment.
  pub fn parse(name: impl Into<String>) -> Result<Self> {
    let name = name.into();
    let valid = !name.is_empty()
      && !name.starts_with('.')
      && !name.contains(['/', '\\', '\0']);
    if valid { Ok(Self(name)) } else { Err(Error::InvalidName(name)) }
  }

  /// Derive `{firstname}-{lastname}-{YYYY-MM-DD}-{h}-{m}-{s}` for `at`.
  pub fn derive(record: &Record, at: DateTime<Utc>) -> Result<Self> {
    let firstname = string_field(record, "firstname")?;
    let lastname = string_field(record, "lastname")?;
    Self::parse(format!(
      "{firstname}-{lastname}-{}-{}-{}-{}",
      at.format("%Y-%m-%d"),
      at.hour(),
      at.minute(),
      at.second(),
    ))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RecordName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

fn string_field<'a>(record: &'a Record, field: &'static str) -> Result<&'a str> {
  record
    .get(field)
    .and_then(Value::as_str)
    .ok_or(Error::MissingField(field))
}

// ─── Images ──────────────────────────────────────────────────────────────────

/// The two image slots a record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
  Profile,
  Cover,
}

impl ImageSlot {
  pub const ALL: [ImageSlot; 2] = [ImageSlot::Profile, ImageSlot::Cover];

  /// Form field name and file name stem, e.g. `profile`.
  pub fn as_str(self) -> &'static str {
    match self {
      ImageSlot::Profile => "profile",
      ImageSlot::Cover => "cover",
    }
  }

  pub fn from_field(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|slot| slot.as_str() == name)
  }

  /// File name for an image of `subtype` in this slot, e.g. `cover.jpeg`.
  pub fn file_name(self, subtype: &str) -> String {
    format!("{}.{subtype}", self.as_str())
  }

  /// Prefix shared by every file stored in this slot, e.g. `cover.`.
  pub fn file_prefix(self) -> String { format!("{}.", self.as_str()) }
}

/// Image bytes together with the MIME subtype they were uploaded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
  /// The part after `image/`, e.g. `png` or `svg+xml`.
  pub subtype: String,
  pub bytes:   Vec<u8>,
}

impl Image {
  /// Accept an upload for `slot` if its declared content type is `image/*`.
  pub fn from_upload(
    slot: ImageSlot,
    content_type: Option<&str>,
    bytes: Vec<u8>,
  ) -> Result<Self> {
    let declared = content_type.unwrap_or_default();
    let not_an_image = || Error::NotAnImage {
      slot:         slot.as_str(),
      content_type: declared.to_owned(),
    };

    let subtype = declared
      .strip_prefix("image/")
      .map(|rest| rest.split(';').next().unwrap_or_default().trim())
      .filter(|subtype| is_valid_subtype(subtype))
      .ok_or_else(not_an_image)?;

    Ok(Self { subtype: subtype.to_owned(), bytes })
  }

  /// The declared MIME type, e.g. `image/png`.
  pub fn mime_type(&self) -> String { format!("image/{}", self.subtype) }
}

fn is_valid_subtype(subtype: &str) -> bool {
  !subtype.is_empty()
    && subtype
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

// ─── Save input / read output ────────────────────────────────────────────────

/// A validated record ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewRecord {
  pub name:    RecordName,
  /// The submitted record, already stamped with `create_date`.
  pub data:    Record,
  pub profile: Option<Image>,
  pub cover:   Option<Image>,
}

impl NewRecord {
  /// Stamp `data` with `now` and derive its name from the same instant.
  pub fn prepare(
    mut data: Record,
    profile: Option<Image>,
    cover: Option<Image>,
    now: DateTime<Utc>,
  ) -> Result<Self> {
    let name = RecordName::derive(&data, now)?;
    data.insert(
      CREATE_DATE_FIELD.to_owned(),
      Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Ok(Self { name, data, profile, cover })
  }

  pub fn image(&self, slot: ImageSlot) -> Option<&Image> {
    match slot {
      ImageSlot::Profile => self.profile.as_ref(),
      ImageSlot::Cover => self.cover.as_ref(),
    }
  }
}

/// A record as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
  pub name:    RecordName,
  pub data:    Value,
  pub profile: Option<Image>,
  pub cover:   Option<Image>,
}

impl StoredRecord {
  pub fn image(&self, slot: ImageSlot) -> Option<&Image> {
    match slot {
      ImageSlot::Profile => self.profile.as_ref(),
      ImageSlot::Cover => self.cover.as_ref(),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;

  fn record(value: Value) -> Record {
    match value {
      Value::Object(map) => map,
      other => panic!("not an object: {other}"),
    }
  }

  #[test]
  fn derive_uses_unpadded_time_parts() {
    let at = Utc.with_ymd_and_hms(2024, 3, 5, 9, 7, 3).unwrap();
    let data = record(json!({ "firstname": "Ada", "lastname": "Lovelace" }));
    let name = RecordName::derive(&data, at).unwrap();
    assert_eq!(name.as_str(), "Ada-Lovelace-2024-03-05-9-7-3");
  }

  #[test]
  fn derive_requires_string_name_fields() {
    let at = Utc::now();
    let missing = record(json!({ "firstname": "Ada" }));
    assert!(matches!(
      RecordName::derive(&missing, at),
      Err(Error::MissingField("lastname"))
    ));

    let numeric = record(json!({ "firstname": 1, "lastname": "Lovelace" }));
    assert!(matches!(
      RecordName::derive(&numeric, at),
      Err(Error::MissingField("firstname"))
    ));
  }

  #[test]
  fn derive_rejects_separators_in_name_fields() {
    let data = record(json!({ "firstname": "../etc", "lastname": "x" }));
    assert!(matches!(
      RecordName::derive(&data, Utc::now()),
      Err(Error::InvalidName(_))
    ));
  }

  #[test]
  fn parse_rejects_unsafe_segments() {
    for bad in ["", ".", "..", ".hidden", "a/b", "a\\b", "nul\0"] {
      assert!(RecordName::parse(bad).is_err(), "{bad:?} should be rejected");
    }
    assert!(RecordName::parse("Ada-Lovelace-2024-03-05-9-7-3").is_ok());
  }

  #[test]
  fn prepare_stamps_create_date_from_the_same_instant() {
    let at = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 58).unwrap();
    let data = record(json!({ "firstname": "Grace", "lastname": "Hopper" }));
    let new = NewRecord::prepare(data, None, None, at).unwrap();
    assert_eq!(new.name.as_str(), "Grace-Hopper-2024-12-31-23-59-58");
    assert_eq!(new.data[CREATE_DATE_FIELD], json!("2024-12-31T23:59:58.000Z"));
  }

  #[test]
  fn image_accepts_image_types_only() {
    let png =
      Image::from_upload(ImageSlot::Profile, Some("image/png"), vec![1, 2])
        .unwrap();
    assert_eq!(png.subtype, "png");
    assert_eq!(png.mime_type(), "image/png");

    let svg = Image::from_upload(
      ImageSlot::Cover,
      Some("image/svg+xml; charset=utf-8"),
      vec![],
    )
    .unwrap();
    assert_eq!(svg.subtype, "svg+xml");

    for bad in [None, Some("text/plain"), Some("image/"), Some("image/../x")] {
      assert!(
        Image::from_upload(ImageSlot::Cover, bad, vec![]).is_err(),
        "{bad:?} should be rejected"
      );
    }
  }

  #[test]
  fn slot_file_names() {
    assert_eq!(ImageSlot::Profile.file_name("png"), "profile.png");
    assert_eq!(ImageSlot::Cover.file_prefix(), "cover.");
    assert_eq!(ImageSlot::from_field("cover"), Some(ImageSlot::Cover));
    assert_eq!(ImageSlot::from_field("data"), None);
  }
}
