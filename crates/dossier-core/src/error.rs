//! Error types for `dossier-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("record is missing string field {0:?}")]
  MissingField(&'static str),

  #[error("invalid record name: {0:?}")]
  InvalidName(String),

  #[error("{slot} file is not an image: {content_type:?}")]
  NotAnImage {
    slot:         &'static str,
    content_type: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
