//! Filesystem storage backend for Dossier.
//!
//! Every record lives in its own directory below a storage root:
//!
//! ```text
//! data/
//!   Ada-Lovelace-2024-03-05-9-7-3/
//!     data.json
//!     profile.png
//!     cover.jpeg
//! ```
//!
//! Saves are written into a hidden staging directory and renamed into place
//! once complete, so readers never see a half-written record.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{DATA_FILE, FsStore};
