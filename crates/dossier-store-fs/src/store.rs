//! [`FsStore`] — the filesystem implementation of [`RecordStore`].

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Arc,
};

use dossier_core::{
  record::{Image, ImageSlot, NewRecord, RecordName, StoredRecord},
  store::{RecordStore, SaveOutcome},
};
use tokio::fs;
use uuid::Uuid;

use crate::{Error, Result};

/// Name of the JSON document inside every record directory.
pub const DATA_FILE: &str = "data.json";

const STAGING_SUFFIX: &str = ".partial";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Dossier record store rooted at a single directory.
///
/// Cloning is cheap — the root path is reference-counted.
#[derive(Debug, Clone)]
pub struct FsStore {
  root: Arc<Path>,
}

impl FsStore {
  /// Open (or create) a store at `root`.
  ///
  /// Staging directories left behind by interrupted saves are removed.
  pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
    let root: PathBuf = root.into();
    let store = Self { root: Arc::from(root) };
    store.ensure_root().await?;

    let swept = store.sweep_staging().await?;
    if swept > 0 {
      tracing::info!(
        swept,
        root = %store.root.display(),
        "removed stale staging directories"
      );
    }
    Ok(store)
  }

  pub fn root(&self) -> &Path { &self.root }

  async fn ensure_root(&self) -> Result<()> {
    fs::create_dir_all(&*self.root).await?;
    Ok(())
  }

  async fn sweep_staging(&self) -> Result<usize> {
    let mut entries = fs::read_dir(&*self.root).await?;
    let mut swept = 0;
    while let Some(entry) = entries.next_entry().await? {
      let Ok(name) = entry.file_name().into_string() else { continue };
      if is_staging_name(&name) && entry.file_type().await?.is_dir() {
        fs::remove_dir_all(entry.path()).await?;
        swept += 1;
      }
    }
    Ok(swept)
  }

  async fn write_contents(dir: &Path, record: &NewRecord) -> Result<()> {
    let json = serde_json::to_vec(&record.data)?;
    fs::write(dir.join(DATA_FILE), json).await?;

    for slot in ImageSlot::ALL {
      if let Some(image) = record.image(slot) {
        fs::write(dir.join(slot.file_name(&image.subtype)), &image.bytes)
          .await?;
      }
    }
    Ok(())
  }

  /// Sorted names of the regular entries (non-directories) in `dir`.
  async fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
      if entry.file_type().await?.is_dir() {
        continue;
      }
      if let Ok(name) = entry.file_name().into_string() {
        names.push(name);
      }
    }
    names.sort();
    Ok(names)
  }

  /// Load the lexically first file in `slot`, if any.
  ///
  /// The subtype is recovered from the text after the last `.` of the file
  /// name.
  async fn read_image(
    dir: &Path,
    files: &[String],
    slot: ImageSlot,
  ) -> Result<Option<Image>> {
    let prefix = slot.file_prefix();
    let Some(file) = files.iter().find(|f| f.starts_with(&prefix)) else {
      return Ok(None);
    };
    let subtype = file.rsplit('.').next().unwrap_or_default().to_owned();
    let bytes = fs::read(dir.join(file)).await?;
    Ok(Some(Image { subtype, bytes }))
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for FsStore {
  type Error = Error;

  async fn list(&self) -> Result<Vec<String>> {
    self.ensure_root().await?;

    let mut entries = fs::read_dir(&*self.root).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
      let Ok(name) = entry.file_name().into_string() else { continue };
      if name.starts_with('.') {
        continue;
      }
      // Follows symlinks, like a plain stat.
      if fs::metadata(entry.path()).await?.is_dir() {
        names.push(name);
      }
    }
    names.sort();
    Ok(names)
  }

  async fn get<'a>(&'a self, name: &'a RecordName) -> Result<Option<StoredRecord>> {
    let dir = self.root.join(name.as_str());

    // A directory without data.json is not (yet) a record. A name too long
    // for the filesystem cannot exist either.
    let json = match fs::read(dir.join(DATA_FILE)).await {
      Ok(json) => json,
      Err(e)
        if matches!(
          e.kind(),
          ErrorKind::NotFound
            | ErrorKind::NotADirectory
            | ErrorKind::InvalidFilename
        ) =>
      {
        return Ok(None);
      }
      Err(e) => return Err(e.into()),
    };

    let files = Self::file_names(&dir).await?;
    let profile = Self::read_image(&dir, &files, ImageSlot::Profile).await?;
    let cover = Self::read_image(&dir, &files, ImageSlot::Cover).await?;

    Ok(Some(StoredRecord {
      name: name.clone(),
      data: serde_json::from_slice(&json)?,
      profile,
      cover,
    }))
  }

  async fn save(&self, record: NewRecord) -> Result<SaveOutcome> {
    self.ensure_root().await?;

    let target = self.root.join(record.name.as_str());
    if fs::try_exists(&target).await? {
      return Ok(SaveOutcome::AlreadyExists(record.name));
    }

    let staging = self.root.join(staging_name());
    fs::create_dir(&staging).await?;

    if let Err(e) = Self::write_contents(&staging, &record).await {
      discard(&staging).await;
      return Err(e);
    }

    match fs::rename(&staging, &target).await {
      Ok(()) => Ok(SaveOutcome::Saved(record.name)),
      // Lost a race against a concurrent save of the same name.
      Err(e)
        if matches!(
          e.kind(),
          ErrorKind::AlreadyExists | ErrorKind::DirectoryNotEmpty
        ) =>
      {
        discard(&staging).await;
        Ok(SaveOutcome::AlreadyExists(record.name))
      }
      Err(e) => {
        discard(&staging).await;
        Err(e.into())
      }
    }
  }
}

// ─── Staging helpers ─────────────────────────────────────────────────────────

/// `.{uuid}.partial`; independent of the record name so it never runs into
/// the filesystem's name length limit before the final name does.
fn staging_name() -> String {
  format!(".{}{STAGING_SUFFIX}", Uuid::new_v4().simple())
}

fn is_staging_name(name: &str) -> bool {
  name.starts_with('.') && name.ends_with(STAGING_SUFFIX)
}

async fn discard(staging: &Path) {
  if let Err(e) = fs::remove_dir_all(staging).await {
    tracing::warn!(
      dir = %staging.display(),
      error = %e,
      "failed to remove staging directory"
    );
  }
}
