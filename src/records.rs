use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::InputError;

pub const IMAGE_URL_COLUMN: &str = "image_url";
pub const IMAGE_HASH_COLUMN: &str = "image_hash";
pub const VIDEO_URL_COLUMN: &str = "video_url";

/// A row of the images table. Other columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageRecord {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_hash: Option<String>,
}

/// A row of the videos table. The identity is computed, never read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VideoRecord {
    #[serde(default)]
    pub video_url: Option<String>,
}

pub fn load_images(path: &Path) -> Result<Vec<ImageRecord>, InputError> {
    load(path, &[IMAGE_URL_COLUMN, IMAGE_HASH_COLUMN])
}

pub fn load_videos(path: &Path) -> Result<Vec<VideoRecord>, InputError> {
    load(path, &[VIDEO_URL_COLUMN])
}

fn load<T: DeserializeOwned>(
    path: &Path,
    required: &[&'static str],
) -> Result<Vec<T>, InputError> {
    let open_err = |source| InputError::Open {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(open_err)?;

    require_columns(&mut reader, path, required)?;

    let mut records = Vec::new();
    let mut skipped = 0_usize;
    for result in reader.deserialize::<T>() {
        match result {
            Ok(record) => records.push(record),
            Err(err) => {
                skipped += 1;
                warn!(
                    path = %path.display(),
                    line = ?err.position().map(|pos| pos.line()),
                    error = %err,
                    "Skipping malformed row"
                );
            }
        }
    }

    debug!(
        path = %path.display(),
        rows = records.len(),
        skipped,
        "Loaded input table"
    );
    Ok(records)
}

fn require_columns(
    reader: &mut csv::Reader<File>,
    path: &Path,
    required: &[&'static str],
) -> Result<(), InputError> {
    let headers = reader.headers().map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    for &column in required {
        if !headers.iter().any(|header| header == column) {
            return Err(InputError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }
    Ok(())
}
