use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::downloader::{MediaKind, WorkItem};
use crate::identity::{identity, is_safe_stem};
use crate::records::{ImageRecord, VideoRecord};

/// Drops records without a URL and keeps only the first record per URL,
/// preserving first-occurrence order.
pub fn dedupe<T, F>(records: impl IntoIterator<Item = T>, url_of: F) -> Vec<T>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for record in records {
        let Some(url) = url_of(&record).map(str::trim).filter(|url| !url.is_empty()) else {
            continue;
        };
        if seen.insert(url.to_string()) {
            unique.push(record);
        }
    }
    unique
}

/// Keeps the first item per identity. Distinct URLs may still share a target
/// when the input repeats a hash, and two workers must never write one path.
fn unique_targets(items: impl IntoIterator<Item = WorkItem>) -> Vec<WorkItem> {
    let mut planned = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            if planned.insert(item.identity.clone()) {
                return true;
            }
            warn!(
                url = %item.source_url,
                target = %item.target,
                "Dropping item whose target is already planned"
            );
            false
        })
        .collect()
}

/// Image identities come from the input's hash column, falling back to the
/// URL digest when the column is blank.
pub fn plan_images(records: Vec<ImageRecord>, dir: &Path) -> Vec<WorkItem> {
    let total = records.len();
    let planned = dedupe(records, |record| record.image_url.as_deref())
        .into_iter()
        .filter_map(|record| {
            let url = record.image_url?.trim().to_string();
            let stem = match record.image_hash.as_deref().map(str::trim) {
                Some(hash) if !hash.is_empty() => {
                    if !is_safe_stem(hash) {
                        warn!(url = %url, hash, "Dropping image with unusable hash");
                        return None;
                    }
                    hash.to_string()
                }
                _ => identity(&url),
            };
            Some(WorkItem::new(url, stem, MediaKind::Image, dir))
        });
    let items = unique_targets(planned);

    debug!(rows = total, items = items.len(), "Planned image downloads");
    items
}

pub fn plan_videos(records: Vec<VideoRecord>, dir: &Path) -> Vec<WorkItem> {
    let total = records.len();
    let planned = dedupe(records, |record| record.video_url.as_deref())
        .into_iter()
        .filter_map(|record| record.video_url)
        .map(|url| {
            let url = url.trim().to_string();
            let stem = identity(&url);
            WorkItem::new(url, stem, MediaKind::Video, dir)
        });
    let items = unique_targets(planned);

    debug!(rows = total, items = items.len(), "Planned video downloads");
    items
}
