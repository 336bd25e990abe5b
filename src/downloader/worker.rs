use std::sync::Arc;

use tracing::{error, info};

use crate::downloader::fetch::Fetcher;
use crate::downloader::progress::{ConsoleProgress, NoProgress, Progress};
use crate::downloader::resolver::VideoResolver;
use crate::downloader::{Outcome, WorkItem};
use crate::error::ItemError;

/// Everything a worker needs; cheap to clone into each task.
#[derive(Clone)]
pub struct Context {
    pub fetcher: Fetcher,
    pub resolver: Arc<dyn VideoResolver>,
    pub show_progress: bool,
}

impl Context {
    pub fn new(fetcher: Fetcher, resolver: Arc<dyn VideoResolver>, show_progress: bool) -> Self {
        Self {
            fetcher,
            resolver,
            show_progress,
        }
    }

    fn progress_for(&self, item: &WorkItem) -> Box<dyn Progress> {
        if self.show_progress {
            Box::new(ConsoleProgress::new(item.target.to_string()))
        } else {
            Box::new(NoProgress)
        }
    }
}

pub async fn process_image(ctx: Context, item: WorkItem) -> Outcome {
    if item.target.exists().await {
        info!(path = %item.target, "Image already exists, skipping download");
        return Outcome::Skipped;
    }

    match ctx.fetcher.fetch_image(&item.source_url, &item.target).await {
        Ok(bytes) => {
            info!(path = %item.target, bytes, "Downloaded image");
            Outcome::Succeeded { bytes }
        }
        Err(err) => failed(&item, err.into()),
    }
}

/// Resolves the landing page first; the gate runs before either request.
pub async fn process_video(ctx: Context, item: WorkItem) -> Outcome {
    if item.target.exists().await {
        info!(path = %item.target, "Video already exists, skipping download");
        return Outcome::Skipped;
    }

    let media_url = match ctx.resolver.resolve(&item.source_url).await {
        Ok(url) => url,
        Err(err) => return failed(&item, err.into()),
    };

    let mut progress = ctx.progress_for(&item);
    match ctx
        .fetcher
        .fetch_video_streamed(&media_url, &item.target, progress.as_mut())
        .await
    {
        Ok(bytes) => {
            info!(path = %item.target, bytes, "Downloaded video");
            Outcome::Succeeded { bytes }
        }
        Err(err) => failed(&item, err.into()),
    }
}

fn failed(item: &WorkItem, err: ItemError) -> Outcome {
    error!(
        kind = %item.kind,
        url = %item.source_url,
        path = %item.target,
        error = %err,
        "Download failed"
    );
    Outcome::Failed(err)
}
