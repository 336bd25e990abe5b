use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::info;

use crate::config::{PipelineConfig, RunConfig};
use crate::error::{ItemError, Result, RunError};
use crate::records;

pub mod executor;
pub mod fetch;
pub mod planner;
pub mod progress;
pub mod resolver;
pub mod target;
pub mod worker;

use fetch::Fetcher;
use resolver::LandingPageResolver;
use target::DownloadTarget;
use worker::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        })
    }
}

/// One deduplicated URL to fetch. Immutable once planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source_url: String,
    pub identity: String,
    pub kind: MediaKind,
    pub target: DownloadTarget,
}

impl WorkItem {
    pub fn new(source_url: String, identity: String, kind: MediaKind, dir: &Path) -> Self {
        let target = DownloadTarget::new(dir, &identity, kind);
        Self {
            source_url,
            identity,
            kind,
            target,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Skipped,
    Succeeded { bytes: u64 },
    Failed(ItemError),
}

#[derive(Debug)]
pub struct DispatchResult {
    pub item: WorkItem,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_results(results: &[DispatchResult]) -> Self {
        results
            .iter()
            .fold(Summary::default(), |mut summary, result| {
                match result.outcome {
                    Outcome::Skipped => summary.skipped += 1,
                    Outcome::Succeeded { .. } => summary.succeeded += 1,
                    Outcome::Failed(_) => summary.failed += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.skipped + self.succeeded + self.failed
    }
}

/// Per-pipeline summaries; `None` for a pipeline that was not configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub images: Option<Summary>,
    pub videos: Option<Summary>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        [self.images, self.videos]
            .iter()
            .flatten()
            .map(|summary| summary.failed)
            .sum()
    }
}

/// Loads the input table and provisions the output directory. Any error
/// here is fatal for the run and happens before anything is dispatched.
pub async fn prepare(kind: MediaKind, config: &PipelineConfig) -> Result<Vec<WorkItem>> {
    let items = match kind {
        MediaKind::Image => {
            let records = records::load_images(&config.input)?;
            planner::plan_images(records, &config.output_dir)
        }
        MediaKind::Video => {
            let records = records::load_videos(&config.input)?;
            planner::plan_videos(records, &config.output_dir)
        }
    };

    fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|source| RunError::OutputDir {
            path: config.output_dir.clone(),
            source,
        })?;

    info!(
        kind = %kind,
        input = %config.input.display(),
        output = %config.output_dir.display(),
        items = items.len(),
        "Prepared pipeline"
    );
    Ok(items)
}

pub async fn run_pipeline(
    ctx: Context,
    kind: MediaKind,
    items: Vec<WorkItem>,
    max_workers: usize,
) -> Summary {
    let results = match kind {
        MediaKind::Image => {
            executor::dispatch(items, |item| worker::process_image(ctx.clone(), item), max_workers)
                .await
        }
        MediaKind::Video => {
            executor::dispatch(items, |item| worker::process_video(ctx.clone(), item), max_workers)
                .await
        }
    };

    let summary = Summary::from_results(&results);
    info!(
        kind = %kind,
        items = summary.total(),
        skipped = summary.skipped,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Pipeline finished"
    );
    summary
}

/// Runs every configured pipeline concurrently. Item failures only show up
/// in the log and the report, unless `strict` is set.
pub async fn run(config: &RunConfig) -> Result<RunReport> {
    config.validate()?;

    let client = config.http.build_client().map_err(RunError::HttpClient)?;
    let fetcher = Fetcher::new(client);
    let resolver = Arc::new(LandingPageResolver::new(
        fetcher.clone(),
        config.landing_page_template.as_str(),
    ));
    let ctx = Context::new(fetcher, resolver, config.show_progress);

    let images = match &config.images {
        Some(pipeline) => Some(prepare(MediaKind::Image, pipeline).await?),
        None => None,
    };
    let videos = match &config.videos {
        Some(pipeline) => Some(prepare(MediaKind::Video, pipeline).await?),
        None => None,
    };

    let workers = config.max_workers_per_pipeline;
    let run_optional = |kind: MediaKind, items: Option<Vec<WorkItem>>| {
        let ctx = ctx.clone();
        async move {
            match items {
                Some(items) => Some(run_pipeline(ctx, kind, items, workers).await),
                None => None,
            }
        }
    };
    let (images, videos) = tokio::join!(
        run_optional(MediaKind::Image, images),
        run_optional(MediaKind::Video, videos)
    );

    let report = RunReport { images, videos };
    info!(failed = report.failed(), "Media collection process completed");

    if config.strict && report.failed() > 0 {
        return Err(RunError::FailedItems {
            failed: report.failed(),
        });
    }
    Ok(report)
}
