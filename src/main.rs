use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::error;

use mediafetch::config::{
    DEFAULT_LANDING_PAGE_TEMPLATE, DEFAULT_LOG_DIR, DEFAULT_MAX_WORKERS, HttpConfig,
    PipelineConfig, RunConfig,
};
use mediafetch::{downloader, logging};

#[derive(Parser)]
#[command(name = "mediafetch")]
#[command(about = "Bulk-download images and videos listed in CSV tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: Options,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the `image_url` column of a table
    Images {
        #[arg(long, help = "CSV with image_url and image_hash columns")]
        input: PathBuf,
        #[arg(long, help = "Directory for {hash}.jpg files")]
        output_dir: PathBuf,
    },
    /// Resolve and download the `video_url` column of a table
    Videos {
        #[arg(long, help = "CSV with a video_url column")]
        input: PathBuf,
        #[arg(long, help = "Directory for {hash}.mp4 files")]
        output_dir: PathBuf,
    },
    /// Run both pipelines concurrently
    Run {
        #[arg(long)]
        images_input: PathBuf,
        #[arg(long)]
        images_output_dir: PathBuf,
        #[arg(long)]
        videos_input: PathBuf,
        #[arg(long)]
        videos_output_dir: PathBuf,
    },
}

#[derive(Args)]
struct Options {
    #[arg(short, long, global = true, help = "workers per pipeline")]
    #[arg(default_value_t = DEFAULT_MAX_WORKERS)]
    workers: usize,
    #[arg(long, global = true, default_value = DEFAULT_LOG_DIR)]
    log_dir: PathBuf,
    #[arg(long, global = true, default_value_t = 10)]
    connect_timeout_secs: u64,
    #[arg(long, global = true, default_value_t = 60)]
    #[arg(help = "abort a transfer after this many seconds without data")]
    read_timeout_secs: u64,
    #[arg(long, global = true, default_value = DEFAULT_LANDING_PAGE_TEMPLATE)]
    #[arg(help = "landing page url, {url} is replaced by the video url")]
    landing_page_template: String,
    #[arg(long, global = true, help = "hide per-video progress bars")]
    no_progress: bool,
    #[arg(long, global = true, help = "exit non-zero when any item failed")]
    strict: bool,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        let (images, videos) = match self.command {
            Commands::Images { input, output_dir } => {
                (Some(PipelineConfig { input, output_dir }), None)
            }
            Commands::Videos { input, output_dir } => {
                (None, Some(PipelineConfig { input, output_dir }))
            }
            Commands::Run {
                images_input,
                images_output_dir,
                videos_input,
                videos_output_dir,
            } => (
                Some(PipelineConfig {
                    input: images_input,
                    output_dir: images_output_dir,
                }),
                Some(PipelineConfig {
                    input: videos_input,
                    output_dir: videos_output_dir,
                }),
            ),
        };

        let options = self.options;
        RunConfig {
            images,
            videos,
            max_workers_per_pipeline: options.workers,
            http: HttpConfig {
                connect_timeout: Duration::from_secs(options.connect_timeout_secs),
                read_timeout: Duration::from_secs(options.read_timeout_secs),
                ..HttpConfig::default()
            },
            landing_page_template: options.landing_page_template,
            log_dir: options.log_dir,
            show_progress: !options.no_progress,
            strict: options.strict,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Cli::parse().into_config();
    let _log_guard = logging::init(&config.log_dir)?;

    if let Err(err) = downloader::run(&config).await {
        error!(error = %err, "Media collection stopped");
        return Err(err.into());
    }

    Ok(())
}
