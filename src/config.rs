use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_MAX_WORKERS: usize = 5;
pub const DEFAULT_LANDING_PAGE_TEMPLATE: &str = "https://twitsave.com/info?url={url}";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const URL_PLACEHOLDER: &str = "{url}";

/// One input table paired with the directory its media lands in.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    /// Idle limit between reads. Long transfers are fine while bytes flow.
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            user_agent: format!("mediafetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn build_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .user_agent(self.user_agent.as_str())
            .build()
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub images: Option<PipelineConfig>,
    pub videos: Option<PipelineConfig>,
    pub max_workers_per_pipeline: usize,
    pub http: HttpConfig,
    /// Landing page URL with `{url}` standing in for the video's source URL.
    pub landing_page_template: String,
    pub log_dir: PathBuf,
    pub show_progress: bool,
    /// Turn failed items into a failing run once every item has finished.
    pub strict: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            images: None,
            videos: None,
            max_workers_per_pipeline: DEFAULT_MAX_WORKERS,
            http: HttpConfig::default(),
            landing_page_template: DEFAULT_LANDING_PAGE_TEMPLATE.to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            show_progress: true,
            strict: false,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.is_none() && self.videos.is_none() {
            return Err(ConfigError::NoPipeline);
        }
        if self.max_workers_per_pipeline == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if !self.landing_page_template.contains(URL_PLACEHOLDER) {
            return Err(ConfigError::BadTemplate(
                self.landing_page_template.clone(),
            ));
        }
        Ok(())
    }
}
