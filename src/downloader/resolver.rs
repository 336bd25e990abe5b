use std::sync::LazyLock;

use futures::future::BoxFuture;
use scraper::{Html, Selector};
use tracing::debug;

use crate::config::URL_PLACEHOLDER;
use crate::downloader::fetch::Fetcher;
use crate::error::ResolveError;

static DOWNLOAD_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.origin-top-right").expect("container selector"));
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("anchor selector"));

/// Turns a video's source URL into a directly downloadable media URL.
pub trait VideoResolver: Send + Sync {
    fn resolve<'a>(&'a self, source_url: &'a str) -> BoxFuture<'a, Result<String, ResolveError>>;
}

/// Scrapes a third-party landing page for its download links.
pub struct LandingPageResolver {
    fetcher: Fetcher,
    template: String,
}

impl LandingPageResolver {
    pub fn new(fetcher: Fetcher, template: impl Into<String>) -> Self {
        Self {
            fetcher,
            template: template.into(),
        }
    }

    pub fn landing_page_url(&self, source_url: &str) -> String {
        self.template.replace(URL_PLACEHOLDER, source_url)
    }
}

impl VideoResolver for LandingPageResolver {
    fn resolve<'a>(&'a self, source_url: &'a str) -> BoxFuture<'a, Result<String, ResolveError>> {
        Box::pin(async move {
            let page_url = self.landing_page_url(source_url);
            let html = self.fetcher.get_text(&page_url).await?;
            let media_url = select_highest_quality(&html)
                .map_err(|reason| ResolveError::NotFound {
                    url: page_url.clone(),
                    reason,
                })?;
            debug!(source = source_url, media = %media_url, "Resolved video url");
            Ok(media_url)
        })
    }
}

/// The page lists qualities best-first, so the first link in the first
/// download container wins. No quality metadata is inspected.
pub fn select_highest_quality(html: &str) -> Result<String, &'static str> {
    let document = Html::parse_document(html);
    let container = document
        .select(&DOWNLOAD_CONTAINER)
        .next()
        .ok_or("download container missing")?;
    let link = container
        .select(&LINK)
        .next()
        .ok_or("download container has no links")?;
    link.value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .ok_or("first download link has no href")
}
