use std::io;
use std::path::Path;

use futures::TryStreamExt;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

use crate::downloader::progress::Progress;
use crate::downloader::target::DownloadTarget;
use crate::error::FetchError;

/// Streamed bodies are written and reported in blocks of this size.
pub const CHUNK_SIZE: usize = 1024;

/// HTTP side of the pipelines. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| transport(url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }

    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|source| transport(url, source))
    }

    /// Whole-body download. Returns the number of bytes written.
    pub async fn fetch_image(&self, url: &str, target: &DownloadTarget) -> Result<u64, FetchError> {
        let body = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|source| transport(url, source))?;

        target.write_all(&body).await?;
        Ok(body.len() as u64)
    }

    /// Streams the body to disk in `CHUNK_SIZE` blocks, reporting each one.
    /// Nothing is left at the target path unless every byte arrived.
    pub async fn fetch_video_streamed(
        &self,
        url: &str,
        target: &DownloadTarget,
        progress: &mut dyn Progress,
    ) -> Result<u64, FetchError> {
        let response = self.get(url).await?;
        progress.begin(response.content_length());

        let result = stream_to_partial(url, response, target, progress).await;
        progress.finish();

        match result {
            Ok(written) => {
                target.commit().await?;
                Ok(written)
            }
            Err(err) => {
                target.discard().await;
                Err(err)
            }
        }
    }
}

async fn stream_to_partial(
    url: &str,
    response: reqwest::Response,
    target: &DownloadTarget,
    progress: &mut dyn Progress,
) -> Result<u64, FetchError> {
    let partial = target.partial_path();
    let write_err = |source| FetchError::Io {
        path: partial.clone(),
        source,
    };

    let mut file = fs::File::create(&partial).await.map_err(write_err)?;

    let reader = StreamReader::new(response.bytes_stream().map_err(io::Error::other));
    tokio::pin!(reader);

    let mut block = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = fill_block(&mut reader, &mut block)
            .await
            .map_err(|err| read_error(url, &partial, err))?;
        if n == 0 {
            break;
        }
        file.write_all(&block[..n]).await.map_err(write_err)?;
        written += n as u64;
        progress.advance(n as u64);
        if n < block.len() {
            break;
        }
    }
    file.flush().await.map_err(write_err)?;

    Ok(written)
}

/// Reads until `block` is full or the stream ends.
async fn fill_block<R: AsyncRead + Unpin>(reader: &mut R, block: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        let n = reader.read(&mut block[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn transport(url: &str, source: reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        source,
    }
}

// Body errors come back wrapped in io::Error by the stream adapter.
fn read_error(url: &str, path: &Path, err: io::Error) -> FetchError {
    let kind = err.kind();
    match err.into_inner() {
        Some(inner) => match inner.downcast::<reqwest::Error>() {
            Ok(source) => transport(url, *source),
            Err(other) => FetchError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(kind, other),
            },
        },
        None => FetchError::Io {
            path: path.to_path_buf(),
            source: io::Error::from(kind),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::downloader::MediaKind;
    use std::time::Duration;
    use crate::downloader::progress::tests::Recorder;
    use crate::test_support::{self, MockServer};

    fn fetcher() -> Fetcher {
        Fetcher::new(reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_fetch_image_writes_body() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let target = DownloadTarget::new(dir.path(), "abc", MediaKind::Image);

        let written = fetcher()
            .fetch_image(&server.url("/image/cat"), &target)
            .await
            .unwrap();

        let body = fs::read(target.path()).await.unwrap();
        assert_eq!(body, test_support::image_body("cat"));
        assert_eq!(written, body.len() as u64);
        assert!(!fs::try_exists(target.partial_path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_image_http_error_creates_nothing() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let target = DownloadTarget::new(dir.path(), "abc", MediaKind::Image);

        let err = fetcher()
            .fetch_image(&server.url("/status/404"), &target)
            .await
            .unwrap_err();

        match err {
            FetchError::Http { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("Expected http error, got {:?}", other),
        }
        assert!(!target.exists().await);
        assert!(!fs::try_exists(target.partial_path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_image_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = DownloadTarget::new(dir.path(), "abc", MediaKind::Image);
        let url = test_support::unreachable_url().await;

        let err = fetcher().fetch_image(&url, &target).await.unwrap_err();

        assert!(matches!(err, FetchError::Transport { .. }));
        assert!(!target.exists().await);
    }

    #[tokio::test]
    async fn test_stream_reports_fixed_blocks() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let target = DownloadTarget::new(dir.path(), "vid", MediaKind::Video);
        let mut progress = Recorder::default();

        let written = fetcher()
            .fetch_video_streamed(&server.url("/video/204800"), &target, &mut progress)
            .await
            .unwrap();

        assert_eq!(written, 204800);
        assert_eq!(progress.total, Some(204800));
        assert_eq!(progress.calls.len(), 200);
        assert!(progress.calls.iter().all(|&n| n == 1024));
        assert_eq!(progress.calls.iter().sum::<u64>(), 204800);
        assert!(progress.finished);

        let metadata = fs::metadata(target.path()).await.unwrap();
        assert_eq!(metadata.len(), 204800);
    }

    #[tokio::test]
    async fn test_stream_short_tail_block() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let target = DownloadTarget::new(dir.path(), "vid", MediaKind::Video);
        let mut progress = Recorder::default();

        fetcher()
            .fetch_video_streamed(&server.url("/video/2500"), &target, &mut progress)
            .await
            .unwrap();

        assert_eq!(progress.calls, vec![1024, 1024, 452]);
        assert_eq!(fs::metadata(target.path()).await.unwrap().len(), 2500);
    }

    #[tokio::test]
    async fn test_stream_empty_body() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let target = DownloadTarget::new(dir.path(), "vid", MediaKind::Video);
        let mut progress = Recorder::default();

        let written = fetcher()
            .fetch_video_streamed(&server.url("/video/0"), &target, &mut progress)
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert!(progress.calls.is_empty());
        assert!(target.exists().await);
    }

    #[tokio::test]
    async fn test_stream_truncated_body_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = DownloadTarget::new(dir.path(), "vid", MediaKind::Video);
        let mut progress = Recorder::default();

        let url = test_support::truncated_url(4096, 1000).await;

        let err = fetcher()
            .fetch_video_streamed(&url, &target, &mut progress)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Transport { .. }));
        assert!(progress.finished);
        assert!(!target.exists().await);
        assert!(!fs::try_exists(target.partial_path()).await.unwrap());
    }

    fn idle_limited(read_timeout: Duration) -> Fetcher {
        let http = HttpConfig {
            read_timeout,
            ..HttpConfig::default()
        };
        Fetcher::new(http.build_client().unwrap())
    }

    #[tokio::test]
    async fn test_slow_stream_outlasting_read_timeout_completes() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let target = DownloadTarget::new(dir.path(), "vid", MediaKind::Video);
        let mut progress = Recorder::default();

        // ~1s of transfer against a 400ms idle limit
        let written = idle_limited(Duration::from_millis(400))
            .fetch_video_streamed(&server.url("/slow/10/100"), &target, &mut progress)
            .await
            .unwrap();

        assert_eq!(written, 10 * 1024);
        assert_eq!(progress.calls, vec![1024; 10]);
        assert_eq!(fs::metadata(target.path()).await.unwrap().len(), 10 * 1024);
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let target = DownloadTarget::new(dir.path(), "vid", MediaKind::Video);
        let mut progress = Recorder::default();

        let err = idle_limited(Duration::from_millis(200))
            .fetch_video_streamed(&server.url("/slow/2/2000"), &target, &mut progress)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Transport { .. }));
        assert!(!target.exists().await);
        assert!(!fs::try_exists(target.partial_path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_stream_http_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let target = DownloadTarget::new(dir.path(), "vid", MediaKind::Video);
        let mut progress = Recorder::default();

        let err = fetcher()
            .fetch_video_streamed(&server.url("/status/503"), &target, &mut progress)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Http { .. }));
        assert!(progress.calls.is_empty());
        assert!(!target.exists().await);
    }

    #[tokio::test]
    async fn test_get_text() {
        let server = MockServer::start().await;
        let text = fetcher().get_text(&server.url("/image/x")).await.unwrap();
        assert_eq!(text.as_bytes(), test_support::image_body("x").as_slice());
    }
}
