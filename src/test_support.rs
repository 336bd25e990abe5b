use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::Html,
    routing::get,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type Hits = Arc<AtomicUsize>;

/// In-process media host. Every request is counted.
///
/// - `/image/{name}`: small body derived from `name`
/// - `/video/{size}`: `size` bytes with a declared content-length
/// - `/status/{code}`: empty response with that status
/// - `/slow/{chunks}/{delay_ms}`: `chunks` KiB, each sent after a pause
/// - `/info`: landing page whose download container points at `/video/4096`
/// - `/empty`: landing page without a download container
pub(crate) struct MockServer {
    addr: SocketAddr,
    hits: Hits,
}

impl MockServer {
    pub async fn start() -> Self {
        let hits = Hits::default();
        let app = Router::new()
            .route("/image/{name}", get(image))
            .route("/video/{size}", get(video))
            .route("/slow/{chunks}/{delay_ms}", get(slow_video))
            .route("/status/{code}", get(status))
            .route("/info", get(landing_page))
            .route("/empty", get(empty_page))
            .with_state(hits.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, hits }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub(crate) fn image_body(name: &str) -> Vec<u8> {
    format!("image:{}", name).into_bytes()
}

pub(crate) fn video_body(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

pub(crate) fn landing_html(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .enumerate()
        .map(|(i, href)| format!(r#"<a href="{}" download>Quality {}</a>"#, href, i))
        .collect();
    format!(
        r#"<html><body>
<nav><a href="/">home</a></nav>
<div class="relative">
  <div class="origin-top-right absolute right-0 mt-2">{}</div>
</div>
</body></html>"#,
        anchors
    )
}

async fn image(State(hits): State<Hits>, Path(name): Path<String>) -> Vec<u8> {
    hits.fetch_add(1, Ordering::SeqCst);
    image_body(&name)
}

async fn video(State(hits): State<Hits>, Path(size): Path<usize>) -> Vec<u8> {
    hits.fetch_add(1, Ordering::SeqCst);
    video_body(size)
}

async fn slow_video(
    State(hits): State<Hits>,
    Path((chunks, delay_ms)): Path<(usize, u64)>,
) -> Body {
    hits.fetch_add(1, Ordering::SeqCst);
    let body = futures::stream::unfold(0, move |sent| async move {
        if sent == chunks {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Some((Ok::<_, std::io::Error>(video_body(1024)), sent + 1))
    });
    Body::from_stream(body)
}

async fn status(State(hits): State<Hits>, Path(code): Path<u16>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn landing_page(State(hits): State<Hits>, headers: HeaderMap) -> Html<String> {
    hits.fetch_add(1, Ordering::SeqCst);
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let best = format!("http://{}/video/4096", host);
    let worse = format!("http://{}/video/1024", host);
    Html(landing_html(&[&best, &worse]))
}

async fn empty_page(State(hits): State<Hits>) -> Html<&'static str> {
    hits.fetch_add(1, Ordering::SeqCst);
    Html("<html><body><p>Sorry, no media found</p></body></html>")
}

/// Serves one response that declares `declared` bytes but sends `sent`, then hangs up.
pub(crate) async fn truncated_url(declared: usize, sent: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let head = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", declared);
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&video_body(sent)).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{}/truncated.mp4", addr)
}

/// A URL nothing is listening on.
pub(crate) async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/gone.jpg", addr)
}
