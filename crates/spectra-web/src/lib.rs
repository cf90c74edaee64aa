//! HTTP presentation layer: viewer page, MJPEG preview stream, current zone
//! colors, and the history export. Reads sampler state only; never writes.

use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use futures::{stream::BoxStream, StreamExt};
use spectra_sampler::SamplerFeed;
use spectra_types::{config::ServerConfig, snapshot::ZoneColor, Result, SpectraError};
use tokio::time::sleep;
use tracing::info;
use uuid::Uuid;

const MJPEG_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";
const CSV_ATTACHMENT: &str = "attachment; filename=\"color_data.csv\"";

/// Bind the configured address and serve until the task is dropped.
pub async fn serve(config: ServerConfig, feed: SamplerFeed) -> Result<()> {
    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|err| server_error(format!("failed to bind {addr}: {err}")))?;
    info!("Listening on http://{addr}");
    axum::serve(listener, router(feed))
        .await
        .map_err(|err| server_error(format!("server error: {err}")))
}

pub fn router(feed: SamplerFeed) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/video_feed", get(video_feed))
        .route("/color_data", get(color_data))
        .route("/export_csv", get(export_csv))
        .with_state(feed)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

/// Infinite multipart stream of the latest annotated JPEG, one part per
/// sampling interval. Every connection starts from current state; ticks with
/// no captured frame yet are skipped.
async fn video_feed(State(feed): State<SamplerFeed>) -> impl IntoResponse {
    let client = Uuid::new_v4();
    info!("Video feed client {client} connected");
    (
        [(header::CONTENT_TYPE, MJPEG_CONTENT_TYPE)],
        Body::from_stream(mjpeg_stream(feed)),
    )
}

fn mjpeg_stream(feed: SamplerFeed) -> BoxStream<'static, Result<Bytes, Infallible>> {
    let interval = feed.frame_interval();
    async_stream::stream! {
        loop {
            if let Some(jpeg) = feed.latest_jpeg() {
                yield Ok(frame_part(&jpeg));
            }
            sleep(interval).await;
        }
    }
    .boxed()
}

fn frame_part(jpeg: &[u8]) -> Bytes {
    let mut part = Vec::with_capacity(jpeg.len() + 64);
    part.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}

/// The latest zone colors as a JSON array; empty until the first cycle.
async fn color_data(State(feed): State<SamplerFeed>) -> Json<Vec<ZoneColor>> {
    let zones = feed
        .latest_snapshot()
        .map(|snapshot| snapshot.zones)
        .unwrap_or_default();
    Json(zones)
}

/// The full history as a CSV download.
async fn export_csv(State(feed): State<SamplerFeed>) -> impl IntoResponse {
    let csv = feed.history().to_csv().await;
    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, CSV_ATTACHMENT),
        ],
        csv,
    )
}

pub fn server_error(message: impl Into<String>) -> SpectraError {
    SpectraError::Server(message.into())
}
