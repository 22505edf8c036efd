//! HTTP and WebSocket surface of the dashboard.
//!
//! | route | purpose |
//! | --- | --- |
//! | `GET /stats` | one annotated sample (polling) |
//! | `GET /ws` | annotated samples pushed every sample interval |
//! | `POST /start-recording` | reset and start the recording session |
//! | `GET /download-report` | the session report as a PDF attachment |
//! | `GET /system-info` | hostname, OS, CPU and uptime |

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use color_eyre::{Result, eyre::WrapErr};
use log::*;
use serde_json::json;

use crate::{
    metrics::{AnnotatedSample, HostInfo, SystemProbe},
    monitor::{Monitor, ReportOutcome},
};

pub struct ServerState<P> {
    pub monitor: Arc<Monitor<P>>,
    pub sample_interval: Duration,
    pub download_name: String,
}

// Manual impl: deriving would demand `P: Clone`.
impl<P> Clone for ServerState<P> {
    fn clone(&self) -> Self {
        Self {
            monitor: Arc::clone(&self.monitor),
            sample_interval: self.sample_interval,
            download_name: self.download_name.clone(),
        }
    }
}

pub fn router<P: SystemProbe + 'static>(state: ServerState<P>) -> Router {
    Router::new()
        .route("/stats", get(handle_stats::<P>))
        .route("/ws", get(handle_ws::<P>))
        .route("/start-recording", post(handle_start_recording::<P>))
        .route("/download-report", get(handle_download_report::<P>))
        .route("/system-info", get(handle_system_info::<P>))
        .with_state(state)
}

/// Serve until Ctrl-C, then finalize a session that is still recording.
pub async fn serve<P: SystemProbe + 'static>(bind: &str, state: ServerState<P>) -> Result<()> {
    let monitor = Arc::clone(&state.monitor);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .wrap_err_with(|| format!("binding {}", bind))?;
    info!(target: "Server", "Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    if monitor.status().active {
        match monitor.stop_and_finalize() {
            Ok(path) => info!(target: "Server", "Saved in-progress session to {}", path.display()),
            Err(err) => error!(target: "Server", "Could not save session on exit: {:#}", err),
        }
    }
    info!(target: "Server", "Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target: "Server", "Cannot listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
}

async fn handle_stats<P: SystemProbe + 'static>(
    State(state): State<ServerState<P>>,
) -> Result<Json<AnnotatedSample>, StatusCode> {
    let monitor = Arc::clone(&state.monitor);
    tokio::task::spawn_blocking(move || monitor.poll())
        .await
        .map(Json)
        .map_err(|err| {
            error!(target: "Server", "Sampling task failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

async fn handle_ws<P: SystemProbe + 'static>(
    ws: WebSocketUpgrade,
    State(state): State<ServerState<P>>,
) -> Response {
    ws.on_upgrade(move |socket| stream_samples(socket, state))
}

async fn stream_samples<P: SystemProbe + 'static>(mut socket: WebSocket, state: ServerState<P>) {
    info!(target: "Server", "WebSocket client connected");
    let mut samples = state.monitor.spawn_delivery(state.sample_interval);
    loop {
        tokio::select! {
            next = samples.recv() => {
                let Some(sample) = next else { break };
                let text = match serde_json::to_string(&sample) {
                    Ok(text) => text,
                    Err(err) => {
                        error!(target: "Server", "Cannot serialize sample: {}", err);
                        continue;
                    }
                };
                if let Err(err) = socket.send(Message::Text(text.into())).await {
                    warn!(target: "Server", "WebSocket send failed: {}", err);
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(err)) => {
                    warn!(target: "Server", "WebSocket error: {}", err);
                    break;
                }
                Some(Ok(_)) => {}
            }
        }
    }
    // Dropping the receiver stops the delivery loop.
    drop(samples);
    info!(target: "Server", "WebSocket client disconnected");
}

async fn handle_start_recording<P: SystemProbe + 'static>(
    State(state): State<ServerState<P>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let monitor = Arc::clone(&state.monitor);
    // The state lock may be held while a report is written.
    let session = tokio::task::spawn_blocking(move || monitor.start_recording())
        .await
        .map_err(|err| {
            error!(target: "Server", "Start recording task failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(json!({ "status": "started", "session": session })))
}

async fn handle_system_info<P: SystemProbe + 'static>(
    State(state): State<ServerState<P>>,
) -> Result<Json<HostInfo>, StatusCode> {
    let monitor = Arc::clone(&state.monitor);
    tokio::task::spawn_blocking(move || monitor.host_info())
        .await
        .map(Json)
        .map_err(|err| {
            error!(target: "Server", "System info task failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

async fn handle_download_report<P: SystemProbe + 'static>(
    State(state): State<ServerState<P>>,
) -> Response {
    let monitor = Arc::clone(&state.monitor);
    let outcome = tokio::task::spawn_blocking(move || monitor.download_report()).await;
    match outcome {
        Ok(Ok(ReportOutcome::Ready(path))) => match tokio::fs::read(&path).await {
            Ok(bytes) => (
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", state.download_name),
                    ),
                ],
                bytes,
            )
                .into_response(),
            Err(err) => {
                error!(target: "Server", "Cannot read report {}: {}", path.display(), err);
                report_failed()
            }
        },
        Ok(Ok(ReportOutcome::NoReport)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No report available" })),
        )
            .into_response(),
        Ok(Err(err)) => {
            error!(target: "Server", "Report generation failed: {:#}", err);
            report_failed()
        }
        Err(err) => {
            error!(target: "Server", "Report task failed: {}", err);
            report_failed()
        }
    }
}

fn report_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Report generation failed" })),
    )
        .into_response()
}
