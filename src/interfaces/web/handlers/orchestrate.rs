//! POST /api/orchestrate: validates the request, probes the LLM backend, and
//! streams one pipeline run (live or simulated) as server-sent events over a
//! chunked body. The stream closes exactly once, on every path.

use std::convert::Infallible;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::super::AppState;
use super::super::sse::SseStream;
use crate::core::demo;
use crate::core::events::AgentEvent;
use crate::core::pipeline::runner::{RunOutcome, run_pipeline};
use crate::core::state::{PipelineState, StateUpdate};

/// Request bodies above this are rejected before any LLM work starts.
const MAX_MESSAGE_BYTES: usize = 500 * 1024;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrchestrateRequest {
    message: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    human_approval_response: Option<String>,
    /// Structured career profile from the client store; seeds the run state
    /// so the router sees it as loaded.
    #[serde(default)]
    profile: Option<serde_json::Value>,
}

fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub(crate) async fn orchestrate_endpoint(
    State(state): State<AppState>,
    Json(req): Json<OrchestrateRequest>,
) -> Response {
    let message = match req.message.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => return error_json(StatusCode::BAD_REQUEST, "Message is required"),
    };
    if message.len() > MAX_MESSAGE_BYTES {
        return error_json(StatusCode::PAYLOAD_TOO_LARGE, "Message too large");
    }

    let conversation_id = req
        .conversation_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let user_id = req.user_id.unwrap_or_else(|| "anonymous".to_string());

    let (frames, frame_rx) = SseStream::channel();
    let cancel = CancellationToken::new();

    // Probe once per run: a dead backend switches the whole run to the
    // scripted simulator. Errors past the probe stay hard failures.
    let demo_mode = match state.llm.ping().await {
        Ok(()) => false,
        Err(err) if err.is_unreachable() => {
            warn!(conversation_id = %conversation_id, "llm backend unreachable, running demo simulation");
            true
        }
        Err(err) => {
            warn!(error = %err, "llm probe failed without a connect error, attempting live run");
            false
        }
    };

    if demo_mode {
        let run_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut frames = frames;
            frames.push_system_notice("Running in demo mode: agents are simulated locally.");
            let mut steps = demo::demo_stream(message);
            loop {
                tokio::select! {
                    _ = run_cancel.cancelled() => break,
                    step = steps.next() => match step {
                        Some(step) => frames.push_event(&step.event),
                        None => {
                            frames.done();
                            break;
                        }
                    },
                }
            }
            frames.close();
        });
    } else {
        let llm = state.llm.clone();
        let run_cancel = cancel.clone();
        let approval_response = req.human_approval_response;
        let profile = req.profile;
        tokio::spawn(async move {
            let mut frames = frames;
            let mut pipeline_state =
                PipelineState::new(conversation_id.clone(), user_id, message);
            if approval_response.is_some() {
                pipeline_state.apply(StateUpdate {
                    human_approval_response: Some(approval_response),
                    ..Default::default()
                });
            }
            if profile.is_some() {
                pipeline_state.apply(StateUpdate {
                    profile,
                    ..Default::default()
                });
            }

            let (events_tx, mut events_rx) = mpsc::unbounded_channel::<AgentEvent>();
            let outcome = {
                let forward = async {
                    while let Some(event) = events_rx.recv().await {
                        frames.push_event(&event);
                    }
                };
                let run = async {
                    let outcome =
                        run_pipeline(llm.as_ref(), &mut pipeline_state, &events_tx, &run_cancel)
                            .await;
                    drop(events_tx);
                    outcome
                };
                let (outcome, ()) = tokio::join!(run, forward);
                outcome
            };

            match &outcome {
                RunOutcome::Completed | RunOutcome::AwaitingApproval | RunOutcome::Rejected => {
                    frames.done();
                }
                RunOutcome::Failed(message) => frames.push_error(message),
                RunOutcome::Cancelled => {}
            }
            frames.close();
            info!(conversation_id = %conversation_id, outcome = ?outcome, "orchestrate run finished");
        });
    }

    // The drop guard rides inside the body stream: when the client goes away
    // the stream is dropped, the guard fires, and the run is cancelled.
    let guard = cancel.drop_guard();
    let body = Body::from_stream(frame_rx.map(move |frame| {
        let _held = &guard;
        Ok::<Bytes, Infallible>(Bytes::from(frame))
    }));

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache, no-transform"),
            (header::CONNECTION, "keep-alive"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        body,
    )
        .into_response()
}
