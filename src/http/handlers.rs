use super::state::AppState;
use crate::conversation::{MediaRef, Message, MessageId};
use crate::error::ChatError;
use crate::recorder::RecorderStatus;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageAccepted {
    pub id: MessageId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopRecordingResponse {
    /// The Self/Audio message, if a recording was running
    pub message_id: Option<MessageId>,
    pub status: RecorderStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub open: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn chat_error_response(err: ChatError) -> Response {
    let status = match &err {
        ChatError::DeviceUnavailable(_) | ChatError::TransportClosed(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ChatError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
        ChatError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /connection
pub async fn connection_status(State(state): State<AppState>) -> Json<ConnectionStatus> {
    Json(ConnectionStatus {
        open: state.conversation.is_connected(),
    })
}

/// GET /messages
/// Snapshot of the conversation in display order
pub async fn list_messages(State(state): State<AppState>) -> Json<Vec<Message>> {
    Json(state.conversation.messages().await)
}

/// POST /messages
/// Send user text over the transport
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    match state.conversation.send_text(&req.text).await {
        Ok(Some(id)) => (StatusCode::ACCEPTED, Json(MessageAccepted { id })).into_response(),
        Ok(None) => error_response(StatusCode::BAD_REQUEST, "message is empty"),
        Err(e) => {
            warn!("Failed to send message: {}", e);
            chat_error_response(e)
        }
    }
}

/// GET /recorder
pub async fn recorder_status(State(state): State<AppState>) -> Json<RecorderStatus> {
    Json(state.conversation.recorder_status().await)
}

/// POST /recorder/start
pub async fn start_recording(State(state): State<AppState>) -> Response {
    match state.conversation.start_recording().await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => {
            error!("Failed to start recording: {}", e);
            chat_error_response(e)
        }
    }
}

/// POST /recorder/pause
pub async fn pause_recording(State(state): State<AppState>) -> Json<RecorderStatus> {
    Json(state.conversation.pause_recording().await)
}

/// POST /recorder/resume
pub async fn resume_recording(State(state): State<AppState>) -> Json<RecorderStatus> {
    Json(state.conversation.resume_recording().await)
}

/// POST /recorder/stop
/// Finish the recording now; delivery (upload or socket) continues in the background
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    let finished = match state.conversation.finish_recording().await {
        Ok(finished) => finished,
        Err(e) => {
            error!("Failed to finish recording: {}", e);
            return chat_error_response(e);
        }
    };

    let message_id = finished.map(|(id, artifact)| {
        let conversation = state.conversation.clone();
        tokio::spawn(async move {
            if let Err(e) = conversation.deliver_audio(artifact).await {
                warn!("Audio delivery for message {} failed: {}", id, e);
            }
        });
        id
    });

    let status = state.conversation.recorder_status().await;
    (
        StatusCode::OK,
        Json(StopRecordingResponse { message_id, status }),
    )
        .into_response()
}

/// POST /attachments/image/:name
/// Append the image now; its analysis arrives as a reply later
pub async fn attach_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "image body is empty");
    }

    let media_type = content_type(&headers);
    info!("Received image {} ({} bytes)", name, body.len());

    let (id, image) = match state
        .conversation
        .append_image(&name, body.to_vec(), &media_type)
        .await
    {
        Ok(appended) => appended,
        Err(e) => {
            error!("Failed to attach image {}: {}", name, e);
            return chat_error_response(e);
        }
    };

    let conversation = state.conversation.clone();
    tokio::spawn(async move {
        if let Err(e) = conversation.analyse_image(image).await {
            warn!("Analysis for image message {} failed: {}", id, e);
        }
    });

    (StatusCode::ACCEPTED, Json(MessageAccepted { id })).into_response()
}

/// POST /attachments/file/:name
pub async fn attach_file(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let media_type = content_type(&headers);

    match state
        .conversation
        .attach_file(&name, body.to_vec(), &media_type)
        .await
    {
        Ok(id) => (StatusCode::CREATED, Json(MessageAccepted { id })).into_response(),
        Err(e) => {
            error!("Failed to attach file {}: {}", name, e);
            chat_error_response(e)
        }
    }
}

/// GET /media/:media_ref
pub async fn get_media(
    State(state): State<AppState>,
    Path(media_ref): Path<String>,
) -> Response {
    match state.conversation.media(&MediaRef(media_ref.clone())).await {
        Some(media) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, media.media_type)],
            media.bytes.as_ref().clone(),
        )
            .into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Media {} not found", media_ref),
        ),
    }
}
