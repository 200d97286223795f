//! HTTP control API for a conversation view
//!
//! This module exposes the conversation to a front end:
//! - GET /health - Health check
//! - GET /connection - Whether the transport is open
//! - GET /messages, POST /messages - Read the conversation / send text
//! - GET /recorder, POST /recorder/{start,pause,resume,stop} - Audio capture
//! - POST /attachments/image/:name, POST /attachments/file/:name - Raw-body uploads
//! - GET /media/:media_ref - Payload behind a message's media handle

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
