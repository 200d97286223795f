//! Recorder session management
//!
//! `RecorderSession` turns a capture device into exactly one audio artifact
//! per start→stop cycle:
//! - Idle → Recording on `start` (device acquired, ticker running)
//! - Recording ⇄ Paused on `pause` / `resume` (device kept, ticker frozen)
//! - Recording | Paused → Idle on `stop` (chunks flushed, device released)
//!
//! Actions that do not apply to the current state are no-ops.

mod config;
mod session;
mod stats;

pub use config::RecorderConfig;
pub use session::RecorderSession;
pub use stats::{RecorderState, RecorderStatus};
