//! Incremental text reveal
//!
//! `TypingRenderer` exposes a complete string one character at a time on a
//! fixed cadence. All in-flight reveals share one scheduler task: each wake-up
//! advances every reveal whose next character is due, so the number of timers
//! does not grow with the conversation. Reveals for different messages are
//! independent; a message never has more than one reveal in flight.

mod renderer;

pub use renderer::{TypingConfig, TypingRenderer};
