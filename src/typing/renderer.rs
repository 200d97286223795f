use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::conversation::{ConversationStore, MessageId, MessagePatch};

/// Typing renderer configuration
#[derive(Debug, Clone)]
pub struct TypingConfig {
    /// Delay between two revealed characters of the same message
    pub cadence: Duration,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::from_millis(25),
        }
    }
}

/// One in-flight reveal
struct Reveal {
    text: String,
    /// Characters (not bytes) of `text` shown so far
    shown: usize,
    total: usize,
    next_due: Instant,
}

impl Reveal {
    fn shown_text(&self) -> String {
        self.text.chars().take(self.shown).collect()
    }
}

struct Shared {
    store: ConversationStore,
    reveals: Mutex<HashMap<MessageId, Reveal>>,
    wake: Notify,
    cadence: Duration,
    closed: AtomicBool,
}

/// Drives `displayed_text` of remote messages towards their final text
pub struct TypingRenderer {
    shared: Arc<Shared>,
    scheduler: JoinHandle<()>,
}

impl TypingRenderer {
    /// Create a renderer writing into `store`. Must be called inside a tokio runtime.
    pub fn new(store: ConversationStore, config: TypingConfig) -> Self {
        let shared = Arc::new(Shared {
            store,
            reveals: Mutex::new(HashMap::new()),
            wake: Notify::new(),
            cadence: config.cadence,
            closed: AtomicBool::new(false),
        });

        let scheduler = tokio::spawn(run_scheduler(Arc::clone(&shared)));

        info!(
            "Typing renderer started ({}ms per character)",
            config.cadence.as_millis()
        );

        Self { shared, scheduler }
    }

    /// Reveal `text` in message `id`, one character per cadence.
    ///
    /// A reveal already running for `id` is replaced and continues from the
    /// longest common prefix of what is displayed and `text`. Unknown or
    /// settled messages are left alone. Returns whether a reveal was started
    /// or completed.
    pub async fn reveal(&self, id: MessageId, text: impl Into<String>) -> bool {
        if self.shared.closed.load(Ordering::SeqCst) {
            debug!("Renderer shut down, ignoring reveal for message {}", id);
            return false;
        }

        let text = text.into();
        let mut reveals = self.shared.reveals.lock().await;

        let Some(current) = self.shared.store.get(id).await else {
            warn!("Reveal requested for unknown message {}", id);
            return false;
        };
        if !current.revealing {
            debug!("Ignoring reveal for settled message {}", id);
            return false;
        }

        let shown = common_prefix_chars(&current.displayed_text, &text);
        let total = text.chars().count();

        if shown == total {
            reveals.remove(&id);
            let patch = MessagePatch::displayed(text.clone())
                .with_final(text)
                .with_revealing(false);
            return self.shared.store.patch(id, patch).await;
        }

        if shown < current.displayed_text.chars().count() {
            // new text diverges from what is on screen; roll back to the shared prefix
            let prefix: String = text.chars().take(shown).collect();
            let patch = MessagePatch::displayed(prefix).with_final(text.clone());
            self.shared.store.patch(id, patch).await;
        }

        let reveal = Reveal {
            text,
            shown,
            total,
            next_due: Instant::now() + self.shared.cadence,
        };
        if reveals.insert(id, reveal).is_some() {
            debug!("Restarted reveal for message {} at {} chars", id, shown);
        }
        drop(reveals);

        self.shared.wake.notify_one();
        true
    }

    /// Number of reveals still in flight
    pub async fn active(&self) -> usize {
        self.shared.reveals.lock().await.len()
    }

    pub async fn is_revealing(&self, id: MessageId) -> bool {
        self.shared.reveals.lock().await.contains_key(&id)
    }

    /// Cancel every pending reveal and stop the scheduler. No store writes
    /// happen afterwards.
    pub fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.scheduler.abort();
        info!("Typing renderer stopped");
    }
}

impl Drop for TypingRenderer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_scheduler(shared: Arc<Shared>) {
    loop {
        let next_due = {
            let reveals = shared.reveals.lock().await;
            reveals.values().map(|r| r.next_due).min()
        };

        match next_due {
            None => shared.wake.notified().await,
            Some(due) => {
                tokio::select! {
                    _ = sleep_until(due) => {}
                    _ = shared.wake.notified() => {}
                }
            }
        }

        advance_due(&shared, Instant::now()).await;
    }
}

/// Extend every due reveal by one character
async fn advance_due(shared: &Shared, now: Instant) {
    let mut reveals = shared.reveals.lock().await;

    let due: Vec<MessageId> = reveals
        .iter()
        .filter(|(_, reveal)| reveal.next_due <= now)
        .map(|(id, _)| *id)
        .collect();

    for id in due {
        let Some(reveal) = reveals.get_mut(&id) else {
            continue;
        };

        reveal.shown += 1;
        reveal.next_due += shared.cadence;
        let done = reveal.shown >= reveal.total;

        let mut patch = MessagePatch::displayed(reveal.shown_text()).with_final(reveal.text.clone());
        if done {
            patch = patch.with_revealing(false);
        }

        let applied = shared.store.patch(id, patch).await;
        if done || !applied {
            reveals.remove(&id);
            if done {
                debug!("Reveal complete for message {}", id);
            }
        }
    }
}

/// Length in characters of the longest common prefix
fn common_prefix_chars(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_prefix_counts_chars_not_bytes() {
        assert_eq!(common_prefix_chars("🌿ab", "🌿ac"), 2);
        assert_eq!(common_prefix_chars("", "abc"), 0);
        assert_eq!(common_prefix_chars("abc", "abc"), 3);
    }

    #[test]
    fn test_default_cadence() {
        assert_eq!(TypingConfig::default().cadence, Duration::from_millis(25));
    }
}
