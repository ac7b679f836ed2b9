//! Debounced, de-duplicated search input.
//!
//! Keystrokes overwrite a single `watch` slot, so at most the latest text is
//! ever pending. A background task waits for the slot to stay unchanged for
//! the whole window, then forwards the value unless it equals the last one
//! forwarded. Blank text is forwarded as [`SearchInput::Clear`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::debug;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// A debounced search emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchInput {
    /// Non-blank query text, as typed.
    Query(String),
    /// The box was emptied (or holds only whitespace); clear the results.
    Clear,
}

impl SearchInput {
    fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Self::Clear
        } else {
            Self::Query(raw.to_string())
        }
    }
}

/// Producer side of the search channel. Cloning shares the same slot; the
/// channel closes (flushing any pending value) when the last clone drops.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    input: Arc<watch::Sender<String>>,
}

impl SearchDebouncer {
    /// Start the debounce task. Must be called inside a tokio runtime.
    pub fn spawn(window: Duration) -> (Self, mpsc::UnboundedReceiver<SearchInput>) {
        let (input, keystrokes) = watch::channel(String::new());
        let (emit, emissions) = mpsc::unbounded_channel();
        tokio::spawn(debounce(keystrokes, emit, window));
        (
            Self {
                input: Arc::new(input),
            },
            emissions,
        )
    }

    /// Record the current contents of the search box.
    pub fn submit(&self, query: impl Into<String>) {
        self.input.send_replace(query.into());
    }
}

async fn debounce(
    mut keystrokes: watch::Receiver<String>,
    emit: mpsc::UnboundedSender<SearchInput>,
    window: Duration,
) {
    let mut last_emitted: Option<String> = None;
    loop {
        if keystrokes.changed().await.is_err() {
            return;
        }

        let mut open = true;
        loop {
            match tokio::time::timeout(window, keystrokes.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => {
                    open = false;
                    break;
                }
                Err(_) => break,
            }
        }

        let latest = keystrokes.borrow_and_update().clone();
        if last_emitted.as_deref() != Some(latest.as_str()) {
            let input = SearchInput::from_raw(&latest);
            debug!(query = %latest, "search input settled");
            last_emitted = Some(latest);
            if emit.send(input).is_err() {
                return;
            }
        }

        if !open {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Instant};

    async fn assert_silent(rx: &mut mpsc::UnboundedReceiver<SearchInput>) {
        let next = timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(next.is_err(), "unexpected emission: {next:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn burst_emits_only_final_text() {
        let (search, mut rx) = SearchDebouncer::spawn(DEFAULT_DEBOUNCE);
        search.submit("g");
        search.submit("gr");
        search.submit("graph");
        assert_eq!(rx.recv().await, Some(SearchInput::Query("graph".into())));
        assert_silent(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn each_keystroke_restarts_the_window() {
        let (search, mut rx) = SearchDebouncer::spawn(DEFAULT_DEBOUNCE);
        let start = Instant::now();
        for text in ["g", "gr", "gra"] {
            search.submit(text);
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        assert_eq!(rx.recv().await, Some(SearchInput::Query("gra".into())));
        // Last keystroke at 600 ms, then a full quiet window.
        assert_eq!(start.elapsed(), Duration::from_millis(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_text_after_quiet_period_is_suppressed() {
        let (search, mut rx) = SearchDebouncer::spawn(DEFAULT_DEBOUNCE);
        search.submit("x");
        assert_eq!(rx.recv().await, Some(SearchInput::Query("x".into())));
        search.submit("x");
        assert_silent(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn typing_then_undoing_back_is_suppressed() {
        let (search, mut rx) = SearchDebouncer::spawn(DEFAULT_DEBOUNCE);
        search.submit("ab");
        assert_eq!(rx.recv().await, Some(SearchInput::Query("ab".into())));
        search.submit("abc");
        search.submit("ab");
        assert_silent(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn blank_text_becomes_clear() {
        let (search, mut rx) = SearchDebouncer::spawn(DEFAULT_DEBOUNCE);
        search.submit("graph");
        assert_eq!(rx.recv().await, Some(SearchInput::Query("graph".into())));
        search.submit("   ");
        assert_eq!(rx.recv().await, Some(SearchInput::Clear));
    }

    #[tokio::test(start_paused = true)]
    async fn separated_inputs_each_emit() {
        let (search, mut rx) = SearchDebouncer::spawn(DEFAULT_DEBOUNCE);
        search.submit("a");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        search.submit("b");
        assert_eq!(rx.recv().await, Some(SearchInput::Query("a".into())));
        assert_eq!(rx.recv().await, Some(SearchInput::Query("b".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_producer_flushes_pending_text() {
        let (search, mut rx) = SearchDebouncer::spawn(DEFAULT_DEBOUNCE);
        search.submit("pending");
        drop(search);
        assert_eq!(rx.recv().await, Some(SearchInput::Query("pending".into())));
        assert_eq!(rx.recv().await, None);
    }
}
