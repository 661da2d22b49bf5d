// Word-by-word reveal of an already-computed reply. Purely presentational
// pacing: the full text exists before the first chunk is emitted.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Delay bounds between word chunks, in milliseconds. The actual delay is
/// uniformly jittered within the range.
#[derive(Debug, Clone, Copy)]
pub struct WordPacing {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for WordPacing {
    fn default() -> Self {
        Self {
            min_ms: 50,
            max_ms: 100,
        }
    }
}

impl WordPacing {
    /// Constant pacing, useful for tests.
    pub fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }
}

/// A finite, one-shot stream of word chunks. Concatenating every chunk
/// reconstructs the whitespace-normalized reply. Cancelling (or dropping the
/// stream) stops the producer; no chunk is emitted after cancellation is
/// observed.
pub struct RevealStream {
    rx: mpsc::Receiver<String>,
    cancel: Option<oneshot::Sender<()>>,
}

impl RevealStream {
    /// Next chunk, or `None` once the reveal has finished or been cancelled.
    pub async fn next_chunk(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Stop the reveal. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

/// Split `text` on whitespace and reveal it one word at a time on a jittered
/// delay, imitating token-by-token generation.
pub fn reveal(text: &str, pacing: WordPacing) -> RevealStream {
    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();

    // Capacity 1 keeps the producer in lockstep with the consumer, so a
    // cancelled reveal has at most one chunk already in flight.
    let (chunk_tx, chunk_rx) = mpsc::channel(1);
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let mut rng = StdRng::from_os_rng();

        for (index, word) in words.into_iter().enumerate() {
            let delay_ms = if pacing.min_ms >= pacing.max_ms {
                pacing.min_ms
            } else {
                rng.random_range(pacing.min_ms..=pacing.max_ms)
            };

            tokio::select! {
                // Fires on explicit cancel, and on stream drop
                _ = &mut cancel_rx => break,
                _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {
                    let chunk = if index == 0 {
                        word
                    } else {
                        format!(" {}", word)
                    };
                    if chunk_tx.send(chunk).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    RevealStream {
        rx: chunk_rx,
        cancel: Some(cancel_tx),
    }
}
