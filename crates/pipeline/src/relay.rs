//! Bridge between a blocking, possibly high-frequency progress producer and
//! a rate-limited async display consumer.
//!
//! The producer only writes into a latest-wins slot and never touches
//! display I/O; a draining task polls the slot on a fixed cadence and edits
//! the status surface. Superseded events are dropped, the final event never
//! is.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::warn;

use cloudtune_media::ProgressEvent;

/// Drain cadence. Display edits never happen more often than this.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Consumer side: renders one progress snapshot onto the status surface.
/// Must be idempotent; may be slow.
#[async_trait]
pub trait ProgressDisplay: Send + Sync {
    async fn show(&self, event: &ProgressEvent) -> anyhow::Result<()>;
}

#[derive(Default, Clone)]
struct Slot {
    /// Bumped on every push so the drain loop can tell a fresh event from
    /// one it has already shown.
    seq: u64,
    event: Option<ProgressEvent>,
    closed: bool,
}

/// Producer handle. Cheap to clone; safe to call from any thread, including
/// the blocking worker, concurrently with draining.
#[derive(Clone)]
pub struct ProgressSink {
    tx: watch::Sender<Slot>,
}

impl ProgressSink {
    /// Store `event` as the newest snapshot, superseding any undrained one.
    /// Never blocks.
    pub fn push(&self, event: ProgressEvent) {
        self.tx.send_modify(|slot| {
            slot.seq += 1;
            slot.event = Some(event);
        });
    }

    /// Signal that no further events will arrive. The drain loop finishes
    /// delivering whatever is pending, then stops.
    pub fn close(&self) {
        self.tx.send_modify(|slot| slot.closed = true);
    }
}

/// Handle to the draining task.
pub struct ProgressRelay {
    task: tokio::task::JoinHandle<()>,
}

impl ProgressRelay {
    /// Start a drain loop feeding `display` and return the producer handle
    /// alongside it. Call [`ProgressSink::close`] once the producer is done,
    /// then [`ProgressRelay::join`].
    #[must_use]
    pub fn attach(display: Arc<dyn ProgressDisplay>) -> (ProgressSink, Self) {
        let (tx, mut rx) = watch::channel(Slot::default());

        let task = tokio::spawn(async move {
            let mut shown: u64 = 0;
            loop {
                let snapshot = rx.borrow_and_update().clone();

                if snapshot.seq > shown {
                    if let Some(ref event) = snapshot.event {
                        if let Err(e) = display.show(event).await {
                            // One failed edit must not kill the stream.
                            warn!(error = %e, "progress display update failed");
                        }
                    }
                    shown = snapshot.seq;
                }

                if snapshot.closed {
                    // A final push may have landed between the snapshot and
                    // the close flag; loop once more if so.
                    if rx.borrow().seq == shown {
                        break;
                    }
                    continue;
                }

                tokio::time::sleep(POLL_INTERVAL).await;
            }
        });

        (ProgressSink { tx }, Self { task })
    }

    /// Wait for the drain loop to deliver the final event and exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "progress relay task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records every shown event; optionally fails the first `fail_first`
    /// calls.
    struct RecordingDisplay {
        shown: Mutex<Vec<ProgressEvent>>,
        fail_first: Mutex<usize>,
    }

    impl RecordingDisplay {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                shown: Mutex::new(Vec::new()),
                fail_first: Mutex::new(0),
            })
        }

        fn failing(n: usize) -> Arc<Self> {
            let display = Self::new();
            *display.fail_first.lock().unwrap() = n;
            display
        }

        fn events(&self) -> Vec<ProgressEvent> {
            self.shown.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProgressDisplay for RecordingDisplay {
        async fn show(&self, event: &ProgressEvent) -> anyhow::Result<()> {
            self.shown.lock().unwrap().push(event.clone());
            let mut fail = self.fail_first.lock().unwrap();
            if *fail > 0 {
                *fail -= 1;
                anyhow::bail!("edit rejected");
            }
            Ok(())
        }
    }

    fn event(fraction: f64) -> ProgressEvent {
        ProgressEvent {
            fraction,
            text: format!("at {fraction}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn final_event_is_always_delivered() {
        let display = RecordingDisplay::new();
        let (sink, relay) = ProgressRelay::attach(display.clone());

        for f in [10.0, 20.0, 30.0, 99.0] {
            sink.push(event(f));
        }
        sink.close();
        relay.join().await;

        let shown = display.events();
        assert!(!shown.is_empty());
        assert_eq!(shown.last().unwrap(), &event(99.0));
    }

    #[tokio::test(start_paused = true)]
    async fn intermediate_events_may_coalesce() {
        let display = RecordingDisplay::new();
        let (sink, relay) = ProgressRelay::attach(display.clone());

        sink.push(event(1.0));
        tokio::time::sleep(POLL_INTERVAL * 2).await;
        sink.push(event(2.0));
        sink.push(event(3.0));
        sink.close();
        relay.join().await;

        let shown = display.events();
        // 1.0 drained on an earlier tick; 2.0 was superseded before any tick
        // saw it.
        assert_eq!(shown.first().unwrap(), &event(1.0));
        assert_eq!(shown.last().unwrap(), &event(3.0));
        assert!(!shown.contains(&event(2.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn display_failure_is_not_fatal() {
        let display = RecordingDisplay::failing(1);
        let (sink, relay) = ProgressRelay::attach(display.clone());

        sink.push(event(50.0));
        tokio::time::sleep(POLL_INTERVAL * 2).await;
        sink.push(event(100.0));
        sink.close();
        relay.join().await;

        let shown = display.events();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown.last().unwrap(), &event(100.0));
    }

    #[tokio::test(start_paused = true)]
    async fn close_without_events_shows_nothing() {
        let display = RecordingDisplay::new();
        let (sink, relay) = ProgressRelay::attach(display.clone());

        sink.close();
        relay.join().await;

        assert!(display.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn push_from_worker_thread_is_supported() {
        let display = RecordingDisplay::new();
        let (sink, relay) = ProgressRelay::attach(display.clone());

        let worker_sink = sink.clone();
        let worker = tokio::task::spawn_blocking(move || {
            for f in [25.0, 50.0, 75.0, 100.0] {
                worker_sink.push(event(f));
            }
        });
        worker.await.unwrap();
        sink.close();
        relay.join().await;

        assert_eq!(display.events().last().unwrap(), &event(100.0));
    }
}
