//! Inserter worker.
//!
//! An inserter drains the shared record channel, issuing one insert per
//! record. It reports completion once the channel is closed and drained,
//! and keeps an idle timeout purely as a liveness report: an idle period
//! is signalled to the harness but never ends the worker. The only way
//! out is the cancellation token held by the harness.
//!
//! ```text
//!            record                 idle timeout
//!   ┌──────────────────┐      ┌──────────────────────┐
//!   ▼                  │      │                      ▼
//! Active ──────────────┴──────┘               IdleReported
//!   │  ▲                                         │
//!   │  └───────────────── record ────────────────┘
//!   │ channel closed                             │ channel closed
//!   ▼                                            ▼
//! Drained ◄──────────────────────────────────────┘
//!   │ cancel (from any state)
//!   ▼
//! Stopped
//! ```

use crate::error::BenchError;
use crate::model::{Record, Variant};
use crate::store::RecordStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Idle window after which an inserter reports that no work arrived.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(100);

/// Receiving end shared by all inserters; each record reaches exactly one.
pub type SharedReceiver = Arc<Mutex<mpsc::Receiver<Record>>>;

/// Why an inserter signalled the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// No record arrived within the idle window.
    Idle,
    /// The channel is closed and empty: no more work will come.
    Drained,
}

/// Notification sent from an inserter to the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSignal {
    pub worker: usize,
    pub reason: CompletionReason,
}

/// Lifecycle of an inserter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InserterState {
    Active,
    IdleReported,
    Drained,
    Stopped,
}

/// Inputs driving [`InserterState::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InserterEvent {
    Record,
    IdleTimeout,
    ChannelClosed,
    Cancelled,
}

impl InserterState {
    /// Apply `event`, returning the next state and the signal to emit, if any.
    ///
    /// Each idle stretch is reported once, and `Drained` is emitted at most
    /// once over the worker's lifetime.
    pub fn transition(self, event: InserterEvent) -> (InserterState, Option<CompletionReason>) {
        use InserterState::*;
        match (self, event) {
            (_, InserterEvent::Cancelled) | (Stopped, _) => (Stopped, None),
            (Drained, _) => (Drained, None),
            (_, InserterEvent::ChannelClosed) => (Drained, Some(CompletionReason::Drained)),
            (Active, InserterEvent::IdleTimeout) => (IdleReported, Some(CompletionReason::Idle)),
            (IdleReported, InserterEvent::IdleTimeout) => (IdleReported, None),
            (Active | IdleReported, InserterEvent::Record) => (Active, None),
        }
    }
}

/// Counters returned when an inserter stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InserterStats {
    pub worker: usize,
    pub rows_inserted: u64,
    pub idle_reports: u64,
}

/// Worker that inserts records pulled from the shared channel.
pub struct Inserter {
    worker: usize,
    variant: Variant,
    store: Arc<dyn RecordStore>,
    input: SharedReceiver,
    completions: mpsc::UnboundedSender<CompletionSignal>,
    idle_timeout: Duration,
}

impl Inserter {
    pub fn new(
        worker: usize,
        variant: Variant,
        store: Arc<dyn RecordStore>,
        input: SharedReceiver,
        completions: mpsc::UnboundedSender<CompletionSignal>,
    ) -> Self {
        Self {
            worker,
            variant,
            store,
            input,
            completions,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Set the idle window.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Run until `cancel` fires or an insert fails.
    pub async fn run(self, cancel: CancellationToken) -> Result<InserterStats, BenchError> {
        let label = self.variant.worker_label();
        info!("{}Inserter started...", label);

        let mut state = InserterState::Active;
        let mut stats = InserterStats {
            worker: self.worker,
            ..Default::default()
        };

        while state != InserterState::Stopped {
            let event = if state == InserterState::Drained {
                cancel.cancelled().await;
                InserterEvent::Cancelled
            } else {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => InserterEvent::Cancelled,
                    next = self.next_record() => match next {
                        Ok(Some(record)) => {
                            self.insert(&record).await?;
                            stats.rows_inserted += 1;
                            InserterEvent::Record
                        }
                        Ok(None) => InserterEvent::ChannelClosed,
                        Err(_) => InserterEvent::IdleTimeout,
                    },
                }
            };

            let (next_state, signal) = state.transition(event);
            state = next_state;

            if let Some(reason) = signal {
                match reason {
                    CompletionReason::Idle => {
                        stats.idle_reports += 1;
                        debug!(
                            "{}Inserter {} idle for {:?}",
                            label, self.worker, self.idle_timeout
                        );
                    }
                    CompletionReason::Drained => info!("{}Inserter done", label),
                }
                let signal = CompletionSignal {
                    worker: self.worker,
                    reason,
                };
                if self.completions.send(signal).is_err() {
                    // Nobody is listening any more.
                    state = InserterState::Stopped;
                }
            }
        }

        debug!(
            "{}Inserter {} stopped after {} rows",
            label, self.worker, stats.rows_inserted
        );
        Ok(stats)
    }

    /// Wait for the next record, bounded by the idle window.
    ///
    /// Time spent waiting for the shared receiver counts toward the window.
    async fn next_record(&self) -> Result<Option<Record>, tokio::time::error::Elapsed> {
        tokio::time::timeout(self.idle_timeout, async {
            self.input.lock().await.recv().await
        })
        .await
    }

    async fn insert(&self, record: &Record) -> Result<(), BenchError> {
        self.store
            .insert(record)
            .await
            .map_err(|source| BenchError::Insert {
                worker: self.worker,
                table: record.variant().table_name(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::build_batch;
    use crate::memory::MemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spawn_inserter(
        store: Arc<MemoryStore>,
        rx: mpsc::Receiver<Record>,
    ) -> (
        tokio::task::JoinHandle<Result<InserterStats, BenchError>>,
        mpsc::UnboundedReceiver<CompletionSignal>,
        CancellationToken,
    ) {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let inserter = Inserter::new(
            7,
            Variant::AutoIncrement,
            store,
            Arc::new(Mutex::new(rx)),
            done_tx,
        );
        let handle = tokio::spawn(inserter.run(cancel.clone()));
        (handle, done_rx, cancel)
    }

    #[test]
    fn test_transition_reports_idle_once_per_stretch() {
        let (state, signal) = InserterState::Active.transition(InserterEvent::IdleTimeout);
        assert_eq!(state, InserterState::IdleReported);
        assert_eq!(signal, Some(CompletionReason::Idle));

        let (state, signal) = state.transition(InserterEvent::IdleTimeout);
        assert_eq!(state, InserterState::IdleReported);
        assert_eq!(signal, None);

        let (state, _) = state.transition(InserterEvent::Record);
        assert_eq!(state, InserterState::Active);
        let (_, signal) = state.transition(InserterEvent::IdleTimeout);
        assert_eq!(signal, Some(CompletionReason::Idle));
    }

    #[test]
    fn test_transition_drained_is_terminal_until_cancel() {
        let (state, signal) = InserterState::IdleReported.transition(InserterEvent::ChannelClosed);
        assert_eq!(state, InserterState::Drained);
        assert_eq!(signal, Some(CompletionReason::Drained));

        for event in [
            InserterEvent::Record,
            InserterEvent::IdleTimeout,
            InserterEvent::ChannelClosed,
        ] {
            assert_eq!(state.transition(event), (InserterState::Drained, None));
        }
        assert_eq!(
            state.transition(InserterEvent::Cancelled),
            (InserterState::Stopped, None)
        );
    }

    #[test]
    fn test_transition_cancel_from_any_state() {
        for state in [
            InserterState::Active,
            InserterState::IdleReported,
            InserterState::Drained,
            InserterState::Stopped,
        ] {
            assert_eq!(
                state.transition(InserterEvent::Cancelled),
                (InserterState::Stopped, None)
            );
        }
    }

    #[tokio::test]
    async fn test_inserts_every_record_then_reports_drained() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = mpsc::channel(1);
        let (handle, mut done_rx, cancel) = spawn_inserter(store.clone(), rx);

        for record in build_batch(Variant::AutoIncrement, 40, &mut StdRng::seed_from_u64(1)) {
            tx.send(record).await.unwrap();
        }
        drop(tx);

        loop {
            let signal = done_rx.recv().await.unwrap();
            assert_eq!(signal.worker, 7);
            if signal.reason == CompletionReason::Drained {
                break;
            }
        }
        cancel.cancel();

        let stats = handle.await.unwrap().unwrap();
        assert_eq!(stats.rows_inserted, 40);
        assert_eq!(store.row_count(Variant::AutoIncrement).await.unwrap(), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_periods_do_not_complete_the_worker() {
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = mpsc::channel(1);
        let (handle, mut done_rx, cancel) = spawn_inserter(store.clone(), rx);

        let mut rng = StdRng::seed_from_u64(2);
        for record in build_batch(Variant::AutoIncrement, 3, &mut rng) {
            tokio::time::sleep(Duration::from_millis(350)).await;
            tx.send(record).await.unwrap();
        }
        drop(tx);

        let mut idle = 0;
        let mut drained = 0;
        while let Some(signal) = done_rx.recv().await {
            match signal.reason {
                CompletionReason::Idle => idle += 1,
                CompletionReason::Drained => {
                    drained += 1;
                    cancel.cancel();
                }
            }
        }

        assert_eq!(drained, 1);
        assert!(idle >= 3, "expected an idle report per gap, got {idle}");
        let stats = handle.await.unwrap().unwrap();
        assert_eq!(stats.rows_inserted, 3);
        assert_eq!(stats.idle_reports, idle);
    }

    #[tokio::test]
    async fn test_insert_failure_is_fatal() {
        let store = Arc::new(MemoryStore::new().with_failure_on_insert(3));
        let (tx, rx) = mpsc::channel(1);
        let (handle, _done_rx, _cancel) = spawn_inserter(store.clone(), rx);

        let producer = tokio::spawn(async move {
            for record in build_batch(Variant::AutoIncrement, 10, &mut StdRng::seed_from_u64(3)) {
                if tx.send(record).await.is_err() {
                    break;
                }
            }
        });

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            BenchError::Insert {
                worker: 7,
                table: "big_serial_model",
                ..
            }
        ));
        producer.await.unwrap();
        assert_eq!(store.row_count(Variant::AutoIncrement).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cancel_stops_an_active_worker() {
        let store = Arc::new(MemoryStore::new());
        let (_tx, rx) = mpsc::channel(1);
        let (handle, _done_rx, cancel) = spawn_inserter(store, rx);

        cancel.cancel();
        let stats = handle.await.unwrap().unwrap();
        assert_eq!(stats.rows_inserted, 0);
    }
}
