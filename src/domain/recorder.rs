//! Shot recording.
//!
//! Turns each detected impact into one "made" shot on the server and, once the
//! server acknowledges it, into one made shot on the local progress. Impacts
//! are handled strictly one at a time so acknowledgements can never be applied
//! out of order.

use crate::domain::error::AppError;
use crate::domain::impact::Impact;
use crate::domain::models::{AppEvent, MessageSeverity, StatusMessage};
use crate::domain::progress::SharedSession;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Where made shots are persisted.
#[async_trait]
pub trait ShotSink: Send + Sync {
    async fn record_made_shot(
        &self,
        user_id: i64,
        session_id: i64,
        block_id: i64,
    ) -> Result<(), AppError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// No session or no active block, nothing sent
    Skipped,
    Recorded {
        block_id: i64,
        made_shots: u32,
        advanced: bool,
        session_complete: bool,
    },
    /// Server acknowledged but the session changed while the request was out
    Stale,
    Failed(AppError),
}

#[derive(Debug, Clone, Copy)]
struct ShotTarget {
    user_id: i64,
    session_id: i64,
    block_id: i64,
}

pub struct ShotRecorder<S> {
    sink: S,
    session: SharedSession,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl<S: ShotSink> ShotRecorder<S> {
    pub fn new(sink: S, session: SharedSession, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            sink,
            session,
            events,
        }
    }

    /// Drain impacts until the bridge drops its sender.
    pub async fn run(self, mut impacts: mpsc::UnboundedReceiver<Impact>) {
        while let Some(impact) = impacts.recv().await {
            self.record(impact).await;
        }
        debug!("Impact channel closed, shot recorder stopping");
    }

    pub async fn record(&self, impact: Impact) -> RecordOutcome {
        let Some(target) = self.target() else {
            debug!(count = impact.count, "No active block, impact not recorded");
            return RecordOutcome::Skipped;
        };

        match self
            .sink
            .record_made_shot(target.user_id, target.session_id, target.block_id)
            .await
        {
            Ok(()) => self.apply(target),
            Err(e) => {
                warn!(%e, block_id = target.block_id, "Failed to record shot");
                self.send(AppEvent::LogMessage(StatusMessage::new(
                    format!("Shot not recorded: {}", e),
                    MessageSeverity::Error,
                )));
                RecordOutcome::Failed(e)
            }
        }
    }

    fn target(&self) -> Option<ShotTarget> {
        let guard = self.session.lock().ok()?;
        let active = guard.as_ref()?;
        let block = active.progress.active_block()?;
        Some(ShotTarget {
            user_id: active.user_id,
            session_id: active.session_id(),
            block_id: block.id,
        })
    }

    fn apply(&self, target: ShotTarget) -> RecordOutcome {
        let update = {
            let Ok(mut guard) = self.session.lock() else {
                return RecordOutcome::Stale;
            };
            match guard.as_mut() {
                Some(active) if active.session_id() == target.session_id => {
                    active.progress.record_made(target.block_id)
                }
                _ => None,
            }
        };

        let Some(update) = update else {
            info!(
                session_id = target.session_id,
                "Session changed while recording, acknowledgement dropped"
            );
            return RecordOutcome::Stale;
        };

        info!(
            block_id = update.block_id,
            made = update.made_shots,
            "Shot recorded"
        );
        self.send(AppEvent::ShotRecorded {
            block_id: update.block_id,
            made_shots: update.made_shots,
        });
        if update.session_complete {
            self.send(AppEvent::SessionComplete {
                session_id: target.session_id,
            });
        }

        RecordOutcome::Recorded {
            block_id: update.block_id,
            made_shots: update.made_shots,
            advanced: update.advanced,
            session_complete: update.session_complete,
        }
    }

    fn send(&self, event: AppEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::impact::ImpactCounter;
    use crate::domain::progress::tests::block;
    use crate::domain::progress::{ActiveSession, SessionProgress};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeSink {
        calls: Mutex<Vec<(i64, i64, i64)>>,
        fail: AtomicBool,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl ShotSink for Arc<FakeSink> {
        async fn record_made_shot(
            &self,
            user_id: i64,
            session_id: i64,
            block_id: i64,
        ) -> Result<(), AppError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.calls
                .lock()
                .unwrap()
                .push((user_id, session_id, block_id));
            if self.fail.load(Ordering::SeqCst) {
                Err(AppError::NetworkFailure("500 Internal Server Error".into()))
            } else {
                Ok(())
            }
        }
    }

    fn shared(blocks: Vec<crate::domain::models::Block>) -> SharedSession {
        Arc::new(Mutex::new(Some(ActiveSession {
            user_id: 7,
            progress: SessionProgress::new(42, blocks),
        })))
    }

    fn recorder(
        sink: Arc<FakeSink>,
        session: SharedSession,
    ) -> (
        ShotRecorder<Arc<FakeSink>>,
        mpsc::UnboundedReceiver<AppEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ShotRecorder::new(sink, session, tx), rx)
    }

    fn impact(previous: i32, count: i32) -> Impact {
        Impact { previous, count }
    }

    #[tokio::test]
    async fn test_success_increments_and_advances() {
        let sink = Arc::new(FakeSink::default());
        let session = shared(vec![block(10, 5, 4), block(11, 5, 0)]);
        let (recorder, _rx) = recorder(sink.clone(), session.clone());

        let outcome = recorder.record(impact(0, 1)).await;
        assert_eq!(
            outcome,
            RecordOutcome::Recorded {
                block_id: 10,
                made_shots: 5,
                advanced: true,
                session_complete: false
            }
        );
        assert_eq!(*sink.calls.lock().unwrap(), vec![(7, 42, 10)]);

        let guard = session.lock().unwrap();
        let progress = &guard.as_ref().unwrap().progress;
        assert_eq!(progress.active_block().map(|b| b.id), Some(11));
    }

    #[tokio::test]
    async fn test_failure_leaves_progress_unchanged() {
        let sink = Arc::new(FakeSink::default());
        sink.fail.store(true, Ordering::SeqCst);
        let session = shared(vec![block(10, 5, 4)]);
        let before = session.lock().unwrap().clone();
        let (recorder, mut rx) = recorder(sink.clone(), session.clone());

        let outcome = recorder.record(impact(0, 1)).await;
        assert!(matches!(
            outcome,
            RecordOutcome::Failed(AppError::NetworkFailure(_))
        ));
        assert_eq!(*session.lock().unwrap(), before);
        assert!(matches!(
            rx.try_recv(),
            Ok(AppEvent::LogMessage(StatusMessage {
                severity: MessageSeverity::Error,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_complete_session_sends_nothing() {
        let sink = Arc::new(FakeSink::default());
        let session = shared(vec![block(10, 5, 5), block(11, 5, 5)]);
        let (recorder, _rx) = recorder(sink.clone(), session);

        for count in 1..=3 {
            assert_eq!(
                recorder.record(impact(count - 1, count)).await,
                RecordOutcome::Skipped
            );
        }
        assert!(sink.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_session_is_skipped() {
        let sink = Arc::new(FakeSink::default());
        let (recorder, _rx) = recorder(sink.clone(), Arc::new(Mutex::new(None)));
        assert_eq!(recorder.record(impact(0, 1)).await, RecordOutcome::Skipped);
        assert!(sink.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_acknowledgement_for_replaced_session_is_dropped() {
        struct SwappingSink(SharedSession);

        #[async_trait]
        impl ShotSink for SwappingSink {
            async fn record_made_shot(
                &self,
                _user_id: i64,
                _session_id: i64,
                _block_id: i64,
            ) -> Result<(), AppError> {
                *self.0.lock().unwrap() = Some(ActiveSession {
                    user_id: 7,
                    progress: SessionProgress::new(43, vec![block(20, 2, 0)]),
                });
                Ok(())
            }
        }

        let session = shared(vec![block(10, 2, 0)]);
        let (tx, _rx) = mpsc::unbounded_channel();
        let recorder = ShotRecorder::new(SwappingSink(session.clone()), session.clone(), tx);

        assert_eq!(recorder.record(impact(0, 1)).await, RecordOutcome::Stale);
        let guard = session.lock().unwrap();
        assert_eq!(guard.as_ref().unwrap().progress.made_total(), 0);
    }

    #[tokio::test]
    async fn test_impact_sequence_records_twice_and_completes_block() {
        let sink = Arc::new(FakeSink::default());
        let session = shared(vec![block(10, 2, 0)]);
        let (recorder, mut events) = recorder(sink.clone(), session.clone());
        let (impact_tx, impact_rx) = mpsc::unbounded_channel();

        let mut counter = ImpactCounter::new();
        for reading in [0, 1, 1, 3, 3] {
            if let Some(impact) = counter.observe(reading) {
                impact_tx.send(impact).unwrap();
            }
        }
        drop(impact_tx);
        recorder.run(impact_rx).await;

        assert_eq!(sink.calls.lock().unwrap().len(), 2);
        assert_eq!(sink.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(session.lock().unwrap().as_ref().unwrap().progress.is_complete());

        let mut completed = false;
        while let Ok(event) = events.try_recv() {
            if let AppEvent::SessionComplete { session_id } = event {
                assert_eq!(session_id, 42);
                completed = true;
            }
        }
        assert!(completed);
    }
}
