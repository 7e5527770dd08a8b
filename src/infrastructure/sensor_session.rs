//! Sensor Session
//!
//! Owns the Bluetooth service and shot recorder tasks for as long as the
//! active session screen is open. Dropping the session closes the command
//! channel; the service then disconnects, releases the adapter and drops the
//! impact sender, which in turn stops the recorder.

use crate::domain::impact::Impact;
use crate::domain::models::{AppEvent, BluetoothCommand};
use crate::domain::progress::SharedSession;
use crate::domain::recorder::{ShotRecorder, ShotSink};
use crate::infrastructure::bluetooth::{BluetoothService, SensorConfig};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct SensorSession {
    commands: mpsc::UnboundedSender<BluetoothCommand>,
    bridge: JoinHandle<()>,
    recorder: JoinHandle<()>,
}

impl SensorSession {
    pub fn start<S>(
        runtime: &Handle,
        config: SensorConfig,
        sink: S,
        session: SharedSession,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self
    where
        S: ShotSink + 'static,
    {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (impact_tx, impact_rx) = mpsc::unbounded_channel::<Impact>();

        let recorder = ShotRecorder::new(sink, session, events.clone());
        let recorder = runtime.spawn(recorder.run(impact_rx));

        let service = BluetoothService::new(config, events, impact_tx);
        let bridge = runtime.spawn(service.run(command_rx));

        info!("Sensor session opened");
        Self {
            commands,
            bridge,
            recorder,
        }
    }

    /// Queue a command for the Bluetooth service
    pub fn send(&self, command: BluetoothCommand) {
        if self.commands.send(command).is_err() {
            warn!("Bluetooth service is not running");
        }
    }

    /// Close and wait for both tasks to wind down
    pub async fn close(self) {
        let Self {
            commands,
            bridge,
            recorder,
        } = self;
        drop(commands);
        if let Err(e) = bridge.await {
            warn!("Bluetooth task ended abnormally: {}", e);
        }
        if let Err(e) = recorder.await {
            warn!("Recorder task ended abnormally: {}", e);
        }
        info!("Sensor session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::domain::models::ConnectionStatus;
    use crate::domain::settings::Settings;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CountingSink {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ShotSink for Arc<CountingSink> {
        async fn record_made_shot(
            &self,
            _user_id: i64,
            _session_id: i64,
            _block_id: i64,
        ) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_close_stops_both_tasks() {
        let (events, mut event_rx) = mpsc::unbounded_channel();
        let sink = Arc::new(CountingSink::default());
        let session: SharedSession = Arc::new(Mutex::new(None));
        let config = SensorConfig::from_settings(&Settings::default()).unwrap();

        let sensor = SensorSession::start(&Handle::current(), config, sink.clone(), session, events);
        sensor.send(BluetoothCommand::InjectNotification(vec![2, 0, 0, 0]));
        sensor.send(BluetoothCommand::Disconnect);
        sensor.close().await;

        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
        while let Ok(event) = event_rx.try_recv() {
            assert!(!matches!(
                event,
                AppEvent::ImpactCount(_) | AppEvent::ConnectionStatus(ConnectionStatus::Connected)
            ));
        }
    }
}
