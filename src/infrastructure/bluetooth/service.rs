//! Bluetooth Service Module
//!
//! Main service that coordinates scanning, connection, and impact
//! notifications for the AccuAim sensor. Runs as a single task; commands,
//! adapter events, notifications, the pending connect attempt and the scan
//! deadline are all handled from one `select!` loop so the link state never
//! needs a lock. A Disconnect while connecting drops the attempt.

use crate::domain::error::{AppError, AppResult};
use crate::domain::impact::Impact;
use crate::domain::models::{
    AppEvent, BluetoothCommand, ConnectionStatus, MessageSeverity, ScannedDevice, StatusMessage,
};
use crate::domain::settings::Settings;
use crate::infrastructure::bluetooth::{
    connection::{BleConnection, ConnectionConfig, ConnectionResult, NotificationStream},
    link::{NotificationOutcome, SensorLink},
    scanner::{self, BleScanner, DeviceMatcher},
};
use btleplug::api::{Central, CentralEvent, Characteristic, Peripheral as _};
use btleplug::platform::Peripheral;
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

type CentralEvents = Pin<Box<dyn Stream<Item = CentralEvent> + Send>>;
type ConnectAttempt = Pin<Box<dyn Future<Output = AppResult<ConnectionResult>> + Send>>;

/// Sensor settings resolved once when the service starts
#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub matcher: DeviceMatcher,
    pub connection: ConnectionConfig,
    pub scan_timeout: Duration,
}

impl SensorConfig {
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        let connection = ConnectionConfig::new(
            &settings.ble_service_uuid,
            &settings.ble_impact_char_uuid,
            settings.connect_timeout(),
        )?;
        Ok(Self {
            matcher: DeviceMatcher {
                device_name: settings.sensor_name.clone(),
                service_uuid: connection.service_uuid,
                filter_by_name: settings.filter_by_name,
            },
            connection,
            scan_timeout: settings.scan_timeout(),
        })
    }
}

struct ConnectedSensor {
    peripheral: Peripheral,
    characteristic: Characteristic,
}

/// Connect + discovery in flight; dropping it abandons the attempt
struct PendingConnect {
    device: String,
    attempt: ConnectAttempt,
}

/// Main Bluetooth service coordinating all BLE operations
pub struct BluetoothService {
    config: SensorConfig,
    link: SensorLink,
    scanner: Option<BleScanner>,
    central_events: Option<CentralEvents>,
    discovered: HashMap<String, Peripheral>,
    sensor: Option<ConnectedSensor>,
    connecting: Option<PendingConnect>,
    notifications: Option<NotificationStream>,
    scan_deadline: Option<Instant>,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    impact_sender: mpsc::UnboundedSender<Impact>,
}

impl BluetoothService {
    pub fn new(
        config: SensorConfig,
        event_sender: mpsc::UnboundedSender<AppEvent>,
        impact_sender: mpsc::UnboundedSender<Impact>,
    ) -> Self {
        Self {
            config,
            link: SensorLink::new(),
            scanner: None,
            central_events: None,
            discovered: HashMap::new(),
            sensor: None,
            connecting: None,
            notifications: None,
            scan_deadline: None,
            event_sender,
            impact_sender,
        }
    }

    /// Serve commands until the command channel closes, then release the
    /// sensor and the adapter.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<BluetoothCommand>) {
        info!("Bluetooth service started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                event = next_item(&mut self.central_events) => match event {
                    Some(event) => self.handle_central_event(event).await,
                    None => self.central_events = None,
                },
                notification = next_item(&mut self.notifications) => match notification {
                    Some(notification) => {
                        if notification.uuid == self.config.connection.impact_char_uuid {
                            self.handle_notification(&notification.value);
                        }
                    }
                    None => self.handle_link_lost().await,
                },
                result = connect_outcome(&mut self.connecting) => {
                    self.connecting = None;
                    self.finish_connect(result);
                }
                _ = deadline(self.scan_deadline) => self.handle_scan_timeout().await,
            }
        }

        self.disconnect().await;
        info!("Bluetooth service stopped");
    }

    async fn handle_command(&mut self, command: BluetoothCommand) {
        match command {
            BluetoothCommand::StartScan => {
                if let Err(e) = self.start_scan().await {
                    self.report(&e);
                }
            }
            BluetoothCommand::StopScan => {
                self.stop_scan().await;
                if self.link.end_scan() {
                    self.send_status();
                }
            }
            BluetoothCommand::Connect(id) => self.connect(id).await,
            BluetoothCommand::Disconnect => self.disconnect().await,
            BluetoothCommand::InjectNotification(payload) => {
                info!("Injecting {} byte notification", payload.len());
                self.handle_notification(&payload);
            }
        }
    }

    async fn start_scan(&mut self) -> AppResult<()> {
        let access = self.ensure_adapter().await;
        self.admit_scan(access)?;

        if let Err(e) = self.start_adapter_scan().await {
            self.link.fail();
            self.send_status();
            return Err(e);
        }

        self.scan_deadline = Some(Instant::now() + self.config.scan_timeout);
        self.send_log("Scanning for sensor...", MessageSeverity::Info);
        Ok(())
    }

    async fn ensure_adapter(&mut self) -> AppResult<()> {
        match &self.scanner {
            Some(scanner) => scanner::check_access(scanner.adapter()).await,
            None => {
                self.scanner = Some(BleScanner::new(scanner::open_adapter().await?));
                Ok(())
            }
        }
    }

    /// Enter `Scanning` once the adapter is usable. A refused adapter leaves
    /// the link state untouched.
    fn admit_scan(&mut self, access: AppResult<()>) -> AppResult<()> {
        access?;
        self.link.begin_scan()?;
        self.discovered.clear();
        self.send_status();
        Ok(())
    }

    async fn start_adapter_scan(&mut self) -> AppResult<()> {
        let scanner = self
            .scanner
            .as_mut()
            .ok_or_else(|| AppError::InvalidState("adapter not open".into()))?;
        if self.central_events.is_none() {
            self.central_events = Some(scanner.adapter().events().await?);
        }
        scanner.start(self.config.matcher.service_uuid).await
    }

    async fn stop_scan(&mut self) {
        self.scan_deadline = None;
        if let Some(scanner) = self.scanner.as_mut() {
            scanner.stop().await;
        }
    }

    async fn handle_scan_timeout(&mut self) {
        self.stop_scan().await;
        if self.link.end_scan() {
            warn!("Scan timed out without finding the sensor");
            self.send_status();
            self.send_log("No sensor found", MessageSeverity::Warning);
        }
    }

    async fn handle_central_event(&mut self, event: CentralEvent) {
        match event {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                if self.link.status() != ConnectionStatus::Scanning {
                    return;
                }
                let Some(scanner) = self.scanner.as_ref() else {
                    return;
                };
                let Some((peripheral, name, rssi)) =
                    scanner.inspect(&id, &self.config.matcher).await
                else {
                    return;
                };

                let key = id.to_string();
                if self.discovered.contains_key(&key) {
                    return;
                }
                info!("Found sensor: {} ({})", name, key);
                self.discovered.insert(key.clone(), peripheral);
                let _ = self.event_sender.send(AppEvent::DeviceFound(ScannedDevice {
                    id: key.clone(),
                    name,
                    signal_strength: rssi,
                }));

                // First match wins
                self.connect(key).await;
            }
            CentralEvent::DeviceDisconnected(id) => {
                let ours = self
                    .sensor
                    .as_ref()
                    .is_some_and(|s| s.peripheral.id() == id);
                if ours {
                    self.handle_link_lost().await;
                }
            }
            _ => {}
        }
    }

    async fn connect(&mut self, id: String) {
        let Some(peripheral) = self.discovered.get(&id).cloned() else {
            self.report(&AppError::ConnectionFailure(format!("unknown device {}", id)));
            return;
        };

        if let Err(e) = self.link.begin_connect(&id) {
            self.report(&e);
            return;
        }
        self.stop_scan().await;
        self.send_status();
        self.send_log("Connecting to sensor...", MessageSeverity::Info);

        let connection = BleConnection::new(self.config.connection.clone());
        self.connecting = Some(PendingConnect {
            device: id,
            attempt: Box::pin(async move { connection.connect(peripheral).await }),
        });
    }

    fn finish_connect(&mut self, result: AppResult<ConnectionResult>) {
        match result {
            Ok(result) => {
                self.notifications = Some(result.notifications);
                self.sensor = Some(ConnectedSensor {
                    peripheral: result.peripheral,
                    characteristic: result.impact_characteristic,
                });
                if let Err(e) = self.link.connected() {
                    self.report(&e);
                    return;
                }
                info!("Sensor {} connected", self.link.device().unwrap_or("?"));
                self.send_status();
                self.send_log("Sensor connected", MessageSeverity::Success);
            }
            Err(e) => {
                self.link.fail();
                self.send_status();
                self.report(&e);
            }
        }
    }

    async fn disconnect(&mut self) {
        self.stop_scan().await;
        self.notifications = None;

        if let Some(pending) = self.connecting.take() {
            info!("Connection attempt to {} cancelled", pending.device);
            if let Some(peripheral) = self.discovered.get(&pending.device) {
                if let Err(e) = peripheral.disconnect().await {
                    debug!("Disconnect after cancel failed: {}", e);
                }
            }
            self.send_log("Connection cancelled", MessageSeverity::Info);
        }

        if let Some(sensor) = self.sensor.take() {
            BleConnection::teardown(&sensor.peripheral, &sensor.characteristic).await;
            info!("Disconnected from sensor");
            self.send_log("Disconnected from sensor", MessageSeverity::Info);
        }
        if self.link.disconnected() {
            self.send_status();
        }
    }

    /// Peripheral went away on its own
    async fn handle_link_lost(&mut self) {
        self.notifications = None;
        if let Some(sensor) = self.sensor.take() {
            warn!("Sensor {} dropped the connection", sensor.peripheral.id());
        }
        if self.link.disconnected() {
            self.send_status();
            self.send_log("Sensor disconnected", MessageSeverity::Warning);
        }
    }

    fn handle_notification(&mut self, payload: &[u8]) {
        match self.link.on_notification(payload) {
            NotificationOutcome::Ignored => {
                debug!("Notification ignored while {}", self.link.status().label());
            }
            NotificationOutcome::Dropped(e) => {
                warn!("Dropping notification: {}", e);
            }
            NotificationOutcome::Reading { count, impact } => {
                let _ = self.event_sender.send(AppEvent::ImpactCount(count));
                if let Some(impact) = impact {
                    debug!("Impact {} -> {}", impact.previous, impact.count);
                    if self.impact_sender.send(impact).is_err() {
                        warn!("Shot recorder is gone, impact not recorded");
                    }
                }
            }
        }
    }

    fn send_status(&self) {
        let _ = self
            .event_sender
            .send(AppEvent::ConnectionStatus(self.link.status()));
    }

    fn send_log(&self, message: &str, severity: MessageSeverity) {
        let _ = self
            .event_sender
            .send(AppEvent::LogMessage(StatusMessage::new(message, severity)));
    }

    fn report(&self, e: &AppError) {
        error!("Bluetooth error: {}", e);
        self.send_log(&e.to_string(), MessageSeverity::Error);
    }
}

async fn next_item<S>(stream: &mut Option<S>) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn connect_outcome(pending: &mut Option<PendingConnect>) -> AppResult<ConnectionResult> {
    match pending {
        Some(pending) => (&mut pending.attempt).await,
        None => std::future::pending().await,
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (
        BluetoothService,
        mpsc::UnboundedReceiver<AppEvent>,
        mpsc::UnboundedReceiver<Impact>,
    ) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (impact_tx, impact_rx) = mpsc::unbounded_channel();
        let config = SensorConfig::from_settings(&Settings::default()).unwrap();
        (BluetoothService::new(config, event_tx, impact_tx), event_rx, impact_rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_config_from_default_settings() {
        let config = SensorConfig::from_settings(&Settings::default()).unwrap();
        assert_eq!(config.matcher.device_name, "AccuAim Sensor");
        assert!(config.matcher.filter_by_name);
        assert_eq!(config.scan_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_config_rejects_bad_uuid() {
        let settings = Settings {
            ble_impact_char_uuid: "zzz".into(),
            ..Settings::default()
        };
        assert!(SensorConfig::from_settings(&settings).is_err());
    }

    #[tokio::test]
    async fn test_injected_notification_ignored_while_disconnected() {
        let (mut service, mut events, mut impacts) = service();
        service
            .handle_command(BluetoothCommand::InjectNotification(vec![1, 0, 0, 0]))
            .await;
        assert!(drain(&mut events).is_empty());
        assert!(impacts.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_connected_notifications_forward_impacts() {
        let (mut service, mut events, mut impacts) = service();
        service.link.begin_connect("sensor-1").unwrap();
        service.link.connected().unwrap();

        service.handle_notification(&[1, 0, 0, 0]);
        service.handle_notification(&[1, 0, 0, 0]);
        service.handle_notification(&[2, 0]);
        service.handle_notification(&[3, 0, 0, 0]);

        let counts: Vec<i32> = drain(&mut events)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::ImpactCount(c) => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![1, 1, 3]);

        assert_eq!(impacts.try_recv().unwrap(), Impact { previous: 0, count: 1 });
        assert_eq!(impacts.try_recv().unwrap(), Impact { previous: 1, count: 3 });
        assert!(impacts.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_without_connection_is_silent() {
        let (mut service, mut events, _impacts) = service();
        service.handle_command(BluetoothCommand::Disconnect).await;
        service.handle_command(BluetoothCommand::Disconnect).await;
        assert!(drain(&mut events).is_empty());
        assert_eq!(service.link.status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_link_lost_reports_disconnect_once() {
        let (mut service, mut events, _impacts) = service();
        service.link.begin_connect("sensor-1").unwrap();
        service.link.connected().unwrap();

        service.handle_link_lost().await;
        service.handle_link_lost().await;

        let statuses: Vec<ConnectionStatus> = drain(&mut events)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::ConnectionStatus(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(statuses, vec![ConnectionStatus::Disconnected]);
    }

    #[tokio::test]
    async fn test_connect_unknown_device_keeps_state() {
        let (mut service, mut events, _impacts) = service();
        service
            .handle_command(BluetoothCommand::Connect("nope".into()))
            .await;
        assert_eq!(service.link.status(), ConnectionStatus::Disconnected);
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, AppEvent::LogMessage(m) if m.severity == MessageSeverity::Error)));
    }

    #[tokio::test]
    async fn test_refused_adapter_does_not_start_scan() {
        let (mut service, mut events, _impacts) = service();

        let err = service
            .admit_scan(Err(AppError::PermissionDenied("Bluetooth is turned off".into())))
            .unwrap_err();

        assert!(matches!(err, AppError::PermissionDenied(_)));
        assert_eq!(service.link.status(), ConnectionStatus::Disconnected);
        assert!(drain(&mut events).is_empty());

        service.admit_scan(Ok(())).unwrap();
        assert_eq!(service.link.status(), ConnectionStatus::Scanning);
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, AppEvent::ConnectionStatus(ConnectionStatus::Scanning))));
    }

    #[tokio::test]
    async fn test_cancel_while_connecting_is_handled_immediately() {
        let (mut service, mut events, _impacts) = service();
        service.link.begin_connect("sensor-1").unwrap();
        service.connecting = Some(PendingConnect {
            device: "sensor-1".into(),
            attempt: Box::pin(std::future::pending::<AppResult<ConnectionResult>>()),
        });

        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(service.run(rx));
        commands.send(BluetoothCommand::Disconnect).unwrap();

        let status = tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if let Some(AppEvent::ConnectionStatus(status)) = events.recv().await {
                    return status;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(status, ConnectionStatus::Disconnected);

        drop(commands);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_scan_timeout_returns_to_disconnected() {
        let (mut service, mut events, _impacts) = service();
        service.link.begin_scan().unwrap();
        service.scan_deadline = Some(Instant::now());

        service.handle_scan_timeout().await;

        assert_eq!(service.link.status(), ConnectionStatus::Disconnected);
        assert!(service.scan_deadline.is_none());
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, AppEvent::ConnectionStatus(ConnectionStatus::Disconnected))));
    }
}
