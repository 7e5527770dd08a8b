//! Sensor Link State
//!
//! Connection state machine for the impact sensor, kept free of any BLE
//! handles so every transition can be exercised without hardware.
//!
//! ```text
//! Disconnected ──scan──▶ Scanning ──match──▶ Connecting ──subscribed──▶ Connected
//!      ▲                    │                     │                         │
//!      └────timeout─────────┘                     └──fail──▶ Error ◀──fail──┘
//!      ▲                                                      │
//!      └───────────────────────────scan───────────────────────┘
//! ```

use crate::domain::error::{AppError, AppResult};
use crate::domain::impact::{Impact, ImpactCounter};
use crate::domain::models::ConnectionStatus;
use crate::infrastructure::bluetooth::protocol;

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationOutcome {
    /// Not connected, payload discarded
    Ignored,
    /// Payload could not be decoded, nothing stored
    Dropped(AppError),
    Reading { count: i32, impact: Option<Impact> },
}

#[derive(Debug)]
pub struct SensorLink {
    status: ConnectionStatus,
    device: Option<String>,
    impacts: ImpactCounter,
}

impl Default for SensorLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorLink {
    pub fn new() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            device: None,
            impacts: ImpactCounter::new(),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn last_count(&self) -> i32 {
        self.impacts.last()
    }

    pub fn begin_scan(&mut self) -> AppResult<()> {
        match self.status {
            ConnectionStatus::Disconnected | ConnectionStatus::Error => {
                self.status = ConnectionStatus::Scanning;
                self.device = None;
                Ok(())
            }
            other => Err(AppError::InvalidState(format!(
                "cannot scan while {}",
                other.label()
            ))),
        }
    }

    /// Scan stopped without a match. Returns `true` if the state changed.
    pub fn end_scan(&mut self) -> bool {
        if self.status == ConnectionStatus::Scanning {
            self.status = ConnectionStatus::Disconnected;
            true
        } else {
            false
        }
    }

    pub fn begin_connect(&mut self, device: &str) -> AppResult<()> {
        match self.status {
            ConnectionStatus::Disconnected | ConnectionStatus::Scanning => {
                self.status = ConnectionStatus::Connecting;
                self.device = Some(device.to_string());
                Ok(())
            }
            other => Err(AppError::InvalidState(format!(
                "cannot connect while {}",
                other.label()
            ))),
        }
    }

    /// Subscription is live; counting starts over for this connection.
    pub fn connected(&mut self) -> AppResult<()> {
        if self.status != ConnectionStatus::Connecting {
            return Err(AppError::InvalidState(format!(
                "unexpected subscription while {}",
                self.status.label()
            )));
        }
        self.status = ConnectionStatus::Connected;
        self.impacts.reset();
        Ok(())
    }

    pub fn fail(&mut self) {
        self.status = ConnectionStatus::Error;
        self.device = None;
    }

    /// Local or peripheral-initiated disconnect. Returns `true` if the state
    /// changed.
    pub fn disconnected(&mut self) -> bool {
        self.device = None;
        let changed = self.status != ConnectionStatus::Disconnected;
        self.status = ConnectionStatus::Disconnected;
        changed
    }

    pub fn on_notification(&mut self, payload: &[u8]) -> NotificationOutcome {
        if self.status != ConnectionStatus::Connected {
            return NotificationOutcome::Ignored;
        }
        match protocol::decode_impact(payload) {
            Ok(count) => NotificationOutcome::Reading {
                count,
                impact: self.impacts.observe(count),
            },
            Err(e) => NotificationOutcome::Dropped(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_link() -> SensorLink {
        let mut link = SensorLink::new();
        link.begin_scan().unwrap();
        link.begin_connect("sensor-1").unwrap();
        link.connected().unwrap();
        link
    }

    fn le(v: i32) -> [u8; 4] {
        v.to_le_bytes()
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut link = SensorLink::new();
        link.begin_scan().unwrap();
        assert_eq!(link.status(), ConnectionStatus::Scanning);
        link.begin_connect("sensor-1").unwrap();
        assert_eq!(link.status(), ConnectionStatus::Connecting);
        assert_eq!(link.device(), Some("sensor-1"));
        link.connected().unwrap();
        assert_eq!(link.status(), ConnectionStatus::Connected);
        assert!(link.disconnected());
        assert_eq!(link.status(), ConnectionStatus::Disconnected);
        assert_eq!(link.device(), None);
    }

    #[test]
    fn test_disconnect_without_connection_is_noop() {
        let mut link = SensorLink::new();
        assert!(!link.disconnected());
        assert!(!link.disconnected());
        assert_eq!(link.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_scan_timeout_returns_to_disconnected() {
        let mut link = SensorLink::new();
        link.begin_scan().unwrap();
        assert!(link.end_scan());
        assert_eq!(link.status(), ConnectionStatus::Disconnected);
        assert!(!link.end_scan());
    }

    #[test]
    fn test_error_recovers_only_through_scan() {
        let mut link = SensorLink::new();
        link.begin_scan().unwrap();
        link.begin_connect("sensor-1").unwrap();
        link.fail();
        assert_eq!(link.status(), ConnectionStatus::Error);
        assert_eq!(link.device(), None);

        assert!(matches!(
            link.begin_connect("sensor-1"),
            Err(AppError::InvalidState(_))
        ));
        link.begin_scan().unwrap();
        assert_eq!(link.status(), ConnectionStatus::Scanning);
    }

    #[test]
    fn test_scan_rejected_while_connected() {
        let mut link = connected_link();
        assert!(link.begin_scan().is_err());
        assert_eq!(link.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn test_increase_reports_impact() {
        let mut link = connected_link();
        let outcome = link.on_notification(&le(1));
        assert_eq!(
            outcome,
            NotificationOutcome::Reading {
                count: 1,
                impact: Some(Impact {
                    previous: 0,
                    count: 1
                })
            }
        );
        assert_eq!(
            link.on_notification(&le(1)),
            NotificationOutcome::Reading {
                count: 1,
                impact: None
            }
        );
    }

    #[test]
    fn test_short_payload_keeps_last_count() {
        let mut link = connected_link();
        link.on_notification(&le(4));
        assert!(matches!(
            link.on_notification(&[0x09, 0x00]),
            NotificationOutcome::Dropped(AppError::DecodeFailure(_))
        ));
        assert_eq!(link.last_count(), 4);
    }

    #[test]
    fn test_notifications_ignored_when_not_connected() {
        let mut link = SensorLink::new();
        assert_eq!(link.on_notification(&le(3)), NotificationOutcome::Ignored);
        assert_eq!(link.last_count(), 0);
    }

    #[test]
    fn test_new_connection_resets_count() {
        let mut link = connected_link();
        link.on_notification(&le(8));
        link.disconnected();
        link.begin_scan().unwrap();
        link.begin_connect("sensor-1").unwrap();
        link.connected().unwrap();
        assert_eq!(link.last_count(), 0);
    }
}
