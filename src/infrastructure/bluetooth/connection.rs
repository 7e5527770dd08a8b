//! BLE Connection Module
//!
//! Handles device connection, GATT discovery, and the impact notification
//! subscription.

use crate::domain::error::{AppError, AppResult};
use crate::infrastructure::bluetooth::protocol;
use btleplug::api::{CharPropFlags, Characteristic, Peripheral as _, ValueNotification};
use btleplug::platform::Peripheral;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

pub type NotificationStream = Pin<Box<dyn Stream<Item = ValueNotification> + Send>>;

/// Configuration for connection behavior
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Service UUID to look for
    pub service_uuid: Uuid,
    /// Impact counter characteristic UUID
    pub impact_char_uuid: Uuid,
    /// Upper bound for connect and for service discovery, each
    pub connect_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(service_uuid: &str, impact_char_uuid: &str, connect_timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            service_uuid: protocol::parse_uuid(service_uuid)?,
            impact_char_uuid: protocol::parse_uuid(impact_char_uuid)?,
            connect_timeout,
        })
    }
}

/// Result of a successful connection
pub struct ConnectionResult {
    pub peripheral: Peripheral,
    pub impact_characteristic: Characteristic,
    pub notifications: NotificationStream,
}

/// BLE Connection handler
pub struct BleConnection {
    config: ConnectionConfig,
}

impl BleConnection {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Connect to the sensor and subscribe to impact notifications.
    ///
    /// The link is torn down again if any step after the connect fails.
    pub async fn connect(&self, peripheral: Peripheral) -> AppResult<ConnectionResult> {
        info!("Connecting to sensor {}", peripheral.id());

        self.with_timeout("connect", peripheral.connect()).await?;

        match self.subscribe(&peripheral).await {
            Ok((impact_characteristic, notifications)) => Ok(ConnectionResult {
                peripheral,
                impact_characteristic,
                notifications,
            }),
            Err(e) => {
                if let Err(disconnect_err) = peripheral.disconnect().await {
                    warn!("Cleanup disconnect failed: {}", disconnect_err);
                }
                Err(e)
            }
        }
    }

    async fn subscribe(
        &self,
        peripheral: &Peripheral,
    ) -> AppResult<(Characteristic, NotificationStream)> {
        self.with_timeout("service discovery", peripheral.discover_services())
            .await?;

        let characteristic = self.find_impact_characteristic(peripheral)?;
        if !characteristic.properties.contains(CharPropFlags::NOTIFY) {
            warn!(
                "Impact characteristic does not advertise NOTIFY: {:?}",
                characteristic.properties
            );
        }

        // Open the stream first so no early notification is lost
        let notifications = peripheral.notifications().await?;
        peripheral.subscribe(&characteristic).await?;
        info!("Subscribed to impact notifications");

        Ok((characteristic, notifications))
    }

    fn find_impact_characteristic(&self, peripheral: &Peripheral) -> AppResult<Characteristic> {
        peripheral
            .characteristics()
            .into_iter()
            .find(|c| {
                c.uuid == self.config.impact_char_uuid
                    && c.service_uuid == self.config.service_uuid
            })
            .ok_or_else(|| {
                AppError::ConnectionFailure(format!(
                    "impact characteristic {} not found",
                    self.config.impact_char_uuid
                ))
            })
    }

    async fn with_timeout<F>(&self, step: &str, fut: F) -> AppResult<()>
    where
        F: std::future::Future<Output = btleplug::Result<()>>,
    {
        match timeout(self.config.connect_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AppError::ConnectionFailure(format!(
                "{} timed out after {}s",
                step,
                self.config.connect_timeout.as_secs()
            ))),
        }
    }

    /// Best-effort unsubscribe and disconnect
    pub async fn teardown(peripheral: &Peripheral, characteristic: &Characteristic) {
        if let Err(e) = peripheral.unsubscribe(characteristic).await {
            warn!("Failed to unsubscribe: {}", e);
        }
        if let Err(e) = peripheral.disconnect().await {
            warn!("Failed to disconnect: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings_strings() {
        let config = ConnectionConfig::new(
            protocol::SERVICE_UUID,
            protocol::IMPACT_CHAR_UUID,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(config.service_uuid.to_string(), protocol::SERVICE_UUID);
        assert_eq!(config.impact_char_uuid.to_string(), protocol::IMPACT_CHAR_UUID);
    }

    #[test]
    fn test_config_rejects_bad_uuid() {
        let result = ConnectionConfig::new("bad", protocol::IMPACT_CHAR_UUID, Duration::from_secs(5));
        assert!(matches!(result, Err(AppError::ConnectionFailure(_))));
    }
}
