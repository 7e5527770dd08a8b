//! BLE Scanner Module
//!
//! Adapter access checks and discovery of AccuAim impact sensors.

use crate::domain::error::{AppError, AppResult};
use btleplug::api::{Central, CentralState, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Decides whether an advertising peripheral is our sensor
#[derive(Debug, Clone)]
pub struct DeviceMatcher {
    pub device_name: String,
    pub service_uuid: Uuid,
    /// When off, advertising the service is enough
    pub filter_by_name: bool,
}

impl DeviceMatcher {
    pub fn matches(&self, local_name: Option<&str>, services: &[Uuid]) -> bool {
        if self.filter_by_name {
            local_name == Some(self.device_name.as_str())
        } else {
            services.contains(&self.service_uuid)
        }
    }
}

/// Open the first Bluetooth adapter and make sure it can be used.
///
/// There is no runtime permission prompt on desktop platforms; a missing
/// adapter, a powered-off adapter, or a refused state query all mean the OS
/// is not letting us scan.
pub async fn open_adapter() -> AppResult<Adapter> {
    let manager = Manager::new()
        .await
        .map_err(|e| AppError::PermissionDenied(e.to_string()))?;
    let adapters = manager
        .adapters()
        .await
        .map_err(|e| AppError::PermissionDenied(e.to_string()))?;
    let adapter = adapters
        .into_iter()
        .next()
        .ok_or_else(|| AppError::PermissionDenied("no Bluetooth adapter available".into()))?;

    check_access(&adapter).await?;
    Ok(adapter)
}

pub async fn check_access(adapter: &Adapter) -> AppResult<()> {
    access_from_state(adapter.adapter_state().await)
}

/// Map an adapter state query to scan access
pub fn access_from_state(state: btleplug::Result<CentralState>) -> AppResult<()> {
    match state {
        Ok(CentralState::PoweredOff) => Err(AppError::PermissionDenied(
            "Bluetooth is turned off".into(),
        )),
        Ok(state) => {
            debug!("Adapter state: {:?}", state);
            Ok(())
        }
        Err(e) => Err(AppError::PermissionDenied(e.to_string())),
    }
}

/// BLE Scanner for discovering the impact sensor
pub struct BleScanner {
    adapter: Adapter,
    scanning: bool,
}

impl BleScanner {
    pub fn new(adapter: Adapter) -> Self {
        Self {
            adapter,
            scanning: false,
        }
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Start scanning for peripherals advertising `service_uuid`
    pub async fn start(&mut self, service_uuid: Uuid) -> AppResult<()> {
        self.stop().await;

        info!("Starting BLE scan for service UUID: {}", service_uuid);
        self.adapter
            .start_scan(ScanFilter {
                services: vec![service_uuid],
            })
            .await?;
        self.scanning = true;
        Ok(())
    }

    /// Stop scanning. Failures are logged only.
    pub async fn stop(&mut self) {
        if !self.scanning {
            return;
        }
        self.scanning = false;
        info!("Stopping BLE scan...");
        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }
    }

    /// Look up a discovered peripheral and return it with its advertised name
    /// and signal strength if it matches.
    pub async fn inspect(
        &self,
        id: &btleplug::platform::PeripheralId,
        matcher: &DeviceMatcher,
    ) -> Option<(Peripheral, String, Option<i16>)> {
        let peripheral = self.adapter.peripheral(id).await.ok()?;
        let props = peripheral.properties().await.ok()??;

        if !matcher.matches(props.local_name.as_deref(), &props.services) {
            return None;
        }

        let name = props
            .local_name
            .unwrap_or_else(|| "Unknown".to_string());
        Some((peripheral, name, props.rssi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bluetooth::protocol::{self, DEVICE_NAME};

    fn matcher(filter_by_name: bool) -> DeviceMatcher {
        DeviceMatcher {
            device_name: DEVICE_NAME.to_string(),
            service_uuid: protocol::parse_uuid(protocol::SERVICE_UUID).unwrap(),
            filter_by_name,
        }
    }

    #[test]
    fn test_name_match_is_exact() {
        let m = matcher(true);
        assert!(m.matches(Some("AccuAim Sensor"), &[]));
        assert!(!m.matches(Some("AccuAim Sensor 2"), &[]));
        assert!(!m.matches(Some("accuaim sensor"), &[]));
        assert!(!m.matches(None, &[m.service_uuid]));
    }

    #[test]
    fn test_powered_off_adapter_is_refused() {
        assert!(matches!(
            access_from_state(Ok(CentralState::PoweredOff)),
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            access_from_state(Err(btleplug::Error::PermissionDenied)),
            Err(AppError::PermissionDenied(_))
        ));
        assert!(access_from_state(Ok(CentralState::PoweredOn)).is_ok());
        assert!(access_from_state(Ok(CentralState::Unknown)).is_ok());
    }

    #[test]
    fn test_service_match_when_name_filter_off() {
        let m = matcher(false);
        assert!(m.matches(None, &[m.service_uuid]));
        assert!(!m.matches(Some("AccuAim Sensor"), &[Uuid::nil()]));
    }
}
