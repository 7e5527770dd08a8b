//! Bluetooth Module
//!
//! Provides BLE communication with the AccuAim impact sensor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    BluetoothService                      │
//! │  (select! loop - commands, adapter events, notifications)│
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!       ┌───────────────┼──────────────┬──────────────┐
//!       │               │              │              │
//!       ▼               ▼              ▼              ▼
//! ┌───────────┐  ┌────────────┐  ┌──────────┐  ┌──────────┐
//! │  Scanner  │  │ Connection │  │   Link   │  │ Protocol │
//! │           │  │            │  │          │  │          │
//! │ - Adapter │  │ - GATT     │  │ - Status │  │ - UUIDs  │
//! │ - Matching│  │ - Subscribe│  │ - Counter│  │ - Decode │
//! └───────────┘  └────────────┘  └──────────┘  └──────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Sensor identifiers and impact payload decoding
//! - [`scanner`] - Adapter access and sensor discovery
//! - [`connection`] - Connect, GATT discovery and notification subscription
//! - [`link`] - Connection state machine and impact detection
//! - [`service`] - Main service coordinator

pub mod connection;
pub mod link;
pub mod protocol;
pub mod scanner;
pub mod service;

use crate::domain::error::AppError;

// Re-export main service for convenience
pub use service::{BluetoothService, SensorConfig};

impl From<btleplug::Error> for AppError {
    fn from(e: btleplug::Error) -> Self {
        AppError::ConnectionFailure(e.to_string())
    }
}
