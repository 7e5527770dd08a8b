//! AccuAim Sensor Protocol
//!
//! Identifiers advertised by the sensor firmware and the impact counter
//! payload format.

use crate::domain::error::{AppError, AppResult};
use base64::Engine;
use uuid::Uuid;

/// Impact sensor BLE Service UUID
pub const SERVICE_UUID: &str = "bb8a0b11-545b-4d9e-9485-db89bea05d09";

/// Impact counter characteristic UUID - notifies on every counter change
pub const IMPACT_CHAR_UUID: &str = "204e46ad-df66-4989-aec3-244c6c24f023";

/// Local name advertised by the sensor
pub const DEVICE_NAME: &str = "AccuAim Sensor";

/// Size of the counter in a notification
pub const IMPACT_PAYLOAD_LEN: usize = 4;

/// Decode an impact counter notification.
///
/// # Payload Structure
///
/// ```text
/// [0-3]   : Impact count (i32 little-endian)
/// [4..]   : Ignored
/// ```
pub fn decode_impact(bytes: &[u8]) -> AppResult<i32> {
    let Some(head) = bytes.get(..IMPACT_PAYLOAD_LEN) else {
        return Err(AppError::DecodeFailure(format!(
            "expected at least {} bytes, got {}",
            IMPACT_PAYLOAD_LEN,
            bytes.len()
        )));
    };
    Ok(i32::from_le_bytes([head[0], head[1], head[2], head[3]]))
}

/// Decode a notification value delivered as base64 text, the encoding used by
/// mobile BLE stacks.
pub fn decode_base64_payload(text: &str) -> AppResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .map_err(|e| AppError::DecodeFailure(format!("invalid base64: {}", e)))
}

/// Parse a UUID string from settings
pub fn parse_uuid(uuid_str: &str) -> AppResult<Uuid> {
    Uuid::parse_str(uuid_str.trim())
        .map_err(|e| AppError::ConnectionFailure(format!("invalid UUID '{}': {}", uuid_str, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_little_endian() {
        assert_eq!(decode_impact(&[0x03, 0x00, 0x00, 0x00]).unwrap(), 3);
        assert_eq!(decode_impact(&[0x00, 0x01, 0x00, 0x00]).unwrap(), 256);
        assert_eq!(decode_impact(&[0xFF, 0xFF, 0xFF, 0xFF]).unwrap(), -1);
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        assert_eq!(decode_impact(&[0x02, 0x00, 0x00, 0x00, 0xAA]).unwrap(), 2);
    }

    #[test]
    fn test_short_payload_is_rejected() {
        assert!(matches!(
            decode_impact(&[0x01, 0x00, 0x00]),
            Err(AppError::DecodeFailure(_))
        ));
        assert!(decode_impact(&[]).is_err());
    }

    #[test]
    fn test_base64_payload() {
        // 5 as i32 LE
        let bytes = decode_base64_payload("BQAAAA==").unwrap();
        assert_eq!(decode_impact(&bytes).unwrap(), 5);

        // Two bytes only
        let short = decode_base64_payload("AQA=").unwrap();
        assert!(decode_impact(&short).is_err());

        assert!(decode_base64_payload("not base64!").is_err());
    }

    #[test]
    fn test_parse_uuid() {
        let uuid = parse_uuid(SERVICE_UUID).unwrap();
        assert_eq!(uuid.to_string(), SERVICE_UUID);
        assert!(parse_uuid("nope").is_err());
    }
}
