//! Service info projection
//!
//! Read-mostly document fetched on demand from the `services` collection.
//! The relay only ever displays it; nothing here is written back.

use serde::{Deserialize, Serialize};

/// Per-device service document, keyed by the same sync code as the
/// notification document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: Option<String>,
    /// Battery level, volts.
    pub battery: Option<f64>,
    /// Estimated remaining range, km.
    pub distance_left: Option<f64>,
    /// Odometer reading, km.
    pub odo: Option<f64>,
    /// Map URL for the device's current position.
    pub position: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn deserializes_camel_case_document() {
        let info: ServiceInfo = serde_json::from_str(
            r#"{"name": "Pega-S", "battery": 58.4, "distanceLeft": 42, "odo": 1204.5,
                "position": "https://maps.example.com/?q=1,2"}"#,
        )
        .unwrap();

        assert_eq!(info.name.as_deref(), Some("Pega-S"));
        assert_eq!(info.battery, Some(58.4));
        assert_eq!(info.distance_left, Some(42.0));
        assert_eq!(info.odo, Some(1204.5));
    }

    #[test]
    fn missing_fields_default_to_none() {
        let info: ServiceInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(info, ServiceInfo::default());
    }
}
