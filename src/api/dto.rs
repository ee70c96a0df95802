use serde::{Deserialize, Serialize};

use crate::devices::{Device, Properties};

/// Request body for `POST /devices`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    /// Server generates one when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

/// Request body for `PUT /devices/{device_id}`. Only status is ever sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceUpdate {
    pub status: String,
}

/// Response for `GET /devices`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceListResponse {
    #[serde(default)]
    pub devices: Vec<Device>,
    /// Present when more pages follow; pass back as `exclusiveStartKey`.
    pub last_evaluated_key: Option<String>,
}

/// Response for create, update and delete.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct MutationResponse {
    pub message: Option<String>,
    pub device: Option<Device>,
}

/// Error responses carry `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn odd_row_keeps_the_rest_of_the_list() {
        let list: DeviceListResponse = serde_json::from_value(json!({
            "devices": [
                { "deviceId": "lamp-1", "name": "Lamp", "type": "light", "status": "on" },
                { "deviceId": "lock-1", "name": "Door", "type": "lock", "status": null },
                { "deviceId": "fan-1", "name": "Fan", "type": "fan", "status": true, "location": 3 }
            ]
        }))
        .unwrap();

        let statuses: Vec<_> = list.devices.iter().map(|d| d.status.as_str()).collect();
        assert_eq!(statuses, ["on", "", "true"]);
        assert_eq!(list.devices[2].location.as_deref(), Some("3"));
    }

    #[test]
    fn new_device_omits_absent_fields() {
        let device = NewDevice {
            device_id: None,
            name: "Lamp".to_owned(),
            device_type: "light".to_owned(),
            location: None,
            status: "off".to_owned(),
            properties: None,
        };
        assert_eq!(
            serde_json::to_value(&device).unwrap(),
            json!({ "name": "Lamp", "type": "light", "status": "off" })
        );
    }

    #[test]
    fn list_response_reads_pagination_key() {
        let resp: DeviceListResponse = serde_json::from_value(json!({
            "devices": [{ "deviceId": "a", "name": "A", "type": "t", "status": "on" }],
            "lastEvaluatedKey": "a"
        }))
        .unwrap();
        assert_eq!(resp.devices.len(), 1);
        assert_eq!(resp.last_evaluated_key.as_deref(), Some("a"));
    }

    #[test]
    fn list_response_without_devices_is_empty() {
        let resp: DeviceListResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.devices.is_empty());
        assert!(resp.last_evaluated_key.is_none());
    }
}
