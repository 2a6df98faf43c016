// Device Directory and per-device endpoints
//
// Inherent methods on `HtClient` for `proxy/ctoc/*`. All calls go through
// the resilient verbs so an expired token is refreshed transparently.

use tracing::debug;

use crate::client::{HtClient, decode_json, ensure_success};
use crate::error::{DecodeError, Error};
use crate::models::{
    CommandRequest, DeviceDetail, DeviceDetailResponse, DeviceRecord, DevicesResponse,
    StatusEntry,
};

const DEVICES_PATH: &str = "proxy/ctoc/devices";

fn device_path(resource: &str, device_id: &str) -> String {
    format!("proxy/ctoc/{resource}/{device_id}")
}

impl HtClient {
    /// List every device registered to the authorized household.
    ///
    /// `GET proxy/ctoc/devices`. Order follows the vendor's response.
    pub async fn discover(&self) -> Result<Vec<DeviceRecord>, Error> {
        let resp = ensure_success(self.get(DEVICES_PATH).await?, "fetch devices")?;
        let devices: DevicesResponse = decode_json(resp, "device list").await?;

        let records: Vec<DeviceRecord> = devices
            .data
            .device_list
            .into_iter()
            .map(DeviceRecord::from)
            .collect();
        debug!(count = records.len(), "discovered devices");
        Ok(records)
    }

    /// Fetch the full status list of one device.
    ///
    /// `resource` is the vendor's plural path segment (`lights`, ...).
    pub async fn device_detail(
        &self,
        resource: &str,
        device_id: &str,
    ) -> Result<DeviceDetail, Error> {
        let resp = ensure_success(
            self.get(&device_path(resource, device_id)).await?,
            "fetch device state",
        )?;
        let detail: DeviceDetailResponse = decode_json(resp, "device detail").await?;
        Ok(detail.data)
    }

    /// Issue a command list to one device.
    pub async fn send_commands(
        &self,
        resource: &str,
        device_id: &str,
        commands: &[StatusEntry],
    ) -> Result<(), Error> {
        let body = serde_json::to_value(CommandRequest {
            command_list: commands,
        })
        .map_err(|e| DecodeError::new("command list", &e, ""))?;

        ensure_success(
            self.put(&device_path(resource, device_id), &body).await?,
            "update device state",
        )?;
        Ok(())
    }
}
