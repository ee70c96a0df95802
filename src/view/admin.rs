use std::{ops::Deref, ops::DerefMut, sync::Arc, time::Duration};

use tracing::{error, info, warn};

use super::{
    confirm::Confirmer,
    page::Field,
    shell::Shell,
    status::StatusKind,
};
use crate::{
    api::{DeviceApi, DeviceUpdate, NewDevice},
    config::Frontend,
    devices::parse_properties,
    session::SessionProvider,
};

/// Administrative front-end: everything the shell does plus device
/// create/update/delete.
pub struct AdminPortal {
    shell: Shell,
    confirmer: Arc<dyn Confirmer>,
}

impl AdminPortal {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        api: Arc<dyn DeviceApi>,
        confirmer: Arc<dyn Confirmer>,
        display_for: Duration,
    ) -> Self {
        Self {
            shell: Shell::new(Frontend::Admin, session, api, display_for),
            confirmer,
        }
    }

    pub async fn add_device(&mut self) {
        let name = self.field(Field::AddDeviceName).to_owned();
        let device_type = self.field(Field::AddDeviceType).to_owned();
        let status = self.field(Field::AddDeviceStatus).to_owned();

        if name.is_empty() || device_type.is_empty() || status.is_empty() {
            self.show_status("Name, Type, and Status are required fields.", StatusKind::Error);
            return;
        }

        let properties = match parse_properties(self.field(Field::AddDeviceProperties)) {
            Ok(props) => props,
            Err(e) => {
                warn!(error = %e, "Rejected device properties");
                self.show_status(
                    r#"Invalid JSON format for properties. Please use valid JSON like {"key": "value"}."#,
                    StatusKind::Error,
                );
                return;
            }
        };

        let device = NewDevice {
            device_id: non_empty(self.field(Field::AddDeviceId)),
            name,
            device_type,
            location: non_empty(self.field(Field::AddDeviceLocation)),
            status,
            properties: properties.filter(|p| !p.is_empty()),
        };

        match self.shell.api().create_device(&device).await {
            Ok(resp) => {
                info!(device_id = ?resp.device.as_ref().map(|d| &d.device_id), "Device created");
                self.show_status("Device added successfully!", StatusKind::Success);
                for field in Field::ADD_DEVICE {
                    self.shell.clear_field(field);
                }
                self.load_devices().await;
            }
            Err(e) => self.report_request_failure(&e),
        }
    }

    /// Sends only the new status; other fields are left untouched.
    pub async fn update_device(&mut self) {
        let device_id = self.field(Field::UpdateDeviceId).to_owned();
        let status = self.field(Field::UpdateDeviceStatus).to_owned();

        if device_id.is_empty() {
            self.show_status("Please enter a Device ID to update.", StatusKind::Error);
            return;
        }
        if status.is_empty() {
            self.show_status("Please enter a new status.", StatusKind::Error);
            return;
        }

        let update = DeviceUpdate { status };
        match self.shell.api().update_device(&device_id, &update).await {
            Ok(_) => {
                self.show_status(
                    format!("Device {device_id} updated successfully!"),
                    StatusKind::Success,
                );
                self.shell.clear_field(Field::UpdateDeviceId);
                self.shell.clear_field(Field::UpdateDeviceStatus);
                self.load_devices().await;
            }
            Err(e) => self.report_request_failure(&e),
        }
    }

    /// Delete the device named by `row_id` (a list row's delete button) or,
    /// when `None`, by the delete form field. A row id must be listed, like
    /// `edit_row`. Nothing is sent unless the user confirms.
    pub async fn delete_device(&mut self, row_id: Option<&str>) {
        let from_field = row_id.is_none();
        let device_id = match row_id {
            Some(id) => id.trim().to_owned(),
            None => self.field(Field::DeleteDeviceId).to_owned(),
        };

        if device_id.is_empty() {
            self.show_status("Please enter a Device ID to delete.", StatusKind::Error);
            return;
        }
        if !from_field && !self.is_listed(&device_id) {
            self.show_status(format!("Device {device_id} is not listed."), StatusKind::Error);
            return;
        }

        let prompt = format!("Are you sure you want to delete device with ID: {device_id}?");
        if !self.confirmer.confirm(&prompt).await {
            return;
        }

        match self.shell.api().delete_device(&device_id).await {
            Ok(_) => {
                self.show_status(
                    format!("Device {device_id} deleted successfully!"),
                    StatusKind::Success,
                );
                if from_field {
                    self.shell.clear_field(Field::DeleteDeviceId);
                }
                self.load_devices().await;
            }
            Err(e) => self.report_request_failure(&e),
        }
    }

    fn is_listed(&self, device_id: &str) -> bool {
        self.page()
            .devices
            .rows()
            .iter()
            .any(|r| r.device_id == device_id)
    }

    /// Copy a listed device's id and status into the update form.
    pub fn edit_row(&mut self, device_id: &str) {
        let Some(row) = self
            .page()
            .devices
            .rows()
            .iter()
            .find(|r| r.device_id == device_id)
            .cloned()
        else {
            self.show_status(format!("Device {device_id} is not listed."), StatusKind::Error);
            return;
        };

        self.set_field(Field::UpdateDeviceId, row.device_id.clone());
        self.set_field(Field::UpdateDeviceStatus, row.status.clone());
        self.show_status(
            format!("Populated update form for {} ({})", row.name, row.device_id),
            StatusKind::Success,
        );
    }

    /// Fetch one device, report it in the banner, and return its
    /// pretty-printed JSON.
    pub async fn inspect_device(&mut self, device_id: &str) -> Option<String> {
        match self.shell.api().get_device(device_id).await {
            Ok(device) => {
                self.show_status(
                    format!("Device {} ({}) is {}", device.name, device.device_id, device.status),
                    StatusKind::Success,
                );
                match serde_json::to_string_pretty(&device) {
                    Ok(text) => Some(text),
                    Err(e) => {
                        error!(error = %e, "Failed to format device");
                        None
                    }
                }
            }
            Err(e) => {
                self.report_request_failure(&e);
                None
            }
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

impl Deref for AdminPortal {
    type Target = Shell;

    fn deref(&self) -> &Shell {
        &self.shell
    }
}

impl DerefMut for AdminPortal {
    fn deref_mut(&mut self) -> &mut Shell {
        &mut self.shell
    }
}
