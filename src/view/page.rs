use std::{collections::HashMap, fmt::Write, str::FromStr};

use tokio::time::Instant;

use super::{
    state::ViewState,
    status::{StatusBanner, StatusKind},
};
use crate::{
    config::Frontend,
    devices::{format_timestamp, Device, StatusClass},
};

// ---------------------------------------------------------------------------
// Form fields
// ---------------------------------------------------------------------------

/// Every input on either front-end, named by its element id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    LoginUsername,
    LoginPassword,
    SignupUsername,
    SignupPassword,
    SignupPasswordConfirm,
    ConfirmUsername,
    ConfirmCode,
    AddDeviceId,
    AddDeviceName,
    AddDeviceType,
    AddDeviceLocation,
    AddDeviceStatus,
    AddDeviceProperties,
    UpdateDeviceId,
    UpdateDeviceStatus,
    DeleteDeviceId,
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::LoginUsername,
        Field::LoginPassword,
        Field::SignupUsername,
        Field::SignupPassword,
        Field::SignupPasswordConfirm,
        Field::ConfirmUsername,
        Field::ConfirmCode,
        Field::AddDeviceId,
        Field::AddDeviceName,
        Field::AddDeviceType,
        Field::AddDeviceLocation,
        Field::AddDeviceStatus,
        Field::AddDeviceProperties,
        Field::UpdateDeviceId,
        Field::UpdateDeviceStatus,
        Field::DeleteDeviceId,
    ];

    pub const ADD_DEVICE: [Field; 6] = [
        Field::AddDeviceId,
        Field::AddDeviceName,
        Field::AddDeviceType,
        Field::AddDeviceLocation,
        Field::AddDeviceStatus,
        Field::AddDeviceProperties,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Field::LoginUsername => "login-username",
            Field::LoginPassword => "login-password",
            Field::SignupUsername => "signup-username",
            Field::SignupPassword => "signup-password",
            Field::SignupPasswordConfirm => "signup-password-confirm",
            Field::ConfirmUsername => "confirm-username",
            Field::ConfirmCode => "confirm-code",
            Field::AddDeviceId => "add-device-id",
            Field::AddDeviceName => "add-device-name",
            Field::AddDeviceType => "add-device-type",
            Field::AddDeviceLocation => "add-device-location",
            Field::AddDeviceStatus => "add-device-status",
            Field::AddDeviceProperties => "add-device-properties",
            Field::UpdateDeviceId => "update-device-id",
            Field::UpdateDeviceStatus => "update-device-status",
            Field::DeleteDeviceId => "delete-device-id",
        }
    }

    /// The screen the field is drawn on.
    pub fn view(self) -> ViewState {
        match self {
            Field::LoginUsername | Field::LoginPassword => ViewState::LoggedOutLogin,
            Field::SignupUsername | Field::SignupPassword | Field::SignupPasswordConfirm => {
                ViewState::LoggedOutSignup
            }
            Field::ConfirmUsername | Field::ConfirmCode => ViewState::LoggedOutConfirm,
            _ => ViewState::LoggedInApp,
        }
    }

    /// Device management inputs only exist on the admin portal.
    pub fn available_on(self, frontend: Frontend) -> bool {
        frontend == Frontend::Admin || self.view() != ViewState::LoggedInApp
    }

    pub fn is_secret(self) -> bool {
        matches!(
            self,
            Field::LoginPassword | Field::SignupPassword | Field::SignupPasswordConfirm
        )
    }
}

impl FromStr for Field {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Field::ALL
            .into_iter()
            .find(|f| f.id() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown field: {s:?}"))
    }
}

/// Current input values. Reads are trimmed, as the handlers expect.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Forms {
    values: HashMap<Field, String>,
}

impl Forms {
    pub fn value(&self, field: Field) -> &str {
        self.values.get(&field).map(|v| v.trim()).unwrap_or("")
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn clear(&mut self, field: Field) {
        self.values.remove(&field);
    }
}

// ---------------------------------------------------------------------------
// Device list
// ---------------------------------------------------------------------------

pub const LOADING_PLACEHOLDER: &str = "Loading devices...";
pub const EMPTY_PLACEHOLDER: &str = "No devices found.";
pub const FAILED_PLACEHOLDER: &str = "Failed to load devices.";

/// Content of the device list area. Each load replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceListView {
    #[default]
    NotLoaded,
    Loading,
    Empty,
    Failed,
    Rows(Vec<DeviceRow>),
}

impl DeviceListView {
    pub fn rows(&self) -> &[DeviceRow] {
        match self {
            DeviceListView::Rows(rows) => rows,
            _ => &[],
        }
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            DeviceListView::Loading => Some(LOADING_PLACEHOLDER),
            DeviceListView::Empty => Some(EMPTY_PLACEHOLDER),
            DeviceListView::Failed => Some(FAILED_PLACEHOLDER),
            DeviceListView::NotLoaded | DeviceListView::Rows(_) => None,
        }
    }
}

/// One rendered device, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRow {
    pub device_id: String,
    pub name: String,
    pub device_type: String,
    /// `N/A` when the device has no location.
    pub location: String,
    pub status: String,
    pub status_class: StatusClass,
    pub last_updated: String,
    /// Compact JSON, when the device has properties.
    pub properties: Option<String>,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            device_id: d.device_id.clone(),
            name: d.name.clone(),
            device_type: d.device_type.clone(),
            location: d
                .location
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "N/A".to_owned()),
            status: d.status.clone(),
            status_class: StatusClass::of(&d.status),
            last_updated: format_timestamp(d.last_updated),
            properties: d
                .properties
                .as_ref()
                .and_then(|p| serde_json::to_string(p).ok()),
        }
    }
}

impl DeviceRow {
    fn render_admin(&self, out: &mut String) {
        let _ = writeln!(out, "  ID: {}", self.device_id);
        let _ = writeln!(out, "    Name: {}", self.name);
        let _ = writeln!(out, "    Type: {}", self.device_type);
        let _ = writeln!(out, "    Location: {}", self.location);
        let _ = writeln!(out, "    Status: {}", self.status);
        let _ = writeln!(out, "    Last Updated: {}", self.last_updated);
        if let Some(props) = &self.properties {
            let _ = writeln!(out, "    Properties: {props}");
        }
        let _ = writeln!(out, "    [edit {id}] [delete {id}]", id = self.device_id);
    }

    fn render_mobile(&self, out: &mut String) {
        let _ = writeln!(out, "  {} ({})", self.name, self.device_type);
        let _ = writeln!(out, "    Location: {}", self.location);
        let _ = writeln!(
            out,
            "    Status: {} <{}>",
            self.status,
            self.status_class.css_class()
        );
        let _ = writeln!(out, "    Last Updated: {}", self.last_updated);
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// Everything a front-end currently displays.
#[derive(Debug, Default)]
pub struct Page {
    pub state: ViewState,
    pub forms: Forms,
    /// Admin only; empty while logged out.
    pub welcome: String,
    pub devices: DeviceListView,
    pub banner: StatusBanner,
}

impl Page {
    pub fn new(banner: StatusBanner) -> Self {
        Self {
            banner,
            ..Self::default()
        }
    }

    /// Text rendering of the page as seen at `now`.
    pub fn render(&self, frontend: Frontend, now: Instant) -> String {
        let mut out = String::new();
        let title = match frontend {
            Frontend::Admin => "Smart Home Admin Portal",
            Frontend::Mobile => "Smart Home",
        };
        let _ = writeln!(out, "==== {title} ====");

        if let Some(msg) = self.banner.visible_at(now) {
            let _ = writeln!(out, "[{}] {}", msg.kind.css_class(), msg.text);
        }

        match self.state {
            ViewState::LoggedInApp => self.render_app(frontend, &mut out),
            logged_out => self.render_auth(logged_out, &mut out),
        }
        out
    }

    fn render_auth(&self, state: ViewState, out: &mut String) {
        const LOGIN: [Field; 2] = [Field::LoginUsername, Field::LoginPassword];
        const SIGNUP: [Field; 3] = [
            Field::SignupUsername,
            Field::SignupPassword,
            Field::SignupPasswordConfirm,
        ];
        const CONFIRM: [Field; 2] = [Field::ConfirmUsername, Field::ConfirmCode];

        let (heading, fields, buttons): (&str, &[Field], &str) = match state {
            ViewState::LoggedOutSignup => ("Sign Up", &SIGNUP[..], "[signup-btn] [show-login]"),
            ViewState::LoggedOutConfirm => (
                "Confirm Sign Up",
                &CONFIRM[..],
                "[confirm-signup-btn] [resend-code-btn] [show-login]",
            ),
            _ => ("Login", &LOGIN[..], "[login-btn] [show-signup]"),
        };

        let _ = writeln!(out, "-- {heading} --");
        for field in fields {
            self.render_field(*field, out);
        }
        let _ = writeln!(out, "{buttons}");
    }

    fn render_app(&self, frontend: Frontend, out: &mut String) {
        if !self.welcome.is_empty() {
            let _ = writeln!(out, "{}", self.welcome);
        }
        let _ = writeln!(out, "[logout-btn] [refresh-devices-btn]");

        if frontend == Frontend::Admin {
            let _ = writeln!(out, "-- Add Device --");
            for field in Field::ADD_DEVICE {
                self.render_field(field, out);
            }
            let _ = writeln!(out, "[add-device-btn]");
            let _ = writeln!(out, "-- Update Device Status --");
            self.render_field(Field::UpdateDeviceId, out);
            self.render_field(Field::UpdateDeviceStatus, out);
            let _ = writeln!(out, "[update-device-btn]");
            let _ = writeln!(out, "-- Delete Device --");
            self.render_field(Field::DeleteDeviceId, out);
            let _ = writeln!(out, "[delete-device-btn]");
        }

        let _ = writeln!(out, "-- Devices --");
        if let Some(placeholder) = self.devices.placeholder() {
            let _ = writeln!(out, "  {placeholder}");
        }
        for row in self.devices.rows() {
            match frontend {
                Frontend::Admin => row.render_admin(out),
                Frontend::Mobile => row.render_mobile(out),
            }
        }
    }

    fn render_field(&self, field: Field, out: &mut String) {
        let value = self.forms.value(field);
        let shown = if field.is_secret() {
            "*".repeat(value.chars().count())
        } else {
            value.to_owned()
        };
        let _ = writeln!(out, "  {}: {shown}", field.id());
    }

    pub(crate) fn status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.banner.show(text, kind);
    }
}
