use std::{sync::Arc, time::Duration};

use tracing::{error, info, warn};

use super::{
    page::{DeviceListView, DeviceRow, Field, Page},
    state::{transition, Effect, ViewEvent, ViewState},
    status::{StatusBanner, StatusKind},
};
use crate::{
    api::{DeviceApi, RequestError},
    config::Frontend,
    session::SessionProvider,
};

/// State and behaviour shared by both front-ends: the auth screens, the
/// device list, and the status banner.
pub struct Shell {
    frontend: Frontend,
    session: Arc<dyn SessionProvider>,
    api: Arc<dyn DeviceApi>,
    page: Page,
}

impl Shell {
    pub fn new(
        frontend: Frontend,
        session: Arc<dyn SessionProvider>,
        api: Arc<dyn DeviceApi>,
        display_for: Duration,
    ) -> Self {
        Self {
            frontend,
            session,
            api,
            page: Page::new(StatusBanner::new(display_for)),
        }
    }

    pub fn frontend(&self) -> Frontend {
        self.frontend
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn state(&self) -> ViewState {
        self.page.state
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.page.forms.set(field, value);
    }

    pub fn field(&self, field: Field) -> &str {
        self.page.forms.value(field)
    }

    pub(crate) fn clear_field(&mut self, field: Field) {
        self.page.forms.clear(field);
    }

    pub(crate) fn api(&self) -> &dyn DeviceApi {
        self.api.as_ref()
    }

    pub fn show_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.page.status(text, kind);
    }

    /// Admin and mobile word some messages differently.
    fn pick(&self, admin: &'static str, mobile: &'static str) -> &'static str {
        match self.frontend {
            Frontend::Admin => admin,
            Frontend::Mobile => mobile,
        }
    }

    // -----------------------------------------------------------------------
    // View state
    // -----------------------------------------------------------------------

    /// Decide the first screen from whether someone is already signed in.
    pub async fn init(&mut self) {
        let event = match self.session.current_authenticated_user().await {
            Ok(user) => {
                info!(username = %user.username, "Found signed-in user");
                ViewEvent::SessionFound
            }
            Err(_) => ViewEvent::NoSession,
        };
        self.dispatch(event).await;
    }

    /// Apply `event` and run every effect it produces.
    pub async fn dispatch(&mut self, event: ViewEvent) {
        for effect in self.enter(event) {
            match effect {
                Effect::RefreshWelcome => self.refresh_welcome().await,
                Effect::ReloadDevices => self.load_devices().await,
                Effect::PrefillConfirmUsername(_) | Effect::ClearWelcome => {}
            }
        }
    }

    /// Apply `event` and the effects that need no I/O. Returns the rest.
    fn enter(&mut self, event: ViewEvent) -> Vec<Effect> {
        let next = transition(self.page.state, event);
        self.page.state = next.state;

        let mut pending = Vec::new();
        for effect in next.effects {
            match effect {
                Effect::PrefillConfirmUsername(username) => {
                    self.page.forms.set(Field::ConfirmUsername, username)
                }
                Effect::ClearWelcome => self.page.welcome.clear(),
                other => pending.push(other),
            }
        }
        pending
    }

    async fn refresh_welcome(&mut self) {
        if self.frontend != Frontend::Admin {
            return;
        }
        self.page.welcome = match self.session.current_authenticated_user().await {
            Ok(user) => format!("Welcome, {}!", user.username),
            Err(_) => "Welcome!".to_owned(),
        };
    }

    pub async fn show_login(&mut self) {
        self.dispatch(ViewEvent::ShowLogin).await;
    }

    pub async fn show_signup(&mut self) {
        self.dispatch(ViewEvent::ShowSignup).await;
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub async fn sign_up(&mut self) {
        let username = self.field(Field::SignupUsername).to_owned();
        let password = self.field(Field::SignupPassword).to_owned();
        let confirm = self.field(Field::SignupPasswordConfirm).to_owned();

        if username.is_empty() || password.is_empty() || confirm.is_empty() {
            let msg = self.pick("Please fill in all signup fields.", "Please fill in all fields.");
            self.show_status(msg, StatusKind::Error);
            return;
        }
        if password != confirm {
            self.show_status("Passwords do not match.", StatusKind::Error);
            return;
        }

        // The username doubles as the email attribute.
        match self.session.sign_up(&username, &password, &username).await {
            Ok(()) => {
                self.show_status(
                    "Sign up successful! Please confirm your email.",
                    StatusKind::Success,
                );
                self.dispatch(ViewEvent::SignedUp { username }).await;
            }
            Err(e) => {
                error!(error = %e, "Error signing up");
                self.show_status(format!("Sign up error: {e}"), StatusKind::Error);
            }
        }
    }

    pub async fn confirm_sign_up(&mut self) {
        let username = self.field(Field::ConfirmUsername).to_owned();
        let code = self.field(Field::ConfirmCode).to_owned();

        if username.is_empty() || code.is_empty() {
            let msg = self.pick(
                "Please enter username and verification code.",
                "Please enter username and code.",
            );
            self.show_status(msg, StatusKind::Error);
            return;
        }

        match self.session.confirm_sign_up(&username, &code).await {
            Ok(()) => {
                let msg = self.pick(
                    "Account confirmed successfully! You can now log in.",
                    "Account confirmed! You can now log in.",
                );
                self.show_status(msg, StatusKind::Success);
                self.dispatch(ViewEvent::Confirmed).await;
            }
            Err(e) => {
                error!(error = %e, "Error confirming signup");
                self.show_status(format!("Confirmation error: {e}"), StatusKind::Error);
            }
        }
    }

    pub async fn resend_code(&mut self) {
        let username = self.field(Field::ConfirmUsername).to_owned();
        if username.is_empty() {
            let msg = self.pick(
                "Please enter your username (email) to resend the code.",
                "Please enter your username.",
            );
            self.show_status(msg, StatusKind::Error);
            return;
        }

        match self.session.resend_sign_up_code(&username).await {
            Ok(()) => {
                let msg = self.pick("Confirmation code resent!", "Code resent!");
                self.show_status(msg, StatusKind::Success);
            }
            Err(e) => {
                error!(error = %e, "Error resending code");
                let prefix = self.pick("Resend code error", "Resend error");
                self.show_status(format!("{prefix}: {e}"), StatusKind::Error);
            }
        }
    }

    pub async fn sign_in(&mut self) {
        let username = self.field(Field::LoginUsername).to_owned();
        let password = self.field(Field::LoginPassword).to_owned();

        if username.is_empty() || password.is_empty() {
            self.show_status("Please enter username and password.", StatusKind::Error);
            return;
        }

        match self.session.sign_in(&username, &password).await {
            Ok(_) => {
                self.show_status("Login successful!", StatusKind::Success);
                self.dispatch(ViewEvent::SignedIn).await;
            }
            Err(e) => {
                error!(error = %e, "Error signing in");
                self.show_status(format!("Login error: {e}"), StatusKind::Error);
            }
        }
    }

    /// Always lands on the login screen; a provider failure is still reported.
    pub async fn sign_out(&mut self) {
        match self.session.sign_out().await {
            Ok(()) => self.show_status("Logged out successfully.", StatusKind::Success),
            Err(e) => {
                error!(error = %e, "Error signing out");
                self.show_status(format!("Logout error: {e}"), StatusKind::Error);
            }
        }
        self.dispatch(ViewEvent::SignedOut).await;
    }

    // -----------------------------------------------------------------------
    // Devices
    // -----------------------------------------------------------------------

    /// Fetch the device list and replace whatever was shown before.
    pub async fn load_devices(&mut self) {
        self.page.devices = DeviceListView::Loading;

        let result = self.api.list_devices().await;
        self.page.devices = match result {
            Ok(devices) if devices.is_empty() => DeviceListView::Empty,
            Ok(devices) => DeviceListView::Rows(devices.iter().map(DeviceRow::from).collect()),
            Err(e) => {
                self.report_request_failure(&e);
                DeviceListView::Failed
            }
        };
    }

    /// Banner plus, when the session is gone, a return to the login screen.
    pub(crate) fn report_request_failure(&mut self, err: &RequestError) {
        error!(error = %err, "API call error");
        if err.is_no_current_user() {
            warn!("Session lost; returning to login");
            // SessionLost has no deferred effects.
            let _ = self.enter(ViewEvent::SessionLost);
        }
        let text = match self.frontend {
            Frontend::Admin => format!("Error: {err}"),
            Frontend::Mobile => "Failed to load data. Please try again.".to_owned(),
        };
        self.show_status(text, StatusKind::Error);
    }
}
