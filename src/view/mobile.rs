use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
    time::Duration,
};

use super::shell::Shell;
use crate::{api::DeviceApi, config::Frontend, session::SessionProvider};

/// End-user front-end: read-only device list behind the shared auth screens.
pub struct MobileApp {
    shell: Shell,
}

impl MobileApp {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        api: Arc<dyn DeviceApi>,
        display_for: Duration,
    ) -> Self {
        Self {
            shell: Shell::new(Frontend::Mobile, session, api, display_for),
        }
    }
}

impl Deref for MobileApp {
    type Target = Shell;

    fn deref(&self) -> &Shell {
        &self.shell
    }
}

impl DerefMut for MobileApp {
    fn deref_mut(&mut self) -> &mut Shell {
        &mut self.shell
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::{
        api::MockDeviceApi,
        devices::Device,
        session::{MockSessionProvider, User},
        view::{page::EMPTY_PLACEHOLDER, state::ViewState, status::StatusBanner},
    };

    fn session() -> MockSessionProvider {
        let mut session = MockSessionProvider::new();
        session.expect_current_authenticated_user().returning(|| {
            Ok(User {
                username: "bob".to_owned(),
            })
        });
        session
    }

    #[tokio::test]
    async fn mobile_has_no_welcome_line() {
        let mut api = MockDeviceApi::new();
        api.expect_list_devices().returning(|| Ok(vec![]));

        let mut app = MobileApp::new(
            Arc::new(session()),
            Arc::new(api),
            StatusBanner::DEFAULT_DISPLAY,
        );
        app.init().await;

        assert_eq!(app.state(), ViewState::LoggedInApp);
        assert!(app.page().welcome.is_empty());
        let text = app.page().render(Frontend::Mobile, Instant::now());
        assert!(text.contains(EMPTY_PLACEHOLDER));
    }

    #[tokio::test]
    async fn mobile_rows_carry_status_class() {
        let mut api = MockDeviceApi::new();
        api.expect_list_devices().returning(|| {
            Ok(vec![Device {
                device_id: "door".to_owned(),
                name: "Front door".to_owned(),
                device_type: "lock".to_owned(),
                location: Some("Entrance".to_owned()),
                status: "Locked".to_owned(),
                properties: None,
                last_updated: None,
            }])
        });

        let mut app = MobileApp::new(
            Arc::new(session()),
            Arc::new(api),
            StatusBanner::DEFAULT_DISPLAY,
        );
        app.init().await;

        let text = app.page().render(Frontend::Mobile, Instant::now());
        assert!(text.contains("Front door (lock)"));
        assert!(text.contains("<device-status-off>"));
        assert!(text.contains("Last Updated: Invalid Date"));
    }
}
