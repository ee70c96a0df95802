//! Line-oriented driver for either front-end.
//!
//! Each stdin line is one user action: type into a field, click a button, or
//! act on a listed device. The page is re-rendered after every action.

use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use tokio::{
    io::{self, AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::Mutex,
    time::Instant,
};
use tracing::{debug, info};

use crate::{
    api::DeviceApi,
    config::Frontend,
    session::SessionProvider,
    view::{AdminPortal, Confirmer, Field, MobileApp, Shell, ViewState},
};

const HELP: &str = "\
Commands:
  set <field-id> <value>   type into a visible field
  click <button-id>        press a visible button
  edit <device-id>         copy a listed device into the update form (admin)
  delete <device-id>       delete a listed device (admin)
  inspect <device-id>      show one device as JSON (admin)
  show                     redraw the page
  help                     this text
  quit                     exit";

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    ShowSignup,
    ShowLogin,
    Login,
    Signup,
    ConfirmSignup,
    ResendCode,
    Logout,
    RefreshDevices,
    AddDevice,
    UpdateDevice,
    DeleteDevice,
}

impl Button {
    pub const ALL: [Button; 11] = [
        Button::ShowSignup,
        Button::ShowLogin,
        Button::Login,
        Button::Signup,
        Button::ConfirmSignup,
        Button::ResendCode,
        Button::Logout,
        Button::RefreshDevices,
        Button::AddDevice,
        Button::UpdateDevice,
        Button::DeleteDevice,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Button::ShowSignup => "show-signup",
            Button::ShowLogin => "show-login",
            Button::Login => "login-btn",
            Button::Signup => "signup-btn",
            Button::ConfirmSignup => "confirm-signup-btn",
            Button::ResendCode => "resend-code-btn",
            Button::Logout => "logout-btn",
            Button::RefreshDevices => "refresh-devices-btn",
            Button::AddDevice => "add-device-btn",
            Button::UpdateDevice => "update-device-btn",
            Button::DeleteDevice => "delete-device-btn",
        }
    }

    /// Whether the button is drawn for `frontend` while in `state`.
    pub fn visible(self, frontend: Frontend, state: ViewState) -> bool {
        match self {
            Button::Login | Button::ShowSignup => state == ViewState::LoggedOutLogin,
            Button::Signup => state == ViewState::LoggedOutSignup,
            Button::ConfirmSignup | Button::ResendCode => state == ViewState::LoggedOutConfirm,
            Button::ShowLogin => {
                matches!(state, ViewState::LoggedOutSignup | ViewState::LoggedOutConfirm)
            }
            Button::Logout | Button::RefreshDevices => state == ViewState::LoggedInApp,
            Button::AddDevice | Button::UpdateDevice | Button::DeleteDevice => {
                frontend == Frontend::Admin && state == ViewState::LoggedInApp
            }
        }
    }
}

impl FromStr for Button {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Button::ALL
            .into_iter()
            .find(|b| b.id() == s)
            .ok_or_else(|| anyhow!("unknown button: {s:?}"))
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { field: Field, value: String },
    Click(Button),
    Edit(String),
    Delete(String),
    Inspect(String),
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim_start();

        let id_arg = |what: &str| -> Result<String> {
            if rest.is_empty() {
                bail!("usage: {what} <device-id>");
            }
            Ok(rest.to_owned())
        };

        Ok(match verb {
            "set" => {
                let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if field.is_empty() {
                    bail!("usage: set <field-id> <value>");
                }
                Command::Set {
                    field: field.parse()?,
                    value: value.trim_start().to_owned(),
                }
            }
            "click" => Command::Click(rest.parse()?),
            "edit" => Command::Edit(id_arg("edit")?),
            "delete" => Command::Delete(id_arg("delete")?),
            "inspect" => Command::Inspect(id_arg("inspect")?),
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command: {other:?} (try `help`)"),
        })
    }
}

// ---------------------------------------------------------------------------
// Front-end selection
// ---------------------------------------------------------------------------

pub enum Portal {
    Admin(AdminPortal),
    Mobile(MobileApp),
}

impl Portal {
    pub fn shell(&self) -> &Shell {
        match self {
            Portal::Admin(p) => &**p,
            Portal::Mobile(m) => &**m,
        }
    }

    pub fn shell_mut(&mut self) -> &mut Shell {
        match self {
            Portal::Admin(p) => &mut **p,
            Portal::Mobile(m) => &mut **m,
        }
    }

    fn admin(&mut self) -> Option<&mut AdminPortal> {
        match self {
            Portal::Admin(p) if p.state() == ViewState::LoggedInApp => Some(p),
            _ => None,
        }
    }

    pub async fn click(&mut self, button: Button) -> Result<()> {
        let shell = self.shell();
        if !button.visible(shell.frontend(), shell.state()) {
            bail!("{button} is not on this screen");
        }

        match button {
            Button::ShowSignup => self.shell_mut().show_signup().await,
            Button::ShowLogin => self.shell_mut().show_login().await,
            Button::Login => self.shell_mut().sign_in().await,
            Button::Signup => self.shell_mut().sign_up().await,
            Button::ConfirmSignup => self.shell_mut().confirm_sign_up().await,
            Button::ResendCode => self.shell_mut().resend_code().await,
            Button::Logout => self.shell_mut().sign_out().await,
            Button::RefreshDevices => self.shell_mut().load_devices().await,
            Button::AddDevice | Button::UpdateDevice | Button::DeleteDevice => {
                let Some(admin) = self.admin() else {
                    bail!("{button} is not on this screen");
                };
                match button {
                    Button::AddDevice => admin.add_device().await,
                    Button::UpdateDevice => admin.update_device().await,
                    _ => admin.delete_device(None).await,
                }
            }
        }
        Ok(())
    }

    pub fn set(&mut self, field: Field, value: String) -> Result<()> {
        let shell = self.shell_mut();
        if !field.available_on(shell.frontend()) || field.view() != shell.state() {
            bail!("{} is not on this screen", field.id());
        }
        shell.set_field(field, value);
        Ok(())
    }

    fn require_admin(&mut self) -> Result<&mut AdminPortal> {
        self.admin()
            .ok_or_else(|| anyhow!("device actions need the signed-in admin portal"))
    }

    /// Run one command. Returns text to print before the page, if any.
    pub async fn handle(&mut self, command: Command) -> Result<Option<String>> {
        match command {
            Command::Set { field, value } => self.set(field, value)?,
            Command::Click(button) => self.click(button).await?,
            Command::Edit(id) => self.require_admin()?.edit_row(&id),
            Command::Delete(id) => self.require_admin()?.delete_device(Some(&id)).await,
            Command::Inspect(id) => return Ok(self.require_admin()?.inspect_device(&id).await),
            Command::Help => return Ok(Some(HELP.to_owned())),
            Command::Show | Command::Quit => {}
        }
        Ok(None)
    }

    pub fn render(&self) -> String {
        let shell = self.shell();
        shell.page().render(shell.frontend(), Instant::now())
    }
}

// ---------------------------------------------------------------------------
// stdin
// ---------------------------------------------------------------------------

type SharedLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

/// Asks on stdout and reads `y`/`yes` from the same stdin the commands come
/// from.
pub struct ConsolePrompt {
    lines: SharedLines,
}

#[async_trait]
impl Confirmer for ConsolePrompt {
    async fn confirm(&self, prompt: &str) -> bool {
        println!("{prompt} [y/N]");
        match self.lines.lock().await.next_line().await {
            Ok(Some(answer)) => is_yes(&answer),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read confirmation");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Drive `frontend` from stdin until `quit` or end of input.
pub async fn run(
    frontend: Frontend,
    session: Arc<dyn SessionProvider>,
    api: Arc<dyn DeviceApi>,
    display_for: Duration,
) -> Result<()> {
    let lines: SharedLines = Arc::new(Mutex::new(BufReader::new(io::stdin()).lines()));

    let mut portal = match frontend {
        Frontend::Admin => {
            let prompt = Arc::new(ConsolePrompt {
                lines: lines.clone(),
            });
            Portal::Admin(AdminPortal::new(session, api, prompt, display_for))
        }
        Frontend::Mobile => Portal::Mobile(MobileApp::new(session, api, display_for)),
    };

    portal.shell_mut().init().await;
    info!(%frontend, state = ?portal.shell().state(), "Front-end ready");
    println!("{}", portal.render());

    loop {
        let line = lines.lock().await.next_line().await?;
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        debug!(?command, "Handling command");
        if command == Command::Quit {
            break;
        }

        match portal.handle(command).await {
            Ok(Some(text)) => println!("{text}"),
            Ok(None) => {}
            Err(e) => println!("{e}"),
        }
        println!("{}", portal.render());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::MockDeviceApi,
        session::{AuthError, MockSessionProvider},
        view::StatusBanner,
    };

    #[test]
    fn parses_set_with_spaces_in_value() {
        let cmd: Command = "set add-device-properties {\"a\": 1}".parse().unwrap();
        assert_eq!(
            cmd,
            Command::Set {
                field: Field::AddDeviceProperties,
                value: "{\"a\": 1}".to_owned(),
            }
        );
    }

    #[test]
    fn set_without_value_clears() {
        let cmd: Command = "set login-username".parse().unwrap();
        assert_eq!(
            cmd,
            Command::Set {
                field: Field::LoginUsername,
                value: String::new(),
            }
        );
    }

    #[test]
    fn parses_clicks_and_row_actions() {
        assert_eq!(
            "click login-btn".parse::<Command>().unwrap(),
            Command::Click(Button::Login)
        );
        assert_eq!(
            "delete  lamp-1".parse::<Command>().unwrap(),
            Command::Delete("lamp-1".to_owned())
        );
        assert_eq!("quit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_unknown_input() {
        assert!("click nope".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
        assert!("edit".parse::<Command>().is_err());
        assert!("set".parse::<Command>().is_err());
    }

    #[test]
    fn button_ids_roundtrip() {
        for button in Button::ALL {
            assert_eq!(button.id().parse::<Button>().unwrap(), button);
        }
    }

    #[test]
    fn admin_buttons_hidden_on_mobile() {
        assert!(Button::AddDevice.visible(Frontend::Admin, ViewState::LoggedInApp));
        assert!(!Button::AddDevice.visible(Frontend::Mobile, ViewState::LoggedInApp));
        assert!(Button::RefreshDevices.visible(Frontend::Mobile, ViewState::LoggedInApp));
        assert!(!Button::Logout.visible(Frontend::Admin, ViewState::LoggedOutLogin));
    }

    #[test]
    fn yes_answers() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }

    fn logged_out_mobile() -> Portal {
        let mut session = MockSessionProvider::new();
        session.expect_sign_in().never();
        session
            .expect_current_authenticated_user()
            .returning(|| Err(AuthError::NoCurrentUser));
        Portal::Mobile(MobileApp::new(
            Arc::new(session),
            Arc::new(MockDeviceApi::new()),
            StatusBanner::DEFAULT_DISPLAY,
        ))
    }

    #[tokio::test]
    async fn hidden_controls_are_refused() {
        let mut portal = logged_out_mobile();
        portal.shell_mut().init().await;

        assert!(portal.click(Button::Logout).await.is_err());
        assert!(portal
            .set(Field::SignupUsername, "alice".to_owned())
            .is_err());
        assert!(portal
            .handle(Command::Edit("lamp-1".to_owned()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn typing_then_clicking_runs_handler() {
        let mut portal = logged_out_mobile();
        portal.shell_mut().init().await;

        portal
            .handle(Command::Set {
                field: Field::LoginUsername,
                value: "alice".to_owned(),
            })
            .await
            .unwrap();
        portal.handle(Command::Click(Button::Login)).await.unwrap();

        let text = portal.render();
        assert!(text.contains("Please enter username and password."));
        assert!(text.contains("login-username: alice"));
    }
}
