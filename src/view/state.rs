/// Which screen a front-end shows. Exactly one is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewState {
    #[default]
    LoggedOutLogin,
    LoggedOutSignup,
    LoggedOutConfirm,
    LoggedInApp,
}

impl ViewState {
    pub fn is_logged_in(self) -> bool {
        self == ViewState::LoggedInApp
    }
}

/// Something that happened: a navigation link was clicked or an auth call
/// finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// "Back to login" link.
    ShowLogin,
    /// "Create an account" link.
    ShowSignup,
    /// Startup found a signed-in user.
    SessionFound,
    /// Startup found nobody signed in.
    NoSession,
    SignedUp { username: String },
    Confirmed,
    SignedIn,
    SignedOut,
    /// An API call reported that the session is gone.
    SessionLost,
}

/// Work the controller does after entering a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    PrefillConfirmUsername(String),
    RefreshWelcome,
    ClearWelcome,
    ReloadDevices,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ViewState,
    pub effects: Vec<Effect>,
}

/// Next state and effects for `event` in `state`.
///
/// The login/signup links live on the logged-out screens, so they do nothing
/// while the app is showing.
pub fn transition(state: ViewState, event: ViewEvent) -> Transition {
    use Effect::*;
    use ViewState::*;

    match event {
        ViewEvent::ShowLogin | ViewEvent::ShowSignup if state.is_logged_in() => Transition {
            state,
            effects: Vec::new(),
        },
        ViewEvent::ShowSignup => Transition {
            state: LoggedOutSignup,
            effects: vec![ClearWelcome],
        },
        ViewEvent::SignedUp { username } => Transition {
            state: LoggedOutConfirm,
            effects: vec![PrefillConfirmUsername(username), ClearWelcome],
        },
        ViewEvent::ShowLogin
        | ViewEvent::NoSession
        | ViewEvent::Confirmed
        | ViewEvent::SignedOut
        | ViewEvent::SessionLost => Transition {
            state: LoggedOutLogin,
            effects: vec![ClearWelcome],
        },
        ViewEvent::SessionFound | ViewEvent::SignedIn => Transition {
            state: LoggedInApp,
            effects: vec![RefreshWelcome, ReloadDevices],
        },
    }
}
