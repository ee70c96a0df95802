use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

impl StatusKind {
    pub fn css_class(self) -> &'static str {
        match self {
            StatusKind::Success => "success",
            StatusKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    shown_at: Instant,
}

/// Single transient banner. Nothing exists until the first message; each new
/// message replaces the previous one and restarts the display window.
#[derive(Debug)]
pub struct StatusBanner {
    display_for: Duration,
    current: Option<StatusMessage>,
}

impl StatusBanner {
    pub const DEFAULT_DISPLAY: Duration = Duration::from_secs(5);

    pub fn new(display_for: Duration) -> Self {
        Self {
            display_for,
            current: None,
        }
    }

    pub fn show(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.current = Some(StatusMessage {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
        });
    }

    /// Whether a message was ever shown (the banner element exists).
    pub fn is_created(&self) -> bool {
        self.current.is_some()
    }

    /// Latest message, visible or not.
    pub fn last(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    pub fn visible(&self) -> Option<&StatusMessage> {
        self.visible_at(Instant::now())
    }

    pub fn visible_at(&self, now: Instant) -> Option<&StatusMessage> {
        self.current
            .as_ref()
            .filter(|msg| now < msg.shown_at + self.display_for)
    }
}

impl Default for StatusBanner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DISPLAY)
    }
}
