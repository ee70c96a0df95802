use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, Context, Result};

/// Region written into fresh settings files and used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Tokens shipped in each front-end's settings file until `configure_frontend`
/// replaces them with deployment outputs.
pub const USER_POOL_ID_PLACEHOLDER: &str = "YOUR_USER_POOL_ID";
pub const CLIENT_ID_PLACEHOLDER: &str = "YOUR_USER_POOL_CLIENT_ID";
pub const API_URL_PLACEHOLDER: &str = "YOUR_API_GATEWAY_INVOKE_URL_HERE";

// ---------------------------------------------------------------------------
// Frontend
// ---------------------------------------------------------------------------

/// The two front-ends served by this crate. Each has its own settings file
/// under `frontend/<dir>/portal.env`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frontend {
    Admin,
    Mobile,
}

impl Frontend {
    pub const ALL: [Frontend; 2] = [Frontend::Admin, Frontend::Mobile];

    pub fn settings_dir(self) -> &'static str {
        match self {
            Frontend::Admin => "admin-portal",
            Frontend::Mobile => "mobile-app",
        }
    }

    /// Path of this front-end's settings file relative to the project `root`.
    pub fn settings_path(self, root: &Path) -> PathBuf {
        root.join("frontend")
            .join(self.settings_dir())
            .join("portal.env")
    }

    pub fn label(self) -> &'static str {
        match self {
            Frontend::Admin => "admin portal",
            Frontend::Mobile => "mobile app",
        }
    }
}

impl FromStr for Frontend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Self::Admin),
            "mobile" => Ok(Self::Mobile),
            other => Err(anyhow::anyhow!("unknown frontend: {other:?}")),
        }
    }
}

impl fmt::Display for Frontend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Frontend::Admin => "admin",
            Frontend::Mobile => "mobile",
        })
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Device API invoke URL, without a trailing slash.
    pub api_base_url: String,
    pub user_pool_id: String,
    pub client_id: String,
    /// Only set for app clients created with a secret.
    pub client_secret: Option<String>,
    pub region: String,
    /// Cognito Identity Provider endpoint. Defaults to the regional endpoint.
    pub cognito_endpoint: String,
    /// Where the signed-in session survives between runs. `None` keeps it in memory.
    pub session_file: Option<PathBuf>,
    /// How long a status message stays visible, in seconds.
    pub status_display_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let region = optional(&lookup, "COGNITO_REGION", DEFAULT_REGION);
        let cognito_endpoint = lookup("COGNITO_ENDPOINT")
            .unwrap_or_else(|| format!("https://cognito-idp.{region}.amazonaws.com/"));

        Ok(Self {
            api_base_url: configured(&lookup, "PORTAL_API_BASE_URL", API_URL_PLACEHOLDER)?
                .trim_end_matches('/')
                .to_owned(),
            user_pool_id: configured(&lookup, "COGNITO_USER_POOL_ID", USER_POOL_ID_PLACEHOLDER)?,
            client_id: configured(&lookup, "COGNITO_CLIENT_ID", CLIENT_ID_PLACEHOLDER)?,
            client_secret: lookup("COGNITO_CLIENT_SECRET").filter(|s| !s.is_empty()),
            region,
            cognito_endpoint,
            session_file: lookup("PORTAL_SESSION_FILE")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            status_display_secs: display_secs(&optional(&lookup, "STATUS_DISPLAY_SECS", "5"))?,
        })
    }
}

/// A required value that must also have been replaced by `configure_frontend`.
fn configured(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    placeholder: &str,
) -> Result<String> {
    let value = required(lookup, key)?;
    if value == placeholder {
        bail!("{key} still holds the placeholder {placeholder:?}; run configure_frontend first");
    }
    Ok(value)
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("missing required env var: {key}"))
}

/// A zero duration would hide every status message as soon as it is shown.
fn display_secs(raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => bail!("STATUS_DISPLAY_SECS must be a positive integer, got {raw:?}"),
        Ok(secs) => Ok(secs),
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_owned())
}
