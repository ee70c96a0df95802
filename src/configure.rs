//! Post-deployment patching of the front-end settings files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::info;

use crate::config::{
    Frontend, API_URL_PLACEHOLDER, CLIENT_ID_PLACEHOLDER, DEFAULT_REGION,
    USER_POOL_ID_PLACEHOLDER,
};

pub const USAGE: &str = "Usage: configure_frontend <API_URL> <USER_POOL_ID> <CLIENT_ID> [REGION]";
pub const EXAMPLE: &str = "Example: configure_frontend \
https://abc123.execute-api.us-east-1.amazonaws.com/Stage us-east-1_ABC123 1234567890abcdef us-east-1";

/// The region line every fresh settings file carries.
const REGION_LINE: &str = "COGNITO_REGION=us-east-1";

#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("expected at least 3 arguments, got {0}")]
    Usage(usize),

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Values produced by a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub api_url: String,
    pub user_pool_id: String,
    pub client_id: String,
    pub region: String,
}

impl Deployment {
    /// Positional arguments, program name excluded. Values are not validated.
    pub fn from_args(args: &[String]) -> Result<Self, ConfigureError> {
        let [api_url, user_pool_id, client_id, rest @ ..] = args else {
            return Err(ConfigureError::Usage(args.len()));
        };
        Ok(Self {
            api_url: api_url.clone(),
            user_pool_id: user_pool_id.clone(),
            client_id: client_id.clone(),
            region: rest
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_REGION.to_owned()),
        })
    }
}

/// Replace the first occurrence of each placeholder; every other byte is kept.
pub fn patch(source: &str, deployment: &Deployment) -> String {
    source
        .replacen(USER_POOL_ID_PLACEHOLDER, &deployment.user_pool_id, 1)
        .replacen(CLIENT_ID_PLACEHOLDER, &deployment.client_id, 1)
        .replacen(API_URL_PLACEHOLDER, &deployment.api_url, 1)
        .replacen(
            REGION_LINE,
            &format!("COGNITO_REGION={}", deployment.region),
            1,
        )
}

/// Patch both front-ends' settings files under `root`.
///
/// Both files are read before either is written, so a missing file leaves
/// the other untouched. Returns the front-ends in the order they were written.
pub fn configure(
    root: &Path,
    deployment: &Deployment,
) -> Result<Vec<(Frontend, PathBuf)>, ConfigureError> {
    let mut patched = Vec::with_capacity(Frontend::ALL.len());
    for frontend in Frontend::ALL {
        let path = frontend.settings_path(root);
        let source = fs::read_to_string(&path).map_err(|source| ConfigureError::Read {
            path: path.clone(),
            source,
        })?;
        patched.push((frontend, path, patch(&source, deployment)));
    }

    let mut written = Vec::with_capacity(patched.len());
    for (frontend, path, contents) in patched {
        fs::write(&path, contents).map_err(|source| ConfigureError::Write {
            path: path.clone(),
            source,
        })?;
        info!(%frontend, path = %path.display(), "Settings file updated");
        written.push((frontend, path));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "\
# Front-end settings
PORTAL_API_BASE_URL=YOUR_API_GATEWAY_INVOKE_URL_HERE
COGNITO_USER_POOL_ID=YOUR_USER_POOL_ID
COGNITO_CLIENT_ID=YOUR_USER_POOL_CLIENT_ID
COGNITO_REGION=us-east-1
";

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn deployment() -> Deployment {
        Deployment::from_args(&args(&[
            "https://abc.execute-api.eu-west-1.amazonaws.com/prod",
            "eu-west-1_POOL",
            "client123",
            "eu-west-1",
        ]))
        .unwrap()
    }

    fn write_templates(root: &Path, body: &str) {
        for frontend in Frontend::ALL {
            let path = frontend.settings_path(root);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
    }

    #[test]
    fn fewer_than_three_args_is_usage_error() {
        assert!(matches!(
            Deployment::from_args(&args(&["a", "b"])),
            Err(ConfigureError::Usage(2))
        ));
        assert!(matches!(
            Deployment::from_args(&[]),
            Err(ConfigureError::Usage(0))
        ));
    }

    #[test]
    fn region_defaults_and_extra_args_are_ignored() {
        let d = Deployment::from_args(&args(&["u", "p", "c"])).unwrap();
        assert_eq!(d.region, "us-east-1");

        let d = Deployment::from_args(&args(&["u", "p", "c", "ap-south-1", "extra"])).unwrap();
        assert_eq!(d.region, "ap-south-1");
    }

    #[test]
    fn patch_replaces_each_token_once() {
        let out = patch(TEMPLATE, &deployment());
        assert_eq!(
            out,
            "\
# Front-end settings
PORTAL_API_BASE_URL=https://abc.execute-api.eu-west-1.amazonaws.com/prod
COGNITO_USER_POOL_ID=eu-west-1_POOL
COGNITO_CLIENT_ID=client123
COGNITO_REGION=eu-west-1
"
        );
    }

    #[test]
    fn only_first_occurrence_changes() {
        let source = "YOUR_USER_POOL_ID YOUR_USER_POOL_ID";
        assert_eq!(patch(source, &deployment()), "eu-west-1_POOL YOUR_USER_POOL_ID");
    }

    #[test]
    fn configure_patches_both_files() {
        let dir = tempfile::tempdir().unwrap();
        write_templates(dir.path(), TEMPLATE);

        let written = configure(dir.path(), &deployment()).unwrap();

        assert_eq!(written.len(), 2);
        for frontend in Frontend::ALL {
            let text = fs::read_to_string(frontend.settings_path(dir.path())).unwrap();
            assert!(text.contains("COGNITO_CLIENT_ID=client123"));
            assert!(!text.contains("YOUR_"));
        }
    }

    #[test]
    fn missing_file_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let admin = Frontend::Admin.settings_path(dir.path());
        fs::create_dir_all(admin.parent().unwrap()).unwrap();
        fs::write(&admin, TEMPLATE).unwrap();

        let err = configure(dir.path(), &deployment()).unwrap_err();

        assert!(matches!(err, ConfigureError::Read { .. }));
        assert_eq!(fs::read_to_string(&admin).unwrap(), TEMPLATE);
    }
}
