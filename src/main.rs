use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use device_portal::{
    api::ApiClient,
    config::{Config, Frontend},
    console,
    session::CognitoClient,
};

/// Terminal front-end for the device management API.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Which front-end to run: admin or mobile.
    #[arg(long, default_value = "admin")]
    frontend: Frontend,

    /// Settings file to load. Defaults to the front-end's portal.env.
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // An explicit file must exist; the default one may be absent when the
    // variables are set externally.
    let env_loaded = match &args.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            Some(path.clone())
        }
        None => {
            let root = std::env::var_os("PORTAL_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let path = args.frontend.settings_path(&root);
            dotenvy::from_path(&path).ok().map(|_| path)
        }
    };

    // Logs go to stderr so they stay out of the rendered page.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match &env_loaded {
        Some(path) => info!(path = %path.display(), "Loaded settings"),
        None => warn!("No settings file found; using process environment only"),
    }

    let config = Config::from_env()?;
    info!(
        frontend = %args.frontend,
        api = %config.api_base_url,
        region = %config.region,
        "Starting"
    );

    let cognito = CognitoClient::new(&config);
    if cognito.restore().await {
        info!("Restored saved session");
    }

    let session = Arc::new(cognito);
    let api = Arc::new(ApiClient::new(&config.api_base_url, session.clone()));

    console::run(
        args.frontend,
        session,
        api,
        Duration::from_secs(config.status_display_secs),
    )
    .await
}
