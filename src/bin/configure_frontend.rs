//! Writes deployment outputs into both front-ends' settings files.
//!
//! Usage:
//!   configure_frontend <API_URL> <USER_POOL_ID> <CLIENT_ID> [REGION]
//!
//! Files are resolved under `$PORTAL_ROOT`, or the current directory.

use std::{env, path::PathBuf, process};

use device_portal::configure::{configure, ConfigureError, Deployment, EXAMPLE, USAGE};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let deployment = match Deployment::from_args(&args) {
        Ok(d) => d,
        Err(ConfigureError::Usage(_)) => {
            println!("{USAGE}");
            println!("{EXAMPLE}");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let root = env::var_os("PORTAL_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    match configure(&root, &deployment) {
        Ok(written) => {
            for (frontend, path) in written {
                println!("Updated {} configuration ({})", frontend.label(), path.display());
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
