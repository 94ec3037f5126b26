use sso_api::config::Environment;
use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

const DEBUG_FILTER: &str = "info,sso_server=debug,sso_api=debug,sso_core=debug";
const PROD_FILTER: &str = "info";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Logs go to stderr: human-readable for `local`, JSON otherwise.
pub fn init(env: Environment) -> Result<()> {
    let default = match env {
        Environment::Local | Environment::Dev => DEBUG_FILTER,
        Environment::Prod => PROD_FILTER,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    let installed = match env {
        Environment::Local => builder.try_init(),
        Environment::Dev | Environment::Prod => builder.json().try_init(),
    };
    installed.map_err(|e| Error::Logging(e.to_string()))
}
