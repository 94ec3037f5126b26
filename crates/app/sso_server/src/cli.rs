use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sso_server", version, about = "SSO token issuance and request authorization")]
pub struct Cli {
    /// Path to the YAML config file.
    #[arg(long, short, env = "CONFIG_PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Overrides `storage_path` from the config file.
    #[arg(long, env = "STORAGE_PATH", global = true)]
    pub storage_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply migrations, then serve until SIGINT or SIGTERM.
    Serve {
        /// Overrides `http.port` from the config file.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply migrations and exit.
    Migrate,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_takes_a_port() {
        let cli = Cli::try_parse_from(["sso_server", "--config", "sso.yaml", "serve", "--port", "9000"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("sso.yaml")));
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000) }));
    }
}
