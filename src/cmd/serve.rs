//! Back-office server command (`mintdesk serve`).

use std::path::PathBuf;

use anyhow::Result;
use mintdesk::backoffice::{ServerConfig, start_server};
use mintdesk::config::MintdeskConfig;

/// Command-line values that win over file and environment settings.
#[derive(Debug, Default)]
pub struct ServeOverrides {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub db_path: Option<PathBuf>,
    pub dev: bool,
}

fn server_config(config: &MintdeskConfig, overrides: ServeOverrides) -> ServerConfig {
    let mut server = ServerConfig::from(config);
    if let Some(port) = overrides.port {
        server.port = port;
    }
    if let Some(host) = overrides.host {
        server.host = host;
    }
    if let Some(db_path) = overrides.db_path {
        server.db_path = if db_path.is_absolute() {
            db_path
        } else {
            config.project_dir.join(db_path)
        };
    }
    server.dev_mode |= overrides.dev;
    server
}

pub async fn cmd_serve(config: MintdeskConfig, overrides: ServeOverrides) -> Result<()> {
    let executor = config.mint_executor()?;
    let server = server_config(&config, overrides);
    start_server(server, executor).await
}
