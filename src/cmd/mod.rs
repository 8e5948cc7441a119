//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled                  |
//! |-----------|-----------------------------------|
//! | `project` | `Init`, `Import`, `Projects`      |
//! | `serve`   | `Serve`                           |
//! | `report`  | `Summary`, `Audit`                |
//! | `mint`    | `Mint`                            |
//! | `config`  | `Config`                          |

pub mod config;
pub mod mint;
pub mod project;
pub mod report;
pub mod serve;

pub use config::cmd_config;
pub use mint::{MintSelection, cmd_mint};
pub use project::{cmd_import, cmd_init, cmd_projects};
pub use report::{cmd_audit, cmd_summary};
pub use serve::{ServeOverrides, cmd_serve};

use anyhow::{Result, bail};
use mintdesk::backoffice::BackofficeDb;
use mintdesk::config::MintdeskConfig;

/// Open the project database, refusing to create one outside `init`.
pub(crate) fn open_db(config: &MintdeskConfig) -> Result<BackofficeDb> {
    let db_path = config.db_path();
    if !db_path.exists() {
        bail!(
            "No database at {}. Run 'mintdesk init' first.",
            db_path.display()
        );
    }
    BackofficeDb::new(&db_path)
}
