//! Back-office service: SQLite persistence, HTTP API and live events around
//! the minting lifecycle in `mintdesk_common`.
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | `models`   | projects, investors, subscriptions, allocation views, audit |
//! | `db`       | `BackofficeDb` (implements `AllocationStore`), `DbHandle`  |
//! | `api`      | axum routes and `ApiError`                                 |
//! | `ws`       | WebSocket event stream                                     |
//! | `server`   | router assembly and `start_server`                         |

pub mod api;
pub mod db;
pub mod models;
pub mod server;
pub mod ws;

pub use db::{BackofficeDb, DbHandle};
pub use server::{ServerConfig, start_server};
