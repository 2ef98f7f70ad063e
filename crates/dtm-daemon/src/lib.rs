//! # dtm-daemon
//!
//! HTTP boundary for the design-token governance core.
//!
//! | Method/path | Handler |
//! |---|---|
//! | `POST /api/save-token` | [`api::handle_save_token`] |
//! | `GET /api/global-guard/history` | [`api::handle_history`] |
//! | `POST /api/global-guard/restore` | [`api::handle_restore`] |
//! | `POST /api/global-guard/restore-latest` | [`api::handle_restore_latest`] |
//! | `GET /api/validate-figma-export` | [`api::handle_validate`] |
//! | `POST /api/workspace/create-project` | [`api::handle_create_project`] |
//! | `GET /api/workspace/projects` | [`api::handle_list_projects`] |
//! | `GET /api/health` | liveness |
//!
//! The `handle_*` functions are synchronous and take the
//! [`GovernanceStore`] explicitly; [`routes::router`] runs them on the
//! blocking pool.

pub mod api;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{ConfigError, DaemonConfig};
pub use error::{ApiError, DaemonError};
pub use routes::router;
pub use state::{AppState, GovernanceStore};
