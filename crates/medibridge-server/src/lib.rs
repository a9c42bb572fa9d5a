//! MediBridge HTTP service.
//!
//! # Modules
//!
//! - [`orchestrator`]: Runs a chat turn (reply, extraction, search, ranking, upsert)
//! - [`routes`]: axum router exposing chat, doctor and hospital endpoints
//! - [`locks`]: Per-session serialization of turns
//! - [`config`]: Environment-derived startup configuration
//! - [`error`]: `ApiError` and its JSON response body
//! - [`audit`]: JSON report behind the `medibridge-audit` binary

pub mod audit;
pub mod config;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod routes;

pub use audit::AuditReport;
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use orchestrator::{Orchestrator, TurnError, TurnOutcome};
pub use routes::{router, AppState};
