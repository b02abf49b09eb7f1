//! # ragdesk-cli
//!
//! The ragdesk application: configuration, the request handler that sits
//! between the user and the pipeline/agent, an interactive console and
//! logging setup.
//!
//! ```rust,ignore
//! use ragdesk_cli::{AppConfig, Overrides, RagApp};
//!
//! let app = RagApp::from_config(&AppConfig::from_env(Overrides::default())?)?;
//! println!("{}", app.ingest_paths(&["manual.pdf".into()]).await);
//! println!("{}", app.ask("How long is the warranty?").await);
//! ```

pub mod app;
pub mod config;
pub mod console;
pub mod error;
pub mod telemetry;

pub use app::{NO_INDEX_MESSAGE, RagApp, Reply};
pub use config::{AppConfig, Overrides};
pub use console::{Command, run_console};
pub use error::AppError;
