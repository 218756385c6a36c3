//! `strata-app`: the application state machine driven by consensus.
//!
//! - [`app::App`]: InitChain, BeginBlock, CheckTx, DeliverTx, EndBlock,
//!   Commit and Query over a `LedgerStore`
//! - [`config::AppConfig`]: chain parameters, protocol upgrade schedule and
//!   logging, loaded from JSON
//! - [`genesis::GenesisState`]: initial balances, stakes and delegates
//! - [`query`]: read-only lookups against the committed view
//! - [`telemetry`]: tracing subscriber installation
//!
//! The consensus driver owns networking and block production; it calls into
//! `App` one block at a time and halts on any `AppError`.

pub mod app;
pub mod config;
pub mod error;
pub mod genesis;
pub mod query;
pub mod state;
pub mod telemetry;

// Re-export key types for convenience
pub use app::{App, AppInfo, BeginBlockRequest, EndBlockResponse, TxResponse, VoteInfo};
pub use config::{AppConfig, ConfigError, LogConfig};
pub use error::AppError;
pub use genesis::{GenesisBalance, GenesisDelegate, GenesisError, GenesisStake, GenesisState};
pub use query::QueryResponse;
pub use state::AppState;
pub use telemetry::{init_tracing, TelemetryError};
