pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::TomlConfig;

pub use crate::adapters::{http::ShopSession, storage::LocalStorage};
pub use crate::core::driver::{Driver, DriverSettings, RunReport};
pub use crate::core::ledger::Ledger;
pub use crate::core::order::OrderAccumulator;
pub use crate::core::selection::{ContentFilter, Selection, SelectionEngine, TitleFilter};
pub use crate::domain::model::{Candidate, CandidateBatch, Item, RunMode, RunStatus, SubmissionPayload};
pub use crate::utils::error::{BasketError, Result};
