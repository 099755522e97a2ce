pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::{http::HttpProvisioningApi, storage::LocalStorage};
pub use crate::config::toml_config::ProvisionFile;
pub use crate::core::{
    orchestrator::{CreationOrchestrator, RunOutcome},
    wizard::{WizardShell, WizardStep},
};
pub use crate::utils::error::{ProvisionError, Result};
