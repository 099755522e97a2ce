pub mod orchestrator;
pub mod preview;
pub mod progress;
pub mod rules;
pub mod selector;
pub mod wizard;

pub use crate::domain::model::{ExecutionItem, FormAggregate, ItemStatus, ResourceKind};
pub use crate::domain::ports::{ProvisioningApi, Storage};
pub use crate::utils::error::Result;
