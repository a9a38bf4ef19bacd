//! Core non-UI logic: install orchestration and screen affordances.

pub mod actions;
pub mod coordinator;

pub use actions::{ActionContext, InstallActions, PrimaryAction, install_actions};
pub use coordinator::{
    ActionOutcome, InstallCoordinator, InstallPolicy, InstallTask, PendingAction,
};
