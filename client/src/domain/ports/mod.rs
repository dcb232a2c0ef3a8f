//! Domain ports for the external collaborators of the client core.

mod macros;
pub(crate) use macros::define_port_error;

mod alert_presenter;
mod credential_store;
mod failure_monitor;
mod navigator;

pub use alert_presenter::{AlertKind, AlertPresenter, RecordingAlertPresenter};
pub use credential_store::{
    CredentialKeys, CredentialStore, CredentialStoreError, InMemoryCredentialStore,
};
#[cfg(test)]
pub use failure_monitor::MockFailureMonitor;
pub use failure_monitor::{FailureMonitor, FailureMonitorError, FailureReport, NoOpFailureMonitor};
pub use navigator::{FixtureNavigator, Navigator};
