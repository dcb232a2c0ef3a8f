//! Outbound adapters for the remote collaborators.

pub mod http;

pub use http::{ApiTransport, TransportBuildError};
