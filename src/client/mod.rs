//! Prior API client
//!
//! [`PriorClient`] is the only component that talks to the service. Payload
//! types live in [`types`].

mod api;
pub(crate) mod response;
pub mod types;

pub use api::PriorClient;
pub use types::*;

#[cfg(test)]
pub(crate) use api::tests::registered_client;
