//! Atrium Application - Ports and coordination logic
//!
//! This crate holds the pieces between the domain model and the transport
//! adapters: the credential store port, the single-flight refresh
//! coordinator, and the realtime frame normalizer.

pub mod auth;
pub mod normalize;

pub use auth::{
    CredentialStore, CredentialStoreError, MemoryCredentialStore, RefreshCoordinator,
    RefreshOutcome, RefreshTicket, RefreshWaiter,
};
pub use normalize::decode_status_frame;
