//! Atrium Infrastructure - Transport adapters
//!
//! This crate provides the concrete transports behind the application
//! layer: the authenticated REST client, the file-backed credential
//! store, and the realtime stream subscriptions.

pub mod api;
pub mod persistence;
pub mod streaming;

pub use api::{ApiClient, ApiError};
pub use persistence::FileCredentialStore;
pub use streaming::{ChatChannel, StatusSubscription};
