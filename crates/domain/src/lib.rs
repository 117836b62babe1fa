//! Atrium Domain - Core client types
//!
//! This crate defines the domain model for the Atrium console client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod realtime;
pub mod request;

pub use auth::{AuthError, AuthSession, Credential, SignInRequest, SignUpRequest, UserProfile};
pub use chat::{ChatCommand, ChatEvent, ChatMessage, ChatSignal};
pub use config::ClientConfig;
pub use error::{DomainError, DomainResult};
pub use realtime::{
    IntegrationState, IntegrationStatus, LegacyIntegration, StreamError, StreamEvent,
};
pub use request::{ApiRequest, ApiResponse, HttpMethod};
