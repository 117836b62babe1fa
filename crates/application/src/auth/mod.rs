//! Authentication ports and coordination.

mod coordinator;
mod credential_store;

pub use coordinator::{RefreshCoordinator, RefreshOutcome, RefreshTicket, RefreshWaiter};
pub use credential_store::{CredentialStore, CredentialStoreError, MemoryCredentialStore};
