//! Realtime stream adapters.

mod chat;
mod status;

pub use chat::ChatChannel;
pub use status::StatusSubscription;
