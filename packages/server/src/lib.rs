// Coffee Chat Matcher - API Core
//
// Pairs roster members for coffee chats, opens a group conversation per pair and
// nudges each pair through follow-up check-ins until the chat is done.
//
// Pairing and follow-up logic lives in domains/matching; infrastructure (store
// backends, chat platform adapter, scheduler) lives in kernel/.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
