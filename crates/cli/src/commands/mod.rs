//! Command handlers for the lorebase CLI.

pub mod chat;
pub mod kb;

pub use chat::ChatCommand;
pub use kb::KbCommand;
