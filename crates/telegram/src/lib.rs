//! Telegram front end for cloudtune.
//!
//! Receives commands and URL submissions via the teloxide library's Bot API
//! bindings and renders pipeline status by editing one message in place.

pub mod bot;
pub mod handlers;
pub mod surface;

pub use bot::{BotContext, start_polling};
