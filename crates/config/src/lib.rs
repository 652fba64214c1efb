//! Process configuration: one immutable [`AppConfig`] built from the
//! environment at startup and passed by reference everywhere else.
//! No mutable globals.

pub mod loader;
pub mod schema;

pub use {
    loader::{Error, from_env, from_lookup},
    schema::{AppConfig, MediaConfig, PcloudConfig, TelegramConfig},
};
