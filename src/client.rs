//! Session-aware client for the MediaWiki action API.
//!
//! Keep the public surface small and predictable: [`MediawikiClient::action`] is
//! the engine, everything else is a convenience call on top of it.
//! Implementation details are split into submodules under `src/client/`.

pub mod account;
pub mod builder;
pub mod core;
mod dispatch;
mod pages;
mod query;

pub use account::AuthOutcome;
pub use builder::MediawikiClientBuilder;
pub use core::MediawikiClient;
pub use pages::DEFAULT_PROTECTIONS;
