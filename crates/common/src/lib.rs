//! Shared types, error machinery, and the typed event bus used across all
//! hacka.re crates.

pub mod error;
pub mod event_bus;

pub use error::{Error, FromMessage, HackareError, Result};
pub use event_bus::{EventBus, Topic};
