//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the Manufy core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus and user notifications
//!
//! Every other workspace crate depends on these conventions: bridges come in
//! through [`config::CoreConfig`], state changes go out through
//! [`events::EventBus`], and diagnostics go through `tracing`.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
