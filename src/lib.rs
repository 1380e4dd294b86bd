//! Workspace placeholder crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`core-service`, `core-playback`). Host applications can depend on
//! `manufy-core` and enable the documented features without wiring each crate
//! individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;

#[cfg(feature = "playback")]
pub use core_playback as playback;
