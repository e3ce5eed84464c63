//! screenrec library crate.
//!
//! Resolves what to record (device, region, resolution, frame rate) against
//! what the hardware offers and assembles the FFmpeg job that records it.
//! The binary in `main.rs` is a thin CLI over these modules.

pub mod config;
pub mod deps;
pub mod devices;
pub mod displays;
pub mod encoder;
pub mod error;
pub mod job;
pub mod modes;
pub mod negotiate;
pub mod permissions;
pub mod platform;
pub mod preview;
pub mod selection;
pub mod session;
pub mod task;
