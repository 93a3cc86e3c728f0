//! # Core Runtime Module
//!
//! Provides the runtime infrastructure shared by the playback core:
//! - Logging and tracing infrastructure
//! - Player configuration
//! - Event bus for state, progress and duration events
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the other modules depend on.
//! It establishes the logging conventions, the configuration surface and the
//! event broadcasting mechanism used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
